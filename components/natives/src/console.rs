//! Console streams behind the I/O natives.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use core_types::VmError;

/// In-memory output sink that can be inspected after a run.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl CapturedOutput {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    /// Discards the captured bytes.
    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Program console: an output stream and an input stream.
///
/// # Examples
///
/// ```
/// use natives::Console;
///
/// let (mut console, output) = Console::captured();
/// console.write_str("hi").unwrap();
/// assert_eq!(output.contents(), "hi");
/// assert_eq!(console.read_byte().unwrap(), None);
/// ```
pub struct Console {
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Console {
    /// Console on the process's stdout and stdin.
    pub fn stdio() -> Self {
        Console {
            out: Box::new(io::stdout()),
            input: Box::new(io::BufReader::new(io::stdin())),
        }
    }

    /// Console writing to an in-memory buffer with empty input.
    pub fn captured() -> (Self, CapturedOutput) {
        let output = CapturedOutput::default();
        let console = Console {
            out: Box::new(output.clone()),
            input: Box::new(io::empty()),
        };
        (console, output)
    }

    /// Replaces the input stream.
    pub fn with_input(mut self, input: impl BufRead + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Writes text and flushes.
    pub fn write_str(&mut self, text: &str) -> Result<(), VmError> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Bytes that can be read without reaching end of input. On an
    /// interactive terminal this waits for the next line.
    pub fn available(&mut self) -> Result<usize, VmError> {
        Ok(self.input.fill_buf()?.len())
    }

    /// Next input byte, `None` at end of input.
    pub fn read_byte(&mut self) -> Result<Option<u8>, VmError> {
        let byte = self.input.fill_buf()?.first().copied();
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}
