//! Console natives: `PrintStream`, `InputStream` and `StringBuffer`.
//!
//! `System.out`/`System.in` are translated to constants, so the receiver of a
//! stream method is an integer that is popped and ignored.

use core_types::{HeapRef, MethodRef, Value, VmError};

use crate::console::Console;
use crate::family::{unknown_method, NativeContext, NativeFamily};
use crate::ids::{self, inputstream, printstream, stringbuffer};
use crate::strings::{alloc_string, format_float, format_int, read_string, to_char};

/// Console I/O family of the host profile.
///
/// A `StringBuffer` holds one `char[]` with its whole contents. Every
/// `append` allocates a fresh array for the old contents plus the suffix and
/// the heap never reclaims the old one, so `n` appends of `k` characters
/// cost about `k * n * (n + 1) / 2` slots. Programs on small heaps should
/// build strings with few appends or print the pieces directly.
#[derive(Debug)]
pub struct StdioFamily {
    console: Console,
}

impl StdioFamily {
    /// Family writing to and reading from `console`.
    pub fn new(console: Console) -> Self {
        Self { console }
    }

    fn print_stream(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        let text = match method.method_id {
            printstream::PRINTLN => String::new(),
            printstream::PRINTLN_STR | printstream::PRINT_STR => {
                read_string(ctx.stack.peek(0)?, ctx.heap, ctx.image)?
            }
            printstream::PRINTLN_INT | printstream::PRINT_INT => {
                format_int(ctx.stack.peek(0)?, "print")?
            }
            printstream::PRINTLN_CHAR | printstream::PRINT_CHAR => {
                to_char(ctx.stack.peek(0)?.as_int("print")?).to_string()
            }
            printstream::PRINTLN_FLOAT | printstream::PRINT_FLOAT => {
                format_float(ctx.stack.peek(0)?.as_float("print")?)
            }
            _ => return Err(unknown_method(method)),
        };
        let newline = matches!(
            method.method_id,
            printstream::PRINTLN
                | printstream::PRINTLN_STR
                | printstream::PRINTLN_INT
                | printstream::PRINTLN_CHAR
                | printstream::PRINTLN_FLOAT
        );

        if method.method_id != printstream::PRINTLN {
            ctx.stack.pop()?;
        }
        ctx.stack.pop()?;

        if newline {
            self.console.write_str(&format!("{}\n", text))
        } else {
            self.console.write_str(&text)
        }
    }

    fn input_stream(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        let value = match method.method_id {
            inputstream::AVAILABLE => self.console.available()? as i32,
            inputstream::READ => self.console.read_byte()?.map_or(-1, i32::from),
            _ => return Err(unknown_method(method)),
        };
        ctx.stack.pop()?;
        ctx.stack.push(Value::Int(value))
    }

    fn string_buffer(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        match method.method_id {
            stringbuffer::INIT => {
                let sb = ctx.stack.pop()?.as_heap_ref("StringBuffer.<init>")?;
                ctx.heap.store(sb, 0, Value::Null)
            }
            stringbuffer::INIT_STR => {
                let text = read_string(ctx.stack.peek(0)?, ctx.heap, ctx.image)?;
                let sb = ctx.stack.peek(1)?.as_heap_ref("StringBuffer.<init>")?;
                let chars = alloc_string(&text, ctx.heap)?;
                ctx.heap.store(sb, 0, Value::Ref(chars))?;
                ctx.stack.pop_n(2)?;
                Ok(())
            }
            stringbuffer::APPEND_STR
            | stringbuffer::APPEND_INT
            | stringbuffer::APPEND_CHAR
            | stringbuffer::APPEND_FLOAT => {
                let arg = ctx.stack.peek(0)?;
                let suffix = match method.method_id {
                    stringbuffer::APPEND_STR => read_string(arg, ctx.heap, ctx.image)?,
                    stringbuffer::APPEND_INT => format_int(arg, "append")?,
                    stringbuffer::APPEND_CHAR => to_char(arg.as_int("append")?).to_string(),
                    _ => format_float(arg.as_float("append")?),
                };
                let sb = ctx.stack.peek(1)?.as_heap_ref("StringBuffer.append")?;
                let text = buffer_text(sb, ctx)? + &suffix;
                let chars = alloc_string(&text, ctx.heap)?;
                ctx.heap.store(sb, 0, Value::Ref(chars))?;
                // append returns the buffer itself
                ctx.stack.pop()?;
                Ok(())
            }
            stringbuffer::TO_STRING => {
                let sb = ctx.stack.peek(0)?.as_heap_ref("StringBuffer.toString")?;
                let chars = match ctx.heap.load(sb, 0)? {
                    Value::Ref(chars) => chars,
                    _ => alloc_string("", ctx.heap)?,
                };
                ctx.stack.pop()?;
                ctx.stack.push(Value::Ref(chars))
            }
            _ => Err(unknown_method(method)),
        }
    }
}

fn buffer_text(sb: HeapRef, ctx: &NativeContext<'_>) -> Result<String, VmError> {
    match ctx.heap.load(sb, 0)? {
        Value::Null | Value::Zero => Ok(String::new()),
        chars => read_string(chars, ctx.heap, ctx.image),
    }
}

impl NativeFamily for StdioFamily {
    fn name(&self) -> &'static str {
        "stdio"
    }

    fn handles(&self, class_id: u16) -> bool {
        matches!(
            class_id,
            ids::PRINTSTREAM | ids::INPUTSTREAM | ids::STRINGBUFFER
        )
    }

    fn invoke(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        match method.class_id {
            ids::PRINTSTREAM => self.print_stream(method, ctx),
            ids::INPUTSTREAM => self.input_stream(method, ctx),
            ids::STRINGBUFFER => self.string_buffer(method, ctx),
            _ => Err(VmError::UnknownNativeClass {
                class_id: method.class_id,
            }),
        }
    }
}
