//! Runtime orchestration for program execution
//!
//! The Runtime loads a program image, optionally prints its disassembly and
//! runs it on a fresh VM.

use std::path::Path;

use bytecode_system::{disassemble_image, ProgramImage};
use core_types::{info, Value, VmConfig};
use interpreter::Vm;
use natives::Console;

use crate::error::{CliError, CliResult};

/// Runs program images under one configuration
#[derive(Debug)]
pub struct Runtime {
    /// Configuration every VM is created with
    config: VmConfig,
    /// Whether to print bytecode before execution
    print_bytecode: bool,
    /// Console for the next run; process stdio when unset
    console: Option<Console>,
}

impl Runtime {
    /// Create a runtime for `config`.
    ///
    /// # Example
    /// ```
    /// use core_types::VmConfig;
    /// use nanovm_cli::Runtime;
    ///
    /// let runtime = Runtime::new(VmConfig::asuro());
    /// assert_eq!(runtime.config().stack_size, 32);
    /// ```
    pub fn new(config: VmConfig) -> Self {
        Self {
            config,
            print_bytecode: false,
            console: None,
        }
    }

    /// Enable bytecode printing
    pub fn with_print_bytecode(mut self, enabled: bool) -> Self {
        self.print_bytecode = enabled;
        self
    }

    /// Use `console` instead of process stdio for the next run
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Read and validate a program image.
    ///
    /// # Errors
    /// `CliError::Io` if the file cannot be read, `CliError::Load` if it is
    /// not a valid image for this configuration.
    pub fn load_file(&self, path: &Path) -> CliResult<ProgramImage> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = ProgramImage::from_json(&text).map_err(CliError::Load)?;
        image.validate(&self.config).map_err(CliError::Load)?;
        Ok(image)
    }

    /// Load and run the image at `path`.
    ///
    /// # Example
    /// ```no_run
    /// use core_types::VmConfig;
    /// use nanovm_cli::Runtime;
    /// use std::path::Path;
    ///
    /// let mut runtime = Runtime::new(VmConfig::unix());
    /// runtime.execute_file(Path::new("hello.json")).unwrap();
    /// ```
    pub fn execute_file(&mut self, path: &Path) -> CliResult<Option<Value>> {
        let image = self.load_file(path)?;
        self.execute_image(image)
    }

    /// Run an already loaded image from its entry point.
    pub fn execute_image(&mut self, image: ProgramImage) -> CliResult<Option<Value>> {
        if self.print_bytecode {
            let listing = disassemble_image(&image, &self.config).map_err(CliError::Load)?;
            print!("{}", listing);
        }

        let console = self.console.take().unwrap_or_else(Console::stdio);
        let mut vm = Vm::with_console(self.config.clone(), image, console).map_err(CliError::Load)?;
        let result = vm.run_main().map_err(CliError::Fault)?;

        let stats = vm.heap().stats();
        info!(
            "{} instructions, {} allocations, {} of {} heap slots used",
            vm.steps(),
            stats.allocations,
            stats.slots_in_use,
            vm.heap().capacity_slots()
        );
        Ok(result)
    }
}
