//! Integration test suite for NanoVM
//!
//! This crate provides sample programs and helpers shared by the integration
//! tests, which verify components work together across crate boundaries.

use bytecode_system::ProgramImage;
use core_types::{Value, VmConfig, VmError};
use interpreter::Vm;
use natives::Console;

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use memory_manager;
    pub use nanovm_cli;
    pub use natives;
}


/// Run `image` on a captured console, returning the result and everything
/// the program printed.
pub fn run_captured(config: VmConfig, image: ProgramImage) -> (Result<Option<Value>, VmError>, String) {
    run_with_input(config, image, "")
}

/// Like [`run_captured`], with `input` available on `System.in`.
pub fn run_with_input(
    config: VmConfig,
    image: ProgramImage,
    input: &str,
) -> (Result<Option<Value>, VmError>, String) {
    let (console, output) = Console::captured();
    let console = console.with_input(std::io::Cursor::new(input.as_bytes().to_vec()));
    let result = Vm::with_console(config, image, console).and_then(|mut vm| vm.run_main());
    (result, output.contents())
}
