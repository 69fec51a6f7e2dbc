//! Bytecode interpreter for NanoVM
//!
//! This crate provides the virtual machine that executes a program image:
//! - Fetch-decode-execute loop over JVM-numbered bytecode
//! - Bounded call frames and a shared bounded operand stack
//! - Native calls routed through the `natives` bridge
//! - Feature gating (arrays, switch, inheritance, float) per build profile
//!
//! # Example
//!
//! ```
//! use bytecode_system::{CodeBuilder, Opcode, ProgramBuilder};
//! use core_types::{MethodRef, VmConfig};
//! use interpreter::Vm;
//! use natives::{ids, Console};
//!
//! let mut program = ProgramBuilder::new();
//! let hello = program.add_string("Hello World");
//!
//! // System.out.println("Hello World")
//! let mut code = CodeBuilder::new();
//! code.push_int(0).op_u8(Opcode::Ldc, hello);
//! code.invoke(
//!     Opcode::Invokevirtual,
//!     MethodRef::new(ids::PRINTSTREAM, ids::printstream::PRINTLN_STR),
//! )
//! .unwrap();
//! code.op(Opcode::Return);
//!
//! program
//!     .class(1, Some(ids::OBJECT), 0)
//!     .method(MethodRef::new(1, 0), 1, 1, code.finish().unwrap())
//!     .main(MethodRef::new(1, 0));
//!
//! let (console, output) = Console::captured();
//! let mut vm = Vm::with_console(VmConfig::unix(), program.build(), console).unwrap();
//! vm.run_main().unwrap();
//! assert_eq!(output.contents(), "Hello World\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod dispatch;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use vm::Vm;
