//! Bytecode system for NanoVM
//!
//! This crate provides the instruction set, the instruction decoder and the
//! program image (metadata store) the interpreter executes.
//!
//! # Features
//!
//! - JVM-numbered opcode subset with per-feature gating
//! - Decoder resolving branch and switch offsets to absolute targets
//! - Class/method/constant metadata with parent-chain method resolution
//! - JSON image loading and validation against a build profile
//! - Builders for method code and whole images
//! - Disassembler
//!
//! # Example
//!
//! ```
//! use bytecode_system::{CodeBuilder, Instruction, Opcode, ProgramBuilder};
//! use core_types::{MethodRef, VmConfig};
//!
//! let mut code = CodeBuilder::new();
//! code.push_int(2).push_int(3).op(Opcode::Iadd).op(Opcode::Pop).op(Opcode::Return);
//! let code = code.finish().unwrap();
//! assert_eq!(Instruction::decode(&code, 2).unwrap().opcode, Opcode::Iadd);
//!
//! let mut program = ProgramBuilder::new();
//! program
//!     .class(1, None, 0)
//!     .method(MethodRef::new(1, 0), 0, 0, code)
//!     .main(MethodRef::new(1, 0));
//! let image = program.build();
//! image.validate(&VmConfig::asuro()).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod disasm;
pub mod image;
pub mod instruction;
pub mod opcode;

// Re-export main types at crate root
pub use builder::{CodeBuilder, Label, ProgramBuilder};
pub use disasm::{disassemble, disassemble_image};
pub use image::{
    ClassDescriptor, Constant, ImageAddress, MethodBody, MethodDescriptor, ProgramImage, Resolved,
    Storage,
};
pub use instruction::{Instruction, Operand};
pub use opcode::{Feature, Opcode};
