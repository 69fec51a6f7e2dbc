//! Native method support for NanoVM
//!
//! Calls on classes in the native id range never run bytecode. The
//! interpreter hands them to the [`NativeBridge`], which forwards each call
//! to the first registered [`NativeFamily`] that handles the class. The
//! chain runs in [`FamilyKind`] order:
//!
//! - [`ObjectFamily`] - `java.lang.Object` (always present)
//! - [`StdioFamily`] - `PrintStream`, `InputStream`, `StringBuffer`
//! - peripheral, display and robot families registered by the embedding,
//!   accepted only when the profile enables them
//!
//! # Example
//!
//! ```
//! use bytecode_system::ProgramBuilder;
//! use core_types::{MethodRef, Value, VmConfig};
//! use memory_manager::{Heap, OperandStack};
//! use natives::{ids, Console, NativeBridge, NativeContext};
//!
//! let (console, output) = Console::captured();
//! let mut bridge = NativeBridge::for_config(&VmConfig::unix(), console).unwrap();
//!
//! let mut program = ProgramBuilder::new();
//! let hello = program.add_string("hello");
//! let image = program.build();
//! let mut heap = Heap::with_slot_capacity(8);
//! let mut stack = OperandStack::new(8);
//!
//! // System.out.println("hello")
//! stack.push(Value::Int(0)).unwrap();
//! stack.push(Value::Const(hello as u16)).unwrap();
//! let mut ctx = NativeContext::new(&mut stack, &mut heap, &image);
//! let println = MethodRef::new(ids::PRINTSTREAM, ids::printstream::PRINTLN_STR);
//! bridge.invoke(println, &mut ctx).unwrap();
//! assert_eq!(output.contents(), "hello\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod console;
pub mod family;
pub mod ids;
pub mod object;
pub mod stdio;
pub mod strings;

pub use bridge::NativeBridge;
pub use console::{CapturedOutput, Console};
pub use family::{unknown_method, FamilyKind, NativeContext, NativeFamily};
pub use object::ObjectFamily;
pub use stdio::StdioFamily;
