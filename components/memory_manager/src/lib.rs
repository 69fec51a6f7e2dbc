//! Memory Manager - heap arena and operand stack
//!
//! This component provides:
//! - A fixed-budget slot arena with bump allocation ([`Heap`])
//! - Object and array headers addressed by [`HeapRef`](core_types::HeapRef) handles
//! - The bounded operand stack shared by all call frames ([`OperandStack`])
//!
//! There is no collector: allocations live until the heap is dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod heap;
pub mod object;
pub mod stack;

// Re-export main types
pub use heap::{Arena, Heap, HeapStats};
pub use object::{ArrayKind, ObjectHeader, ObjectKind};
pub use stack::OperandStack;
