//! Core NanoVM types shared by every component.
//!
//! This crate provides the foundational types of the VM:
//!
//! - [`Value`] / [`HeapRef`] - tagged operand values and heap handles
//! - [`MethodRef`] / [`RefLayout`] - composite method references
//! - [`VmError`] / [`FaultClass`] - the single fault channel
//! - [`VmConfig`] - build-profile configuration
//! - [`log`] - levelled stderr logging
//!
//! # Examples
//!
//! ```
//! use core_types::{MethodRef, Value, VmConfig, VmError};
//!
//! let config = VmConfig::unix();
//! let r = MethodRef::unpack(0x1001, config.native.layout());
//! assert!(config.native.is_native(r.class_id));
//!
//! let v = Value::Int(7);
//! assert_eq!(v.as_int("iadd").unwrap(), 7);
//!
//! let err = VmError::DivisionByZero;
//! assert_eq!(err.to_string(), "division by zero");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod error;
pub mod log;
mod method_ref;
mod value;

pub use config::{
    FamilySet, Features, NativeConfig, StackCheck, VmConfig, WordWidth, MAX_CALL_DEPTH,
};
pub use error::{FaultClass, VmError};
pub use method_ref::{MethodRef, RefLayout};
pub use value::{HeapRef, Value};
