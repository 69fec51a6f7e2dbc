//! Tagged operand-stack values.
//!
//! Every slot the interpreter touches (operand stack, locals, heap fields,
//! array elements) holds a [`Value`]. Heap references and constant-pool
//! references are separate variants from the numeric ones, so a reference can
//! never be mistaken for an integer and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VmError;

/// Opaque handle to an object or array allocated in the heap arena.
///
/// Two references are the same object exactly when their handles are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeapRef(pub u16);

impl HeapRef {
    /// Raw handle value.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HeapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A single VM value.
///
/// # Examples
///
/// ```
/// use core_types::{HeapRef, Value};
///
/// let n = Value::Int(42);
/// assert_eq!(n.as_int("iadd").unwrap(), 42);
///
/// let r = Value::Ref(HeapRef(3));
/// assert!(r.as_int("iadd").is_err());
///
/// // a fresh slot reads as zero or null, an explicit null is never a number
/// assert_eq!(Value::Zero.as_int("iadd").unwrap(), 0);
/// assert!(Value::Null.as_int("iadd").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// Content of a zero-initialised heap slot that has not been written.
    ///
    /// Fields carry no declared type, so the reading instruction decides:
    /// `0` for integer operations, `0.0` for float operations and null for
    /// reference operations.
    Zero,
    /// Integer word
    Int(i32),
    /// Floating-point word (only produced when float support is enabled)
    Float(f32),
    /// Reference to a heap object or array
    Ref(HeapRef),
    /// Reference to a string in the program image's constant pool
    Const(u16),
}

impl Value {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Zero => "zero",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Ref(_) => "ref",
            Value::Const(_) => "const",
        }
    }

    /// Returns true for the null reference and for unwritten slots.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Zero)
    }

    /// Reference comparison used by `if_acmpeq`/`if_acmpne`.
    pub fn same_reference(&self, other: &Value) -> bool {
        (self.is_null() && other.is_null()) || self == other
    }

    /// Returns true for values that point at an object (heap or constant pool).
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Ref(_) | Value::Const(_))
    }

    /// Reads the value as an integer. An unwritten slot reads as `0`; a null
    /// reference is a type mismatch.
    pub fn as_int(&self, op: &'static str) -> Result<i32, VmError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Zero => Ok(0),
            other => Err(VmError::TypeMismatch {
                op,
                expected: "int",
                found: other.type_name(),
            }),
        }
    }

    /// Reads the value as a float. An unwritten slot reads as `0.0`.
    pub fn as_float(&self, op: &'static str) -> Result<f32, VmError> {
        match self {
            Value::Float(x) => Ok(*x),
            Value::Zero => Ok(0.0),
            other => Err(VmError::TypeMismatch {
                op,
                expected: "float",
                found: other.type_name(),
            }),
        }
    }

    /// Reads the value as a heap reference, faulting on null.
    pub fn as_heap_ref(&self, op: &'static str) -> Result<HeapRef, VmError> {
        match self {
            Value::Ref(r) => Ok(*r),
            Value::Null | Value::Zero => Err(VmError::NullReference { op }),
            other => Err(VmError::TypeMismatch {
                op,
                expected: "ref",
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Zero => write!(f, "0"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Ref(r) => write!(f, "{}", r),
            Value::Const(i) => write!(f, "#{}", i),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<HeapRef> for Value {
    fn from(r: HeapRef) -> Self {
        Value::Ref(r)
    }
}
