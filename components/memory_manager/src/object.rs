//! Heap object layout
//!
//! Every allocation is described by an [`ObjectHeader`] kept in the heap's
//! object table. The slots themselves live contiguously in the arena.

use core_types::{Value, VmError};

/// Element type of an array, as encoded by the `newarray` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// `boolean[]`
    Boolean,
    /// `char[]`; also the representation of heap strings
    Char,
    /// `float[]`
    Float,
    /// `byte[]`
    Byte,
    /// `short[]`
    Short,
    /// `int[]`
    Int,
    /// Array of references (`anewarray`)
    Reference,
}

impl ArrayKind {
    /// Decode a `newarray` type code. `double` and `long` are not supported.
    pub fn from_atype(code: u8) -> Option<Self> {
        match code {
            4 => Some(ArrayKind::Boolean),
            5 => Some(ArrayKind::Char),
            6 => Some(ArrayKind::Float),
            8 => Some(ArrayKind::Byte),
            9 => Some(ArrayKind::Short),
            10 => Some(ArrayKind::Int),
            _ => None,
        }
    }

    /// The `newarray` type code, `None` for reference arrays.
    pub fn atype(self) -> Option<u8> {
        match self {
            ArrayKind::Boolean => Some(4),
            ArrayKind::Char => Some(5),
            ArrayKind::Float => Some(6),
            ArrayKind::Byte => Some(8),
            ArrayKind::Short => Some(9),
            ArrayKind::Int => Some(10),
            ArrayKind::Reference => None,
        }
    }

    /// Java element type name.
    pub fn name(self) -> &'static str {
        match self {
            ArrayKind::Boolean => "boolean",
            ArrayKind::Char => "char",
            ArrayKind::Float => "float",
            ArrayKind::Byte => "byte",
            ArrayKind::Short => "short",
            ArrayKind::Int => "int",
            ArrayKind::Reference => "reference",
        }
    }

    /// Initial element value.
    pub fn zero_value(self) -> Value {
        match self {
            ArrayKind::Float => Value::Float(0.0),
            ArrayKind::Reference => Value::Null,
            _ => Value::Int(0),
        }
    }

    /// Convert a value to what the element type can hold.
    pub fn narrow(self, value: Value, op: &'static str) -> Result<Value, VmError> {
        Ok(match self {
            ArrayKind::Boolean => Value::Int(value.as_int(op)? & 1),
            ArrayKind::Byte => Value::Int(value.as_int(op)? as i8 as i32),
            ArrayKind::Char => Value::Int(value.as_int(op)? as u16 as i32),
            ArrayKind::Short => Value::Int(value.as_int(op)? as i16 as i32),
            ArrayKind::Int => Value::Int(value.as_int(op)?),
            ArrayKind::Float => Value::Float(value.as_float(op)?),
            ArrayKind::Reference => {
                if value.is_null() || value.is_reference() {
                    value
                } else {
                    return Err(VmError::TypeMismatch {
                        op,
                        expected: "ref",
                        found: value.type_name(),
                    });
                }
            }
        })
    }
}

/// What an allocation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Untyped block (native objects, static field storage)
    Chunk,
    /// Instance of a user class
    Object {
        /// Runtime class of the instance
        class_id: u16,
    },
    /// Array; the slot count is the element count
    Array(ArrayKind),
}

/// Object table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    /// First slot in the arena
    pub offset: usize,
    /// Number of slots (fields or elements)
    pub len: usize,
    /// Contents
    pub kind: ObjectKind,
}

impl ObjectKind {
    /// Value a zero-initialised slot starts with. Typed arrays get their
    /// element zero; untyped slots get [`Value::Zero`].
    pub fn zero_value(self) -> Value {
        match self {
            ObjectKind::Array(kind) => kind.zero_value(),
            _ => Value::Zero,
        }
    }
}

impl ObjectHeader {
    /// Runtime class id for instances of user classes.
    pub fn class_id(&self) -> Option<u16> {
        match self.kind {
            ObjectKind::Object { class_id } => Some(class_id),
            _ => None,
        }
    }

    /// Element kind for arrays.
    pub fn array_kind(&self) -> Option<ArrayKind> {
        match self.kind {
            ObjectKind::Array(kind) => Some(kind),
            _ => None,
        }
    }
}
