//! Composite method references.
//!
//! Invoke instructions carry a single 16-bit operand combining a class id
//! (high bits) and a method id (low bits). The split point is part of the
//! build configuration, so all packing and unpacking goes through
//! [`RefLayout`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VmError;

/// Bit layout of a packed method reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefLayout {
    /// Number of low-order bits holding the method id
    pub method_bits: u8,
}

impl RefLayout {
    /// Layout used by both reference profiles: 8 bits of class, 8 bits of method.
    pub const DEFAULT: RefLayout = RefLayout { method_bits: 8 };

    /// Largest method id representable.
    pub fn max_method_id(&self) -> u16 {
        ((1u32 << self.method_bits) - 1) as u16
    }

    /// Largest class id representable.
    pub fn max_class_id(&self) -> u16 {
        (u16::MAX as u32 >> self.method_bits) as u16
    }
}

impl Default for RefLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A (class id, method id) pair.
///
/// # Examples
///
/// ```
/// use core_types::{MethodRef, RefLayout};
///
/// let layout = RefLayout::DEFAULT;
/// let r = MethodRef::unpack(0x1102, layout);
/// assert_eq!(r, MethodRef::new(0x11, 0x02));
/// assert_eq!(r.pack(layout).unwrap(), 0x1102);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Class component
    pub class_id: u16,
    /// Method component
    pub method_id: u16,
}

impl MethodRef {
    /// Create a reference from its components.
    pub fn new(class_id: u16, method_id: u16) -> Self {
        Self {
            class_id,
            method_id,
        }
    }

    /// Split a packed operand. Every 16-bit value decodes to exactly one pair.
    pub fn unpack(raw: u16, layout: RefLayout) -> Self {
        let bits = layout.method_bits as u32;
        Self {
            class_id: ((raw as u32) >> bits) as u16,
            method_id: ((raw as u32) & ((1u32 << bits) - 1)) as u16,
        }
    }

    /// Pack into an operand, failing if either component does not fit.
    pub fn pack(self, layout: RefLayout) -> Result<u16, VmError> {
        if self.method_id > layout.max_method_id() || self.class_id > layout.max_class_id() {
            return Err(VmError::InvalidImage(format!(
                "method reference {} does not fit a {}-bit method layout",
                self, layout.method_bits
            )));
        }
        Ok((self.class_id << layout.method_bits) | self.method_id)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_id, self.method_id)
    }
}
