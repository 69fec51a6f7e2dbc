//! VM fault types.
//!
//! Every fault is fatal at the point of detection. Components return
//! `Result<_, VmError>` and the interpreter stops at the first error; the
//! embedding decides what a fault means (exit code, reset, ...).

use thiserror::Error;

/// Broad category of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// An identifier could not be resolved (native class/method, virtual method)
    Resolution,
    /// A bounded resource was exceeded (heap, stack, array bounds)
    Resource,
    /// An opcode needs a feature that is not compiled into this profile
    Capability,
    /// The program or its image is inconsistent (type errors, bad indices)
    Program,
}

/// A fatal VM fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// No native family handles the class id.
    #[error("unknown native class {class_id}")]
    UnknownNativeClass {
        /// Native class id that was requested
        class_id: u16,
    },
    /// The native family exists but does not implement the method id.
    #[error("unknown native method {method_id} on native class {class_id}")]
    UnknownNativeMethod {
        /// Native class id
        class_id: u16,
        /// Method id within the class
        method_id: u16,
    },
    /// No method with this id was found on the class or any of its parents.
    #[error("unresolved method {method_id} starting at class {class_id}")]
    UnresolvedMethod {
        /// Class the lookup started from
        class_id: u16,
        /// Method id that was looked up
        method_id: u16,
    },
    /// The class id is not described by the program image.
    #[error("unknown class {class_id}")]
    UnknownClass {
        /// Missing class id
        class_id: u16,
    },

    /// The heap budget cannot satisfy the allocation.
    #[error("heap exhausted: requested {requested} slots, {available} available")]
    HeapExhausted {
        /// Slots requested
        requested: usize,
        /// Slots still free
        available: usize,
    },
    /// A method returned with values left on its operand stack.
    #[error("stack imbalance: method {method_id} of class {class_id} returned with {residual} values on its stack")]
    StackImbalance {
        /// Class of the returning method
        class_id: u16,
        /// Id of the returning method
        method_id: u16,
        /// Number of values left behind
        residual: usize,
    },
    /// Array element access outside `0..length`.
    #[error("array index {index} out of bounds for length {length}")]
    ArrayIndexOutOfBounds {
        /// Requested index
        index: i32,
        /// Array length
        length: usize,
    },
    /// Array allocation with a negative element count.
    #[error("negative array size {size}")]
    NegativeArraySize {
        /// Requested size
        size: i32,
    },
    /// Operand stack is full.
    #[error("operand stack overflow (limit {limit})")]
    StackOverflow {
        /// Stack capacity in slots
        limit: usize,
    },
    /// Too many nested calls.
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded {
        /// Maximum number of frames
        limit: usize,
    },
    /// Pop from an empty operand stack.
    #[error("operand stack underflow")]
    StackUnderflow,
    /// Field or slot index outside the object.
    #[error("slot {index} out of bounds for object of {len} slots")]
    SlotOutOfBounds {
        /// Requested slot
        index: usize,
        /// Slot count of the object
        len: usize,
    },

    /// Opcode belongs to a feature that is disabled in this build profile.
    #[error("unsupported opcode 0x{opcode:02x}: {feature} support is not enabled")]
    UnsupportedOpcode {
        /// Raw opcode byte
        opcode: u8,
        /// Feature the opcode needs
        feature: &'static str,
    },
    /// Byte is not an opcode of the instruction set at all.
    #[error("invalid opcode 0x{opcode:02x} at pc {pc}")]
    InvalidOpcode {
        /// Raw byte
        opcode: u8,
        /// Code offset
        pc: usize,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Null used where an object was required.
    #[error("null reference in {op}")]
    NullReference {
        /// Operation that dereferenced null
        op: &'static str,
    },
    /// Operand of the wrong kind.
    #[error("{op}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Operation
        op: &'static str,
        /// Expected kind
        expected: &'static str,
        /// Actual kind
        found: &'static str,
    },
    /// Heap handle that was never allocated.
    #[error("invalid heap reference {handle}")]
    InvalidReference {
        /// Raw handle
        handle: u16,
    },
    /// Local variable index outside the frame.
    #[error("local {index} out of range ({count} locals)")]
    InvalidLocal {
        /// Requested local
        index: usize,
        /// Locals in the frame
        count: usize,
    },
    /// Constant pool index outside the pool or of the wrong kind.
    #[error("invalid constant #{index}")]
    InvalidConstant {
        /// Requested constant
        index: usize,
    },
    /// Program image is malformed.
    #[error("invalid program image: {0}")]
    InvalidImage(String),
    /// Configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Console I/O failed inside a native handler.
    #[error("i/o error: {0}")]
    Io(String),
}

impl VmError {
    /// Category of the fault.
    pub fn class(&self) -> FaultClass {
        match self {
            VmError::UnknownNativeClass { .. }
            | VmError::UnknownNativeMethod { .. }
            | VmError::UnresolvedMethod { .. }
            | VmError::UnknownClass { .. } => FaultClass::Resolution,
            VmError::HeapExhausted { .. }
            | VmError::StackImbalance { .. }
            | VmError::ArrayIndexOutOfBounds { .. }
            | VmError::NegativeArraySize { .. }
            | VmError::StackOverflow { .. }
            | VmError::CallDepthExceeded { .. }
            | VmError::StackUnderflow
            | VmError::SlotOutOfBounds { .. } => FaultClass::Resource,
            VmError::UnsupportedOpcode { .. } | VmError::InvalidOpcode { .. } => {
                FaultClass::Capability
            }
            _ => FaultClass::Program,
        }
    }

    /// Stable diagnostic code, used as the host process exit status.
    pub fn code(&self) -> u8 {
        match self {
            VmError::UnknownNativeClass { .. } => 10,
            VmError::UnknownNativeMethod { .. } => 11,
            VmError::UnresolvedMethod { .. } => 12,
            VmError::UnknownClass { .. } => 13,
            VmError::HeapExhausted { .. } => 20,
            VmError::StackImbalance { .. } => 21,
            VmError::ArrayIndexOutOfBounds { .. } => 22,
            VmError::NegativeArraySize { .. } => 23,
            VmError::StackOverflow { .. } => 24,
            VmError::CallDepthExceeded { .. } => 25,
            VmError::StackUnderflow => 26,
            VmError::SlotOutOfBounds { .. } => 27,
            VmError::UnsupportedOpcode { .. } => 30,
            VmError::InvalidOpcode { .. } => 31,
            VmError::DivisionByZero => 40,
            VmError::NullReference { .. } => 41,
            VmError::TypeMismatch { .. } => 42,
            VmError::InvalidReference { .. } => 43,
            VmError::InvalidLocal { .. } => 44,
            VmError::InvalidConstant { .. } => 45,
            VmError::InvalidImage(_) => 50,
            VmError::InvalidConfig(_) => 51,
            VmError::Io(_) => 52,
        }
    }
}

impl From<std::io::Error> for VmError {
    fn from(err: std::io::Error) -> Self {
        VmError::Io(err.to_string())
    }
}
