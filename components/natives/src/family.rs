//! The native family seam.

use bytecode_system::ProgramImage;
use core_types::{FamilySet, MethodRef, VmError};
use memory_manager::{Heap, OperandStack};

/// VM state a native handler may touch.
///
/// Arguments are on `stack` in call order (last argument on top); a handler
/// pops what it consumes and pushes its result, if any.
pub struct NativeContext<'a> {
    /// Caller's operand stack
    pub stack: &'a mut OperandStack,
    /// VM heap
    pub heap: &'a mut Heap,
    /// Loaded program, for constant-pool strings
    pub image: &'a ProgramImage,
}

impl<'a> NativeContext<'a> {
    /// Bundles the VM state for one native call.
    pub fn new(stack: &'a mut OperandStack, heap: &'a mut Heap, image: &'a ProgramImage) -> Self {
        Self { stack, heap, image }
    }
}

/// Place of a family in the dispatch chain.
///
/// The bridge consults families in this order, whatever order they were
/// registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FamilyKind {
    /// `java.lang.Object`
    Object,
    /// Console streams and string buffers
    Console,
    /// AVR peripherals
    Peripheral,
    /// Character display
    Display,
    /// Robot platform
    Robot,
}

impl FamilyKind {
    /// Every kind, in chain order.
    pub const ALL: [FamilyKind; 5] = [
        FamilyKind::Object,
        FamilyKind::Console,
        FamilyKind::Peripheral,
        FamilyKind::Display,
        FamilyKind::Robot,
    ];

    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            FamilyKind::Object => "object",
            FamilyKind::Console => "stdio",
            FamilyKind::Peripheral => "avr",
            FamilyKind::Display => "lcd",
            FamilyKind::Robot => "asuro",
        }
    }

    /// Returns true if a profile with `families` compiled in admits this kind.
    pub fn enabled(self, families: &FamilySet) -> bool {
        match self {
            FamilyKind::Object => true,
            FamilyKind::Console => families.stdio,
            // the AVR classes are not part of the Asuro platform
            FamilyKind::Peripheral => families.avr && !families.asuro,
            FamilyKind::Display => families.lcd,
            FamilyKind::Robot => families.asuro,
        }
    }
}

/// A group of native classes implemented together (console I/O, a
/// peripheral, a robot platform).
pub trait NativeFamily {
    /// Family name for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns true if this family implements `class_id`.
    fn handles(&self, class_id: u16) -> bool;

    /// Executes a method of one of the family's classes.
    ///
    /// An unknown method id must fail with
    /// [`VmError::UnknownNativeMethod`] before touching the stack.
    fn invoke(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError>;
}

/// Error for a method id the family does not implement.
pub fn unknown_method(method: MethodRef) -> VmError {
    VmError::UnknownNativeMethod {
        class_id: method.class_id,
        method_id: method.method_id,
    }
}
