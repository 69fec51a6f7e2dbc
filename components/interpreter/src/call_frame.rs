//! Call frame for method invocation

use core_types::{Value, VmError};

/// Call frame representing one bytecode method activation
///
/// The caller's resume point is the caller frame's own `pc`, which is
/// advanced past the invoke instruction before the callee frame is pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Index of the executing method in the image's method table
    pub method: usize,
    /// Offset of the next instruction within the method's code
    pub pc: usize,
    /// Local variable slots, arguments first
    pub locals: Vec<Value>,
    /// Operand stack depth when the frame was entered
    pub stack_base: usize,
}

impl CallFrame {
    /// Create a frame with `local_count` locals, the first ones taken from
    /// `args` in order.
    pub fn new(method: usize, local_count: usize, args: Vec<Value>, stack_base: usize) -> Self {
        let mut locals = args;
        if locals.len() < local_count {
            locals.resize(local_count, Value::Null);
        }
        Self {
            method,
            pc: 0,
            locals,
            stack_base,
        }
    }

    /// Read a local variable.
    pub fn local(&self, index: usize) -> Result<Value, VmError> {
        self.locals.get(index).copied().ok_or(VmError::InvalidLocal {
            index,
            count: self.locals.len(),
        })
    }

    /// Write a local variable.
    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), VmError> {
        let count = self.locals.len();
        let slot = self
            .locals
            .get_mut(index)
            .ok_or(VmError::InvalidLocal { index, count })?;
        *slot = value;
        Ok(())
    }
}
