//! Bounded operand stack shared by all frames.
//!
//! Frames do not own separate stacks; each records the depth at which its
//! own region starts. The stack keeps the active frame's start as its floor
//! and refuses to pop or peek below it, so a callee can never consume values
//! belonging to its caller.

use core_types::{Value, VmError};

/// Fixed-capacity stack of values.
#[derive(Debug, Clone, PartialEq)]
pub struct OperandStack {
    values: Vec<Value>,
    limit: usize,
    floor: usize,
}

impl OperandStack {
    /// Creates an empty stack holding at most `limit` values.
    pub fn new(limit: usize) -> Self {
        Self {
            values: Vec::with_capacity(limit),
            limit,
            floor: 0,
        }
    }

    /// Pushes a value, faulting when the stack is full.
    pub fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.values.len() >= self.limit {
            return Err(VmError::StackOverflow { limit: self.limit });
        }
        self.values.push(value);
        Ok(())
    }

    /// Pops the top value, faulting when nothing is left above the floor.
    pub fn pop(&mut self) -> Result<Value, VmError> {
        if self.values.len() <= self.floor {
            return Err(VmError::StackUnderflow);
        }
        self.values.pop().ok_or(VmError::StackUnderflow)
    }

    /// Pops the top value as an integer.
    pub fn pop_int(&mut self, op: &'static str) -> Result<i32, VmError> {
        self.pop()?.as_int(op)
    }

    /// Pops the top value as a float.
    pub fn pop_float(&mut self, op: &'static str) -> Result<f32, VmError> {
        self.pop()?.as_float(op)
    }

    /// Value `depth` entries below the top (0 is the top).
    pub fn peek(&self, depth: usize) -> Result<Value, VmError> {
        let len = self.values.len();
        if depth >= self.available() {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.values[len - 1 - depth])
    }

    /// Removes the top `count` values and returns them bottom first.
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, VmError> {
        if count > self.available() {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.values.split_off(self.values.len() - count))
    }

    /// Values above the floor.
    pub fn available(&self) -> usize {
        self.values.len().saturating_sub(self.floor)
    }

    /// Lowest depth that pops and peeks may reach.
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Moves the floor, normally to the active frame's stack base.
    pub fn set_floor(&mut self, depth: usize) {
        self.floor = depth;
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Capacity in values.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drops everything above `depth`. The floor is lowered to `depth` if
    /// it was higher.
    pub fn truncate(&mut self, depth: usize) {
        self.values.truncate(depth);
        self.floor = self.floor.min(depth);
    }

    /// Stack contents, bottom first.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}
