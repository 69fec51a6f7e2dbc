//! `java.lang.Object`

use core_types::{MethodRef, VmError};

use crate::family::{unknown_method, NativeContext, NativeFamily};
use crate::ids;

/// Handles the root class. Only the constructor exists; it consumes the
/// receiver and does nothing else.
#[derive(Debug, Default)]
pub struct ObjectFamily;

impl NativeFamily for ObjectFamily {
    fn name(&self) -> &'static str {
        "object"
    }

    fn handles(&self, class_id: u16) -> bool {
        class_id == ids::OBJECT
    }

    fn invoke(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        if method.method_id != ids::METHOD_INIT {
            return Err(unknown_method(method));
        }
        ctx.stack.pop()?;
        Ok(())
    }
}
