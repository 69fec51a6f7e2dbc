//! Virtual Machine for bytecode execution
//!
//! Main entry point for executing a NanoVM program image.

use std::rc::Rc;

use arrayvec::ArrayVec;
use bytecode_system::{ProgramImage, Resolved};
use core_types::{debug, info, HeapRef, MethodRef, StackCheck, Value, VmConfig, VmError, MAX_CALL_DEPTH};
use memory_manager::{Heap, OperandStack};
use natives::{Console, NativeBridge, NativeContext};

use crate::call_frame::CallFrame;

/// Outcome of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Flow {
    /// Keep going
    Continue,
    /// The entry frame returned, with its return value if any
    Finished(Option<Value>),
}

/// Virtual Machine executing one program image
///
/// The VM exclusively owns the heap, the operand stack and the frame stack.
/// Every resource is bounded by the [`VmConfig`] it was created with.
///
/// # Examples
///
/// ```
/// use bytecode_system::{CodeBuilder, Opcode, ProgramBuilder};
/// use core_types::{MethodRef, Value, VmConfig};
/// use interpreter::Vm;
/// use natives::Console;
///
/// let mut code = CodeBuilder::new();
/// code.push_int(6).push_int(7).op(Opcode::Imul).op(Opcode::Ireturn);
///
/// let mut program = ProgramBuilder::new();
/// program
///     .class(1, None, 0)
///     .method(MethodRef::new(1, 0), 0, 0, code.finish().unwrap())
///     .main(MethodRef::new(1, 0));
///
/// let (console, _output) = Console::captured();
/// let mut vm = Vm::with_console(VmConfig::unix(), program.build(), console).unwrap();
/// assert_eq!(vm.run_main().unwrap(), Some(Value::Int(42)));
/// ```
#[derive(Debug)]
pub struct Vm {
    pub(crate) config: VmConfig,
    pub(crate) image: Rc<ProgramImage>,
    pub(crate) heap: Heap,
    pub(crate) stack: OperandStack,
    pub(crate) frames: ArrayVec<CallFrame, MAX_CALL_DEPTH>,
    pub(crate) bridge: NativeBridge,
    pub(crate) statics: HeapRef,
    pub(crate) steps: u64,
}

impl Vm {
    /// Create a VM for `image` under `config`, dispatching natives to
    /// `bridge`.
    ///
    /// Validates the configuration and the image, then allocates the static
    /// field block on the heap.
    pub fn new(config: VmConfig, image: ProgramImage, bridge: NativeBridge) -> Result<Self, VmError> {
        config.validate()?;
        image.validate(&config)?;

        let mut heap = Heap::for_config(&config);
        let statics = heap.allocate(true, image.static_fields as usize)?;
        debug!(
            "heap of {} slots, {} used by statics",
            heap.capacity_slots(),
            heap.used_slots()
        );

        Ok(Self {
            stack: OperandStack::new(config.stack_size),
            image: Rc::new(image),
            heap,
            frames: ArrayVec::new(),
            bridge,
            statics,
            steps: 0,
            config,
        })
    }

    /// Create a VM with the profile's standard native families on `console`.
    pub fn with_console(config: VmConfig, image: ProgramImage, console: Console) -> Result<Self, VmError> {
        let bridge = NativeBridge::for_config(&config, console)?;
        Self::new(config, image, bridge)
    }

    /// Run the image's entry point.
    pub fn run_main(&mut self) -> Result<Option<Value>, VmError> {
        let main = self.image.main;
        self.run(main)
    }

    /// Execute `entry` until it returns or a fault occurs.
    ///
    /// Returns the entry method's return value, if it has one. The entry
    /// method's arguments start out null. After a fault the VM state is left
    /// as it was at the faulting instruction; the next run starts from an
    /// empty stack but keeps the heap.
    pub fn run(&mut self, entry: MethodRef) -> Result<Option<Value>, VmError> {
        let not_bytecode = || {
            VmError::InvalidImage(format!("entry point {} is not a bytecode method", entry))
        };
        let index = match self
            .image
            .resolve(&self.config, entry.class_id, entry.method_id, false)?
        {
            Resolved::Method(index) => index,
            Resolved::Native(_) => return Err(not_bytecode()),
        };
        let method = self.image.method(index)?;
        if method.is_native() {
            return Err(not_bytecode());
        }
        let locals = method.frame_locals();

        info!("running {}", entry);
        self.frames.clear();
        self.stack.truncate(0);
        let frame = CallFrame::new(index, locals, Vec::new(), self.stack.len());
        self.push_frame(frame)?;

        loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Finished(value)) => {
                    info!("{} finished after {} instructions", entry, self.steps);
                    return Ok(value);
                }
                Err(err) => {
                    debug!("fault at depth {}: {}", self.frames.len(), err);
                    return Err(err);
                }
            }
        }
    }

    pub(crate) fn push_frame(&mut self, frame: CallFrame) -> Result<(), VmError> {
        let limit = self.config.max_call_depth;
        if self.frames.len() >= limit {
            return Err(VmError::CallDepthExceeded { limit });
        }
        let base = frame.stack_base;
        self.frames
            .try_push(frame)
            .map_err(|_| VmError::CallDepthExceeded { limit })?;
        self.stack.set_floor(base);
        Ok(())
    }

    pub(crate) fn frame(&self) -> Result<&CallFrame, VmError> {
        self.frames
            .last()
            .ok_or_else(|| VmError::InvalidImage("no active frame".into()))
    }

    pub(crate) fn frame_mut(&mut self) -> Result<&mut CallFrame, VmError> {
        self.frames
            .last_mut()
            .ok_or_else(|| VmError::InvalidImage("no active frame".into()))
    }

    /// Call a resolved method. Native calls run to completion without a
    /// frame; bytecode calls move their arguments into a new frame.
    pub(crate) fn call(&mut self, target: Resolved) -> Result<(), VmError> {
        let image = Rc::clone(&self.image);
        let index = match target {
            Resolved::Native(r) => return self.call_native(r),
            Resolved::Method(index) => index,
        };
        let method = image.method(index)?;
        if method.is_native() {
            return self.call_native(method.method_ref());
        }

        let args = self.stack.pop_n(method.args as usize)?;
        let frame = CallFrame::new(index, method.frame_locals(), args, self.stack.len());
        if self.config.trace {
            debug!("call {} (depth {})", method.method_ref(), self.frames.len() + 1);
        }
        self.push_frame(frame)
    }

    pub(crate) fn call_native(&mut self, r: MethodRef) -> Result<(), VmError> {
        let image = Rc::clone(&self.image);
        let mut ctx = NativeContext::new(&mut self.stack, &mut self.heap, &image);
        self.bridge.invoke(r, &mut ctx)
    }

    pub(crate) fn construct_native(&mut self, class_id: u16) -> Result<(), VmError> {
        let image = Rc::clone(&self.image);
        let mut ctx = NativeContext::new(&mut self.stack, &mut self.heap, &image);
        self.bridge.construct(class_id, &mut ctx)
    }

    /// Leave the current frame, applying the residual stack policy.
    pub(crate) fn return_from(&mut self, value: Option<Value>) -> Result<Flow, VmError> {
        let (base, method) = {
            let frame = self.frame()?;
            (frame.stack_base, frame.method)
        };
        if self.stack.len() < base {
            return Err(VmError::StackUnderflow);
        }
        let residual = self.stack.len() - base;
        if residual > 0 {
            match self.config.stack_check {
                StackCheck::Verify => {
                    let r = self.image.method(method)?.method_ref();
                    return Err(VmError::StackImbalance {
                        class_id: r.class_id,
                        method_id: r.method_id,
                        residual,
                    });
                }
                StackCheck::Discard => self.stack.truncate(base),
                StackCheck::Retain => {}
            }
        }

        self.frames.pop();
        let caller_base = self.frames.last().map_or(0, |f| f.stack_base);
        self.stack.set_floor(caller_base);
        if self.frames.is_empty() {
            return Ok(Flow::Finished(value));
        }
        if let Some(value) = value {
            self.stack.push(value)?;
        }
        Ok(Flow::Continue)
    }

    /// The configuration the VM runs under.
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The loaded program.
    pub fn image(&self) -> &ProgramImage {
        &self.image
    }

    /// The heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The operand stack.
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Current frame depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Value of a static field.
    pub fn static_field(&self, index: usize) -> Result<Value, VmError> {
        self.heap.load(self.statics, index)
    }

    /// The native bridge, for registering further families.
    pub fn bridge_mut(&mut self) -> &mut NativeBridge {
        &mut self.bridge
    }
}
