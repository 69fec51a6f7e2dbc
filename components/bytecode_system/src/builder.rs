//! Programmatic construction of method code and program images.
//!
//! Used by tests and host tooling in place of the external class-file
//! translator.

use core_types::{MethodRef, RefLayout, VmError};

use crate::image::{
    ClassDescriptor, Constant, ImageAddress, MethodBody, MethodDescriptor, ProgramImage, Storage,
};
use crate::opcode::Opcode;

/// Forward-referencable code position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Clone, Copy)]
struct Fixup {
    /// Where the offset is written
    at: usize,
    /// Position of the instruction the offset is relative to
    base: usize,
    label: Label,
    wide: bool,
}

/// Assembles the bytecode of one method.
///
/// # Examples
///
/// ```
/// use bytecode_system::{CodeBuilder, Opcode};
///
/// let mut code = CodeBuilder::new();
/// let done = code.label();
/// code.push_int(3)
///     .branch(Opcode::Ifeq, done)
///     .op(Opcode::Nop);
/// code.bind(done);
/// code.op(Opcode::Return);
/// assert_eq!(code.finish().unwrap(), vec![0x06, 0x99, 0x00, 0x04, 0x00, 0xb1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    code: Vec<u8>,
    labels: Vec<Option<usize>>,
    fixups: Vec<Fixup>,
    layout: RefLayout,
}

impl CodeBuilder {
    /// Creates an empty builder using the default reference layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder packing method references with `layout`.
    pub fn with_layout(layout: RefLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Current code length.
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Emits an opcode without immediates.
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.code.push(op.byte());
        self
    }

    /// Emits an opcode with a one-byte immediate.
    pub fn op_u8(&mut self, op: Opcode, operand: u8) -> &mut Self {
        self.code.extend_from_slice(&[op.byte(), operand]);
        self
    }

    /// Emits an opcode with a two-byte immediate.
    pub fn op_u16(&mut self, op: Opcode, operand: u16) -> &mut Self {
        self.code.push(op.byte());
        self.code.extend_from_slice(&operand.to_be_bytes());
        self
    }

    /// Pushes an integer constant using the shortest encoding.
    pub fn push_int(&mut self, n: i32) -> &mut Self {
        match n {
            -1..=5 => self.op(Opcode::from_byte((n + 3) as u8).unwrap_or(Opcode::Nop)),
            -128..=127 => self.op_u8(Opcode::Bipush, n as i8 as u8),
            _ => self.op_u16(Opcode::Sipush, n as i16 as u16),
        }
    }

    /// `iinc index delta`
    pub fn iinc(&mut self, index: u8, delta: i8) -> &mut Self {
        self.code
            .extend_from_slice(&[Opcode::Iinc.byte(), index, delta as u8]);
        self
    }

    /// Emits an invoke instruction for `target`.
    pub fn invoke(&mut self, op: Opcode, target: MethodRef) -> Result<&mut Self, VmError> {
        let packed = target.pack(self.layout)?;
        Ok(self.op_u16(op, packed))
    }

    /// Allocates a new unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds `label` to the current position.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        self.labels[label.0] = Some(self.code.len());
        self
    }

    /// Emits a branch to `label`.
    pub fn branch(&mut self, op: Opcode, label: Label) -> &mut Self {
        let base = self.code.len();
        self.code.push(op.byte());
        self.fixups.push(Fixup {
            at: self.code.len(),
            base,
            label,
            wide: false,
        });
        self.code.extend_from_slice(&[0, 0]);
        self
    }

    /// Emits a `tableswitch` for keys `low..low + targets.len()`.
    pub fn tableswitch(&mut self, low: i32, targets: &[Label], default: Label) -> &mut Self {
        let base = self.switch_header(Opcode::Tableswitch);
        self.wide_fixup(base, default);
        let high = low + targets.len() as i32 - 1;
        self.code.extend_from_slice(&low.to_be_bytes());
        self.code.extend_from_slice(&high.to_be_bytes());
        for target in targets {
            self.wide_fixup(base, *target);
        }
        self
    }

    /// Emits a `lookupswitch` over `pairs`, sorted by key as the JVM requires.
    pub fn lookupswitch(&mut self, pairs: &[(i32, Label)], default: Label) -> &mut Self {
        let mut pairs = pairs.to_vec();
        pairs.sort_by_key(|(key, _)| *key);
        let base = self.switch_header(Opcode::Lookupswitch);
        self.wide_fixup(base, default);
        self.code
            .extend_from_slice(&(pairs.len() as i32).to_be_bytes());
        for (key, target) in pairs {
            self.code.extend_from_slice(&key.to_be_bytes());
            self.wide_fixup(base, target);
        }
        self
    }

    fn switch_header(&mut self, op: Opcode) -> usize {
        let base = self.code.len();
        self.code.push(op.byte());
        while self.code.len() % 4 != 0 {
            self.code.push(0);
        }
        base
    }

    fn wide_fixup(&mut self, base: usize, label: Label) {
        self.fixups.push(Fixup {
            at: self.code.len(),
            base,
            label,
            wide: true,
        });
        self.code.extend_from_slice(&[0; 4]);
    }

    /// Resolves labels and returns the code.
    pub fn finish(mut self) -> Result<Vec<u8>, VmError> {
        for fixup in &self.fixups {
            let target = self.labels[fixup.label.0].ok_or_else(|| {
                VmError::InvalidImage(format!("unbound label {}", fixup.label.0))
            })?;
            let offset = target as i64 - fixup.base as i64;
            if fixup.wide {
                self.code[fixup.at..fixup.at + 4].copy_from_slice(&(offset as i32).to_be_bytes());
            } else {
                let short = i16::try_from(offset).map_err(|_| {
                    VmError::InvalidImage(format!("branch offset {} out of range", offset))
                })?;
                self.code[fixup.at..fixup.at + 2].copy_from_slice(&short.to_be_bytes());
            }
        }
        Ok(self.code)
    }
}

/// Assembles a [`ProgramImage`].
///
/// Switch padding is relative to the start of each method, so method code is
/// placed at 4-byte aligned offsets.
///
/// # Examples
///
/// ```
/// use bytecode_system::{CodeBuilder, Opcode, ProgramBuilder};
/// use core_types::{MethodRef, VmConfig};
///
/// let mut code = CodeBuilder::new();
/// code.op(Opcode::Return);
///
/// let mut program = ProgramBuilder::new();
/// program
///     .class(1, None, 0)
///     .method(MethodRef::new(1, 0), 0, 0, code.finish().unwrap())
///     .main(MethodRef::new(1, 0));
/// let image = program.build();
/// assert!(image.validate(&VmConfig::unix()).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    image: ProgramImage,
    storage: Storage,
    flag: u32,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// Creates an empty program whose entry point defaults to method 0 of
    /// class 0.
    pub fn new() -> Self {
        ProgramBuilder {
            image: ProgramImage {
                classes: Vec::new(),
                methods: Vec::new(),
                constants: Vec::new(),
                code: Vec::new(),
                static_fields: 0,
                main: MethodRef::new(0, 0),
            },
            storage: Storage::Transient,
            flag: 0,
        }
    }

    /// Marks the code of subsequently added methods as persistent, tagging
    /// their addresses with `flag`.
    pub fn persistent(&mut self, flag: u32) -> &mut Self {
        self.storage = Storage::Persistent;
        self.flag = flag;
        self
    }

    /// Declares a class.
    pub fn class(&mut self, id: u16, parent: Option<u16>, fields: u16) -> &mut Self {
        self.image.classes.push(ClassDescriptor { id, parent, fields });
        self
    }

    /// Adds a bytecode method.
    pub fn method(&mut self, r: MethodRef, args: u8, max_locals: u8, code: Vec<u8>) -> &mut Self {
        while self.image.code.len() % 4 != 0 {
            self.image.code.push(Opcode::Nop.byte());
        }
        let address = ImageAddress {
            storage: self.storage,
            offset: self.image.code.len() as u32,
        }
        .encode(self.flag);
        let len = code.len() as u32;
        self.image.code.extend(code);
        self.image.methods.push(MethodDescriptor {
            class_id: r.class_id,
            method_id: r.method_id,
            args,
            max_locals,
            max_stack: 0,
            body: MethodBody::Bytecode { address, len },
        });
        self
    }

    /// Adds a native-marked method.
    pub fn native_method(&mut self, r: MethodRef, args: u8) -> &mut Self {
        self.image.methods.push(MethodDescriptor {
            class_id: r.class_id,
            method_id: r.method_id,
            args,
            max_locals: 0,
            max_stack: 0,
            body: MethodBody::Native,
        });
        self
    }

    /// Adds a constant and returns its pool index.
    pub fn add_constant(&mut self, constant: Constant) -> u8 {
        self.image.constants.push(constant);
        (self.image.constants.len() - 1) as u8
    }

    /// Adds a string constant and returns its pool index.
    pub fn add_string(&mut self, s: &str) -> u8 {
        self.add_constant(Constant::Str(s.to_string()))
    }

    /// Sets the number of static field slots.
    pub fn static_fields(&mut self, count: u16) -> &mut Self {
        self.image.static_fields = count;
        self
    }

    /// Sets the entry point.
    pub fn main(&mut self, r: MethodRef) -> &mut Self {
        self.image.main = r;
        self
    }

    /// Returns the finished image.
    pub fn build(&self) -> ProgramImage {
        self.image.clone()
    }
}
