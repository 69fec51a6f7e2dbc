//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution: one call to [`Vm::step`] fetches,
//! decodes and executes a single instruction of the current frame.

use std::cmp::Ordering;
use std::rc::Rc;

use bytecode_system::{Constant, Instruction, Opcode, Operand, Resolved};
use core_types::{debug, HeapRef, MethodRef, Value, VmError, WordWidth};
use memory_manager::ArrayKind;

use crate::vm::{Flow, Vm};

fn operand_u8(insn: &Instruction) -> Result<u8, VmError> {
    match insn.operand {
        Operand::Byte(b) => Ok(b),
        _ => Err(malformed(insn)),
    }
}

fn operand_u16(insn: &Instruction) -> Result<u16, VmError> {
    match insn.operand {
        Operand::Index(i) => Ok(i),
        _ => Err(malformed(insn)),
    }
}

fn operand_target(insn: &Instruction) -> Result<usize, VmError> {
    match insn.operand {
        Operand::Branch(t) => Ok(t),
        _ => Err(malformed(insn)),
    }
}

fn malformed(insn: &Instruction) -> VmError {
    VmError::InvalidImage(format!("malformed operand for {} at pc {}", insn, insn.pc))
}

/// Local index of a load/store, explicit or encoded in the opcode.
fn local_index(insn: &Instruction) -> Result<usize, VmError> {
    match insn.opcode.implicit_local() {
        Some(n) => Ok(n as usize),
        None => Ok(operand_u8(insn)? as usize),
    }
}

/// Unsigned right shift within the value width.
fn ushr(word: WordWidth, a: i32, count: u32) -> i32 {
    let mask = ((1u64 << word.value_bits()) - 1) as u32;
    word.wrap((((a as u32) & mask) >> count) as i32)
}

/// Float to int conversion, saturating at the value range.
fn f2i(word: WordWidth, x: f32) -> i32 {
    (x as i64).clamp(word.min_int() as i64, word.max_int() as i64) as i32
}

fn fcmp(a: f32, b: f32, nan: i32) -> i32 {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) => 1,
        None => nan,
    }
}

impl Vm {
    /// Execute one instruction of the current frame.
    pub(crate) fn step(&mut self) -> Result<Flow, VmError> {
        let image = Rc::clone(&self.image);
        let (method_index, pc) = {
            let frame = self.frame()?;
            (frame.method, frame.pc)
        };
        let method = image.method(method_index)?;
        let code = image.method_code(method, self.config.nvmfile_flag)?;
        let insn = Instruction::decode(code, pc)?;

        if let Some(feature) = insn.opcode.feature() {
            if !feature.enabled(&self.config.features) {
                return Err(VmError::UnsupportedOpcode {
                    opcode: insn.opcode.byte(),
                    feature: feature.name(),
                });
            }
        }
        if self.config.trace {
            debug!(
                "{} {:5}: {:<24} depth={}",
                method.method_ref(),
                pc,
                insn.to_string(),
                self.stack.len()
            );
        }

        self.steps += 1;
        self.frame_mut()?.pc = insn.next_pc();
        self.execute(&insn)
    }

    fn jump(&mut self, target: usize) -> Result<(), VmError> {
        self.frame_mut()?.pc = target;
        Ok(())
    }

    fn branch_if(&mut self, insn: &Instruction, taken: bool) -> Result<(), VmError> {
        if taken {
            self.jump(operand_target(insn)?)?;
        }
        Ok(())
    }

    fn push_int(&mut self, n: i32) -> Result<(), VmError> {
        self.stack.push(Value::Int(self.config.word.wrap(n)))
    }

    fn int_binop(&mut self, op: &'static str, f: impl Fn(i32, i32) -> i32) -> Result<(), VmError> {
        let b = self.stack.pop_int(op)?;
        let a = self.stack.pop_int(op)?;
        self.push_int(f(a, b))
    }

    fn float_binop(&mut self, op: &'static str, f: impl Fn(f32, f32) -> f32) -> Result<(), VmError> {
        let b = self.stack.pop_float(op)?;
        let a = self.stack.pop_float(op)?;
        self.stack.push(Value::Float(f(a, b)))
    }

    fn array_ref(&mut self, op: &'static str) -> Result<(HeapRef, ArrayKind), VmError> {
        let r = self.stack.pop()?.as_heap_ref(op)?;
        let kind = self.heap.header(r)?.array_kind().ok_or(VmError::TypeMismatch {
            op,
            expected: "array",
            found: "object",
        })?;
        Ok((r, kind))
    }

    fn element_index(&self, r: HeapRef, index: i32) -> Result<usize, VmError> {
        let length = self.heap.len(r)?;
        if index < 0 || index as usize >= length {
            return Err(VmError::ArrayIndexOutOfBounds { index, length });
        }
        Ok(index as usize)
    }

    fn array_load(&mut self, op: &'static str) -> Result<(), VmError> {
        let index = self.stack.pop_int(op)?;
        let (r, _) = self.array_ref(op)?;
        let index = self.element_index(r, index)?;
        let value = self.heap.load(r, index)?;
        self.stack.push(value)
    }

    fn array_store(&mut self, op: &'static str) -> Result<(), VmError> {
        let value = self.stack.pop()?;
        let index = self.stack.pop_int(op)?;
        let (r, kind) = self.array_ref(op)?;
        let index = self.element_index(r, index)?;
        let value = kind.narrow(value, op)?;
        self.heap.store(r, index, value)
    }

    fn new_array(&mut self, kind: ArrayKind) -> Result<(), VmError> {
        let size = self.stack.pop_int("newarray")?;
        if size < 0 {
            return Err(VmError::NegativeArraySize { size });
        }
        let r = self.heap.allocate_array(kind, size as usize)?;
        self.stack.push(Value::Ref(r))
    }

    fn invoke(&mut self, insn: &Instruction) -> Result<(), VmError> {
        let raw = operand_u16(insn)?;
        let target = MethodRef::unpack(raw, self.config.native.layout());
        if self.config.native.is_native(target.class_id) {
            return self.call_native(target);
        }

        let inherit = self.config.features.inheritance;
        let resolved = self
            .image
            .resolve(&self.config, target.class_id, target.method_id, inherit)?;
        if insn.opcode != Opcode::Invokevirtual || !inherit {
            return self.call(resolved);
        }

        // virtual dispatch starts from the receiver's runtime class
        let Resolved::Method(index) = resolved else {
            return self.call(resolved);
        };
        let args = self.image.method(index)?.args as usize;
        if args == 0 {
            return self.call(resolved);
        }
        let receiver = self.stack.peek(args - 1)?;
        let runtime_class = match receiver {
            Value::Null | Value::Zero => return Err(VmError::NullReference { op: "invokevirtual" }),
            Value::Ref(r) => self.heap.header(r)?.class_id(),
            _ => None,
        };
        match runtime_class {
            Some(class_id) if class_id != target.class_id => {
                if !self.image.is_subclass(class_id, target.class_id) {
                    return Err(VmError::TypeMismatch {
                        op: "invokevirtual",
                        expected: "instance of the method's class",
                        found: "unrelated object",
                    });
                }
                let resolved = self
                    .image
                    .resolve(&self.config, class_id, target.method_id, true)?;
                self.call(resolved)
            }
            _ => self.call(resolved),
        }
    }

    fn execute(&mut self, insn: &Instruction) -> Result<Flow, VmError> {
        let word = self.config.word;
        use Opcode::*;
        match insn.opcode {
            Nop => {}
            AconstNull => self.stack.push(Value::Null)?,
            IconstM1 | Iconst0 | Iconst1 | Iconst2 | Iconst3 | Iconst4 | Iconst5 => {
                self.push_int(insn.opcode.byte() as i32 - Iconst0.byte() as i32)?
            }
            Fconst0 | Fconst1 | Fconst2 => self
                .stack
                .push(Value::Float((insn.opcode.byte() - Fconst0.byte()) as f32))?,
            Bipush | Sipush => match insn.operand {
                Operand::Int(n) => self.push_int(n)?,
                _ => return Err(malformed(insn)),
            },
            Ldc => {
                let index = operand_u8(insn)? as usize;
                match self.image.constant(index)?.clone() {
                    Constant::Int(n) => self.push_int(n)?,
                    Constant::Float(x) => {
                        if !self.config.features.float {
                            return Err(VmError::UnsupportedOpcode {
                                opcode: Ldc.byte(),
                                feature: "float",
                            });
                        }
                        self.stack.push(Value::Float(x))?
                    }
                    Constant::Str(_) => self.stack.push(Value::Const(index as u16))?,
                }
            }

            Iload | Fload | Aload | Iload0 | Iload1 | Iload2 | Iload3 | Fload0 | Fload1
            | Fload2 | Fload3 | Aload0 | Aload1 | Aload2 | Aload3 => {
                let value = self.frame()?.local(local_index(insn)?)?;
                self.stack.push(value)?
            }
            Istore | Fstore | Astore | Istore0 | Istore1 | Istore2 | Istore3 | Fstore0
            | Fstore1 | Fstore2 | Fstore3 | Astore0 | Astore1 | Astore2 | Astore3 => {
                let index = local_index(insn)?;
                let value = self.stack.pop()?;
                self.frame_mut()?.set_local(index, value)?
            }

            Iaload | Faload | Aaload | Baload | Caload | Saload => {
                self.array_load(insn.opcode.mnemonic())?
            }
            Iastore | Fastore | Aastore | Bastore | Castore | Sastore => {
                self.array_store(insn.opcode.mnemonic())?
            }

            Pop => {
                self.stack.pop()?;
            }
            Pop2 => {
                self.stack.pop_n(2)?;
            }
            Dup => {
                let v = self.stack.peek(0)?;
                self.stack.push(v)?
            }
            DupX1 => {
                let v1 = self.stack.pop()?;
                let v2 = self.stack.pop()?;
                self.stack.push(v1)?;
                self.stack.push(v2)?;
                self.stack.push(v1)?
            }
            Dup2 => {
                let v1 = self.stack.peek(0)?;
                let v2 = self.stack.peek(1)?;
                self.stack.push(v2)?;
                self.stack.push(v1)?
            }
            Swap => {
                let v1 = self.stack.pop()?;
                let v2 = self.stack.pop()?;
                self.stack.push(v1)?;
                self.stack.push(v2)?
            }

            Iadd => self.int_binop("iadd", i32::wrapping_add)?,
            Isub => self.int_binop("isub", i32::wrapping_sub)?,
            Imul => self.int_binop("imul", i32::wrapping_mul)?,
            Idiv | Irem => {
                let op = insn.opcode.mnemonic();
                let b = self.stack.pop_int(op)?;
                let a = self.stack.pop_int(op)?;
                if b == 0 {
                    return Err(VmError::DivisionByZero);
                }
                let n = if insn.opcode == Idiv {
                    a.wrapping_div(b)
                } else {
                    a.wrapping_rem(b)
                };
                self.push_int(n)?
            }
            Ineg => {
                let a = self.stack.pop_int("ineg")?;
                self.push_int(a.wrapping_neg())?
            }
            Ishl => self.int_binop("ishl", |a, b| a.wrapping_shl(b as u32 & 0x1f))?,
            Ishr => self.int_binop("ishr", |a, b| a >> (b as u32 & 0x1f))?,
            Iushr => self.int_binop("iushr", |a, b| ushr(word, a, b as u32 & 0x1f))?,
            Iand => self.int_binop("iand", |a, b| a & b)?,
            Ior => self.int_binop("ior", |a, b| a | b)?,
            Ixor => self.int_binop("ixor", |a, b| a ^ b)?,
            Iinc => {
                let Operand::Iinc { index, delta } = insn.operand else {
                    return Err(malformed(insn));
                };
                let frame = self.frame_mut()?;
                let n = frame.local(index as usize)?.as_int("iinc")?;
                frame.set_local(index as usize, Value::Int(word.wrap(n.wrapping_add(delta as i32))))?
            }
            I2b => {
                let a = self.stack.pop_int("i2b")?;
                self.push_int(a as i8 as i32)?
            }
            I2c => {
                let a = self.stack.pop_int("i2c")?;
                self.push_int(a as u16 as i32)?
            }
            I2s => {
                let a = self.stack.pop_int("i2s")?;
                self.push_int(a as i16 as i32)?
            }

            Fadd => self.float_binop("fadd", |a, b| a + b)?,
            Fsub => self.float_binop("fsub", |a, b| a - b)?,
            Fmul => self.float_binop("fmul", |a, b| a * b)?,
            Fdiv => self.float_binop("fdiv", |a, b| a / b)?,
            Frem => self.float_binop("frem", |a, b| a % b)?,
            Fneg => {
                let a = self.stack.pop_float("fneg")?;
                self.stack.push(Value::Float(-a))?
            }
            I2f => {
                let a = self.stack.pop_int("i2f")?;
                self.stack.push(Value::Float(a as f32))?
            }
            F2i => {
                let a = self.stack.pop_float("f2i")?;
                self.stack.push(Value::Int(f2i(word, a)))?
            }
            Fcmpl | Fcmpg => {
                let op = insn.opcode.mnemonic();
                let b = self.stack.pop_float(op)?;
                let a = self.stack.pop_float(op)?;
                let nan = if insn.opcode == Fcmpl { -1 } else { 1 };
                self.stack.push(Value::Int(fcmp(a, b, nan)))?
            }

            Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle => {
                let a = self.stack.pop_int(insn.opcode.mnemonic())?;
                let taken = match insn.opcode {
                    Ifeq => a == 0,
                    Ifne => a != 0,
                    Iflt => a < 0,
                    Ifge => a >= 0,
                    Ifgt => a > 0,
                    _ => a <= 0,
                };
                self.branch_if(insn, taken)?
            }
            IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge | IfIcmpgt | IfIcmple => {
                let op = insn.opcode.mnemonic();
                let b = self.stack.pop_int(op)?;
                let a = self.stack.pop_int(op)?;
                let taken = match insn.opcode {
                    IfIcmpeq => a == b,
                    IfIcmpne => a != b,
                    IfIcmplt => a < b,
                    IfIcmpge => a >= b,
                    IfIcmpgt => a > b,
                    _ => a <= b,
                };
                self.branch_if(insn, taken)?
            }
            IfAcmpeq | IfAcmpne => {
                let b = self.stack.pop()?;
                let a = self.stack.pop()?;
                self.branch_if(insn, a.same_reference(&b) == (insn.opcode == IfAcmpeq))?
            }
            Ifnull | Ifnonnull => {
                let a = self.stack.pop()?;
                self.branch_if(insn, a.is_null() == (insn.opcode == Ifnull))?
            }
            Goto => self.jump(operand_target(insn)?)?,
            Tableswitch => {
                let Operand::Table {
                    default,
                    low,
                    ref targets,
                } = insn.operand
                else {
                    return Err(malformed(insn));
                };
                let key = self.stack.pop_int("tableswitch")?;
                let offset = key as i64 - low as i64;
                let target = if (0..targets.len() as i64).contains(&offset) {
                    targets[offset as usize]
                } else {
                    default
                };
                self.jump(target)?
            }
            Lookupswitch => {
                let Operand::Lookup { default, ref pairs } = insn.operand else {
                    return Err(malformed(insn));
                };
                let key = self.stack.pop_int("lookupswitch")?;
                let target = pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map_or(default, |(_, t)| *t);
                self.jump(target)?
            }

            Ireturn | Freturn | Areturn => {
                let value = self.stack.pop()?;
                return self.return_from(Some(value));
            }
            Return => return self.return_from(None),

            Getstatic => {
                let index = operand_u16(insn)? as usize;
                let value = self.heap.load(self.statics, index)?;
                self.stack.push(value)?
            }
            Putstatic => {
                let index = operand_u16(insn)? as usize;
                let value = self.stack.pop()?;
                self.heap.store(self.statics, index, value)?
            }
            Getfield => {
                let index = operand_u16(insn)? as usize;
                let obj = self.stack.pop()?.as_heap_ref("getfield")?;
                let value = self.heap.load(obj, index)?;
                self.stack.push(value)?
            }
            Putfield => {
                let index = operand_u16(insn)? as usize;
                let value = self.stack.pop()?;
                let obj = self.stack.pop()?.as_heap_ref("putfield")?;
                self.heap.store(obj, index, value)?
            }

            Invokevirtual | Invokespecial | Invokestatic => self.invoke(insn)?,
            New => {
                let class_id = operand_u16(insn)?;
                if self.config.native.is_native(class_id) {
                    self.construct_native(class_id)?
                } else {
                    let fields = self.image.class(class_id)?.fields as usize;
                    let r = self.heap.allocate_object(class_id, fields)?;
                    self.stack.push(Value::Ref(r))?
                }
            }
            Newarray => {
                let atype = operand_u8(insn)?;
                let kind = ArrayKind::from_atype(atype).ok_or_else(|| {
                    VmError::InvalidImage(format!("unsupported array type {}", atype))
                })?;
                if kind == ArrayKind::Float && !self.config.features.float {
                    return Err(VmError::UnsupportedOpcode {
                        opcode: Newarray.byte(),
                        feature: "float",
                    });
                }
                self.new_array(kind)?
            }
            Anewarray => self.new_array(ArrayKind::Reference)?,
            Arraylength => {
                let (r, _) = self.array_ref("arraylength")?;
                let len = self.heap.len(r)?;
                self.push_int(len as i32)?
            }
        }
        Ok(Flow::Continue)
    }
}
