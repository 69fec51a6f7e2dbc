//! Instruction decoding
//!
//! Decodes one instruction (opcode plus immediates) from a method's code.
//! Branch and switch offsets are resolved to absolute positions within the
//! method, so the interpreter only ever deals with targets.

use std::fmt;

use core_types::VmError;

use crate::opcode::Opcode;

/// Immediate operands of a decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No immediates
    None,
    /// Unsigned byte: local index, constant index or array type code
    Byte(u8),
    /// Sign-extended immediate of `bipush`/`sipush`
    Int(i32),
    /// 16-bit index: packed method reference, field, static or class id
    Index(u16),
    /// Absolute branch target
    Branch(usize),
    /// `iinc` local index and signed delta
    Iinc {
        /// Local variable
        index: u8,
        /// Increment
        delta: i8,
    },
    /// `tableswitch` jump table
    Table {
        /// Target when the key is outside `low..low + targets.len()`
        default: usize,
        /// Key of the first entry
        low: i32,
        /// Absolute targets, one per key
        targets: Vec<usize>,
    },
    /// `lookupswitch` match/target pairs
    Lookup {
        /// Target when no key matches
        default: usize,
        /// Keys with their absolute targets
        pairs: Vec<(i32, usize)>,
    },
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Position of the opcode within the method
    pub pc: usize,
    /// Operation
    pub opcode: Opcode,
    /// Immediates
    pub operand: Operand,
    /// Encoded length in bytes, opcode included
    pub len: usize,
}

struct Reader<'a> {
    code: &'a [u8],
    at: usize,
    pc: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], VmError> {
        let end = self.at + n;
        if end > self.code.len() {
            return Err(VmError::InvalidImage(format!(
                "truncated instruction at pc {}",
                self.pc
            )));
        }
        let bytes = &self.code[self.at..end];
        self.at = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, VmError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, VmError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> Result<i32, VmError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn target(&self, offset: i32) -> Result<usize, VmError> {
        let target = self.pc as i64 + offset as i64;
        if target < 0 || target >= self.code.len() as i64 {
            return Err(VmError::InvalidImage(format!(
                "branch at pc {} targets {} outside the method",
                self.pc, target
            )));
        }
        Ok(target as usize)
    }
}

impl Instruction {
    /// Decodes the instruction starting at `pc`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytecode_system::{Instruction, Opcode, Operand};
    ///
    /// let code = [0x11, 0x01, 0x00, 0xb1];
    /// let insn = Instruction::decode(&code, 0).unwrap();
    /// assert_eq!(insn.opcode, Opcode::Sipush);
    /// assert_eq!(insn.operand, Operand::Int(256));
    /// assert_eq!(insn.next_pc(), 3);
    /// ```
    pub fn decode(code: &[u8], pc: usize) -> Result<Instruction, VmError> {
        let byte = *code.get(pc).ok_or_else(|| {
            VmError::InvalidImage(format!("pc {} beyond end of method", pc))
        })?;
        let opcode = Opcode::from_byte(byte).ok_or(VmError::InvalidOpcode { opcode: byte, pc })?;
        let mut r = Reader {
            code,
            at: pc + 1,
            pc,
        };

        use Opcode::*;
        let operand = match opcode {
            Bipush => Operand::Int(r.u8()? as i8 as i32),
            Sipush => Operand::Int(r.u16()? as i16 as i32),
            Ldc | Iload | Fload | Aload | Istore | Fstore | Astore | Newarray => {
                Operand::Byte(r.u8()?)
            }
            Iinc => {
                let index = r.u8()?;
                let delta = r.u8()? as i8;
                Operand::Iinc { index, delta }
            }
            Getstatic | Putstatic | Getfield | Putfield | Invokevirtual | Invokespecial
            | Invokestatic | New | Anewarray => Operand::Index(r.u16()?),
            op if op.is_branch() => {
                let offset = r.u16()? as i16 as i32;
                Operand::Branch(r.target(offset)?)
            }
            Tableswitch => {
                r.at = (pc + 4) & !3;
                let default = r.i32()?;
                let low = r.i32()?;
                let high = r.i32()?;
                if high < low {
                    return Err(VmError::InvalidImage(format!(
                        "tableswitch at pc {} has high {} below low {}",
                        pc, high, low
                    )));
                }
                let count = (high as i64 - low as i64 + 1) as usize;
                if count > code.len() / 4 {
                    return Err(VmError::InvalidImage(format!(
                        "truncated instruction at pc {}",
                        pc
                    )));
                }
                let default = r.target(default)?;
                let mut targets = Vec::with_capacity(count);
                for _ in 0..count {
                    let offset = r.i32()?;
                    targets.push(r.target(offset)?);
                }
                Operand::Table {
                    default,
                    low,
                    targets,
                }
            }
            Lookupswitch => {
                r.at = (pc + 4) & !3;
                let default = r.i32()?;
                let npairs = r.i32()?;
                if npairs < 0 || npairs as usize > code.len() / 8 {
                    return Err(VmError::InvalidImage(format!(
                        "lookupswitch at pc {} has invalid pair count {}",
                        pc, npairs
                    )));
                }
                let default = r.target(default)?;
                let mut pairs = Vec::with_capacity(npairs as usize);
                for _ in 0..npairs {
                    let key = r.i32()?;
                    let offset = r.i32()?;
                    pairs.push((key, r.target(offset)?));
                }
                Operand::Lookup { default, pairs }
            }
            _ => Operand::None,
        };

        Ok(Instruction {
            pc,
            opcode,
            operand,
            len: r.at - pc,
        })
    }

    /// Position of the following instruction.
    pub fn next_pc(&self) -> usize {
        self.pc + self.len
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Byte(b) => write!(f, " {}", b),
            Operand::Int(n) => write!(f, " {}", n),
            Operand::Index(i) => write!(f, " #{}", i),
            Operand::Branch(t) => write!(f, " -> {}", t),
            Operand::Iinc { index, delta } => write!(f, " {} {}", index, delta),
            Operand::Table {
                default,
                low,
                targets,
            } => {
                for (i, t) in targets.iter().enumerate() {
                    write!(f, " {}:{}", *low as i64 + i as i64, t)?;
                }
                write!(f, " default:{}", default)
            }
            Operand::Lookup { default, pairs } => {
                for (key, t) in pairs {
                    write!(f, " {}:{}", key, t)?;
                }
                write!(f, " default:{}", default)
            }
        }
    }
}
