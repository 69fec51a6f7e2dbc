//! Disassembler for `--print-bytecode`.

use std::fmt::Write;

use core_types::{MethodRef, VmConfig, VmError};

use crate::image::{Constant, MethodBody, ProgramImage};
use crate::instruction::{Instruction, Operand};

/// Disassembles one method body, one instruction per line.
pub fn disassemble(code: &[u8], config: &VmConfig) -> Result<Vec<String>, VmError> {
    let layout = config.native.layout();
    let mut lines = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let insn = Instruction::decode(code, pc)?;
        let line = match insn.operand {
            Operand::Index(raw) if insn.opcode.is_invoke() => {
                let target = MethodRef::unpack(raw, layout);
                let native = if config.native.is_native(target.class_id) {
                    " (native)"
                } else {
                    ""
                };
                format!("{:5}: {} {}{}", pc, insn.opcode.mnemonic(), target, native)
            }
            _ => format!("{:5}: {}", pc, insn),
        };
        lines.push(line);
        pc = insn.next_pc();
    }
    Ok(lines)
}

/// Renders the whole image: constants, classes and every method.
pub fn disassemble_image(image: &ProgramImage, config: &VmConfig) -> Result<String, VmError> {
    let mut out = String::new();
    let _ = writeln!(out, "entry {}", image.main);
    if image.static_fields > 0 {
        let _ = writeln!(out, "statics {}", image.static_fields);
    }
    for (i, constant) in image.constants.iter().enumerate() {
        let _ = match constant {
            Constant::Int(n) => writeln!(out, "const #{} int {}", i, n),
            Constant::Float(x) => writeln!(out, "const #{} float {:?}", i, x),
            Constant::Str(s) => writeln!(out, "const #{} str {:?}", i, s),
        };
    }
    for class in &image.classes {
        let _ = match class.parent {
            Some(parent) => writeln!(out, "class {} extends {} ({} fields)", class.id, parent, class.fields),
            None => writeln!(out, "class {} ({} fields)", class.id, class.fields),
        };
    }
    for method in &image.methods {
        let _ = write!(
            out,
            "method {} args={} locals={}",
            method.method_ref(),
            method.args,
            method.max_locals
        );
        match method.body {
            MethodBody::Native => {
                let _ = writeln!(out, " native");
            }
            MethodBody::Bytecode { .. } => {
                let _ = writeln!(out);
                for line in disassemble(image.method_code(method, config.nvmfile_flag)?, config)? {
                    let _ = writeln!(out, "{}", line);
                }
            }
        }
    }
    Ok(out)
}
