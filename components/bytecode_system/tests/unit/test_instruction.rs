//! Tests for instruction decoding

use bytecode_system::{CodeBuilder, Instruction, Opcode, Operand};
use core_types::VmError;

fn decode_all(code: &[u8]) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let insn = Instruction::decode(code, pc).unwrap();
        pc = insn.next_pc();
        out.push(insn);
    }
    out
}

#[test]
fn test_decode_sequence() {
    let mut code = CodeBuilder::new();
    code.push_int(100)
        .op_u8(Opcode::Istore, 4)
        .iinc(4, -1)
        .op_u8(Opcode::Iload, 4)
        .op(Opcode::Ireturn);
    let insns = decode_all(&code.finish().unwrap());
    let ops: Vec<Opcode> = insns.iter().map(|i| i.opcode).collect();
    assert_eq!(
        ops,
        vec![
            Opcode::Bipush,
            Opcode::Istore,
            Opcode::Iinc,
            Opcode::Iload,
            Opcode::Ireturn
        ]
    );
    assert_eq!(insns[0].operand, Operand::Int(100));
    assert_eq!(insns[2].operand, Operand::Iinc { index: 4, delta: -1 });
}

#[test]
fn test_tableswitch_targets_are_absolute() {
    let mut code = CodeBuilder::new();
    let (zero, one, other) = (code.label(), code.label(), code.label());
    code.op(Opcode::Iload0).tableswitch(5, &[zero, one], other);
    code.bind(zero).op(Opcode::Iconst0).op(Opcode::Ireturn);
    code.bind(one).op(Opcode::Iconst1).op(Opcode::Ireturn);
    code.bind(other).op(Opcode::IconstM1).op(Opcode::Ireturn);
    let bytes = code.finish().unwrap();

    let insn = Instruction::decode(&bytes, 1).unwrap();
    let end = insn.next_pc();
    // opcode at 1, padding to 4, then default, low, high and two targets
    assert_eq!(end, 24);
    assert_eq!(
        insn.operand,
        Operand::Table {
            default: end + 4,
            low: 5,
            targets: vec![end, end + 2],
        }
    );
}

#[test]
fn test_tableswitch_rejects_inverted_range() {
    let mut code = vec![0xaa, 0, 0, 0];
    for v in [4i32, 3, 2] {
        code.extend_from_slice(&v.to_be_bytes());
    }
    assert!(matches!(
        Instruction::decode(&code, 0),
        Err(VmError::InvalidImage(_))
    ));
}

#[test]
fn test_lookupswitch_rejects_negative_pairs() {
    let mut code = vec![0xab, 0, 0, 0];
    for v in [8i32, -1] {
        code.extend_from_slice(&v.to_be_bytes());
    }
    assert!(matches!(
        Instruction::decode(&code, 0),
        Err(VmError::InvalidImage(_))
    ));
}

#[test]
fn test_pc_past_end() {
    assert!(matches!(
        Instruction::decode(&[0xb1], 1),
        Err(VmError::InvalidImage(_))
    ));
}

#[test]
fn test_every_fixed_length_opcode_decodes() {
    for byte in 0..=u8::MAX {
        let op = match Opcode::from_byte(byte) {
            Some(op) => op,
            None => continue,
        };
        let Some(len) = op.operand_len() else { continue };
        if op.is_branch() {
            continue;
        }
        let mut code = vec![byte];
        code.extend(std::iter::repeat(0).take(len));
        let insn = Instruction::decode(&code, 0).unwrap();
        assert_eq!(insn.len, len + 1, "{}", op.mnemonic());
    }
}
