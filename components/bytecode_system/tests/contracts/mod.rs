//! Contract tests for bytecode_system

use bytecode_system::{CodeBuilder, Feature, Instruction, Opcode, Operand};
use core_types::{Features, MethodRef, RefLayout, VmConfig};

/// Contract: invoke operands decode to the packed method reference
#[test]
fn contract_invoke_operand_is_packed_reference() {
    let mut code = CodeBuilder::new();
    code.invoke(Opcode::Invokestatic, MethodRef::new(19, 3))
        .unwrap();
    let insn = Instruction::decode(&code.finish().unwrap(), 0).unwrap();
    let Operand::Index(raw) = insn.operand else {
        panic!("expected index operand");
    };
    assert_eq!(MethodRef::unpack(raw, RefLayout::DEFAULT), MethodRef::new(19, 3));
}

/// Contract: every opcode names the feature it needs, matching the profiles
#[test]
fn contract_feature_gating() {
    let asuro = VmConfig::asuro().features;
    assert!(!Feature::Float.enabled(&asuro));
    assert!(Feature::Arrays.enabled(&asuro));
    assert!(Feature::Switch.enabled(&asuro));

    let none = Features {
        arrays: false,
        switch: false,
        inheritance: false,
        float: false,
    };
    for op in [Opcode::Newarray, Opcode::Iaload, Opcode::Tableswitch, Opcode::Fadd] {
        let feature = op.feature().unwrap();
        assert!(!feature.enabled(&none), "{}", op.mnemonic());
    }
}

/// Contract: translated programs use JVM opcode numbers
#[test]
fn contract_jvm_numbering() {
    assert_eq!(Opcode::Iadd.byte(), 0x60);
    assert_eq!(Opcode::Invokevirtual.byte(), 0xb6);
    assert_eq!(Opcode::Tableswitch.byte(), 0xaa);
    assert_eq!(Opcode::Return.byte(), 0xb1);
}
