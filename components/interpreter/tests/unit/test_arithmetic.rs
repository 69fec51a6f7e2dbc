//! Integer and float arithmetic

use bytecode_system::{CodeBuilder, Constant, Opcode};
use core_types::{Value, VmConfig, VmError};

use super::{program_with_main, run_code, run_program};

#[test]
fn test_int_arithmetic() {
    let mut code = CodeBuilder::new();
    code.push_int(7)
        .push_int(6)
        .op(Opcode::Imul)
        .push_int(2)
        .op(Opcode::Isub)
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(40))));
}

#[test]
fn test_division_truncates_toward_zero() {
    let mut code = CodeBuilder::new();
    code.push_int(-7)
        .push_int(2)
        .op(Opcode::Idiv)
        .push_int(-7)
        .push_int(2)
        .op(Opcode::Irem)
        .op(Opcode::Isub)
        .op(Opcode::Ireturn);
    // -3 - (-1)
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(-2))));
}

#[test]
fn test_division_by_zero() {
    for op in [Opcode::Idiv, Opcode::Irem] {
        let mut code = CodeBuilder::new();
        code.push_int(1).push_int(0).op(op).op(Opcode::Ireturn);
        assert_eq!(
            run_code(VmConfig::unix(), code, 0),
            Err(VmError::DivisionByZero)
        );
    }
}

#[test]
fn test_word16_addition_wraps() {
    let mut code = CodeBuilder::new();
    code.push_int(16383)
        .push_int(1)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(
        run_code(VmConfig::asuro(), code, 0),
        Ok(Some(Value::Int(-16384)))
    );
}

#[test]
fn test_word32_does_not_wrap_small_values() {
    let mut code = CodeBuilder::new();
    code.push_int(16383)
        .push_int(1)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(
        run_code(VmConfig::unix(), code, 0),
        Ok(Some(Value::Int(16384)))
    );
}

#[test]
fn test_shifts_and_bitwise() {
    let mut code = CodeBuilder::new();
    code.push_int(-16)
        .push_int(2)
        .op(Opcode::Ishr) // -4
        .push_int(3)
        .push_int(4)
        .op(Opcode::Ishl) // 48
        .op(Opcode::Ixor) // -4 ^ 48 = -52
        .push_int(0xff)
        .op(Opcode::Iand) // 204
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(204))));
}

#[test]
fn test_narrowing_conversions() {
    let mut code = CodeBuilder::new();
    code.push_int(200)
        .op(Opcode::I2b) // -56
        .push_int(-1)
        .op(Opcode::I2c) // 65535
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(
        run_code(VmConfig::unix(), code, 0),
        Ok(Some(Value::Int(65479)))
    );
}

#[test]
fn test_ldc_int_constant() {
    let mut code = CodeBuilder::new();
    code.op_u8(Opcode::Ldc, 0).op(Opcode::Ireturn);
    let mut program = program_with_main(code, 0);
    program.add_constant(Constant::Int(100_000));
    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Int(100_000)))
    );
}

#[test]
fn test_float_arithmetic() {
    let mut code = CodeBuilder::new();
    code.push_int(7)
        .op(Opcode::I2f)
        .op(Opcode::Fconst2)
        .op(Opcode::Fdiv)
        .op(Opcode::Dup)
        .op(Opcode::F2i) // 3
        .op(Opcode::I2f)
        .op(Opcode::Fsub)
        .op(Opcode::Freturn);
    assert_eq!(
        run_code(VmConfig::unix(), code, 0),
        Ok(Some(Value::Float(0.5)))
    );
}

#[test]
fn test_float_compare() {
    let mut code = CodeBuilder::new();
    code.op(Opcode::Fconst1)
        .op(Opcode::Fconst2)
        .op(Opcode::Fcmpl)
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(-1))));
}

#[test]
fn test_float_rejected_without_float_support() {
    let mut code = CodeBuilder::new();
    code.op(Opcode::Fconst1).op(Opcode::Freturn);
    assert_eq!(
        run_code(VmConfig::asuro(), code, 0),
        Err(VmError::UnsupportedOpcode {
            opcode: 0x0c,
            feature: "float"
        })
    );
}

#[test]
fn test_float_constant_rejected_without_float_support() {
    let mut code = CodeBuilder::new();
    code.op_u8(Opcode::Ldc, 0).op(Opcode::Ireturn);
    let mut program = program_with_main(code, 0);
    program.add_constant(Constant::Float(1.5));
    assert_eq!(
        run_program(VmConfig::asuro(), &program),
        Err(VmError::UnsupportedOpcode {
            opcode: 0x12,
            feature: "float"
        })
    );
}
