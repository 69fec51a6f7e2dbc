//! Branches, switches, calls and returns

use bytecode_system::{CodeBuilder, Opcode, ProgramBuilder};
use core_types::{MethodRef, Value, VmConfig};

use super::{run_code, run_program, MAIN};

/// `main` calls static method 1.1 with `key` and returns its result.
fn call_with_key(key: i32, callee: CodeBuilder) -> ProgramBuilder {
    let mut main = CodeBuilder::new();
    main.push_int(key);
    main.invoke(Opcode::Invokestatic, MethodRef::new(1, 1)).unwrap();
    main.op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .method(MAIN, 0, 0, main.finish().unwrap())
        .method(MethodRef::new(1, 1), 1, 1, callee.finish().unwrap())
        .main(MAIN);
    program
}

fn table_switch() -> CodeBuilder {
    let mut code = CodeBuilder::new();
    let (one, two, other) = (code.label(), code.label(), code.label());
    code.op(Opcode::Iload0).tableswitch(1, &[one, two], other);
    code.bind(one).push_int(10).op(Opcode::Ireturn);
    code.bind(two).push_int(20).op(Opcode::Ireturn);
    code.bind(other).push_int(-1).op(Opcode::Ireturn);
    code
}

fn lookup_switch() -> CodeBuilder {
    let mut code = CodeBuilder::new();
    let (small, large, other) = (code.label(), code.label(), code.label());
    code.op(Opcode::Iload0)
        .lookupswitch(&[(1000, large), (-5, small)], other);
    code.bind(small).push_int(1).op(Opcode::Ireturn);
    code.bind(large).push_int(2).op(Opcode::Ireturn);
    code.bind(other).push_int(0).op(Opcode::Ireturn);
    code
}

#[test]
fn test_counting_loop() {
    // sum = 0; for (i = 1; i <= 10; i++) sum += i; return sum;
    let mut code = CodeBuilder::new();
    let (top, done) = (code.label(), code.label());
    code.op(Opcode::Iconst0)
        .op(Opcode::Istore0)
        .op(Opcode::Iconst1)
        .op(Opcode::Istore1);
    code.bind(top)
        .op(Opcode::Iload1)
        .push_int(10)
        .branch(Opcode::IfIcmpgt, done)
        .op(Opcode::Iload0)
        .op(Opcode::Iload1)
        .op(Opcode::Iadd)
        .op(Opcode::Istore0)
        .iinc(1, 1)
        .branch(Opcode::Goto, top);
    code.bind(done).op(Opcode::Iload0).op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 2), Ok(Some(Value::Int(55))));
}

#[test]
fn test_ifnull_branch() {
    let mut code = CodeBuilder::new();
    let is_null = code.label();
    code.op(Opcode::AconstNull)
        .branch(Opcode::Ifnull, is_null)
        .push_int(0)
        .op(Opcode::Ireturn);
    code.bind(is_null).push_int(1).op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(1))));
}

#[test]
fn test_tableswitch_cases_and_default() {
    for (key, expected) in [(1, 10), (2, 20), (0, -1), (3, -1), (-300, -1)] {
        let program = call_with_key(key, table_switch());
        assert_eq!(
            run_program(VmConfig::unix(), &program),
            Ok(Some(Value::Int(expected))),
            "key {}",
            key
        );
    }
}

#[test]
fn test_lookupswitch_cases_and_default() {
    for (key, expected) in [(-5, 1), (1000, 2), (7, 0)] {
        let program = call_with_key(key, lookup_switch());
        assert_eq!(
            run_program(VmConfig::asuro(), &program),
            Ok(Some(Value::Int(expected))),
            "key {}",
            key
        );
    }
}

#[test]
fn test_call_passes_arguments_in_order() {
    // 1.1(a, b) = a - b
    let mut callee = CodeBuilder::new();
    callee
        .op(Opcode::Iload0)
        .op(Opcode::Iload1)
        .op(Opcode::Isub)
        .op(Opcode::Ireturn);

    let mut main = CodeBuilder::new();
    main.push_int(10).push_int(3);
    main.invoke(Opcode::Invokestatic, MethodRef::new(1, 1)).unwrap();
    main.op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .method(MAIN, 0, 0, main.finish().unwrap())
        .method(MethodRef::new(1, 1), 2, 2, callee.finish().unwrap())
        .main(MAIN);
    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Int(7)))
    );
}

#[test]
fn test_recursive_factorial() {
    // 1.1(n) = n <= 1 ? 1 : n * 1.1(n - 1)
    let mut fact = CodeBuilder::new();
    let recurse = fact.label();
    fact.op(Opcode::Iload0)
        .op(Opcode::Iconst1)
        .branch(Opcode::IfIcmpgt, recurse)
        .op(Opcode::Iconst1)
        .op(Opcode::Ireturn);
    fact.bind(recurse)
        .op(Opcode::Iload0)
        .op(Opcode::Iload0)
        .op(Opcode::Iconst1)
        .op(Opcode::Isub);
    fact.invoke(Opcode::Invokestatic, MethodRef::new(1, 1))
        .unwrap();
    fact.op(Opcode::Imul).op(Opcode::Ireturn);

    let program = call_with_key(6, fact);
    assert_eq!(
        run_program(VmConfig::asuro(), &program),
        Ok(Some(Value::Int(720)))
    );
}

#[test]
fn test_persistent_code_runs() {
    let config = VmConfig::asuro();
    let mut code = CodeBuilder::new();
    code.push_int(3).op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .persistent(config.nvmfile_flag)
        .class(1, None, 0)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);
    assert_eq!(run_program(config, &program), Ok(Some(Value::Int(3))));
}
