//! Objects, fields, statics, arrays and native classes

use bytecode_system::{CodeBuilder, Opcode, ProgramBuilder};
use core_types::{MethodRef, Value, VmConfig, VmError};
use interpreter::Vm;
use natives::ids::{self, printstream, stringbuffer};
use natives::{Console, FamilyKind, NativeContext, NativeFamily};

use super::{run_code, run_program, MAIN};

const INT_ARRAY: u8 = 10;
const BYTE_ARRAY: u8 = 8;

#[test]
fn test_instance_fields() {
    let mut code = CodeBuilder::new();
    code.op_u16(Opcode::New, 1)
        .op(Opcode::Dup)
        .push_int(9)
        .op_u16(Opcode::Putfield, 1)
        .op_u16(Opcode::Getfield, 1)
        .op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, Some(ids::OBJECT), 2)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);
    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Int(9)))
    );
}

#[test]
fn test_static_fields() {
    let mut code = CodeBuilder::new();
    code.push_int(5)
        .op_u16(Opcode::Putstatic, 0)
        .op_u16(Opcode::Getstatic, 0)
        .push_int(2)
        .op(Opcode::Imul)
        .op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .static_fields(1)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);

    let (console, _output) = Console::captured();
    let mut vm = Vm::with_console(VmConfig::unix(), program.build(), console).unwrap();
    assert_eq!(vm.run_main(), Ok(Some(Value::Int(10))));
    assert_eq!(vm.static_field(0), Ok(Value::Int(5)));
}

#[test]
fn test_int_array_store_load_length() {
    let mut code = CodeBuilder::new();
    code.push_int(3)
        .op_u8(Opcode::Newarray, INT_ARRAY)
        .op(Opcode::Astore0)
        .op(Opcode::Aload0)
        .push_int(1)
        .push_int(42)
        .op(Opcode::Iastore)
        .op(Opcode::Aload0)
        .push_int(1)
        .op(Opcode::Iaload)
        .op(Opcode::Aload0)
        .op(Opcode::Arraylength)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 1), Ok(Some(Value::Int(45))));
}

#[test]
fn test_byte_array_narrows_on_store() {
    let mut code = CodeBuilder::new();
    code.push_int(1)
        .op_u8(Opcode::Newarray, BYTE_ARRAY)
        .op(Opcode::Dup)
        .push_int(0)
        .push_int(200)
        .op(Opcode::Bastore)
        .push_int(0)
        .op(Opcode::Baload)
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(-56))));
}

#[test]
fn test_fresh_array_reads_zero() {
    let mut code = CodeBuilder::new();
    code.push_int(2)
        .op_u8(Opcode::Newarray, INT_ARRAY)
        .push_int(1)
        .op(Opcode::Iaload)
        .push_int(1)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(run_code(VmConfig::unix(), code, 0), Ok(Some(Value::Int(1))));
}

#[test]
fn test_reference_array() {
    let mut code = CodeBuilder::new();
    code.push_int(2)
        .op_u16(Opcode::Anewarray, 1)
        .op(Opcode::Dup)
        .push_int(0)
        .op_u16(Opcode::New, 1)
        .op(Opcode::Aastore)
        .push_int(0)
        .op(Opcode::Aaload)
        .op(Opcode::Areturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);
    assert!(matches!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Ref(_)))
    ));
}

#[test]
fn test_virtual_dispatch_uses_runtime_class() {
    // class 2 extends 1 and overrides 1.1; class 1 also defines 1.2
    let mut main = CodeBuilder::new();
    main.op_u16(Opcode::New, 2).op(Opcode::Astore0).op(Opcode::Aload0);
    main.invoke(Opcode::Invokevirtual, MethodRef::new(1, 1)).unwrap();
    main.op(Opcode::Aload0);
    main.invoke(Opcode::Invokevirtual, MethodRef::new(2, 2)).unwrap();
    main.op(Opcode::Iadd).op(Opcode::Ireturn);

    let returns = |n: i32| {
        let mut code = CodeBuilder::new();
        code.push_int(n).op(Opcode::Ireturn);
        code.finish().unwrap()
    };

    let mut program = ProgramBuilder::new();
    program
        .class(1, Some(ids::OBJECT), 0)
        .class(2, Some(1), 0)
        .method(MAIN, 0, 1, main.finish().unwrap())
        .method(MethodRef::new(1, 1), 1, 1, returns(1))
        .method(MethodRef::new(1, 2), 1, 1, returns(100))
        .method(MethodRef::new(2, 1), 1, 1, returns(2))
        .main(MAIN);

    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Int(102)))
    );

    let mut flat = VmConfig::unix();
    flat.features.inheritance = false;
    assert_eq!(
        run_program(flat, &program),
        Err(VmError::UnresolvedMethod {
            class_id: 2,
            method_id: 2
        })
    );
}

#[test]
fn test_virtual_dispatch_unresolved_at_root() {
    // class 2 extends the parentless class 1; neither declares method 5
    let mut main = CodeBuilder::new();
    main.op_u16(Opcode::New, 2);
    main.invoke(Opcode::Invokevirtual, MethodRef::new(2, 5)).unwrap();
    main.op(Opcode::Ireturn);

    let mut helper = CodeBuilder::new();
    helper.push_int(1).op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .class(2, Some(1), 0)
        .method(MAIN, 0, 0, main.finish().unwrap())
        .method(MethodRef::new(1, 1), 1, 1, helper.finish().unwrap())
        .main(MAIN);

    let config = VmConfig::unix();
    assert!(config.features.inheritance);
    assert_eq!(
        run_program(config, &program),
        Err(VmError::UnresolvedMethod {
            class_id: 2,
            method_id: 5
        })
    );
}

#[test]
fn test_virtual_dispatch_rejects_unrelated_receiver() {
    // class 3 does not derive from class 1
    let mut main = CodeBuilder::new();
    main.op_u16(Opcode::New, 3);
    main.invoke(Opcode::Invokevirtual, MethodRef::new(1, 1)).unwrap();
    main.op(Opcode::Ireturn);

    let returns = |n: i32| {
        let mut code = CodeBuilder::new();
        code.push_int(n).op(Opcode::Ireturn);
        code.finish().unwrap()
    };

    let mut program = ProgramBuilder::new();
    program
        .class(1, Some(ids::OBJECT), 0)
        .class(3, Some(ids::OBJECT), 0)
        .method(MAIN, 0, 0, main.finish().unwrap())
        .method(MethodRef::new(1, 1), 1, 1, returns(1))
        .method(MethodRef::new(3, 1), 1, 1, returns(3))
        .main(MAIN);
    assert!(matches!(
        run_program(VmConfig::unix(), &program),
        Err(VmError::TypeMismatch {
            op: "invokevirtual",
            ..
        })
    ));
}

#[test]
fn test_unwritten_field_reads_as_zero_or_null() {
    let mut code = CodeBuilder::new();
    let null = code.label();
    code.op_u16(Opcode::New, 1)
        .op(Opcode::Astore0)
        .op(Opcode::Aload0)
        .op_u16(Opcode::Getfield, 1)
        .branch(Opcode::Ifnull, null)
        .push_int(-1)
        .op(Opcode::Ireturn);
    code.bind(null)
        .op(Opcode::Aload0)
        .op_u16(Opcode::Getfield, 0)
        .push_int(3)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);

    let mut program = ProgramBuilder::new();
    program
        .class(1, Some(ids::OBJECT), 2)
        .method(MAIN, 0, 1, code.finish().unwrap())
        .main(MAIN);
    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Ok(Some(Value::Int(3)))
    );
}

#[test]
fn test_null_is_not_an_integer() {
    let mut code = CodeBuilder::new();
    code.op(Opcode::AconstNull)
        .push_int(1)
        .op(Opcode::Iadd)
        .op(Opcode::Ireturn);
    assert_eq!(
        run_code(VmConfig::unix(), code, 0),
        Err(VmError::TypeMismatch {
            op: "iadd",
            expected: "int",
            found: "null"
        })
    );
}

/// Robot family answering every call with a fixed sensor reading.
struct Odometer;

impl NativeFamily for Odometer {
    fn name(&self) -> &'static str {
        "odometer"
    }

    fn handles(&self, class_id: u16) -> bool {
        class_id == ids::ASURO
    }

    fn invoke(&mut self, _method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        ctx.stack.push(Value::Int(64))
    }
}

fn read_odometer() -> ProgramBuilder {
    let mut code = CodeBuilder::new();
    code.invoke(Opcode::Invokestatic, MethodRef::new(ids::ASURO, 4))
        .unwrap();
    code.op(Opcode::Ireturn);
    let mut program = ProgramBuilder::new();
    program
        .class(1, None, 0)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);
    program
}

#[test]
fn test_embedder_registers_robot_family() {
    let (console, _output) = Console::captured();
    let mut vm = Vm::with_console(VmConfig::asuro(), read_odometer().build(), console).unwrap();
    assert_eq!(
        vm.run_main(),
        Err(VmError::UnknownNativeClass { class_id: ids::ASURO })
    );

    vm.bridge_mut()
        .register(FamilyKind::Robot, Box::new(Odometer))
        .unwrap();
    assert_eq!(vm.run_main(), Ok(Some(Value::Int(64))));
}

#[test]
fn test_robot_family_refused_on_host_profile() {
    let (console, _output) = Console::captured();
    let mut vm = Vm::with_console(VmConfig::unix(), read_odometer().build(), console).unwrap();
    assert!(matches!(
        vm.bridge_mut().register(FamilyKind::Robot, Box::new(Odometer)),
        Err(VmError::InvalidConfig(_))
    ));
    assert_eq!(
        vm.run_main(),
        Err(VmError::UnknownNativeClass { class_id: ids::ASURO })
    );
}

#[test]
fn test_native_marked_method_without_family() {
    // Object.<init> is served by the bridge; 1.1 is native-marked but no
    // family handles class 1
    let mut main = CodeBuilder::new();
    main.op_u16(Opcode::New, 1).op(Opcode::Dup);
    main.invoke(Opcode::Invokespecial, MethodRef::new(ids::OBJECT, ids::METHOD_INIT))
        .unwrap();
    main.invoke(Opcode::Invokevirtual, MethodRef::new(1, 1)).unwrap();
    main.op(Opcode::Return);

    let mut program = ProgramBuilder::new();
    program
        .class(1, Some(ids::OBJECT), 0)
        .method(MAIN, 0, 0, main.finish().unwrap())
        .native_method(MethodRef::new(1, 1), 1)
        .main(MAIN);
    assert_eq!(
        run_program(VmConfig::unix(), &program),
        Err(VmError::UnknownNativeClass { class_id: 1 })
    );
}

#[test]
fn test_string_buffer_program() {
    // System.out.println(new StringBuffer().append("x=").append(42).toString())
    let mut program = ProgramBuilder::new();
    let prefix = program.add_string("x=");

    let sb = |m: u16| MethodRef::new(ids::STRINGBUFFER, m);
    let mut code = CodeBuilder::new();
    code.push_int(0) // System.out
        .op_u16(Opcode::New, ids::STRINGBUFFER)
        .op(Opcode::Dup);
    code.invoke(Opcode::Invokespecial, sb(stringbuffer::INIT))
        .unwrap();
    code.op_u8(Opcode::Ldc, prefix);
    code.invoke(Opcode::Invokevirtual, sb(stringbuffer::APPEND_STR))
        .unwrap();
    code.push_int(42);
    code.invoke(Opcode::Invokevirtual, sb(stringbuffer::APPEND_INT))
        .unwrap();
    code.invoke(Opcode::Invokevirtual, sb(stringbuffer::TO_STRING))
        .unwrap();
    code.invoke(
        Opcode::Invokevirtual,
        MethodRef::new(ids::PRINTSTREAM, printstream::PRINTLN_STR),
    )
    .unwrap();
    code.op(Opcode::Return);

    program
        .class(1, Some(ids::OBJECT), 0)
        .method(MAIN, 0, 0, code.finish().unwrap())
        .main(MAIN);

    let (console, output) = Console::captured();
    let mut vm = Vm::with_console(VmConfig::unix(), program.build(), console).unwrap();
    assert_eq!(vm.run_main(), Ok(None));
    assert_eq!(output.contents(), "x=42\n");
    assert!(vm.stack().is_empty());
}
