//! StringBuffer behaviour through the bridge

use bytecode_system::{ProgramBuilder, ProgramImage};
use core_types::{MethodRef, Value, VmConfig, VmError};
use memory_manager::{Heap, OperandStack};
use natives::ids::{self, printstream, stringbuffer};
use natives::strings::read_string;
use natives::{CapturedOutput, Console, NativeBridge, NativeContext};

struct Fixture {
    bridge: NativeBridge,
    output: CapturedOutput,
    heap: Heap,
    stack: OperandStack,
    image: ProgramImage,
}

impl Fixture {
    fn new(slots: usize) -> Self {
        let (console, output) = Console::captured();
        let mut program = ProgramBuilder::new();
        program.add_string("x=");
        Fixture {
            bridge: NativeBridge::for_config(&VmConfig::unix(), console).unwrap(),
            output,
            heap: Heap::with_slot_capacity(slots),
            stack: OperandStack::new(16),
            image: program.build(),
        }
    }

    fn call(&mut self, class_id: u16, method_id: u16) -> Result<(), VmError> {
        let mut ctx = NativeContext::new(&mut self.stack, &mut self.heap, &self.image);
        self.bridge
            .invoke(MethodRef::new(class_id, method_id), &mut ctx)
    }

    fn construct(&mut self) -> Result<(), VmError> {
        let mut ctx = NativeContext::new(&mut self.stack, &mut self.heap, &self.image);
        self.bridge.construct(ids::STRINGBUFFER, &mut ctx)
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value).unwrap();
    }
}

#[test]
fn test_new_init_append_to_string() {
    let mut f = Fixture::new(64);
    // new StringBuffer(); dup; invokespecial <init>
    f.construct().unwrap();
    let sb = f.stack.peek(0).unwrap();
    f.push(sb);
    f.call(ids::STRINGBUFFER, stringbuffer::INIT).unwrap();
    assert_eq!(f.stack.len(), 1);

    f.push(Value::Const(0));
    f.call(ids::STRINGBUFFER, stringbuffer::APPEND_STR).unwrap();
    f.push(Value::Int(42));
    f.call(ids::STRINGBUFFER, stringbuffer::APPEND_INT).unwrap();
    f.push(Value::Int('!' as i32));
    f.call(ids::STRINGBUFFER, stringbuffer::APPEND_CHAR).unwrap();
    assert_eq!(f.stack.peek(0).unwrap(), sb);

    f.call(ids::STRINGBUFFER, stringbuffer::TO_STRING).unwrap();
    let s = f.stack.pop().unwrap();
    assert!(f.stack.is_empty());
    assert_eq!(read_string(s, &f.heap, &f.image).unwrap(), "x=42!");
}

#[test]
fn test_init_with_string_and_print() {
    let mut f = Fixture::new(64);
    f.construct().unwrap();
    let sb = f.stack.peek(0).unwrap();
    f.push(sb);
    f.push(Value::Const(0));
    f.call(ids::STRINGBUFFER, stringbuffer::INIT_STR).unwrap();
    f.push(Value::Float(2.5));
    f.call(ids::STRINGBUFFER, stringbuffer::APPEND_FLOAT).unwrap();

    // System.out.println(sb.toString())
    f.call(ids::STRINGBUFFER, stringbuffer::TO_STRING).unwrap();
    let s = f.stack.pop().unwrap();
    f.push(Value::Int(0));
    f.push(s);
    f.call(ids::PRINTSTREAM, printstream::PRINTLN_STR).unwrap();
    assert_eq!(f.output.contents(), "x=2.5\n");
}

#[test]
fn test_empty_buffer_to_string() {
    let mut f = Fixture::new(8);
    f.construct().unwrap();
    let sb = f.stack.peek(0).unwrap();
    f.push(sb);
    f.call(ids::STRINGBUFFER, stringbuffer::INIT).unwrap();
    f.call(ids::STRINGBUFFER, stringbuffer::TO_STRING).unwrap();
    let s = f.stack.pop().unwrap();
    assert_eq!(read_string(s, &f.heap, &f.image).unwrap(), "");
}

#[test]
fn test_append_exhausts_heap() {
    // one slot for the buffer and two for "x=", nothing left for "x=1"
    let mut f = Fixture::new(3);
    f.construct().unwrap();
    let sb = f.stack.peek(0).unwrap();
    f.push(Value::Const(0));
    f.call(ids::STRINGBUFFER, stringbuffer::APPEND_STR).unwrap();
    assert_eq!(f.heap.free_slots(), 0);
    assert_eq!(f.stack.peek(0).unwrap(), sb);

    f.push(Value::Int(1));
    let err = f.call(ids::STRINGBUFFER, stringbuffer::APPEND_INT).unwrap_err();
    assert!(matches!(err, VmError::HeapExhausted { .. }));
}

#[test]
fn test_print_variants() {
    let mut f = Fixture::new(0);
    f.push(Value::Int(0));
    f.push(Value::Int(-7));
    f.call(ids::PRINTSTREAM, printstream::PRINT_INT).unwrap();
    f.push(Value::Int(0));
    f.push(Value::Int('A' as i32));
    f.call(ids::PRINTSTREAM, printstream::PRINT_CHAR).unwrap();
    f.push(Value::Int(0));
    f.call(ids::PRINTSTREAM, printstream::PRINTLN).unwrap();
    f.push(Value::Int(0));
    f.push(Value::Float(0.5));
    f.call(ids::PRINTSTREAM, printstream::PRINTLN_FLOAT).unwrap();
    assert_eq!(f.output.contents(), "-7A\n0.5\n");
    assert!(f.stack.is_empty());
}
