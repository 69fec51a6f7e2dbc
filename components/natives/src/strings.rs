//! String values as the natives see them.
//!
//! A string is either a constant-pool entry ([`Value::Const`]) or a heap
//! `char[]`/`byte[]` array. A `StringBuffer` is a one-slot block whose slot
//! holds its current `char[]` (or null while empty).

use bytecode_system::ProgramImage;
use core_types::{HeapRef, Value, VmError};
use memory_manager::{ArrayKind, Heap, ObjectKind};

/// Reads a string operand.
pub fn read_string(value: Value, heap: &Heap, image: &ProgramImage) -> Result<String, VmError> {
    match value {
        Value::Null | Value::Zero => Ok("null".to_string()),
        Value::Const(index) => Ok(image.string(index as usize)?.to_string()),
        Value::Ref(r) => read_heap_string(r, heap),
        other => Err(VmError::TypeMismatch {
            op: "string",
            expected: "string",
            found: other.type_name(),
        }),
    }
}

fn read_heap_string(r: HeapRef, heap: &Heap) -> Result<String, VmError> {
    let header = heap.header(r)?;
    match header.kind {
        ObjectKind::Array(ArrayKind::Char) => heap
            .slots(r)?
            .iter()
            .map(|v| Ok(to_char(v.as_int("string")?)))
            .collect(),
        ObjectKind::Array(ArrayKind::Byte) => heap
            .slots(r)?
            .iter()
            .map(|v| Ok(v.as_int("string")? as u8 as char))
            .collect(),
        // a StringBuffer used where a string is expected
        ObjectKind::Chunk if header.len == 1 => match heap.load(r, 0)? {
            Value::Null | Value::Zero => Ok(String::new()),
            Value::Ref(chars) => read_heap_string(chars, heap),
            other => Err(VmError::TypeMismatch {
                op: "string",
                expected: "char[]",
                found: other.type_name(),
            }),
        },
        _ => Err(VmError::TypeMismatch {
            op: "string",
            expected: "string",
            found: "object",
        }),
    }
}

/// Allocates `text` as a heap `char[]`.
pub fn alloc_string(text: &str, heap: &mut Heap) -> Result<HeapRef, VmError> {
    let chars: Vec<u32> = text.chars().map(|c| c as u32).collect();
    let r = heap.allocate_array(ArrayKind::Char, chars.len())?;
    for (i, c) in chars.into_iter().enumerate() {
        heap.store(r, i, Value::Int((c & 0xffff) as i32))?;
    }
    Ok(r)
}

/// Character for a `char` operand.
pub fn to_char(n: i32) -> char {
    char::from_u32((n as u32) & 0xffff).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Shortest decimal rendering of a float, Java style (`1.0`, `NaN`,
/// `Infinity`).
pub fn format_float(x: f32) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        ryu::Buffer::new().format_finite(x).to_string()
    }
}

/// Text rendering of a numeric operand for `print(int)`/`append(int)`.
pub fn format_int(value: Value, op: &'static str) -> Result<String, VmError> {
    Ok(value.as_int(op)?.to_string())
}
