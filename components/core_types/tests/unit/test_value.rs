//! Tests for Value and HeapRef

use core_types::{HeapRef, Value, VmError};

#[test]
fn test_value_variants_are_distinct() {
    assert_ne!(Value::Int(0), Value::Null);
    assert_ne!(Value::Int(0), Value::Zero);
    assert_ne!(Value::Int(3), Value::Ref(HeapRef(3)));
    assert_ne!(Value::Const(3), Value::Ref(HeapRef(3)));
}

#[test]
fn test_reference_equality_is_handle_equality() {
    assert_eq!(Value::Ref(HeapRef(5)), Value::Ref(HeapRef(5)));
    assert_ne!(Value::Ref(HeapRef(5)), Value::Ref(HeapRef(6)));
}

#[test]
fn test_as_float() {
    assert_eq!(Value::Float(1.5).as_float("fadd").unwrap(), 1.5);
    assert_eq!(Value::Zero.as_float("fadd").unwrap(), 0.0);
    assert!(Value::Null.as_float("fadd").is_err());
    assert!(Value::Int(1).as_float("fadd").is_err());
}

#[test]
fn test_const_is_reference_but_not_heap_ref() {
    let v = Value::Const(0);
    assert!(v.is_reference());
    let err = v.as_heap_ref("getfield").unwrap_err();
    assert_eq!(
        err,
        VmError::TypeMismatch {
            op: "getfield",
            expected: "ref",
            found: "const"
        }
    );
}

#[test]
fn test_from_conversions() {
    assert_eq!(Value::from(9), Value::Int(9));
    assert_eq!(Value::from(HeapRef(1)), Value::Ref(HeapRef(1)));
    assert_eq!(HeapRef(4).index(), 4);
}
