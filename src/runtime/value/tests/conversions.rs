//! Conversion tests for Value

use quickcheck::quickcheck;

use crate::runtime::value::Value;

#[test]
fn test_from_unit_and_option() {
    assert_eq!(Value::from(()), Value::Unit);
    assert_eq!(Value::from(None::<i64>), Value::Unit);
    assert_eq!(Value::from(Some(7i64)), Value::Int(7));
}

#[test]
fn test_from_panic_payloads() {
    let static_msg: Box<dyn std::any::Any + Send> = Box::new("boom");
    assert_eq!(Value::from_panic(static_msg), Value::string("boom"));

    let owned_msg: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
    assert_eq!(Value::from_panic(owned_msg), Value::string("owned boom"));

    let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
    assert_eq!(Value::from_panic(other), Value::string("handler panicked"));
}

#[test]
fn test_from_parse_error() {
    let err = "x".parse::<i64>().unwrap_err();
    let v = Value::from(err);
    assert!(v.as_str().is_some());
}

quickcheck! {
    fn prop_int_roundtrip(i: i64) -> bool {
        Value::from(i).to_int() == Some(i)
    }

    fn prop_string_roundtrip(s: String) -> bool {
        Value::from(s.clone()).as_str() == Some(s.as_str())
    }

    fn prop_list_preserves_len(items: Vec<i64>) -> bool {
        let len = items.len();
        Value::list(items).as_slice().map(|s| s.len()) == Some(len)
    }
}
