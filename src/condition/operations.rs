// SPDX-License-Identifier: MIT

//! Operation registry
//!
//! An operation is a named predicate over `[field value, ...inputs]`. The registry
//! is an ordered, immutable table; lookup is first match by name. A name that is
//! not in the table yields `None`, which callers treat as a `false` outcome.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over the extracted field value followed by the configured inputs
pub type Predicate = fn(&[Value]) -> bool;

#[derive(Clone)]
pub struct Operation {
    pub name: String,
    /// Short human-readable label
    pub text: String,
    pub predicate: Predicate,
}

impl Operation {
    pub fn new(name: impl Into<String>, text: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            predicate,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: Vec<Operation>,
}

/// The standard comparison table, shared process-wide
pub static STANDARD_OPERATIONS: Lazy<Arc<OperationRegistry>> =
    Lazy::new(|| Arc::new(OperationRegistry::standard()));

impl OperationRegistry {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Operation::new("equalTo", "is equal to", equal_to),
            Operation::new("notEqualTo", "is not equal to", not_equal_to),
            Operation::new("greaterThan", "is greater than", greater_than),
            Operation::new("lessThan", "is less than", less_than),
            Operation::new("greaterThanOrEq", "is greater than or equal to", greater_than_or_eq),
            Operation::new("lessThanOrEq", "is less than or equal to", less_than_or_eq),
            Operation::new("between", "is between", between),
            Operation::new("notBetween", "is not between", not_between),
            Operation::new("textContains", "text contains", text_contains),
            Operation::new("textDoesNotContain", "text does not contain", text_does_not_contain),
            Operation::new("textStartsWith", "text starts with", text_starts_with),
            Operation::new("textEndsWith", "text ends with", text_ends_with),
            Operation::new("textIsExactly", "text is exactly", text_is_exactly),
            Operation::new("isUndefined", "is undefined", is_undefined),
            Operation::new("isDefined", "is defined", is_defined),
            Operation::new("enumValueIs", "is", enum_value_is),
            Operation::new("enumValueIsNot", "is not", enum_value_is_not),
        ])
    }

    pub fn lookup(&self, name: &str) -> Option<Predicate> {
        self.operations
            .iter()
            .find(|operation| operation.name == name)
            .map(|operation| operation.predicate)
    }

    /// Operations in table order
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|operation| operation.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Numbers, numeric strings and booleans coerce; everything else does not
fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare_numbers<F>(params: &[Value], cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (as_number(params.first()), as_number(params.get(1))) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Both operands present as non-empty text
fn compare_text<F>(params: &[Value], cmp: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    match (as_text(params.first()), as_text(params.get(1))) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => cmp(&a, &b),
        _ => false,
    }
}

fn equal_to(params: &[Value]) -> bool {
    compare_numbers(params, |a, b| a == b)
}

fn not_equal_to(params: &[Value]) -> bool {
    !equal_to(params)
}

fn greater_than(params: &[Value]) -> bool {
    compare_numbers(params, |a, b| a > b)
}

fn less_than(params: &[Value]) -> bool {
    compare_numbers(params, |a, b| a < b)
}

fn greater_than_or_eq(params: &[Value]) -> bool {
    compare_numbers(params, |a, b| a >= b)
}

fn less_than_or_eq(params: &[Value]) -> bool {
    compare_numbers(params, |a, b| a <= b)
}

fn bounds(params: &[Value]) -> Option<(f64, f64, f64)> {
    Some((
        as_number(params.first())?,
        as_number(params.get(1))?,
        as_number(params.get(2))?,
    ))
}

fn between(params: &[Value]) -> bool {
    bounds(params).is_some_and(|(value, low, high)| value > low && value < high)
}

fn not_between(params: &[Value]) -> bool {
    bounds(params).is_some_and(|(value, low, high)| value < low || value > high)
}

fn text_contains(params: &[Value]) -> bool {
    compare_text(params, |text, part| text.contains(part))
}

fn text_does_not_contain(params: &[Value]) -> bool {
    compare_text(params, |text, part| !text.contains(part))
}

fn text_starts_with(params: &[Value]) -> bool {
    compare_text(params, |text, prefix| text.starts_with(prefix))
}

fn text_ends_with(params: &[Value]) -> bool {
    compare_text(params, |text, suffix| text.ends_with(suffix))
}

fn text_is_exactly(params: &[Value]) -> bool {
    compare_text(params, |text, other| text == other)
}

fn is_undefined(params: &[Value]) -> bool {
    matches!(params.first(), None | Some(Value::Null))
}

fn is_defined(params: &[Value]) -> bool {
    !is_undefined(params)
}

fn enum_value_is(params: &[Value]) -> bool {
    match (as_number(params.first()), as_number(params.get(1))) {
        (Some(a), Some(b)) => a == b,
        _ => match (as_text(params.first()), as_text(params.get(1))) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn enum_value_is_not(params: &[Value]) -> bool {
    !enum_value_is(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, params: Vec<Value>) -> bool {
        let predicate = STANDARD_OPERATIONS.lookup(name).unwrap();
        predicate(&params)
    }

    #[test]
    fn test_lookup_unknown_is_none() {
        assert!(STANDARD_OPERATIONS.lookup("approximately").is_none());
        assert!(STANDARD_OPERATIONS.lookup("").is_none());
    }

    #[test]
    fn test_lookup_is_first_match() {
        let registry = OperationRegistry::new(vec![
            Operation::new("check", "first", |_| true),
            Operation::new("check", "second", |_| false),
        ]);
        let predicate = registry.lookup("check").unwrap();
        assert!(predicate(&[]));
    }

    #[test]
    fn test_standard_table_order() {
        let names: Vec<&str> = STANDARD_OPERATIONS.names().take(3).collect();
        assert_eq!(names, vec!["equalTo", "notEqualTo", "greaterThan"]);
        assert_eq!(STANDARD_OPERATIONS.len(), 17);
    }

    #[test]
    fn test_labels() {
        let labels: Vec<(&str, &str)> = STANDARD_OPERATIONS
            .iter()
            .map(|op| (op.name.as_str(), op.text.as_str()))
            .filter(|(name, _)| name.starts_with("enum"))
            .collect();
        assert_eq!(labels, vec![("enumValueIs", "is"), ("enumValueIsNot", "is not")]);
    }

    #[test]
    fn test_number_comparison() {
        assert!(run("greaterThan", vec![json!(15), json!(10)]));
        assert!(!run("greaterThan", vec![json!(5), json!(10)]));
        assert!(run("lessThan", vec![json!(5), json!(10)]));
        assert!(run("greaterThanOrEq", vec![json!(10), json!(10)]));
        assert!(run("lessThanOrEq", vec![json!(9.5), json!(10)]));
        assert!(run("equalTo", vec![json!(3), json!(3.0)]));
        assert!(run("notEqualTo", vec![json!(3), json!(4)]));
    }

    #[test]
    fn test_numeric_strings_coerce() {
        assert!(run("greaterThan", vec![json!("15"), json!(10)]));
        assert!(run("equalTo", vec![json!(10), json!("10")]));
    }

    #[test]
    fn test_missing_value_is_false() {
        assert!(!run("greaterThan", vec![Value::Null, json!(10)]));
        assert!(!run("lessThan", vec![json!("abc"), json!(10)]));
        assert!(!run("greaterThan", vec![json!(15)]));
    }

    #[test]
    fn test_between() {
        assert!(run("between", vec![json!(5), json!(1), json!(10)]));
        assert!(!run("between", vec![json!(10), json!(1), json!(10)]));
        assert!(run("notBetween", vec![json!(11), json!(1), json!(10)]));
        assert!(!run("notBetween", vec![json!(5), json!(1), json!(10)]));
        assert!(!run("between", vec![json!(5), json!(1)]));
    }

    #[test]
    fn test_text_operations() {
        assert!(run("textContains", vec![json!("hello world"), json!("world")]));
        assert!(!run("textContains", vec![json!("hello world"), json!("")]));
        assert!(run("textDoesNotContain", vec![json!("hello"), json!("xyz")]));
        assert!(run("textStartsWith", vec![json!("NOMINAL"), json!("NOM")]));
        assert!(run("textEndsWith", vec![json!("NOMINAL"), json!("NAL")]));
        assert!(run("textIsExactly", vec![json!("SAFE"), json!("SAFE")]));
        assert!(!run("textIsExactly", vec![json!("SAFE"), json!("safe")]));
        assert!(!run("textContains", vec![Value::Null, json!("a")]));
    }

    #[test]
    fn test_defined() {
        assert!(run("isUndefined", vec![Value::Null]));
        assert!(!run("isUndefined", vec![json!(0)]));
        assert!(run("isDefined", vec![json!(false)]));
    }

    #[test]
    fn test_enum_values() {
        assert!(run("enumValueIs", vec![json!(2), json!("2")]));
        assert!(run("enumValueIs", vec![json!("OFF"), json!("OFF")]));
        assert!(run("enumValueIsNot", vec![json!("ON"), json!("OFF")]));
    }
}
