use crate::value::Value;
use std::cmp::Ordering;

/// Equality used by finders and filters.
///
/// Integers and floats compare numerically; records compare by identity;
/// every other pairing requires the same variant.
#[must_use]
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_float() == right.as_float()
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y))
        }
        _ => left == right,
    }
}

/// Ordering used by `order_by`, `minimum` and `maximum`.
///
/// Null sorts first. Returns `None` for pairs with no natural order
/// (mixed families, lists, records).
#[must_use]
pub fn order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_float()?.partial_cmp(&right.as_float()?)
        }
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
