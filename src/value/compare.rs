//! Comparison operators over values.

use super::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Operator selects how two values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `===`: same variant and same value.
    Identical,
    /// `!==`
    NotIdentical,
    /// `==`: equal after numeric and truthiness coercion.
    Equal,
    /// `!=` or `<>`
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    /// `instance`: the left value is an object of the type named (or held) on the right.
    Instance,
}

/// Error returned when parsing an unknown operator symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown comparison operator: {}", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "===" => Ok(Operator::Identical),
            "!==" => Ok(Operator::NotIdentical),
            "==" => Ok(Operator::Equal),
            "!=" | "<>" => Ok(Operator::NotEqual),
            "<" => Ok(Operator::Less),
            ">" => Ok(Operator::Greater),
            "<=" => Ok(Operator::LessOrEqual),
            ">=" => Ok(Operator::GreaterOrEqual),
            "instance" => Ok(Operator::Instance),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Identical => "===",
            Operator::NotIdentical => "!==",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::Instance => "instance",
        };
        f.write_str(symbol)
    }
}

impl Operator {
    /// Applies the operator as `lhs <op> rhs`.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> bool {
        match self {
            Operator::Identical => lhs == rhs,
            Operator::NotIdentical => lhs != rhs,
            Operator::Equal => loose_eq(lhs, rhs),
            Operator::NotEqual => !loose_eq(lhs, rhs),
            Operator::Less => loose_cmp(lhs, rhs) == Some(Ordering::Less),
            Operator::Greater => loose_cmp(lhs, rhs) == Some(Ordering::Greater),
            Operator::LessOrEqual => matches!(
                loose_cmp(lhs, rhs),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::GreaterOrEqual => matches!(
                loose_cmp(lhs, rhs),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Instance => is_instance(lhs, rhs),
        }
    }
}

/// Parses `symbol` and applies it; None when the symbol is not an operator.
pub fn compare(lhs: &Value, rhs: &Value, symbol: &str) -> Option<bool> {
    symbol.parse::<Operator>().ok().map(|op| op.apply(lhs, rhs))
}

/// Equality after coercion: numbers (and numeric strings) compare by value,
/// booleans compare against the other side's truthiness.
pub fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    if lhs == rhs {
        return true;
    }
    match (lhs, rhs) {
        (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == other.is_truthy(),
        (Value::Null, other) | (other, Value::Null) => !other.is_truthy(),
        (Value::String(a), Value::String(b)) => match (lhs.as_number(), rhs.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Ordering after coercion; None when the two values have no meaningful order.
pub fn loose_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => match (lhs.as_number(), rhs.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.cmp(b)),
        },
        (Value::Bool(_), _) | (_, Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
            Some(lhs.is_truthy().cmp(&rhs.is_truthy()))
        }
        (Value::List(a), Value::List(b)) => Some(a.len().cmp(&b.len()).then_with(|| a.cmp(b))),
        (Value::Map(a), Value::Map(b)) => Some(a.len().cmp(&b.len()).then_with(|| a.cmp(b))),
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn is_instance(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Object(o), Value::String(class)) => &o.class == class,
        (Value::Object(a), Value::Object(b)) => a.class == b.class,
        _ => false,
    }
}
