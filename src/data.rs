use std::{cmp::Ordering, fmt};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A single typed cell of the canonical table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
}

/// How a column's cells are typed; drives parsing of filter operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
}

impl Eq for Value {}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_number(*f),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(_) => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::String(_), _) => Ordering::Greater,
            (_, Value::String(_)) => Ordering::Less,
            (left, right) => {
                let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
                    return Ordering::Equal;
                };
                l.total_cmp(&r)
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Null-aware ordering wrapper: nulls sort first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparableValue(pub Option<Value>);

impl Ord for ComparableValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.cmp(right),
        }
    }
}

impl PartialOrd for ComparableValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parses a survey number, accepting a decimal comma (`"40,5"`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) if !trimmed.contains('.') && trimmed.matches(',').count() == 1 => {
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    parsed.is_finite().then_some(parsed)
}

pub fn parse_typed_value(raw: &str, kind: ValueKind) -> Result<Option<Value>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = match kind {
        ValueKind::Text => Value::String(raw.to_string()),
        ValueKind::Integer => Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("Failed to parse '{raw}' as integer"))?,
        ),
        ValueKind::Float => Value::Float(
            parse_number(raw).with_context(|| format!("Failed to parse '{raw}' as number"))?,
        ),
    };
    Ok(Some(parsed))
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let rendered = format!("{value:.4}");
        rendered.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_accepts_decimal_comma() {
        assert_eq!(parse_number("40,5"), Some(40.5));
        assert_eq!(parse_number(" 12 "), Some(12.0));
        assert_eq!(parse_number("1,000,000"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn parse_typed_value_handles_empty_and_numeric_inputs() {
        assert_eq!(parse_typed_value("", ValueKind::Float).unwrap(), None);
        assert_eq!(
            parse_typed_value("7.5", ValueKind::Float).unwrap(),
            Some(Value::Float(7.5))
        );
        assert_eq!(
            parse_typed_value("3", ValueKind::Integer).unwrap(),
            Some(Value::Integer(3))
        );
        assert!(parse_typed_value("high", ValueKind::Integer).is_err());
    }

    #[test]
    fn numeric_variants_compare_across_types() {
        assert!(Value::Integer(2) < Value::Float(2.5));
        assert!(Value::Float(3.0) > Value::Integer(2));
        assert!(Value::Float(1.0) < Value::String("a".into()));
    }

    #[test]
    fn comparable_value_orders_none_before_some() {
        let none = ComparableValue(None);
        let some = ComparableValue(Some(Value::Integer(0)));
        assert!(none < some);
    }

    #[test]
    fn format_number_trims_trailing_zeros() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(5.25), "5.25");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
    }
}
