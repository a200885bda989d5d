use std::{cmp::Ordering, collections::HashMap};

/// A runtime value.
///
/// Scripts are dynamically typed. Variables hold scalars; record buffers
/// hold objects fetched from a record store. Integers and floats are kept
/// apart so that whole-number arithmetic stays exact.
///
/// # Examples
///
/// ```
/// use mini4gl::Value;
///
/// assert!(!Value::String(String::new()).is_truthy());
/// assert!(Value::Integer(3).loose_equals(&Value::String("3".into())));
/// assert_eq!(Value::Float(2.0).as_text(), "2");
/// assert_eq!(Value::Null.display_text(), "?");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The unknown value, written `?`
    #[default]
    Null,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    String(String),

    Array(Vec<Value>),

    /// A record or other keyed structure
    Object(HashMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "unknown",
            Value::Boolean(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Float(_) => "decimal",
            Value::String(_) => "character",
            Value::Array(_) => "array",
            Value::Object(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by IF, WHILE, AND, OR and NOT.
    ///
    /// False: null, `false`, zero, NaN and the empty string. Everything else,
    /// records included, is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Numeric coercion.
    ///
    /// Null and the empty (or blank) string are 0, logicals are 1 or 0,
    /// strings are parsed after trimming, and anything unparseable is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(items) if items.is_empty() => 0.0,
            Value::Array(items) if items.len() == 1 => items[0].to_number(),
            Value::Array(_) | Value::Object(_) => f64::NAN,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String coercion used by concatenation and the string builtins.
    /// Null becomes the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::as_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => crate::output::to_json(self),
        }
    }

    /// Text written by DISPLAY for an unformatted value. Null shows as `?`.
    pub fn display_text(&self) -> String {
        match self {
            Value::Null => "?".to_string(),
            other => other.as_text(),
        }
    }

    /// Builds a number, keeping whole results in the integer variant.
    pub fn from_f64(n: f64) -> Value {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
            Value::Integer(n as i64)
        } else {
            Value::Float(n)
        }
    }

    /// Loose equality used by `=` and `<>`.
    ///
    /// - null equals only null
    /// - two strings compare exactly
    /// - a number against a string compares numerically
    /// - logicals compare as 1 and 0 against anything else
    /// - records and arrays compare structurally
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Object(_), _) | (_, Value::Object(_)) => self == other,
            (Value::Array(_), Value::Array(_)) => self == other,
            (Value::Array(_), _) => Value::String(self.as_text()).loose_equals(other),
            (_, Value::Array(_)) => self.loose_equals(&Value::String(other.as_text())),
            _ => self.to_number() == other.to_number(),
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`.
    ///
    /// Two strings compare lexically; any other pair compares numerically.
    /// Returns `None` when either side is NaN after coercion, which makes
    /// every relational test false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Parses a whole string as a number. Blank is 0, junk is NaN.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Shortest round-trip text for a float, without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("0".into()).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(Value::Object(HashMap::new()).is_truthy());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Integer(3).loose_equals(&Value::from("3")));
        assert!(Value::from(" 3 ").loose_equals(&Value::Float(3.0)));
        assert!(Value::Boolean(true).loose_equals(&Value::Integer(1)));
        assert!(!Value::Null.loose_equals(&Value::Integer(0)));
        assert!(!Value::from("a").loose_equals(&Value::from("A")));
        assert!(Value::from("").loose_equals(&Value::Integer(0)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::from("abc").compare(&Value::from("abd")), Some(Ordering::Less));
        assert_eq!(Value::from("10").compare(&Value::Integer(9)), Some(Ordering::Greater));
        assert_eq!(Value::from("x").compare(&Value::Integer(9)), None);
    }

    #[test]
    fn test_number_text() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }
}
