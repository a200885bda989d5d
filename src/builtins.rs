//! Built-in functions callable from expressions.
//!
//! Names arrive upper-cased from the parser. Missing arguments read as
//! null, extra ones are ignored.

use std::rc::Rc;

use chrono::Datelike;

use crate::{
    evaluator::{Context, EvalError},
    format::{format_display_value, format_time_from_seconds, parse_date},
    value::{Value, parse_number},
};

const NULL: &Value = &Value::Null;

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(NULL)
}

/// Dispatches a call to the named builtin.
pub fn call(name: &str, args: &[Value], context: &Rc<Context>) -> Result<Value, EvalError> {
    match name {
        "UPPER" => Ok(Value::String(arg(args, 0).as_text().to_uppercase())),
        "LOWER" => Ok(Value::String(arg(args, 0).as_text().to_lowercase())),
        "LENGTH" => Ok(Value::Integer(arg(args, 0).as_text().chars().count() as i64)),
        "INT" => Ok(int(arg(args, 0))),
        "INTEGER" => integer(arg(args, 0)),
        "FLOAT" => Ok(float(arg(args, 0))),
        "STRING" => Ok(string(arg(args, 0), args.get(1))),
        "MONTH" => Ok(month(arg(args, 0))),
        "ENTRY" => Ok(entry(arg(args, 0), arg(args, 1), args.get(2))),
        "PRINT" => {
            let line = args
                .iter()
                .map(Value::display_text)
                .collect::<Vec<_>>()
                .join(" ");
            context.emit(line);
            Ok(Value::Null)
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

/// Longest leading number in `text`: an optional sign and digits, plus a
/// fraction and exponent when `allow_fraction` is set.
fn numeric_prefix(text: &str, allow_fraction: bool) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if allow_fraction && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    Some(&text[..end])
}

/// INT(v) - whole-number prefix of the value's text, NaN when there is none.
fn int(value: &Value) -> Value {
    let text = match value {
        Value::Null => "0".to_string(),
        Value::Float(n) if n.is_finite() => return Value::from_f64(n.trunc()),
        other => other.as_text(),
    };
    numeric_prefix(text.trim_start(), false)
        .and_then(|prefix| prefix.parse::<i64>().ok())
        .map(Value::Integer)
        .unwrap_or(Value::Float(f64::NAN))
}

/// INTEGER(v) - rounds half away from zero into the 32-bit signed range.
fn integer(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Null => return Ok(Value::Null),
        Value::Integer(n) => *n as f64,
        Value::Float(n) => *n,
        Value::Boolean(b) => i64::from(*b) as f64,
        Value::String(s) => parse_number(s),
        other => {
            return Err(EvalError::TypeError(format!(
                "INTEGER() requires a number, got {}",
                other.type_name()
            )));
        }
    };
    if !n.is_finite() {
        return Err(EvalError::TypeError(format!(
            "INTEGER() requires a finite number, got {}",
            value.display_text()
        )));
    }
    let rounded = n.round();
    if rounded > f64::from(i32::MAX) || rounded < f64::from(i32::MIN) {
        return Err(EvalError::OutOfRange("INTEGER".to_string()));
    }
    Ok(Value::Integer(rounded as i64))
}

/// FLOAT(v) - leading decimal number of the value's text, NaN when there
/// is none.
fn float(value: &Value) -> Value {
    let text = match value {
        Value::Null => return Value::Float(0.0),
        Value::Integer(n) => return Value::Float(*n as f64),
        Value::Float(n) => return Value::Float(*n),
        other => other.as_text(),
    };
    let text = text.trim_start();
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Value::Float(sign * f64::INFINITY);
    }
    numeric_prefix(text, true)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .map(Value::Float)
        .unwrap_or(Value::Float(f64::NAN))
}

/// STRING(v[, format])
fn string(value: &Value, format: Option<&Value>) -> Value {
    let text = match format {
        None | Some(Value::Null) => value.as_text(),
        Some(spec) => format_time_from_seconds(value, &spec.as_text())
            .unwrap_or_else(|| format_display_value(value, Some(spec))),
    };
    Value::String(text)
}

/// MONTH(date) - 1 to 12, or null when the value is not a date.
fn month(value: &Value) -> Value {
    parse_date(value)
        .map(|d| Value::Integer(i64::from(d.month())))
        .unwrap_or(Value::Null)
}

/// ENTRY(n, list[, delimiter]) - the trimmed n-th entry, 1-based. Out of
/// range gives the empty string.
fn entry(index: &Value, list: &Value, delimiter: Option<&Value>) -> Value {
    let n = index.to_number().trunc();
    if !n.is_finite() || n < 1.0 {
        return Value::String(String::new());
    }
    let delimiter = match delimiter.map(Value::as_text) {
        Some(d) if !d.is_empty() => d,
        _ => ",".to_string(),
    };
    let text = list.as_text();
    let found = text
        .split(delimiter.as_str())
        .nth(n as usize - 1)
        .map(|e| e.trim().to_string())
        .unwrap_or_default();
    Value::String(found)
}
