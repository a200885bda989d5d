//! The DISPLAY / STRING format language and the date and time helpers that
//! go with it.
//!
//! | Format            | Effect                                              |
//! |-------------------|-----------------------------------------------------|
//! | `99/99/99`        | date, day first, two-digit year                     |
//! | `9999-99-99`      | date, year first                                    |
//! | `X(n)`            | left-justify, pad or cut to `n` characters          |
//! | `9(n)`, `#(n)`    | right-justify to `n` characters                     |
//! | `&&&-&&`          | copy the value into the `&` slots, keep the rest    |
//! | `>>>9`, `>>9.99`  | right-justify; rounded only when decimals are given |
//! | `HH:MM[:SS] [AM]` | time of day from seconds after midnight (`STRING`)  |
//!
//! Anything else leaves the value as plain text.

use chrono::{DateTime, Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::Value;

/// Width of the line CENTERED pads against.
pub const LINE_WIDTH: usize = 80;

static DATE_FORMAT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(9{2,4})([^9])(9{2})([^9])(9{2,4})$").ok());
static LEFT_WIDTH: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[Xx]\((\d+)\)$").ok());
static RIGHT_WIDTH: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[9#]\((\d+)\)$").ok());
static NUMERIC: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[>9#]+(?:\.([9#]+))?$").ok());
static TIME_FORMAT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^HH:MM(:SS)?(\s*)(AM|PM|A)?$").ok());
static ISO_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").ok());
static GENERIC_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})$").ok());

fn captures<'t>(re: &Lazy<Option<Regex>>, text: &'t str) -> Option<Captures<'t>> {
    re.as_ref()?.captures(text)
}

fn width(caps: &Captures<'_>) -> usize {
    caps.get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Formats one DISPLAY item. Without a format the value's display text is
/// used, so null shows as `?`.
pub fn format_display_value(value: &Value, format: Option<&Value>) -> String {
    let spec = match format {
        None | Some(Value::Null) => return value.display_text(),
        Some(f) => f.as_text(),
    };

    if let Some(caps) = captures(&DATE_FORMAT, &spec) {
        return match parse_date(value) {
            Some(date) => format_date(date, &caps),
            None => value.display_text(),
        };
    }

    if let Some(caps) = captures(&LEFT_WIDTH, &spec) {
        let w = width(&caps);
        let text: String = value.display_text().chars().take(w).collect();
        return format!("{:<w$}", text);
    }

    if let Some(caps) = captures(&RIGHT_WIDTH, &spec) {
        let w = width(&caps);
        let text: String = value.display_text().chars().take(w).collect();
        return format!("{:>w$}", text);
    }

    if spec.contains('&') {
        return fill_slots(&value.display_text(), &spec);
    }

    if let Some(caps) = captures(&NUMERIC, &spec) {
        let w = spec.chars().count();
        let decimals = caps.get(1).map_or(0, |m| m.as_str().len());
        let n = value.to_number();
        let text = if decimals > 0 && !value.is_null() && n.is_finite() {
            format!("{:.*}", decimals, round_half_away(n, decimals))
        } else {
            value.display_text()
        };
        return format!("{:>w$}", text);
    }

    value.display_text()
}

fn round_half_away(n: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (n * factor).round() / factor
}

/// `&` slots take the value's characters in order; other characters are
/// copied. Slots past the end of the value become spaces.
fn fill_slots(text: &str, spec: &str) -> String {
    let mut source = text.chars();
    spec.chars()
        .map(|c| match c {
            '&' => source.next().unwrap_or(' '),
            other => other,
        })
        .collect()
}

fn format_date(date: NaiveDate, caps: &Captures<'_>) -> String {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let year = |len: usize| {
        if len >= 4 {
            format!("{:04}", date.year())
        } else {
            format!("{:02}", date.year().rem_euclid(100))
        }
    };
    let day = format!("{:02}", date.day());
    let (first, last) = if group(1).len() == 4 {
        (year(4), day)
    } else {
        (day, year(group(5).len()))
    };
    format!("{}{}{:02}{}{}", first, group(2), date.month(), group(4), last)
}

/// Two-digit years below 70 are 20xx, the rest 19xx.
fn pivot_year(year: i32, digits: usize) -> i32 {
    if digits > 2 {
        year
    } else if year < 70 {
        2000 + year
    } else {
        1900 + year
    }
}

/// Reads a date from `YYYY-MM-DD[...]`, `d/m/y`, `y/m/d` or a number of
/// milliseconds since the Unix epoch.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Integer(ms) => DateTime::from_timestamp_millis(*ms).map(|d| d.date_naive()),
        Value::Float(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|d| d.date_naive())
        }
        Value::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let num = |caps: &Captures<'_>, i: usize| -> Option<(i32, usize)> {
        let m = caps.get(i)?;
        Some((m.as_str().parse().ok()?, m.as_str().len()))
    };

    if let Some(caps) = captures(&ISO_DATE, text) {
        let (y, _) = num(&caps, 1)?;
        let (m, _) = num(&caps, 2)?;
        let (d, _) = num(&caps, 3)?;
        return NaiveDate::from_ymd_opt(y, m as u32, d as u32);
    }

    let caps = captures(&GENERIC_DATE, text)?;
    let (a, a_len) = num(&caps, 1)?;
    let (m, _) = num(&caps, 2)?;
    let (c, c_len) = num(&caps, 3)?;
    let (y, d) = if a_len == 4 {
        (a, c)
    } else {
        (pivot_year(c, c_len), a)
    };
    NaiveDate::from_ymd_opt(y, m as u32, d as u32)
}

/// `STRING(seconds, "HH:MM[:SS] [AM]")`. Returns `None` when the format is
/// not a time format. The AM/PM marker in the format is replaced by the
/// actual half of the day.
pub fn format_time_from_seconds(value: &Value, format: &str) -> Option<String> {
    let caps = captures(&TIME_FORMAT, format.trim())?;
    let n = value.to_number();
    if !n.is_finite() {
        return Some(String::new());
    }

    let total = (n.trunc() as i64).rem_euclid(86_400);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    let twelve_hour = caps.get(3).is_some();
    let hour = if twelve_hour {
        match h % 12 {
            0 => 12,
            other => other,
        }
    } else {
        h
    };

    let mut out = format!("{:02}:{:02}", hour, m);
    if caps.get(1).is_some() {
        out.push_str(&format!(":{:02}", s));
    }
    if twelve_hour {
        out.push_str(caps.get(2).map_or("", |g| g.as_str()));
        out.push_str(if h < 12 { "AM" } else { "PM" });
    }
    Some(out)
}

/// Left-pads a line so it sits in the middle of an 80-column line.
pub fn center_line(line: &str) -> String {
    let len = line.chars().count();
    if len >= LINE_WIDTH {
        return line.to_string();
    }
    let pad = (LINE_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), line)
}
