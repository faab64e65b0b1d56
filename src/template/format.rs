//! Value formatting for placeholders.
//!
//! # Format Dialects
//! - `pluralize:zero,one,few`: pick a form by count; `#` in a form is the count
//! - `if:yes,no`: pick by truthiness
//! - numeric pattern such as `### ###.##`, applied to numbers
//! - plain integer: decimals for numbers, truncation length for strings
//! - anything else applied to a date string: date pattern (`dd.MM.yyyy HH:mm`)
//!
//! # Design Decisions
//! - Free functions over values, no extension traits on std types
//! - Formatting never fails at render time; unusable input renders unchanged or empty

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::template::error::TemplateError;

/// Parsed `|format` suffix of a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    Pluralize { zero: String, one: String, few: String },
    Condition { truthy: String, falsy: String },
    Pattern(String),
}

impl Format {
    /// Parse the text after `|`. Empty text means no format.
    pub fn parse(placeholder: &str, text: &str) -> Result<Option<Format>, TemplateError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        if let Some(args) = text.strip_prefix("pluralize:") {
            let [zero, one, few] = forms::<3>(placeholder, "pluralize", args)?;
            return Ok(Some(Format::Pluralize { zero, one, few }));
        }

        if let Some(args) = text.strip_prefix("if:") {
            let [truthy, falsy] = forms::<2>(placeholder, "if", args)?;
            return Ok(Some(Format::Condition { truthy, falsy }));
        }

        Ok(Some(Format::Pattern(text.to_string())))
    }

    pub fn apply(&self, value: &Value) -> String {
        match self {
            Format::Pluralize { zero, one, few } => match as_number(value) {
                Some(count) => pluralize(count, zero, one, few),
                None => String::new(),
            },
            Format::Condition { truthy, falsy } => {
                if is_truthy(value) {
                    truthy.clone()
                } else {
                    falsy.clone()
                }
            }
            Format::Pattern(pattern) => apply_pattern(pattern, value),
        }
    }
}

fn forms<const N: usize>(
    placeholder: &str,
    helper: &'static str,
    args: &str,
) -> Result<[String; N], TemplateError> {
    let parts: Vec<String> = args.split(',').map(|s| s.trim().to_string()).collect();
    let found = parts.len();
    parts.try_into().map_err(|_| TemplateError::MalformedHelper {
        placeholder: placeholder.to_string(),
        helper,
        expected: N,
        found,
    })
}

fn apply_pattern(pattern: &str, value: &Value) -> String {
    match value {
        Value::Number(n) => {
            let number = n.as_f64().unwrap_or_default();
            if let Ok(decimals) = pattern.parse::<usize>() {
                format_decimals(number, decimals)
            } else if is_number_pattern(pattern) {
                format_number_pattern(&number_text(number), pattern)
            } else {
                value_to_string(value)
            }
        }
        Value::String(text) => {
            if let Ok(max) = pattern.parse::<usize>() {
                truncate(text, max)
            } else if let Some(date) = parse_date(text) {
                format_date(&date, pattern)
            } else {
                text.clone()
            }
        }
        other => value_to_string(other),
    }
}

/// Display form of a value: strings as-is, integral numbers without `.0`,
/// null as empty, arrays and objects as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                number_text(n.as_f64().unwrap_or_default())
            }
        }
        other => other.to_string(),
    }
}

fn number_text(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Numbers, and strings that parse as numbers.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// `1 → one`, `2..5 → few`, anything else `zero`.
pub fn pluralize(count: f64, zero: &str, one: &str, few: &str) -> String {
    let form = if count == 1.0 {
        one
    } else if count > 1.0 && count < 5.0 {
        few
    } else {
        zero
    };
    form.replace('#', &number_text(count))
}

/// Keep at most `max` characters plus `...` once the text exceeds `max + 3`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max + 3 {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Fixed decimals with space-grouped thousands.
pub fn format_decimals(number: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, number.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    if number < 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

fn is_number_pattern(pattern: &str) -> bool {
    pattern.contains('#') && pattern.chars().all(|c| matches!(c, '#' | ' ' | ',' | '.'))
}

/// Lay the digits of `number` into a `#` pattern such as `### ###.##`.
///
/// Missing integer slots are padded and their separators dropped; extra integer
/// digits widen the pattern; the fraction is zero-padded or cut to the slot count.
pub fn format_number_pattern(number: &str, pattern: &str) -> String {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));

    let mut int_slots = 0;
    let mut frac_slots = 0;
    let mut in_fraction = false;
    for c in pattern.chars() {
        match c {
            '#' if in_fraction => frac_slots += 1,
            '#' => int_slots += 1,
            '.' => in_fraction = true,
            _ => {}
        }
    }

    let int_len = int_part.chars().count();
    let mut layout = pattern.to_string();
    let mut int_text = int_part.to_string();
    if int_len > int_slots {
        layout = "#".repeat(int_len - int_slots) + pattern;
    } else if int_len < int_slots {
        int_text = " ".repeat(int_slots - int_len) + int_part;
    }

    let mut frac_digits: Vec<char> = frac_part.chars().take(frac_slots).collect();
    frac_digits.resize(frac_slots, '0');
    let int_digits: Vec<char> = int_text.chars().collect();

    let mut out = String::new();
    let mut in_fraction = false;
    let mut index = 0;
    let mut skip = true;

    for c in layout.chars() {
        if c != '#' {
            if skip {
                continue;
            }
            if c == '.' {
                in_fraction = true;
                index = 0;
            }
            out.push(c);
            continue;
        }

        let digit = if in_fraction {
            frac_digits.get(index)
        } else {
            int_digits.get(index)
        }
        .copied();

        if skip {
            skip = matches!(digit, Some(' ') | Some(','));
        }
        if !skip {
            if let Some(d) = digit {
                out.push(d);
            }
        }
        index += 1;
    }

    out
}

/// RFC 3339, `YYYY-MM-DD[ T]HH:MM[:SS]` or `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

const DATE_TOKENS: [&str; 15] = [
    "yyyy", "yy", "MM", "M", "dd", "d", "HH", "H", "hh", "h", "mm", "m", "ss", "s", "a",
];

/// Format a date with `yyyy yy MM M dd d HH H hh h mm m ss s a` tokens.
pub fn format_date(date: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::new();
    let mut rest = pattern;

    'scan: while let Some(c) = rest.chars().next() {
        for token in DATE_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(&date_part(date, token));
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn date_part(date: &NaiveDateTime, token: &str) -> String {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        h => h,
    };
    match token {
        "yyyy" => date.year().to_string(),
        "yy" => format!("{:02}", date.year().rem_euclid(100)),
        "MM" => format!("{:02}", date.month()),
        "M" => date.month().to_string(),
        "dd" => format!("{:02}", date.day()),
        "d" => date.day().to_string(),
        "HH" => format!("{:02}", date.hour()),
        "H" => date.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", date.minute()),
        "m" => date.minute().to_string(),
        "ss" => format!("{:02}", date.second()),
        "s" => date.second().to_string(),
        "a" => (if date.hour() >= 12 { "PM" } else { "AM" }).to_string(),
        _ => String::new(),
    }
}
