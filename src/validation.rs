//! Field readers for JSON object bodies. Each reader records its own
//! failure in a [`ValidationErrors`] and yields the value only when usable.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationErrors;

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const BLANK: &str = "Field may not be blank.";
pub const NOT_STRING: &str = "Not a valid string.";
pub const NOT_INTEGER: &str = "Not a valid integer.";
pub const UNKNOWN: &str = "Unknown field.";

pub type Body = Map<String, Value>;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lowercased form used for usernames and emails.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn reject_unknown(body: &Body, allowed: &[&str], errors: &mut ValidationErrors) {
    for key in body.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.add(key, UNKNOWN);
        }
    }
}

fn as_string(field: &str, value: &Value, errors: &mut ValidationErrors) -> Option<String> {
    match value {
        Value::Null => {
            errors.add(field, NULL);
            None
        }
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.add(field, NOT_STRING);
            None
        }
    }
}

pub fn required_string(body: &Body, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match body.get(field) {
        None => {
            errors.add(field, MISSING);
            None
        }
        Some(value) => as_string(field, value, errors),
    }
}

pub fn optional_string(body: &Body, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    body.get(field).and_then(|value| as_string(field, value, errors))
}

pub fn required_id(body: &Body, field: &str, errors: &mut ValidationErrors) -> Option<i64> {
    match body.get(field) {
        None => {
            errors.add(field, MISSING);
            None
        }
        Some(Value::Null) => {
            errors.add(field, NULL);
            None
        }
        Some(value) => {
            let id = value.as_i64().filter(|id| *id > 0);
            if id.is_none() {
                errors.add(field, NOT_INTEGER);
            }
            id
        }
    }
}
