//! Per-field checks that turn loosely-typed JSON values into typed fields.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{UserError, UserResult};

pub const MAX_AGE: u8 = 120;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// A string that is non-empty once surrounding whitespace is trimmed.
///
/// The name is kept as sent; `message` selects the create or update wording.
pub fn validate_name(value: &Value, message: &'static str) -> UserResult<String> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Ok(name.clone()),
        _ => Err(UserError::InvalidName(message)),
    }
}

/// A string matching [`EMAIL`] in full. `$` anchors at the very end, so a
/// trailing newline (`"ann@x.com\n"`) is rejected on purpose.
pub fn validate_email(value: &Value) -> UserResult<String> {
    match value {
        Value::String(email) if EMAIL.is_match(email) => Ok(email.clone()),
        _ => Err(UserError::InvalidEmail),
    }
}

/// A JSON integer in `0..=120`. Floats (even `30.0`) are rejected, and so are
/// booleans: `true` is not accepted as `1`.
pub fn validate_age(value: &Value) -> UserResult<u8> {
    value
        .as_i64()
        .filter(|age| (0..=i64::from(MAX_AGE)).contains(age))
        .and_then(|age| u8::try_from(age).ok())
        .ok_or(UserError::InvalidAge)
}
