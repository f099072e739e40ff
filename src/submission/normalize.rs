use serde_json::Value;

use super::schema::Field;

/// Cell value written for any field the visitor left out.
pub const NOT_PROVIDED: &str = "Not Provided";

/// One sheet row: name, email, connection, details, feedback, rating.
pub type Row = Vec<Value>;

/// Build the sheet row for a decoded request body.
///
/// Values pass through untouched (a numeric rating stays a number). Absent keys,
/// `null`, `""`, `0` and `false` become [`NOT_PROVIDED`].
pub fn normalize(raw: &Value) -> Row {
    Field::ALL
        .iter()
        .map(|field| match raw.get(field.as_str()) {
            Some(v) if !is_blank(v) => v.clone(),
            _ => Value::String(NOT_PROVIDED.to_string()),
        })
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
