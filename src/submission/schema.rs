use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MSG_EMAIL: &str = "Invalid email address";
pub const MSG_CONNECTION: &str = "Select an option";
pub const MSG_RATING_RANGE: &str = "Rating must be between 1 and 5 inclusive";
pub const MSG_RATING_REQUIRED: &str = "Rating is required";
pub const MSG_RATING_WHOLE: &str = "Rating must be a whole number";
pub const MSG_FEEDBACK: &str = "Feedback is required";
pub const MSG_EXPECTED_TEXT: &str = "Expected text";

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;
/// Rating the form starts with.
pub const DEFAULT_RATING: u8 = 3;

// local@domain.tld, matched case-insensitively. Leading dots and ".." are rejected separately.
pub const EMAIL_PATTERN: &str = r"^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@(?:[A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(EMAIL_PATTERN)
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// The six fields of an evaluation, in sheet column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Connection,
    Details,
    Feedback,
    Rating,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Email,
        Field::Connection,
        Field::Details,
        Field::Feedback,
        Field::Rating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Connection => "connection",
            Field::Details => "details",
            Field::Feedback => "feedback",
            Field::Rating => "rating",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the visitor knows the person being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    Club,
    Workshop,
    Zaylen,
    Mentorship,
    Project,
}

impl Connection {
    pub const ALL: [Connection; 5] = [
        Connection::Club,
        Connection::Workshop,
        Connection::Zaylen,
        Connection::Mentorship,
        Connection::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Connection::Club => "club",
            Connection::Workshop => "workshop",
            Connection::Zaylen => "zaylen",
            Connection::Mentorship => "mentorship",
            Connection::Project => "project",
        }
    }

    /// Label shown in the form's select box.
    pub fn label(&self) -> &'static str {
        match self {
            Connection::Club => "BRAC University Computer Club",
            Connection::Workshop => "Workshop",
            Connection::Zaylen => "Zaylen Digital",
            Connection::Mentorship => "Mentorship",
            Connection::Project => "Project",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Connection::ALL.into_iter().find(|c| c.as_str() == tag)
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub connection: Connection,
    pub details: Option<String>,
    pub feedback: String,
    pub rating: u8,
}

/// First violated constraint per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` unless `field` already has an error.
    pub fn add(&mut self, field: Field, message: &str) {
        self.0.entry(field).or_insert_with(|| message.to_string());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Check a candidate record against the evaluation contract.
///
/// Every field is checked, so all violations are reported together. Unknown keys
/// are ignored. Optional text fields treat `null` and `""` as absent.
pub fn validate(candidate: &Value) -> Result<Submission, FieldErrors> {
    let empty = serde_json::Map::new();
    let obj = candidate.as_object().unwrap_or(&empty);
    let mut errors = FieldErrors::new();

    let name = optional_text(obj.get("name"), Field::Name, &mut errors);

    let email = optional_text(obj.get("email"), Field::Email, &mut errors);
    if let Some(addr) = email.as_deref() {
        if !is_valid_email(addr) {
            errors.add(Field::Email, MSG_EMAIL);
        }
    }

    let connection = match obj.get("connection") {
        Some(Value::String(tag)) => Connection::parse(tag),
        _ => None,
    };
    if connection.is_none() {
        errors.add(Field::Connection, MSG_CONNECTION);
    }

    let details = optional_text(obj.get("details"), Field::Details, &mut errors);

    let feedback = match obj.get("feedback") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };
    if feedback.is_none() {
        errors.add(Field::Feedback, MSG_FEEDBACK);
    }

    let rating = check_rating(obj.get("rating"), &mut errors);

    match (connection, feedback, rating) {
        (Some(connection), Some(feedback), Some(rating)) if errors.is_empty() => Ok(Submission {
            name,
            email,
            connection,
            details,
            feedback,
            rating,
        }),
        _ => Err(errors),
    }
}

/// The contract as data, so the browser form checks exactly what the server checks.
pub fn descriptor() -> Value {
    let options: Vec<Value> = Connection::ALL
        .iter()
        .map(|c| json!({ "value": c.as_str(), "label": c.label() }))
        .collect();

    json!({
        "fields": {
            "name": { "type": "text", "required": false },
            "email": {
                "type": "email",
                "required": false,
                "pattern": EMAIL_PATTERN,
                "flags": "i",
                "message": MSG_EMAIL,
            },
            "connection": {
                "type": "enum",
                "required": true,
                "options": options,
                "message": MSG_CONNECTION,
            },
            "details": { "type": "text", "required": false },
            "feedback": { "type": "text", "required": true, "message": MSG_FEEDBACK },
            "rating": {
                "type": "integer",
                "required": true,
                "min": RATING_MIN,
                "max": RATING_MAX,
                "default": DEFAULT_RATING,
                "message": MSG_RATING_RANGE,
                "requiredMessage": MSG_RATING_REQUIRED,
                "wholeMessage": MSG_RATING_WHOLE,
            },
        },
        "textMessage": MSG_EXPECTED_TEXT,
    })
}

pub fn is_valid_email(addr: &str) -> bool {
    !addr.starts_with('.') && !addr.contains("..") && EMAIL_RE.is_match(addr)
}

fn optional_text(value: Option<&Value>, field: Field, errors: &mut FieldErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, MSG_EXPECTED_TEXT);
            None
        }
    }
}

fn check_rating(value: Option<&Value>, errors: &mut FieldErrors) -> Option<u8> {
    let Some(Value::Number(n)) = value else {
        errors.add(Field::Rating, MSG_RATING_REQUIRED);
        return None;
    };

    if let Some(i) = n.as_i64() {
        if (RATING_MIN as i64..=RATING_MAX as i64).contains(&i) {
            return Some(i as u8);
        }
        errors.add(Field::Rating, MSG_RATING_RANGE);
        return None;
    }

    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && (RATING_MIN as f64..=RATING_MAX as f64).contains(&f) => {
            Some(f as u8)
        }
        Some(f) if f.fract() != 0.0 => {
            errors.add(Field::Rating, MSG_RATING_WHOLE);
            None
        }
        _ => {
            errors.add(Field::Rating, MSG_RATING_RANGE);
            None
        }
    }
}
