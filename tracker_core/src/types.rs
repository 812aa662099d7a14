//! Core domain types for the exercise tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Users and their embedded exercise entries
//! - Exercise input as received from a client
//! - Response shapes for appends and log views

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Opaque user identifier, assigned by the store at creation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Stored documents
// ============================================================================

/// One exercise record embedded in a user
///
/// `date` holds the string exactly as it was stored; it is only re-parsed
/// when rendered back to a client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "nan_as_null")]
    pub duration: f64,
    pub date: String,
}

/// A user document with its append-only exercise sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

impl User {
    /// A freshly created user with no exercises
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            exercises: Vec::new(),
        }
    }
}

// ============================================================================
// Client input
// ============================================================================

/// Exercise fields after coercion from the raw request body
#[derive(Clone, Debug, Default)]
pub struct NewExercise {
    pub description: Option<String>,
    pub duration: f64,
    /// `None` means "use today"
    pub date: Option<String>,
}

impl NewExercise {
    /// Coerce loosely typed body fields into an exercise
    ///
    /// Nothing is rejected here: a duration that is not numeric becomes NaN
    /// and is stored as such.
    pub fn from_body(body: &serde_json::Map<String, Value>) -> Self {
        Self {
            description: body.get("description").and_then(coerce_text),
            duration: coerce_number(body.get("duration")),
            date: truthy_text(body.get("date")),
        }
    }
}

/// Text of a field that is present and truthy
///
/// `null`, `false`, numeric zero and the empty string all count as absent,
/// so a body like `{"username": 0}` carries no username.
pub fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => coerce_text(other).filter(|text| !text.is_empty()),
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric coercion with the usual loose-typing rules
///
/// Strings are trimmed; an empty string is zero. `null` is zero, booleans
/// are zero or one, everything else that does not parse is NaN.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_str(s),
        Some(_) => f64::NAN,
    }
}

fn parse_numeric_str(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers here
    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return match trimmed.trim_start_matches(&['+', '-'][..]) {
            "Infinity" if trimmed.starts_with('-') => f64::NEG_INFINITY,
            "Infinity" => f64::INFINITY,
            _ => f64::NAN,
        };
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// ============================================================================
// Responses
// ============================================================================

/// Returned by user creation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedUser {
    pub username: String,
    #[serde(rename = "_id")]
    pub id: UserId,
}

/// Echo of a successful exercise append
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSummary {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "nan_as_null")]
    pub duration: f64,
    #[serde(rename = "_id")]
    pub id: UserId,
    pub date: String,
}

/// Optional log filters, still in their raw textual form
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
}

impl LogQuery {
    /// Whether any filter was supplied at all
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.limit.is_none()
    }
}

/// A user's exercise log
///
/// `count` is always the unfiltered number of entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogView {
    pub username: String,
    #[serde(rename = "_id")]
    pub id: UserId,
    pub count: usize,
    pub log: Vec<ExerciseEntry>,
}

/// Serde adapter writing NaN as `null` and reading `null` back as NaN
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
