//! Request-body plumbing shared by the DTOs.
//!
//! Bodies deserialize into typed request structs; constraints are declared with
//! `validator` derives. Both kinds of failure end up as a list of
//! `{field, message}` pairs. Update payloads use [`Patch`] to keep "key absent"
//! apart from "key present with `null`".

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::{ValidationError, ValidationErrors};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, thiserror::Error)]
#[error("{} invalid field(s)", .errors.len())]
pub struct InvalidFields {
    pub errors: Vec<FieldError>,
}

impl InvalidFields {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    fn from_serde(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let message = err.inner().to_string();
        if let Some(missing) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            return Self::single(missing, "Required");
        }
        let path = err.path().to_string();
        let field = if path == "." { String::new() } else { path };
        Self::single(field, message)
    }
}

impl From<ValidationErrors> for InvalidFields {
    fn from(errs: ValidationErrors) -> Self {
        let mut errors: Vec<FieldError> = errs
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                let field = camel_case(&field);
                list.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Self { errors }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// A field of an update payload.
///
/// Pair with `#[serde(default)]` so an absent key stays [`Patch::Undefined`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Patch<T> {
    /// Key absent from the payload; the column is left untouched.
    Undefined,
    /// Key present with an explicit `null`.
    Null,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Undefined
    }
}

impl<T> Patch<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Patch::Undefined)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Undefined => Patch::Undefined,
            Patch::Null => Patch::Null,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Set(v),
            None => Patch::Null,
        })
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Rejects an explicit `null` for a column that cannot hold one.
pub fn not_null<T>(value: &Patch<T>) -> Result<(), ValidationError> {
    match value {
        Patch::Null => Err(rule("not_null", "Must not be null")),
        _ => Ok(()),
    }
}

/// `not_null` plus a minimum character count on a present string.
pub fn patch_min_chars(
    value: &Patch<String>,
    min: usize,
    message: &'static str,
) -> Result<(), ValidationError> {
    not_null(value)?;
    match value {
        Patch::Set(s) if s.chars().count() < min => Err(rule("length", message)),
        _ => Ok(()),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Email addresses are compared trimmed and lower-cased.
pub fn normalized_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_lowercase())
}

fn int_from_value(v: Value) -> Result<i32, String> {
    let Value::Number(n) = &v else {
        return Err(format!("Expected number, received {}", kind(&v)));
    };
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map_err(|_| bound_message(i > 0));
    }
    if n.as_u64().is_some() {
        return Err(bound_message(true));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => Ok(f as i32),
        Some(f) if f.fract() == 0.0 => Err(bound_message(f > 0.0)),
        _ => Err("Expected integer, received float".to_string()),
    }
}

fn bound_message(too_big: bool) -> String {
    if too_big {
        format!("Number must be less than or equal to {}", i32::MAX)
    } else {
        format!("Number must be greater than or equal to {}", i32::MIN)
    }
}

/// A JSON number holding a whole value that fits in `i32`.
pub fn whole_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    int_from_value(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

pub fn patch_whole_number<'de, D>(deserializer: D) -> Result<Patch<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Patch::Null),
        v => int_from_value(v).map(Patch::Set).map_err(de::Error::custom),
    }
}

/// Parses the date formats accepted by the API: RFC 3339, a bare
/// `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(dt.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// A date given as one of the [`parse_date`] strings or as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiDate(pub OffsetDateTime);

impl<'de> Deserialize<'de> for ApiDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match Value::deserialize(deserializer)? {
            Value::String(s) => parse_date(&s),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok()),
            _ => None,
        };
        parsed.map(ApiDate).ok_or_else(|| de::Error::custom("Invalid date"))
    }
}

/// JSON body deserialized into `T`. Malformed JSON and shape mismatches are
/// rejected with the API's own error shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(JsonBody(decode(value)?))
    }
}

/// Deserializes `value` into `T`, naming the offending field on failure.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, InvalidFields> {
    serde_path_to_error::deserialize(value).map_err(InvalidFields::from_serde)
}

/// Parses a numeric path id.
pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Invalid id"))
}
