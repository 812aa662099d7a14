//! Request extraction.
//!
//! Clients post either JSON or url-encoded forms; both end up as a flat
//! JSON object so the core can apply one set of coercion rules. Every
//! rejection is turned into an [`ApiError`] so clients always get a JSON
//! `{message}` body.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::{async_trait, Form, Json};
use serde_json::{Map, Value};
use tracker_core::{truthy_text, LogQuery};

/// Loosely typed request body
#[derive(Debug, Default)]
pub struct RequestBody(pub Map<String, Value>);

impl RequestBody {
    /// Field as text, if present and truthy
    pub fn text(&self, key: &str) -> Option<String> {
        truthy_text(self.0.get(key))
    }
}

/// Log filters from the query string
#[derive(Debug, Default)]
pub struct LogParams(pub LogQuery);

#[async_trait]
impl<S> FromRequestParts<S> for LogParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<LogQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(LogParams(query))
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Ok(match value {
                Value::Object(map) => RequestBody(map),
                _ => RequestBody::default(),
            });
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            let map = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(RequestBody(map));
        }

        // Unknown or missing content type: treat as an empty body
        Ok(RequestBody::default())
    }
}
