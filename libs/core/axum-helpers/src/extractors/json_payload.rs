//! Loosely-typed JSON body extractor.

use crate::errors::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;

/// Extracts an optional JSON document from the request body.
///
/// Unlike [`axum::Json`], this neither requires a `Content-Type` header nor a
/// target type: handlers receive the parsed [`Value`] and decide field by
/// field what is acceptable.
///
/// - empty or whitespace-only body → `JsonPayload(None)`
/// - well-formed JSON → `JsonPayload(Some(value))`
/// - malformed JSON → `400 {"error": "Invalid JSON body"}`
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::post;
/// use axum_helpers::extractors::JsonPayload;
///
/// async fn create(JsonPayload(body): JsonPayload) -> String {
///     format!("received: {:?}", body)
/// }
///
/// let app = Router::new().route("/things", post(create));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPayload(pub Option<Value>);

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonPayload(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| JsonPayload(Some(value)))
            .map_err(|e| {
                tracing::debug!(error = %e, "Malformed JSON body");
                AppError::BadRequest("Invalid JSON body".to_string())
            })
    }
}
