//! Request builders and body readers for router tests.

use axum::body::Body;
use axum::http::{Request, header};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Request with a JSON body and `Content-Type: application/json`.
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    raw_request(method, uri, body.to_string())
}

/// Request with an arbitrary (possibly malformed) body.
pub fn raw_request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// Request without a body.
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Collect the whole body as bytes.
pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

/// Collect and deserialize a JSON body.
pub async fn json_body<T: DeserializeOwned>(body: Body) -> T {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}
