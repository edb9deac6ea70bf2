//! JSON extractor whose rejections render as failure envelopes.

use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::ApiError;

/// Works like `axum::Json<T>`, but a body that cannot be read or
/// deserialized becomes a 400 failure envelope instead of plain text.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}
