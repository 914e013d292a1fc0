//! JSON response helpers.
//!
//! # Responsibilities
//! - Serialize handler bodies as UTF-8 JSON
//! - Uniform error envelope for every failure status
//! - Best-effort 500 when a success body cannot be encoded

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// `internalErrCode` for errors without a more specific code.
pub const GENERIC_ERROR_CODE: i32 = -1;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub http_status_code: u16,
    pub msg: String,
    pub internal_err_code: i32,
}

/// A failed request: status plus message, rendered as [`ErrorEnvelope`].
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub msg: String,
    pub internal_code: i32,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
            internal_code: GENERIC_ERROR_CODE,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            http_status_code: self.status.as_u16(),
            msg: self.msg.clone(),
            internal_err_code: self.internal_code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Emitted inside the request span, so it carries `request_id`.
        tracing::warn!(
            status = self.status.as_u16(),
            msg = %self.msg,
            internal_code = self.internal_code,
            "Responding with error"
        );
        let envelope = self.envelope();
        match serde_json::to_vec(&envelope) {
            Ok(body) => with_json_body(self.status, body),
            Err(e) => {
                // Three plain fields cannot realistically fail to encode.
                tracing::error!(error = %e, "Failed to encode error envelope");
                self.status.into_response()
            }
        }
    }
}

/// Serialize `data` with `status`.
///
/// Encoding failures are logged and turned into a 500 envelope.
pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_vec(data) {
        Ok(body) => with_json_body(status, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response body");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("can't encode JSON: {}", e),
            )
            .into_response()
        }
    }
}

fn with_json_body(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_envelope_shape() {
        let response =
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "graceful shutdown started").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            JSON_CONTENT_TYPE
        );

        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "httpStatusCode": 503,
                "msg": "graceful shutdown started",
                "internalErrCode": -1
            })
        );
    }

    #[tokio::test]
    async fn unencodable_body_becomes_500() {
        // JSON object keys must be strings.
        let mut data = BTreeMap::new();
        data.insert(vec![1u8], "value");

        let response = json(StatusCode::OK, &data);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["httpStatusCode"], 500);
        assert!(body["msg"].as_str().unwrap().starts_with("can't encode JSON"));
    }
}
