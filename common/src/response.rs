//! API response wrapper types.
//!
//! Every JSON endpoint of the console answers with [`ApiResponse`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON envelope: `success`, then `data` or `error`, then `meta`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// False whenever `error` is set.
    pub success: bool,

    /// Payload of a successful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Code and client-safe message of a failed call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    pub meta: ResponseMeta,
}

/// Failure body. Never carries DSNs or driver messages.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// One of the `AppError` codes, e.g. `NOT_FOUND`.
    pub code: String,

    pub message: String,
}

/// Envelope metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Value of `x-request-id` for the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl ResponseMeta {
    fn stamped() -> Self {
        Self {
            request_id: None,
            timestamp: Utc::now(),
            service: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::stamped(),
        }
    }

    /// Creates a successful response tagged with the handling service.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        let mut response = Self::ok(data);
        response.meta.service = Some(service.into());
        response
    }

    /// Sets the request ID on the response.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.meta.request_id = Some(request_id.into());
        self
    }
}

impl ApiResponse<()> {
    /// Creates an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            meta: ResponseMeta::stamped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let body = ApiResponse::ok_with_service(vec!["primary"], "query-console")
            .with_request_id("req-1");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], "primary");
        assert_eq!(json["meta"]["service"], "query-console");
        assert_eq!(json["meta"]["request_id"], "req-1");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_err_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::err("NOT_FOUND", "Selected database not found")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
        assert!(json["meta"].get("request_id").is_none());
    }
}
