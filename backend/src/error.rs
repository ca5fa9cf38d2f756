use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The order is missing a field the manifest cannot be built without
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("order has neither order_number nor id")]
    MissingOrderNumber,
    #[error("order has no created_at")]
    MissingCreatedAt,
    #[error("order created_at is not a date: {0}")]
    InvalidCreatedAt(String),
    #[error("order load is too large to declare: {0} m2")]
    LoadTooLarge(String),
}

/// The carrier did not accept the manifest
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("carrier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("carrier responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("carrier rejected manifest: {}; body: {}", .failures.join("; "), .body)]
    Rejected { failures: Vec<String>, body: String },
    #[error("carrier response could not be parsed ({source}): {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },
}

/// Writing the tracking number back to the order failed
#[derive(Debug, thiserror::Error)]
pub enum SecondaryUpdateError {
    #[error("fulfillment request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("fulfillment API responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("fulfillment response could not be parsed ({source}): {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },
}

/// Failure of a single order-paid notification
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            DispatchError::Mapping(err) => {
                tracing::warn!("Rejected order: {}", err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            DispatchError::Upstream(err) => {
                tracing::error!("Manifest upload failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_errors_are_client_errors() {
        let response = DispatchError::from(MappingError::MissingCreatedAt).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_errors_are_server_errors() {
        let response = DispatchError::from(UpstreamError::Status {
            status: 502,
            body: "bad gateway".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejection_message_keeps_every_reason() {
        let err = UpstreamError::Rejected {
            failures: vec![
                "5002: Invalid postcode".into(),
                "5002: Weight exceeds limit".into(),
            ],
            body: "{}".into(),
        };
        let message = err.to_string();
        assert!(message.contains("Invalid postcode"));
        assert!(message.contains("Weight exceeds limit"));
    }
}
