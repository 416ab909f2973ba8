use crate::models::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const MISSING_INPUT_MESSAGE: &str = "Provide a query or at least one image";
pub const INVALID_FORM_MESSAGE: &str = "Invalid multipart form";
pub const VENDOR_FAILED_MESSAGE: &str = "Vendor request failed";

/// Failures of the proxy route. Client errors never reach the vendor;
/// every vendor-side failure collapses into `Vendor`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Provide a query or at least one image")]
    MissingInput,

    #[error("Invalid multipart form: {0}")]
    InvalidForm(String),

    #[error("Vendor request failed: {0}")]
    Vendor(String),
}

impl ProxyError {
    pub fn vendor(err: &anyhow::Error) -> Self {
        ProxyError::Vendor(format!("{:#}", err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingInput | ProxyError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            ProxyError::Vendor(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ProxyError::MissingInput => ErrorResponse {
                error: MISSING_INPUT_MESSAGE.to_string(),
                details: None,
            },
            ProxyError::InvalidForm(details) => ErrorResponse {
                error: INVALID_FORM_MESSAGE.to_string(),
                details: Some(details.clone()),
            },
            ProxyError::Vendor(details) => ErrorResponse {
                error: VENDOR_FAILED_MESSAGE.to_string(),
                details: Some(details.clone()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
