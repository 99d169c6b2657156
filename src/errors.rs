use crate::assets::AssetError;
use crate::gateway::{StoreError, friendly_message};
use crate::shell::{ShellError, TAB_FAILED};
use crate::tabs::operations::SubmitError;
use crate::tabs::savings::SavingsError;
use axum::http::StatusCode;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: friendly_message(Some(&err)),
        }
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        error!("asset request failed: {err}");
        let status = match err {
            AssetError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// The details were already logged when the tab failed to build.
impl From<ShellError> for AppError {
    fn from(_: ShellError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: TAB_FAILED.to_string(),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(message) => Self::bad_request(message),
            SubmitError::Store(err) => err.into(),
        }
    }
}

impl From<SavingsError> for AppError {
    fn from(err: SavingsError) -> Self {
        match err {
            SavingsError::Invalid(message) => Self::bad_request(message),
            SavingsError::UnknownRecord(_) => Self::not_found(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
