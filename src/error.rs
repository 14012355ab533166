use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Quote provider not configured")]
    ProviderUnavailable,

    #[error("Transport error: {0}")] Transport(String),

    #[error("Malformed provider response: {0}")] MalformedResponse(String),

    #[error("Validation error: {0}")] Validation(String),

    #[error("Alert not found")]
    AlertNotFound,

    #[error("Alert store error: {0}")] StoreIo(String),

    #[error("Notification error: {0}")] Notification(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Validation failure attributed to a single request field.
    pub fn missing_field(field: &str) -> Self {
        AppError::Validation(format!("{} is required", field))
    }

    /// Whether the error came from the quote provider side.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            AppError::ProviderUnavailable | AppError::Transport(_) | AppError::MalformedResponse(_)
        )
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field) = match self {
            AppError::ProviderUnavailable =>
                ("PROVIDER_UNAVAILABLE", "not configured".to_string(), None),
            AppError::Transport(msg) => ("TRANSPORT_ERROR", msg.clone(), None),
            AppError::MalformedResponse(msg) => ("MALFORMED_RESPONSE", msg.clone(), None),
            AppError::Validation(msg) => {
                let field = msg
                    .strip_suffix(" is required")
                    .map(|f| f.to_string());
                ("VALIDATION_ERROR", msg.clone(), field)
            }
            AppError::AlertNotFound => ("ALERT_NOT_FOUND", "Alert not found".to_string(), None),
            AppError::StoreIo(msg) => ("STORE_IO_ERROR", msg.clone(), None),
            AppError::Notification(msg) => ("NOTIFICATION_ERROR", msg.clone(), None),
            AppError::Config(msg) => ("CONFIG_ERROR", msg.clone(), None),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::StoreIo(e.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::AlertNotFound => axum::http::StatusCode::NOT_FOUND,
            AppError::Validation(_) => axum::http::StatusCode::BAD_REQUEST,
            e if e.is_provider_error() => axum::http::StatusCode::BAD_GATEWAY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
