use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

/// Failures raised by the allocator and the context selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("reference document has no readable pages")]
    EmptyDocument,
}

impl QuizError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Per-page extraction failure. The selector recovers from these locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageReadError {
    #[error("page {index} is out of range (document has {page_count} pages)")]
    OutOfRange { index: usize, page_count: usize },
    #[error("page {index} has no extractable text")]
    NoText { index: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub field: String,
    pub issue: String,
}

/// The model answered, but not with a usable list of quiz items.
#[derive(Debug, thiserror::Error)]
pub enum ModelOutputError {
    #[error("model output contains no json array")]
    NoJsonArray,
    #[error("model output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("model output does not match the quiz item schema")]
    SchemaMismatch(Vec<ErrorDetail>),
    #[error("model output contains invalid quiz items")]
    InvalidItems(Vec<ErrorDetail>),
}

impl ModelOutputError {
    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            Self::SchemaMismatch(details) | Self::InvalidItems(details) => details,
            _ => &[],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    /// Carries the last failing topic's message and validation details.
    #[error("no topic produced questions: {message}")]
    NoQuestions { message: String, details: Vec<ErrorDetail> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Vec::new(),
            request_id: request_id.into(),
        }
    }

    pub fn with_details(mut self, details: Vec<ErrorDetail>) -> Self {
        self.details = details;
        self
    }

    pub fn from_quiz(err: QuizError, request_id: impl Into<String>) -> Self {
        match err {
            QuizError::InvalidInput(message) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message, request_id)
            }
            QuizError::EmptyDocument => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "EMPTY_DOCUMENT",
                err.to_string(),
                request_id,
            ),
        }
    }

    pub fn from_assembly(err: AssemblyError, request_id: impl Into<String>) -> Self {
        match err {
            AssemblyError::Quiz(inner) => Self::from_quiz(inner, request_id),
            AssemblyError::NoQuestions { ref details, .. } => {
                let details = details.clone();
                Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string(), request_id)
                    .with_details(details)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let payload = ErrorBody {
            status: "error",
            code: self.code,
            message: self.message,
            details: self.details,
            request_id: self.request_id,
        };
        (self.status, Json(payload)).into_response()
    }
}
