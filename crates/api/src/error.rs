use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_sim::SimError;
use runtime::SimulateError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SimError> for ApiError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::InvalidParameter { .. } => Self::BadRequest(err.to_string()),
            SimError::ResourceExhausted { .. } => Self::TooLarge(err.to_string()),
            SimError::Shape(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<SimulateError> for ApiError {
    fn from(err: SimulateError) -> Self {
        match err {
            SimulateError::Simulation(err) => err.into(),
            SimulateError::CacheUnavailable(_) => Self::Unavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
