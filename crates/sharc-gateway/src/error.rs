//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sharc_common::{AddressError, LedgerError, ScoringError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Missing or unreadable x-sharc-caller header")]
    MissingCaller,

    #[error("Caller {caller} may not act for {subject}")]
    SubjectMismatch { caller: String, subject: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Body, path or query the extractor could not decode
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Scoring(e) => match e {
                ScoringError::InvalidHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ScoringError::ScoreOutOfRange { .. } | ScoringError::InvalidPayload(_) => {
                    StatusCode::BAD_REQUEST
                }
                ScoringError::NoDecision { .. } => StatusCode::NOT_FOUND,
            },
            ApiError::Ledger(e) => match e {
                LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidServiceFeeRate { .. }
                | LedgerError::AmountOverflow => StatusCode::BAD_REQUEST,
                LedgerError::Unauthorized { .. } | LedgerError::NotBorrower { .. } => {
                    StatusCode::FORBIDDEN
                }
                LedgerError::NoActiveLoan { .. } => StatusCode::CONFLICT,
                LedgerError::InsufficientLiquidity { .. }
                | LedgerError::InsufficientCreditScore { .. }
                | LedgerError::OverpaymentNotAllowed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::TransferFailed(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Address(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCaller => StatusCode::UNAUTHORIZED,
            ApiError::SubjectMismatch { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = status.as_u16(), error = %self, "Request rejected");

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
