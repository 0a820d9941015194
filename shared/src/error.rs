use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::GENERIC_DISPATCH_FAILURE;
use crate::capabilities::HttpError;
use crate::draft::ValidationError;

pub const NOT_AUTHENTICATED_MESSAGE: &str = "You must be logged in to request an ambulance";
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Unable to reach the ambulance service. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitErrorKind {
    NotAuthenticated,
    Validation,
    NetworkOrServer,
}

/// Why a submission ended in `Failed`. Every case can be retried by submitting again.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitError {
    #[error("no session credential")]
    NotAuthenticated,

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("dispatch failed (status {status:?}): {message}")]
    NetworkOrServerError {
        status: Option<u16>,
        message: String,
    },
}

impl SubmitError {
    pub fn kind(&self) -> SubmitErrorKind {
        match self {
            Self::NotAuthenticated => SubmitErrorKind::NotAuthenticated,
            Self::ValidationFailed(_) => SubmitErrorKind::Validation,
            Self::NetworkOrServerError { .. } => SubmitErrorKind::NetworkOrServer,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => NOT_AUTHENTICATED_MESSAGE.into(),
            Self::ValidationFailed(e) => e.user_message(),
            Self::NetworkOrServerError { message, .. } => message.clone(),
        }
    }

    /// Non-2xx reply. The body's `error` field wins over the generic text.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        Self::NetworkOrServerError {
            status: Some(status),
            message: server_message.unwrap_or_else(|| GENERIC_DISPATCH_FAILURE.into()),
        }
    }

    pub fn transport() -> Self {
        Self::NetworkOrServerError {
            status: None,
            message: TRANSPORT_FAILURE_MESSAGE.into(),
        }
    }
}

impl From<HttpError> for SubmitError {
    fn from(_: HttpError) -> Self {
        Self::transport()
    }
}
