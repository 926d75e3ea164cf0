//! Errors shared by the importer and the admin tool

use thiserror::Error;

/// A non-success HTTP response from the target API.
///
/// The import logger looks for this type in an error chain and records the
/// status and body in the log file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub body: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Find the first `ApiError` in an error chain
    pub fn find_in(err: &anyhow::Error) -> Option<&ApiError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
    }
}
