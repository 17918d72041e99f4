//! Error taxonomy.
//!
//! Every variant carries a stage label and wraps its cause, so
//! `std::error::Error::source` always reaches the error a codec returned.

use thiserror::Error;

pub use tower::BoxError;

/// Failure of a single propagator.
#[derive(Debug, Error)]
pub enum PropagatorError {
    /// The encoder rejected a value that is present in the context.
    #[error("encode context value `{name}`: {source}")]
    Encode {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The header value was not valid base64.
    #[error("base64 decode context value `{name}`: {source}")]
    MalformedPayload {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    /// The decoder rejected a well-formed payload.
    #[error("decode context value `{name}`: {source}")]
    Decode {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl PropagatorError {
    /// Name of the propagator that failed.
    pub fn name(&self) -> &str {
        match self {
            PropagatorError::Encode { name, .. }
            | PropagatorError::MalformedPayload { name, .. }
            | PropagatorError::Decode { name, .. } => name,
        }
    }
}

/// Failure of a whole inject or extract call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("inject context values: {0}")]
    Inject(#[source] PropagatorError),

    #[error("extract context values: {0}")]
    Extract(#[source] PropagatorError),
}

impl Error {
    /// The propagator failure this call stopped at.
    pub fn propagator_error(&self) -> &PropagatorError {
        match self {
            Error::Inject(e) | Error::Extract(e) => e,
        }
    }
}

/// Rejected propagator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("propagator name must not be empty")]
    EmptyName,

    #[error("propagator name `{name}` is not a valid header token: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("propagator name `{name}` is already registered")]
    DuplicateName { name: String },
}
