//! Binding contexts to requests and responses.
//!
//! The context of an exchange travels in the `http` extensions: the caller
//! puts the outgoing [`Context`] on the request, the decorators put the
//! back-propagated one (or the failure) on the response.

use std::fmt;
use std::sync::Arc;

use http::{Request, Response};

use crate::context::Context;
use crate::error::Error;

/// Extraction failure attached to a request or response.
///
/// Extensions must be clonable, so the error is shared behind an `Arc`.
#[derive(Clone)]
pub struct ExtractionError(Arc<Error>);

impl ExtractionError {
    pub fn new(error: Error) -> Self {
        Self(Arc::new(error))
    }

    pub fn error(&self) -> &Error {
        &self.0
    }
}

impl fmt::Debug for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.0)
    }
}

/// Context accessors for [`http::Request`].
pub trait RequestExt {
    /// Use `cx` as the context of this request.
    fn with_context(self, cx: Context) -> Self;

    /// Context bound to this request, if any.
    fn context(&self) -> Option<&Context>;

    /// Failure recorded while extracting the incoming headers (server side).
    fn extraction_error(&self) -> Option<&Error>;
}

impl<B> RequestExt for Request<B> {
    fn with_context(mut self, cx: Context) -> Self {
        self.extensions_mut().insert(cx);
        self
    }

    fn context(&self) -> Option<&Context> {
        self.extensions().get::<Context>()
    }

    fn extraction_error(&self) -> Option<&Error> {
        self.extensions().get::<ExtractionError>().map(ExtractionError::error)
    }
}

/// Back-propagation result for [`http::Response`].
pub trait ResponseExt {
    /// Context extracted from this response's headers.
    ///
    /// `Ok(None)` when no extracting decorator handled the response. An
    /// `Err` means the exchange succeeded but its headers could not be
    /// extracted; keep using the context the request was sent with.
    fn back_propagated(&self) -> Result<Option<&Context>, &Error>;
}

impl<B> ResponseExt for Response<B> {
    fn back_propagated(&self) -> Result<Option<&Context>, &Error> {
        if let Some(failure) = self.extensions().get::<ExtractionError>() {
            return Err(failure.error());
        }
        Ok(self.extensions().get::<Context>())
    }
}
