//! Client-side transport decorators.
//!
//! # Responsibilities
//! - Inject the request's context into its headers before sending
//! - Extract the response headers into that context once the exchange returns
//! - Compose both around any exchange primitive (`tower::Service`)
//!
//! # Design Decisions
//! - An inject failure aborts before the inner service is called
//! - An extract failure never hides the response: it is attached to it
//! - A transport failure passes through; nothing is extracted

use std::task::{self, Poll};

use futures_util::future::{self, BoxFuture};
use http::{Request, Response};
use tower::{BoxError, Layer, Service};

use crate::context::Context;
use crate::propagation::Registry;
use crate::transport::ext::{ExtractionError, RequestExt};

/// Layer injecting the request context into the outgoing headers.
#[derive(Debug, Clone)]
pub struct InjectLayer {
    registry: Registry,
}

impl InjectLayer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Default for InjectLayer {
    /// Uses the process-wide registry.
    fn default() -> Self {
        Self::new(Registry::global().clone())
    }
}

impl<S> Layer<S> for InjectLayer {
    type Service = InjectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InjectService {
            inner,
            registry: self.registry.clone(),
        }
    }
}

/// Service produced by [`InjectLayer`].
///
/// Errors are boxed: either the [`crate::Error`] of a failed injection or
/// the inner service's own error.
#[derive(Debug, Clone)]
pub struct InjectService<S> {
    inner: S,
    registry: Registry,
}

impl<S, B, R> Service<Request<B>> for InjectService<S>
where
    S: Service<Request<B>, Response = Response<R>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    R: Send + 'static,
{
    type Response = Response<R>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Response<R>, BoxError>>;

    fn poll_ready(&mut self, cx: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let outgoing = req.context().cloned().unwrap_or_default();
        if let Err(e) = self.registry.inject(&outgoing, req.headers_mut()) {
            tracing::debug!(error = %e, uri = %req.uri(), "Request not sent");
            return Box::pin(future::ready(Err(e.into())));
        }

        let fut = self.inner.call(req);
        Box::pin(async move { fut.await.map_err(Into::<BoxError>::into) })
    }
}

/// Layer extracting the response headers into the request context.
#[derive(Debug, Clone)]
pub struct ExtractLayer {
    registry: Registry,
}

impl ExtractLayer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Default for ExtractLayer {
    /// Uses the process-wide registry.
    fn default() -> Self {
        Self::new(Registry::global().clone())
    }
}

impl<S> Layer<S> for ExtractLayer {
    type Service = ExtractService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExtractService {
            inner,
            registry: self.registry.clone(),
        }
    }
}

/// Service produced by [`ExtractLayer`].
///
/// The extracted context is bound to the response; read it with
/// [`ResponseExt::back_propagated`](crate::ResponseExt::back_propagated).
#[derive(Debug, Clone)]
pub struct ExtractService<S> {
    inner: S,
    registry: Registry,
}

impl<S, B, R> Service<Request<B>> for ExtractService<S>
where
    S: Service<Request<B>, Response = Response<R>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    R: Send + 'static,
{
    type Response = Response<R>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response<R>, S::Error>>;

    fn poll_ready(&mut self, cx: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let original: Context = req.context().cloned().unwrap_or_default();
        let registry = self.registry.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut resp = fut.await?;
            match registry.extract(original, resp.headers()) {
                Ok(extracted) => {
                    resp.extensions_mut().insert(extracted);
                }
                Err(e) => {
                    tracing::warn!(error = %e, status = %resp.status(), "Back-propagation failed");
                    resp.extensions_mut().insert(ExtractionError::new(e));
                }
            }
            Ok::<_, S::Error>(resp)
        })
    }
}

/// Forward then backward propagation around one exchange.
///
/// Equivalent to [`InjectLayer`] wrapping [`ExtractLayer`].
#[derive(Debug, Clone)]
pub struct PropagationLayer {
    registry: Registry,
}

impl PropagationLayer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Default for PropagationLayer {
    /// Uses the process-wide registry.
    fn default() -> Self {
        Self::new(Registry::global().clone())
    }
}

impl<S> Layer<S> for PropagationLayer {
    type Service = InjectService<ExtractService<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        let extract = ExtractLayer::new(self.registry.clone()).layer(inner);
        InjectLayer::new(self.registry.clone()).layer(extract)
    }
}
