//! Server-side transport decorator.
//!
//! # Responsibilities
//! - Extract incoming request headers into the handler's context
//! - Inject the context the handler responds with into the response headers
//!
//! # Design Decisions
//! - The handler reads its context from the request extensions and hands the
//!   one to send back through the response extensions
//! - Failures never turn into error responses: the exchange itself is fine,
//!   so they are logged and recorded on the request instead

use std::task::{self, Poll};

use futures_util::future::BoxFuture;
use http::{Request, Response};
use tower::{Layer, Service};

use crate::context::Context;
use crate::propagation::Registry;
use crate::transport::ext::{ExtractionError, RequestExt};

/// Layer wiring a [`Registry`] into request handling.
#[derive(Debug, Clone)]
pub struct ServerLayer {
    registry: Registry,
}

impl ServerLayer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Default for ServerLayer {
    /// Uses the process-wide registry.
    fn default() -> Self {
        Self::new(Registry::global().clone())
    }
}

impl<S> Layer<S> for ServerLayer {
    type Service = ServerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ServerService {
            inner,
            registry: self.registry.clone(),
        }
    }
}

/// Service produced by [`ServerLayer`].
#[derive(Debug, Clone)]
pub struct ServerService<S> {
    inner: S,
    registry: Registry,
}

impl<S, B, R> Service<Request<B>> for ServerService<S>
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

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let base = req.context().cloned().unwrap_or_default();
        let incoming = match self.registry.extract(base.clone(), req.headers()) {
            Ok(cx) => cx,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %req.method(),
                    path = %req.uri().path(),
                    "Ignoring propagated headers"
                );
                req.extensions_mut().insert(ExtractionError::new(e));
                base
            }
        };
        req.extensions_mut().insert(incoming);

        let registry = self.registry.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut resp = fut.await?;
            let Some(outgoing) = resp.extensions().get::<Context>().cloned() else {
                return Ok(resp);
            };
            if let Err(e) = registry.inject(&outgoing, resp.headers_mut()) {
                tracing::warn!(error = %e, status = %resp.status(), "Response sent without full context");
            }
            Ok::<_, S::Error>(resp)
        })
    }
}
