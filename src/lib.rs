//! Propagate request-scoped context values over HTTP headers.
//!
//! Values travel forward (client → server) in request headers and backward
//! (server → client) in response headers. Each value is handled by a
//! [`Propagator`] bound to a [`ContextKey`] and a header field
//! `x-ctxwire-<name>`; a [`Registry`] applies all of them in registration
//! order.
//!
//! ```
//! use ctxwire::{Context, ContextKey, Registry, ValuePropagator};
//! use http::HeaderMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let user: ContextKey<String> = ContextKey::new("user");
//! let registry = Registry::new();
//! registry.register(ValuePropagator::json("user", &user)?)?;
//!
//! let mut headers = HeaderMap::new();
//! let cx = Context::new().with_value(&user, "ada".to_string());
//! registry.inject(&cx, &mut headers)?;
//!
//! let received = registry.extract(Context::new(), &headers)?;
//! assert_eq!(received.get(&user).map(String::as_str), Some("ada"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod propagation;
pub mod transport;

pub use codec::{Decoder, Encoder, JsonCodec};
pub use config::RegistryConfig;
pub use context::{Context, ContextKey};
pub use error::{BoxError, ConfigError, Error, PropagatorError};
pub use propagation::registry::{configure, extract, inject};
pub use propagation::{Propagator, Registry, ValuePropagator};
pub use transport::{
    ExtractLayer, ExtractionError, InjectLayer, PropagationLayer, RequestExt, ResponseExt,
    ServerLayer,
};
