//! Header propagation.
//!
//! # Data Flow
//! ```text
//! Registry::inject(cx, headers)
//!     → for each propagator, in registration order:
//!         value.rs: Encoder → base64 → headers["x-ctxwire-<name>"]
//!     → stop at the first failure, keep headers already written
//!
//! Registry::extract(cx, headers)
//!     → for each propagator, in registration order:
//!         value.rs: headers["x-ctxwire-<name>"] → base64 → Decoder(cx) → cx'
//!     → stop at the first failure, discard the partial context
//! ```

pub mod registry;
pub mod value;

use http::{HeaderMap, HeaderName};

use crate::context::Context;
use crate::error::PropagatorError;

pub use registry::Registry;
pub use value::ValuePropagator;

/// Moves context values into header fields and back.
pub trait Propagator: Send + Sync {
    /// Configured name, unique within a registry.
    fn name(&self) -> &str;

    /// Header field this propagator reads and writes.
    fn header_name(&self) -> &HeaderName;

    /// Write this propagator's value from `cx` into `headers`.
    fn inject(&self, cx: &Context, headers: &mut HeaderMap) -> Result<(), PropagatorError>;

    /// Read this propagator's header and fold it into `cx`.
    fn extract(&self, cx: Context, headers: &HeaderMap) -> Result<Context, PropagatorError>;

    fn boxed(self) -> Box<dyn Propagator>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}
