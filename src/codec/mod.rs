//! Per-value codec contract.
//!
//! # Data Flow
//! ```text
//! inject:  Context ─ Encoder::encode(key) ─▶ bytes  (empty = nothing to carry)
//! extract: bytes ─ Decoder::decode(cx, key) ─▶ Context (strict extension of cx)
//! ```
//!
//! # Design Decisions
//! - Any closure with the matching signature is a codec; no wrapper type needed
//! - Stateful codecs implement the traits on their own types
//! - Codec errors are boxed; the propagator adds the stage label

pub mod json;

use crate::context::{Context, ContextKey};
use crate::error::BoxError;

pub use json::{decode_json, encode_json, JsonCodec};

/// Turns the value stored under a key into a byte payload.
pub trait Encoder<T>: Send + Sync {
    /// Encode the value associated with `key`.
    ///
    /// Returns an empty payload when the value is absent.
    fn encode(&self, cx: &Context, key: &ContextKey<T>) -> Result<Vec<u8>, BoxError>;
}

/// Merges a byte payload back into a context.
pub trait Decoder<T>: Send + Sync {
    /// Decode `data` and return a context extending `cx` with the result.
    ///
    /// On error no context is returned; callers keep using `cx`.
    fn decode(&self, cx: &Context, key: &ContextKey<T>, data: &[u8])
        -> Result<Context, BoxError>;
}

impl<T, F> Encoder<T> for F
where
    F: Fn(&Context, &ContextKey<T>) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn encode(&self, cx: &Context, key: &ContextKey<T>) -> Result<Vec<u8>, BoxError> {
        self(cx, key)
    }
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&Context, &ContextKey<T>, &[u8]) -> Result<Context, BoxError> + Send + Sync,
{
    fn decode(
        &self,
        cx: &Context,
        key: &ContextKey<T>,
        data: &[u8],
    ) -> Result<Context, BoxError> {
        self(cx, key, data)
    }
}
