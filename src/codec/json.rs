//! Default JSON codec.
//!
//! Encodes the value with `serde_json`; decoding overwrites whatever the
//! context held under the key. Use `serde_json::Value` as the value type for
//! untyped payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Decoder, Encoder};
use crate::context::{Context, ContextKey};
use crate::error::BoxError;

/// Codec serializing context values as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Encoder<T> for JsonCodec
where
    T: Serialize + 'static,
{
    fn encode(&self, cx: &Context, key: &ContextKey<T>) -> Result<Vec<u8>, BoxError> {
        encode_json(cx, key)
    }
}

impl<T> Decoder<T> for JsonCodec
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn decode(
        &self,
        cx: &Context,
        key: &ContextKey<T>,
        data: &[u8],
    ) -> Result<Context, BoxError> {
        decode_json(cx, key, data)
    }
}

/// Serialize the value under `key`, or return an empty payload if absent.
pub fn encode_json<T>(cx: &Context, key: &ContextKey<T>) -> Result<Vec<u8>, BoxError>
where
    T: Serialize + 'static,
{
    match cx.get(key) {
        Some(value) => Ok(serde_json::to_vec(value)?),
        None => Ok(Vec::new()),
    }
}

/// Parse `data` and store it under `key`, replacing any previous value.
pub fn decode_json<T>(cx: &Context, key: &ContextKey<T>, data: &[u8]) -> Result<Context, BoxError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let value: T = serde_json::from_slice(data)?;
    Ok(cx.with_value(key, value))
}
