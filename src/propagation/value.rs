//! Single-value propagator.
//!
//! # Responsibilities
//! - Bind one codec pair to one context key and one header field
//! - Base64 the codec payload for the wire and undo it on the way back
//! - Tell "value absent" apart from "empty value" by omitting the header

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::codec::{Decoder, Encoder, JsonCodec};
use crate::config::validation::header_name;
use crate::context::{Context, ContextKey};
use crate::error::{ConfigError, PropagatorError};
use crate::propagation::Propagator;

/// Propagates the value stored under one [`ContextKey`].
pub struct ValuePropagator<T, E, D> {
    name: String,
    header: HeaderName,
    key: ContextKey<T>,
    encoder: E,
    decoder: D,
}

impl<T, E, D> ValuePropagator<T, E, D>
where
    E: Encoder<T>,
    D: Decoder<T>,
{
    /// Create a propagator carrying `key` in the header derived from `name`.
    pub fn new(
        name: impl Into<String>,
        key: &ContextKey<T>,
        encoder: E,
        decoder: D,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let header = header_name(&name)?;
        Ok(Self {
            name,
            header,
            key: *key,
            encoder,
            decoder,
        })
    }

    pub fn key(&self) -> &ContextKey<T> {
        &self.key
    }
}

impl<T> ValuePropagator<T, JsonCodec, JsonCodec>
where
    JsonCodec: Encoder<T> + Decoder<T>,
{
    /// Create a propagator encoding its value as JSON.
    pub fn json(name: impl Into<String>, key: &ContextKey<T>) -> Result<Self, ConfigError> {
        Self::new(name, key, JsonCodec, JsonCodec)
    }
}

impl<T, E, D> Propagator for ValuePropagator<T, E, D>
where
    E: Encoder<T>,
    D: Decoder<T>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn header_name(&self) -> &HeaderName {
        &self.header
    }

    fn inject(&self, cx: &Context, headers: &mut HeaderMap) -> Result<(), PropagatorError> {
        let data = self
            .encoder
            .encode(cx, &self.key)
            .map_err(|source| PropagatorError::Encode {
                name: self.name.clone(),
                source,
            })?;

        if data.is_empty() {
            tracing::trace!(propagator = %self.name, "No value to propagate");
            return Ok(());
        }

        let value = HeaderValue::try_from(STANDARD.encode(&data)).map_err(|e| {
            PropagatorError::Encode {
                name: self.name.clone(),
                source: e.into(),
            }
        })?;
        headers.insert(self.header.clone(), value);
        Ok(())
    }

    fn extract(&self, cx: Context, headers: &HeaderMap) -> Result<Context, PropagatorError> {
        let encoded = match headers.get(&self.header) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(cx),
        };

        let data = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|source| PropagatorError::MalformedPayload {
                name: self.name.clone(),
                source,
            })?;

        self.decoder
            .decode(&cx, &self.key, &data)
            .map_err(|source| PropagatorError::Decode {
                name: self.name.clone(),
                source,
            })
    }
}

impl<T, E, D> fmt::Debug for ValuePropagator<T, E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePropagator")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
