//! Propagator name validation.
//!
//! # Responsibilities
//! - Derive the header field name of a propagator and reject invalid tokens
//! - Detect header collisions before a batch is appended
//!
//! # Design Decisions
//! - Collisions compare derived header names, so `Str` and `str` collide
//! - Returns the first problem found; a rejected batch appends nothing

use std::collections::HashSet;

use http::HeaderName;

use crate::config::RegistryConfig;
use crate::error::ConfigError;

/// Prefix reserved for propagated header fields.
pub const HEADER_PREFIX: &str = "x-ctxwire-";

/// Header field carrying the propagator called `name`.
pub fn header_name(name: &str) -> Result<HeaderName, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    HeaderName::try_from(format!("{HEADER_PREFIX}{name}")).map_err(|source| {
        ConfigError::InvalidName {
            name: name.to_string(),
            source,
        }
    })
}

/// Check that a batch of headers can be appended to those already registered.
pub fn check_collisions<'a>(
    config: &RegistryConfig,
    registered: impl IntoIterator<Item = &'a HeaderName>,
    batch: impl IntoIterator<Item = (&'a str, &'a HeaderName)>,
) -> Result<(), ConfigError> {
    let mut seen: HashSet<&HeaderName> = registered.into_iter().collect();

    for (name, header) in batch {
        if seen.insert(header) {
            continue;
        }
        if config.reject_duplicate_names {
            return Err(ConfigError::DuplicateName {
                name: name.to_string(),
            });
        }
        tracing::warn!(
            propagator = name,
            header = %header,
            "Duplicate propagator name, headers will overwrite each other"
        );
    }
    Ok(())
}
