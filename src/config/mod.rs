//! Registry configuration.
//!
//! # Data Flow
//! ```text
//! host config (any serde format)
//!     → schema.rs (RegistryConfig, all fields defaulted)
//!     → Registry::with_config
//!
//! Registry::configure(propagators)
//!     → validation.rs (header token, duplicate names)
//!     → append to the ordered list, or reject the whole batch
//! ```
//!
//! # Design Decisions
//! - No file format of its own; the schema derives serde so hosts embed it
//! - Validation is a pure function over the names already registered

pub mod schema;
pub mod validation;

pub use schema::RegistryConfig;
