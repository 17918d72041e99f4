//! Transport decorators.
//!
//! # Data Flow
//! ```text
//! client                                            server
//! Request (+ Context ext)
//!     → client.rs InjectService  ── headers ──▶   server.rs ServerService
//!                                                     → extract → Context ext
//!                                                     → handler
//!                                                     ← Response (+ Context ext)
//!     ← client.rs ExtractService ◀── headers ──   ← inject
//! Response (+ Context | ExtractionError ext)
//! ```
//!
//! # Design Decisions
//! - Decorators are `tower` layers, so any `Service<http::Request<_>>`
//!   (e.g. a `hyper-util` client) can be wrapped
//! - Contexts ride in `http` extensions; ext.rs hides the lookups

pub mod client;
pub mod ext;
pub mod server;

pub use client::{ExtractLayer, ExtractService, InjectLayer, InjectService, PropagationLayer};
pub use ext::{ExtractionError, RequestExt, ResponseExt};
pub use server::{ServerLayer, ServerService};
