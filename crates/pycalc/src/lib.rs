//! # pycalc Shared Rust Library
//!
//! Shared infrastructure for the pycalc crates:
//! - **error**: Common error type with context
//! - **tracing**: Logging setup and segment prefixes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pycalc::error::Error;
//! use pycalc::tracing::prefix;
//! ```

pub mod error;
pub mod tracing;

pub use error::{Error, Result};
