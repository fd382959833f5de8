//! sqlweave diagnostics and error handling
//!
//! This crate provides the error infrastructure shared by the sqlweave crates:
//! error codes, the top-level [`WeaveError`], byte spans into type strings, and
//! diagnostic reporting for command-line callers.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for sqlweave operations
pub type Result<T> = std::result::Result<T, WeaveError>;
