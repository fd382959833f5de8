//! CLI functionality for the sqlweave tool
//!
//! - Type-core commands: normalize, coerce, concatenate, arithmetic, literals
//! - Column resolution of a select list against a JSON catalog
//! - Output formatting

pub mod catalog;
pub mod commands;
pub mod output;
