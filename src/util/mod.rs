//! Utility functions for common operations.
//!
//! This module provides reusable text utilities: summary flattening,
//! control-character stripping and character-based truncation.
//!
//! # Examples
//!
//! ```
//! use feedharvest::util::clean_summary;
//!
//! let summary = clean_summary("First line\nsecond line");
//! assert_eq!(summary, "First line second line");
//! ```

mod text;

pub use text::{
    clean_summary, flatten_line_breaks, strip_control_chars, truncate_chars, MAX_SUMMARY_CHARS,
    TRUNCATION_MARKER,
};
