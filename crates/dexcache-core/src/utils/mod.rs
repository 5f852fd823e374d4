//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{display_name, format_height, format_weight, truncate_string};
