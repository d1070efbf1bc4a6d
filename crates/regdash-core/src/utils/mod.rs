//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_age, format_amount, format_count, format_optional, format_percent, format_share,
    truncate_string,
};
