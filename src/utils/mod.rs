//! Utility functions and helpers.

pub mod fs;

// Re-exports for convenience
pub use fs::*;
