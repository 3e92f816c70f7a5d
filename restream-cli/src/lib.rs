//! Library entry for restream-cli used by integration tests and embedding.

pub mod commands;
pub mod record;

// Re-export commands for convenience
pub use commands::*;

/// Default tail cutoff for CLI streams (1 MiB)
pub const DEFAULT_TAIL_CUTOFF: usize = 1024 * 1024;
