//! Session transcript: noise filtering and the append-only log.
//!
//! Every candidate line is sanitized, tested against an immutable
//! [`IgnorePatterns`] set, trimmed, and only then appended.

mod filter;
mod logger;
mod record;

pub use filter::{IgnorePatterns, NoiseFilter, DEFAULT_PATTERNS};
pub use logger::SessionLogger;
pub use record::{LogCategory, RecordFormat};
