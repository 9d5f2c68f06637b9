//! Output processing for the transcript.
//!
//! This module provides tools for turning raw PTY output into loggable text:
//! - Escape sequence and control character stripping
//! - Incremental UTF-8 decoding across read boundaries
//! - Line reassembly
//!
//! # Example
//!
//! ```
//! use shell_scribe::output::{LineBuffer, Sanitizer};
//!
//! let clean = Sanitizer::sanitize("\x1b[31mERROR\x1b[0m\n");
//! assert_eq!(clean, "ERROR\n");
//!
//! let mut lines = LineBuffer::new();
//! assert!(lines.push("hello wor").is_empty());
//! assert_eq!(lines.push("ld\n"), vec!["hello world"]);
//! ```

mod decoder;
mod line_buffer;
mod sanitizer;

pub use decoder::{MalformedUtf8, Utf8Decoder};
pub use line_buffer::LineBuffer;
pub use sanitizer::Sanitizer;
