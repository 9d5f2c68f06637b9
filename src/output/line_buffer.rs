//! Reassembly of arbitrary output chunks into complete lines.

/// Longest partial line held before it is released without a delimiter.
///
/// Progress bars redraw with `\r` and may never send `\n`.
pub const MAX_PENDING: usize = 64 * 1024;

/// Accumulates decoded text until newline delimiters appear.
///
/// Chunks have no alignment with line boundaries; the trailing partial
/// line is retained until a later chunk completes it, or until it grows
/// past the limit.
#[derive(Debug)]
pub struct LineBuffer {
    pending: String,
    limit: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING)
    }
}

impl LineBuffer {
    /// Create an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that releases a partial line once it exceeds `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: String::new(),
            limit: limit.max(1),
        }
    }

    /// Append a chunk and drain every line it completes, in order.
    ///
    /// Returned lines do not include the `\n` delimiter. An oversized
    /// partial line is returned last, as if it had been terminated.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let mut lines = match self.pending.rfind('\n') {
            Some(last_newline) => {
                let rest = self.pending.split_off(last_newline + 1);
                let complete = std::mem::replace(&mut self.pending, rest);
                complete
                    .strip_suffix('\n')
                    .unwrap_or(&complete)
                    .split('\n')
                    .map(str::to_owned)
                    .collect()
            }
            None => Vec::new(),
        };

        if self.pending.len() > self.limit {
            lines.push(std::mem::take(&mut self.pending));
        }

        lines
    }

    /// The partial line waiting for its delimiter.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Discard the partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_split_across_reads() {
        let mut buf = LineBuffer::new();
        assert!(buf.push("hello wor").is_empty());
        assert_eq!(buf.push("ld\nfoo\n"), vec!["hello world", "foo"]);
        assert_eq!(buf.pending(), "");
    }

    #[test]
    fn test_partial_line_retained() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push("one\ntw"), vec!["one"]);
        assert_eq!(buf.pending(), "tw");
        assert_eq!(buf.push("o\n"), vec!["two"]);
    }

    #[test]
    fn test_many_small_reads() {
        let mut buf = LineBuffer::new();
        let mut lines = Vec::new();
        for piece in ["a", "b", "c", "\n", "d", "\n"] {
            lines.extend(buf.push(piece));
        }
        assert_eq!(lines, vec!["abc", "d"]);
    }

    #[test]
    fn test_empty_lines_are_reported() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push("\n\nx\n"), vec!["", "", "x"]);
    }

    #[test]
    fn test_crlf_kept_for_caller() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push("ls\r\n"), vec!["ls\r"]);
    }

    #[test]
    fn test_clear() {
        let mut buf = LineBuffer::new();
        buf.push("dangling");
        buf.clear();
        assert_eq!(buf.push("fresh\n"), vec!["fresh"]);
    }

    #[test]
    fn test_oversized_partial_line_released() {
        let mut buf = LineBuffer::with_limit(8);
        assert!(buf.push("12345").is_empty());
        assert_eq!(buf.push("6789\rab"), vec!["123456789\rab"]);
        assert_eq!(buf.pending(), "");
    }

    #[test]
    fn test_progress_output_stays_bounded() {
        let mut buf = LineBuffer::with_limit(32);
        let mut released = 0;
        for pct in 0..=100 {
            released += buf.push(&format!("\rdownloading {pct:>3}%")).len();
            assert!(buf.pending().len() <= 32);
        }
        assert!(released > 0);
        assert_eq!(buf.push("\n").len(), 1);
    }

    #[test]
    fn test_limit_applies_after_complete_lines() {
        let mut buf = LineBuffer::with_limit(4);
        assert_eq!(buf.push("ok\nlonger tail"), vec!["ok", "longer tail"]);
        assert_eq!(buf.pending(), "");
    }
}
