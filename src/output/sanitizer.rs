//! Escape sequence and control character stripping for the transcript.

use vte::{Params, Parser, Perform};

/// Removes terminal escape sequences and control characters from text.
///
/// OSC strings (`ESC ] ... BEL|ST`), CSI sequences including private `?`
/// parameters (`ESC [ ? 25 l`), SGR and erase sequences, other ESC
/// sequences, shift-in/shift-out and carriage returns are all dropped.
/// Printable text, newlines and tabs pass through.
///
/// A string introducer (`ESC ]`, `ESC P`, `ESC X`, `ESC ^`, `ESC _`) that is
/// never terminated removes only its own two bytes; the text after it is kept.
pub struct Sanitizer;

impl Sanitizer {
    /// Strip escape sequences from text.
    pub fn sanitize(input: &str) -> String {
        Self::sanitize_bytes(input.as_bytes())
    }

    /// Strip escape sequences from raw bytes.
    ///
    /// Invalid UTF-8 is replaced by U+FFFD.
    pub fn sanitize_bytes(input: &[u8]) -> String {
        if input.is_empty() {
            return String::new();
        }

        let mut extractor = PlainTextExtractor::with_capacity(input.len());

        match unterminated_string_start(input) {
            Some(start) => {
                Parser::new().advance(&mut extractor, &input[..start]);
                // Nothing after the introducer can end the string, so it is text.
                Parser::new().advance(&mut extractor, &input[start + 2..]);
            }
            None => Parser::new().advance(&mut extractor, input),
        }

        extractor.output
    }
}

const BEL: u8 = 0x07;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1a;
const ESC: u8 = 0x1b;

/// Offset of the first string introducer that no terminator follows.
///
/// vte leaves a string state on ESC, CAN or SUB, and an OSC string also on BEL.
fn unterminated_string_start(input: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < input.len() {
        let kind = input[i + 1];
        if input[i] != ESC || !matches!(kind, b']' | b'P' | b'X' | b'^' | b'_') {
            i += 1;
            continue;
        }

        let osc = kind == b']';
        let end = input[i + 2..]
            .iter()
            .position(|&b| matches!(b, ESC | CAN | SUB) || (osc && b == BEL));
        match end {
            Some(end) => i += 2 + end,
            None => return Some(i),
        }
    }
    None
}

/// VTE performer that keeps only printable text.
struct PlainTextExtractor {
    output: String,
}

impl PlainTextExtractor {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
        }
    }
}

impl Perform for PlainTextExtractor {
    fn print(&mut self, c: char) {
        self.output.push(c);
    }

    fn execute(&mut self, byte: u8) {
        // CR, SI/SO, BEL, BS and the rest of C0 are dropped.
        match byte {
            b'\n' | b'\t' => self.output.push(byte as char),
            _ => {}
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(
        &mut self,
        _params: &Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(Sanitizer::sanitize("hello world"), "hello world");
    }

    #[test]
    fn test_strip_color_codes() {
        assert_eq!(Sanitizer::sanitize("\x1b[31mERROR\x1b[0m\n"), "ERROR\n");
    }

    #[test]
    fn test_strip_carriage_return() {
        assert_eq!(Sanitizer::sanitize("line one\r\nline two\r"), "line one\nline two");
    }

    #[test]
    fn test_strip_private_mode_sequences() {
        // bracketed paste on/off, cursor hide/show
        let input = "\x1b[?2004h\x1b[?25lready\x1b[?25h\x1b[?2004l";
        assert_eq!(Sanitizer::sanitize(input), "ready");
    }

    #[test]
    fn test_strip_clear_and_home() {
        assert_eq!(Sanitizer::sanitize("\x1b[H\x1b[2Jcontent\x1b[K"), "content");
    }

    #[test]
    fn test_osc_title_bel_terminated() {
        let input = "\x1b]0;kali@kali: ~\x07actual content";
        assert_eq!(Sanitizer::sanitize(input), "actual content");
    }

    #[test]
    fn test_osc_string_terminated() {
        let input = "\x1b]7;file:///home/kali\x1b\\after";
        assert_eq!(Sanitizer::sanitize(input), "after");
    }

    #[test]
    fn test_unterminated_string_keeps_text() {
        assert_eq!(Sanitizer::sanitize("a\x1b_b"), "ab");
        assert_eq!(Sanitizer::sanitize("a\x1bPb"), "ab");
        assert_eq!(Sanitizer::sanitize("a\x1bXb"), "ab");
        assert_eq!(Sanitizer::sanitize("a\x1b^b"), "ab");
    }

    #[test]
    fn test_unterminated_osc_keeps_text() {
        assert_eq!(Sanitizer::sanitize("tail \x1b]x"), "tail x");
        assert_eq!(
            Sanitizer::sanitize("tail \x1b]no terminator here\r\n"),
            "tail no terminator here\n"
        );
    }

    #[test]
    fn test_unterminated_after_terminated_string() {
        let input = "\x1b]0;title\x07\x1b[1mbold\x1b[0m \x1b_rest";
        assert_eq!(Sanitizer::sanitize(input), "bold rest");
    }

    #[test]
    fn test_terminated_apc_removed() {
        assert_eq!(Sanitizer::sanitize("a\x1b_payload\x1b\\b"), "ab");
    }

    #[test]
    fn test_shift_in_out_removed() {
        assert_eq!(Sanitizer::sanitize("a\x0eb\x0fc"), "abc");
    }

    #[test]
    fn test_plain_esc_sequences() {
        // keypad mode, charset designation
        assert_eq!(Sanitizer::sanitize("\x1b=\x1b(Bplain"), "plain");
    }

    #[test]
    fn test_preserve_tabs_and_unicode() {
        let input = "col1\tcol2\t┌──(kali㉿kali)";
        assert_eq!(Sanitizer::sanitize(input), input);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Sanitizer::sanitize(""), "");
    }

    #[test]
    fn test_only_escape_codes() {
        assert_eq!(Sanitizer::sanitize("\x1b[31m\x1b[0m\x1b[2J"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "\x1b[1;32m┌──(kali㉿kali)-[\x1b[0;1m~\x1b[1;32m]\x1b[0m\r\n",
            "\x1b]0;title\x07plain\ttext\r\n",
            "no escapes at all",
            "\x1b[?2004h$ ls -la\r\n",
            "half \x1b]open",
        ];
        for sample in samples {
            let once = Sanitizer::sanitize(sample);
            assert_eq!(Sanitizer::sanitize(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn test_printable_unchanged_except_cr() {
        let input = "build succeeded in 3.2s (42 crates)";
        assert_eq!(Sanitizer::sanitize(input), input);
        assert_eq!(Sanitizer::sanitize("a\rb"), "ab");
    }

    #[test]
    fn test_sanitize_bytes_lossy() {
        assert_eq!(Sanitizer::sanitize_bytes(b"\x1b[1mok\x1b[0m"), "ok");
    }
}
