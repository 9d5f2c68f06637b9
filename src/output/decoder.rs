//! Incremental UTF-8 decoding of PTY reads.

use std::str;

/// Error for bytes that can never form valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedUtf8 {
    /// Offset of the first bad byte within the decoded window.
    pub valid_up_to: usize,
}

impl std::fmt::Display for MalformedUtf8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed UTF-8 after {} bytes", self.valid_up_to)
    }
}

impl std::error::Error for MalformedUtf8 {}

/// Decodes a byte stream chunk by chunk.
///
/// A multi-byte character cut by a read boundary is held back and
/// completed by the next chunk.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no carried bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk.
    ///
    /// On malformed input the carried bytes and the whole chunk are
    /// dropped.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, MalformedUtf8> {
        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);

        match str::from_utf8(&window) {
            Ok(text) => Ok(text.to_owned()),
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.carry = window.split_off(valid);
                // Everything before `valid` was checked above.
                Ok(String::from_utf8_lossy(&window).into_owned())
            }
            Err(e) => Err(MalformedUtf8 {
                valid_up_to: e.valid_up_to(),
            }),
        }
    }

    /// Whether a partial character is waiting for more bytes.
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"hello\n").unwrap(), "hello\n");
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_split_multibyte_char() {
        let bytes = "㉿".as_bytes();
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(&bytes[..1]).unwrap(), "");
        assert!(dec.has_pending());
        assert_eq!(dec.decode(&bytes[1..]).unwrap(), "㉿");
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_split_after_ascii() {
        let mut input = b"kali".to_vec();
        input.extend_from_slice("㉿".as_bytes());
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(&input[..5]).unwrap(), "kali");
        assert_eq!(dec.decode(&input[5..]).unwrap(), "㉿");
    }

    #[test]
    fn test_malformed_is_error() {
        let mut dec = Utf8Decoder::new();
        let err = dec.decode(b"ok\xffnot").unwrap_err();
        assert_eq!(err.valid_up_to, 2);
        assert!(!dec.has_pending());
        assert_eq!(dec.decode(b"next\n").unwrap(), "next\n");
    }
}
