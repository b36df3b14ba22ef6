//! Byte-to-line framing with multi-encoding fallback.
//!
//! [`LineCodec`] is a tokio-util codec that turns raw byte chunks into
//! complete protocol lines. Bytes are buffered until a `\n` arrives and
//! each complete line is decoded as a unit, so the decoded text is the
//! same no matter how the stream was split into reads.
//!
//! Decoding attempts, in order:
//! 1. the configured encoding, strictly (default UTF-8);
//! 2. Latin-1, which maps every byte value to U+0000–U+00FF;
//! 3. Windows-1252 with lossy replacement, which cannot fail.
//!
//! The encoder half serializes outbound lines with the configured
//! encoding and appends CRLF.

use bytes::{BufMut, BytesMut};
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Maximum bytes a single inbound line may span, terminator included.
pub const MAX_LINE_LEN: usize = 8191;

/// Framing codec for the IRC wire: `\n`-terminated lines, `\r` stripped,
/// three-stage character decoding.
pub struct LineCodec {
    encoding: &'static Encoding,
    /// Set once a line has overrun [`MAX_LINE_LEN`]; bytes are discarded
    /// until the next terminator resynchronizes the stream.
    discarding: bool,
}

impl LineCodec {
    /// Create a codec for the given encoding label (e.g. `"utf-8"`).
    ///
    /// Returns `None` when the label is unknown; [`Config::validate`]
    /// rejects such labels before a codec is ever constructed.
    ///
    /// [`Config::validate`]: crate::config::Config::validate
    pub fn new(label: &str) -> Option<Self> {
        Encoding::for_label(label.as_bytes()).map(|encoding| Self {
            encoding,
            discarding: false,
        })
    }

    /// Decode one complete line's bytes into text.
    ///
    /// Never fails: the Latin-1 stage accepts every byte value, and the
    /// Windows-1252 stage behind it replaces rather than rejects.
    fn decode_bytes(&self, bytes: &[u8]) -> String {
        if let Some(s) = self
            .encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
        {
            return s.into_owned();
        }
        if let Some(s) = decode_latin1(bytes) {
            return s;
        }
        let (s, _) = encoding::WINDOWS_1252.decode_without_bom_handling(bytes);
        s.into_owned()
    }
}

/// Latin-1 maps each byte directly to the codepoint of the same value,
/// so this accepts any input.
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > MAX_LINE_LEN {
                    let overrun = src.len();
                    src.clear();
                    self.discarding = true;
                    return Err(ProtocolError::LineTooLong(overrun));
                }
                return Ok(None);
            };

            let line = src.split_to(pos + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }

            let mut end = line.len() - 1;
            if end > 0 && line[end - 1] == b'\r' {
                end -= 1;
            }
            return Ok(Some(self.decode_bytes(&line[..end])));
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let (bytes, _, _) = self.encoding.encode(&line);
        dst.reserve(bytes.len() + 2);
        dst.put_slice(&bytes);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(Some(line)) = codec.decode(buf) {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_splits_lines_and_strips_cr() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from(&b"PING :abc\r\n:srv 001 me :hi\nPART"[..]);

        let lines = drain(&mut codec, &mut buf);
        assert_eq!(lines, vec!["PING :abc", ":srv 001 me :hi"]);
        // Partial line stays buffered until more bytes arrive.
        assert_eq!(&buf[..], b"PART");
    }

    #[test]
    fn test_partial_line_across_feeds() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();

        buf.extend_from_slice(b"PRIVMSG #chan :hel");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"lo\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("PRIVMSG #chan :hello")
        );
    }

    #[test]
    fn test_utf8_decoded_across_chunk_boundary() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();

        // Split in the middle of the two-byte encoding of 'é'.
        let bytes = ":a!b@c PRIVMSG #x :café\r\n".as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() - 4);
        buf.extend_from_slice(head);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(tail);
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some(":a!b@c PRIVMSG #x :café")
        );
    }

    #[test]
    fn test_latin1_fallback() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        // 0xE9 is 'é' in Latin-1 and invalid as UTF-8.
        let mut buf = BytesMut::from(&b"caf\xe9\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("café"));
    }

    #[test]
    fn test_decode_never_fails_on_arbitrary_bytes() {
        let codec = LineCodec::new("utf-8").unwrap();
        for b in 0u8..=255 {
            let text = codec.decode_bytes(&[0xff, b, 0xfe]);
            assert!(!text.is_empty());
        }
    }

    #[test]
    fn test_configured_8bit_encoding() {
        let mut codec = LineCodec::new("windows-1252").unwrap();
        // 0x93/0x94 are curly quotes in Windows-1252.
        let mut buf = BytesMut::from(&b"\x93hi\x94\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("\u{201c}hi\u{201d}")
        );
    }

    #[test]
    fn test_oversized_line_is_error_then_resyncs() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&vec![b'a'; MAX_LINE_LEN + 10]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::LineTooLong(_))
        ));

        // The tail of the runaway line is skipped up to its terminator.
        buf.extend_from_slice(b"tail\nPING :x\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :x"));
    }

    #[test]
    fn test_encoder_appends_crlf() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut dst = BytesMut::new();
        codec.encode("NICK tester".to_string(), &mut dst).unwrap();
        assert_eq!(&dst[..], b"NICK tester\r\n");
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!(LineCodec::new("no-such-charset").is_none());
    }
}
