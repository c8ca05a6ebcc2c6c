// RptWatch - core/encoding.rs
//
// Streaming text decoding for tailed bytes.
//
// Report files are written in the observed host's default code page, which
// is not necessarily UTF-8. Decoding is stateful: a multi-byte sequence cut
// in half by one read is completed by the next, so the emitted text never
// depends on where the read boundaries fell. A decoder instance belongs to
// one epoch of one file and is reset on every switch and every truncation.
//
// Malformed input decodes to U+FFFD; decoding never fails.

use crate::util::constants::{FALLBACK_ENCODING, WINDOWS_DEFAULT_ENCODING};
use crate::util::error::ConfigError;
use encoding_rs::{CoderResult, Decoder, Encoding};

/// Look up an encoding by WHATWG label ("utf-8", "windows-1252", "latin1", ...).
pub fn resolve(label: &str) -> Result<&'static Encoding, ConfigError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ConfigError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// The label matching the host's default text encoding.
///
/// Windows report writers use the ANSI code page; `windows-1252` covers the
/// Western European default. Elsewhere the charset suffix of the locale
/// variables is used (`en_US.ISO-8859-1` -> `ISO-8859-1`).
pub fn host_default_label() -> String {
    if cfg!(windows) {
        return WINDOWS_DEFAULT_ENCODING.to_string();
    }

    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .and_then(|locale| charset_of(&locale))
        .filter(|label| Encoding::for_label(label.as_bytes()).is_some())
        .unwrap_or_else(|| FALLBACK_ENCODING.to_string())
}

/// Extract the charset from a POSIX locale string (`lang_COUNTRY.charset@modifier`).
fn charset_of(locale: &str) -> Option<String> {
    let (_, rest) = locale.split_once('.')?;
    let charset = rest.split('@').next().unwrap_or(rest);
    (!charset.is_empty()).then(|| charset.to_string())
}

/// Incremental decoder for one epoch of one file.
pub struct TextDecoder {
    encoding: &'static Encoding,
    decoder: Decoder,
}

impl TextDecoder {
    /// A decoder that honours a byte-order mark at the start of the stream
    /// and otherwise decodes as `encoding`.
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder(),
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Forget any buffered partial sequence; the next byte is treated as the
    /// start of a stream.
    pub fn reset(&mut self) {
        self.decoder = self.encoding.new_decoder();
    }

    /// Decode the next bytes of the stream. A trailing incomplete sequence is
    /// held back until the following call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len().saturating_mul(3));
        let mut out = String::with_capacity(capacity);
        let mut input = bytes;

        loop {
            let (result, read, _had_errors) = self.decoder.decode_to_string(input, &mut out, false);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => out.reserve(input.len().max(16) * 3),
            }
        }

        out
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("encoding", &self.encoding.name())
            .finish()
    }
}
