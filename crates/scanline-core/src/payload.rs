//! Decoding of base64 upload payloads.
//!
//! Clients send files either as plain base64 or as a `data:` URL such as
//! `data:image/png;base64,iVBORw0...`. Both forms decode to the same bytes.

use base64::Engine;
use base64::alphabet::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::{Error, Result};

/// Standard alphabet, padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Raw bytes recovered from an upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Decoded file content.
    pub bytes: Vec<u8>,
    /// Media type declared by a `data:` URL prefix, if any.
    pub mime_hint: Option<String>,
}

impl DecodedPayload {
    /// Returns the number of decoded bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if no bytes were decoded.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decodes a base64 string, optionally prefixed with `data:<mime>;base64,`.
pub fn decode_payload(input: &str) -> Result<DecodedPayload> {
    let input = input.trim();

    let (mime_hint, encoded) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest.split_once(',').ok_or_else(|| {
                Error::invalid_input().with_message("Invalid data URL: missing ',' separator")
            })?;

            let mime = header
                .split(';')
                .next()
                .map(str::trim)
                .filter(|mime| !mime.is_empty())
                .map(str::to_owned);

            (mime, body)
        }
        None => (None, input),
    };

    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = LENIENT.decode(compact.as_bytes()).map_err(|err| {
        Error::invalid_input()
            .with_message(format!("Invalid base64 payload: {err}"))
            .with_source(err)
    })?;

    Ok(DecodedPayload { bytes, mime_hint })
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as ENCODER;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn plain_base64() {
        let encoded = ENCODER.encode(b"hello world");
        let payload = decode_payload(&encoded).unwrap();
        assert_eq!(payload.bytes, b"hello world");
        assert_eq!(payload.mime_hint, None);
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let encoded = format!("data:image/png;base64,{}", ENCODER.encode(b"\x89PNG"));
        let payload = decode_payload(&encoded).unwrap();
        assert_eq!(payload.bytes, b"\x89PNG");
        assert_eq!(payload.mime_hint.as_deref(), Some("image/png"));
    }

    #[test]
    fn whitespace_and_missing_padding_are_tolerated() {
        let payload = decode_payload("  aGVs\nbG8  ").unwrap();
        assert_eq!(payload.bytes, b"hello");
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        let payload = decode_payload("").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn invalid_characters_are_rejected() {
        let error = decode_payload("not base64 !!").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(error.to_string().starts_with("Invalid base64 payload"));
    }

    #[test]
    fn data_url_without_separator_is_rejected() {
        let error = decode_payload("data:image/png;base64").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }
}
