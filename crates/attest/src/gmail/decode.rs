//! Raw payload decoding
//!
//! Gmail returns `format=raw` messages in the URL-safe base64 alphabet.
//! Decoding maps `-` and `_` back to `+` and `/` and runs the standard
//! decoder. Padding is optional since Gmail does not always emit it.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;

use crate::error::AttestError;

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a URL-safe base64 raw payload to text
///
/// Whitespace (line-wrapped payloads) is ignored. Input that is not valid
/// base64 or does not decode to UTF-8 yields [`AttestError::DecodeFailure`].
///
/// The proving service takes the message as text, so 8-bit mail in another
/// charset (an unencoded ISO-8859-1 body, say) is not transcoded: it fails
/// here and the message cannot be proven. Bytes are never altered, so a
/// message that does decode is byte-for-byte what the provider sent.
pub fn decode_raw(data: &str) -> Result<String, AttestError> {
    let standard: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = STANDARD_LENIENT
        .decode(standard.as_bytes())
        .map_err(|e| AttestError::DecodeFailure {
            message: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| AttestError::DecodeFailure {
        message: format!("payload is not UTF-8: {}", e),
    })
}

/// Encode text the way the provider transports raw messages
pub fn encode_raw(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes())
}
