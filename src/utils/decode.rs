// Base64 payload decoding

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// Standard alphabet, padding optional.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 document payload.
///
/// ASCII whitespace is dropped first so line-wrapped payloads (76-column MIME
/// style) decode the same as single-line ones. Any other character outside
/// the standard alphabet is an error.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        LENIENT_STANDARD.decode(compact)
    } else {
        LENIENT_STANDARD.decode(payload)
    }
}
