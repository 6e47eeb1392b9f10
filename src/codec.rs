//! Record payload codec.
//!
//! Tool arguments arrive as JSON, so record data is always a string on the
//! wire. Outgoing data that parses as standard base64 is decoded to its
//! binary form; anything else is UTF-8 encoded as-is (callers are told to
//! base64-encode binary payloads). On the read path the codec annotates
//! each record with `DataString` when the payload is valid UTF-8 and falls
//! back to a `DataBase64` annotation otherwise — a read never fails because
//! of payload content.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bstr::ByteSlice;

/// Encodes caller-supplied record data into the byte blob sent to the
/// service.
pub fn encode_data(data: &str) -> Vec<u8> {
    match BASE64.decode(data) {
        Ok(bytes) => bytes,
        Err(_) => data.as_bytes().to_vec(),
    }
}

/// Field name and value describing a returned payload: `DataString` with
/// the decoded text, or `DataBase64` with a binary-safe representation.
pub fn decoded_field(bytes: &[u8]) -> (&'static str, String) {
    match bytes.to_str() {
        Ok(text) => ("DataString", text.to_string()),
        Err(_) => ("DataBase64", BASE64.encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips() {
        let encoded = encode_data("CPU:10%");
        assert_eq!(encoded, b"CPU:10%");
        let (field, value) = decoded_field(&encoded);
        assert_eq!(field, "DataString");
        assert_eq!(value, "CPU:10%");
    }

    #[test]
    fn base64_input_is_decoded_to_binary() {
        let payload = BASE64.encode([0u8, 159, 146, 150]);
        assert_eq!(encode_data(&payload), vec![0u8, 159, 146, 150]);
    }

    #[test]
    fn invalid_utf8_is_annotated_not_raised() {
        let bytes = [0u8, 159, 146, 150];
        let (field, value) = decoded_field(&bytes);
        assert_eq!(field, "DataBase64");
        assert_eq!(BASE64.decode(value).unwrap(), bytes);
    }

    #[test]
    fn multibyte_text_survives() {
        let encoded = encode_data("温度=23°C");
        let (field, value) = decoded_field(&encoded);
        assert_eq!(field, "DataString");
        assert_eq!(value, "温度=23°C");
    }
}
