use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::error::RelayError;

const DATA_URI_MARKER: &str = ";base64,";

/// Decode a base64 payload, tolerating a leading `data:<type>;base64,`
/// prefix and embedded ASCII whitespace.
pub fn decode(content: &str) -> Result<Vec<u8>, RelayError> {
    let payload = strip_data_uri(content);

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RelayError::MediaDecodeFailure(e.to_string()))
}

pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

fn strip_data_uri(content: &str) -> &str {
    if !content.starts_with("data:") {
        return content;
    }
    match content.find(DATA_URI_MARKER) {
        Some(pos) => &content[pos + DATA_URI_MARKER.len()..],
        None => content,
    }
}
