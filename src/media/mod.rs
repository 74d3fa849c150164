pub mod codec;
pub mod mime;

/// Decoded media on its way to or from the session transport.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: Option<String>,
}

impl MediaPayload {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            filename,
        }
    }
}
