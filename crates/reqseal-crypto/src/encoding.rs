//! Textual encoding for envelope fields (standard base64 with padding)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{SealError, SealResult};

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(field: &str, s: &str) -> SealResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| SealError::Encoding(format!("{field}: {e}")))
}
