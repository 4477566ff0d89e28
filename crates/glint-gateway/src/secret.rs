//! Reversible API-key encoding for the record store.
//!
//! This is obfuscation, not protection: the encoding is base64 over the key
//! plus a fixed salt and anyone holding the stored value can recover the
//! key. It only keeps the key from being stored as recognizable plaintext.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const SALT: &str = "ai-context-salt";

/// Encode an API key for storage
pub fn encode_api_key(api_key: &str) -> String {
    STANDARD.encode(format!("{}{}", api_key, SALT))
}

/// Decode a stored API key. Returns `None` if the value is not a valid
/// encoding (tampered, truncated, or produced by something else).
pub fn decode_api_key(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    decoded.strip_suffix(SALT).map(|s| s.to_string())
}
