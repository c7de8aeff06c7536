use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AidgeError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Percent-encodes a query string component (RFC 3986 unreserved set).
///
/// Unreserved characters (A-Z, a-z, 0-9, '-', '.', '_', '~') are NOT encoded.
/// All other characters are encoded as `%XX` (uppercase hex).
/// Spaces become `%20` (NOT `+`).
pub(crate) fn percent_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    encoded
}

/// Computes the Aidge `sha256`/`v2` request signature.
///
/// The HMAC key is the access key secret and the signed message is the
/// secret immediately followed by the millisecond timestamp. The digest is
/// rendered as 64 uppercase hex characters.
pub(crate) fn sign(access_key_secret: &str, timestamp: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(access_key_secret.as_bytes())
        .map_err(|e| AidgeError::Signature(format!("HMAC key error: {}", e)))?;
    mac.update(access_key_secret.as_bytes());
    mac.update(timestamp.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}
