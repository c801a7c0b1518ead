use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the keyed hash the gateway uses to sign webhook bodies: HMAC-SHA256 over the raw bytes, base64-encoded.
/// The comparison at the call site is byte-for-byte against the signature header.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}
