//! SHA-1 Webhook Signatures
//!
//! The platform signs every callback with `sha1(sort([token, timestamp, nonce]).join(""))`.

use sha1::{Digest, Sha1};

/// Compute the hex-encoded signature for a token, timestamp and nonce.
pub fn compute_signature(token: &str, timestamp: &str, nonce: &str) -> String {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();

    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Verify a callback signature. Comparison is exact and case-sensitive.
pub fn verify(token: &str, signature: &str, timestamp: &str, nonce: &str) -> bool {
    let expected = compute_signature(token, timestamp, nonce);
    // Constant-time comparison
    expected.len() == signature.len()
        && expected
            .as_bytes()
            .iter()
            .zip(signature.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Query parameters the platform attaches to every callback.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SignatureParams {
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    pub nonce: Option<String>,
    pub echostr: Option<String>,
}

impl SignatureParams {
    /// Verify the signature fields; any missing or empty field fails.
    pub fn verify(&self, token: &str) -> bool {
        match (
            non_empty(self.signature.as_deref()),
            non_empty(self.timestamp.as_deref()),
            non_empty(self.nonce.as_deref()),
        ) {
            (Some(signature), Some(timestamp), Some(nonce)) => {
                verify(token, signature, timestamp, nonce)
            }
            _ => false,
        }
    }

    /// The challenge string, if present and non-empty.
    pub fn echostr(&self) -> Option<&str> {
        non_empty(self.echostr.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
