//! HMAC-SHA256 signature verification for inbound webhooks.
//!
//! The voice platform signs the raw request body with a shared secret and
//! sends the lowercase hex digest in a header. Two header formats are
//! accepted:
//! - Raw: "&lt;hex&gt;"
//! - Prefixed: "sha256=&lt;hex&gt;"
//!
//! Digests are compared with `Mac::verify_slice`, which runs in constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default header carrying the webhook signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-elevenlabs-signature";

/// Length of a hex-encoded SHA-256 digest.
const HEX_DIGEST_LEN: usize = 64;

/// Signature validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Missing signature header.
    #[error("signature header missing")]
    MissingSignature,
    /// Invalid signature format.
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),
    /// Signature verification failed.
    #[error("signature verification failed")]
    VerificationFailed,
    /// Invalid secret key.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Shared secret and header name used to authenticate webhooks.
#[derive(Clone)]
pub struct SignatureConfig {
    secret: String,
    header: String,
}

impl fmt::Debug for SignatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureConfig")
            .field("secret", &"***")
            .field("header", &self.header)
            .finish()
    }
}

impl SignatureConfig {
    /// Creates a configuration for the given secret and header name.
    ///
    /// Header names are matched case-insensitively, so they are stored
    /// lowercase.
    pub fn new(secret: impl Into<String>, header: impl Into<String>) -> Self {
        Self { secret: secret.into(), header: header.into().to_ascii_lowercase() }
    }

    /// Creates a configuration using the default signature header.
    pub fn with_default_header(secret: impl Into<String>) -> Self {
        Self::new(secret, DEFAULT_SIGNATURE_HEADER)
    }

    /// Name of the header carrying the signature.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Signs a payload, producing the value a sender puts in the header.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the secret is empty.
    pub fn sign(&self, payload: &[u8]) -> Result<String, SignatureError> {
        if self.secret.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        generate_hmac_hex(payload, &self.secret)
    }

    /// Verifies the header value against the payload.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::MissingSignature` if no header was sent, and
    /// the errors of [`verify_signature`] otherwise.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::MissingSignature)?;
        verify_signature(payload, signature, &self.secret)
    }
}

/// Validates a webhook signature using HMAC-SHA256.
///
/// # Errors
///
/// - `MissingSignature` for an empty header value
/// - `InvalidSecret` for an empty secret
/// - `InvalidFormat` if the value is not a 64-character hex digest
/// - `VerificationFailed` if the digest does not match
///
/// # Example
///
/// ```
/// use callclock_api::crypto::{generate_hmac_hex, verify_signature};
///
/// let payload = br#"{"event":"conversation_started","conversation_id":"abc123"}"#;
/// let signature = generate_hmac_hex(payload, "my_secret_key").unwrap();
///
/// assert!(verify_signature(payload, &signature, "my_secret_key").is_ok());
/// assert!(verify_signature(payload, &signature, "other_key").is_err());
/// ```
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), SignatureError> {
    if signature.trim().is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    if secret.is_empty() {
        return Err(SignatureError::InvalidSecret);
    }

    let expected = parse_signature_format(signature.trim())?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(payload);
    mac.verify_slice(&expected).map_err(|_| SignatureError::VerificationFailed)
}

/// Generates HMAC-SHA256 signature as lowercase hex string.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret key is invalid.
pub fn generate_hmac_hex(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;

    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Decodes a raw or `sha256=`-prefixed hex digest into bytes.
fn parse_signature_format(signature: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_digest = signature.strip_prefix("sha256=").unwrap_or(signature);

    if hex_digest.len() != HEX_DIGEST_LEN {
        return Err(SignatureError::InvalidFormat(format!(
            "expected {HEX_DIGEST_LEN} hex characters, got {}",
            hex_digest.len()
        )));
    }

    hex::decode(hex_digest).map_err(|e| SignatureError::InvalidFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_signature_success() {
        let payload = b"test payload";
        let secret = "test_secret";

        let expected = generate_hmac_hex(payload, secret).unwrap();

        assert!(verify_signature(payload, &expected, secret).is_ok());
        assert!(verify_signature(payload, &format!("sha256={expected}"), secret).is_ok());
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let payload = b"test payload";
        let expected = generate_hmac_hex(payload, "secret").unwrap().to_uppercase();

        assert!(verify_signature(payload, &expected, "secret").is_ok());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let signature = generate_hmac_hex(b"original", "secret").unwrap();

        assert_eq!(
            verify_signature(b"tampered", &signature, "secret"),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn validate_signature_missing() {
        assert_eq!(
            verify_signature(b"test payload", "", "test_secret"),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn empty_secret_is_rejected() {
        let signature = generate_hmac_hex(b"payload", "secret").unwrap();

        assert_eq!(verify_signature(b"payload", &signature, ""), Err(SignatureError::InvalidSecret));
    }

    #[test]
    fn parse_signature_format_rejects_wrong_length() {
        assert!(matches!(parse_signature_format("abc123"), Err(SignatureError::InvalidFormat(_))));
        assert!(matches!(
            parse_signature_format("sha256=abc123"),
            Err(SignatureError::InvalidFormat(_))
        ));
    }

    #[test]
    fn parse_signature_format_rejects_non_hex() {
        let signature = "z".repeat(HEX_DIGEST_LEN);
        assert!(matches!(parse_signature_format(&signature), Err(SignatureError::InvalidFormat(_))));
    }

    #[test]
    fn generate_hmac_hex_matches_known_vector() {
        // RFC 4231 test case 2
        let digest = generate_hmac_hex(b"what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(digest, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn signature_config_requires_header_value() {
        let config = SignatureConfig::with_default_header("secret");
        let signature = config.sign(b"body").unwrap();

        assert_eq!(config.header(), DEFAULT_SIGNATURE_HEADER);
        assert_eq!(config.verify(b"body", None), Err(SignatureError::MissingSignature));
        assert!(config.verify(b"body", Some(&signature)).is_ok());
    }

    #[test]
    fn signature_config_debug_hides_secret() {
        let rendered = format!("{:?}", SignatureConfig::new("hunter2", "X-Custom-Signature"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("x-custom-signature"));
    }
}
