//! Content fingerprints for published assets

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of fingerprint characters embedded in a published file name.
pub const FILENAME_FINGERPRINT_LEN: usize = 20;

/// A SHA-256 digest of an asset's content.
///
/// The canonical text form is standard base64 with padding, which is also
/// the form used for subresource-integrity attributes.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute a fingerprint from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Get the raw digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Standard base64 encoding of the digest, padded
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse a padded base64 digest back into a fingerprint
    pub fn from_base64(s: &str) -> Option<Self> {
        let bytes = STANDARD.decode(s).ok()?;
        let digest: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(digest))
    }

    /// Short, filename-safe discriminator derived from the base64 form.
    ///
    /// Padding is stripped, `/` becomes `_` and the result is cut to
    /// [`FILENAME_FINGERPRINT_LEN`] characters. `+` is left as is.
    pub fn filename_token(&self) -> String {
        self.to_base64()
            .trim_end_matches('=')
            .replace('/', "_")
            .chars()
            .take(FILENAME_FINGERPRINT_LEN)
            .collect()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::from_base64(&value).ok_or_else(|| format!("invalid fingerprint: {}", value))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_base64()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.filename_token())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_hashing() {
        let h1 = Fingerprint::from_bytes(b"hello");
        let h2 = Fingerprint::from_bytes(b"hello");
        assert_eq!(h1, h2);
        assert_ne!(h1, Fingerprint::from_bytes(b"world"));
    }

    #[test]
    fn test_empty_content_base64() {
        let fp = Fingerprint::from_bytes(b"");
        assert_eq!(fp.to_base64(), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test]
    fn test_filename_token_is_safe() {
        let fp = Fingerprint::from_bytes(b"");
        let token = fp.filename_token();
        assert_eq!(token, "47DEQpj8HBSa+_TImW+5");
        assert_eq!(token.len(), FILENAME_FINGERPRINT_LEN);
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_filename_token_many_inputs() {
        for i in 0..256u32 {
            let token = Fingerprint::from_bytes(&i.to_le_bytes()).filename_token();
            assert!(token.len() <= FILENAME_FINGERPRINT_LEN);
            assert!(!token.contains('/') && !token.contains('='));
        }
    }

    #[test]
    fn test_base64_parse() {
        let fp = Fingerprint::from_bytes(b"test data");
        assert_eq!(Fingerprint::from_base64(&fp.to_base64()), Some(fp));
        assert!(Fingerprint::from_base64("not base64!").is_none());
        assert!(Fingerprint::from_base64("YWJj").is_none());
    }
}
