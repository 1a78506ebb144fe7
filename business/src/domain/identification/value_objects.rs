use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::errors::IdentificationError;

static DATA_URL_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^data:image/[a-z+.-]+;base64,").ok());

/// Correlation token for one logical identification request.
/// A fresh id is minted every time a request starts; retries keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confidence score reported by the recognition service, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, IdentificationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(IdentificationError::ConfidenceOutOfRange);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

/// Content address of the image that was sent for identification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference(String);

impl ImageReference {
    /// Hex encoded SHA-256 of the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw photo as handed over by the capture source, in any decodable format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Accepts plain base64 as well as `data:image/...;base64,` URLs.
    pub fn from_base64(raw: &str) -> Result<Self, IdentificationError> {
        let trimmed = raw.trim();
        let stripped = match DATA_URL_PREFIX.as_ref() {
            Some(re) => re.replace(trimmed, "").into_owned(),
            None => trimmed.to_string(),
        };
        let clean: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = STANDARD
            .decode(clean)
            .map_err(|_| IdentificationError::ImageEncoding)?;
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Transport-ready image produced by the preprocessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: String,
    width: u32,
    height: u32,
    reference: ImageReference,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, width: u32, height: u32) -> Self {
        let reference = ImageReference::from_bytes(&bytes);
        Self {
            bytes,
            mime_type: mime_type.into(),
            width,
            height,
            reference,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn reference(&self) -> &ImageReference {
        &self.reference
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_confidence_bounds() {
        assert_eq!(Confidence::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Confidence::new(1.0).unwrap().value(), 1.0);
    }

    #[test]
    fn should_reject_confidence_outside_unit_interval() {
        assert!(Confidence::new(1.0001).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn should_mint_distinct_request_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn should_decode_base64_when_data_url_prefix_present() {
        let image = CapturedImage::from_base64("data:image/png;base64,AQID").unwrap();
        assert_eq!(image.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn should_decode_base64_ignoring_whitespace() {
        let image = CapturedImage::from_base64("AQ\nID ").unwrap();
        assert_eq!(image.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn should_reject_invalid_base64() {
        assert!(matches!(
            CapturedImage::from_base64("not base64!"),
            Err(IdentificationError::ImageEncoding)
        ));
    }

    #[test]
    fn should_derive_stable_image_reference_from_payload_bytes() {
        let first = ImagePayload::new(vec![1, 2, 3], "image/jpeg", 1, 1);
        let second = ImagePayload::new(vec![1, 2, 3], "image/jpeg", 1, 1);
        assert_eq!(first.reference(), second.reference());
        assert_eq!(first.reference().as_str().len(), 64);
    }

    #[test]
    fn should_encode_reference_as_lowercase_sha256_hex() {
        assert_eq!(
            ImageReference::from_bytes(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn should_strip_data_url_prefix_on_repeated_decodes() {
        for prefix in ["data:image/jpeg;base64,", "data:image/svg+xml;base64,", ""] {
            let image = CapturedImage::from_base64(&format!("  {}AQID\n", prefix)).unwrap();
            assert_eq!(image.bytes(), &[1, 2, 3]);
        }
    }
}
