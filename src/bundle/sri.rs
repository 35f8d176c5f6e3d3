//! Subresource Integrity hashes for bundle payloads
//!
//! Inline payloads are allow-listed in a Content-Security-Policy by hash
//! (`style-src 'sha256-...'`); remote copies may carry an `integrity`
//! attribute in the same format.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::digest;
use std::fmt;

/// SRI hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SriAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl SriAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SriAlgorithm::Sha256 => "sha256",
            SriAlgorithm::Sha384 => "sha384",
            SriAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sha256" => Some(SriAlgorithm::Sha256),
            "sha384" => Some(SriAlgorithm::Sha384),
            "sha512" => Some(SriAlgorithm::Sha512),
            _ => None,
        }
    }

    fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            SriAlgorithm::Sha256 => &digest::SHA256,
            SriAlgorithm::Sha384 => &digest::SHA384,
            SriAlgorithm::Sha512 => &digest::SHA512,
        }
    }
}

/// SRI hash value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SriHash {
    pub algorithm: SriAlgorithm,
    pub hash: String,
}

impl SriHash {
    /// Hash content with the given algorithm
    pub fn compute(algorithm: SriAlgorithm, content: &[u8]) -> Self {
        let actual = digest::digest(algorithm.digest_algorithm(), content);
        Self {
            algorithm,
            hash: STANDARD.encode(actual.as_ref()),
        }
    }

    /// Parse from integrity attribute value (e.g., "sha384-abc123...")
    ///
    /// The digest must decode to the algorithm's output length.
    pub fn parse(value: &str) -> Option<Self> {
        let (algorithm, hash) = value.split_once('-')?;
        let algorithm = SriAlgorithm::from_str(algorithm)?;
        let digest = STANDARD.decode(hash).ok()?;
        if digest.len() != algorithm.digest_algorithm().output_len() {
            return None;
        }
        Some(Self {
            algorithm,
            hash: hash.to_string(),
        })
    }

    /// Whether content matches this hash
    pub fn matches(&self, content: &[u8]) -> bool {
        Self::compute(self.algorithm, content).hash == self.hash
    }

    /// Source expression for a CSP directive
    pub fn csp_source(&self) -> String {
        format!("'{}'", self)
    }
}

impl fmt::Display for SriHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm.as_str(), self.hash)
    }
}
