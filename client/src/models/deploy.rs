//! Deploy models
//!
//! Frames exchanged over the deploy stream and the revision records
//! returned by the registry.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Target application and free-text description of one deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployInfo {
    pub app: String,
    pub description: String,
}

/// A frame sent from the client to the deploy service.
///
/// Exactly one `Info` opens the stream; `File` frames carry the archive
/// bytes in order. End of upload is signalled by closing the send side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployRequest {
    Info(DeployInfo),
    File {
        #[serde(with = "base64_bytes")]
        chunk: Vec<u8>,
    },
}

/// A progress line sent by the deploy service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub text: String,
}

/// Opaque revision identifier.
///
/// Revisions made only of ASCII digits compare numerically and sort
/// before any other revision; everything else compares byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_digits(&self) -> Option<&str> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = self.0.trim_start_matches('0');
            Some(if trimmed.is_empty() { "0" } else { trimmed })
        } else {
            None
        }
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_digits(), other.numeric_digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A deploy revision as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deploy {
    pub revision: Revision,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub description: String,

    /// Whether this revision is the one currently serving
    #[serde(default)]
    pub current: bool,
}

/// List of deploys response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployListResponse {
    #[serde(default)]
    pub deploys: Vec<Deploy>,
}

/// Rollback request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub revision: Revision,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}
