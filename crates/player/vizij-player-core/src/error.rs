//! Error types for scene loading

use serde::{Deserialize, Serialize};

/// Everything that can go wrong while loading a scene.
///
/// Loading is the only fallible player operation. Errors are handed to the
/// caller's callback and never escape the player.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LoadError {
    /// The scene document could not be fetched
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The scene document is not valid JSON
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// The scene rejected the parsed document
    #[error("Scene deserialization failed: {reason}")]
    Deserialize { reason: String },

    /// Asset prefetch for the scene root failed
    #[error("Asset preload failed: {reason}")]
    Assets { reason: String },

    /// IO error
    #[error("IO error: {reason}")]
    Io { reason: String },

    /// The player was dropped before the load completed
    #[error("Load abandoned before completion")]
    Abandoned,
}

impl LoadError {
    pub fn assets(reason: impl Into<String>) -> Self {
        Self::Assets {
            reason: reason.into(),
        }
    }

    pub fn deserialize(reason: impl Into<String>) -> Self {
        Self::Deserialize {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::Io { .. } => "io",
            Self::Parse { .. } | Self::Deserialize { .. } => "document",
            Self::Assets { .. } => "assets",
            Self::Abandoned => "lifecycle",
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
