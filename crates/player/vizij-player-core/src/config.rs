//! Player configuration.

use serde::{Deserialize, Serialize};

/// Host platform facts that change playback policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformInfo {
    pub ios: bool,
    pub android: bool,
    /// The loaded content includes video.
    pub has_video: bool,
    /// The host has created an audio context.
    pub has_audio: bool,
}

impl PlatformInfo {
    /// Android cannot autoplay video without a user gesture.
    #[inline]
    pub fn suppresses_autoplay(&self) -> bool {
        self.has_video && self.android
    }

    /// iOS only unlocks audio from inside a user interaction.
    #[inline]
    pub fn needs_audio_unlock(&self) -> bool {
        self.has_audio && self.ios
    }
}

/// Configuration for the player. Every field has a default, so partial
/// JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub platform: PlatformInfo,
    /// Ask the host for a repaint after `stop()`.
    pub redraw_on_stop: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            platform: PlatformInfo::default(),
            redraw_on_stop: true,
        }
    }
}

impl PlayerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
