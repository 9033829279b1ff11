use serde::{Deserialize, Serialize};

/// Playback state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is running; the clock is at zero
    #[default]
    Stopped,
    /// A scene is being fetched or its assets are being prefetched
    Loading,
    /// A load finished and the scene can be played
    Ready,
    /// Frames keep ticking but the clock is frozen
    Paused,
    /// Frames tick and the clock advances
    Playing,
}

impl PlaybackState {
    /// Get the name of this playback state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }

    /// Check if the player is actively playing
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if frames compute a zero delta in this state
    #[inline]
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether moving from `self` to `next` is one of the expected transitions.
    ///
    /// Unexpected transitions are still applied by the player; this is used
    /// to flag them in the logs. Stopping and loading are valid from anywhere.
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        match (self, next) {
            (_, Stopped) | (_, Loading) => true,
            (Loading, Ready) => true,
            (Stopped | Ready | Paused, Playing) => true,
            (Loading | Ready | Paused | Playing, Paused) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for PlaybackState {
    fn from(s: &str) -> Self {
        match s {
            "stopped" => Self::Stopped,
            "loading" => Self::Loading,
            "ready" => Self::Ready,
            "paused" => Self::Paused,
            "playing" => Self::Playing,
            _ => Self::Stopped,
        }
    }
}
