//! vizij-player
//!
//! Runtime controller for an interactive scene. The [`Player`] owns the
//! playback state machine and clock, drives a cooperative frame loop through
//! a host [`FrameScheduler`], loads scene documents and prefetches their
//! assets, and publishes typed [`PlayerEvent`]s. Scene evaluation, asset
//! loading and rendering stay behind the collaborator traits re-exported here.

pub mod assets;
pub mod clock;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod input;
pub mod player;
pub mod scene;
pub mod scheduler;
pub mod state;

pub use crate::assets::{AssetLoader, FileFetcher, NoAssets, SceneFetcher};
pub use crate::clock::{Clock, ClockState, ManualClock, SystemClock};
pub use crate::config::{PlatformInfo, PlayerConfig};
pub use crate::editor::{Editor, NoEditor};
pub use crate::error::LoadError;
pub use crate::events::{EventBus, PlayerEvent, SubscriptionId};
pub use crate::input::{CursorHint, RayEventKind, RayInputRouter, RuntimeEvent, Viewport};
pub use crate::player::{LoadCallback, LoadHandle, Player, RedrawHook, SceneSource};
pub use crate::scene::{ListenerId, ParameterListener, Scene, SharedScene};
pub use crate::scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use crate::state::PlaybackState;
