//! The scene the player drives, and parameter listeners attached to its variables.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::LoadError;

/// Scene graph runtime commanded by the player.
///
/// The player never constructs a scene; it holds a shared handle and issues
/// lifecycle commands, per-frame updates and variable access through it.
pub trait Scene {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn reset(&mut self);

    /// Step the scene. `elapsed` is the total simulated time before this
    /// frame, `delta` the seconds to advance. Returns true if a redraw is needed.
    fn advance(&mut self, elapsed: f64, delta: f64) -> bool;

    /// Replace the scene contents with a parsed scene document.
    fn deserialize(&mut self, document: &JsonValue) -> Result<(), LoadError>;

    fn variable_read(&self, id: &str) -> Option<JsonValue>;
    fn variable_write(&mut self, id: &str, value: JsonValue);

    /// Attach `listener` to variable `id`; it is notified on every update.
    fn variable_lock(&mut self, id: &str, listener: ParameterListener);
    fn variable_unlock(&mut self, id: &str, listener: ListenerId);
}

pub type SharedScene = Rc<RefCell<dyn Scene>>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Handle to a host callback registered on a scene variable.
///
/// Returned by `Player::add_parameter_listener` and passed back to
/// `Player::remove_parameter_listener`.
#[derive(Clone)]
pub struct ParameterListener {
    id: ListenerId,
    on_update: Rc<dyn Fn(&JsonValue)>,
}

impl ParameterListener {
    pub fn new(id: ListenerId, on_update: impl Fn(&JsonValue) + 'static) -> Self {
        Self {
            id,
            on_update: Rc::new(on_update),
        }
    }

    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Called by the scene when the variable changes.
    #[inline]
    pub fn variable_updated(&self, value: &JsonValue) {
        (self.on_update)(value)
    }
}

impl fmt::Debug for ParameterListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterListener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
