//! Ray input routing: turns pointer/controller ray hits into runtime events
//! addressed to the mesh that was hit.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::EventBus;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RayEventKind {
    Down,
    Up,
    Over,
    Out,
}

impl RayEventKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Down => "raydown",
            Self::Up => "rayup",
            Self::Over => "rayover",
            Self::Out => "rayout",
        }
    }
}

/// Events the scene's scripts subscribe to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RuntimeEvent {
    Ray { kind: RayEventKind, mesh: Uuid },
}

impl RuntimeEvent {
    /// Channel name, e.g. `raydown:<mesh uuid>`.
    pub fn channel(&self) -> String {
        match self {
            Self::Ray { kind, mesh } => format!("{}:{}", kind.name(), mesh),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct RayInputRouter {
    bus: Rc<EventBus<RuntimeEvent>>,
    viewport: Viewport,
    cursor: CursorHint,
}

impl RayInputRouter {
    /// Starts with a zero-sized viewport until the first resize.
    pub fn new(bus: Rc<EventBus<RuntimeEvent>>) -> Self {
        Self {
            bus,
            viewport: Viewport::default(),
            cursor: CursorHint::Default,
        }
    }

    /// Publish a ray event for `mesh`. Misses and events arriving while the
    /// editor is active are dropped and return None; otherwise the cursor
    /// hint after the event is returned.
    pub fn handle(
        &mut self,
        kind: RayEventKind,
        mesh: Option<Uuid>,
        editor_active: bool,
    ) -> Option<CursorHint> {
        let mesh = mesh?;
        if editor_active {
            return None;
        }

        match kind {
            RayEventKind::Over => self.cursor = CursorHint::Pointer,
            RayEventKind::Out => self.cursor = CursorHint::Default,
            RayEventKind::Down | RayEventKind::Up => {}
        }

        self.bus.publish(&RuntimeEvent::Ray { kind, mesh });
        Some(self.cursor)
    }

    pub fn set_size(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    #[inline]
    pub fn bus(&self) -> &Rc<EventBus<RuntimeEvent>> {
        &self.bus
    }
}
