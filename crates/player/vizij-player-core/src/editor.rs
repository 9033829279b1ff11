//! Editor hook driven by the frame loop.

/// Hook for an editor running alongside the player.
///
/// The editor is updated once per processed frame, and while it is active
/// ray input is left to the editor instead of the scene.
pub trait Editor {
    fn update(&mut self);
    fn is_active(&self) -> bool;
}

/// Player-only hosts have no editor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEditor;

impl Editor for NoEditor {
    fn update(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }
}
