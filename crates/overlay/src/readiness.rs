use scene::Scene;

/// Holds scenes back until the map surface has finished loading.
///
/// Only the most recent scene is kept: on open, the last scene offered while
/// closed is the one that gets rendered.
#[derive(Debug, Default)]
pub struct SceneGate {
    open: bool,
    pending: Option<Scene>,
}

impl SceneGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Passes the scene through when open; otherwise buffers it, replacing
    /// any earlier buffered scene.
    pub fn offer(&mut self, scene: Scene) -> Option<Scene> {
        if self.open {
            return Some(scene);
        }
        self.pending = Some(scene);
        None
    }

    /// Opens the gate and hands back the buffered scene, if any.
    pub fn open(&mut self) -> Option<Scene> {
        self.open = true;
        self.pending.take()
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pending = None;
    }
}
