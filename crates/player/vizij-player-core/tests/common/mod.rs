#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value as JsonValue;
use vizij_player::{
    AssetLoader, ListenerId, LoadError, ManualClock, ManualScheduler, ParameterListener, Player,
    PlayerEvent, Scene, SceneFetcher,
};

pub fn init_tracing() {
    let default_filter = "vizij_player=debug";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Scene double that records every command and keeps variables in a map.
#[derive(Default)]
pub struct RecordingScene {
    pub calls: Vec<String>,
    pub advances: Vec<(f64, f64)>,
    /// Value returned from `advance`.
    pub report_changes: bool,
    pub document: Option<JsonValue>,
    pub reject_documents: bool,
    pub variables: HashMap<String, JsonValue>,
    pub listeners: HashMap<String, Vec<ParameterListener>>,
}

impl RecordingScene {
    pub fn commands(&self) -> Vec<&str> {
        self.calls.iter().map(String::as_str).collect()
    }
}

impl Scene for RecordingScene {
    fn play(&mut self) {
        self.calls.push("play".into());
    }

    fn pause(&mut self) {
        self.calls.push("pause".into());
    }

    fn stop(&mut self) {
        self.calls.push("stop".into());
    }

    fn reset(&mut self) {
        self.calls.push("reset".into());
    }

    fn advance(&mut self, elapsed: f64, delta: f64) -> bool {
        self.advances.push((elapsed, delta));
        self.report_changes
    }

    fn deserialize(&mut self, document: &JsonValue) -> Result<(), LoadError> {
        self.calls.push("deserialize".into());
        if self.reject_documents {
            return Err(LoadError::deserialize("scene rejected document"));
        }
        if let Some(vars) = document.get("variables").and_then(JsonValue::as_object) {
            for (k, v) in vars {
                self.variables.insert(k.clone(), v.clone());
            }
        }
        self.document = Some(document.clone());
        Ok(())
    }

    fn variable_read(&self, id: &str) -> Option<JsonValue> {
        self.variables.get(id).cloned()
    }

    fn variable_write(&mut self, id: &str, value: JsonValue) {
        if let Some(listeners) = self.listeners.get(id) {
            for l in listeners {
                l.variable_updated(&value);
            }
        }
        self.variables.insert(id.to_string(), value);
    }

    fn variable_lock(&mut self, id: &str, listener: ParameterListener) {
        self.listeners.entry(id.to_string()).or_default().push(listener);
    }

    fn variable_unlock(&mut self, id: &str, listener: ListenerId) {
        if let Some(listeners) = self.listeners.get_mut(id) {
            listeners.retain(|l| l.id() != listener);
        }
    }
}

/// Asset loader whose loads complete only when the test says so.
#[derive(Default)]
pub struct GatedAssets {
    pub roots: RefCell<Vec<JsonValue>>,
    gates: RefCell<Vec<oneshot::Sender<Result<(), LoadError>>>>,
}

impl GatedAssets {
    /// Complete the oldest outstanding load.
    pub fn complete(&self, result: Result<(), LoadError>) {
        let gate = self.gates.borrow_mut().remove(0);
        let _ = gate.send(result);
    }

    pub fn outstanding(&self) -> usize {
        self.gates.borrow().len()
    }
}

impl AssetLoader for GatedAssets {
    fn load_assets_for(&self, root: &JsonValue) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        self.roots.borrow_mut().push(root.clone());
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push(tx);
        rx.map(|r| r.unwrap_or(Err(LoadError::Abandoned))).boxed_local()
    }
}

/// Asset loader that fails any root listing an asset under `missing/`.
pub struct MissingAssets;

impl AssetLoader for MissingAssets {
    fn load_assets_for(&self, root: &JsonValue) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        let missing = root
            .get("assets")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
            .filter_map(JsonValue::as_str)
            .find(|a| a.starts_with("missing/"))
            .map(str::to_string);
        let result = match missing {
            Some(asset) => Err(LoadError::assets(format!("404 for {asset}"))),
            None => Ok(()),
        };
        future::ready(result).boxed_local()
    }
}

/// Fetcher serving documents from memory; unknown URLs fail.
#[derive(Default)]
pub struct MapFetcher {
    pub docs: HashMap<String, String>,
    pub fetched: RefCell<Vec<String>>,
}

impl MapFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.docs.insert(url.to_string(), body.to_string());
        self
    }
}

impl SceneFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, LoadError>> {
        self.fetched.borrow_mut().push(url.to_string());
        let result = self.docs.get(url).cloned().ok_or_else(|| LoadError::Fetch {
            url: url.to_string(),
            reason: "404".into(),
        });
        future::ready(result).boxed_local()
    }
}

/// A player wired to doubles, plus handles to observe them.
pub struct Rig {
    pub player: Player,
    pub scene: Rc<RefCell<RecordingScene>>,
    pub scheduler: Rc<ManualScheduler>,
    pub clock: Rc<ManualClock>,
    pub events: Rc<RefCell<Vec<PlayerEvent>>>,
    pub redraws: Rc<Cell<u32>>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with(|p| p)
    }

    /// Build a rig, letting the caller add collaborators to the player.
    pub fn with(configure: impl FnOnce(Player) -> Player) -> Self {
        init_tracing();
        let scene = Rc::new(RefCell::new(RecordingScene::default()));
        let scheduler = Rc::new(ManualScheduler::new());
        let clock = Rc::new(ManualClock::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        let redraws = Rc::new(Cell::new(0));

        let r = Rc::clone(&redraws);
        let player = Player::new(scene.clone(), scheduler.clone())
            .with_clock(clock.clone())
            .with_redraw(move |_force| r.set(r.get() + 1));
        let player = configure(player);

        let e = Rc::clone(&events);
        player
            .bus()
            .subscribe(move |ev: &PlayerEvent| e.borrow_mut().push(*ev));

        Self {
            player,
            scene,
            scheduler,
            clock,
            events,
            redraws,
        }
    }

    /// Advance the clock by `ms` and fire the pending frame, if any.
    pub fn tick(&mut self, ms: u64) -> bool {
        self.clock.advance(Duration::from_millis(ms));
        match self.scheduler.take_pending() {
            Some(_) => {
                self.player.on_frame();
                true
            }
            None => false,
        }
    }

    pub fn count(&self, wanted: PlayerEvent) -> usize {
        self.events.borrow().iter().filter(|e| **e == wanted).count()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|e| e.name()).collect()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}
