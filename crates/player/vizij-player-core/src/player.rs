use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::assets::{AssetLoader, FileFetcher, NoAssets, SceneFetcher};
use crate::clock::{Clock, ClockState, SystemClock};
use crate::config::PlayerConfig;
use crate::editor::{Editor, NoEditor};
use crate::error::LoadError;
use crate::events::{EventBus, PlayerEvent};
use crate::input::{CursorHint, RayEventKind, RayInputRouter, RuntimeEvent, Viewport};
use crate::scene::{ListenerId, ParameterListener, SharedScene};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::state::PlaybackState;

pub type LoadCallback = Box<dyn FnOnce(Option<&LoadError>)>;
pub type RedrawHook = Box<dyn FnMut(bool)>;
type StopCallback = Box<dyn FnOnce()>;

/// Where a scene document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    /// Fetched through the player's `SceneFetcher`.
    Url(String),
    /// Serialized scene document.
    Json(String),
    /// Already-parsed scene document.
    Object(JsonValue),
}

impl SceneSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn json(text: impl Into<String>) -> Self {
        Self::Json(text.into())
    }
}

impl From<JsonValue> for SceneSource {
    fn from(doc: JsonValue) -> Self {
        Self::Object(doc)
    }
}

/// Resolves once the load started by `Player::load_and_play` completes.
///
/// Completion is driven by `Player::poll_loads`, not by this handle.
#[derive(Debug)]
pub struct LoadHandle {
    // `None` once the result has been handed out
    rx: Option<oneshot::Receiver<Result<(), LoadError>>>,
}

impl LoadHandle {
    /// Take the result if the load has finished.
    ///
    /// The result is returned once; later calls return `None`.
    pub fn try_result(&mut self) -> Option<Result<(), LoadError>> {
        let rx = self.rx.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result?,
            Err(oneshot::Canceled) => Err(LoadError::Abandoned),
        };
        self.rx = None;
        Some(result)
    }
}

impl Future for LoadHandle {
    type Output = Result<(), LoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Pending;
        };
        let result = match rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(oneshot::Canceled)) => Err(LoadError::Abandoned),
            Poll::Pending => return Poll::Pending,
        };
        self.rx = None;
        Poll::Ready(result)
    }
}

enum LoadStage {
    Fetching {
        url: String,
        fetch: LocalBoxFuture<'static, Result<String, LoadError>>,
    },
    Preloading(LocalBoxFuture<'static, Result<(), LoadError>>),
}

impl LoadStage {
    fn failed(err: LoadError) -> Self {
        LoadStage::Preloading(future::ready(Err(err)).boxed_local())
    }
}

struct PendingLoad {
    stage: LoadStage,
    callback: Option<LoadCallback>,
    completion: Option<oneshot::Sender<Result<(), LoadError>>>,
    autoplay: bool,
}

/// Runtime controller for a scene: playback state machine, frame loop,
/// loading and variable access.
///
/// Everything runs on one thread. The host calls `on_frame` whenever a frame
/// requested through the `FrameScheduler` fires, and `poll_loads` from its
/// event loop while loads are in flight.
pub struct Player {
    scene: SharedScene,
    scheduler: Rc<dyn FrameScheduler>,
    clock: Rc<dyn Clock>,
    assets: Rc<dyn AssetLoader>,
    fetcher: Rc<dyn SceneFetcher>,
    editor: Rc<RefCell<dyn Editor>>,
    bus: Rc<EventBus<PlayerEvent>>,
    redraw: Option<RedrawHook>,
    audio_unlock: Option<Box<dyn FnMut()>>,
    input: RayInputRouter,
    config: PlayerConfig,

    state: PlaybackState,
    clock_state: ClockState,
    frame: Option<FrameHandle>,
    first_frame: bool,
    scheduled_stop: Option<StopCallback>,
    pending_loads: Vec<PendingLoad>,
    next_listener: u64,
}

impl Player {
    /// Create a stopped player driving `scene` with frames from `scheduler`.
    ///
    /// Defaults: system clock, no assets to prefetch, URLs read from the
    /// current directory, no editor, no redraw hook and a private event bus.
    pub fn new(scene: SharedScene, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let clock_state = ClockState::new(clock.now());
        Self {
            scene,
            scheduler,
            clock,
            assets: Rc::new(NoAssets),
            fetcher: Rc::new(FileFetcher::default()),
            editor: Rc::new(RefCell::new(NoEditor)),
            bus: Rc::new(EventBus::new()),
            redraw: None,
            audio_unlock: None,
            input: RayInputRouter::new(Rc::new(EventBus::new())),
            config: PlayerConfig::default(),
            state: PlaybackState::Stopped,
            clock_state,
            frame: None,
            first_frame: false,
            scheduled_stop: None,
            pending_loads: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock_state = ClockState::new(clock.now());
        self.clock = clock;
        self
    }

    pub fn with_asset_loader(mut self, assets: Rc<dyn AssetLoader>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Rc<dyn SceneFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_editor(mut self, editor: Rc<RefCell<dyn Editor>>) -> Self {
        self.editor = editor;
        self
    }

    /// Publish lifecycle notifications on a shared bus.
    pub fn with_bus(mut self, bus: Rc<EventBus<PlayerEvent>>) -> Self {
        self.bus = bus;
        self
    }

    /// Publish ray input on a shared runtime bus.
    pub fn with_runtime_events(mut self, bus: Rc<EventBus<RuntimeEvent>>) -> Self {
        self.input = RayInputRouter::new(bus);
        self
    }

    /// Install the host repaint hook. The flag asks for a forced repaint.
    pub fn with_redraw(mut self, hook: impl FnMut(bool) + 'static) -> Self {
        self.redraw = Some(Box::new(hook));
        self
    }

    /// Called by `load_and_play` on platforms that unlock audio on user gestures.
    pub fn with_audio_unlock(mut self, unlock: impl FnMut() + 'static) -> Self {
        self.audio_unlock = Some(Box::new(unlock));
        self
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn clock(&self) -> &ClockState {
        &self.clock_state
    }

    /// Simulated seconds since the last stop.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.clock_state.elapsed
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.clock_state.frames
    }

    #[inline]
    pub fn is_frame_scheduled(&self) -> bool {
        self.frame.is_some()
    }

    #[inline]
    pub fn has_scheduled_stop(&self) -> bool {
        self.scheduled_stop.is_some()
    }

    #[inline]
    pub fn pending_loads(&self) -> usize {
        self.pending_loads.len()
    }

    #[inline]
    pub fn bus(&self) -> &Rc<EventBus<PlayerEvent>> {
        &self.bus
    }

    #[inline]
    pub fn runtime_events(&self) -> &Rc<EventBus<RuntimeEvent>> {
        self.input.bus()
    }

    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.input.viewport()
    }

    /// Move to `new`, publish `StateChanged` and return the previous state.
    ///
    /// Transitions outside the usual table are logged but still applied.
    pub fn set_state(&mut self, new: PlaybackState) -> PlaybackState {
        let old = self.state;
        if old.can_transition_to(new) {
            debug!(from = %old, to = %new, "playback state changed");
        } else {
            warn!(from = %old, to = %new, "unexpected playback state transition");
        }
        self.state = new;
        self.bus.publish(&PlayerEvent::StateChanged { new, old });
        old
    }

    pub fn play(&mut self) {
        if self.state.is_playing() {
            return;
        }

        self.scene.borrow_mut().play();
        self.set_state(PlaybackState::Playing);
        self.clock_state.last_frame = self.clock.now();
        self.first_frame = true;

        self.bus.publish(&PlayerEvent::Playing);

        if self.frame.is_none() {
            self.request_frame();
        }
    }

    pub fn pause(&mut self) {
        self.set_state(PlaybackState::Paused);
        self.scene.borrow_mut().pause();
    }

    /// Run `callback` right after the next frame stops the player.
    ///
    /// Replaces any stop already scheduled.
    pub fn schedule_stop(&mut self, callback: impl FnOnce() + 'static) {
        self.scheduled_stop = Some(Box::new(callback));
    }

    pub fn stop(&mut self) {
        self.cancel_frame();

        self.scene.borrow_mut().stop();

        self.clock_state.reset();
        self.set_state(PlaybackState::Stopped);

        self.scene.borrow_mut().reset();

        if self.config.redraw_on_stop {
            self.request_redraw(false);
        }
    }

    /// Process one frame. Called by the host when a requested frame fires.
    pub fn on_frame(&mut self) {
        // keep the chain alive before doing any work
        self.request_frame();

        self.poll_loads();

        if let Some(callback) = self.scheduled_stop.take() {
            self.stop();
            callback();
            return;
        }

        let (time, delta) = if self.state.is_frozen() {
            (self.clock_state.last_frame, 0.0)
        } else {
            let now = self.clock.now();
            (now, self.clock_state.delta_to(now))
        };

        let changed = self
            .scene
            .borrow_mut()
            .advance(self.clock_state.elapsed, delta);
        if changed {
            self.request_redraw(false);
        }

        self.editor.borrow_mut().update();

        self.clock_state.advance(time, delta);

        if self.first_frame {
            self.first_frame = false;
            self.bus.publish(&PlayerEvent::FirstFrameRendered);
        }
    }

    /// Load a scene document. `callback` runs exactly once when the load
    /// finishes, with the error if any stage failed.
    pub fn load<F>(&mut self, source: SceneSource, callback: F)
    where
        F: FnOnce(Option<&LoadError>) + 'static,
    {
        self.start_load(source, Some(Box::new(callback)), None, false);
    }

    /// Load the scene at `url`, then move to Ready and start playing whether
    /// or not the load succeeded, unless the platform suppresses autoplay.
    pub fn load_and_play(&mut self, url: impl Into<String>) -> LoadHandle {
        if self.config.platform.needs_audio_unlock() {
            if let Some(unlock) = self.audio_unlock.as_mut() {
                unlock();
            }
        }

        let (tx, rx) = oneshot::channel();
        self.start_load(SceneSource::Url(url.into()), None, Some(tx), true);
        LoadHandle { rx: Some(rx) }
    }

    /// Drive in-flight loads as far as they can go without blocking.
    pub fn poll_loads(&mut self) {
        if self.pending_loads.is_empty() {
            return;
        }

        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut still_pending = Vec::new();
        for mut load in std::mem::take(&mut self.pending_loads) {
            match self.drive_load(&mut load.stage, &mut cx) {
                Poll::Pending => still_pending.push(load),
                Poll::Ready(result) => self.finish_load(load, result),
            }
        }
        still_pending.append(&mut self.pending_loads);
        self.pending_loads = still_pending;
    }

    pub fn variable_value(&self, id: &str) -> Option<JsonValue> {
        self.scene.borrow().variable_read(id)
    }

    pub fn set_variable_value(&mut self, id: &str, value: JsonValue) {
        self.scene.borrow_mut().variable_write(id, value);
    }

    /// Call `on_update` whenever variable `id` changes. Keep the returned
    /// handle to remove the listener later.
    pub fn add_parameter_listener(
        &mut self,
        id: &str,
        on_update: impl Fn(&JsonValue) + 'static,
    ) -> ParameterListener {
        let listener = ParameterListener::new(ListenerId(self.next_listener), on_update);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.scene
            .borrow_mut()
            .variable_lock(id, listener.clone());
        listener
    }

    pub fn remove_parameter_listener(&mut self, id: &str, listener: &ParameterListener) {
        self.scene.borrow_mut().variable_unlock(id, listener.id());
    }

    /// Route a ray hit to the runtime bus. Returns the cursor hint to apply,
    /// or None if the event was dropped.
    pub fn on_ray(&mut self, kind: RayEventKind, mesh: Option<Uuid>) -> Option<CursorHint> {
        let editor_active = self.editor.borrow().is_active();
        self.input.handle(kind, mesh, editor_active)
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        self.input.set_size(viewport);
    }

    fn request_frame(&mut self) {
        self.frame = Some(self.scheduler.request_frame());
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    fn request_redraw(&mut self, force: bool) {
        if let Some(redraw) = self.redraw.as_mut() {
            redraw(force);
        }
    }

    fn start_load(
        &mut self,
        source: SceneSource,
        callback: Option<LoadCallback>,
        completion: Option<oneshot::Sender<Result<(), LoadError>>>,
        autoplay: bool,
    ) {
        // nothing renders until play() is called again
        self.cancel_frame();

        if !self.pending_loads.is_empty() {
            warn!(
                in_flight = self.pending_loads.len(),
                "load started while another load is in flight"
            );
        }

        // leave Playing before the scene is touched, so a failed load can
        // always be followed by play()
        self.set_state(PlaybackState::Loading);

        let stage = match source {
            SceneSource::Url(url) => {
                info!(%url, "loading scene");
                let fetch = self.fetcher.fetch(&url);
                self.bus.publish(&PlayerEvent::Loading);
                LoadStage::Fetching { url, fetch }
            }
            SceneSource::Json(text) => self.begin_from_json(&text),
            SceneSource::Object(doc) => self.begin_from_object(&doc),
        };

        self.pending_loads.push(PendingLoad {
            stage,
            callback,
            completion,
            autoplay,
        });
        self.poll_loads();
    }

    fn begin_from_json(&mut self, text: &str) -> LoadStage {
        match serde_json::from_str::<JsonValue>(text) {
            Ok(doc) => self.begin_from_object(&doc),
            Err(e) => LoadStage::failed(e.into()),
        }
    }

    fn begin_from_object(&mut self, doc: &JsonValue) -> LoadStage {
        if let Err(e) = self.scene.borrow_mut().deserialize(doc) {
            return LoadStage::failed(e);
        }

        let root = doc.get("root").unwrap_or(&JsonValue::Null);
        LoadStage::Preloading(self.assets.load_assets_for(root))
    }

    fn drive_load(
        &mut self,
        stage: &mut LoadStage,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), LoadError>> {
        loop {
            let text = match stage {
                LoadStage::Preloading(preload) => return preload.poll_unpin(cx),
                LoadStage::Fetching { url, fetch } => match fetch.poll_unpin(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Ready(Ok(text)) => {
                        debug!(%url, bytes = text.len(), "scene document fetched");
                        text
                    }
                },
            };
            *stage = self.begin_from_json(&text);
        }
    }

    fn finish_load(&mut self, load: PendingLoad, result: Result<(), LoadError>) {
        let PendingLoad {
            callback,
            completion,
            autoplay,
            ..
        } = load;

        match &result {
            Ok(()) => info!("scene loaded"),
            Err(err) => error!(category = err.category(), "Player preload failed: {err}"),
        }

        if let Some(callback) = callback {
            callback(result.as_ref().err());
        }

        self.bus.publish(&PlayerEvent::AssetsLoaded);

        if autoplay {
            self.set_state(PlaybackState::Ready);
            if self.config.platform.suppresses_autoplay() {
                info!("autoplay suppressed for video on this platform");
            } else {
                self.play();
            }
        }

        if let Some(tx) = completion {
            // the caller may have dropped the handle
            let _ = tx.send(result);
        }
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .field("clock", &self.clock_state)
            .field("frame", &self.frame)
            .field("first_frame", &self.first_frame)
            .field("scheduled_stop", &self.scheduled_stop.is_some())
            .field("pending_loads", &self.pending_loads.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
