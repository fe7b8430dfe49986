//! Recording fakes for the host capabilities the controller drives.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AssetStore, AudioAttributes, AudioEngine, AudioFocusAuthority, AudioSource, FocusChange,
    FocusChangeCallback, FocusRequest, FocusRequestResult, MediaPlayer, PlayerListener,
    ScriptHost,
};
use core_playback::{AudioPlaybackController, ControllerSnapshot, ControllerState};
use core_runtime::config::{CoreConfig, PlaybackSettings};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

pub const COMPLETION_SCRIPT: &str =
    "if(window.onNativeAudioComplete) window.onNativeAudioComplete();";

const ASSET_ROOT: &str = "/bundle";

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Create,
    Source(String),
    Prepare(String),
    Start(String),
    Pause(String),
    Stop(String),
    Release(String),
}

#[derive(Default)]
struct PlayerRecord {
    asset: Option<String>,
    listener: Option<Arc<dyn PlayerListener>>,
    playing: bool,
    released: bool,
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    players: Vec<PlayerRecord>,
    live: usize,
    max_live: usize,
    gated: HashSet<String>,
    failing: HashSet<String>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<EngineState>,
    gate: Condvar,
}

/// Engine whose players record every call. Preparation of a gated asset
/// blocks until the gate is opened.
#[derive(Clone, Default)]
pub struct FakeEngine {
    shared: Arc<Shared>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn live_players(&self) -> usize {
        self.shared.state.lock().unwrap().live
    }

    /// Highest number of simultaneously live players ever observed.
    pub fn max_live_players(&self) -> usize {
        self.shared.state.lock().unwrap().max_live
    }

    pub fn is_playing(&self, asset: &str) -> bool {
        let state = self.shared.state.lock().unwrap();
        state
            .players
            .iter()
            .any(|p| p.asset.as_deref() == Some(asset) && p.playing && !p.released)
    }

    pub fn hold_prepare(&self, asset: &str) {
        self.shared
            .state
            .lock()
            .unwrap()
            .gated
            .insert(asset.to_string());
    }

    pub fn open_gate(&self, asset: &str) {
        self.shared.state.lock().unwrap().gated.remove(asset);
        self.shared.gate.notify_all();
    }

    pub fn fail_prepare(&self, asset: &str) {
        self.shared
            .state
            .lock()
            .unwrap()
            .failing
            .insert(asset.to_string());
    }

    /// Simulate the engine reaching the end of the most recent player for
    /// `asset`, even if that player was already released.
    pub fn finish(&self, asset: &str) {
        let listener = {
            let mut state = self.shared.state.lock().unwrap();
            let record = state
                .players
                .iter_mut()
                .rev()
                .find(|p| p.asset.as_deref() == Some(asset));
            record.and_then(|p| {
                p.playing = false;
                p.listener.clone()
            })
        };
        if let Some(listener) = listener {
            listener.on_completion();
        }
    }

    pub fn report_error(&self, asset: &str, what: i32, extra: i32) {
        let listener = {
            let state = self.shared.state.lock().unwrap();
            state
                .players
                .iter()
                .rev()
                .find(|p| p.asset.as_deref() == Some(asset))
                .and_then(|p| p.listener.clone())
        };
        if let Some(listener) = listener {
            listener.on_error(what, extra);
        }
    }
}

impl AudioEngine for FakeEngine {
    fn create_player(&self) -> BridgeResult<Box<dyn MediaPlayer>> {
        let mut state = self.shared.state.lock().unwrap();
        state.calls.push(EngineCall::Create);
        state.players.push(PlayerRecord::default());
        state.live += 1;
        state.max_live = state.max_live.max(state.live);
        Ok(Box::new(FakePlayer {
            index: state.players.len() - 1,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn name(&self) -> &str {
        "fake-engine"
    }
}

struct FakePlayer {
    index: usize,
    shared: Arc<Shared>,
}

impl FakePlayer {
    fn record<F>(&self, call: F)
    where
        F: FnOnce(&mut PlayerRecord) -> Option<EngineCall>,
    {
        let mut state = self.shared.state.lock().unwrap();
        if let Some(call) = call(&mut state.players[self.index]) {
            state.calls.push(call);
        }
    }

    fn asset(&self) -> String {
        self.shared.state.lock().unwrap().players[self.index]
            .asset
            .clone()
            .unwrap_or_default()
    }
}

impl MediaPlayer for FakePlayer {
    fn set_audio_attributes(&mut self, _attributes: AudioAttributes) -> BridgeResult<()> {
        Ok(())
    }

    fn set_keep_awake(&mut self, _keep_awake: bool) -> BridgeResult<()> {
        Ok(())
    }

    fn set_data_source(&mut self, source: AudioSource) -> BridgeResult<()> {
        let AudioSource::AssetFile { path, .. } = source else {
            return Err(BridgeError::OperationFailed("expected asset file".into()));
        };
        let asset = path
            .strip_prefix(ASSET_ROOT)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());
        self.record(|p| {
            p.asset = Some(asset.clone());
            Some(EngineCall::Source(asset))
        });
        Ok(())
    }

    fn set_listener(&mut self, listener: Arc<dyn PlayerListener>) {
        self.record(|p| {
            p.listener = Some(listener);
            None
        });
    }

    fn prepare(&mut self) -> BridgeResult<()> {
        let asset = self.asset();
        let mut state = self.shared.state.lock().unwrap();
        state.calls.push(EngineCall::Prepare(asset.clone()));
        while state.gated.contains(&asset) {
            state = self.shared.gate.wait(state).unwrap();
        }
        if state.failing.contains(&asset) {
            return Err(BridgeError::Engine {
                what: 1,
                extra: -1010,
            });
        }
        Ok(())
    }

    fn start(&mut self) -> BridgeResult<()> {
        let asset = self.asset();
        self.record(|p| {
            p.playing = true;
            Some(EngineCall::Start(asset))
        });
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        let asset = self.asset();
        self.record(|p| {
            p.playing = false;
            Some(EngineCall::Pause(asset))
        });
        Ok(())
    }

    fn stop(&mut self) -> BridgeResult<()> {
        let asset = self.asset();
        self.record(|p| {
            p.playing = false;
            Some(EngineCall::Stop(asset))
        });
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let state = self.shared.state.lock().unwrap();
        let record = &state.players[self.index];
        record.playing && !record.released
    }

    fn release(&mut self) {
        let asset = self.asset();
        let mut state = self.shared.state.lock().unwrap();
        let record = &mut state.players[self.index];
        if record.released {
            return;
        }
        record.released = true;
        record.playing = false;
        state.live -= 1;
        state.calls.push(EngineCall::Release(asset));
    }
}

// ============================================================================
// Assets, script host, focus
// ============================================================================

/// Resolves every path under a fixed root except the ones marked missing.
#[derive(Default)]
pub struct FakeAssets {
    missing: Mutex<HashSet<String>>,
}

impl FakeAssets {
    pub fn mark_missing(&self, asset: &str) {
        self.missing.lock().unwrap().insert(asset.to_string());
    }
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn open(&self, asset_path: &str) -> BridgeResult<AudioSource> {
        if self.missing.lock().unwrap().contains(asset_path) {
            return Err(BridgeError::AssetNotFound(asset_path.to_string()));
        }
        Ok(AudioSource::file(
            PathBuf::from(ASSET_ROOT).join(asset_path),
            4096,
        ))
    }
}

pub struct RecordingScriptHost {
    ready: AtomicBool,
    scripts: Mutex<Vec<String>>,
}

impl Default for RecordingScriptHost {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(true),
            scripts: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingScriptHost {
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn completions(&self) -> usize {
        self.scripts()
            .iter()
            .filter(|s| s.as_str() == COMPLETION_SCRIPT)
            .count()
    }
}

impl ScriptHost for RecordingScriptHost {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn evaluate(&self, script: &str) -> BridgeResult<()> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusCall {
    Request,
    Abandon,
}

/// Focus authority that grants by default and lets tests revoke focus.
pub struct FakeFocus {
    result: Mutex<FocusRequestResult>,
    calls: Mutex<Vec<FocusCall>>,
    callback: Mutex<Option<FocusChangeCallback>>,
}

impl Default for FakeFocus {
    fn default() -> Self {
        Self {
            result: Mutex::new(FocusRequestResult::Granted),
            calls: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
        }
    }
}

impl FakeFocus {
    pub fn answer(&self, result: FocusRequestResult) {
        *self.result.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<FocusCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Deliver a focus change to the registered holder, if any.
    pub fn change(&self, change: FocusChange) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(change);
        }
    }
}

impl AudioFocusAuthority for FakeFocus {
    fn request(&self, request: &FocusRequest) -> BridgeResult<FocusRequestResult> {
        self.calls.lock().unwrap().push(FocusCall::Request);
        *self.callback.lock().unwrap() = Some(Arc::clone(&request.on_change));
        Ok(*self.result.lock().unwrap())
    }

    fn abandon(&self, _request: &FocusRequest) -> BridgeResult<()> {
        self.calls.lock().unwrap().push(FocusCall::Abandon);
        *self.callback.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub controller: AudioPlaybackController,
    pub engine: FakeEngine,
    pub assets: Arc<FakeAssets>,
    pub script: Arc<RecordingScriptHost>,
    pub focus: Arc<FakeFocus>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(PlaybackSettings::default())
    }

    pub fn with_settings(settings: PlaybackSettings) -> Self {
        let engine = FakeEngine::new();
        let assets = Arc::new(FakeAssets::default());
        let script = Arc::new(RecordingScriptHost::default());
        let focus = Arc::new(FakeFocus::default());

        let config = CoreConfig::builder()
            .audio_engine(Arc::new(engine.clone()))
            .asset_store(assets.clone())
            .script_host(script.clone())
            .focus_authority(focus.clone())
            .playback_settings(settings)
            .build()
            .expect("config");
        let controller = AudioPlaybackController::new(&config).expect("controller");

        Self {
            controller,
            engine,
            assets,
            script,
            focus,
        }
    }

    /// Wait (bounded) for a snapshot matching `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> ControllerSnapshot
    where
        F: FnMut(&ControllerSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), self.controller.wait_for(predicate))
            .await
            .expect("timed out waiting for controller")
            .expect("controller shut down")
    }

    pub async fn wait_playing(&self, asset: &str) -> ControllerSnapshot {
        self.wait_for(|s| {
            s.state == ControllerState::Playing && !s.loading && s.asset_path.as_deref() == Some(asset)
        })
        .await
    }

    /// Wait (bounded) until the engine has recorded `call`.
    pub async fn wait_engine_call(&self, call: &EngineCall) {
        let engine = self.engine.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while engine.count(call) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for engine call");
    }

    /// Wait until no setup is in flight.
    pub async fn wait_idle(&self) -> ControllerSnapshot {
        self.controller.flush().await;
        self.wait_for(|s| !s.loading).await
    }
}
