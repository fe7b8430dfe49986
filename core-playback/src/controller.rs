//! # Audio Playback Controller
//!
//! The single entry point hosts use to play bundled audio assets.
//!
//! ## Execution model
//!
//! [`AudioPlaybackController`] is a cheap, cloneable handle. Every operation
//! is posted as a command to one actor task that owns all controller state,
//! so operations from any thread are applied one at a time in the order they
//! were issued. Engine callbacks and focus changes are posted to the same
//! queue and carry the [`SessionId`] they belong to.
//!
//! Asset resolution and engine preparation run off the actor (the latter on
//! tokio's blocking pool) and report back with a `SetupFinished` command. A
//! `play` that arrives while a setup is in flight is queued; only the latest
//! queued play survives, and it starts once the in-flight session has been
//! released. Two engine sessions never coexist.
//!
//! ## Error policy
//!
//! No operation returns a playback failure to the caller. Failures are
//! logged, published on the [`EventBus`] and, depending on the configured
//! [`ErrorPolicy`], passed to the script error callback.

use bridge_traits::{AssetStore, Clock, FocusChange, FocusChangeCallback, PlayerListener};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, FocusEvent, PauseReason, PlaybackEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn, Instrument};

use crate::engine::{EngineOpener, EngineOptions, EngineSession, PlaybackEngineAdapter};
use crate::error::{PlaybackError, Result};
use crate::focus::{AudioFocusArbiter, FocusSignal};
use crate::notifier::CompletionNotifier;
use crate::policy::{policy_for, ErrorDisposition, ErrorPolicy};
use crate::session::{PlaybackSession, SessionId, SessionIdGenerator};
use crate::state::{ControllerSnapshot, ControllerState};

enum Command {
    Play { asset_path: String },
    Pause,
    Resume,
    Stop,
    Release,
    Flush(oneshot::Sender<()>),
    SetupFinished {
        session: SessionId,
        asset_path: String,
        outcome: Result<EngineSession>,
    },
    EngineCompleted(SessionId),
    EngineFailed {
        session: SessionId,
        what: i32,
        extra: i32,
    },
    FocusChanged(FocusChange),
}

/// Handle to a playback controller.
///
/// Clones share the same controller. Dropping every handle releases it.
#[derive(Clone)]
pub struct AudioPlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    ready: Arc<AtomicBool>,
    snapshot: watch::Receiver<ControllerSnapshot>,
    events: EventBus,
}

impl AudioPlaybackController {
    /// Construct a controller from `config`, using a fresh event bus and the
    /// error policy selected by the playback settings.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(config: &CoreConfig) -> Result<Self> {
        let events = EventBus::new(config.playback.event_buffer_size);
        let policy = policy_for(&config.playback);
        Self::with_parts(config, events, policy)
    }

    pub fn with_parts(
        config: &CoreConfig,
        events: EventBus,
        policy: Arc<dyn ErrorPolicy>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            PlaybackError::Internal(format!("controller requires a tokio runtime: {}", e))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();
        let focus_callback: FocusChangeCallback = Arc::new(move |change| {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Command::FocusChanged(change));
            }
        });

        let options = EngineOptions {
            keep_awake: config.playback.keep_awake,
            ..EngineOptions::default()
        };
        let ready = Arc::new(AtomicBool::new(false));
        let (snapshot_tx, snapshot_rx) = watch::channel(ControllerSnapshot::initial());

        let mut actor = ControllerActor {
            commands: rx,
            self_tx: tx.downgrade(),
            state: ControllerState::Uninitialized,
            session: None,
            pending: None,
            queued: None,
            deferred: None,
            ids: SessionIdGenerator::default(),
            adapter: PlaybackEngineAdapter::new(Arc::clone(&config.audio_engine), options),
            arbiter: AudioFocusArbiter::new(
                config.focus_authority.clone(),
                options.attributes,
                focus_callback,
            ),
            notifier: CompletionNotifier::new(Arc::clone(&config.script_host), &config.playback),
            assets: Arc::clone(&config.asset_store),
            clock: Arc::clone(&config.clock),
            policy,
            events: events.clone(),
            ready: Arc::clone(&ready),
            snapshot: snapshot_tx,
        };
        actor.initialize();
        runtime.spawn(actor.run().instrument(tracing::debug_span!("playback_controller")));

        Ok(Self {
            commands: tx,
            ready,
            snapshot: snapshot_rx,
            events,
        })
    }

    /// Whether the controller still accepts `play`. Becomes `false` as soon
    /// as `release` is called.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Start playing `asset_path`, replacing whatever is playing.
    /// Failures are logged and never returned.
    pub fn play(&self, asset_path: impl Into<String>) {
        let asset_path = asset_path.into();
        if let Err(e) = self.try_play(asset_path.clone()) {
            warn!(asset = %asset_path, error = %e, "Play rejected");
        }
    }

    /// Like [`play`](Self::play), but reports a released controller to the
    /// caller. Failures during setup are still absorbed.
    pub fn try_play(&self, asset_path: impl Into<String>) -> Result<()> {
        if !self.is_ready() {
            return Err(PlaybackError::ControllerReleased);
        }
        self.commands
            .send(Command::Play {
                asset_path: asset_path.into(),
            })
            .map_err(|_| PlaybackError::ControllerReleased)
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Tear down the engine session and abandon focus. Idempotent; the
    /// controller cannot be reused afterwards.
    pub fn release(&self) {
        self.ready.store(false, Ordering::Release);
        self.send(Command::Release);
    }

    /// Wait until every command issued before this call has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> ControllerState {
        self.snapshot.borrow().state
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot.clone()
    }

    /// Wait for a snapshot matching `predicate`. Returns `None` if the
    /// controller shut down first.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<ControllerSnapshot>
    where
        F: FnMut(&ControllerSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        rx.wait_for(predicate).await.ok().map(|snapshot| snapshot.clone())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            trace!("Controller already shut down, ignoring command");
        }
    }
}

/// Forwards engine callbacks for one session to the actor.
struct SessionListener {
    session: SessionId,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl SessionListener {
    fn forward(&self, command: Command) {
        match self.commands.upgrade() {
            Some(tx) => {
                let _ = tx.send(command);
            }
            None => trace!(session = %self.session, "Controller gone, dropping engine callback"),
        }
    }
}

impl PlayerListener for SessionListener {
    fn on_completion(&self) {
        self.forward(Command::EngineCompleted(self.session));
    }

    fn on_error(&self, what: i32, extra: i32) {
        self.forward(Command::EngineFailed {
            session: self.session,
            what,
            extra,
        });
    }
}

struct PendingSetup {
    session: SessionId,
    asset_path: String,
    /// The engine reported completion before the setup result arrived.
    completed_early: bool,
}

/// Control issued while a setup was in flight, applied once it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Pause,
    Stop,
}

struct ControllerActor {
    commands: mpsc::UnboundedReceiver<Command>,
    self_tx: mpsc::WeakUnboundedSender<Command>,
    state: ControllerState,
    session: Option<PlaybackSession>,
    pending: Option<PendingSetup>,
    queued: Option<String>,
    deferred: Option<Deferred>,
    ids: SessionIdGenerator,
    adapter: PlaybackEngineAdapter,
    arbiter: AudioFocusArbiter,
    notifier: CompletionNotifier,
    assets: Arc<dyn AssetStore>,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn ErrorPolicy>,
    events: EventBus,
    ready: Arc<AtomicBool>,
    snapshot: watch::Sender<ControllerSnapshot>,
}

impl ControllerActor {
    fn initialize(&mut self) {
        self.state = ControllerState::Ready;
        self.ready.store(true, Ordering::Release);
        self.publish();
        info!(focus_authority = self.arbiter.has_authority(), "Playback controller ready");
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
            self.publish();
            if self.state == ControllerState::Released && self.pending.is_none() {
                break;
            }
        }

        if self.state != ControllerState::Released {
            debug!("All controller handles dropped");
            self.release();
            self.publish();
        }
        debug!("Playback controller stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Play { asset_path } => self.play(asset_path),
            Command::Pause => self.pause(PauseReason::Requested),
            Command::Resume => self.resume(),
            Command::Stop => self.stop(),
            Command::Release => self.release(),
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::SetupFinished {
                session,
                asset_path,
                outcome,
            } => self.setup_finished(session, asset_path, outcome),
            Command::EngineCompleted(session) => self.completed(session),
            Command::EngineFailed {
                session,
                what,
                extra,
            } => self.engine_failed(session, what, extra),
            Command::FocusChanged(change) => self.focus_changed(change),
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    fn play(&mut self, asset_path: String) {
        if self.state == ControllerState::Released {
            self.absorb(PlaybackError::ControllerReleased, None, Some(asset_path));
            return;
        }

        if let Some(pending) = &self.pending {
            debug!(
                in_flight = %pending.session,
                in_flight_asset = %pending.asset_path,
                asset = %asset_path,
                "Setup in flight, queueing play"
            );
            if let Some(superseded) = self.queued.replace(asset_path) {
                debug!(asset = %superseded, "Dropping superseded queued play");
            }
            self.deferred = None;
            return;
        }

        self.begin(asset_path);
    }

    fn begin(&mut self, asset_path: String) {
        self.teardown_session();
        self.request_focus();

        let session = self.ids.next();
        info!(session = %session, asset = %asset_path, "Starting playback");
        self.pending = Some(PendingSetup {
            session,
            asset_path: asset_path.clone(),
            completed_early: false,
        });
        self.spawn_setup(session, asset_path);
    }

    fn spawn_setup(&self, session: SessionId, asset_path: String) {
        let assets = Arc::clone(&self.assets);
        let opener = self.adapter.opener();
        let reply = self.self_tx.clone();
        let listener: Arc<dyn PlayerListener> = Arc::new(SessionListener {
            session,
            commands: reply.clone(),
        });
        let span = tracing::debug_span!("setup", session = %session);

        tokio::spawn(
            async move {
                let outcome = setup(assets, opener, session, asset_path.clone(), listener).await;
                let command = Command::SetupFinished {
                    session,
                    asset_path,
                    outcome,
                };
                // On failure the command is dropped here, which releases any
                // engine session it carries.
                match reply.upgrade() {
                    Some(tx) => {
                        if tx.send(command).is_err() {
                            debug!("Controller gone, discarding setup result");
                        }
                    }
                    None => debug!("Controller gone, discarding setup result"),
                }
            }
            .instrument(span),
        );
    }

    fn setup_finished(
        &mut self,
        session: SessionId,
        asset_path: String,
        outcome: Result<EngineSession>,
    ) {
        let pending = match self.pending.take() {
            Some(pending) if pending.session == session => pending,
            other => {
                warn!(session = %session, "Unexpected setup result, discarding");
                self.pending = other;
                return;
            }
        };

        let superseded = self.state == ControllerState::Released || self.queued.is_some();
        match outcome {
            Ok(mut engine_session) if superseded => {
                debug!(session = %session, "Session superseded before it started");
                engine_session.release();
            }
            Ok(engine_session) => {
                self.adapter.attach(engine_session);
                self.session = Some(PlaybackSession::started(
                    session,
                    asset_path.clone(),
                    self.clock.now(),
                ));
                self.state = ControllerState::Playing;
                info!(session = %session, asset = %asset_path, "Playback started");
                self.emit(PlaybackEvent::Started {
                    session_id: session.get(),
                    asset_path,
                });

                if pending.completed_early {
                    self.completed(session);
                } else {
                    match self.deferred.take() {
                        Some(Deferred::Pause) => self.pause(PauseReason::Requested),
                        Some(Deferred::Stop) => self.stop(),
                        None => {}
                    }
                }
            }
            Err(e) => self.absorb(e, Some(session), Some(asset_path)),
        }
        self.deferred = None;

        if let Some(next) = self.queued.take() {
            if self.state == ControllerState::Released {
                debug!(asset = %next, "Dropping queued play after release");
            } else {
                self.begin(next);
            }
        }
    }

    fn pause(&mut self, reason: PauseReason) {
        if self.pending.is_some() {
            self.deferred = Some(Deferred::Pause);
            return;
        }
        if self.state != ControllerState::Playing || !self.adapter.is_playing() {
            trace!(state = ?self.state, "Nothing playing, pause ignored");
            return;
        }

        match self.adapter.pause() {
            Ok(_) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.is_playing = false;
                session.is_paused = true;
                let id = session.id;
                self.state = ControllerState::Paused;
                info!(session = %id, reason = ?reason, "Playback paused");
                self.emit(PlaybackEvent::Paused {
                    session_id: id.get(),
                    reason,
                });
            }
            Err(e) => {
                let id = self.session.as_ref().map(|s| s.id);
                self.absorb(e, id, None);
            }
        }
    }

    fn resume(&mut self) {
        if self.pending.is_some() {
            if self.deferred == Some(Deferred::Pause) {
                self.deferred = None;
            }
            return;
        }
        let Some(id) = self
            .session
            .as_ref()
            .filter(|session| session.is_paused)
            .map(|session| session.id)
        else {
            trace!(state = ?self.state, "Not paused, resume ignored");
            return;
        };

        match self.adapter.resume() {
            Ok(_) => {
                if let Some(session) = self.session.as_mut() {
                    session.is_paused = false;
                    session.is_playing = true;
                }
                self.state = ControllerState::Playing;
                info!(session = %id, "Playback resumed");
                self.emit(PlaybackEvent::Resumed {
                    session_id: id.get(),
                });
            }
            Err(e) => self.absorb(e, Some(id), None),
        }
    }

    fn stop(&mut self) {
        if self.pending.is_some() {
            self.deferred = Some(Deferred::Stop);
            return;
        }
        let Some(id) = self.session.as_ref().map(|session| session.id) else {
            trace!("No session, stop ignored");
            return;
        };

        if self.adapter.is_playing() {
            if let Err(e) = self.adapter.stop() {
                self.absorb(e, Some(id), None);
            }
        }
        if let Some(session) = self.session.as_mut() {
            session.is_playing = false;
            session.is_paused = false;
        }
        if self.state.has_active_session() {
            self.state = ControllerState::Stopped;
            info!(session = %id, "Playback stopped");
            self.emit(PlaybackEvent::Stopped {
                session_id: id.get(),
            });
        }
    }

    fn release(&mut self) {
        if self.state == ControllerState::Released {
            return;
        }

        self.adapter.release();
        self.session = None;
        self.queued = None;
        self.deferred = None;

        let had_focus = self.arbiter.has_authority() && self.arbiter.grant().held;
        self.arbiter.release_focus();
        if had_focus {
            self.emit_focus(FocusEvent::Abandoned);
        }

        self.notifier.disable();
        self.ready.store(false, Ordering::Release);
        self.state = ControllerState::Released;
        info!("Playback controller released");
        self.emit(PlaybackEvent::Released);
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    fn completed(&mut self, session: SessionId) {
        if let Some(pending) = self.pending.as_mut().filter(|p| p.session == session) {
            // Controls queued before the completion take precedence.
            if let Some(control) = self.deferred {
                debug!(session = %session, deferred = ?control, "Ignoring completion behind queued control");
            } else {
                pending.completed_early = true;
            }
            return;
        }
        if self.current_id() != Some(session) {
            debug!(session = %session, "Ignoring completion from stale session");
            return;
        }
        if self.state != ControllerState::Playing {
            debug!(session = %session, state = ?self.state, "Ignoring completion while not playing");
            return;
        }

        let asset_path = match self.session.as_mut() {
            Some(current) => {
                current.is_playing = false;
                current.is_paused = false;
                current.asset_path.clone()
            }
            None => return,
        };
        self.state = ControllerState::Stopped;
        info!(session = %session, asset = %asset_path, "Playback completed");
        self.notifier.notify_completion(session);
        self.emit(PlaybackEvent::Completed {
            session_id: session.get(),
            asset_path,
        });
    }

    fn engine_failed(&mut self, session: SessionId, what: i32, extra: i32) {
        let pending = self.pending.as_ref().map(|p| p.session);
        if self.current_id() != Some(session) && pending != Some(session) {
            debug!(session = %session, what, extra, "Ignoring error from stale session");
            return;
        }
        let asset_path = self.session.as_ref().map(|s| s.asset_path.clone());
        self.absorb(PlaybackError::engine(what, extra), Some(session), asset_path);
    }

    fn focus_changed(&mut self, change: FocusChange) {
        if self.state == ControllerState::Released {
            return;
        }
        match self.arbiter.observe(change) {
            FocusSignal::Pause => {
                info!(change = ?change, "Audio focus lost");
                self.emit_focus(FocusEvent::Lost { change });
                self.pause(PauseReason::FocusLost);
            }
            FocusSignal::Regained => {
                debug!("Audio focus regained");
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn current_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Stop and release the attached session before a new one starts.
    fn teardown_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.adapter.release();
        if self.state.has_active_session() {
            self.state = ControllerState::Stopped;
            self.emit(PlaybackEvent::Stopped {
                session_id: session.id.get(),
            });
        }
        debug!(session = %session.id, "Previous session torn down");
    }

    fn request_focus(&mut self) {
        let granted = self.arbiter.request_focus();
        if self.arbiter.has_authority() {
            self.emit_focus(if granted {
                FocusEvent::Granted
            } else {
                FocusEvent::Denied
            });
        }
    }

    fn absorb(
        &mut self,
        error: PlaybackError,
        session: Option<SessionId>,
        asset_path: Option<String>,
    ) {
        let disposition = self.policy.classify(&error);
        match &error {
            PlaybackError::ControllerReleased => {
                warn!(asset = ?asset_path, "Controller released, play ignored")
            }
            PlaybackError::EngineError { what, extra, .. } => error!(
                session = ?session.map(|s| s.get()),
                what = *what,
                extra = *extra,
                error = %error,
                "Engine error"
            ),
            _ => error!(
                session = ?session.map(|s| s.get()),
                asset = ?asset_path,
                error = %error,
                "Failed to play audio"
            ),
        }

        if disposition == ErrorDisposition::Surface {
            self.notifier.notify_error(session, &error);
        }
        self.emit(PlaybackEvent::Error {
            session_id: session.map(|s| s.get()),
            asset_path,
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events.emit(CoreEvent::Playback(event));
    }

    fn emit_focus(&self, event: FocusEvent) {
        let _ = self.events.emit(CoreEvent::Focus(event));
    }

    fn publish(&self) {
        let (session_id, asset_path, paused) = match &self.session {
            Some(session) => (
                Some(session.id),
                Some(session.asset_path.clone()),
                session.is_paused,
            ),
            None => (None, None, false),
        };
        self.snapshot.send_if_modified(|current| {
            let next = ControllerSnapshot {
                state: self.state,
                session_id,
                asset_path,
                loading: self.pending.is_some(),
                paused,
                focus_held: self.arbiter.grant().held,
            };
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn setup(
    assets: Arc<dyn AssetStore>,
    opener: EngineOpener,
    session: SessionId,
    asset_path: String,
    listener: Arc<dyn PlayerListener>,
) -> Result<EngineSession> {
    let source = assets
        .open(&asset_path)
        .await
        .map_err(|e| PlaybackError::source_unavailable(&asset_path, e))?;
    debug!(asset = %asset_path, bytes = source.len(), "Asset resolved");

    tokio::task::spawn_blocking(move || -> Result<EngineSession> {
        let mut engine_session = opener.open(session, &asset_path, source, listener)?;
        engine_session.prepare_and_start()?;
        Ok(engine_session)
    })
    .await
    .map_err(|e| PlaybackError::Internal(format!("engine setup task failed: {}", e)))?
}
