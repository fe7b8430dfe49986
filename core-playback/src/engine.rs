//! # Engine Adapter
//!
//! Owns at most one live engine session and exposes uniform operations over
//! it. Session setup ([`EngineOpener`], [`EngineSession::prepare_and_start`])
//! blocks on decoding and runs off the controller's execution context; the
//! finished session is handed back and attached with
//! [`PlaybackEngineAdapter::attach`].

use bridge_traits::{AudioAttributes, AudioEngine, AudioSource, MediaPlayer, PlayerListener};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::session::SessionId;

/// Options applied to every new engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub attributes: AudioAttributes,
    pub keep_awake: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            attributes: AudioAttributes::media_speech(),
            keep_awake: true,
        }
    }
}

/// Creates configured engine sessions. Cheap to clone and `Send`, so it can
/// move into a blocking task.
#[derive(Clone)]
pub struct EngineOpener {
    engine: Arc<dyn AudioEngine>,
    options: EngineOptions,
}

impl EngineOpener {
    /// Create a player, apply attributes and keep-awake, bind the source and
    /// register the listener. Blocking.
    pub fn open(
        &self,
        session: SessionId,
        asset_path: &str,
        source: AudioSource,
        listener: Arc<dyn PlayerListener>,
    ) -> Result<EngineSession> {
        let player = self
            .engine
            .create_player()
            .map_err(PlaybackError::from_engine_failure)?;
        let mut session = EngineSession::new(session, player);

        session
            .player
            .set_audio_attributes(self.options.attributes)
            .map_err(PlaybackError::from_engine_failure)?;
        if let Err(e) = session.player.set_keep_awake(self.options.keep_awake) {
            // Playback works without the wake lock; it may just cut out when idle.
            warn!(session = %session.id, error = %e, "Failed to set keep-awake");
        }
        session
            .player
            .set_data_source(source)
            .map_err(|e| PlaybackError::source_unavailable(asset_path, e))?;
        session.player.set_listener(listener);

        Ok(session)
    }
}

/// One engine session. Released on drop if nobody released it explicitly, so
/// a session abandoned on an error path cannot leak.
pub struct EngineSession {
    id: SessionId,
    player: Box<dyn MediaPlayer>,
    started: bool,
    released: bool,
}

impl EngineSession {
    fn new(id: SessionId, player: Box<dyn MediaPlayer>) -> Self {
        Self {
            id,
            player,
            started: false,
            released: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Prepare synchronously and begin output. Blocking.
    pub fn prepare_and_start(&mut self) -> Result<()> {
        self.player
            .prepare()
            .map_err(PlaybackError::from_engine_failure)?;
        self.player
            .start()
            .map_err(PlaybackError::from_engine_failure)?;
        self.started = true;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        !self.released && self.player.is_playing()
    }

    /// Stop output and free the engine session. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if self.started {
            if let Err(e) = self.player.stop() {
                debug!(session = %self.id, error = %e, "Stop before release failed");
            }
        }
        self.player.release();
        self.released = true;
        debug!(session = %self.id, "Engine session released");
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

pub struct PlaybackEngineAdapter {
    opener: EngineOpener,
    current: Option<EngineSession>,
}

impl PlaybackEngineAdapter {
    pub fn new(engine: Arc<dyn AudioEngine>, options: EngineOptions) -> Self {
        Self {
            opener: EngineOpener { engine, options },
            current: None,
        }
    }

    pub fn opener(&self) -> EngineOpener {
        self.opener.clone()
    }

    /// Make `session` the live session, releasing any previous one first.
    pub fn attach(&mut self, session: EngineSession) {
        if let Some(mut previous) = self.current.take() {
            warn!(
                previous = %previous.id,
                next = %session.id,
                "Attaching over a live session"
            );
            previous.release();
        }
        self.current = Some(session);
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current.as_ref().map(EngineSession::id)
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(EngineSession::is_playing)
    }

    /// Returns `Ok(false)` when there is no session.
    pub fn pause(&mut self) -> Result<bool> {
        self.with_player(|player| player.pause())
    }

    pub fn resume(&mut self) -> Result<bool> {
        self.with_player(|player| player.start())
    }

    pub fn stop(&mut self) -> Result<bool> {
        self.with_player(|player| player.stop())
    }

    /// Stop and free the live session, if any. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut session) = self.current.take() {
            session.release();
        }
    }

    fn with_player<F>(&mut self, op: F) -> Result<bool>
    where
        F: FnOnce(&mut dyn MediaPlayer) -> bridge_traits::error::Result<()>,
    {
        match self.current.as_mut() {
            Some(session) => {
                op(session.player.as_mut()).map_err(PlaybackError::from_engine_failure)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
