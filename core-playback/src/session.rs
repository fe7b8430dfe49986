//! Session identity.
//!
//! Every `play` allocates a fresh [`SessionId`]. Engine callbacks carry the id
//! of the session that registered them, and the controller drops any callback
//! whose id is no longer current.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identifier of one play cycle. Ids increase monotonically per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SessionIdGenerator {
    last: u64,
}

impl SessionIdGenerator {
    pub(crate) fn next(&mut self) -> SessionId {
        self.last += 1;
        SessionId(self.last)
    }
}

/// The active play cycle as tracked by the controller.
///
/// The engine handle itself is owned by the
/// [`PlaybackEngineAdapter`](crate::engine::PlaybackEngineAdapter).
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub asset_path: String,
    pub started_at: DateTime<Utc>,
    pub is_playing: bool,
    pub is_paused: bool,
}

impl PlaybackSession {
    pub(crate) fn started(id: SessionId, asset_path: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            asset_path,
            started_at,
            is_playing: true,
            is_paused: false,
        }
    }
}
