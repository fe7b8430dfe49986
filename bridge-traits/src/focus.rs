//! Audio Focus Abstractions
//!
//! Platforms arbitrate which application may render audio at a given time:
//! - **Android**: `AudioManager.requestAudioFocus` with an `AudioFocusRequest`
//! - **iOS**: `AVAudioSession` activation and interruption notifications
//! - **Desktop**: usually nothing; see `bridge-desktop` for an in-process arbiter
//!
//! A host that has no focus authority simply does not provide one; the core
//! then behaves as if every request were granted.

use crate::error::Result;
use crate::playback::AudioAttributes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// How long the requester expects to keep focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusGain {
    /// Indefinite exclusive playback.
    Gain,
    /// Short playback; others should pause.
    GainTransient,
    /// Short playback; others may keep playing at lower volume.
    GainTransientMayDuck,
}

/// A change in focus ownership reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    Gain,
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

impl FocusChange {
    /// Every variant other than [`FocusChange::Gain`] takes focus away.
    pub fn is_loss(&self) -> bool {
        !matches!(self, FocusChange::Gain)
    }
}

/// Outcome of a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusRequestResult {
    Granted,
    Failed,
    /// The authority will grant focus later through the change callback.
    Delayed,
}

/// Callback invoked by the authority whenever focus changes.
pub type FocusChangeCallback = Arc<dyn Fn(FocusChange) + Send + Sync>;

/// Identifier shared by a request and its matching abandon call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusRequestId(Uuid);

impl FocusRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FocusRequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// A reusable focus request, built once and submitted on every play.
#[derive(Clone)]
pub struct FocusRequest {
    pub id: FocusRequestId,
    pub gain: FocusGain,
    pub attributes: AudioAttributes,
    pub on_change: FocusChangeCallback,
}

impl FocusRequest {
    pub fn new(gain: FocusGain, attributes: AudioAttributes, on_change: FocusChangeCallback) -> Self {
        Self {
            id: FocusRequestId::new(),
            gain,
            attributes,
            on_change,
        }
    }
}

impl fmt::Debug for FocusRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRequest")
            .field("id", &self.id)
            .field("gain", &self.gain)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// The platform service that arbitrates audio focus.
///
/// Both methods must return without blocking on user interaction.
pub trait AudioFocusAuthority: Send + Sync {
    /// Ask for focus. The request's callback stays registered until it is abandoned.
    fn request(&self, request: &FocusRequest) -> Result<FocusRequestResult>;

    /// Give focus back and unregister the request's callback.
    fn abandon(&self, request: &FocusRequest) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gain_is_not_a_loss() {
        assert!(!FocusChange::Gain.is_loss());
        assert!(FocusChange::Loss.is_loss());
        assert!(FocusChange::LossTransient.is_loss());
        assert!(FocusChange::LossTransientCanDuck.is_loss());
    }

    #[test]
    fn requests_get_distinct_ids() {
        let callback: FocusChangeCallback = Arc::new(|_| {});
        let a = FocusRequest::new(FocusGain::Gain, AudioAttributes::default(), callback.clone());
        let b = FocusRequest::new(FocusGain::Gain, AudioAttributes::default(), callback);
        assert_ne!(a.id, b.id);
        assert!(format!("{:?}", a).contains("FocusRequest"));
    }
}
