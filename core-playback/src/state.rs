//! Controller lifecycle states.

use serde::Serialize;

use crate::session::SessionId;

/// Lifecycle state of an [`AudioPlaybackController`](crate::AudioPlaybackController).
///
/// ```text
/// Uninitialized ─construct─▶ Ready ─play─▶ Playing ◀─resume── Paused
///                                            │  └──pause/focus loss──▶┘
///                                 stop/completion
///                                            ▼
///                                         Stopped ─play─▶ Playing
///
/// any state ─release─▶ Released (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Playing,
    Paused,
    Stopped,
    Released,
}

impl ControllerState {
    /// Whether the controller accepts `play`.
    pub fn is_ready(&self) -> bool {
        !matches!(self, ControllerState::Uninitialized | ControllerState::Released)
    }

    /// Whether an engine session is attached and not stopped.
    pub fn has_active_session(&self) -> bool {
        matches!(self, ControllerState::Playing | ControllerState::Paused)
    }
}

/// Point-in-time view of the controller, published after every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    /// Id of the attached session, if any.
    pub session_id: Option<SessionId>,
    pub asset_path: Option<String>,
    /// A play is resolving its asset or preparing the engine.
    pub loading: bool,
    pub paused: bool,
    pub focus_held: bool,
}

impl ControllerSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            state: ControllerState::Uninitialized,
            session_id: None,
            asset_path: None,
            loading: false,
            paused: false,
            focus_held: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness() {
        assert!(!ControllerState::Uninitialized.is_ready());
        assert!(ControllerState::Ready.is_ready());
        assert!(ControllerState::Stopped.is_ready());
        assert!(!ControllerState::Released.is_ready());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = ControllerSnapshot::initial();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "uninitialized");
        assert_eq!(json["focusHeld"], false);
        assert!(json["sessionId"].is_null());
    }
}
