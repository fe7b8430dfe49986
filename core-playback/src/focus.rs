//! Audio focus arbitration.
//!
//! Wraps the platform [`AudioFocusAuthority`]. Focus is advisory here:
//! playback proceeds whether or not a grant was obtained, and every kind of
//! involuntary loss maps to the same pause path.

use bridge_traits::{
    AudioAttributes, AudioFocusAuthority, FocusChange, FocusChangeCallback, FocusGain,
    FocusRequest, FocusRequestResult,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Current focus standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusGrant {
    pub held: bool,
    /// Whether the system can take the grant away. `false` when no authority
    /// exists and focus is implicit.
    pub revocable_by_system: bool,
}

/// What the controller should do about a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusSignal {
    /// Focus was lost (permanently, transiently or with ducking allowed).
    Pause,
    /// Focus came back. Playback is not resumed automatically.
    Regained,
}

pub struct AudioFocusArbiter {
    authority: Option<Arc<dyn AudioFocusAuthority>>,
    request: FocusRequest,
    grant: FocusGrant,
    registered: bool,
}

impl AudioFocusArbiter {
    /// `on_change` is registered with the authority and invoked, possibly on
    /// a platform thread, whenever focus changes hands.
    pub fn new(
        authority: Option<Arc<dyn AudioFocusAuthority>>,
        attributes: AudioAttributes,
        on_change: FocusChangeCallback,
    ) -> Self {
        Self {
            authority,
            request: FocusRequest::new(FocusGain::Gain, attributes, on_change),
            grant: FocusGrant::default(),
            registered: false,
        }
    }

    pub fn has_authority(&self) -> bool {
        self.authority.is_some()
    }

    pub fn grant(&self) -> FocusGrant {
        self.grant
    }

    /// Ask for exclusive focus. Returns whether it was granted; callers
    /// continue either way.
    pub fn request_focus(&mut self) -> bool {
        let Some(authority) = &self.authority else {
            self.grant = FocusGrant {
                held: true,
                revocable_by_system: false,
            };
            return true;
        };

        let result = authority.request(&self.request);
        self.registered = true;
        let held = match result {
            Ok(FocusRequestResult::Granted) => true,
            Ok(FocusRequestResult::Delayed) => {
                debug!("Audio focus request delayed");
                false
            }
            Ok(FocusRequestResult::Failed) => {
                debug!("Audio focus request denied");
                false
            }
            Err(e) => {
                warn!(error = %e, "Audio focus request failed");
                false
            }
        };
        self.grant = FocusGrant {
            held,
            revocable_by_system: true,
        };
        held
    }

    /// Relinquish any grant and unregister the callback. Idempotent.
    pub fn release_focus(&mut self) {
        if let Some(authority) = &self.authority {
            if self.registered {
                if let Err(e) = authority.abandon(&self.request) {
                    warn!(error = %e, "Failed to abandon audio focus");
                }
            }
        }
        self.registered = false;
        self.grant.held = false;
    }

    /// Record a change delivered through the callback.
    pub fn observe(&mut self, change: FocusChange) -> FocusSignal {
        if change.is_loss() {
            self.grant.held = false;
            FocusSignal::Pause
        } else {
            self.grant.held = true;
            FocusSignal::Regained
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use mockall::mock;

    mock! {
        Authority {}
        impl AudioFocusAuthority for Authority {
            fn request(&self, request: &FocusRequest) -> BridgeResult<FocusRequestResult>;
            fn abandon(&self, request: &FocusRequest) -> BridgeResult<()>;
        }
    }

    fn noop() -> FocusChangeCallback {
        Arc::new(|_| {})
    }

    fn arbiter(authority: MockAuthority) -> AudioFocusArbiter {
        AudioFocusArbiter::new(
            Some(Arc::new(authority)),
            AudioAttributes::default(),
            noop(),
        )
    }

    #[test]
    fn test_without_authority_focus_is_always_granted() {
        let mut arbiter = AudioFocusArbiter::new(None, AudioAttributes::default(), noop());
        assert!(arbiter.request_focus());
        assert_eq!(
            arbiter.grant(),
            FocusGrant {
                held: true,
                revocable_by_system: false
            }
        );
        arbiter.release_focus();
        assert!(!arbiter.grant().held);
    }

    #[test]
    fn test_request_granted() {
        let mut authority = MockAuthority::new();
        authority
            .expect_request()
            .times(1)
            .returning(|_| Ok(FocusRequestResult::Granted));
        let mut arbiter = arbiter(authority);

        assert!(arbiter.request_focus());
        assert!(arbiter.grant().held);
        assert!(arbiter.grant().revocable_by_system);
    }

    #[test]
    fn test_denied_or_failing_requests_degrade_silently() {
        let mut authority = MockAuthority::new();
        let mut calls = 0;
        authority.expect_request().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(FocusRequestResult::Failed)
            } else {
                Err(BridgeError::NotAvailable("audio service".into()))
            }
        });
        let mut arbiter = arbiter(authority);

        assert!(!arbiter.request_focus());
        assert!(!arbiter.request_focus());
        assert!(!arbiter.grant().held);
    }

    #[test]
    fn test_release_abandons_once() {
        let mut authority = MockAuthority::new();
        authority
            .expect_request()
            .returning(|_| Ok(FocusRequestResult::Delayed));
        authority.expect_abandon().times(1).returning(|_| Ok(()));
        let mut arbiter = arbiter(authority);

        arbiter.request_focus();
        arbiter.release_focus();
        arbiter.release_focus();
    }

    #[test]
    fn test_release_without_request_does_not_call_authority() {
        let mut authority = MockAuthority::new();
        authority.expect_abandon().never();
        let mut arbiter = arbiter(authority);
        arbiter.release_focus();
    }

    #[test]
    fn test_every_loss_kind_pauses() {
        let mut arbiter = AudioFocusArbiter::new(None, AudioAttributes::default(), noop());
        arbiter.request_focus();
        for change in [
            FocusChange::Loss,
            FocusChange::LossTransient,
            FocusChange::LossTransientCanDuck,
        ] {
            assert_eq!(arbiter.observe(change), FocusSignal::Pause);
            assert!(!arbiter.grant().held);
        }
        assert_eq!(arbiter.observe(FocusChange::Gain), FocusSignal::Regained);
        assert!(arbiter.grant().held);
    }
}
