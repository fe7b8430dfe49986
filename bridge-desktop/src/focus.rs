//! In-process audio focus.
//!
//! Desktop platforms have no system-wide focus service, so focus is
//! arbitrated between the controllers of this process only.

use bridge_traits::{
    error::Result,
    focus::{AudioFocusAuthority, FocusChange, FocusRequest, FocusRequestResult},
};
use std::sync::Mutex;
use tracing::debug;

/// Grants every request and revokes the previous holder with
/// [`FocusChange::Loss`].
#[derive(Debug, Default)]
pub struct ProcessFocusAuthority {
    holder: Mutex<Option<FocusRequest>>,
}

impl ProcessFocusAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_holder(&self) -> bool {
        self.holder.lock().map(|h| h.is_some()).unwrap_or(false)
    }
}

impl AudioFocusAuthority for ProcessFocusAuthority {
    fn request(&self, request: &FocusRequest) -> Result<FocusRequestResult> {
        let previous = {
            let mut holder = self.holder.lock().unwrap_or_else(|e| e.into_inner());
            match holder.replace(request.clone()) {
                Some(previous) if previous.id != request.id => Some(previous),
                _ => None,
            }
        };

        // Callbacks run outside the lock; the loser may re-request from it.
        if let Some(previous) = previous {
            debug!(loser = ?previous.id, winner = ?request.id, "Audio focus moved");
            (previous.on_change)(FocusChange::Loss);
        }
        Ok(FocusRequestResult::Granted)
    }

    fn abandon(&self, request: &FocusRequest) -> Result<()> {
        let mut holder = self.holder.lock().unwrap_or_else(|e| e.into_inner());
        if holder.as_ref().is_some_and(|h| h.id == request.id) {
            *holder = None;
        }
        Ok(())
    }
}
