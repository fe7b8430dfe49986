//! Delivery of playback outcomes into the web view.

use bridge_traits::ScriptHost;
use core_runtime::config::PlaybackSettings;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PlaybackError;
use crate::session::SessionId;

/// Invokes the completion callback at most once per session, guarding
/// against the callback being undefined on the script side.
///
/// Delivery is fire-and-forget: when the host is not ready or evaluation
/// fails, the notification is dropped and not retried.
pub struct CompletionNotifier {
    host: Arc<dyn ScriptHost>,
    completion_callback: String,
    error_callback: String,
    last_notified: Option<SessionId>,
    enabled: bool,
}

impl CompletionNotifier {
    pub fn new(host: Arc<dyn ScriptHost>, settings: &PlaybackSettings) -> Self {
        Self {
            host,
            completion_callback: settings.completion_callback.clone(),
            error_callback: settings.error_callback.clone(),
            last_notified: None,
            enabled: true,
        }
    }

    /// Returns `true` if the script was handed to the host.
    pub fn notify_completion(&mut self, session: SessionId) -> bool {
        if self.last_notified.is_some_and(|last| last >= session) {
            debug!(session = %session, "Completion already notified");
            return false;
        }
        self.last_notified = Some(session);

        let script = callback_script(&self.completion_callback, None);
        self.deliver(&script)
    }

    pub fn notify_error(&self, session: Option<SessionId>, error: &PlaybackError) -> bool {
        // Codes are fixed ASCII identifiers, a JSON string literal is a valid JS one.
        let argument = format!("\"{}\"", error.code());
        let script = callback_script(&self.error_callback, Some(&argument));
        debug!(session = ?session, code = error.code(), "Surfacing error to script");
        self.deliver(&script)
    }

    /// Stop delivering. Used once the controller is released.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    fn deliver(&self, script: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.host.is_ready() {
            debug!("Script host not ready, dropping notification");
            return false;
        }
        match self.host.evaluate(script) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to evaluate notification script");
                false
            }
        }
    }
}

fn callback_script(name: &str, argument: Option<&str>) -> String {
    format!(
        "if(window.{name}) window.{name}({arg});",
        name = name,
        arg = argument.unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Host {}
        impl ScriptHost for Host {
            fn is_ready(&self) -> bool;
            fn evaluate(&self, script: &str) -> BridgeResult<()>;
        }
    }

    fn ids(n: usize) -> Vec<SessionId> {
        let mut generator = crate::session::SessionIdGenerator::default();
        (0..n).map(|_| generator.next()).collect()
    }

    #[test]
    fn test_completion_script_guards_undefined_callback() {
        assert_eq!(
            callback_script("onNativeAudioComplete", None),
            "if(window.onNativeAudioComplete) window.onNativeAudioComplete();"
        );
    }

    #[test]
    fn test_notifies_once_per_session() {
        let mut host = MockHost::new();
        host.expect_is_ready().return_const(true);
        host.expect_evaluate()
            .with(eq("if(window.onNativeAudioComplete) window.onNativeAudioComplete();"))
            .times(2)
            .returning(|_| Ok(()));

        let ids = ids(2);
        let mut notifier = CompletionNotifier::new(Arc::new(host), &PlaybackSettings::default());
        assert!(notifier.notify_completion(ids[0]));
        assert!(!notifier.notify_completion(ids[0]));
        assert!(notifier.notify_completion(ids[1]));
    }

    #[test]
    fn test_drops_when_host_not_ready() {
        let mut host = MockHost::new();
        host.expect_is_ready().return_const(false);
        host.expect_evaluate().never();

        let ids = ids(1);
        let mut notifier = CompletionNotifier::new(Arc::new(host), &PlaybackSettings::default());
        assert!(!notifier.notify_completion(ids[0]));
        // Not retried either.
        assert!(!notifier.notify_completion(ids[0]));
    }

    #[test]
    fn test_evaluation_failure_is_swallowed() {
        let mut host = MockHost::new();
        host.expect_is_ready().return_const(true);
        host.expect_evaluate()
            .returning(|_| Err(BridgeError::OperationFailed("web view detached".into())));

        let ids = ids(1);
        let mut notifier = CompletionNotifier::new(Arc::new(host), &PlaybackSettings::default());
        assert!(!notifier.notify_completion(ids[0]));
    }

    #[test]
    fn test_error_script_uses_code() {
        let mut host = MockHost::new();
        host.expect_is_ready().return_const(true);
        host.expect_evaluate()
            .with(eq(
                "if(window.onNativeAudioError) window.onNativeAudioError(\"source_unavailable\");",
            ))
            .times(1)
            .returning(|_| Ok(()));

        let notifier = CompletionNotifier::new(Arc::new(host), &PlaybackSettings::default());
        let error = PlaybackError::source_unavailable("unit9.mp3", "not found");
        assert!(notifier.notify_error(None, &error));
    }

    #[test]
    fn test_disabled_notifier_is_silent() {
        let mut host = MockHost::new();
        host.expect_is_ready().return_const(true);
        host.expect_evaluate().never();

        let ids = ids(1);
        let mut notifier = CompletionNotifier::new(Arc::new(host), &PlaybackSettings::default());
        notifier.disable();
        assert!(!notifier.notify_completion(ids[0]));
    }
}
