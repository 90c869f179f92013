//! Call-retry message filter
//!
//! The host rejects automation calls while it is busy with another one. The
//! [`RetryFilter`] turns those rejections into bounded, blocking retries.
//! Platform adapters register it as the process message filter through a
//! [`FilterRegistrar`]; adapters that instead surface rejections as
//! [`HostError::Busy`] go through [`RetryFilter::call`], which applies the
//! same policy.
//!
//! The filter is process-global and not reentrant.

use crate::config::RetrySettings;
use crate::interfaces::{FilterRegistrar, HostError, HostResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static FILTER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Why the callee rejected a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// Busy, the caller may try again later
    RetryLater,
    /// Refused outright
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Cancel,
}

/// Answer to an incoming-call probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingCall {
    Handled,
}

/// What to do with window messages that arrive while waiting on a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Keep dispatching window messages
    ProcessMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Total time a call may stay rejected before it fails
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            delay: Duration::from_millis(settings.delay_ms),
            ceiling: Duration::from_millis(settings.ceiling_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryFilter {
    policy: RetryPolicy,
}

impl RetryFilter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Decide what to do with a call the host rejected `elapsed` after it was first issued
    pub fn on_call_rejected(&self, elapsed: Duration, kind: RejectKind) -> RetryDecision {
        match kind {
            RejectKind::Rejected => RetryDecision::Cancel,
            RejectKind::RetryLater if elapsed >= self.policy.ceiling => RetryDecision::Cancel,
            RejectKind::RetryLater => {
                let remaining = self.policy.ceiling - elapsed;
                RetryDecision::RetryAfter(self.policy.delay.min(remaining))
            }
        }
    }

    /// The process is never blocked, so every incoming call is handled
    pub fn on_incoming_call(&self) -> IncomingCall {
        IncomingCall::Handled
    }

    pub fn on_message_pending(&self) -> PendingAction {
        PendingAction::ProcessMessages
    }

    /// Run `call`, sleeping and retrying while the host reports busy
    pub fn call<T>(&self, what: &str, mut call: impl FnMut() -> HostResult<T>) -> HostResult<T> {
        let started = Instant::now();
        let mut attempt = 1u32;

        loop {
            match call() {
                Err(HostError::Busy) => {
                    match self.on_call_rejected(started.elapsed(), RejectKind::RetryLater) {
                        RetryDecision::RetryAfter(delay) => {
                            debug!("{} rejected (attempt {}), retrying in {:?}", what, attempt, delay);
                            thread::sleep(delay);
                            attempt += 1;
                        }
                        RetryDecision::Cancel => {
                            warn!("{} still rejected after {} attempts", what, attempt);
                            return Err(HostError::Failed(format!(
                                "{what}: host remained busy for {}ms",
                                self.policy.ceiling.as_millis()
                            )));
                        }
                    }
                }
                other => return other,
            }
        }
    }
}

/// Keeps a [`RetryFilter`] installed until dropped
///
/// Revocation happens on every exit path, including unwinding.
pub struct FilterGuard {
    registrar: Arc<dyn FilterRegistrar>,
    filter: Arc<RetryFilter>,
    installed: bool,
    owns_flag: bool,
}

impl FilterGuard {
    /// Install `filter`; a failed install is logged and calls proceed unfiltered
    pub fn install(registrar: Arc<dyn FilterRegistrar>, filter: Arc<RetryFilter>) -> Self {
        let owns_flag = !FILTER_ACTIVE.swap(true, Ordering::AcqRel);
        if !owns_flag {
            warn!("a message filter is already installed in this process");
        }

        let installed = match registrar.install(Arc::clone(&filter)) {
            Ok(()) => {
                debug!("message filter installed");
                true
            }
            Err(e) => {
                warn!("could not install message filter: {}", e);
                false
            }
        };

        Self {
            registrar,
            filter,
            installed,
            owns_flag,
        }
    }

    pub fn filter(&self) -> &RetryFilter {
        &self.filter
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl Drop for FilterGuard {
    fn drop(&mut self) {
        if self.installed {
            match self.registrar.revoke() {
                Ok(()) => debug!("message filter revoked"),
                Err(e) => warn!("could not revoke message filter: {}", e),
            }
        }
        if self.owns_flag {
            FILTER_ACTIVE.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::cell::Cell;

    fn quick_filter() -> RetryFilter {
        RetryFilter::new(RetryPolicy {
            delay: Duration::from_millis(1),
            ceiling: Duration::from_millis(40),
        })
    }

    #[derive(Default)]
    struct RecordingRegistrar {
        events: Mutex<Vec<&'static str>>,
        fail_install: bool,
    }

    impl FilterRegistrar for RecordingRegistrar {
        fn install(&self, _filter: Arc<RetryFilter>) -> HostResult<()> {
            self.events.lock().push("install");
            if self.fail_install {
                Err(HostError::Failed("wrong apartment".into()))
            } else {
                Ok(())
            }
        }

        fn revoke(&self) -> HostResult<()> {
            self.events.lock().push("revoke");
            Ok(())
        }
    }

    #[test]
    fn test_busy_rejection_is_retried_with_delay() {
        let filter = quick_filter();
        assert_eq!(
            filter.on_call_rejected(Duration::ZERO, RejectKind::RetryLater),
            RetryDecision::RetryAfter(Duration::from_millis(1))
        );
    }

    #[test]
    fn test_retry_stops_at_ceiling() {
        let filter = quick_filter();
        assert_eq!(
            filter.on_call_rejected(Duration::from_millis(40), RejectKind::RetryLater),
            RetryDecision::Cancel
        );
        assert_eq!(
            filter.on_call_rejected(Duration::ZERO, RejectKind::Rejected),
            RetryDecision::Cancel
        );
    }

    #[test]
    fn test_delay_never_overshoots_ceiling() {
        let filter = RetryFilter::new(RetryPolicy {
            delay: Duration::from_millis(500),
            ceiling: Duration::from_millis(600),
        });
        assert_eq!(
            filter.on_call_rejected(Duration::from_millis(550), RejectKind::RetryLater),
            RetryDecision::RetryAfter(Duration::from_millis(50))
        );
    }

    #[test]
    fn test_incoming_calls_and_pending_messages() {
        let filter = quick_filter();
        assert_eq!(filter.on_incoming_call(), IncomingCall::Handled);
        assert_eq!(filter.on_message_pending(), PendingAction::ProcessMessages);
    }

    #[test]
    fn test_call_absorbs_transient_busy() {
        let filter = quick_filter();
        let remaining = Cell::new(3);
        let result = filter.call("Build", || {
            if remaining.get() > 0 {
                remaining.set(remaining.get() - 1);
                Err(HostError::Busy)
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn test_call_fails_when_busy_never_clears() {
        let filter = quick_filter();
        let result: HostResult<()> = filter.call("Build", || Err(HostError::Busy));
        match result {
            Err(HostError::Failed(message)) => assert!(message.contains("remained busy")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_call_does_not_retry_other_failures() {
        let filter = quick_filter();
        let attempts = Cell::new(0);
        let result: HostResult<()> = filter.call("Build", || {
            attempts.set(attempts.get() + 1);
            Err(HostError::Failed("no".into()))
        });
        assert_eq!(result, Err(HostError::Failed("no".into())));
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_guard_revokes_on_drop() {
        let registrar = Arc::new(RecordingRegistrar::default());
        {
            let guard = FilterGuard::install(registrar.clone(), Arc::new(quick_filter()));
            assert!(guard.is_installed());
        }
        assert_eq!(*registrar.events.lock(), vec!["install", "revoke"]);
    }

    #[test]
    fn test_guard_revokes_on_unwind() {
        let registrar = Arc::new(RecordingRegistrar::default());
        let inner = registrar.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = FilterGuard::install(inner, Arc::new(quick_filter()));
            panic!("command failed");
        }));
        assert!(result.is_err());
        assert_eq!(*registrar.events.lock(), vec!["install", "revoke"]);
    }

    #[test]
    fn test_failed_install_is_not_revoked() {
        let registrar = Arc::new(RecordingRegistrar {
            fail_install: true,
            ..Default::default()
        });
        {
            let guard = FilterGuard::install(registrar.clone(), Arc::new(quick_filter()));
            assert!(!guard.is_installed());
        }
        assert_eq!(*registrar.events.lock(), vec!["install"]);
    }
}
