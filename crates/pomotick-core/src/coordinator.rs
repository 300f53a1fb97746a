//! Completion flow: what happens after a countdown reaches zero.
//!
//! 1. The finished session is persisted (a failure is logged, not fatal).
//! 2. The alert service is asked, off the engine's task, whether to continue.
//! 3. The answer comes back tagged with the completion's generation and is
//!    applied only if the engine still awaits that exact completion.
//!
//! The engine never advances to the next session by itself.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::alert::{AlertService, CompletionNotice, Decision};
use crate::storage::{NotificationsConfig, SessionRecord, SessionStore};
use crate::timer::{ClockSource, CompletedSession, TimerEngine};

/// A decision on its way back to the engine's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub generation: u64,
    pub decision: Decision,
}

#[derive(Clone)]
pub struct CompletionCoordinator {
    alert: Arc<dyn AlertService>,
    notifications: NotificationsConfig,
}

impl CompletionCoordinator {
    pub fn new(alert: Arc<dyn AlertService>, notifications: NotificationsConfig) -> Self {
        Self {
            alert,
            notifications,
        }
    }

    /// Persist `session`, logging instead of failing.
    pub fn persist(store: &mut SessionStore, session: &CompletedSession) -> Option<SessionRecord> {
        match store.record(session) {
            Ok(record) => {
                tracing::debug!(id = record.id, kind = %record.kind, "session recorded");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = %session.kind, "session not saved to history");
                None
            }
        }
    }

    /// Ask the alert service; any alert failure becomes [`Decision::Stop`].
    pub async fn resolve(&self, notice: &CompletionNotice) -> Decision {
        match self.alert.present_completion(notice).await {
            Ok(should_continue) => Decision::from(should_continue),
            Err(e) => {
                tracing::warn!(error = %e, "alert failed, stopping timer");
                Decision::Stop
            }
        }
    }

    /// Run the whole protocol for one completion. The decision is delivered
    /// on `decisions` from a spawned task; this returns immediately.
    pub fn handle_completion(
        &self,
        store: &mut SessionStore,
        generation: u64,
        session: &CompletedSession,
        next_duration_secs: u64,
        decisions: mpsc::UnboundedSender<PendingDecision>,
    ) {
        Self::persist(store, session);

        let notice = CompletionNotice::new(session.kind, next_duration_secs, &self.notifications);
        let coordinator = self.clone();
        tokio::spawn(async move {
            let decision = coordinator.resolve(&notice).await;
            if decisions
                .send(PendingDecision {
                    generation,
                    decision,
                })
                .is_err()
            {
                tracing::debug!(generation, "timer gone before decision arrived");
            }
        });
    }
}

/// Apply a decision to the engine, unless it is stale.
///
/// Continue switches to the opposite session and starts it; Stop resets.
/// Returns false (and touches nothing) when the engine has moved on since
/// the completion identified by `generation`.
pub fn apply_decision<C: ClockSource>(
    engine: &mut TimerEngine<C>,
    generation: u64,
    decision: Decision,
) -> bool {
    if !engine.take_pending_decision(generation) {
        tracing::debug!(generation, ?decision, "ignoring stale decision");
        return false;
    }
    match decision {
        Decision::Continue => {
            engine.switch_to_next_session();
            engine.start();
        }
        Decision::Stop => engine.reset(),
    }
    true
}
