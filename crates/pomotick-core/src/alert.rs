//! Contract with the human-alert side of the app.
//!
//! When a session completes, the user is notified (notification, sound,
//! vibration, whatever the platform offers) and asked whether to carry on
//! with the opposite session or stop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AlertError;
use crate::storage::NotificationsConfig;
use crate::timer::SessionKind;

/// Outcome of the continue/stop question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Switch to the opposite session and start it right away.
    Continue,
    /// Return to a paused, full-length Work session.
    Stop,
}

impl From<bool> for Decision {
    fn from(should_continue: bool) -> Self {
        if should_continue {
            Decision::Continue
        } else {
            Decision::Stop
        }
    }
}

/// What to show the user for one completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub kind: SessionKind,
    pub title: String,
    pub body: String,
    pub continue_label: String,
    pub stop_label: String,
    pub sound: bool,
    pub vibrate: bool,
}

impl CompletionNotice {
    /// Build the notice for a finished `kind`, given the length of the
    /// session that would follow.
    pub fn new(kind: SessionKind, next_duration_secs: u64, prefs: &NotificationsConfig) -> Self {
        let (title, body, continue_label) = match kind {
            SessionKind::Work => {
                let minutes = next_duration_secs.div_ceil(60);
                (
                    "Work Session Complete!",
                    format!("Great job! Time for a {minutes}-minute break."),
                    "Start Break",
                )
            }
            SessionKind::Break => (
                "Break Time Over!",
                "Break time is over. Ready for another work session?".to_string(),
                "Start Work",
            ),
        };
        Self {
            kind,
            title: title.to_string(),
            body,
            continue_label: continue_label.to_string(),
            stop_label: "Stop Timer".to_string(),
            sound: prefs.sound_enabled,
            vibrate: prefs.vibration_enabled,
        }
    }
}

/// Notifies the user about a completion and asks continue (`true`) or
/// stop (`false`).
#[async_trait]
pub trait AlertService: Send + Sync {
    async fn present_completion(&self, notice: &CompletionNotice) -> Result<bool, AlertError>;
}

/// Answers every completion the same way without bothering anyone.
#[derive(Debug, Clone, Copy)]
pub struct FixedAlert {
    decision: Decision,
}

impl FixedAlert {
    pub fn new(decision: Decision) -> Self {
        Self { decision }
    }

    pub fn always_continue() -> Self {
        Self::new(Decision::Continue)
    }

    pub fn always_stop() -> Self {
        Self::new(Decision::Stop)
    }
}

#[async_trait]
impl AlertService for FixedAlert {
    async fn present_completion(&self, notice: &CompletionNotice) -> Result<bool, AlertError> {
        tracing::info!(title = %notice.title, decision = ?self.decision, "completion auto-answered");
        Ok(self.decision == Decision::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_notice_mentions_break_length() {
        let notice =
            CompletionNotice::new(SessionKind::Work, 300, &NotificationsConfig::default());
        assert_eq!(notice.title, "Work Session Complete!");
        assert_eq!(notice.body, "Great job! Time for a 5-minute break.");
        assert_eq!(notice.continue_label, "Start Break");
        assert_eq!(notice.stop_label, "Stop Timer");
        assert!(notice.sound);
        assert!(notice.vibrate);
    }

    #[test]
    fn break_notice_offers_work() {
        let prefs = NotificationsConfig {
            sound_enabled: false,
            vibration_enabled: true,
        };
        let notice = CompletionNotice::new(SessionKind::Break, 1500, &prefs);
        assert_eq!(notice.title, "Break Time Over!");
        assert_eq!(notice.continue_label, "Start Work");
        assert!(!notice.sound);
    }

    #[test]
    fn bool_maps_to_decision() {
        assert_eq!(Decision::from(true), Decision::Continue);
        assert_eq!(Decision::from(false), Decision::Stop);
    }

    #[tokio::test]
    async fn fixed_alert_answers_as_configured() {
        let notice =
            CompletionNotice::new(SessionKind::Work, 300, &NotificationsConfig::default());
        assert!(FixedAlert::always_continue()
            .present_completion(&notice)
            .await
            .unwrap());
        assert!(!FixedAlert::always_stop()
            .present_completion(&notice)
            .await
            .unwrap());
    }
}
