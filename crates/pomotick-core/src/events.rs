use serde::{Deserialize, Serialize};

use crate::alert::Decision;
use crate::timer::{CompletedSession, SessionKind};

/// Everything the timer has to tell its presentation layer.
///
/// Within one tick, `Tick` always precedes the `StateChanged` and
/// `SessionCompleted` it caused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Tick {
        remaining_secs: u64,
        mode: SessionKind,
    },
    StateChanged {
        running: bool,
        mode: SessionKind,
        remaining_secs: u64,
    },
    /// A countdown reached zero. `generation` identifies the completion
    /// for the continue/stop decision that follows.
    SessionCompleted {
        generation: u64,
        session: CompletedSession,
    },
    /// A continue/stop decision was accepted and applied to the engine.
    DecisionApplied {
        generation: u64,
        decision: Decision,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::Tick {
            remaining_secs: 59,
            mode: SessionKind::Work,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tick");
        assert_eq!(json["remaining_secs"], 59);
        assert_eq!(json["mode"], "work");
    }
}
