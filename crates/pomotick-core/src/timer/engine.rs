//! Timer engine implementation.
//!
//! The engine is a countdown state machine driven by an external clock.
//! It holds no thread of its own: the owner arms/disarms through the
//! [`ClockSource`] and feeds each delivered tick back into [`TimerEngine::tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Paused --start--> Running --pause--> Paused
//!    ^                 |
//!    +---- (tick reaches zero: completion) ----+
//! ```
//!
//! Everything the engine has to say goes into an outbound queue that the
//! owner drains with [`TimerEngine::drain_events`].

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::ClockSource;
use super::session::{CompletedSession, SessionKind};
use crate::error::ValidationError;
use crate::events::Event;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub mode: SessionKind,
    pub remaining_secs: u64,
    pub running: bool,
    pub work_duration_secs: u64,
    pub break_duration_secs: u64,
}

/// Core timer engine.
#[derive(Debug)]
pub struct TimerEngine<C> {
    clock: C,
    mode: SessionKind,
    remaining_secs: u64,
    work_secs: u64,
    break_secs: u64,
    /// Bumped on every completion.
    generation: u64,
    /// Generation of the completion still awaiting a continue/stop decision.
    pending_decision: Option<u64>,
    events: VecDeque<Event>,
}

impl<C: ClockSource> TimerEngine<C> {
    /// Create an engine with the default 25/5 minute durations, paused in
    /// Work mode at full duration.
    pub fn new(clock: C) -> Self {
        let work_secs = minutes_to_secs(DEFAULT_WORK_MINUTES);
        Self {
            clock,
            mode: SessionKind::Work,
            remaining_secs: work_secs,
            work_secs,
            break_secs: minutes_to_secs(DEFAULT_BREAK_MINUTES),
            generation: 0,
            pending_decision: None,
            events: VecDeque::new(),
        }
    }

    /// Create an engine with explicit durations in minutes.
    ///
    /// # Errors
    /// Returns an error if either duration is zero.
    pub fn with_durations(
        clock: C,
        work_minutes: u32,
        break_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let mut engine = Self::new(clock);
        engine.set_durations(work_minutes, break_minutes)?;
        engine.events.clear();
        Ok(engine)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> SessionKind {
        self.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_armed()
    }

    pub fn duration_for(&self, kind: SessionKind) -> u64 {
        match kind {
            SessionKind::Work => self.work_secs,
            SessionKind::Break => self.break_secs,
        }
    }

    /// Generation of the completion awaiting a decision, if any.
    pub fn pending_decision(&self) -> Option<u64> {
        self.pending_decision
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.duration_for(self.mode);
        if total == 0 {
            return 0.0;
        }
        (1.0 - (self.remaining_secs as f64 / total as f64)).clamp(0.0, 1.0)
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            running: self.is_running(),
            work_duration_secs: self.work_secs,
            break_duration_secs: self.break_secs,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.pending_decision = None;
        if self.remaining_secs == 0 {
            // A finished countdown left on screen; count the mode again.
            self.remaining_secs = self.duration_for(self.mode);
        }
        self.clock.arm(TICK_PERIOD);
        tracing::debug!(mode = %self.mode, remaining = self.remaining_secs, "timer started");
        self.emit_state();
    }

    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        self.clock.disarm();
        tracing::debug!(mode = %self.mode, remaining = self.remaining_secs, "timer paused");
        self.emit_state();
    }

    /// Stop and reload a full Work session. Emits a single state change.
    pub fn reset(&mut self) {
        self.clock.disarm();
        self.pending_decision = None;
        self.mode = SessionKind::Work;
        self.remaining_secs = self.work_secs;
        tracing::debug!("timer reset");
        self.emit_state();
    }

    /// Flip Work/Break and load the new mode's full duration.
    /// Leaves the running flag as it is.
    pub fn switch_to_next_session(&mut self) {
        self.pending_decision = None;
        self.mode = self.mode.opposite();
        self.remaining_secs = self.duration_for(self.mode);
        tracing::debug!(mode = %self.mode, "switched session");
        self.emit_state();
    }

    /// Reconfigure both durations.
    ///
    /// While paused the display is reloaded with the current mode's new
    /// duration; a running countdown keeps going untouched.
    ///
    /// # Errors
    /// Returns an error (and changes nothing) if either duration is zero.
    pub fn set_durations(
        &mut self,
        work_minutes: u32,
        break_minutes: u32,
    ) -> Result<(), ValidationError> {
        validate_minutes("work_minutes", work_minutes)?;
        validate_minutes("break_minutes", break_minutes)?;

        self.work_secs = minutes_to_secs(work_minutes);
        self.break_secs = minutes_to_secs(break_minutes);
        self.pending_decision = None;

        if !self.is_running() {
            self.remaining_secs = self.duration_for(self.mode);
            self.emit_state();
        }
        tracing::debug!(work_minutes, break_minutes, "durations updated");
        Ok(())
    }

    /// Deliver one clock tick. Ignored unless the clock is armed, so a
    /// tick racing a `pause()` can never move the countdown.
    pub fn tick(&mut self) {
        if !self.is_running() {
            tracing::trace!("tick ignored while paused");
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.events.push_back(Event::Tick {
            remaining_secs: self.remaining_secs,
            mode: self.mode,
        });
        if self.remaining_secs == 0 {
            self.complete();
        }
    }

    /// Consume the pending decision if it belongs to `generation`.
    /// Returns false for a stale or unknown generation.
    pub fn take_pending_decision(&mut self, generation: u64) -> bool {
        if self.pending_decision == Some(generation) {
            self.pending_decision = None;
            true
        } else {
            false
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) {
        self.clock.disarm();
        self.emit_state();

        self.generation += 1;
        self.pending_decision = Some(self.generation);
        let session = CompletedSession {
            kind: self.mode,
            duration_secs: self.duration_for(self.mode),
            completed_at: Utc::now(),
        };
        tracing::info!(kind = %session.kind, duration = session.duration_secs, "session complete");
        self.events.push_back(Event::SessionCompleted {
            generation: self.generation,
            session,
        });
    }

    fn emit_state(&mut self) {
        self.events.push_back(Event::StateChanged {
            running: self.is_running(),
            mode: self.mode,
            remaining_secs: self.remaining_secs,
        });
    }
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes).saturating_mul(60)
}

fn validate_minutes(field: &str, minutes: u32) -> Result<(), ValidationError> {
    if minutes == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "duration must be at least one minute".to_string(),
        });
    }
    Ok(())
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;

    fn engine() -> TimerEngine<ManualClock> {
        TimerEngine::new(ManualClock::new())
    }

    fn ticks(engine: &mut TimerEngine<ManualClock>, n: u64) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn defaults_are_25_and_5_minutes() {
        let engine = engine();
        let state = engine.state();
        assert_eq!(state.mode, SessionKind::Work);
        assert_eq!(state.remaining_secs, 1500);
        assert_eq!(state.break_duration_secs, 300);
        assert!(!state.running);
    }

    #[test]
    fn start_arms_once_and_emits_state() {
        let mut engine = engine();
        engine.start();
        engine.start();
        assert!(engine.is_running());
        assert_eq!(engine.clock().arm_count(), 1);
        assert_eq!(engine.clock().period(), Some(TICK_PERIOD));
        assert_eq!(
            engine.drain_events(),
            vec![Event::StateChanged {
                running: true,
                mode: SessionKind::Work,
                remaining_secs: 1500,
            }]
        );
    }

    #[test]
    fn pause_when_paused_is_silent() {
        let mut engine = engine();
        engine.pause();
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn ticks_after_pause_are_ignored() {
        let mut engine = engine();
        engine.start();
        ticks(&mut engine, 3);
        engine.pause();
        engine.drain_events();

        ticks(&mut engine, 5000);
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.remaining_secs(), 1497);
    }

    #[test]
    fn reset_emits_one_final_state() {
        let mut engine = engine();
        engine.switch_to_next_session();
        engine.start();
        ticks(&mut engine, 10);
        engine.drain_events();

        engine.reset();
        assert_eq!(
            engine.drain_events(),
            vec![Event::StateChanged {
                running: false,
                mode: SessionKind::Work,
                remaining_secs: 1500,
            }]
        );
    }

    #[test]
    fn switch_twice_returns_to_original_mode() {
        let mut engine = engine();
        engine.start();
        ticks(&mut engine, 42);
        engine.switch_to_next_session();
        assert_eq!(engine.mode(), SessionKind::Break);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(engine.is_running());
        engine.switch_to_next_session();
        assert_eq!(engine.mode(), SessionKind::Work);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn set_durations_reloads_paused_display() {
        let mut engine = engine();
        engine.set_durations(50, 10).unwrap();
        assert_eq!(engine.remaining_secs(), 3000);
        engine.switch_to_next_session();
        assert_eq!(engine.remaining_secs(), 600);
    }

    #[test]
    fn set_durations_leaves_running_countdown_alone() {
        let mut engine = engine();
        engine.start();
        ticks(&mut engine, 100);
        engine.set_durations(1, 1).unwrap();
        assert_eq!(engine.remaining_secs(), 1400);
        assert_eq!(engine.duration_for(SessionKind::Work), 60);
    }

    #[test]
    fn set_durations_rejects_zero() {
        let mut engine = engine();
        assert!(engine.set_durations(0, 5).is_err());
        assert!(engine.set_durations(25, 0).is_err());
        assert_eq!(engine.duration_for(SessionKind::Work), 1500);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn completion_follows_the_final_tick() {
        let mut engine = TimerEngine::with_durations(ManualClock::new(), 1, 1).unwrap();
        engine.start();
        ticks(&mut engine, 59);
        engine.drain_events();

        engine.tick();
        let events = engine.drain_events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Event::Tick {
                remaining_secs: 0,
                mode: SessionKind::Work
            }
        );
        assert_eq!(
            events[1],
            Event::StateChanged {
                running: false,
                mode: SessionKind::Work,
                remaining_secs: 0,
            }
        );
        match &events[2] {
            Event::SessionCompleted {
                generation,
                session,
            } => {
                assert_eq!(*generation, 1);
                assert_eq!(session.kind, SessionKind::Work);
                assert_eq!(session.duration_secs, 60);
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
        assert!(!engine.is_running());
        assert_eq!(engine.pending_decision(), Some(1));

        // ticking never resumes on its own
        ticks(&mut engine, 10);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn start_after_completion_reloads_full_duration() {
        let mut engine = TimerEngine::with_durations(ManualClock::new(), 1, 1).unwrap();
        engine.start();
        ticks(&mut engine, 60);
        engine.start();
        assert_eq!(engine.remaining_secs(), 60);
        assert_eq!(engine.pending_decision(), None);
    }

    #[test]
    fn stale_generation_is_not_taken() {
        let mut engine = TimerEngine::with_durations(ManualClock::new(), 1, 1).unwrap();
        engine.start();
        ticks(&mut engine, 60);
        engine.reset();
        assert!(!engine.take_pending_decision(1));
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut engine = TimerEngine::with_durations(ManualClock::new(), 1, 1).unwrap();
        assert_eq!(engine.progress(), 0.0);
        engine.start();
        ticks(&mut engine, 30);
        assert!((engine.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(3600), "60:00");
    }
}
