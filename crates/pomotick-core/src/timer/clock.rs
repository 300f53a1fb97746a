//! Periodic tick sources for the timer engine.
//!
//! The engine arms a clock on `start()` and disarms it on `pause()`; it
//! treats "armed" as the single source of truth for "running". A clock
//! never holds more than one subscription: arming an armed clock is inert.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub trait ClockSource: Send {
    /// Begin producing one tick per `period`. No-op while already armed.
    fn arm(&mut self, period: Duration);

    /// Stop producing ticks. Ticks of the previous subscription are never
    /// observed after this returns.
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

/// Tokio-backed clock. The owner awaits [`IntervalClock::next_tick`].
#[derive(Debug, Default)]
pub struct IntervalClock {
    interval: Option<Interval>,
}

impl IntervalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves on the next tick; pends forever while disarmed.
    pub async fn next_tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl ClockSource for IntervalClock {
    fn arm(&mut self, period: Duration) {
        if self.interval.is_some() {
            return;
        }
        // First tick lands one full period after arming, not immediately.
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn disarm(&mut self) {
        self.interval = None;
    }

    fn is_armed(&self) -> bool {
        self.interval.is_some()
    }
}

/// Clock with no time source of its own; ticks are injected by calling
/// `TimerEngine::tick` directly. Counts arms so tests can assert that a
/// countdown was never double-armed.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    armed: bool,
    arm_count: u32,
    period: Option<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transitions from disarmed to armed.
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl ClockSource for ManualClock {
    fn arm(&mut self, period: Duration) {
        if self.armed {
            return;
        }
        self.armed = true;
        self.arm_count += 1;
        self.period = Some(period);
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}
