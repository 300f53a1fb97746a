mod clock;
mod engine;
mod session;

pub use clock::{ClockSource, IntervalClock, ManualClock};
pub use engine::{
    format_clock, EngineState, TimerEngine, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
    TICK_PERIOD,
};
pub use session::{CompletedSession, SessionKind};
