//! # pomotick core library
//!
//! Business logic for a single-user work/break interval timer. The CLI is a
//! thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: countdown state machine driven by a [`ClockSource`];
//!   emits events into an outbound queue
//! - **Completion Coordinator**: persists finished sessions and routes the
//!   user's continue/stop answer back to the engine
//! - **Storage**: SQLite session log with derived statistics, and TOML settings
//! - **Timer Service**: tokio task that exclusively owns the engine and store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionStore`]: Session persistence and statistics
//! - [`Config`]: Settings management
//! - [`AlertService`]: Trait for whatever notifies the user

pub mod alert;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod service;
pub mod storage;
pub mod timer;

pub use alert::{AlertService, CompletionNotice, Decision, FixedAlert};
pub use coordinator::{apply_decision, CompletionCoordinator, PendingDecision};
pub use error::{AlertError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use service::{Command, TimerHandle, TimerService};
pub use storage::{Config, KindCounts, SessionRecord, SessionStore, StatsSnapshot};
pub use timer::{
    format_clock, ClockSource, CompletedSession, EngineState, IntervalClock, ManualClock,
    SessionKind, TimerEngine,
};
