use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};
use pomotick_core::{
    AlertService, Config, Decision, Event, FixedAlert, SessionStore, TimerService,
};
use tokio::sync::broadcast::error::RecvError;

use crate::terminal::{self, TerminalAlert};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AutoAnswer {
    Continue,
    Stop,
}

#[derive(Args)]
pub struct RunArgs {
    /// Work minutes for this run (does not change the saved config)
    #[arg(long = "work")]
    work_minutes: Option<u32>,
    /// Break minutes for this run (does not change the saved config)
    #[arg(long = "break")]
    break_minutes: Option<u32>,
    /// Answer every completion prompt without asking
    #[arg(long, value_enum)]
    auto: Option<AutoAnswer>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run_timer(args));
    // A prompt may still be blocked reading stdin.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run_timer(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if let Some(work) = args.work_minutes {
        config.set("timer.work_minutes", &work.to_string())?;
    }
    if let Some(brk) = args.break_minutes {
        config.set("timer.break_minutes", &brk.to_string())?;
    }

    let store = match SessionStore::open() {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "session history will not be saved");
            SessionStore::open_memory()?
        }
    };
    let alert: Arc<dyn AlertService> = match args.auto {
        Some(AutoAnswer::Continue) => Arc::new(FixedAlert::always_continue()),
        Some(AutoAnswer::Stop) => Arc::new(FixedAlert::always_stop()),
        None => Arc::new(TerminalAlert::new()),
    };

    let (handle, task) = TimerService::spawn(&config, store, alert)?;
    let mut events = handle.subscribe();
    handle.start()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                break;
            }
            event = events.recv() => match event {
                Ok(Event::DecisionApplied { decision: Decision::Stop, .. }) => {
                    println!("\ntimer stopped");
                    break;
                }
                Ok(event) => terminal::render(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "status line fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown()?;
    let store = task.await?;
    let stats = store.stats()?;
    println!(
        "today: {} work, {} break",
        stats.today.work_sessions, stats.today.break_sessions
    );
    Ok(())
}
