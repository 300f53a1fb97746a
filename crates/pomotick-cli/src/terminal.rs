//! Terminal rendering and the stdin-driven alert service.

use std::io::Write;

use async_trait::async_trait;
use pomotick_core::{format_clock, AlertError, AlertService, CompletionNotice, Event, SessionKind};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Asks the continue/stop question on the terminal.
pub struct TerminalAlert {
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalAlert {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl AlertService for TerminalAlert {
    async fn present_completion(&self, notice: &CompletionNotice) -> Result<bool, AlertError> {
        let notify = |e: std::io::Error| AlertError::Notify(e.to_string());
        {
            let mut out = std::io::stdout();
            if notice.sound {
                write!(out, "\x07").map_err(notify)?;
            }
            writeln!(out, "\n\n{}\n{}\n", notice.title, notice.body).map_err(notify)?;
            out.flush().map_err(notify)?;
        }
        if notice.vibrate {
            tracing::debug!("vibration is not available on a terminal");
        }

        let mut input = self.input.lock().await;
        loop {
            prompt(notice).map_err(notify)?;
            match input.next_line().await {
                Ok(Some(line)) => {
                    if let Some(answer) = parse_answer(&line) {
                        return Ok(answer);
                    }
                }
                Ok(None) => return Err(AlertError::Dialog("stdin closed".into())),
                Err(e) => return Err(AlertError::Dialog(e.to_string())),
            }
        }
    }
}

fn prompt(notice: &CompletionNotice) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    write!(
        out,
        "What would you like to do? {} [y] / {} [n]: ",
        notice.continue_label, notice.stop_label
    )?;
    out.flush()
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Redraw the status line for an engine event.
pub fn render(event: &Event) {
    let mut out = std::io::stdout();
    if let Err(e) = write!(out, "{}", frame(event)).and_then(|_| out.flush()) {
        tracing::debug!(error = %e, "could not draw status line");
    }
}

/// Terminal output for one event. Only ticks and state changes rewrite the
/// current line; the completion line must not clear an alert prompt that was
/// already printed.
fn frame(event: &Event) -> String {
    match event {
        Event::Tick {
            remaining_secs,
            mode,
        } => format!("\r\x1b[K{}", status_line(*mode, *remaining_secs, true)),
        Event::StateChanged {
            running,
            mode,
            remaining_secs,
        } => format!("\r\x1b[K{}", status_line(*mode, *remaining_secs, *running)),
        Event::SessionCompleted { session, .. } => {
            format!("\n{} session complete\n", label(session.kind))
        }
        Event::DecisionApplied { .. } => "\n".to_string(),
    }
}

fn label(mode: SessionKind) -> &'static str {
    match mode {
        SessionKind::Work => "WORK",
        SessionKind::Break => "BREAK",
    }
}

fn status_line(mode: SessionKind, remaining_secs: u64, running: bool) -> String {
    let suffix = if running { "" } else { " (paused)" };
    format!("{:<5} {}{suffix}", label(mode), format_clock(remaining_secs))
}
