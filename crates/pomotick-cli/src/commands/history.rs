use chrono::{DateTime, Duration, Local, Utc};
use clap::{Args, ValueEnum};
use pomotick_core::{format_clock, SessionKind, SessionRecord, SessionStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HistoryFilter {
    Today,
    Week,
    All,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Which sessions to show
    #[arg(long, value_enum, default_value_t = HistoryFilter::Today)]
    filter: HistoryFilter,
    /// Print JSON instead of one line per session
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;
    let mut sessions = match args.filter {
        HistoryFilter::Today => store.list_today()?,
        HistoryFilter::Week => store.list_since(Utc::now() - Duration::days(7))?,
        HistoryFilter::All => store.list_all()?,
    };
    most_recent_first(&mut sessions);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    if sessions.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    let now = Local::now();
    for session in &sessions {
        println!("{}", describe(session, now));
    }
    println!("{}", summary(&sessions));
    Ok(())
}

/// "3 work, 2 break (5 total)" for the listed sessions.
fn summary(sessions: &[SessionRecord]) -> String {
    let work = sessions
        .iter()
        .filter(|s| s.kind == SessionKind::Work)
        .count();
    format!(
        "{work} work, {} break ({} total)",
        sessions.len() - work,
        sessions.len()
    )
}

fn most_recent_first(sessions: &mut [SessionRecord]) {
    sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));
}

fn describe(session: &SessionRecord, now: DateTime<Local>) -> String {
    format!(
        "{:<18} {:<6} {}",
        when(session.completed_at, now),
        session.kind,
        format_clock(session.duration_secs)
    )
}

/// "Today 09:00", "Yesterday 18:30" or "Mar 3, 14:05".
fn when(completed_at: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = completed_at.with_timezone(&Local);
    let today = now.date_naive();
    if local.date_naive() == today {
        format!("Today {}", local.format("%H:%M"))
    } else if today.pred_opt() == Some(local.date_naive()) {
        format!("Yesterday {}", local.format("%H:%M"))
    } else {
        local.format("%b %-d, %H:%M").to_string()
    }
}
