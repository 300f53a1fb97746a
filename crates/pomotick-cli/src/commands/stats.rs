use clap::Subcommand;
use pomotick_core::SessionStore;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's counts
    Today,
    /// All-time counts
    All,
}

/// Print stats as JSON; both partitions when no action is given.
pub fn run(action: Option<StatsAction>) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;
    let stats = store.stats()?;

    let json = match action {
        None => serde_json::to_string_pretty(&stats)?,
        Some(StatsAction::Today) => serde_json::to_string_pretty(&stats.today)?,
        Some(StatsAction::All) => serde_json::to_string_pretty(&stats.total)?,
    };
    println!("{json}");
    Ok(())
}
