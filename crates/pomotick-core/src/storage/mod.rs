mod config;
pub mod session_store;

pub use config::{
    Config, NotificationsConfig, TimerConfig, BREAK_MINUTES_RANGE, CONFIG_FILE,
    WORK_MINUTES_RANGE,
};
pub use session_store::{KindCounts, SessionRecord, SessionStore, StatsSnapshot, MAX_SESSIONS};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `POMOTICK_DATA_DIR` wins when set; otherwise `~/.config/pomotick`, or
/// `~/.config/pomotick-dev` with `POMOTICK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POMOTICK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotick-dev")
            } else {
                base_dir.join("pomotick")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
