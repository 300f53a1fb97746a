//! Integration tests for the session log: cap, today/all-time stats and
//! clear-all.

use chrono::{Local, TimeZone, Utc};
use pomotick_core::storage::MAX_SESSIONS;
use pomotick_core::{CompletedSession, Config, KindCounts, SessionKind, SessionStore};

fn completed(kind: SessionKind, completed_at: chrono::DateTime<Utc>) -> CompletedSession {
    CompletedSession {
        kind,
        duration_secs: match kind {
            SessionKind::Work => 1500,
            SessionKind::Break => 300,
        },
        completed_at,
    }
}

fn today_at(hour: u32) -> chrono::DateTime<Utc> {
    let naive = Local::now()
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn work_and_break_today_show_in_today_stats() {
    let mut store = SessionStore::open_memory().unwrap();
    store
        .record(&completed(SessionKind::Work, today_at(9)))
        .unwrap();
    store
        .record(&completed(SessionKind::Break, today_at(10)))
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(
        stats.today,
        KindCounts {
            sessions: 2,
            work_sessions: 1,
            break_sessions: 1,
        }
    );
    assert_eq!(stats.total, stats.today);
    assert_eq!(store.list_today().unwrap().len(), 2);
}

#[test]
fn hundred_and_first_session_evicts_exactly_the_oldest() {
    let mut store = SessionStore::open_memory().unwrap();
    let base = Utc::now() - chrono::Duration::days(30);
    let mut ids = Vec::new();
    for i in 0..MAX_SESSIONS {
        let record = store
            .record(&completed(
                SessionKind::Work,
                base + chrono::Duration::minutes(i as i64),
            ))
            .unwrap();
        ids.push(record.id);
    }

    store
        .record(&completed(SessionKind::Break, Utc::now()))
        .unwrap();
    let remaining: Vec<i64> = store.list_all().unwrap().iter().map(|r| r.id).collect();

    assert_eq!(remaining.len(), MAX_SESSIONS);
    assert!(!remaining.contains(&ids[0]));
    assert_eq!(&remaining[..MAX_SESSIONS - 1], &ids[1..]);
}

#[test]
fn clear_all_wipes_history_and_settings_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join(pomotick_core::storage::CONFIG_FILE);
    let mut config = Config::default();
    config.set("timer.work_minutes", "45").unwrap();
    config.save_to(&config_path).unwrap();

    let mut store = SessionStore::open_at(&dir.path().join("pomotick.db"))
        .unwrap()
        .with_settings_path(config_path.clone());
    store.record(&completed(SessionKind::Work, Utc::now())).unwrap();
    store.clear_all().unwrap();

    assert!(store.list_all().unwrap().is_empty());
    assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
}
