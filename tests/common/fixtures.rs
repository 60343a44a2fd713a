//! Test fixtures for spendwatch integration tests.

use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use chrono::Duration;
use spendwatch::core::period::FixedClock;
use spendwatch::core::pricing::PricingTable;
use spendwatch::core::provider::Provider;
use spendwatch::core::tracker::{TrackerSettings, UsageRequest, UsageTracker};
use spendwatch::storage::{MemoryStore, SqliteStore, UsageStore};

/// Environment variables the binary reads; cleared for every CLI test.
const SPENDWATCH_ENV: &[&str] = &[
    "SPENDWATCH_CONFIG",
    "SPENDWATCH_BIND",
    "SPENDWATCH_STORAGE",
    "SPENDWATCH_DB_PATH",
    "SPENDWATCH_BUDGET_OPENAI",
    "SPENDWATCH_BUDGET_GEMINI",
    "SPENDWATCH_WARNING_THRESHOLD",
    "SPENDWATCH_CRITICAL_THRESHOLD",
    "SPENDWATCH_CRON_SECRET",
    "SPENDWATCH_LOG",
    "SPENDWATCH_LOG_FORMAT",
    "SPENDWATCH_LOG_FILE",
    "SPENDWATCH_PRETTY",
    "RUST_LOG",
];

/// Clock pinned to mid-October 2026.
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at(2026, 10, 14))
}

pub fn tracker_over(store: Arc<dyn UsageStore>, clock: Arc<FixedClock>) -> UsageTracker {
    tracker_with(store, clock, TrackerSettings::default())
}

pub fn tracker_with(
    store: Arc<dyn UsageStore>,
    clock: Arc<FixedClock>,
    settings: TrackerSettings,
) -> UsageTracker {
    UsageTracker::new(store, PricingTable::builtin(), settings).with_clock(clock)
}

pub fn memory_tracker(clock: Arc<FixedClock>) -> UsageTracker {
    tracker_over(Arc::new(MemoryStore::new()), clock)
}

/// Tracker over a fresh `SQLite` file inside `dir`.
pub fn sqlite_tracker(dir: &Path, clock: Arc<FixedClock>) -> UsageTracker {
    let store = SqliteStore::open(&dir.join("usage.sqlite")).expect("open sqlite store");
    tracker_over(Arc::new(store), clock)
}

/// Record `tokens` of gpt-4 input (3 cents per thousand).
pub fn track_gpt4(tracker: &UsageTracker, tokens: u64) {
    tracker
        .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", tokens))
        .expect("track usage");
}

pub fn days(n: i64) -> Duration {
    Duration::days(n)
}

/// The binary with a clean environment rooted in `dir`.
///
/// The config path points at `dir/config.toml` (absent unless the test
/// writes it) and the database lives at `dir/usage.sqlite`.
pub fn spendwatch_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spendwatch").expect("binary built");
    for key in SPENDWATCH_ENV {
        cmd.env_remove(key);
    }
    cmd.env("SPENDWATCH_CONFIG", dir.join("config.toml"))
        .env("SPENDWATCH_DB_PATH", dir.join("usage.sqlite"))
        .env("NO_COLOR", "1");
    cmd
}
