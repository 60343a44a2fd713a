//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Format a relative time (past or future) against the wall clock.
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>) -> String {
    format_relative_time_from(target, Utc::now())
}

/// Format `target` relative to `now`.
#[must_use]
pub fn format_relative_time_from(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(target);

    if duration.num_seconds().abs() < 60 {
        return "just now".to_string();
    }

    let minutes = duration.num_minutes().abs();
    let hours = duration.num_hours().abs();
    let days = duration.num_days().abs();

    let suffix = if duration.num_seconds() > 0 {
        "ago"
    } else {
        "from now"
    };

    if days > 0 {
        format!("{days} day{} {suffix}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("{hours} hour{} {suffix}", if hours == 1 { "" } else { "s" })
    } else {
        format!(
            "{minutes} minute{} {suffix}",
            if minutes == 1 { "" } else { "s" }
        )
    }
}
