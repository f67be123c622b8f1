use chrono::{DateTime, Local, Utc};

use crate::models::names_match;

/// Remaining lifetime as `"{days}d HH:MM:SS"`. Negative values show as zero.
pub fn format_ttl(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    format!("{days}d {hours:02}:{minutes:02}:{secs:02}")
}

/// Posting time in local time, e.g. `"Tue Nov 14 2023 22:13"`.
pub fn format_posted(epoch_seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_seconds, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%a %b %d %Y %-H:%M")
            .to_string(),
        None => epoch_seconds.to_string(),
    }
}

/// "you" when the poster is the session user, otherwise the poster's name.
pub fn poster_label<'a>(poster: &'a str, session_user: Option<&str>) -> &'a str {
    match session_user {
        Some(user) if names_match(poster, user) => "you",
        _ => poster,
    }
}

/// Size of a staged file in whole KiB.
pub fn size_label(bytes: u64) -> String {
    format!("{} KiB", (bytes + 512) / 1024)
}
