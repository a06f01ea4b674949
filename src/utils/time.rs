use chrono::NaiveDate;

/// This is the standard way of converting a date to a string in deptime. Stored state and
/// rendered boards both use it.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Renders seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;
    format!("{hours:02}:{minutes:02}:{remaining:02}")
}
