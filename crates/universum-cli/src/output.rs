//! Formatted output helpers for CLI commands and reports.

use std::time::Duration;

/// Underlines a title with box-drawing characters.
#[must_use]
pub fn heading(title: &str) -> String {
    format!("{title}\n{}", "\u{2550}".repeat(title.chars().count()))
}

/// Formats a duration as `1h 02m 03s`, `2m 03s` or `3.4s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Joins names for display, or `-` when there are none.
#[must_use]
pub fn list_or_dash<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() { "-".to_owned() } else { joined }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_underlines_every_char() {
        assert_eq!(heading("Plan"), "Plan\n\u{2550}\u{2550}\u{2550}\u{2550}");
    }

    #[test]
    fn format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(3400)), "3.4s");
    }

    #[test]
    fn format_duration_minutes() {
        assert_eq!(format_duration(Duration::from_secs(123)), "2m 03s");
    }

    #[test]
    fn format_duration_hours() {
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }

    #[test]
    fn list_or_dash_handles_empty() {
        assert_eq!(list_or_dash(Vec::<String>::new()), "-");
        assert_eq!(list_or_dash(["a", "b"]), "a, b");
    }
}
