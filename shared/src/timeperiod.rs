use chrono::{DateTime, Duration, Utc};
use strum::{Display, EnumString};

/// Trailing recency window used by leaderboard and trending queries.
#[derive(Debug, PartialEq, Eq, Clone, Copy, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum TimePeriod {
    #[strum(to_string = "day")]
    Day,
    #[strum(to_string = "week")]
    Week,
    #[strum(to_string = "month")]
    Month,
    #[strum(to_string = "all", serialize = "all-time")]
    AllTime,
}

impl TimePeriod {
    /// Parses a query value, falling back to `default` for missing or unknown values.
    pub fn parse_or(value: Option<&str>, default: TimePeriod) -> Self {
        value
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            TimePeriod::Day => Some(Duration::days(1)),
            TimePeriod::Week => Some(Duration::days(7)),
            TimePeriod::Month => Some(Duration::days(30)),
            TimePeriod::AllTime => None,
        }
    }

    /// Oldest instant still inside the window, `None` for all-time.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|duration| now - duration)
    }
}

/// Whether `timestamp` falls inside a window starting at `since`.
pub fn within_window(timestamp: DateTime<Utc>, since: Option<DateTime<Utc>>) -> bool {
    since.map_or(true, |since| timestamp >= since)
}
