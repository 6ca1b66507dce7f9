use chrono::{DateTime, Duration, Utc};
use serde::{de::IgnoredAny, Deserialize, Serialize};

/// Only events newer than this many days count as contributions.
pub const CONTRIBUTION_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    PushEvent,
    PullRequestEvent,
    IssuesEvent,
    PullRequestReviewEvent,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventPayload {
    #[serde(default)]
    pub commits: Option<Vec<IgnoredAny>>,
}

/// One entry of the `/users/{username}/events` feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(kind: EventKind, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            created_at,
            payload: EventPayload::default(),
        }
    }

    pub fn push(created_at: DateTime<Utc>, commits: usize) -> Self {
        Self {
            kind: EventKind::PushEvent,
            created_at,
            payload: EventPayload {
                commits: Some(vec![IgnoredAny; commits]),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContributionStats {
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
}

impl ContributionStats {
    pub fn from_events(events: &[Event], now: DateTime<Utc>) -> Self {
        let since = now - Duration::days(CONTRIBUTION_WINDOW_DAYS);

        events
            .iter()
            .filter(|event| event.created_at >= since)
            .fold(Self::default(), |mut stats, event| {
                match event.kind {
                    EventKind::PushEvent => {
                        stats.commits += event
                            .payload
                            .commits
                            .as_ref()
                            .map(|commits| commits.len() as u64)
                            .unwrap_or_default()
                    }
                    EventKind::PullRequestEvent => stats.pull_requests += 1,
                    EventKind::IssuesEvent => stats.issues += 1,
                    EventKind::PullRequestReviewEvent => stats.reviews += 1,
                    EventKind::Other => {}
                }
                stats
            })
    }

    pub fn total(&self) -> u64 {
        self.commits + self.pull_requests + self.issues + self.reviews
    }
}
