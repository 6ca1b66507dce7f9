use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{username_key, within_window, GithubHandle, TimePeriod};

/// Running aggregate of one username's battle history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: GithubHandle,
    pub last_score: i64,
    pub highest_score: i64,
    pub total_comparisons: u64,
    pub wins: u64,
    pub losses: u64,
    pub average_score: f64,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(username: impl Into<GithubHandle>, score: i64, won: bool, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            last_score: score,
            highest_score: score,
            total_comparisons: 1,
            wins: won as u64,
            losses: !won as u64,
            average_score: score as f64,
            first_seen: now,
            last_updated: now,
        }
    }

    /// Folds one more battle result into the aggregate.
    pub fn record(&mut self, score: i64, won: bool, now: DateTime<Utc>) {
        let previous = self.total_comparisons as f64;
        self.average_score = (self.average_score * previous + score as f64) / (previous + 1.0);
        self.last_score = score;
        self.highest_score = self.highest_score.max(score);
        self.total_comparisons += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.last_updated = now;
    }

    /// Percentage of battles won, rounded.
    pub fn win_rate(&self) -> u64 {
        if self.total_comparisons == 0 {
            return 0;
        }
        (100.0 * self.wins as f64 / self.total_comparisons as f64).round() as u64
    }

    pub fn key(&self) -> String {
        username_key(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: u64,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    pub win_rate: u64,
}

impl LeaderboardRow {
    pub fn new(rank: u64, entry: LeaderboardEntry) -> Self {
        Self {
            rank,
            win_rate: entry.win_rate(),
            entry,
        }
    }

    /// Assigns 1-based ranks to already ordered entries.
    pub fn ranked(entries: impl IntoIterator<Item = LeaderboardEntry>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Self::new(index as u64 + 1, entry))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum LeaderboardSort {
    #[default]
    #[strum(to_string = "highestScore", serialize = "score")]
    HighestScore,
    #[strum(to_string = "lastScore")]
    LastScore,
    #[strum(to_string = "totalComparisons", serialize = "comparisons")]
    TotalComparisons,
    #[strum(to_string = "wins")]
    Wins,
    #[strum(to_string = "averageScore")]
    AverageScore,
}

impl LeaderboardSort {
    /// Unknown sort fields fall back to the highest score.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Column name in the `leaderboard` table.
    pub fn column(&self) -> &'static str {
        match self {
            LeaderboardSort::HighestScore => "highest_score",
            LeaderboardSort::LastScore => "last_score",
            LeaderboardSort::TotalComparisons => "total_comparisons",
            LeaderboardSort::Wins => "wins",
            LeaderboardSort::AverageScore => "average_score",
        }
    }

    /// Descending by the sort field, ties broken by username.
    pub fn ordering(&self, a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
        let by_field = match self {
            LeaderboardSort::HighestScore => b.highest_score.cmp(&a.highest_score),
            LeaderboardSort::LastScore => b.last_score.cmp(&a.last_score),
            LeaderboardSort::TotalComparisons => b.total_comparisons.cmp(&a.total_comparisons),
            LeaderboardSort::Wins => b.wins.cmp(&a.wins),
            LeaderboardSort::AverageScore => b.average_score.total_cmp(&a.average_score),
        };
        by_field.then_with(|| a.key().cmp(&b.key()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardQuery {
    pub since: Option<DateTime<Utc>>,
    pub sort: LeaderboardSort,
    pub limit: u64,
}

impl LeaderboardQuery {
    pub fn new(period: TimePeriod, sort: LeaderboardSort, limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            since: period.window_start(now),
            sort,
            limit,
        }
    }

    /// Filters, sorts, truncates and ranks a full set of entries.
    pub fn apply<'a>(&self, entries: impl IntoIterator<Item = &'a LeaderboardEntry>) -> Vec<LeaderboardRow> {
        LeaderboardRow::ranked(
            entries
                .into_iter()
                .filter(|entry| within_window(entry.last_updated, self.since))
                .sorted_by(|a, b| self.sort.ordering(a, b))
                .take(self.limit as usize)
                .cloned(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrendingUser {
    pub rank: u64,
    pub username: GithubHandle,
    pub comparisons: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendingQuery {
    pub since: Option<DateTime<Utc>>,
    pub limit: u64,
}

impl TrendingQuery {
    pub fn new(period: TimePeriod, limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            since: period.window_start(now),
            limit,
        }
    }
}

/// Counts how often each username appears, most frequent first.
///
/// Logins are grouped case-insensitively and reported under their smallest
/// spelling, the same way the SQL store aggregates them.
pub fn count_appearances<'a>(
    usernames: impl IntoIterator<Item = &'a str>,
    limit: u64,
) -> Vec<TrendingUser> {
    usernames
        .into_iter()
        .into_grouping_map_by(|username| username_key(username))
        .fold(("", 0u64), |(shown, count), _key, username| match count {
            0 => (username, 1),
            _ => (shown.min(username), count + 1),
        })
        .into_iter()
        .sorted_by(|(a_key, (_, a_count)), (b_key, (_, b_count))| {
            b_count.cmp(a_count).then_with(|| a_key.cmp(b_key))
        })
        .take(limit as usize)
        .enumerate()
        .map(|(index, (_, (username, count)))| TrendingUser {
            rank: index as u64 + 1,
            username: username.to_owned(),
            comparisons: count,
        })
        .collect()
}

/// 1 + number of entries with a strictly higher best score.
pub fn user_rank<'a>(entry: &LeaderboardEntry, all: impl IntoIterator<Item = &'a LeaderboardEntry>) -> u64 {
    1 + all
        .into_iter()
        .filter(|other| other.highest_score > entry.highest_score)
        .count() as u64
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStatistics {
    pub total_users: u64,
    pub total_comparisons: u64,
    pub average_score: i64,
    pub top_score: i64,
}

impl LeaderboardStatistics {
    pub fn summarize<'a>(
        entries: impl IntoIterator<Item = &'a LeaderboardEntry>,
        total_comparisons: u64,
    ) -> Self {
        let (total_users, score_sum, top_score) = entries.into_iter().fold(
            (0u64, 0f64, 0i64),
            |(users, sum, top), entry| {
                (users + 1, sum + entry.average_score, top.max(entry.highest_score))
            },
        );

        Self {
            total_users,
            total_comparisons,
            average_score: if total_users > 0 {
                (score_sum / total_users as f64).round() as i64
            } else {
                0
            },
            top_score,
        }
    }
}
