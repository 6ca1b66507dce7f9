use chrono::{DateTime, Utc};
use shared::{LeaderboardEntry, LeaderboardStatistics, TrendingUser};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRecord {
    pub username: String,
    pub last_score: i64,
    pub highest_score: i64,
    pub total_comparisons: i64,
    pub wins: i64,
    pub losses: i64,
    pub average_score: f64,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<LeaderboardRecord> for LeaderboardEntry {
    fn from(record: LeaderboardRecord) -> Self {
        Self {
            username: record.username,
            last_score: record.last_score,
            highest_score: record.highest_score,
            total_comparisons: record.total_comparisons.max(0) as u64,
            wins: record.wins.max(0) as u64,
            losses: record.losses.max(0) as u64,
            average_score: record.average_score,
            first_seen: record.first_seen,
            last_updated: record.last_updated,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendingRecord {
    pub username: String,
    pub comparisons: i64,
}

impl TrendingRecord {
    pub fn ranked(records: Vec<TrendingRecord>) -> Vec<TrendingUser> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| TrendingUser {
                rank: index as u64 + 1,
                username: record.username,
                comparisons: record.comparisons.max(0) as u64,
            })
            .collect()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatisticsRecord {
    pub total_users: i64,
    pub average_score: Option<f64>,
    pub top_score: Option<i64>,
}

impl StatisticsRecord {
    pub fn with_comparisons(self, total_comparisons: i64) -> LeaderboardStatistics {
        LeaderboardStatistics {
            total_users: self.total_users.max(0) as u64,
            total_comparisons: total_comparisons.max(0) as u64,
            average_score: self.average_score.unwrap_or_default().round() as i64,
            top_score: self.top_score.unwrap_or_default(),
        }
    }
}
