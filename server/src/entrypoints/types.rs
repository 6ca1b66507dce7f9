use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Comparison, LeaderboardRow, TrendingUser};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct CompareRequest {
    pub username1: Option<String>,
    pub username2: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub username: String,
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<Comparison>,
    pub pagination: Pagination,
}

impl HistoryResponse {
    pub fn new(username: String, history: Vec<Comparison>, limit: u64, offset: u64) -> Self {
        let has_more = history.len() as u64 == limit;
        Self {
            username,
            history,
            pagination: Pagination {
                limit,
                offset,
                has_more,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardMeta {
    pub period: String,
    pub sort_by: String,
    pub limit: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    #[schema(value_type = Vec<Object>)]
    pub leaderboard: Vec<LeaderboardRow>,
    pub meta: LeaderboardMeta,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendingMeta {
    pub period: String,
    pub limit: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TrendingResponse {
    #[schema(value_type = Vec<Object>)]
    pub trending: Vec<TrendingUser>,
    pub meta: TrendingMeta,
}
