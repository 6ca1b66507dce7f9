use chrono::Utc;
use rocket::{fairing::AdHoc, serde::json::Json, State};
use shared::{
    LeaderboardQuery, LeaderboardRow, LeaderboardSort, LeaderboardStatistics, TimePeriod,
    TrendingQuery,
};
use utoipa::IntoParams;

use super::types::{
    ErrorResponse, LeaderboardMeta, LeaderboardResponse, TrendingMeta, TrendingResponse,
};
use crate::{db::Store, error::BattleError};

const DEFAULT_LEADERBOARD_LIMIT: u64 = 50;
const DEFAULT_TRENDING_LIMIT: u64 = 20;

#[derive(Debug, Default, FromForm, IntoParams)]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct LeaderboardParams {
    /// Maximum number of rows, 50 by default.
    limit: Option<u64>,
    /// One of `day`, `week`, `month` or `all`.
    period: Option<String>,
    /// One of `highestScore`, `lastScore`, `totalComparisons`, `wins` or `averageScore`.
    #[field(name = "sortBy")]
    sort_by: Option<String>,
}

#[utoipa::path(get, path = "/api/leaderboard", params(LeaderboardParams), responses(
    (status = 200, description = "Ranked leaderboard", body = LeaderboardResponse)
))]
#[get("/?<params..>")]
async fn get_leaderboard(
    store: &State<Store>,
    params: LeaderboardParams,
) -> Result<Json<LeaderboardResponse>, BattleError> {
    let now = Utc::now();
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let period = TimePeriod::parse_or(params.period.as_deref(), TimePeriod::AllTime);
    let sort = LeaderboardSort::parse_or_default(params.sort_by.as_deref());

    let leaderboard = store
        .leaderboard(LeaderboardQuery::new(period, sort, limit, now))
        .await
        .map_err(|e| BattleError::unknown("Failed to retrieve leaderboard", e))?;

    Ok(Json(LeaderboardResponse {
        leaderboard,
        meta: LeaderboardMeta {
            period: period.to_string(),
            sort_by: sort.to_string(),
            limit,
            generated_at: now,
        },
    }))
}

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Leaderboard entry of the user with its rank"),
    (status = 404, description = "User not found in leaderboard", body = ErrorResponse)
))]
#[get("/user/<username>")]
async fn get_user_stats(
    store: &State<Store>,
    username: &str,
) -> Result<Json<LeaderboardRow>, BattleError> {
    match store.user_stats(username).await {
        Ok(Some(row)) => Ok(Json(row)),
        Ok(None) => Err(BattleError::not_found("User not found in leaderboard")),
        Err(e) => Err(BattleError::unknown(
            "Failed to retrieve user leaderboard stats",
            e,
        )),
    }
}

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Most compared users in the period", body = TrendingResponse)
))]
#[get("/trending?<limit>&<period>")]
async fn get_trending(
    store: &State<Store>,
    limit: Option<u64>,
    period: Option<&str>,
) -> Result<Json<TrendingResponse>, BattleError> {
    let now = Utc::now();
    let limit = limit.unwrap_or(DEFAULT_TRENDING_LIMIT);
    let period = match TimePeriod::parse_or(period, TimePeriod::Week) {
        TimePeriod::AllTime => TimePeriod::Week,
        period => period,
    };

    let trending = store
        .trending(TrendingQuery::new(period, limit, now))
        .await
        .map_err(|e| BattleError::unknown("Failed to retrieve trending users", e))?;

    Ok(Json(TrendingResponse {
        trending,
        meta: TrendingMeta {
            period: period.to_string(),
            limit,
            generated_at: now,
        },
    }))
}

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Global leaderboard statistics")
))]
#[get("/stats")]
async fn get_statistics(store: &State<Store>) -> Result<Json<LeaderboardStatistics>, BattleError> {
    store
        .statistics()
        .await
        .map(Json)
        .map_err(|e| BattleError::unknown("Failed to retrieve leaderboard statistics", e))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing leaderboard entrypoints", |rocket| async {
        rocket.mount(
            "/api/leaderboard",
            rocket::routes![get_leaderboard, get_user_stats, get_trending, get_statistics],
        )
    })
}
