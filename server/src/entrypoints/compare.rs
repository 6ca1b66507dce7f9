use rocket::{fairing::AdHoc, serde::json::Json, State};
use shared::{Comparison, ScoreWeights};

use super::types::{CompareRequest, ErrorResponse, HistoryResponse};
use crate::{battle::BattleService, db::Store, error::BattleError};

const DEFAULT_HISTORY_LIMIT: u64 = 10;

#[utoipa::path(post, path = "/api/compare", request_body = CompareRequest, responses(
    (status = 200, description = "Battle result of the two users"),
    (status = 400, description = "Missing or identical usernames", body = ErrorResponse),
    (status = 404, description = "GitHub user not found", body = ErrorResponse),
    (status = 429, description = "GitHub API rate limit exceeded", body = ErrorResponse)
))]
#[post("/", data = "<request>")]
async fn compare_users(
    battle: &State<BattleService>,
    request: Option<Json<CompareRequest>>,
) -> Result<Json<Comparison>, BattleError> {
    let request = request.map(Json::into_inner).unwrap_or_default();
    battle
        .compare(request.username1.as_deref(), request.username2.as_deref())
        .await
        .map(Json)
}

#[utoipa::path(context_path = "/api/compare", responses(
    (status = 200, description = "Active score weights")
))]
#[get("/weights")]
async fn get_weights(battle: &State<BattleService>) -> Json<ScoreWeights> {
    Json(*battle.engine().weights())
}

#[utoipa::path(context_path = "/api/compare", responses(
    (status = 200, description = "Stored comparison"),
    (status = 404, description = "Comparison not found", body = ErrorResponse)
))]
#[get("/<comparison_id>")]
async fn get_comparison(
    store: &State<Store>,
    comparison_id: &str,
) -> Result<Json<Comparison>, BattleError> {
    match store.get_comparison(comparison_id).await {
        Ok(Some(comparison)) => Ok(Json(comparison)),
        Ok(None) => Err(BattleError::not_found("Comparison not found")),
        Err(e) => Err(BattleError::unknown("Failed to retrieve comparison", e)),
    }
}

#[utoipa::path(context_path = "/api/compare", responses(
    (status = 200, description = "Comparisons the user took part in, newest first", body = HistoryResponse)
))]
#[get("/user/<username>/history?<limit>&<offset>")]
async fn get_user_history(
    store: &State<Store>,
    username: &str,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Json<HistoryResponse>, BattleError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = offset.unwrap_or(0);
    let history = store
        .user_history(username, limit, offset)
        .await
        .map_err(|e| BattleError::unknown("Failed to retrieve user history", e))?;

    Ok(Json(HistoryResponse::new(
        username.to_owned(),
        history,
        limit,
        offset,
    )))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing compare entrypoints", |rocket| async {
        rocket.mount(
            "/api/compare",
            rocket::routes![compare_users, get_weights, get_comparison, get_user_history],
        )
    })
}
