use rocket::{fairing::AdHoc, serde::json::Json};
use utoipa::OpenApi;

pub mod compare;
pub mod leaderboards;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        compare::compare_users,
        compare::get_weights,
        compare::get_comparison,
        compare::get_user_history,
        leaderboards::get_leaderboard,
        leaderboards::get_user_stats,
        leaderboards::get_trending,
        leaderboards::get_statistics,
    ),
    components(schemas(
        types::CompareRequest,
        types::ErrorResponse,
        types::HistoryResponse,
        types::Pagination,
        types::LeaderboardResponse,
        types::LeaderboardMeta,
        types::TrendingResponse,
        types::TrendingMeta,
    )),
    tags((name = "github-battle", description = "Head-to-head GitHub profile battles")),
    info(title = "GitHub Battle API")
)]
pub struct ApiDoc;

#[get("/openapi.json")]
fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .attach(compare::stage())
            .attach(leaderboards::stage())
            .mount("/api-docs", rocket::routes![openapi])
    })
}
