#[macro_use]
extern crate rocket;

use std::sync::Arc;

use github_battle_server::config::{self, AppConfig};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_prometheus::PrometheusMetrics;
use shared::github::GithubClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

fn cors(config: &AppConfig) -> Result<rocket_cors::Cors, rocket_cors::Error> {
    let allowed_origins = match config.origins() {
        Some(origins) => AllowedOrigins::some_exact(&origins),
        None => AllowedOrigins::all(),
    };

    CorsOptions {
        allowed_origins,
        ..Default::default()
    }
    .to_cors()
}

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let config = AppConfig::from_env().expect("Failed to load environment variables");
    let weights = config::weights_from_env().expect("Failed to load score weights");
    let github =
        GithubClient::new(config.github_token.clone()).expect("Failed to create GitHub client");
    let cors = cors(&config).expect("Failed to create CORS fairing");
    let prometheus = PrometheusMetrics::new();

    let span = tracing::info_span!("Starting Rocket");
    let _enter = span.enter();

    let storage = github_battle_server::storage(&config);
    github_battle_server::build(config, weights, Arc::new(github), storage)
        .attach(cors)
        .attach(prometheus.clone())
        .mount("/metrics", prometheus)
}
