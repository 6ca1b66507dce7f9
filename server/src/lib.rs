#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::{fairing::AdHoc, Build, Rocket};
use shared::{ProfileSource, ScoreEngine, ScoreWeights};

pub mod battle;
pub mod config;
pub mod db;
pub mod entrypoints;
pub mod error;
pub mod persistence;


use battle::BattleService;
use config::AppConfig;
use db::memory::MemoryStore;
use persistence::PersistenceQueue;

/// Postgres unless the in-memory store is requested.
pub fn storage(config: &AppConfig) -> AdHoc {
    if config.in_memory_store {
        db::memory::stage(Arc::new(MemoryStore::new()))
    } else {
        db::stage()
    }
}

pub fn build(
    config: AppConfig,
    weights: ScoreWeights,
    source: Arc<dyn ProfileSource>,
    storage: AdHoc,
) -> Rocket<Build> {
    let (queue, worker) = PersistenceQueue::new();

    rocket::build()
        .manage(config)
        .manage(BattleService::new(source, ScoreEngine::new(weights), queue))
        .attach(storage)
        .attach(persistence::stage(worker))
        .attach(entrypoints::stage())
}
