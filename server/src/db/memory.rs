use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use rocket::{fairing::AdHoc, tokio::sync::RwLock};
use shared::{
    count_appearances, user_rank, username_key, within_window, Comparison, LeaderboardEntry,
    LeaderboardQuery, LeaderboardRow, LeaderboardStatistics, TrendingQuery, TrendingUser,
};

use super::{BattleStore, Store};

#[derive(Default)]
struct State {
    comparisons: HashMap<String, Comparison>,
    leaderboard: HashMap<String, LeaderboardEntry>,
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BattleStore for MemoryStore {
    async fn save_comparison(&self, comparison: &Comparison) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .comparisons
            .entry(comparison.comparison_id.clone())
            .or_insert_with(|| comparison.clone());
        Ok(())
    }

    async fn get_comparison(&self, id: &str) -> anyhow::Result<Option<Comparison>> {
        Ok(self.state.read().await.comparisons.get(id).cloned())
    }

    async fn user_history(
        &self,
        username: &str,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<Comparison>> {
        let state = self.state.read().await;
        Ok(state
            .comparisons
            .values()
            .filter(|comparison| comparison.involves(username))
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record_result(
        &self,
        username: &str,
        score: i64,
        won: bool,
    ) -> anyhow::Result<LeaderboardEntry> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let entry = state
            .leaderboard
            .entry(username_key(username))
            .and_modify(|entry| entry.record(score, won, now))
            .or_insert_with(|| LeaderboardEntry::new(username, score, won, now));
        Ok(entry.clone())
    }

    async fn leaderboard(&self, query: LeaderboardQuery) -> anyhow::Result<Vec<LeaderboardRow>> {
        Ok(query.apply(self.state.read().await.leaderboard.values()))
    }

    async fn user_stats(&self, username: &str) -> anyhow::Result<Option<LeaderboardRow>> {
        let state = self.state.read().await;
        Ok(state
            .leaderboard
            .get(&username_key(username))
            .map(|entry| {
                LeaderboardRow::new(user_rank(entry, state.leaderboard.values()), entry.clone())
            }))
    }

    async fn trending(&self, query: TrendingQuery) -> anyhow::Result<Vec<TrendingUser>> {
        let state = self.state.read().await;
        let usernames = state
            .comparisons
            .values()
            .filter(|comparison| within_window(comparison.timestamp, query.since))
            .flat_map(|comparison| comparison.participants())
            .map(|bundle| bundle.username());

        Ok(count_appearances(usernames, query.limit))
    }

    async fn statistics(&self) -> anyhow::Result<LeaderboardStatistics> {
        let state = self.state.read().await;
        Ok(LeaderboardStatistics::summarize(
            state.leaderboard.values(),
            state.comparisons.len() as u64,
        ))
    }
}

pub fn stage(store: Arc<MemoryStore>) -> AdHoc {
    AdHoc::on_ignite("In-memory store", |rocket| async move {
        let store: Store = store;
        rocket.manage(store)
    })
}
