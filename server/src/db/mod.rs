use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocket::{
    fairing::{self, AdHoc},
    Build, Rocket,
};
use rocket_db_pools::Database;
use shared::{
    username_key, Comparison, LeaderboardEntry, LeaderboardQuery, LeaderboardRow,
    LeaderboardStatistics, TrendingQuery, TrendingUser,
};
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use tracing::instrument;

pub mod memory;
pub mod types;

use types::{LeaderboardRecord, StatisticsRecord, TrendingRecord};

/// Persistence for comparisons and the per-user leaderboard.
#[async_trait]
pub trait BattleStore: Send + Sync {
    async fn save_comparison(&self, comparison: &Comparison) -> anyhow::Result<()>;

    async fn get_comparison(&self, id: &str) -> anyhow::Result<Option<Comparison>>;

    /// Comparisons involving `username`, newest first.
    async fn user_history(
        &self,
        username: &str,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<Comparison>>;

    /// Folds one battle result into the user's entry. Atomic per username.
    async fn record_result(
        &self,
        username: &str,
        score: i64,
        won: bool,
    ) -> anyhow::Result<LeaderboardEntry>;

    async fn leaderboard(&self, query: LeaderboardQuery) -> anyhow::Result<Vec<LeaderboardRow>>;

    async fn user_stats(&self, username: &str) -> anyhow::Result<Option<LeaderboardRow>>;

    async fn trending(&self, query: TrendingQuery) -> anyhow::Result<Vec<TrendingUser>>;

    async fn statistics(&self) -> anyhow::Result<LeaderboardStatistics>;
}

pub type Store = Arc<dyn BattleStore>;

#[derive(Database, Clone, Debug)]
#[database("github-battle")]
pub struct DB(PgPool);

const LEADERBOARD_COLUMNS: &str = "username, last_score, highest_score, total_comparisons, wins, \
     losses, average_score, first_seen, last_updated";

/// Postgres rejects negative `LIMIT`/`OFFSET`, so oversized values saturate.
pub(crate) fn sql_limit(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl DB {
    async fn lock_entry(
        tx: &mut Transaction<'static, Postgres>,
        key: &str,
    ) -> anyhow::Result<Option<LeaderboardEntry>> {
        let record = sqlx::query_as::<_, LeaderboardRecord>(&format!(
            "SELECT {LEADERBOARD_COLUMNS} FROM leaderboard WHERE login_key = $1 FOR UPDATE"
        ))
        .bind(key)
        .fetch_optional(tx.as_mut())
        .await?;

        Ok(record.map(Into::into))
    }

    /// Returns false when a concurrent transaction inserted the row first.
    async fn insert_entry(
        tx: &mut Transaction<'static, Postgres>,
        key: &str,
        entry: &LeaderboardEntry,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO leaderboard (login_key, username, last_score, highest_score,
                total_comparisons, wins, losses, average_score, first_seen, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (login_key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(&entry.username)
        .bind(entry.last_score)
        .bind(entry.highest_score)
        .bind(entry.total_comparisons as i64)
        .bind(entry.wins as i64)
        .bind(entry.losses as i64)
        .bind(entry.average_score)
        .bind(entry.first_seen)
        .bind(entry.last_updated)
        .execute(tx.as_mut())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_entry(
        tx: &mut Transaction<'static, Postgres>,
        key: &str,
        entry: &LeaderboardEntry,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE leaderboard
            SET last_score = $2,
                highest_score = $3,
                total_comparisons = $4,
                wins = $5,
                losses = $6,
                average_score = $7,
                last_updated = $8
            WHERE login_key = $1
            "#,
        )
        .bind(key)
        .bind(entry.last_score)
        .bind(entry.highest_score)
        .bind(entry.total_comparisons as i64)
        .bind(entry.wins as i64)
        .bind(entry.losses as i64)
        .bind(entry.average_score)
        .bind(entry.last_updated)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    async fn apply_result(
        tx: &mut Transaction<'static, Postgres>,
        key: &str,
        mut entry: LeaderboardEntry,
        score: i64,
        won: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LeaderboardEntry> {
        entry.record(score, won, now);
        Self::update_entry(tx, key, &entry).await?;
        Ok(entry)
    }
}

#[async_trait]
impl BattleStore for DB {
    #[instrument(skip_all, fields(id = %comparison.comparison_id))]
    async fn save_comparison(&self, comparison: &Comparison) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comparisons (id, user1, user2, user1_key, user2_key, winner, created_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&comparison.comparison_id)
        .bind(comparison.user1.username())
        .bind(comparison.user2.username())
        .bind(username_key(comparison.user1.username()))
        .bind(username_key(comparison.user2.username()))
        .bind(&comparison.winner)
        .bind(comparison.timestamp)
        .bind(Json(comparison))
        .execute(&self.0)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_comparison(&self, id: &str) -> anyhow::Result<Option<Comparison>> {
        let document = sqlx::query_scalar::<_, Json<Comparison>>(
            "SELECT document FROM comparisons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.0)
        .await?;

        Ok(document.map(|Json(comparison)| comparison))
    }

    #[instrument(skip(self))]
    async fn user_history(
        &self,
        username: &str,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<Comparison>> {
        let documents = sqlx::query_scalar::<_, Json<Comparison>>(
            r#"
            SELECT document
            FROM comparisons
            WHERE user1_key = $1 OR user2_key = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(username_key(username))
        .bind(sql_limit(limit))
        .bind(sql_limit(offset))
        .fetch_all(&self.0)
        .await?;

        Ok(documents.into_iter().map(|Json(comparison)| comparison).collect())
    }

    #[instrument(skip(self))]
    async fn record_result(
        &self,
        username: &str,
        score: i64,
        won: bool,
    ) -> anyhow::Result<LeaderboardEntry> {
        let key = username_key(username);
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let entry = match Self::lock_entry(&mut tx, &key).await? {
            Some(entry) => Self::apply_result(&mut tx, &key, entry, score, won, now).await?,
            None => {
                let entry = LeaderboardEntry::new(username, score, won, now);
                if Self::insert_entry(&mut tx, &key, &entry).await? {
                    entry
                } else {
                    // Lost the insert race, the row is committed now.
                    let entry = Self::lock_entry(&mut tx, &key)
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("Leaderboard entry for {key} is missing"))?;
                    Self::apply_result(&mut tx, &key, entry, score, won, now).await?
                }
            }
        };

        tx.commit().await?;
        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, query: LeaderboardQuery) -> anyhow::Result<Vec<LeaderboardRow>> {
        let records = sqlx::query_as::<_, LeaderboardRecord>(&format!(
            r#"
            SELECT {LEADERBOARD_COLUMNS}
            FROM leaderboard
            WHERE $1::timestamptz IS NULL OR last_updated >= $1
            ORDER BY {} DESC, login_key ASC
            LIMIT $2
            "#,
            query.sort.column()
        ))
        .bind(query.since)
        .bind(sql_limit(query.limit))
        .fetch_all(&self.0)
        .await?;

        Ok(LeaderboardRow::ranked(records.into_iter().map(Into::into)))
    }

    #[instrument(skip(self))]
    async fn user_stats(&self, username: &str) -> anyhow::Result<Option<LeaderboardRow>> {
        let record = sqlx::query_as::<_, LeaderboardRecord>(&format!(
            "SELECT {LEADERBOARD_COLUMNS} FROM leaderboard WHERE login_key = $1"
        ))
        .bind(username_key(username))
        .fetch_optional(&self.0)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };
        let higher = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leaderboard WHERE highest_score > $1",
        )
        .bind(record.highest_score)
        .fetch_one(&self.0)
        .await?;

        Ok(Some(LeaderboardRow::new(
            higher.max(0) as u64 + 1,
            record.into(),
        )))
    }

    #[instrument(skip(self))]
    async fn trending(&self, query: TrendingQuery) -> anyhow::Result<Vec<TrendingUser>> {
        let records = sqlx::query_as::<_, TrendingRecord>(
            r#"
            SELECT MIN(username) AS username, COUNT(*) AS comparisons
            FROM (
                SELECT user1 AS username, user1_key AS login_key
                FROM comparisons
                WHERE $1::timestamptz IS NULL OR created_at >= $1
                UNION ALL
                SELECT user2 AS username, user2_key AS login_key
                FROM comparisons
                WHERE $1::timestamptz IS NULL OR created_at >= $1
            ) appearances
            GROUP BY login_key
            ORDER BY comparisons DESC, login_key ASC
            LIMIT $2
            "#,
        )
        .bind(query.since)
        .bind(sql_limit(query.limit))
        .fetch_all(&self.0)
        .await?;

        Ok(TrendingRecord::ranked(records))
    }

    #[instrument(skip(self))]
    async fn statistics(&self) -> anyhow::Result<LeaderboardStatistics> {
        let record = sqlx::query_as::<_, StatisticsRecord>(
            r#"
            SELECT COUNT(*) AS total_users,
                AVG(average_score) AS average_score,
                MAX(highest_score) AS top_score
            FROM leaderboard
            "#,
        )
        .fetch_one(&self.0)
        .await?;
        let comparisons = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comparisons")
            .fetch_one(&self.0)
            .await?;

        Ok(record.with_comparisons(comparisons))
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                rocket::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

async fn manage_store(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => {
            let store: Store = Arc::new(db.clone());
            Ok(rocket.manage(store))
        }
        None => Err(rocket),
    }
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
            .attach(AdHoc::try_on_ignite("Battle store", manage_store))
    })
}
