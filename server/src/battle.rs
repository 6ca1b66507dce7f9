use std::sync::Arc;

use chrono::Utc;
use shared::{compare, username_key, Comparison, ProfileSource, ScoreEngine};
use tracing::{info, instrument};

use crate::{error::BattleError, persistence::PersistenceQueue};

const MAX_LOGIN_LENGTH: usize = 39;

/// Runs one battle: fetch, score, decide, and queue the result for storage.
pub struct BattleService {
    source: Arc<dyn ProfileSource>,
    engine: ScoreEngine,
    queue: PersistenceQueue,
}

impl BattleService {
    pub fn new(source: Arc<dyn ProfileSource>, engine: ScoreEngine, queue: PersistenceQueue) -> Self {
        Self {
            source,
            engine,
            queue,
        }
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    #[instrument(skip(self))]
    pub async fn compare(
        &self,
        username1: Option<&str>,
        username2: Option<&str>,
    ) -> Result<Comparison, BattleError> {
        let (username1, username2) = validate(username1, username2)?;
        info!("Comparing users: {username1} vs {username2}");

        let (first, second) = futures::try_join!(
            self.source.fetch_user_data(username1),
            self.source.fetch_user_data(username2)
        )?;

        let now = Utc::now();
        let outcome = compare(&self.engine, &first, &second, now);
        let comparison = Comparison::new(
            uuid::Uuid::new_v4().to_string(),
            first,
            second,
            outcome,
            now,
        );
        info!(
            "{} won by {} points",
            comparison.winner, comparison.score_difference
        );

        self.queue.submit(comparison.clone());
        Ok(comparison)
    }
}

/// GitHub logins are at most 39 alphanumerics or hyphens and never start with a hyphen.
pub(crate) fn is_valid_login(username: &str) -> bool {
    (1..=MAX_LOGIN_LENGTH).contains(&username.len())
        && !username.starts_with('-')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn validate<'a>(
    username1: Option<&'a str>,
    username2: Option<&'a str>,
) -> Result<(&'a str, &'a str), BattleError> {
    let non_empty = |username: Option<&'a str>| username.map(str::trim).filter(|u| !u.is_empty());
    let (Some(username1), Some(username2)) = (non_empty(username1), non_empty(username2)) else {
        return Err(BattleError::validation(
            "Both username1 and username2 are required",
        ));
    };
    if let Some(invalid) = [username1, username2]
        .into_iter()
        .find(|username| !is_valid_login(username))
    {
        return Err(BattleError::validation(format!(
            "Invalid GitHub username: {invalid}"
        )));
    }
    if username_key(username1) == username_key(username2) {
        return Err(BattleError::validation(
            "Cannot compare a user with themselves",
        ));
    }
    Ok((username1, username2))
}
