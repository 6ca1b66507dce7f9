use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::{ContributionStats, Event, Repository, RepositoryStats, UserData, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("GitHub API rate limit exceeded")]
    RateLimited,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Upstream source of public GitHub data.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile(&self, username: &str) -> Result<UserProfile, FetchError>;

    async fn repositories(&self, username: &str) -> Result<Vec<Repository>, FetchError>;

    async fn events(&self, username: &str) -> Result<Vec<Event>, FetchError>;

    /// Fetches the three parts concurrently. Only a failed profile is fatal,
    /// repositories and events degrade to zeroed stats.
    async fn fetch_user_data(&self, username: &str) -> Result<UserData, FetchError> {
        info!("Fetching data for user: {username}");
        let (profile, repositories, events) = futures::join!(
            self.profile(username),
            self.repositories(username),
            self.events(username)
        );
        let now = Utc::now();

        let repositories = match repositories {
            Ok(repos) => RepositoryStats::from_repositories(&repos),
            Err(e) => {
                warn!("Failed to fetch repositories for {username}: {e}");
                RepositoryStats::default()
            }
        };
        let contributions = match events {
            Ok(events) => ContributionStats::from_events(&events, now),
            Err(e) => {
                warn!("Failed to fetch contributions for {username}: {e}");
                ContributionStats::default()
            }
        };

        Ok(UserData {
            profile: profile?,
            repositories,
            contributions,
            fetched_at: now,
        })
    }
}
