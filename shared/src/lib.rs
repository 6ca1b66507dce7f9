use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod compare;
mod contributions;
mod leaderboard;
mod repos;
mod score;
mod source;
mod timeperiod;

#[cfg(feature = "github")]
pub mod github;

#[cfg(test)]
mod tests;

pub use compare::*;
pub use contributions::*;
pub use leaderboard::*;
pub use repos::*;
pub use score::*;
pub use source::*;
pub use timeperiod::*;

pub type GithubHandle = String;

/// Case-insensitive identity of a GitHub login.
pub fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: GithubHandle,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub public_gists: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: Option<String>,
}

impl UserProfile {
    /// Bare profile with zeroed counters, mostly useful for fakes.
    pub fn new(username: impl Into<GithubHandle>, created_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            name: None,
            avatar: None,
            bio: None,
            company: None,
            location: None,
            blog: None,
            followers: 0,
            following: 0,
            public_repos: 0,
            public_gists: 0,
            created_at,
            updated_at: created_at,
            html_url: None,
        }
    }

    pub fn username_key(&self) -> String {
        username_key(&self.username)
    }
}

/// Everything fetched for one user ahead of scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub profile: UserProfile,
    pub repositories: RepositoryStats,
    pub contributions: ContributionStats,
    pub fetched_at: DateTime<Utc>,
}
