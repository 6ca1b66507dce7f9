use serde::Deserialize;
use shared::ScoreWeights;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub github_token: Option<String>,
    /// Keeps comparisons and the leaderboard in process memory instead of Postgres.
    #[serde(default)]
    pub in_memory_store: bool,
    /// Exposes internal error details in 500 responses.
    #[serde(default)]
    pub development: bool,
    /// Comma separated list of CORS origins; all origins when unset.
    pub allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(envy::from_env::<Self>()?)
    }

    pub fn origins(&self) -> Option<Vec<String>> {
        self.allowed_origins.as_ref().map(|origins| {
            origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
    }
}

/// Reads weight overrides such as `SCORE_WEIGHT_PULL_REQUEST=4`.
pub fn weights_from_env() -> anyhow::Result<ScoreWeights> {
    Ok(envy::prefixed("SCORE_WEIGHT_").from_env::<ScoreWeights>()?)
}
