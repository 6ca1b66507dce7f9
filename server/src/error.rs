use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use shared::FetchError;
use tracing::error;

use crate::{config::AppConfig, entrypoints::types::ErrorResponse};

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("{message}")]
    Unknown {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl BattleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wraps an unexpected failure behind a public message.
    pub fn unknown(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Unknown {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            BattleError::Validation(_) => Status::BadRequest,
            BattleError::NotFound(_) => Status::NotFound,
            BattleError::RateLimited => Status::TooManyRequests,
            BattleError::Unknown { .. } => Status::InternalServerError,
        }
    }
}

impl From<FetchError> for BattleError {
    fn from(error: FetchError) -> Self {
        match error {
            e @ FetchError::NotFound(_) => BattleError::NotFound(e.to_string()),
            FetchError::RateLimited => BattleError::RateLimited,
            FetchError::Other(source) => BattleError::Unknown {
                message: "Failed to compare users",
                source,
            },
        }
    }
}

impl<'r> Responder<'r, 'static> for BattleError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let development = req
            .rocket()
            .state::<AppConfig>()
            .map_or(false, |config| config.development);

        let details = match &self {
            BattleError::Unknown { message, source } => {
                error!("{message}: {source:#}");
                development.then(|| format!("{source:#}"))
            }
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            details,
        };

        (self.status(), Json(body)).respond_to(req)
    }
}
