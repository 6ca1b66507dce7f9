use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;

use crate::{Event, FetchError, ProfileSource, Repository, UserProfile};

/// GitHub serves at most 100 repositories per page; we look at 5 pages.
const REPOS_PER_PAGE: u8 = 100;
const MAX_REPO_PAGES: u32 = 5;
const EVENTS_PER_PAGE: u8 = 100;

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    company: Option<String>,
    location: Option<String>,
    blog: Option<String>,
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    following: u64,
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    public_gists: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    html_url: Option<String>,
}

impl From<GithubUser> for UserProfile {
    fn from(user: GithubUser) -> Self {
        Self {
            username: user.login,
            name: user.name,
            avatar: user.avatar_url,
            bio: user.bio,
            company: user.company,
            location: user.location,
            blog: user.blog.filter(|blog| !blog.is_empty()),
            followers: user.followers,
            following: user.following,
            public_repos: user.public_repos,
            public_gists: user.public_gists,
            created_at: user.created_at,
            updated_at: user.updated_at,
            html_url: user.html_url,
        }
    }
}

#[derive(Serialize)]
struct RepoListParams {
    per_page: u8,
    page: u32,
    sort: &'static str,
}

#[derive(Serialize)]
struct EventListParams {
    per_page: u8,
}

#[derive(Clone, Debug)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
}

impl GithubClient {
    /// Without a token requests are anonymous and share the low public quota.
    pub fn new(github_token: Option<String>) -> anyhow::Result<Self> {
        let mut builder = octocrab::Octocrab::builder();
        if let Some(token) = github_token.filter(|token| !token.is_empty()) {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    async fn get<R, P>(&self, username: &str, route: &str, params: Option<&P>) -> Result<R, FetchError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.octocrab
            .get(route, params)
            .await
            .map_err(|e| map_error(username, e))
    }
}

fn map_error(username: &str, error: octocrab::Error) -> FetchError {
    if let octocrab::Error::GitHub { source, .. } = &error {
        match source.status_code.as_u16() {
            404 => return FetchError::NotFound(username.to_owned()),
            429 => return FetchError::RateLimited,
            403 if source.message.to_lowercase().contains("rate limit") => {
                return FetchError::RateLimited
            }
            _ => {}
        }
    }
    FetchError::Other(anyhow::anyhow!("GitHub API error: {error}"))
}

#[async_trait]
impl ProfileSource for GithubClient {
    #[instrument(skip(self))]
    async fn profile(&self, username: &str) -> Result<UserProfile, FetchError> {
        let user: GithubUser = self
            .get(username, &format!("/users/{username}"), None::<&()>)
            .await?;
        Ok(user.into())
    }

    #[instrument(skip(self))]
    async fn repositories(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let route = format!("/users/{username}/repos");
        let mut repos = Vec::new();

        for page in 1..=MAX_REPO_PAGES {
            let params = RepoListParams {
                per_page: REPOS_PER_PAGE,
                page,
                sort: "updated",
            };
            let batch: Vec<Repository> = self.get(username, &route, Some(&params)).await?;
            let last_page = batch.len() < REPOS_PER_PAGE as usize;
            repos.extend(batch);
            if last_page {
                break;
            }
        }

        Ok(repos)
    }

    #[instrument(skip(self))]
    async fn events(&self, username: &str) -> Result<Vec<Event>, FetchError> {
        let params = EventListParams {
            per_page: EVENTS_PER_PAGE,
        };
        self.get(username, &format!("/users/{username}/events"), Some(&params))
            .await
    }
}
