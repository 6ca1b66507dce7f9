use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const TOP_LANGUAGES: usize = 10;
pub const TOP_REPOSITORIES: usize = 10;

/// One entry of the `/users/{username}/repos` listing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    pub language: Option<String>,
    pub description: Option<String>,
    pub html_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopRepository {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Repository> for TopRepository {
    fn from(repo: &Repository) -> Self {
        Self {
            name: repo.name.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            url: repo.html_url.clone(),
            updated_at: repo.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStats {
    pub total: u64,
    pub own_repos: u64,
    pub forked_repos: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    pub total_watchers: u64,
    /// `(language, repo count)` ordered by descending count.
    pub languages: Vec<(String, u64)>,
    pub top_repositories: Vec<TopRepository>,
}

impl RepositoryStats {
    pub fn from_repositories(repos: &[Repository]) -> Self {
        let total = repos.len() as u64;
        let own_repos = repos.iter().filter(|repo| !repo.fork).count() as u64;

        // Languages are counted per repository, not by bytes of code.
        // Equal counts keep the order in which a language first appeared.
        let mut languages: Vec<(String, u64)> = Vec::new();
        for language in repos.iter().filter_map(|repo| repo.language.as_ref()) {
            match languages.iter_mut().find(|(name, _)| name == language) {
                Some((_, count)) => *count += 1,
                None => languages.push((language.clone(), 1)),
            }
        }
        languages.sort_by(|(_, a), (_, b)| b.cmp(a));
        languages.truncate(TOP_LANGUAGES);

        let top_repositories = repos
            .iter()
            .sorted_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count))
            .take(TOP_REPOSITORIES)
            .map(TopRepository::from)
            .collect();

        Self {
            total,
            own_repos,
            forked_repos: total - own_repos,
            total_stars: repos.iter().map(|repo| repo.stargazers_count).sum(),
            total_forks: repos.iter().map(|repo| repo.forks_count).sum(),
            total_watchers: repos.iter().map(|repo| repo.watchers_count).sum(),
            languages,
            top_repositories,
        }
    }
}
