use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserData;

/// Languages beyond this many earn no extra diversity points.
pub const MAX_SCORED_LANGUAGES: usize = 5;
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Points awarded per unit of each category.
///
/// Multi-word fields also accept their snake_case spelling so the weights can
/// be read from `SCORE_WEIGHT_*` environment variables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub follower: f64,
    pub star: f64,
    pub fork: f64,
    pub commit: f64,
    #[serde(alias = "pull_request")]
    pub pull_request: f64,
    pub issue: f64,
    pub review: f64,
    pub repository: f64,
    #[serde(alias = "language_diversity")]
    pub language_diversity: f64,
    /// Per whole day since the account was created.
    #[serde(alias = "account_age")]
    pub account_age: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            follower: 1.0,
            star: 2.0,
            fork: 3.0,
            commit: 1.0,
            pull_request: 5.0,
            issue: 2.0,
            review: 3.0,
            repository: 1.0,
            language_diversity: 10.0,
            account_age: 0.1,
        }
    }
}

/// Unrounded contribution of every category to the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub followers: f64,
    pub stars: f64,
    pub forks: f64,
    pub commits: f64,
    pub pull_requests: f64,
    pub issues: f64,
    pub reviews: f64,
    pub repositories: f64,
    pub language_diversity: f64,
    pub account_age: f64,
}

impl ScoreBreakdown {
    pub fn sum(&self) -> f64 {
        self.followers
            + self.stars
            + self.forks
            + self.commits
            + self.pull_requests
            + self.issues
            + self.reviews
            + self.repositories
            + self.language_diversity
            + self.account_age
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetrics {
    pub stars_per_repo: f64,
    pub forks_per_repo: f64,
    pub contributions_per_month: u64,
    /// 0.0 to 5.0 with one decimal.
    pub developer_rating: f64,
    pub primary_language: String,
    pub collaboration_score: u64,
    pub community_impact: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub total: i64,
    pub breakdown: ScoreBreakdown,
    pub metrics: ScoreMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub name: String,
    pub icon: String,
    pub description: String,
}

impl Badge {
    fn new(name: &str, icon: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            icon: icon.to_owned(),
            description: description.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine {
    weights: ScoreWeights,
}

impl ScoreEngine {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn calculate(&self, data: &UserData, now: DateTime<Utc>) -> Score {
        let weights = &self.weights;
        let UserData {
            profile,
            repositories,
            contributions,
            ..
        } = data;
        let languages = repositories.languages.len().min(MAX_SCORED_LANGUAGES);

        let breakdown = ScoreBreakdown {
            followers: profile.followers as f64 * weights.follower,
            stars: repositories.total_stars as f64 * weights.star,
            forks: repositories.total_forks as f64 * weights.fork,
            commits: contributions.commits as f64 * weights.commit,
            pull_requests: contributions.pull_requests as f64 * weights.pull_request,
            issues: contributions.issues as f64 * weights.issue,
            reviews: contributions.reviews as f64 * weights.review,
            repositories: repositories.own_repos as f64 * weights.repository,
            language_diversity: languages as f64 * weights.language_diversity,
            account_age: account_age_days(profile.created_at, now) as f64 * weights.account_age,
        };

        Score {
            total: breakdown.sum().round() as i64,
            breakdown,
            metrics: metrics(data),
        }
    }
}

/// Whole days between account creation and `now`, never negative.
pub fn account_age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn per_repo(value: u64, repos: u64) -> f64 {
    if repos == 0 {
        return 0.0;
    }
    round_to(value as f64 / repos as f64, 2)
}

pub fn metrics(data: &UserData) -> ScoreMetrics {
    let UserData {
        profile,
        repositories,
        contributions,
        ..
    } = data;

    ScoreMetrics {
        stars_per_repo: per_repo(repositories.total_stars, repositories.total),
        forks_per_repo: per_repo(repositories.total_forks, repositories.total),
        contributions_per_month: (contributions.total() as f64 / 12.0).round() as u64,
        developer_rating: developer_rating(data),
        primary_language: repositories
            .languages
            .first()
            .map(|(language, _)| language.clone())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_owned()),
        collaboration_score: contributions.pull_requests + contributions.reviews,
        community_impact: profile.followers + repositories.total_stars,
    }
}

pub fn developer_rating(data: &UserData) -> f64 {
    let UserData {
        profile,
        repositories,
        contributions,
        ..
    } = data;
    let capped = |value: u64, full_at: f64| (value as f64 / full_at).min(1.0);

    let activity = capped(contributions.commits, 100.0);
    let popularity = capped(repositories.total_stars, 1000.0);
    let collaboration = capped(contributions.pull_requests, 50.0);
    let consistency = if repositories.total > 0 {
        capped(repositories.own_repos, 20.0)
    } else {
        0.0
    };
    let community = capped(profile.followers, 100.0);

    let average = (activity + popularity + collaboration + consistency + community) / 5.0;
    round_to(average * 5.0, 1)
}

pub fn generate_badges(data: &UserData, now: DateTime<Utc>) -> Vec<Badge> {
    let UserData {
        profile,
        repositories,
        contributions,
        ..
    } = data;
    let mut badges = Vec::new();

    if repositories.total_stars >= 1000 {
        badges.push(Badge::new("Star Master", "⭐", "1000+ total stars"));
    } else if repositories.total_stars >= 100 {
        badges.push(Badge::new("Rising Star", "🌟", "100+ total stars"));
    }

    if contributions.commits >= 500 {
        badges.push(Badge::new("Commit King", "👑", "500+ commits this year"));
    } else if contributions.commits >= 100 {
        badges.push(Badge::new("Code Warrior", "⚔️", "100+ commits this year"));
    }

    if profile.followers >= 1000 {
        badges.push(Badge::new("Influencer", "📢", "1000+ followers"));
    } else if profile.followers >= 100 {
        badges.push(Badge::new("Popular", "👥", "100+ followers"));
    }

    if repositories.languages.len() >= 10 {
        badges.push(Badge::new("Polyglot", "🌍", "10+ languages"));
    } else if repositories.languages.len() >= 5 {
        badges.push(Badge::new("Multi-lingual", "🗣️", "5+ languages"));
    }

    if contributions.pull_requests >= 50 {
        badges.push(Badge::new("Team Player", "🤝", "50+ pull requests"));
    }
    if contributions.reviews >= 25 {
        badges.push(Badge::new("Code Reviewer", "🔍", "25+ code reviews"));
    }

    if repositories.own_repos >= 50 {
        badges.push(Badge::new("Prolific", "📚", "50+ repositories"));
    }

    if account_age_days(profile.created_at, now) >= 5 * 365 {
        badges.push(Badge::new("Veteran", "🏆", "5+ years on GitHub"));
    }

    badges
}
