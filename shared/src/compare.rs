use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{generate_badges, Badge, GithubHandle, Score, ScoreEngine, UserData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub winner: Side,
    pub first: Score,
    pub second: Score,
    pub score_difference: u64,
    pub insights: Vec<String>,
}

impl Outcome {
    pub fn score(&self, side: Side) -> &Score {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }
}

/// Scores both users and picks a winner.
///
/// Callers must reject usernames that are equal ignoring case beforehand;
/// such a pair is reported as a win for the first user.
pub fn compare(
    engine: &ScoreEngine,
    first: &UserData,
    second: &UserData,
    now: DateTime<Utc>,
) -> Outcome {
    let first_score = engine.calculate(first, now);
    let second_score = engine.calculate(second, now);

    Outcome {
        winner: decide_winner(first, first_score.total, second, second_score.total),
        score_difference: first_score.total.abs_diff(second_score.total),
        insights: insights(first, second),
        first: first_score,
        second: second_score,
    }
}

/// Tie-break chain: score, followers, total repositories, older account and
/// finally the case-insensitively smaller username.
pub fn decide_winner(
    first: &UserData,
    first_total: i64,
    second: &UserData,
    second_total: i64,
) -> Side {
    let ordering = first_total
        .cmp(&second_total)
        .then(first.profile.followers.cmp(&second.profile.followers))
        .then(first.repositories.total.cmp(&second.repositories.total))
        .then(second.profile.created_at.cmp(&first.profile.created_at))
        .then_with(|| {
            second
                .profile
                .username_key()
                .cmp(&first.profile.username_key())
        });

    match ordering {
        Ordering::Less => Side::Second,
        Ordering::Greater | Ordering::Equal => Side::First,
    }
}

fn dominates(value: u64, other: u64) -> bool {
    value > other.saturating_mul(2)
}

pub fn insights(first: &UserData, second: &UserData) -> Vec<String> {
    let mut insights = Vec::new();
    let leader = |a: u64, b: u64| {
        if dominates(a, b) {
            Some(&first.profile.username)
        } else if dominates(b, a) {
            Some(&second.profile.username)
        } else {
            None
        }
    };

    if let Some(login) = leader(
        first.repositories.total_stars,
        second.repositories.total_stars,
    ) {
        insights.push(format!("{login} has significantly more starred repositories"));
    }

    if let Some(login) = leader(first.contributions.commits, second.contributions.commits) {
        insights.push(format!("{login} is much more active in commits"));
    }

    insights
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserBundle {
    #[serde(flatten)]
    pub data: UserData,
    pub score: Score,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl UserBundle {
    pub fn username(&self) -> &str {
        &self.data.profile.username
    }
}

/// Immutable record of one battle, persisted for later retrieval by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub comparison_id: String,
    pub user1: UserBundle,
    pub user2: UserBundle,
    pub winner: GithubHandle,
    pub score_difference: u64,
    #[serde(default)]
    pub insights: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Comparison {
    pub fn new(
        comparison_id: String,
        first: UserData,
        second: UserData,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let winner = match outcome.winner {
            Side::First => first.profile.username.clone(),
            Side::Second => second.profile.username.clone(),
        };
        let user1 = UserBundle {
            badges: generate_badges(&first, timestamp),
            data: first,
            score: outcome.first,
        };
        let user2 = UserBundle {
            badges: generate_badges(&second, timestamp),
            data: second,
            score: outcome.second,
        };

        Self {
            comparison_id,
            user1,
            user2,
            winner,
            score_difference: outcome.score_difference,
            insights: outcome.insights,
            timestamp,
        }
    }

    pub fn participants(&self) -> [&UserBundle; 2] {
        [&self.user1, &self.user2]
    }

    pub fn involves(&self, username: &str) -> bool {
        let key = crate::username_key(username);
        self.participants()
            .iter()
            .any(|bundle| bundle.data.profile.username_key() == key)
    }

    pub fn is_winner(&self, bundle: &UserBundle) -> bool {
        crate::username_key(&self.winner) == bundle.data.profile.username_key()
    }
}
