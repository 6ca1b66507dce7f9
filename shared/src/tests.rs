use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn languages(count: usize) -> Vec<(String, u64)> {
    (0..count).map(|i| (format!("lang-{i}"), 1)).collect()
}

fn user(username: &str) -> UserData {
    UserData {
        profile: UserProfile::new(username, now()),
        repositories: RepositoryStats::default(),
        contributions: ContributionStats::default(),
        fetched_at: now(),
    }
}

/// followers=100, stars=50, forks=10, commits=20, prs=5, issues=2, reviews=1,
/// own repos=8, 3 languages, 1000 days old.
fn reference_user() -> UserData {
    let mut data = user("octocat");
    data.profile.followers = 100;
    data.profile.created_at = now() - Duration::days(1000);
    data.repositories = RepositoryStats {
        total: 10,
        own_repos: 8,
        forked_repos: 2,
        total_stars: 50,
        total_forks: 10,
        total_watchers: 50,
        languages: languages(3),
        top_repositories: vec![],
    };
    data.contributions = ContributionStats {
        commits: 20,
        pull_requests: 5,
        issues: 2,
        reviews: 1,
    };
    data
}

fn repo(name: &str, fork: bool, stars: u64, language: Option<&str>) -> Repository {
    Repository {
        name: name.to_owned(),
        fork,
        stargazers_count: stars,
        forks_count: 1,
        watchers_count: stars,
        language: language.map(str::to_owned),
        ..Default::default()
    }
}

#[test]
fn reference_score_is_420() {
    let score = ScoreEngine::default().calculate(&reference_user(), now());

    assert_eq!(score.total, 420);
    assert_eq!(score.breakdown.followers, 100.0);
    assert_eq!(score.breakdown.stars, 100.0);
    assert_eq!(score.breakdown.forks, 30.0);
    assert_eq!(score.breakdown.pull_requests, 25.0);
    assert_eq!(score.breakdown.language_diversity, 30.0);
    assert!((score.breakdown.account_age - 100.0).abs() < 1e-9);
}

#[test]
fn total_is_rounded_breakdown_sum() {
    let mut data = reference_user();
    for days in [0, 1, 7, 365, 1234, 4321] {
        data.profile.created_at = now() - Duration::days(days) - Duration::hours(5);
        let score = ScoreEngine::default().calculate(&data, now());
        assert_eq!(score.total, score.breakdown.sum().round() as i64);

        let breakdown = score.breakdown;
        for value in [
            breakdown.followers,
            breakdown.stars,
            breakdown.forks,
            breakdown.commits,
            breakdown.pull_requests,
            breakdown.issues,
            breakdown.reviews,
            breakdown.repositories,
            breakdown.language_diversity,
            breakdown.account_age,
        ] {
            assert!(value >= 0.0);
        }
    }
}

#[test]
fn account_age_counts_whole_days_only() {
    let created = now() - Duration::days(10) - Duration::hours(23);
    assert_eq!(account_age_days(created, now()), 10);
    assert_eq!(account_age_days(now() + Duration::days(3), now()), 0);
}

#[test]
fn language_diversity_is_capped_at_five() {
    let mut data = user("polyglot");
    for count in [5, 6, 10] {
        data.repositories.languages = languages(count);
        let score = ScoreEngine::default().calculate(&data, now());
        assert_eq!(score.breakdown.language_diversity, 50.0);
    }
}

#[test]
fn custom_weights_are_applied() {
    let weights = ScoreWeights {
        follower: 10.0,
        account_age: 0.0,
        ..Default::default()
    };
    let mut data = user("weighted");
    data.profile.followers = 3;
    let score = ScoreEngine::new(weights).calculate(&data, now());
    assert_eq!(score.total, 30);
}

#[test]
fn weights_accept_snake_case_keys() {
    let weights: ScoreWeights =
        serde_json::from_str(r#"{"pull_request": 7, "accountAge": 0.5}"#).unwrap();
    assert_eq!(weights.pull_request, 7.0);
    assert_eq!(weights.account_age, 0.5);
    assert_eq!(weights.star, 2.0);
}

#[test]
fn metrics_for_reference_user() {
    let metrics = metrics(&reference_user());

    assert_eq!(metrics.stars_per_repo, 5.0);
    assert_eq!(metrics.forks_per_repo, 1.0);
    // (20 + 5 + 2 + 1) / 12 = 2.33
    assert_eq!(metrics.contributions_per_month, 2);
    assert_eq!(metrics.primary_language, "lang-0");
    assert_eq!(metrics.collaboration_score, 6);
    assert_eq!(metrics.community_impact, 150);
}

#[test]
fn developer_rating_averages_capped_factors() {
    let mut data = user("rated");
    data.profile.followers = 250;
    data.contributions.commits = 50;
    data.repositories.total = 1;
    data.repositories.forked_repos = 1;
    // (0.5 + 0 + 0 + 0 + 1.0) / 5 * 5
    assert_eq!(developer_rating(&data), 1.5);
}

#[test]
fn metrics_without_repositories() {
    let metrics = metrics(&user("empty"));

    assert_eq!(metrics.stars_per_repo, 0.0);
    assert_eq!(metrics.forks_per_repo, 0.0);
    assert_eq!(metrics.primary_language, UNKNOWN_LANGUAGE);
    assert_eq!(metrics.developer_rating, 0.0);
}

#[test]
fn per_repo_ratios_round_to_two_decimals() {
    let mut data = user("ratio");
    data.repositories.total = 3;
    data.repositories.total_stars = 10;
    data.repositories.total_forks = 2;

    let metrics = metrics(&data);
    assert_eq!(metrics.stars_per_repo, 3.33);
    assert_eq!(metrics.forks_per_repo, 0.67);
}

#[test]
fn developer_rating_stays_within_bounds() {
    let mut data = user("star");
    data.profile.followers = 100_000;
    data.repositories.total = 500;
    data.repositories.own_repos = 500;
    data.repositories.total_stars = 1_000_000;
    data.contributions.commits = 10_000;
    data.contributions.pull_requests = 10_000;
    assert_eq!(developer_rating(&data), 5.0);

    for followers in [0, 1, 33, 99, 250] {
        data.profile.followers = followers;
        data.contributions.commits = followers * 3;
        let rating = developer_rating(&data);
        assert!((0.0..=5.0).contains(&rating), "{rating}");
    }
}

#[test]
fn badges_follow_thresholds() {
    let mut data = reference_user();
    data.repositories.total_stars = 150;
    data.contributions.commits = 600;
    data.profile.followers = 1000;
    data.repositories.languages = languages(5);
    data.profile.created_at = now() - Duration::days(6 * 365);

    let names: Vec<_> = generate_badges(&data, now())
        .into_iter()
        .map(|badge| badge.name)
        .collect();
    assert_eq!(
        names,
        ["Rising Star", "Commit King", "Influencer", "Multi-lingual", "Veteran"]
    );
    assert!(generate_badges(&user("newbie"), now()).is_empty());
}

#[test]
fn repository_stats_from_listing() {
    let repos = vec![
        repo("a", false, 5, Some("Rust")),
        repo("b", true, 50, Some("Go")),
        repo("c", false, 1, Some("Rust")),
        repo("d", false, 0, None),
    ];
    let stats = RepositoryStats::from_repositories(&repos);

    assert_eq!(stats.total, 4);
    assert_eq!(stats.own_repos, 3);
    assert_eq!(stats.forked_repos, 1);
    assert_eq!(stats.own_repos + stats.forked_repos, stats.total);
    assert_eq!(stats.total_stars, 56);
    assert_eq!(stats.total_forks, 4);
    assert_eq!(
        stats.languages,
        vec![("Rust".to_owned(), 2), ("Go".to_owned(), 1)]
    );
    let top: Vec<_> = stats.top_repositories.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(top, ["b", "a", "c", "d"]);
}

#[test]
fn repository_stats_keep_top_ten() {
    let repos: Vec<_> = (0..15)
        .map(|i| repo(&format!("r{i}"), false, i, Some(format!("lang{i}").as_str())))
        .collect();
    let stats = RepositoryStats::from_repositories(&repos);

    assert_eq!(stats.languages.len(), TOP_LANGUAGES);
    assert_eq!(stats.top_repositories.len(), TOP_REPOSITORIES);
    assert_eq!(stats.top_repositories[0].stars, 14);
}

#[test]
fn contributions_only_count_last_year() {
    let events = vec![
        Event::push(now() - Duration::days(3), 4),
        Event::push(now() - Duration::days(400), 10),
        Event::new(EventKind::PullRequestEvent, now() - Duration::days(1)),
        Event::new(EventKind::IssuesEvent, now() - Duration::days(364)),
        Event::new(EventKind::PullRequestReviewEvent, now()),
        Event::new(EventKind::Other, now()),
    ];
    let stats = ContributionStats::from_events(&events, now());

    assert_eq!(
        stats,
        ContributionStats {
            commits: 4,
            pull_requests: 1,
            issues: 1,
            reviews: 1,
        }
    );
}

#[test]
fn events_deserialize_from_github_feed() {
    let feed = r#"[
        {"type": "PushEvent", "created_at": "2024-05-30T10:00:00Z", "payload": {"commits": [{"sha": "a"}, {"sha": "b"}]}},
        {"type": "WatchEvent", "created_at": "2024-05-30T10:00:00Z", "payload": {"action": "started"}},
        {"type": "PullRequestEvent", "created_at": "2024-05-29T10:00:00Z", "payload": {}}
    ]"#;
    let events: Vec<Event> = serde_json::from_str(feed).unwrap();
    let stats = ContributionStats::from_events(&events, now());

    assert_eq!(events[1].kind, EventKind::Other);
    assert_eq!(stats.commits, 2);
    assert_eq!(stats.pull_requests, 1);
}

#[test]
fn higher_score_wins_and_is_symmetric() {
    let strong = reference_user();
    let weak = user("weakling");
    let engine = ScoreEngine::default();

    let forward = compare(&engine, &strong, &weak, now());
    let backward = compare(&engine, &weak, &strong, now());

    assert_eq!(forward.winner, Side::First);
    assert_eq!(backward.winner, Side::Second);
    assert_eq!(forward.score_difference, backward.score_difference);
    assert_eq!(
        forward.score_difference,
        forward.score(Side::First).total.abs_diff(forward.score(Side::Second).total)
    );
}

#[test]
fn equal_scores_fall_back_to_followers() {
    // A: 50 followers and no stars, B: 40 followers and 5 stars, both 50 points.
    let mut a = user("alice");
    a.profile.followers = 50;
    let mut b = user("bob");
    b.profile.followers = 40;
    b.repositories.total_stars = 5;

    let outcome = compare(&ScoreEngine::default(), &a, &b, now());
    assert_eq!(outcome.first.total, outcome.second.total);
    assert_eq!(outcome.winner, Side::First);
    assert_eq!(compare(&ScoreEngine::default(), &b, &a, now()).winner, Side::Second);
}

#[test]
fn tie_break_uses_repo_count_then_account_age() {
    let mut a = user("alice");
    let mut b = user("bob");
    a.repositories.total = 2;
    a.repositories.forked_repos = 2;
    b.repositories.total = 3;
    b.repositories.forked_repos = 3;
    assert_eq!(decide_winner(&a, 10, &b, 10), Side::Second);

    b.repositories.total = 2;
    a.profile.created_at = now() - Duration::seconds(1);
    assert_eq!(decide_winner(&a, 10, &b, 10), Side::First);
    assert_eq!(decide_winner(&b, 10, &a, 10), Side::Second);
}

#[test]
fn identical_profiles_resolve_by_username() {
    let a = user("Zed");
    let b = user("adam");

    for _ in 0..3 {
        assert_eq!(decide_winner(&a, 7, &b, 7), Side::Second);
        assert_eq!(decide_winner(&b, 7, &a, 7), Side::First);
    }
}

#[test]
fn insights_name_the_leader() {
    let mut a = user("alice");
    let mut b = user("bob");
    a.repositories.total_stars = 21;
    b.repositories.total_stars = 10;
    b.contributions.commits = 5;

    assert_eq!(
        insights(&a, &b),
        vec![
            "alice has significantly more starred repositories".to_owned(),
            "bob is much more active in commits".to_owned(),
        ]
    );

    a.repositories.total_stars = 20;
    b.contributions.commits = 0;
    assert!(insights(&a, &b).is_empty());
}

#[test]
fn comparison_names_winner_by_login() {
    let engine = ScoreEngine::default();
    let (a, b) = (reference_user(), user("weakling"));
    let outcome = compare(&engine, &a, &b, now());
    let comparison = Comparison::new("id".to_owned(), a, b, outcome, now());

    assert_eq!(comparison.winner, "octocat");
    assert!(comparison.is_winner(&comparison.user1));
    assert!(!comparison.is_winner(&comparison.user2));
    assert!(comparison.involves("OCTOCAT"));
    assert!(!comparison.involves("torvalds"));

    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["comparisonId"], "id");
    assert_eq!(json["user1"]["profile"]["username"], "octocat");
    assert_eq!(json["user1"]["score"]["total"], 420);
}

#[test]
fn running_average_matches_arithmetic_mean() {
    let scores = [420, 17, 999, 3, 250, 250, 88];
    let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;

    let mut forward = LeaderboardEntry::new("octocat", scores[0], true, now());
    for score in &scores[1..] {
        forward.record(*score, false, now());
    }
    let mut backward = LeaderboardEntry::new("octocat", scores[6], false, now());
    for score in scores[..6].iter().rev() {
        backward.record(*score, true, now());
    }

    assert!((forward.average_score - mean).abs() < 1e-9);
    assert!((backward.average_score - mean).abs() < 1e-9);
    assert_eq!(forward.total_comparisons, 7);
    assert_eq!(forward.highest_score, 999);
    assert_eq!(forward.last_score, 88);
    assert_eq!(forward.wins + forward.losses, forward.total_comparisons);
}

#[test]
fn win_rate_rounds_and_handles_zero() {
    let mut entry = LeaderboardEntry::new("octocat", 1, true, now());
    entry.record(1, false, now());
    entry.record(1, false, now());
    assert_eq!(entry.win_rate(), 33);

    entry.record(1, true, now());
    assert_eq!(entry.win_rate(), 50);

    entry.total_comparisons = 0;
    assert_eq!(entry.win_rate(), 0);
}

#[test]
fn leaderboard_query_sorts_filters_and_ranks() {
    let old = now() - Duration::days(10);
    let mut a = LeaderboardEntry::new("alice", 100, true, now());
    a.record(50, true, now());
    let b = LeaderboardEntry::new("bob", 300, false, old);
    let c = LeaderboardEntry::new("carol", 200, true, now());
    let entries = vec![a, b, c];

    let rows = LeaderboardQuery::new(TimePeriod::AllTime, LeaderboardSort::HighestScore, 10, now())
        .apply(&entries);
    let names: Vec<_> = rows.iter().map(|row| (row.rank, row.entry.username.as_str())).collect();
    assert_eq!(names, [(1, "bob"), (2, "carol"), (3, "alice")]);

    let rows = LeaderboardQuery::new(TimePeriod::Week, LeaderboardSort::Wins, 1, now())
        .apply(&entries);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entry.username, "alice");
    assert_eq!(rows[0].win_rate, 100);
}

#[test]
fn sort_field_parsing() {
    assert_eq!(LeaderboardSort::parse_or_default(Some("wins")), LeaderboardSort::Wins);
    assert_eq!(
        LeaderboardSort::parse_or_default(Some("averageScore")),
        LeaderboardSort::AverageScore
    );
    assert_eq!(
        LeaderboardSort::parse_or_default(Some("comparisons")),
        LeaderboardSort::TotalComparisons
    );
    assert_eq!(
        LeaderboardSort::parse_or_default(Some("score")),
        LeaderboardSort::HighestScore
    );
    assert_eq!(
        LeaderboardSort::parse_or_default(Some("followers")),
        LeaderboardSort::HighestScore
    );
    assert_eq!(LeaderboardSort::TotalComparisons.to_string(), "totalComparisons");
}

#[test]
fn time_periods() {
    assert_eq!(TimePeriod::parse_or(Some("WEEK"), TimePeriod::AllTime), TimePeriod::Week);
    assert_eq!(TimePeriod::parse_or(Some("all-time"), TimePeriod::Week), TimePeriod::AllTime);
    assert_eq!(TimePeriod::parse_or(Some("year"), TimePeriod::Week), TimePeriod::Week);
    assert_eq!(TimePeriod::parse_or(None, TimePeriod::AllTime), TimePeriod::AllTime);
    assert_eq!(TimePeriod::AllTime.to_string(), "all");

    assert_eq!(TimePeriod::Month.window_start(now()), Some(now() - Duration::days(30)));
    assert_eq!(TimePeriod::AllTime.window_start(now()), None);
    assert!(within_window(now() - Duration::hours(23), TimePeriod::Day.window_start(now())));
    assert!(!within_window(now() - Duration::hours(25), TimePeriod::Day.window_start(now())));
}

#[test]
fn trending_counts_appearances() {
    let participants = ["octocat", "torvalds", "octocat", "gaearon", "octocat", "gaearon"];
    let trending = count_appearances(participants, 2);

    assert_eq!(
        trending,
        vec![
            TrendingUser {
                rank: 1,
                username: "octocat".to_owned(),
                comparisons: 3,
            },
            TrendingUser {
                rank: 2,
                username: "gaearon".to_owned(),
                comparisons: 2,
            },
        ]
    );
}

#[test]
fn trending_groups_logins_ignoring_case() {
    let participants = ["Octocat", "hubot", "octocat", "OCTOCAT", "Hubot"];
    let trending = count_appearances(participants, 10);

    assert_eq!(
        trending,
        vec![
            TrendingUser {
                rank: 1,
                username: "OCTOCAT".to_owned(),
                comparisons: 3,
            },
            TrendingUser {
                rank: 2,
                username: "Hubot".to_owned(),
                comparisons: 2,
            },
        ]
    );
}

#[test]
fn rank_counts_strictly_higher_scores() {
    let entries = [
        LeaderboardEntry::new("a", 500, true, now()),
        LeaderboardEntry::new("b", 300, true, now()),
        LeaderboardEntry::new("c", 300, true, now()),
        LeaderboardEntry::new("d", 100, true, now()),
    ];

    assert_eq!(user_rank(&entries[0], &entries), 1);
    assert_eq!(user_rank(&entries[2], &entries), 2);
    assert_eq!(user_rank(&entries[3], &entries), 4);
}

#[test]
fn statistics_summary() {
    let mut a = LeaderboardEntry::new("a", 100, true, now());
    a.record(201, true, now());
    let b = LeaderboardEntry::new("b", 50, false, now());

    let stats = LeaderboardStatistics::summarize(&[a, b], 2);
    assert_eq!(
        stats,
        LeaderboardStatistics {
            total_users: 2,
            total_comparisons: 2,
            // (150.5 + 50) / 2
            average_score: 100,
            top_score: 201,
        }
    );
    assert_eq!(
        LeaderboardStatistics::summarize(std::iter::empty::<&LeaderboardEntry>(), 0),
        LeaderboardStatistics::default()
    );
}

struct FlakySource {
    repositories_fail: bool,
}

#[async_trait]
impl ProfileSource for FlakySource {
    async fn profile(&self, username: &str) -> Result<UserProfile, FetchError> {
        match username {
            "ghost" => Err(FetchError::NotFound(username.to_owned())),
            _ => Ok(UserProfile::new(username, now())),
        }
    }

    async fn repositories(&self, _username: &str) -> Result<Vec<Repository>, FetchError> {
        if self.repositories_fail {
            return Err(FetchError::RateLimited);
        }
        Ok(vec![repo("a", false, 3, Some("Rust"))])
    }

    async fn events(&self, _username: &str) -> Result<Vec<Event>, FetchError> {
        Err(FetchError::Other(anyhow::anyhow!("events are down")))
    }
}

#[test]
fn sub_fetch_failures_degrade_to_zero() {
    let source = FlakySource {
        repositories_fail: true,
    };
    let data = futures::executor::block_on(source.fetch_user_data("octocat")).unwrap();

    assert_eq!(data.profile.username, "octocat");
    assert_eq!(data.repositories, RepositoryStats::default());
    assert_eq!(data.contributions, ContributionStats::default());

    let source = FlakySource {
        repositories_fail: false,
    };
    let data = futures::executor::block_on(source.fetch_user_data("octocat")).unwrap();
    assert_eq!(data.repositories.total_stars, 3);
}

#[test]
fn missing_profile_is_fatal() {
    let source = FlakySource {
        repositories_fail: false,
    };
    let result = futures::executor::block_on(source.fetch_user_data("ghost"));
    assert!(matches!(result, Err(FetchError::NotFound(name)) if name == "ghost"));
}
