// Profile statistics.
// Aggregates derived from a user's first hundred repositories and profile counters.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::github::{RepositorySummary, User};

use super::GitHubService;

const STATS_PAGE_SIZE: u32 = 100;
const TOP_STARRED: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub name: String,
    pub count: u64,
    /// Share of repositories with a language, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeBucket {
    pub name: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarredRepo {
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GithubAge {
    pub years: i64,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionStats {
    pub total_repos: u64,
    pub total_gists: u64,
    pub followers: u64,
    pub following: u64,
    pub github_age: GithubAge,
    pub repos_per_year: f64,
    pub account_created: NaiveDate,
}

/// Upper bounds (exclusive, in KB) and labels; the last bucket is unbounded.
const SIZE_BUCKETS: [(u64, &str); 5] = [
    (100, "Tiny (< 100 KB)"),
    (1_000, "Small (100 KB - 1 MB)"),
    (10_000, "Medium (1 MB - 10 MB)"),
    (100_000, "Large (10 MB - 100 MB)"),
    (u64::MAX, "Huge (> 100 MB)"),
];

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn language_shares(repos: &[RepositorySummary]) -> Vec<LanguageShare> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for language in repos.iter().filter_map(|repo| repo.language.as_deref()) {
        *counts.entry(language).or_default() += 1;
    }

    let total: u64 = counts.values().sum();
    let mut shares: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(name, count)| LanguageShare {
            name: name.to_string(),
            count,
            percentage: round1(count as f64 / total as f64 * 100.0),
        })
        .collect();

    // Ties broken by name so the order is stable
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares
}

pub fn size_buckets(repos: &[RepositorySummary]) -> Vec<SizeBucket> {
    let mut buckets: Vec<SizeBucket> = SIZE_BUCKETS
        .iter()
        .map(|(_, name)| SizeBucket { name: *name, count: 0 })
        .collect();

    for repo in repos {
        if let Some(index) = SIZE_BUCKETS.iter().position(|(limit, _)| repo.size < *limit) {
            buckets[index].count += 1;
        } else if let Some(last) = buckets.last_mut() {
            last.count += 1;
        }
    }
    buckets
}

pub fn most_starred(repos: &[RepositorySummary]) -> Vec<StarredRepo> {
    let mut sorted: Vec<&RepositorySummary> = repos.iter().collect();
    sorted.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    sorted
        .into_iter()
        .take(TOP_STARRED)
        .map(|repo| StarredRepo {
            name: repo.name.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            language: repo.language.clone(),
            description: repo.description.clone(),
        })
        .collect()
}

pub fn contribution_stats_at(user: &User, now: DateTime<Utc>) -> ContributionStats {
    let age_days = (now - user.created_at).num_days().max(0);
    let years = age_days as f64 / 365.0;
    let repos_per_year = if years > 0.0 {
        round1(user.public_repos as f64 / years)
    } else {
        user.public_repos as f64
    };

    ContributionStats {
        total_repos: user.public_repos,
        total_gists: user.public_gists,
        followers: user.followers,
        following: user.following,
        github_age: GithubAge {
            years: age_days / 365,
            days: age_days % 365,
        },
        repos_per_year,
        account_created: user.created_at.date_naive(),
    }
}

impl GitHubService {
    pub async fn language_distribution(&self, login: &str) -> Vec<LanguageShare> {
        language_shares(&self.get_user_repos(login, 1, STATS_PAGE_SIZE).await)
    }

    pub async fn repo_size_distribution(&self, login: &str) -> Vec<SizeBucket> {
        size_buckets(&self.get_user_repos(login, 1, STATS_PAGE_SIZE).await)
    }

    pub async fn most_starred_repos(&self, login: &str) -> Vec<StarredRepo> {
        most_starred(&self.get_user_repos(login, 1, STATS_PAGE_SIZE).await)
    }

    /// Profile-derived statistics; `None` when the profile cannot be loaded.
    pub async fn contribution_stats(&self, login: &str) -> Option<ContributionStats> {
        match self.get_user(login).await {
            Ok(user) => Some(contribution_stats_at(&user, Utc::now())),
            Err(e) => {
                warn!(login, error = %e, "contribution stats unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::decode;
    use crate::testing::{Harness, repo_json, user_json};
    use chrono::TimeZone;
    use serde_json::json;

    fn repos(items: &[(Option<&str>, u64, u64)]) -> Vec<RepositorySummary> {
        items
            .iter()
            .enumerate()
            .map(|(i, (language, stars, size))| {
                decode(&repo_json(&format!("repo{i}"), *language, *stars, *size)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_language_shares() {
        let repos = repos(&[
            (Some("Rust"), 0, 0),
            (Some("Rust"), 0, 0),
            (Some("Go"), 0, 0),
            (None, 0, 0),
        ]);

        let shares = language_shares(&repos);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Rust");
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percentage, 66.7);
        assert_eq!(shares[1].percentage, 33.3);
    }

    #[test]
    fn test_language_shares_empty() {
        assert!(language_shares(&[]).is_empty());
    }

    #[test]
    fn test_size_buckets() {
        let repos = repos(&[
            (None, 0, 99),
            (None, 0, 100),
            (None, 0, 9_999),
            (None, 0, 50_000),
            (None, 0, 100_000),
            (None, 0, 5_000_000),
        ]);

        let counts: Vec<u64> = size_buckets(&repos).iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_most_starred_top_five() {
        let repos = repos(&[
            (None, 3, 0),
            (None, 10, 0),
            (None, 1, 0),
            (None, 7, 0),
            (None, 2, 0),
            (None, 8, 0),
        ]);

        let stars: Vec<u64> = most_starred(&repos).iter().map(|r| r.stars).collect();
        assert_eq!(stars, vec![10, 8, 7, 3, 2]);
    }

    #[test]
    fn test_contribution_stats() {
        let user: User = decode(&user_json("octocat", 1)).unwrap();
        // 2011-01-25 + 730 days
        let now = Utc.with_ymd_and_hms(2013, 1, 24, 18, 44, 36).unwrap();

        let stats = contribution_stats_at(&user, now);
        assert_eq!(stats.github_age, GithubAge { years: 2, days: 0 });
        assert_eq!(stats.repos_per_year, 4.0);
        assert_eq!(stats.total_repos, 8);
        assert_eq!(
            stats.account_created,
            NaiveDate::from_ymd_opt(2011, 1, 25).unwrap()
        );
    }

    #[test]
    fn test_contribution_stats_new_account() {
        let user: User = decode(&user_json("octocat", 1)).unwrap();
        let stats = contribution_stats_at(&user, user.created_at);
        assert_eq!(stats.github_age, GithubAge { years: 0, days: 0 });
        assert_eq!(stats.repos_per_year, 8.0);
    }

    #[tokio::test]
    async fn test_language_distribution_uses_first_hundred() {
        let h = Harness::new();
        h.transport.respond_json(
            "https://api.test/users/octocat/repos?page=1&per_page=100&sort=updated",
            &json!([repo_json("a", Some("Rust"), 1, 1)]),
        );

        let shares = h.service.language_distribution("octocat").await;
        assert_eq!(shares[0].name, "Rust");
        assert_eq!(shares[0].percentage, 100.0);
    }

    #[tokio::test]
    async fn test_contribution_stats_missing_user() {
        let h = Harness::new();
        assert!(h.service.contribution_stats("ghost").await.is_none());
    }
}
