// GitHub API response types.
// Typed records for the resources ghlens reads; deserializing into them is the schema check.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GhError, Result};

/// Remaining-request count at or below which the API is considered limited.
pub const RATE_LIMIT_THRESHOLD: u64 = 5;

/// Account type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountType {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Unknown,
}

/// Full GitHub user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Compact user record as returned in follower, following and search listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerEntry {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

/// Search endpoint envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<FollowerEntry>,
}

/// Repository owner reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// Repository license reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub spdx_id: Option<String>,
}

/// Repository as returned by listing and metadata endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: RepositoryOwner,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    /// Size in kilobytes.
    #[serde(default)]
    pub size: u64,
    pub default_branch: Option<String>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub has_wiki: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    pub license: Option<License>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Flattened repository view for detailed listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryDetails {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers_count: u64,
    pub default_branch: Option<String>,
    pub owner_login: String,
    pub owner_avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub html_url: Option<String>,
    pub open_issues_count: u64,
    pub topics: Vec<String>,
    pub license: Option<String>,
}

impl From<RepositorySummary> for RepositoryDetails {
    fn from(repo: RepositorySummary) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers_count: repo.watchers_count,
            default_branch: repo.default_branch,
            owner_login: repo.owner.login,
            owner_avatar_url: repo.owner.avatar_url,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            has_issues: repo.has_issues,
            has_wiki: repo.has_wiki,
            html_url: repo.html_url,
            open_issues_count: repo.open_issues_count,
            topics: repo.topics,
            license: repo.license.map(|license| license.name),
        }
    }
}

/// README file as returned by the readme and contents endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readme {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
    pub html_url: Option<String>,
    pub download_url: Option<String>,
}

impl Readme {
    /// Decode the file body. GitHub wraps base64 content at 60 columns.
    pub fn decoded(&self) -> Result<String> {
        if self.encoding != "base64" {
            return Ok(self.content.clone());
        }

        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| GhError::Schema(format!("README content is not base64: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| GhError::Schema(format!("README content is not UTF-8: {}", e)))
    }
}

/// Entry in the recent-searches list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: String,
    pub login: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for RecentSearch {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            login: user.login.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Body of the `/rate_limit` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub rate: RateWindow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateWindow {
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds.
    pub reset: i64,
}

/// Rate limit information, recomputed per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitState {
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: DateTime<Utc>,
    pub is_limited: bool,
}

impl RateLimitState {
    pub fn new(remaining: u64, limit: u64, reset_at: DateTime<Utc>) -> Self {
        Self {
            remaining,
            limit,
            reset_at,
            is_limited: remaining <= RATE_LIMIT_THRESHOLD,
        }
    }

    /// State assumed when the limit cannot be observed: exhausted for the next hour.
    pub fn conservative() -> Self {
        Self {
            remaining: 0,
            limit: 60,
            reset_at: Utc::now() + Duration::hours(1),
            is_limited: true,
        }
    }
}

impl From<RateWindow> for RateLimitState {
    fn from(window: RateWindow) -> Self {
        let reset_at = DateTime::from_timestamp(window.reset, 0)
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));
        Self::new(window.remaining, window.limit, reset_at)
    }
}
