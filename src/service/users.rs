// User operations.
// Cached profile and follower/following pages, uncached search and repository listings.

use tracing::{debug, warn};

use crate::cache::ResourceKind;
use crate::error::Result;
use crate::github::{
    FollowerEntry, RepositorySummary, SearchResponse, User, decode, validate_login,
};

use super::GitHubService;

/// Shortest query sent to the search endpoint.
const MIN_SEARCH_LEN: usize = 2;

impl GitHubService {
    /// Get a user profile, served from cache for up to the configured TTL.
    pub async fn get_user(&self, login: &str) -> Result<User> {
        let login = validate_login(login)?;
        self.cached(ResourceKind::User, login, None, &["users", login], &[])
            .await
    }

    /// Get one page of a user's followers.
    pub async fn get_user_followers(&self, login: &str, page: u32) -> Result<Vec<FollowerEntry>> {
        let login = validate_login(login)?;
        let params = self.page_params(page, self.per_page);
        self.cached(
            ResourceKind::Followers,
            login,
            Some(page),
            &["users", login, "followers"],
            &params,
        )
        .await
    }

    /// Get one page of the users a user follows.
    pub async fn get_user_following(&self, login: &str, page: u32) -> Result<Vec<FollowerEntry>> {
        let login = validate_login(login)?;
        let params = self.page_params(page, self.per_page);
        self.cached(
            ResourceKind::Following,
            login,
            Some(page),
            &["users", login, "following"],
            &params,
        )
        .await
    }

    /// Search suggestions. Never cached; any failure yields an empty list.
    pub async fn search_users(&self, query: &str) -> Vec<FollowerEntry> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        let params = [
            ("q", query.to_string()),
            ("per_page", self.search_per_page.to_string()),
        ];
        match self
            .fetcher
            .fetch_as::<SearchResponse>(&["search", "users"], &params)
            .await
        {
            Ok(response) => response.items,
            Err(e) => {
                warn!(query, error = %e, "user search failed");
                Vec::new()
            }
        }
    }

    /// One page of a user's repositories, most recently updated first.
    /// Never cached; any failure yields an empty list.
    pub async fn get_user_repos(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> Vec<RepositorySummary> {
        let login = match validate_login(login) {
            Ok(login) => login,
            Err(e) => {
                warn!(error = %e, "repository listing skipped");
                return Vec::new();
            }
        };
        let mut params = self.page_params(page, per_page);
        params.push(("sort", "updated".to_string()));

        match self
            .fetcher
            .fetch_as(&["users", login, "repos"], &params)
            .await
        {
            Ok(repos) => repos,
            Err(e) => {
                warn!(login, page, error = %e, "repository listing failed");
                Vec::new()
            }
        }
    }

    /// Drop everything cached for the user, fetch the profile, and cache it again.
    pub async fn force_refresh_user(&self, login: &str) -> Result<User> {
        let login = validate_login(login)?;
        self.clear_user_cache(login).await;

        let body = self.fetcher.fetch(&["users", login], &[]).await?;
        let user = decode::<User>(&body)?;

        let key = self.cache.prefixes().key(ResourceKind::User, login, None);
        self.cache.put_default(&key, &body).await;
        debug!(login, "user refreshed");
        Ok(user)
    }

    /// Remove the user's profile, every follower/following page, and their expiry records.
    pub async fn clear_user_cache(&self, login: &str) -> bool {
        let prefixes = self.cache.prefixes().clone();
        self.cache
            .remove_matching(|key| prefixes.belongs_to(key, login))
            .await
    }

    /// Remove every key in any cache namespace. Other keys, such as recent searches, survive.
    pub async fn clear_all_cache(&self) -> bool {
        let prefixes = self.cache.prefixes().clone();
        self.cache.remove_matching(|key| prefixes.owns(key)).await
    }
}
