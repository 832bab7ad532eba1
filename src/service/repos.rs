// Repository operations.
// Repository metadata, README lookup with filename fallback, and detailed listings.

use tracing::debug;

use crate::error::{GhError, Result};
use crate::github::{
    Readme, RepositoryDetails, RepositorySummary, validate_login, validate_repo_name,
};

use super::GitHubService;

/// Filenames probed, in order, when the canonical README endpoint has nothing.
pub const README_CANDIDATES: [&str; 6] = [
    "readme.md",
    "Readme.md",
    "README.markdown",
    "readme.markdown",
    "README.txt",
    "readme.txt",
];

fn repository_identity<'a>(owner: &'a str, repo: &'a str) -> Result<(&'a str, &'a str)> {
    Ok((validate_login(owner)?, validate_repo_name(repo)?))
}

impl GitHubService {
    /// Repository metadata.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositorySummary> {
        let (owner, repo) = repository_identity(owner, repo)?;
        self.fetcher.fetch_as(&["repos", owner, repo], &[]).await
    }

    /// README for a repository.
    ///
    /// When the canonical endpoint returns 404, each candidate filename is tried
    /// in turn. An exhausted rate limit stops the search; any other candidate
    /// failure moves on to the next one.
    pub async fn get_repository_readme(&self, owner: &str, repo: &str) -> Result<Readme> {
        let (owner, repo) = repository_identity(owner, repo)?;
        match self
            .fetcher
            .fetch_as::<Readme>(&["repos", owner, repo, "readme"], &[])
            .await
        {
            Ok(readme) => return Ok(readme),
            Err(e) if e.status() == Some(404) => {
                debug!(owner, repo, "no canonical README, probing alternatives");
            }
            Err(e) => return Err(e),
        }

        for filename in README_CANDIDATES {
            let segments = ["repos", owner, repo, "contents", filename];
            match self.fetcher.fetch_as::<Readme>(&segments, &[]).await {
                Ok(readme) => return Ok(readme),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => debug!(filename, error = %e, "README candidate unavailable"),
            }
        }

        Err(GhError::NotFound(format!(
            "README not found in {}/{}",
            owner, repo
        )))
    }

    /// Repository listing flattened for display.
    pub async fn get_user_repositories_detailed(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> Vec<RepositoryDetails> {
        self.get_user_repos(login, page, per_page)
            .await
            .into_iter()
            .map(RepositoryDetails::from)
            .collect()
    }
}
