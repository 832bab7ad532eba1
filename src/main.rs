// ghlens command-line entry point.
// Thin consumer of the data layer that prints results as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ghlens::github::{RateLimitNotice, RateLimitNotifier};
use ghlens::{Config, GitHubService, Result};

#[derive(Parser)]
#[command(name = "ghlens", version, about = "Look up GitHub users, followers and repositories")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a user profile
    User {
        login: String,
        /// Ignore cached data and fetch a fresh profile
        #[arg(long)]
        refresh: bool,
    },
    /// List a page of followers
    Followers {
        login: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List a page of followed users
    Following {
        login: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List repositories, most recently updated first
    Repos {
        login: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        detailed: bool,
    },
    /// Search users by login
    Search { query: String },
    /// Show repository metadata
    Repo { owner: String, repo: String },
    /// Print a repository README
    Readme { owner: String, repo: String },
    /// Show profile statistics
    Stats { login: String },
    /// Probe the API rate limit
    RateLimit,
    /// Clear cached data
    Clear {
        /// Only clear this user's cached data
        #[arg(long)]
        user: Option<String>,
    },
    /// Show or clear recent searches
    Recent {
        #[arg(long)]
        clear: bool,
    },
}

/// Prints the rate limit notice as a blocking message on stderr.
struct StderrNotifier;

impl RateLimitNotifier for StderrNotifier {
    fn rate_limit_exceeded(&self, notice: &RateLimitNotice) {
        eprintln!("{}\n\n{}", notice.title(), notice.message());
    }
}

#[derive(Serialize)]
struct Stats {
    contributions: Option<ghlens::service::ContributionStats>,
    languages: Vec<ghlens::service::LanguageShare>,
    sizes: Vec<ghlens::service::SizeBucket>,
    most_starred: Vec<ghlens::service::StarredRepo>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = GitHubService::from_config(&config, Arc::new(StderrNotifier))?;

    match cli.command {
        Command::User { login, refresh } => {
            let user = if refresh {
                service.force_refresh_user(&login).await?
            } else {
                service.get_user(&login).await?
            };
            service.record_recent_search(&user).await;
            print_json(&user)
        }
        Command::Followers { login, page } => {
            print_json(&service.get_user_followers(&login, page).await?)
        }
        Command::Following { login, page } => {
            print_json(&service.get_user_following(&login, page).await?)
        }
        Command::Repos {
            login,
            page,
            per_page,
            detailed,
        } => {
            let per_page = per_page.unwrap_or(config.per_page);
            if detailed {
                print_json(
                    &service
                        .get_user_repositories_detailed(&login, page, per_page)
                        .await,
                )
            } else {
                print_json(&service.get_user_repos(&login, page, per_page).await)
            }
        }
        Command::Search { query } => print_json(&service.search_users(&query).await),
        Command::Repo { owner, repo } => {
            print_json(&service.get_repository(&owner, &repo).await?)
        }
        Command::Readme { owner, repo } => {
            let readme = service.get_repository_readme(&owner, &repo).await?;
            println!("{}", readme.decoded()?);
            Ok(())
        }
        Command::Stats { login } => {
            let stats = Stats {
                contributions: service.contribution_stats(&login).await,
                languages: service.language_distribution(&login).await,
                sizes: service.repo_size_distribution(&login).await,
                most_starred: service.most_starred_repos(&login).await,
            };
            print_json(&stats)
        }
        Command::RateLimit => print_json(&service.check_rate_limits().await),
        Command::Clear { user } => {
            let cleared = match user {
                Some(login) => service.clear_user_cache(&login).await,
                None => service.clear_all_cache().await,
            };
            print_json(&serde_json::json!({ "cleared": cleared }))
        }
        Command::Recent { clear } => {
            if clear {
                service.clear_recent_searches().await;
            }
            print_json(&service.recent_searches().await)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
