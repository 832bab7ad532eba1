// GitHub API module.
// Transport, rate-aware fetching, notices, and typed records for the GitHub REST API.

pub mod fetcher;
pub mod names;
pub mod notice;
pub mod transport;
pub mod types;

pub use fetcher::{RateAwareFetcher, decode};
pub use names::{validate_login, validate_repo_name};
pub use notice::{LogNotifier, RateLimitNotice, RateLimitNotifier};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use types::*;
