// User-facing rate limit notices.
// The fetcher publishes a blocking notice here when GitHub reports an exhausted quota.

use chrono::{DateTime, Local, Utc};
use tracing::warn;

/// Notice shown when the API rate limit is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitNotice {
    pub reset_at: DateTime<Utc>,
}

impl RateLimitNotice {
    pub fn new(reset_at: DateTime<Utc>) -> Self {
        Self { reset_at }
    }

    /// Reset time in the local timezone, e.g. "14:05:09".
    pub fn reset_time(&self) -> String {
        self.reset_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    pub fn title(&self) -> &'static str {
        "API Rate Limit Exceeded"
    }

    pub fn message(&self) -> String {
        format!(
            "You've reached GitHub's API request limit. The limit will reset at {}.\n\n\
             Consider implementing authentication to get higher rate limits.",
            self.reset_time()
        )
    }
}

/// Sink for blocking user notices. The UI layer supplies the real dialog.
pub trait RateLimitNotifier: Send + Sync {
    fn rate_limit_exceeded(&self, notice: &RateLimitNotice);
}

/// Notifier that only logs; used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl RateLimitNotifier for LogNotifier {
    fn rate_limit_exceeded(&self, notice: &RateLimitNotice) {
        warn!(
            reset_at = %notice.reset_at,
            "GitHub API rate limit exceeded, resets at {}",
            notice.reset_time()
        );
    }
}
