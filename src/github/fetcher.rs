// Rate-aware fetcher for the GitHub REST API.
// Turns raw responses into JSON, distinguishing exhausted rate limits from other API errors.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GhError, Result};

use super::notice::{RateLimitNotice, RateLimitNotifier};
use super::transport::{HttpResponse, HttpTransport};
use super::types::{RateLimitResponse, RateLimitState};

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Deserialize a fetched JSON body into a typed record.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| GhError::Schema(e.to_string()))
}

/// GET-and-parse wrapper that detects exhausted rate limits.
pub struct RateAwareFetcher {
    transport: Arc<dyn HttpTransport>,
    notifier: Arc<dyn RateLimitNotifier>,
    base_url: String,
    last_rate_limit: Mutex<Option<RateLimitState>>,
}

impl RateAwareFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        notifier: Arc<dyn RateLimitNotifier>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            notifier,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_rate_limit: Mutex::new(None),
        }
    }

    /// Most recent rate limit observed in response headers.
    pub fn last_rate_limit(&self) -> Option<RateLimitState> {
        self.last_rate_limit
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Build the absolute URL for an API path with query parameters.
    ///
    /// Each segment is percent-encoded on its own, so `/`, `?` and `#` inside a
    /// segment never change the resource addressed.
    pub fn url(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GhError::Config(format!("invalid API URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| GhError::Config(format!("API URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET the path made of `segments` and return its parsed JSON body.
    pub async fn fetch(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Value> {
        let url = self.url(segments, params)?;
        let response = self.transport.get(url.as_str()).await?;
        self.handle_response(response)
    }

    /// GET the path made of `segments` and deserialize it into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T> {
        let value = self.fetch(segments, params).await?;
        decode(&value)
    }

    /// Interpret a response: rate limit exhaustion, other API errors, or a JSON body.
    pub fn handle_response(&self, response: HttpResponse) -> Result<Value> {
        self.observe_rate_limit(&response);

        if response.status == 403 && response.header(HEADER_REMAINING) == Some("0") {
            let reset_at = response
                .header(HEADER_RESET)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .unwrap_or_else(|| Utc::now() + Duration::hours(1));

            self.notifier
                .rate_limit_exceeded(&RateLimitNotice::new(reset_at));
            return Err(GhError::RateLimitExceeded { reset_at });
        }

        if !response.is_success() {
            return Err(GhError::Api {
                status: response.status,
                message: error_message(&response),
            });
        }

        serde_json::from_str(&response.body).map_err(|e| GhError::Api {
            status: response.status,
            message: format!("malformed response body: {}", e),
        })
    }

    /// Pre-flight probe of `/rate_limit`.
    ///
    /// Failure to observe the limit is reported as an exhausted limit, never as unknown.
    /// The probe only reports; it never raises a rate limit notice.
    pub async fn check_rate_limits(&self) -> RateLimitState {
        match self.probe_rate_limit().await {
            Ok(state) => {
                debug!(remaining = state.remaining, limit = state.limit, "rate limit probed");
                state
            }
            Err(e) => {
                warn!(error = %e, "rate limit probe failed, assuming limited");
                RateLimitState::conservative()
            }
        }
    }

    async fn probe_rate_limit(&self) -> Result<RateLimitState> {
        let url = self.url(&["rate_limit"], &[])?;
        let response = self.transport.get(url.as_str()).await?;
        self.observe_rate_limit(&response);

        if !response.is_success() {
            return Err(GhError::Api {
                status: response.status,
                message: error_message(&response),
            });
        }

        let body: Value = serde_json::from_str(&response.body)?;
        let probed: RateLimitResponse = decode(&body)?;
        Ok(RateLimitState::from(probed.rate))
    }

    fn observe_rate_limit(&self, response: &HttpResponse) {
        let parse = |name: &str| response.header(name).and_then(|v| v.trim().parse::<i64>().ok());

        let (Some(remaining), Some(reset)) = (parse(HEADER_REMAINING), parse(HEADER_RESET)) else {
            return;
        };
        let Some(reset_at) = DateTime::from_timestamp(reset, 0) else {
            return;
        };
        let limit = parse(HEADER_LIMIT).unwrap_or(0);

        let state = RateLimitState::new(
            u64::try_from(remaining).unwrap_or(0),
            u64::try_from(limit).unwrap_or(0),
            reset_at,
        );
        if let Ok(mut guard) = self.last_rate_limit.lock() {
            *guard = Some(state);
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefer GitHub's `message` field, fall back to the bare status.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_str::<ErrorBody>(&response.body)
        .map(|body| body.message)
        .unwrap_or_else(|_| format!("API Error: {}", response.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNotifier, ScriptedTransport};
    use serde_json::json;

    fn fetcher(transport: Arc<ScriptedTransport>) -> (RateAwareFetcher, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let fetcher = RateAwareFetcher::new(transport, notifier.clone(), "https://api.test/");
        (fetcher, notifier)
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_is_distinguished() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/octocat",
            HttpResponse::new(403, r#"{"message":"API rate limit exceeded"}"#)
                .with_header("X-RateLimit-Remaining", "0")
                .with_header("X-RateLimit-Reset", "1700000000"),
        );
        let (fetcher, notifier) = fetcher(transport);

        let err = fetcher.fetch(&["users", "octocat"], &[]).await.unwrap_err();
        match err {
            GhError::RateLimitExceeded { reset_at } => {
                assert_eq!(reset_at.timestamp(), 1_700_000_000);
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].reset_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_rate_limit_without_reset_header_assumes_an_hour() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/octocat",
            HttpResponse::new(403, "{}").with_header("X-RateLimit-Remaining", "0"),
        );
        let (fetcher, notifier) = fetcher(transport);

        let before = Utc::now();
        let err = fetcher.fetch(&["users", "octocat"], &[]).await.unwrap_err();
        let after = Utc::now();

        let reset_at = match err {
            GhError::RateLimitExceeded { reset_at } => reset_at,
            other => panic!("expected rate limit error, got {other:?}"),
        };
        assert!(reset_at >= before + Duration::hours(1));
        assert!(reset_at <= after + Duration::hours(1));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].reset_at, reset_at);
    }

    #[tokio::test]
    async fn test_forbidden_with_quota_left_is_api_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/octocat",
            HttpResponse::new(403, r#"{"message":"Forbidden"}"#)
                .with_header("X-RateLimit-Remaining", "12"),
        );
        let (fetcher, notifier) = fetcher(transport);

        let err = fetcher.fetch(&["users", "octocat"], &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_carries_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/ghost",
            HttpResponse::new(404, r#"{"message":"Not Found"}"#),
        );
        let (fetcher, _) = fetcher(transport);

        let err = fetcher.fetch(&["users", "ghost"], &[]).await.unwrap_err();
        match err {
            GhError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_api_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/octocat",
            HttpResponse::new(200, "<html>"),
        );
        let (fetcher, _) = fetcher(transport);

        let err = fetcher.fetch(&["users", "octocat"], &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/search/users?q=rust+lang&per_page=5",
            HttpResponse::new(200, r#"{"total_count":0,"items":[]}"#),
        );
        let (fetcher, _) = fetcher(transport.clone());

        let params = [("q", "rust lang".to_string()), ("per_page", "5".to_string())];
        let body = fetcher.fetch(&["search", "users"], &params).await.unwrap();
        assert_eq!(body["total_count"], json!(0));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_path_segments_are_escaped() {
        let transport = Arc::new(ScriptedTransport::new());
        let (fetcher, _) = fetcher(transport.clone());

        let url = fetcher.url(&["users", "alice/../bob?x=1#y"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.test/users/alice%2F..%2Fbob%3Fx=1%23y");

        let _ = fetcher.fetch(&["users", "octocat?per_page=1"], &[]).await;
        assert_eq!(transport.calls(), vec!["https://api.test/users/octocat%3Fper_page=1"]);
    }

    #[test]
    fn test_url_keeps_base_path() {
        let transport = Arc::new(ScriptedTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let fetcher = RateAwareFetcher::new(transport, notifier, "https://ghe.test/api/v3/");

        let url = fetcher
            .url(&["users", "octocat"], &[("page", "2".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "https://ghe.test/api/v3/users/octocat?page=2");
    }

    #[tokio::test]
    async fn test_observes_rate_limit_headers() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/users/octocat",
            HttpResponse::new(200, r#"{"login":"octocat"}"#)
                .with_header("X-RateLimit-Limit", "60")
                .with_header("X-RateLimit-Remaining", "4")
                .with_header("X-RateLimit-Reset", "1700000000"),
        );
        let (fetcher, _) = fetcher(transport);

        assert!(fetcher.last_rate_limit().is_none());
        fetcher.fetch(&["users", "octocat"], &[]).await.unwrap();

        let state = fetcher.last_rate_limit().unwrap();
        assert_eq!(state.limit, 60);
        assert_eq!(state.remaining, 4);
        assert!(state.is_limited);
    }

    #[tokio::test]
    async fn test_check_rate_limits_parses_response() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/rate_limit",
            HttpResponse::new(
                200,
                r#"{"rate":{"limit":60,"remaining":42,"reset":1700000000,"used":18}}"#,
            ),
        );
        let (fetcher, _) = fetcher(transport);

        let state = fetcher.check_rate_limits().await;
        assert_eq!(state.remaining, 42);
        assert_eq!(state.limit, 60);
        assert_eq!(state.reset_at.timestamp(), 1_700_000_000);
        assert!(!state.is_limited);
    }

    #[tokio::test]
    async fn test_check_rate_limits_fails_closed() {
        // Nothing scripted: the transport fails every request
        let transport = Arc::new(ScriptedTransport::new());
        let (fetcher, _) = fetcher(transport);

        let state = fetcher.check_rate_limits().await;
        assert_eq!(state.remaining, 0);
        assert!(state.is_limited);
        assert!(state.reset_at > Utc::now() + Duration::minutes(59));
    }

    #[tokio::test]
    async fn test_check_rate_limits_exhausted_raises_no_notice() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/rate_limit",
            HttpResponse::new(403, r#"{"message":"API rate limit exceeded"}"#)
                .with_header("X-RateLimit-Remaining", "0")
                .with_header("X-RateLimit-Reset", "1700000000"),
        );
        let (fetcher, notifier) = fetcher(transport);

        let state = fetcher.check_rate_limits().await;
        assert!(state.is_limited);
        assert_eq!(state.remaining, 0);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_check_rate_limits_unparsable_response() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://api.test/rate_limit",
            HttpResponse::new(200, r#"{"resources":{}}"#),
        );
        let (fetcher, _) = fetcher(transport);

        assert!(fetcher.check_rate_limits().await.is_limited);
    }
}
