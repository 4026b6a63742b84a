//! Resilient Fetcher
//!
//! Wraps every upstream GET with a hard per-attempt timeout and a bounded
//! retry loop. Rate limits (429), server errors (500/502/503/504), timeouts
//! and connection failures are retried with exponential backoff; any other
//! non-2xx status fails immediately.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{FoodError, Result};
use crate::upstream::{RetryPolicy, Transport, TransportError, UpstreamRequest, UpstreamResponse};

/// Statuses treated as a temporarily unavailable upstream
const RETRYABLE_SERVER_STATUSES: [u16; 4] = [500, 502, 503, 504];

const TOO_MANY_REQUESTS: u16 = 429;

// == Attempt Failure ==
/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq)]
enum AttemptFailure {
    TimedOut,
    Network(TransportError),
    Status { status: u16, status_text: String },
}

impl AttemptFailure {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::TimedOut => true,
            AttemptFailure::Network(err) => err.is_retryable(),
            AttemptFailure::Status { status, .. } => {
                *status == TOO_MANY_REQUESTS || RETRYABLE_SERVER_STATUSES.contains(status)
            }
        }
    }

    /// Final error once no further attempt will be made.
    fn into_error(self, attempts: u32, timeout: Duration) -> FoodError {
        match self {
            AttemptFailure::TimedOut => FoodError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
            AttemptFailure::Network(err) => FoodError::Network {
                message: err.to_string(),
            },
            AttemptFailure::Status { status, .. } if status == TOO_MANY_REQUESTS => {
                FoodError::RateLimited { attempts }
            }
            AttemptFailure::Status { status, .. }
                if RETRYABLE_SERVER_STATUSES.contains(&status) =>
            {
                FoodError::UpstreamUnavailable { status, attempts }
            }
            AttemptFailure::Status {
                status,
                status_text,
            } => FoodError::Upstream {
                status,
                status_text,
            },
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::TimedOut => write!(f, "request timeout"),
            AttemptFailure::Network(err) => write!(f, "network error ({})", err),
            AttemptFailure::Status { status, .. } if *status == TOO_MANY_REQUESTS => {
                write!(f, "rate limited (429)")
            }
            AttemptFailure::Status { status, status_text } => {
                write!(f, "server responded {} {}", status, status_text)
            }
        }
    }
}

// == Resilient Fetcher ==
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResilientFetcher {
    // == Constructor ==
    /// # Arguments
    /// * `transport` - Performs the actual network call
    /// * `policy` - Retry budget and backoff base
    /// * `timeout` - Hard deadline applied to each attempt
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            timeout,
        }
    }

    // == Fetch ==
    /// Performs one logical request, retrying transient failures.
    ///
    /// Returns the first 2xx response. Once the retry budget is spent the last
    /// failure is mapped to a classified [`FoodError`].
    pub async fn fetch(&self, request: &UpstreamRequest) -> Result<UpstreamResponse> {
        let mut retry_index: u32 = 0;

        loop {
            let failure = match self.attempt(request).await {
                Ok(response) => return Ok(response),
                Err(failure) => failure,
            };

            if !failure.is_retryable() || retry_index >= self.policy.max_retries {
                let err = failure.into_error(retry_index + 1, self.timeout);
                error!(
                    url = %request.url,
                    attempts = retry_index + 1,
                    error = %err,
                    "Upstream request failed"
                );
                return Err(err);
            }

            let delay = self.policy.delay_for(retry_index);
            warn!(
                url = %request.url,
                attempt = retry_index + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                reason = %failure,
                "Retrying upstream request"
            );
            tokio::time::sleep(delay).await;
            retry_index += 1;
        }
    }

    /// Runs a single attempt under the deadline.
    async fn attempt(
        &self,
        request: &UpstreamRequest,
    ) -> std::result::Result<UpstreamResponse, AttemptFailure> {
        match tokio::time::timeout(self.timeout, self.transport.get(request)).await {
            Err(_elapsed) => Err(AttemptFailure::TimedOut),
            Ok(Err(err)) => Err(AttemptFailure::Network(err)),
            Ok(Ok(response)) if response.is_success() => Ok(response),
            Ok(Ok(response)) => Err(AttemptFailure::Status {
                status: response.status,
                status_text: response.status_text,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::upstream::TransportErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    type Scripted = std::result::Result<UpstreamResponse, TransportError>;

    /// Replays scripted outcomes and records when each call happened.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Option<Scripted>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        /// `None` entries never resolve.
        fn new(script: Vec<Option<Scripted>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _request: &UpstreamRequest) -> Scripted {
            self.calls.lock().unwrap().push(Instant::now());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Some(outcome)) => outcome,
                Some(None) => std::future::pending().await,
                None => panic!("transport called more times than scripted"),
            }
        }
    }

    fn status(code: u16, text: &str) -> Option<Scripted> {
        Some(Ok(UpstreamResponse::new(code, text, "")))
    }

    fn ok() -> Option<Scripted> {
        Some(Ok(UpstreamResponse::ok("{}")))
    }

    fn network(kind: TransportErrorKind) -> Option<Scripted> {
        Some(Err(TransportError::new(kind, "socket hang up")))
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> ResilientFetcher {
        ResilientFetcher::new(transport, RetryPolicy::default(), Duration::from_millis(15_000))
    }

    fn request() -> UpstreamRequest {
        UpstreamRequest::new("https://example.test/cgi/search.pl", "test-agent/1.0")
    }

    fn gaps(times: &[Instant]) -> Vec<Duration> {
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Timer deadlines round up to the next millisecond.
    fn assert_about(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let transport = ScriptedTransport::new(vec![ok()]);
        let response = fetcher(transport.clone()).fetch(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_twice_then_success() {
        let transport = ScriptedTransport::new(vec![
            status(429, "Too Many Requests"),
            status(429, "Too Many Requests"),
            ok(),
        ]);

        let result = fetcher(transport.clone()).fetch(&request()).await;

        assert!(result.is_ok());
        let times = transport.call_times();
        assert_eq!(times.len(), 3);
        let gaps = gaps(&times);
        assert_about(gaps[0], Duration::from_millis(2_000));
        assert_about(gaps[1], Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_fails_immediately() {
        for (code, text) in [(404, "Not Found"), (401, "Unauthorized"), (400, "Bad Request")] {
            let transport = ScriptedTransport::new(vec![status(code, text)]);

            let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

            assert_eq!(transport.call_times().len(), 1);
            assert_eq!(err.kind(), ErrorKind::Upstream);
            match err {
                FoodError::Upstream { status, status_text } => {
                    assert_eq!(status, code);
                    assert_eq!(status_text, text);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion() {
        let transport = ScriptedTransport::new(vec![status(429, "Too Many Requests"); 4]);
        let start = Instant::now();

        let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

        assert!(matches!(err, FoodError::RateLimited { attempts: 4 }));
        assert_eq!(transport.call_times().len(), 4);
        // 2s + 4s + 8s of backoff
        assert_about(start.elapsed(), Duration::from_millis(14_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_exhaustion() {
        let transport = ScriptedTransport::new(vec![
            status(500, "Internal Server Error"),
            status(502, "Bad Gateway"),
            status(504, "Gateway Timeout"),
            status(503, "Service Unavailable"),
        ]);

        let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert!(matches!(err, FoodError::UpstreamUnavailable { status: 503, attempts: 4 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_then_success() {
        let transport = ScriptedTransport::new(vec![status(503, "Service Unavailable"), ok()]);

        assert!(fetcher(transport.clone()).fetch(&request()).await.is_ok());
        assert_eq!(transport.call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_retried() {
        let transport = ScriptedTransport::new(vec![None, ok()]);

        let result = fetcher(transport.clone()).fetch(&request()).await;

        assert!(result.is_ok());
        let times = transport.call_times();
        // 15s deadline, then the first backoff step
        assert_eq!(times.len(), 2);
        assert_about(times[1] - times[0], Duration::from_millis(17_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exhaustion() {
        let transport = ScriptedTransport::new(vec![None, None, None, None]);

        let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

        assert!(matches!(err, FoodError::Timeout { timeout_ms: 15_000 }));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(transport.call_times().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_are_retried() {
        let transport = ScriptedTransport::new(vec![
            network(TransportErrorKind::Interrupted),
            network(TransportErrorKind::Connect),
            network(TransportErrorKind::Timeout),
            ok(),
        ]);

        assert!(fetcher(transport.clone()).fetch(&request()).await.is_ok());
        assert_eq!(transport.call_times().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_exhaustion_is_generic() {
        let transport = ScriptedTransport::new(vec![network(TransportErrorKind::Interrupted); 4]);

        let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

        assert!(matches!(err, FoodError::Network { .. }));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_transport_error_not_retried() {
        let transport = ScriptedTransport::new(vec![network(TransportErrorKind::Other)]);

        let err = fetcher(transport.clone()).fetch(&request()).await.unwrap_err();

        assert!(matches!(err, FoodError::Network { .. }));
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retry_budget() {
        let transport = ScriptedTransport::new(vec![status(429, "Too Many Requests")]);
        let fetcher = ResilientFetcher::new(
            transport.clone(),
            RetryPolicy::new(0, Duration::from_millis(2_000)),
            Duration::from_secs(15),
        );

        let err = fetcher.fetch(&request()).await.unwrap_err();

        assert!(matches!(err, FoodError::RateLimited { attempts: 1 }));
        assert_eq!(transport.call_times().len(), 1);
    }
}
