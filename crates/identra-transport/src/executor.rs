//! Request execution with retries, redirects and backoff.
//!
//! The executor snapshots the caller's query string and headers, then loops:
//! restore the snapshots, sign with a fresh nonce and timestamp, dispatch
//! through the [`HttpTransport`]. Redirects (301/302/307 with a `Location`)
//! are followed without consuming a retry. Server errors (5xx) and
//! transport-level failures retry with capped exponential backoff until the
//! retry budget is exhausted; a 5xx that survives the budget is returned to
//! the caller as a normal response for the layer above to interpret.

use std::thread;
use std::time::Duration;

use rand::Rng;

use identra_core::ApiCredentials;

use crate::error::TransportResult;
use crate::http::HttpTransport;
use crate::request::{Request, Response};
use crate::signer::RequestSigner;

/// Retry and backoff tuning for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay multiplied by `2^retry` for each backoff pause.
    pub backoff_scale: Duration,
    /// Upper bound on any single backoff pause.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff_scale: Duration::from_millis(300),
            max_backoff: Duration::from_secs(20),
        }
    }
}

/// Executes signed API requests against an [`HttpTransport`].
///
/// Backoff pauses block the calling thread; there is no cancellation
/// mechanism. A caller wanting a deadline must impose one externally.
#[derive(Debug)]
pub struct RequestExecutor {
    signer: RequestSigner,
    transport: Box<dyn HttpTransport>,
    retry: RetryConfig,
}

impl RequestExecutor {
    /// Create an executor signing with the given credentials.
    pub fn new(credentials: ApiCredentials, transport: Box<dyn HttpTransport>) -> Self {
        Self {
            signer: RequestSigner::new(credentials),
            transport,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry configuration.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The active retry configuration.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry
    }

    /// Execute a request, retrying transient failures.
    ///
    /// Signature errors abort immediately (the request is never sent
    /// unsigned). Exhausting the retry budget surfaces the last transport
    /// error; a 5xx response past the budget is returned, not raised.
    pub fn execute(&self, request: Request) -> TransportResult<Response> {
        // retries permute the request (signature headers, redirect targets),
        // so keep the caller's originals to start every attempt clean
        let original_query = request.query().clone();
        let original_headers = request.headers().clone();

        let mut request = request;
        let mut retry_count: u32 = 0;

        loop {
            request.set_query(original_query.clone());
            request.set_headers(original_headers.clone());
            self.signer.sign(&mut request)?;

            match self.transport.send(&request) {
                Ok(response) => {
                    if let Some(location) = response.redirect_location() {
                        let location = location.to_string();
                        tracing::debug!(%location, "following redirect");
                        request.redirect_to(&location)?;
                        continue;
                    }
                    if response.is_server_error() && retry_count < self.retry.max_retries {
                        retry_count += 1;
                        self.pause(retry_count, response.status() == 429);
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) if error.is_retryable() && retry_count < self.retry.max_retries => {
                    tracing::warn!(error = %error, "unable to execute HTTP request, will retry");
                    retry_count += 1;
                    self.pause(retry_count, false);
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Exponential sleep on a failed attempt to avoid flooding the service.
    fn pause(&self, retry_count: u32, throttled: bool) {
        let scale_ms = if throttled {
            // throttling gets a jittered scale so callers do not reconverge
            500 + u64::from(rand::thread_rng().gen_range(0..100u32))
        } else {
            self.retry.backoff_scale.as_millis() as u64
        };
        let exponent = retry_count.min(20);
        let delay_ms = scale_ms.saturating_mul(1u64 << exponent);
        let delay = Duration::from_millis(delay_ms).min(self.retry.max_backoff);
        tracing::debug!(
            retry = retry_count,
            delay_ms = delay.as_millis() as u64,
            "retryable condition detected, backing off"
        );
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::request::{Headers, Method};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted transport: pops one canned outcome per send and records the
    /// requests it saw.
    #[derive(Debug)]
    struct ScriptedTransport {
        script: Mutex<Vec<TransportResult<Response>>>,
        calls: AtomicUsize,
        seen_authorization: Mutex<Vec<String>>,
        seen_hosts: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(mut outcomes: Vec<TransportResult<Response>>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                script: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
                seen_authorization: Mutex::new(Vec::new()),
                seen_hosts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpTransport for Arc<ScriptedTransport> {
        fn send(&self, request: &Request) -> TransportResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_authorization
                .lock()
                .unwrap()
                .push(request.headers().get("Authorization").unwrap_or("").to_string());
            self.seen_hosts
                .lock()
                .unwrap()
                .push(request.headers().get("Host").unwrap_or("").to_string());
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::connection("script exhausted")))
        }
    }

    fn executor(transport: Arc<ScriptedTransport>, max_retries: u32) -> RequestExecutor {
        let credentials = ApiCredentials::new("test-id", "test-secret").unwrap();
        RequestExecutor::new(credentials, Box::new(transport)).with_retry_config(RetryConfig {
            max_retries,
            backoff_scale: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
        })
    }

    fn ok_response(status: u16) -> TransportResult<Response> {
        Ok(Response::new(status, Headers::new(), None))
    }

    fn request() -> Request {
        Request::new(Method::Get, "https://api.identra.io/v1/applications").unwrap()
    }

    #[test]
    fn returns_success_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![ok_response(200)]);
        let response = executor(Arc::clone(&transport), 4).execute(request()).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn server_errors_retry_until_success() {
        // scenario: 503 three times, then 200 -> caller sees the 200 after
        // exactly four dispatches
        let transport = ScriptedTransport::new(vec![
            ok_response(503),
            ok_response(503),
            ok_response(503),
            ok_response(200),
        ]);
        let response = executor(Arc::clone(&transport), 4).execute(request()).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(transport.calls(), 4);
    }

    #[test]
    fn server_error_past_the_cap_is_returned_not_raised() {
        let transport = ScriptedTransport::new(vec![
            ok_response(500),
            ok_response(500),
            ok_response(500),
        ]);
        let response = executor(Arc::clone(&transport), 2).execute(request()).unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn transport_failures_make_exactly_max_retries_plus_one_attempts() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::connection("reset")),
            Err(TransportError::connection("reset")),
            Err(TransportError::connection("reset")),
            Err(TransportError::connection("reset")),
            Err(TransportError::connection("reset")),
        ]);
        let result = executor(Arc::clone(&transport), 4).execute(request());
        assert!(matches!(result, Err(TransportError::Connection { .. })));
        assert_eq!(transport.calls(), 5);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![ok_response(404)]);
        let response = executor(Arc::clone(&transport), 4).execute(request()).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn redirects_are_followed_without_consuming_a_retry() {
        let mut headers = Headers::new();
        headers.set("Location", "https://api-two.identra.io/v1/applications");
        let transport = ScriptedTransport::new(vec![
            Ok(Response::new(302, headers, None)),
            ok_response(200),
        ]);
        let response = executor(Arc::clone(&transport), 0).execute(request()).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(transport.calls(), 2);
        let hosts = transport.seen_hosts.lock().unwrap();
        assert_eq!(hosts.as_slice(), &["api.identra.io", "api-two.identra.io"]);
    }

    #[test]
    fn every_attempt_is_signed_with_a_fresh_nonce() {
        let transport = ScriptedTransport::new(vec![ok_response(503), ok_response(200)]);
        executor(Arc::clone(&transport), 4).execute(request()).unwrap();
        let seen = transport.seen_authorization.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|auth| auth.starts_with("SAuthc1 ")));
        assert_ne!(seen[0], seen[1]);
    }
}
