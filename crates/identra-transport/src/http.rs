//! The HTTP transport seam and its default implementation.
//!
//! The executor never talks to the network directly; it goes through
//! [`HttpTransport`], which callers may replace with their own connection
//! pool or a scripted fake. The default implementation wraps a blocking
//! `reqwest` client with redirects disabled — redirect policy belongs to
//! the executor, which must re-sign a request for its new target.

use std::fmt;
use std::time::Duration;

use crate::error::{TransportError, TransportResult};
use crate::request::{Headers, Method, Request, Response};

/// Default connection and read timeout for the built-in transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches a single signed request and returns the raw response.
///
/// Implementations must be safe to share between threads; the executor may
/// be used concurrently from multiple callers.
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send the request and read the full response body.
    fn send(&self, request: &Request) -> TransportResult<Response>;
}

/// Blocking `reqwest`-backed transport with connection pooling.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a transport with the default timeouts and pool settings.
    pub fn new() -> TransportResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                TransportError::connection(format!("unable to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &Request) -> TransportResult<Response> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        };

        let mut builder = self.client.request(method, request.full_url().as_str());
        for (name, values) in request.headers().iter() {
            for value in values {
                builder = builder.header(name, value);
            }
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.add(name.as_str(), value);
            }
        }

        let text = response.text().map_err(map_reqwest_error)?;
        let body = if text.is_empty() { None } else { Some(text) };
        Ok(Response::new(status, headers, body))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::connection(error.to_string())
    } else {
        TransportError::io(error.to_string())
    }
}
