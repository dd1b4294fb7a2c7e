//! # Identra Transport
//!
//! Signed HTTP request execution for the Identra SDK.
//!
//! ## Features
//!
//! - SAuthc1 request signing (HMAC-SHA256 over a canonical request form)
//! - Retrying executor with exponential backoff and redirect following
//! - Pluggable [`HttpTransport`] seam with a blocking `reqwest` default
//!
//! ## Architecture
//!
//! ```text
//! identra-transport/
//! ├── request/        # Request/response model and canonical encoding
//! ├── signer/         # SAuthc1 canonical request signing
//! ├── executor/       # Sign → dispatch → retry loop
//! └── http/           # HttpTransport trait and reqwest implementation
//! ```
//!
//! The executor owns the loop: every attempt restores the caller's original
//! headers and query string, signs with a fresh nonce and timestamp, and
//! dispatches through the transport. All I/O blocks the calling thread;
//! there is no event loop and no cancellation mechanism.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod error;
pub mod executor;
pub mod http;
pub mod request;
pub mod signer;

pub use error::{TransportError, TransportResult};
pub use executor::{RequestExecutor, RetryConfig};
pub use http::{HttpTransport, ReqwestTransport};
pub use request::{Headers, Method, QueryString, Request, Response};
pub use signer::RequestSigner;
