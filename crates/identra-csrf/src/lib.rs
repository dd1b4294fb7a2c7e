//! # Identra CSRF
//!
//! Single-use signed token issuance and validation.
//!
//! A token is a compact HS256 JWT carrying a random id (`jti`), its issue
//! time, a not-before bound, and an expiry. Validation checks the signature
//! and the time bounds, then consumes the token by inserting its id into a
//! nonce cache — a token whose id is already present is a replay and is
//! rejected. The nonce cache's time-to-live is at least the token lifetime,
//! so an id can never be evicted while the token it guards is still
//! acceptable.
//!
//! Token states move one way: issued → consumed, or issued → expired. There
//! is no transition back.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use identra_csrf::TokenManager;
//!
//! let manager = TokenManager::new(b"a-well-kept-signing-key", Duration::from_secs(3600)).unwrap();
//! let token = manager.create_token().unwrap();
//! assert!(manager.is_valid(&token));   // first submission passes
//! assert!(!manager.is_valid(&token));  // the same token again is a replay
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod config;
pub mod manager;

pub use config::CsrfConfig;
pub use manager::{CsrfError, CsrfResult, TokenManager};
