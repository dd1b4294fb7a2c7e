//! # Identra Core
//!
//! Foundation crate for the Identra SDK providing the pieces every other
//! layer depends on: API credentials, the TTL/TTI cache that backs both
//! resource storage and nonce tracking, and the core error types.
//!
//! ## Architecture
//!
//! ```text
//! identra-core/
//! ├── cache/          # TTL/TTI cache and named cache regions
//! ├── credentials/    # API key id/secret pair
//! └── error/          # Error types and Result alias
//! ```
//!
//! This crate is typically not used directly but imported by the other
//! `identra` crates.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod cache;
pub mod credentials;
pub mod error;

pub use cache::{Cache, CacheManager, CachePolicy, CacheStats};
pub use credentials::ApiCredentials;
pub use error::{CoreError, Result};

/// SDK name identifier, used in the default `User-Agent` header.
pub const SDK_NAME: &str = "identra-rust";

/// SDK version information.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
