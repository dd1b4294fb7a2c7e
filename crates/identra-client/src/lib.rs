//! # Identra Client
//!
//! Client for the Identra identity-management REST API: a cached,
//! lazily-materializing resource data store behind a small typed facade.
//!
//! ## Features
//!
//! - Explicit dependency injection: credentials, base URL, cache policy,
//!   retry policy, and transport are all constructor inputs
//! - Href-keyed caching with TTL/TTI expiry per resource region
//! - Lazy materialization of reference-valued properties
//! - Typed resources (accounts, directories, groups, applications) over an
//!   explicit property-state ledger
//!
//! ## Usage
//!
//! ```rust,no_run
//! use identra_client::{Client, PageRequest};
//! use identra_client::resources::Account;
//! use identra_core::ApiCredentials;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .credentials(ApiCredentials::new("my-key-id", "my-key-secret")?)
//!     .build()?;
//!
//! let account: Account = client.load("/accounts/3fLduW6Kri3F0y9EXAmPlE")?;
//! println!("username: {:?}", account.username()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Transport failures and structured API error bodies both surface as
//! [`ClientError`]; nothing is swallowed. Cache misses and expired entries
//! are absence, never errors.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

use std::time::Duration;

use url::Url;

use identra_core::{ApiCredentials, CacheManager, CachePolicy};
use identra_transport::{HttpTransport, ReqwestTransport, RequestExecutor, RetryConfig};

pub mod collection;
pub mod error;
pub mod resource;
pub mod resources;
pub mod store;

pub use collection::{Collection, PageRequest};
pub use error::{ApiError, ClientError, ClientResult};
pub use resource::{AnyResource, PropertyMap, PropertyState, Resource, ResourceKind};
pub use resources::Status;
pub use store::DataStore;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.identra.io/v1";

/// Default expiry applied to every cache region: one hour since creation
/// and one hour since last access.
pub fn default_cache_policy() -> CachePolicy {
    CachePolicy::unbounded()
        .with_time_to_live(Duration::from_secs(3600))
        .with_time_to_idle(Duration::from_secs(3600))
}

/// The SDK entry point: a thin facade over the [`DataStore`].
#[derive(Debug)]
pub struct Client {
    data_store: DataStore,
}

impl Client {
    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The underlying data store.
    pub fn data_store(&self) -> &DataStore {
        &self.data_store
    }

    /// Create a transient resource of the given type.
    pub fn instantiate<T: Resource>(&self) -> T {
        self.data_store.instantiate()
    }

    /// Load a resource by absolute or base-relative href.
    pub fn load<T: Resource>(&self, href: &str) -> ClientResult<T> {
        self.data_store.load(href)
    }

    /// Load a resource whose type is only known at runtime.
    pub fn load_any(&self, href: &str, kind: ResourceKind) -> ClientResult<AnyResource> {
        self.data_store.load_any(href, kind)
    }

    /// Fetch one page of a collection.
    pub fn load_collection<T: Resource>(
        &self,
        href: &str,
        page: PageRequest,
    ) -> ClientResult<Collection<T>> {
        self.data_store.load_collection(href, page)
    }

    /// Create a resource under a parent href.
    pub fn create<T: Resource>(&self, parent_href: &str, resource: &T) -> ClientResult<T> {
        self.data_store.create(parent_href, resource)
    }

    /// Persist local modifications of a resource.
    pub fn save<T: Resource>(&self, resource: &T) -> ClientResult<()> {
        self.data_store.save(resource)
    }

    /// Delete a resource.
    pub fn delete<T: Resource>(&self, resource: &T) -> ClientResult<()> {
        self.data_store.delete(resource)
    }
}

/// Configures and assembles a [`Client`].
///
/// Every collaborator is an explicit input; nothing is resolved from global
/// state. Credentials fall back to the `IDENTRA_API_KEY_ID` /
/// `IDENTRA_API_KEY_SECRET` environment variables when not provided.
#[derive(Debug)]
pub struct ClientBuilder {
    credentials: Option<ApiCredentials>,
    base_url: String,
    cache_policy: CachePolicy,
    retry: RetryConfig,
    transport: Option<Box<dyn HttpTransport>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// A builder with the default base URL, cache policy and retry policy.
    pub fn new() -> Self {
        Self {
            credentials: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_policy: default_cache_policy(),
            retry: RetryConfig::default(),
            transport: None,
        }
    }

    /// Use the given signing credentials.
    pub fn credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Point the client at a different API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Apply a different default cache policy to every region.
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Tune retry and backoff behavior.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Use a custom HTTP transport instead of the built-in blocking client.
    pub fn transport(mut self, transport: Box<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Assemble the client.
    pub fn build(self) -> ClientResult<Client> {
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => ApiCredentials::from_env()?,
        };
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::configuration(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        let transport: Box<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::new()?),
        };
        let executor =
            RequestExecutor::new(credentials, transport).with_retry_config(self.retry);
        let caches = CacheManager::new(self.cache_policy);
        Ok(Client {
            data_store: DataStore::new(base_url, executor, caches),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_a_malformed_base_url() {
        let credentials = ApiCredentials::new("id", "secret").unwrap();
        let result = Client::builder()
            .credentials(credentials)
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }
}
