//! The resource data store.
//!
//! The store owns the request path: qualify the href against the base URL,
//! consult the cache region for the resource kind, and on a miss issue a
//! signed request through the executor, unmarshal the JSON body, cache the
//! representation by href, and materialize the typed resource.
//!
//! Instance representations are cached by href; collection pages are always
//! fetched fresh (their membership can change underneath any cached copy),
//! but the items they carry are full representations that warm the instance
//! cache indirectly through `create`/`save` round-trips.
//!
//! Concurrent loads of one href may each fetch; the second `put` overwrites
//! the first. At-least-once materialization is the contract, not
//! exactly-once.

use std::sync::Arc;

use serde_json::{Map, Value};
use url::Url;

use identra_core::{CacheManager, SDK_NAME, SDK_VERSION};
use identra_transport::{Method, QueryString, Request, RequestExecutor};

use crate::collection::{Collection, PageRequest};
use crate::error::{ApiError, ClientError, ClientResult};
use crate::resource::{AnyResource, PropertyMap, Resource, ResourceKind, HREF_PROPERTY};

const MEDIA_TYPE_JSON: &str = "application/json";

/// A caching, materializing view of the remote resource model.
///
/// Cheap to clone; clones share the executor and cache regions. Every
/// resource holds one of these handles for lazy materialization.
#[derive(Debug, Clone)]
pub struct DataStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    base_url: Url,
    executor: RequestExecutor,
    caches: CacheManager<Value>,
}

impl DataStore {
    /// Assemble a store from its collaborators.
    pub fn new(base_url: Url, executor: RequestExecutor, caches: CacheManager<Value>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                base_url,
                executor,
                caches,
            }),
        }
    }

    /// Create a transient resource: no href, nothing persisted until
    /// [`DataStore::create`] is called with it.
    pub fn instantiate<T: Resource>(&self) -> T {
        T::from_parts(self.clone(), PropertyMap::transient())
    }

    /// Load a resource by href, consulting the cache first.
    pub fn load<T: Resource>(&self, href: &str) -> ClientResult<T> {
        let properties = self.fetch_properties(T::KIND, href)?;
        Ok(T::from_parts(self.clone(), PropertyMap::from_map(properties)))
    }

    /// Load a resource whose type is only known at runtime.
    pub fn load_any(&self, href: &str, kind: ResourceKind) -> ClientResult<AnyResource> {
        let properties = self.fetch_properties(kind, href)?;
        Ok(kind.materialize(self.clone(), PropertyMap::from_map(properties)))
    }

    /// Fetch one page of a collection. Collection responses are not cached.
    pub fn load_collection<T: Resource>(
        &self,
        href: &str,
        page: PageRequest,
    ) -> ClientResult<Collection<T>> {
        let href = self.qualify(href);
        let mut query = QueryString::new();
        page.apply(&mut query);
        let body = self
            .execute(Method::Get, &href, Some(query), None)?
            .ok_or_else(|| ClientError::serialization("collection response had no body"))?;
        Ok(Collection::from_map(self.clone(), href, &body))
    }

    /// Create a resource under a parent href and cache the result.
    ///
    /// The returned resource carries the server's representation, including
    /// the newly assigned href.
    pub fn create<T: Resource>(&self, parent_href: &str, resource: &T) -> ClientResult<T> {
        let parent_href = self.qualify(parent_href);
        let payload = resource.data().to_payload()?;
        let body = render_json(&payload)?;
        let returned = self
            .execute(Method::Post, &parent_href, None, Some(body))?
            .ok_or_else(|| ClientError::serialization("create response had no body"))?;
        self.cache_representation(T::KIND, &returned);
        Ok(T::from_parts(self.clone(), PropertyMap::from_map(returned)))
    }

    /// Persist local modifications of an already-created resource.
    ///
    /// Posts the full property map to the resource's own href and swaps the
    /// server's response back into the resource, clearing its dirty state.
    pub fn save<T: Resource>(&self, resource: &T) -> ClientResult<()> {
        let href = resource.data().href().ok_or_else(|| {
            ClientError::illegal_state(
                "save may only be called on resources that have already been persisted",
            )
        })?;
        let href = self.qualify(&href);
        let payload = resource.data().to_payload()?;
        let body = render_json(&payload)?;
        let returned = self
            .execute(Method::Post, &href, None, Some(body))?
            .ok_or_else(|| ClientError::serialization("save response had no body"))?;
        self.cache_representation(T::KIND, &returned);
        resource.data().replace_properties(returned);
        Ok(())
    }

    /// Delete a resource and evict its cache entry.
    pub fn delete<T: Resource>(&self, resource: &T) -> ClientResult<()> {
        let href = resource.data().href().ok_or_else(|| {
            ClientError::illegal_state("cannot delete a resource that has no href")
        })?;
        let href = self.qualify(&href);
        self.execute(Method::Delete, &href, None, None)?;
        self.inner.caches.region(T::KIND.cache_region()).remove(&href);
        Ok(())
    }

    /// Resolve an href's property map: cache region first, network second.
    pub(crate) fn fetch_properties(
        &self,
        kind: ResourceKind,
        href: &str,
    ) -> ClientResult<Map<String, Value>> {
        let href = self.qualify(href);
        let cache = self.inner.caches.region(kind.cache_region());
        if let Some(Value::Object(cached)) = cache.get(&href) {
            tracing::debug!(%href, region = kind.cache_region(), "cache hit");
            return Ok(cached);
        }
        tracing::debug!(%href, region = kind.cache_region(), "cache miss, fetching");
        let body = self
            .execute(Method::Get, &href, None, None)?
            .ok_or_else(|| ClientError::serialization("resource response had no body"))?;
        cache.put(href, Value::Object(body.clone()));
        Ok(body)
    }

    fn cache_representation(&self, kind: ResourceKind, properties: &Map<String, Value>) {
        if let Some(href) = properties.get(HREF_PROPERTY).and_then(Value::as_str) {
            self.inner
                .caches
                .region(kind.cache_region())
                .put(href.to_string(), Value::Object(properties.clone()));
        }
    }

    /// Turn a base-relative href into an absolute one.
    fn qualify(&self, href: &str) -> String {
        if href.len() >= 4 && href[..4].eq_ignore_ascii_case("http") {
            return href.to_string();
        }
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        if href.starts_with('/') {
            format!("{base}{href}")
        } else {
            format!("{base}/{href}")
        }
    }

    /// Issue one signed request and unmarshal the response.
    ///
    /// Non-2xx responses become [`ApiError`]s; the structured body is parsed
    /// when present and defaulted when not. Errors are never swallowed.
    fn execute(
        &self,
        method: Method,
        href: &str,
        query: Option<QueryString>,
        body: Option<String>,
    ) -> ClientResult<Option<Map<String, Value>>> {
        let mut request = Request::new(method, href)?;
        if let Some(query) = query {
            for (name, value) in query.iter() {
                request.query_mut().set(name, value);
            }
        }
        request.headers_mut().set("Accept", MEDIA_TYPE_JSON);
        request
            .headers_mut()
            .set("User-Agent", format!("{SDK_NAME}/{SDK_VERSION}"));
        if let Some(body) = body {
            request.headers_mut().set("Content-Type", MEDIA_TYPE_JSON);
            request = request.with_body(body);
        }

        let response = self.inner.executor.execute(request)?;

        let parsed = match response.body() {
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => Some(value),
                Err(error) if response.is_error() => {
                    // a broken error body must not mask the error itself
                    tracing::debug!(status = response.status(), %error, "unparseable error body");
                    None
                }
                Err(error) => {
                    return Err(ClientError::serialization(format!(
                        "unable to parse response body: {error}"
                    )))
                }
            },
            None => None,
        };

        if response.is_error() {
            let error = ApiError::from_body(response.status(), parsed.as_ref());
            tracing::debug!(status = error.status, code = error.code, "API error response");
            return Err(ClientError::Api(error));
        }

        match parsed {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(ClientError::serialization(format!(
                "expected a JSON object response, found {other}"
            ))),
        }
    }
}

fn render_json(payload: &Map<String, Value>) -> ClientResult<String> {
    serde_json::to_string(payload)
        .map_err(|e| ClientError::serialization(format!("unable to render request body: {e}")))
}
