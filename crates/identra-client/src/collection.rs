//! Paged collection resources.
//!
//! A collection response carries `offset`/`limit` paging metadata and an
//! `items` array of resource representations. Items materialize lazily:
//! [`Collection::iter`] constructs typed resources on demand from the maps
//! already fetched, and re-iterating reuses them. A fresh paged fetch only
//! happens when the collection itself is requested from the store again.

use std::marker::PhantomData;

use serde_json::{Map, Value};

use identra_transport::QueryString;

use crate::resource::{PropertyMap, Resource};
use crate::store::DataStore;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 25;

/// Smallest accepted page size.
pub const MIN_LIMIT: usize = 1;

/// Largest accepted page size.
pub const MAX_LIMIT: usize = 100;

/// Paging parameters for a collection fetch.
///
/// Unset fields are omitted from the query and take the server defaults; a
/// requested limit is clamped into `1..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    offset: Option<usize>,
    limit: Option<usize>,
}

impl PageRequest {
    /// Paging with server defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the page at the given element index.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request a page size, clamped into the accepted range.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.clamp(MIN_LIMIT, MAX_LIMIT));
        self
    }

    /// The requested offset, if any.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// The requested (already clamped) limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub(crate) fn apply(&self, query: &mut QueryString) {
        if let Some(offset) = self.offset {
            query.set("offset", offset.to_string());
        }
        if let Some(limit) = self.limit {
            query.set("limit", limit.to_string());
        }
    }
}

/// One fetched page of a collection resource.
#[derive(Debug)]
pub struct Collection<T: Resource> {
    store: DataStore,
    href: String,
    offset: usize,
    limit: usize,
    items: Vec<Map<String, Value>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> Collection<T> {
    pub(crate) fn from_map(store: DataStore, href: String, map: &Map<String, Value>) -> Self {
        let offset = map
            .get("offset")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let limit = map
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_LIMIT as u64) as usize;
        let items = map
            .get("items")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| value.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            store,
            href,
            offset,
            limit,
            items,
            _marker: PhantomData,
        }
    }

    /// The collection's href (without paging parameters).
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Index of the first element of this page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Page size the server applied.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of elements in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate the page's elements as typed resources.
    ///
    /// Restartable: each call walks the already-fetched representations
    /// again without touching the network.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().map(|item| {
            T::from_parts(self.store.clone(), PropertyMap::from_map(item.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn limits_are_clamped_into_the_accepted_range() {
        assert_eq!(PageRequest::new().with_limit(0).limit(), Some(1));
        assert_eq!(PageRequest::new().with_limit(25).limit(), Some(25));
        assert_eq!(PageRequest::new().with_limit(5000).limit(), Some(100));
    }

    #[test]
    fn unset_paging_adds_no_query_parameters() {
        let mut query = QueryString::new();
        PageRequest::new().apply(&mut query);
        assert!(query.is_empty());

        PageRequest::new().with_offset(50).with_limit(10).apply(&mut query);
        assert_eq!(query.get("offset"), Some("50"));
        assert_eq!(query.get("limit"), Some("10"));
    }
}
