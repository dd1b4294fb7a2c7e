//! HTTP request and response model.
//!
//! The types here are deliberately small: a request is a method, a URL, a
//! query string kept separate from the URL (the signer canonicalizes it
//! independently), multi-valued headers, and an optional fully-buffered
//! string body. Bodies are owned strings, so a retried request can always be
//! replayed.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::error::{TransportError, TransportResult};

/// HTTP methods used by the resource model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Retrieve a resource.
    Get,
    /// Create or update a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
    /// Retrieve headers only.
    Head,
    /// Query communication options.
    Options,
}

impl Method {
    /// The canonical uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-valued HTTP headers with case-insensitive names.
///
/// The name casing of the first `set`/`add` is preserved for transmission;
/// lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, Vec<String>>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    fn stored_key(&self, name: &str) -> Option<String> {
        self.entries
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Replace any existing values for `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if let Some(existing) = self.stored_key(&name) {
            self.entries.remove(&existing);
        }
        self.entries.insert(name, vec![value.into()]);
    }

    /// Append a value for `name`, keeping any existing ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.stored_key(&name) {
            Some(existing) => {
                if let Some(values) = self.entries.get_mut(&existing) {
                    values.push(value.into());
                }
            }
            None => {
                self.entries.insert(name, vec![value.into()]);
            }
        }
    }

    /// The first value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).and_then(|values| {
            values.first().map(String::as_str)
        })
    }

    /// All values for `name`, if present.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Whether a header with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get_all(name).is_some()
    }

    /// Remove a header, ignoring name case.
    pub fn remove(&mut self, name: &str) {
        if let Some(existing) = self.stored_key(name) {
            self.entries.remove(&existing);
        }
    }

    /// Iterate over `(name, values)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Query parameters with canonical (sorted, percent-encoded) rendering.
///
/// Parameter names are unique; setting a name twice replaces the value.
/// Iteration and rendering are always in name order, which is what makes
/// the signed form order-independent of how callers inserted parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    params: BTreeMap<String, String>,
}

impl QueryString {
    /// Create an empty query string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// The value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether any parameters are present.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterate over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Render the canonical form: parameters sorted by name, names and
    /// values percent-encoded, joined with `&`. Empty when no parameters.
    pub fn to_canonical_string(&self) -> String {
        let mut rendered = String::new();
        for (name, value) in &self.params {
            if !rendered.is_empty() {
                rendered.push('&');
            }
            rendered.push_str(&canonical_encode(name));
            rendered.push('=');
            rendered.push_str(&canonical_encode(value));
        }
        rendered
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

/// Percent-encode a single component with the canonical rules: everything
/// except ASCII alphanumerics and `-`, `_`, `.`, `~` is encoded, space as
/// `%20`.
pub(crate) fn canonical_encode(component: &str) -> String {
    urlencoding::encode(component).into_owned()
}

/// Canonicalize a URL path: percent-decode each segment and re-encode it
/// canonically, preserving `/` separators. An empty path becomes `/`.
pub(crate) fn canonicalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| segment.to_string());
            canonical_encode(&decoded)
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// An outbound API request.
///
/// Constructed per call and consumed by the signer, which appends `Host`,
/// the date header, and `Authorization` before transmission.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    query: QueryString,
    headers: Headers,
    body: Option<String>,
}

impl Request {
    /// Parse an absolute href into a request, splitting any query portion
    /// into the separate [`QueryString`].
    pub fn new(method: Method, href: &str) -> TransportResult<Self> {
        let mut url =
            Url::parse(href).map_err(|e| TransportError::invalid_url(href, e.to_string()))?;
        if url.host_str().is_none() {
            return Err(TransportError::invalid_url(href, "URL has no host"));
        }
        let mut query = QueryString::new();
        for (name, value) in url.query_pairs() {
            query.set(name.into_owned(), value.into_owned());
        }
        url.set_query(None);
        Ok(Self {
            method,
            url,
            query,
            headers: Headers::new(),
            body: None,
        })
    }

    /// Attach a fully-buffered string body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request URL without its query portion.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The query parameters.
    pub fn query(&self) -> &QueryString {
        &self.query
    }

    /// Mutable access to the query parameters.
    pub fn query_mut(&mut self) -> &mut QueryString {
        &mut self.query
    }

    /// Replace the whole query string (used to restore the pre-sign
    /// snapshot between retry attempts).
    pub fn set_query(&mut self, query: QueryString) {
        self.query = query;
    }

    /// The request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Replace all headers (used to restore the pre-sign snapshot between
    /// retry attempts).
    pub fn set_headers(&mut self, headers: Headers) {
        self.headers = headers;
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Redirect this request to a new target, replacing the URL and taking
    /// the query parameters from the `Location` value. Relative locations
    /// are resolved against the current URL.
    pub fn redirect_to(&mut self, location: &str) -> TransportResult<()> {
        let mut target = self
            .url
            .join(location)
            .map_err(|e| TransportError::invalid_url(location, e.to_string()))?;
        let mut query = QueryString::new();
        for (name, value) in target.query_pairs() {
            query.set(name.into_owned(), value.into_owned());
        }
        target.set_query(None);
        self.url = target;
        self.query = query;
        Ok(())
    }

    /// The full URL including the canonical query string, as dispatched by
    /// transports.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.query.to_canonical_string()));
        }
        url
    }
}

/// A response received from the API.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Option<String>,
}

impl Response {
    /// Assemble a response from its parts.
    pub fn new(status: u16, headers: Headers, body: Option<String>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The response body, if non-empty.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is 4xx or 5xx.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Whether the status is 4xx.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Whether the status is 5xx.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// The `Location` of a followable redirect (301, 302 or 307), if any.
    pub fn redirect_location(&self) -> Option<&str> {
        match self.status {
            301 | 302 | 307 => self.headers.get("Location"),
            _ => None,
        }
    }
}
