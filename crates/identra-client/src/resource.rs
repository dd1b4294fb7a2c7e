//! The resource property model.
//!
//! A remote resource is identified by its `href` (a URL as primary key) and
//! carries a JSON property map. Locally, every resource wraps a
//! [`PropertyMap`]: the raw values plus an explicit per-key
//! [`PropertyState`] ledger and a `materialized` flag. A map holding only an
//! `href` is an unmaterialized stub; the first read of any other property
//! fetches the full representation from the store and merges it in,
//! preserving local dirty values.
//!
//! Type dispatch is compile-time: each concrete resource implements
//! [`Resource`], and [`ResourceKind`] is the explicit tag table used where a
//! resource type is only known at runtime (see [`ResourceKind::materialize`]).

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};
use crate::resources::{Account, Application, Directory, Group};
use crate::store::DataStore;

/// Property name that identifies a resource.
pub const HREF_PROPERTY: &str = "href";

/// Local modification state of a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyState {
    /// Value mirrors the server representation.
    Clean,
    /// Value was set locally and has not been persisted.
    Dirty,
    /// Property was removed locally and has not been persisted.
    Deleted,
}

/// A resource's property values plus their modification ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Map<String, Value>,
    // only Dirty/Deleted are recorded; absence means Clean
    states: HashMap<String, PropertyState>,
    materialized: bool,
}

impl PropertyMap {
    /// An empty, transient map (no href, nothing persisted yet).
    pub fn transient() -> Self {
        Self::default()
    }

    /// Wrap a server (or stub) representation; all values start clean.
    ///
    /// A map holding nothing but an `href` is a reference stub and is not
    /// considered materialized.
    pub fn from_map(entries: Map<String, Value>) -> Self {
        let href_only = entries.len() == 1 && entries.contains_key(HREF_PROPERTY);
        let materialized = !entries.is_empty() && !href_only;
        Self {
            entries,
            states: HashMap::new(),
            materialized,
        }
    }

    /// The identifying href, if one has been assigned.
    pub fn href(&self) -> Option<&str> {
        self.entries.get(HREF_PROPERTY).and_then(Value::as_str)
    }

    /// Whether the resource has no assigned href yet.
    pub fn is_new(&self) -> bool {
        self.href().map_or(true, str::is_empty)
    }

    /// Whether the full server representation has been loaded.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Whether any property has been modified since the last sync.
    pub fn is_dirty(&self) -> bool {
        !self.states.is_empty()
    }

    /// The modification state of one property.
    pub fn state(&self, name: &str) -> PropertyState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(PropertyState::Clean)
    }

    /// Read a property value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Set a property, marking it dirty.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.entries.insert(name.clone(), value);
        self.states.insert(name, PropertyState::Dirty);
    }

    /// Swap in a value without dirtying the map (used when replacing a
    /// reference stub with its materialized form).
    pub fn set_clean(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Remove a property, marking it deleted.
    pub fn delete(&mut self, name: &str) {
        self.entries.remove(name);
        self.states.insert(name.to_string(), PropertyState::Deleted);
    }

    /// All property names currently present.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Names of properties modified since the last sync.
    pub fn dirty_names(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|(_, state)| **state == PropertyState::Dirty)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Merge a freshly fetched representation, keeping local dirty values.
    pub fn merge_materialized(&mut self, fetched: Map<String, Value>) {
        let dirty: Vec<(String, Value)> = self
            .states
            .iter()
            .filter(|(_, state)| **state == PropertyState::Dirty)
            .filter_map(|(name, _)| {
                self.entries.get(name).map(|value| (name.clone(), value.clone()))
            })
            .collect();
        let deleted: Vec<String> = self
            .states
            .iter()
            .filter(|(_, state)| **state == PropertyState::Deleted)
            .map(|(name, _)| name.clone())
            .collect();

        self.entries = fetched;
        for (name, value) in dirty {
            self.entries.insert(name, value);
        }
        for name in deleted {
            self.entries.remove(&name);
        }
        self.materialized = true;
    }

    /// Replace everything with a server representation; the ledger resets
    /// and every value is clean (used after create/save round-trips).
    pub fn replace_all(&mut self, entries: Map<String, Value>) {
        *self = Self::from_map(entries);
    }

    /// Render the map for transmission: every present property, with
    /// resource-valued entries collapsed to `{"href": ...}` stubs.
    ///
    /// A nested object without an `href` cannot be expressed as a reference
    /// and is rejected.
    pub fn to_payload(&self) -> ClientResult<Map<String, Value>> {
        let mut payload = Map::new();
        for (name, value) in &self.entries {
            let rendered = match value {
                Value::Object(nested) => {
                    let href = nested.get(HREF_PROPERTY).and_then(Value::as_str).ok_or_else(
                        || {
                            ClientError::illegal_state(format!(
                                "nested resource '{name}' must have an '{HREF_PROPERTY}' property"
                            ))
                        },
                    )?;
                    let mut stub = Map::new();
                    stub.insert(HREF_PROPERTY.to_string(), Value::String(href.to_string()));
                    Value::Object(stub)
                }
                other => other.clone(),
            };
            payload.insert(name.clone(), rendered);
        }
        Ok(payload)
    }
}

/// Tags for the concrete resource types the store can materialize.
///
/// This is the explicit dispatch table: where a resource type is only known
/// at runtime (webhook payloads, heterogeneous listings), the tag resolves
/// to a factory instead of any name-based lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A login account.
    Account,
    /// A directory of accounts.
    Directory,
    /// A group of accounts.
    Group,
    /// An application registration.
    Application,
}

impl ResourceKind {
    /// The cache region instance representations of this kind live in.
    pub fn cache_region(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Directory => "directories",
            Self::Group => "groups",
            Self::Application => "applications",
        }
    }

    /// Materialize a typed resource from a property map.
    pub fn materialize(self, store: DataStore, properties: PropertyMap) -> AnyResource {
        match self {
            Self::Account => AnyResource::Account(Account::from_parts(store, properties)),
            Self::Directory => AnyResource::Directory(Directory::from_parts(store, properties)),
            Self::Group => AnyResource::Group(Group::from_parts(store, properties)),
            Self::Application => {
                AnyResource::Application(Application::from_parts(store, properties))
            }
        }
    }
}

/// A resource whose concrete type was resolved at runtime via
/// [`ResourceKind`].
#[derive(Debug)]
pub enum AnyResource {
    /// A materialized [`Account`].
    Account(Account),
    /// A materialized [`Directory`].
    Directory(Directory),
    /// A materialized [`Group`].
    Group(Group),
    /// A materialized [`Application`].
    Application(Application),
}

/// A typed remote resource backed by a [`PropertyMap`] and a store handle.
pub trait Resource: Sized {
    /// The dispatch tag for this type.
    const KIND: ResourceKind;

    /// Construct from a store handle and a property map.
    fn from_parts(store: DataStore, properties: PropertyMap) -> Self;

    /// The shared backing state.
    fn data(&self) -> &ResourceData;

    /// The identifying href, once materialized or created.
    fn href(&self) -> Option<String> {
        self.data().href()
    }
}

/// Backing state shared by every resource type: the store handle, the kind
/// tag, and the lock-guarded property map.
///
/// Property reads may trigger a server fetch (lazy materialization), so the
/// map sits behind a lock and accessors take `&self`. Once a resource is
/// materialized its href never changes; updates replace property values,
/// not identity.
#[derive(Debug)]
pub struct ResourceData {
    store: DataStore,
    kind: ResourceKind,
    properties: RwLock<PropertyMap>,
}

impl ResourceData {
    /// Create backing state for a resource.
    pub fn new(store: DataStore, kind: ResourceKind, properties: PropertyMap) -> Self {
        Self {
            store,
            kind,
            properties: RwLock::new(properties),
        }
    }

    /// The store this resource was materialized from.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// The dispatch tag of the owning resource type.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The identifying href, if assigned.
    pub fn href(&self) -> Option<String> {
        self.properties.read().href().map(str::to_string)
    }

    /// Whether any property was modified locally.
    pub fn is_dirty(&self) -> bool {
        self.properties.read().is_dirty()
    }

    /// Whether the full representation has been loaded.
    pub fn is_materialized(&self) -> bool {
        self.properties.read().is_materialized()
    }

    /// Read a property, materializing the resource first if it is an
    /// unmaterialized stub and the property was not set locally.
    pub fn get_property(&self, name: &str) -> ClientResult<Option<Value>> {
        if name != HREF_PROPERTY {
            let needs_fetch = {
                let properties = self.properties.read();
                !properties.is_new()
                    && !properties.is_materialized()
                    && properties.state(name) == PropertyState::Clean
            };
            if needs_fetch {
                self.materialize()?;
            }
        }
        Ok(self.properties.read().get(name).cloned())
    }

    /// Fetch the full representation and merge it in, keeping dirty values.
    pub fn materialize(&self) -> ClientResult<()> {
        let href = self.href().ok_or_else(|| {
            ClientError::illegal_state("cannot materialize a resource without an href")
        })?;
        let fetched = self.store.fetch_properties(self.kind, &href)?;
        self.properties.write().merge_materialized(fetched);
        Ok(())
    }

    /// Set a property value, marking it dirty.
    pub fn set_property(&self, name: impl Into<String>, value: Value) {
        self.properties.write().set(name, value);
    }

    /// Remove a property, marking it deleted.
    pub fn delete_property(&self, name: &str) {
        self.properties.write().delete(name);
    }

    /// Read a string-valued property.
    pub fn get_string(&self, name: &str) -> ClientResult<Option<String>> {
        Ok(self
            .get_property(name)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    /// Read a reference-valued property as a typed resource.
    ///
    /// An `{"href": ...}`-only stub materializes lazily on its own first
    /// property access; no fetch happens here.
    pub fn get_reference<T: Resource>(&self, name: &str) -> ClientResult<Option<T>> {
        match self.get_property(name)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) if !map.is_empty() => Ok(Some(T::from_parts(
                self.store.clone(),
                PropertyMap::from_map(map),
            ))),
            Some(other) => Err(ClientError::illegal_state(format!(
                "property '{name}' is not a resource reference (found {other})"
            ))),
        }
    }

    /// Set a reference-valued property to another resource's href stub.
    pub fn set_reference<T: Resource>(&self, name: impl Into<String>, resource: &T) -> ClientResult<()> {
        let name = name.into();
        let href = resource.href().ok_or_else(|| {
            ClientError::illegal_state(format!(
                "nested resource '{name}' must have an '{HREF_PROPERTY}' property"
            ))
        })?;
        let mut stub = Map::new();
        stub.insert(HREF_PROPERTY.to_string(), Value::String(href));
        self.set_property(name, Value::Object(stub));
        Ok(())
    }

    /// Render the property map for transmission.
    pub fn to_payload(&self) -> ClientResult<Map<String, Value>> {
        self.properties.read().to_payload()
    }

    /// Replace the whole map with a server representation (post create/save).
    pub fn replace_properties(&self, entries: Map<String, Value>) {
        self.properties.write().replace_all(entries);
    }

    /// A point-in-time copy of the property map.
    pub fn snapshot(&self) -> PropertyMap {
        self.properties.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn href_only_maps_are_unmaterialized_stubs() {
        let stub = PropertyMap::from_map(map(json!({"href": "https://api.identra.io/v1/accounts/a1"})));
        assert!(!stub.is_materialized());
        assert!(!stub.is_new());

        let full = PropertyMap::from_map(map(json!({
            "href": "https://api.identra.io/v1/accounts/a1",
            "username": "jlpicard"
        })));
        assert!(full.is_materialized());
    }

    #[test]
    fn transient_maps_are_new_and_unmaterialized() {
        let transient = PropertyMap::transient();
        assert!(transient.is_new());
        assert!(!transient.is_materialized());
        assert!(!transient.is_dirty());
    }

    #[test]
    fn set_marks_properties_dirty() {
        let mut properties = PropertyMap::from_map(map(json!({
            "href": "https://api.identra.io/v1/accounts/a1",
            "username": "jlpicard"
        })));
        assert_eq!(properties.state("username"), PropertyState::Clean);
        properties.set("username", json!("locutus"));
        assert_eq!(properties.state("username"), PropertyState::Dirty);
        assert!(properties.is_dirty());
        assert_eq!(properties.dirty_names(), vec!["username".to_string()]);
    }

    #[test]
    fn set_clean_does_not_dirty_the_map() {
        let mut properties = PropertyMap::from_map(map(json!({
            "href": "h",
            "directory": {"href": "d"}
        })));
        properties.set_clean("directory", json!({"href": "d", "name": "Cadets"}));
        assert!(!properties.is_dirty());
    }

    #[test]
    fn merge_keeps_dirty_values_and_drops_deleted_ones() {
        let mut properties = PropertyMap::from_map(map(json!({
            "href": "https://api.identra.io/v1/accounts/a1"
        })));
        properties.set("username", json!("locutus"));
        properties.delete("middleName");

        properties.merge_materialized(map(json!({
            "href": "https://api.identra.io/v1/accounts/a1",
            "username": "jlpicard",
            "middleName": "Luc",
            "email": "capt@enterprise.example.com"
        })));

        assert!(properties.is_materialized());
        assert_eq!(properties.get("username"), Some(&json!("locutus")));
        assert_eq!(properties.get("email"), Some(&json!("capt@enterprise.example.com")));
        assert_eq!(properties.get("middleName"), None);
    }

    #[test]
    fn payload_collapses_nested_resources_to_href_stubs() {
        let properties = PropertyMap::from_map(map(json!({
            "href": "https://api.identra.io/v1/accounts/a1",
            "username": "jlpicard",
            "directory": {
                "href": "https://api.identra.io/v1/directories/d1",
                "name": "Starfleet"
            }
        })));
        let payload = properties.to_payload().unwrap();
        assert_eq!(
            payload.get("directory"),
            Some(&json!({"href": "https://api.identra.io/v1/directories/d1"}))
        );
        assert_eq!(payload.get("username"), Some(&json!("jlpicard")));
    }

    #[test]
    fn payload_rejects_nested_objects_without_href() {
        let properties = PropertyMap::from_map(map(json!({
            "href": "h",
            "directory": {"name": "Starfleet"}
        })));
        assert!(matches!(
            properties.to_payload(),
            Err(ClientError::IllegalState { .. })
        ));
    }

    #[test]
    fn kind_maps_to_stable_cache_regions() {
        assert_eq!(ResourceKind::Account.cache_region(), "accounts");
        assert_eq!(ResourceKind::Directory.cache_region(), "directories");
        assert_eq!(ResourceKind::Group.cache_region(), "groups");
        assert_eq!(ResourceKind::Application.cache_region(), "applications");
    }
}
