//! Typed resources.
//!
//! Thin, representative wrappers over the property model: each type is a
//! [`ResourceData`] plus accessors. String accessors return
//! `ClientResult<Option<_>>` because reading an unmaterialized stub may
//! trigger a server fetch; setters only touch local state and cannot fail.

use serde_json::Value;

use crate::collection::{Collection, PageRequest};
use crate::error::{ClientError, ClientResult};
use crate::resource::{PropertyMap, Resource, ResourceData, ResourceKind, HREF_PROPERTY};
use crate::store::DataStore;

/// Whether a resource is usable for login and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The resource is active.
    Enabled,
    /// The resource is suspended.
    Disabled,
}

impl Status {
    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }

    /// Parse the wire representation, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ENABLED" => Some(Self::Enabled),
            "DISABLED" => Some(Self::Disabled),
            _ => None,
        }
    }
}

macro_rules! status_accessors {
    () => {
        /// The resource status, when present.
        pub fn status(&self) -> ClientResult<Option<Status>> {
            Ok(self
                .data
                .get_string("status")?
                .and_then(|value| Status::parse(&value)))
        }

        /// Set the resource status.
        pub fn set_status(&self, status: Status) {
            self.data
                .set_property("status", Value::String(status.as_str().to_string()));
        }
    };
}

macro_rules! string_accessors {
    ($($(#[$doc:meta])* $name:ident, $setter:ident, $property:literal;)+) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> ClientResult<Option<String>> {
                self.data.get_string($property)
            }

            /// Set the property locally; persist with `save`.
            pub fn $setter(&self, value: impl Into<String>) {
                self.data.set_property($property, Value::String(value.into()));
            }
        )+
    };
}

/// A login account.
#[derive(Debug)]
pub struct Account {
    data: ResourceData,
}

impl Resource for Account {
    const KIND: ResourceKind = ResourceKind::Account;

    fn from_parts(store: DataStore, properties: PropertyMap) -> Self {
        Self {
            data: ResourceData::new(store, Self::KIND, properties),
        }
    }

    fn data(&self) -> &ResourceData {
        &self.data
    }
}

impl Account {
    string_accessors! {
        /// The unique login name.
        username, set_username, "username";
        /// The account's email address.
        email, set_email, "email";
        /// The account holder's given name.
        given_name, set_given_name, "givenName";
        /// The account holder's surname.
        surname, set_surname, "surname";
    }

    status_accessors!();

    /// Set the plaintext password for creation; never readable back.
    pub fn set_password(&self, value: impl Into<String>) {
        self.data
            .set_property("password", Value::String(value.into()));
    }

    /// The directory owning this account, resolved lazily.
    pub fn directory(&self) -> ClientResult<Option<Directory>> {
        self.data.get_reference("directory")
    }

    /// The groups this account belongs to.
    pub fn groups(&self, page: PageRequest) -> ClientResult<Collection<Group>> {
        collection_from_reference(&self.data, "groups", page)
    }
}

/// A directory of accounts.
#[derive(Debug)]
pub struct Directory {
    data: ResourceData,
}

impl Resource for Directory {
    const KIND: ResourceKind = ResourceKind::Directory;

    fn from_parts(store: DataStore, properties: PropertyMap) -> Self {
        Self {
            data: ResourceData::new(store, Self::KIND, properties),
        }
    }

    fn data(&self) -> &ResourceData {
        &self.data
    }
}

impl Directory {
    string_accessors! {
        /// The directory name, unique within a tenant.
        name, set_name, "name";
        /// Free-form description.
        description, set_description, "description";
    }

    status_accessors!();

    /// The accounts in this directory.
    pub fn accounts(&self, page: PageRequest) -> ClientResult<Collection<Account>> {
        collection_from_reference(&self.data, "accounts", page)
    }
}

/// A named group of accounts.
#[derive(Debug)]
pub struct Group {
    data: ResourceData,
}

impl Resource for Group {
    const KIND: ResourceKind = ResourceKind::Group;

    fn from_parts(store: DataStore, properties: PropertyMap) -> Self {
        Self {
            data: ResourceData::new(store, Self::KIND, properties),
        }
    }

    fn data(&self) -> &ResourceData {
        &self.data
    }
}

impl Group {
    string_accessors! {
        /// The group name, unique within its directory.
        name, set_name, "name";
        /// Free-form description.
        description, set_description, "description";
    }

    status_accessors!();

    /// The directory owning this group, resolved lazily.
    pub fn directory(&self) -> ClientResult<Option<Directory>> {
        self.data.get_reference("directory")
    }
}

/// An application registration that accounts may log in to.
#[derive(Debug)]
pub struct Application {
    data: ResourceData,
}

impl Resource for Application {
    const KIND: ResourceKind = ResourceKind::Application;

    fn from_parts(store: DataStore, properties: PropertyMap) -> Self {
        Self {
            data: ResourceData::new(store, Self::KIND, properties),
        }
    }

    fn data(&self) -> &ResourceData {
        &self.data
    }
}

impl Application {
    string_accessors! {
        /// The application name, unique within a tenant.
        name, set_name, "name";
        /// Free-form description.
        description, set_description, "description";
    }

    status_accessors!();

    /// The accounts that may log in to this application.
    pub fn accounts(&self, page: PageRequest) -> ClientResult<Collection<Account>> {
        collection_from_reference(&self.data, "accounts", page)
    }
}

/// Resolve a collection-valued reference property into a paged fetch.
fn collection_from_reference<T: Resource>(
    data: &ResourceData,
    name: &str,
    page: PageRequest,
) -> ClientResult<Collection<T>> {
    let value = data.get_property(name)?.ok_or_else(|| {
        ClientError::illegal_state(format!("resource has no '{name}' collection"))
    })?;
    let href = value
        .get(HREF_PROPERTY)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ClientError::illegal_state(format!(
                "collection reference '{name}' must have an '{HREF_PROPERTY}' property"
            ))
        })?
        .to_string();
    data.store().load_collection(&href, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_the_wire_format() {
        assert_eq!(Status::parse("ENABLED"), Some(Status::Enabled));
        assert_eq!(Status::parse("disabled"), Some(Status::Disabled));
        assert_eq!(Status::parse("other"), None);
        assert_eq!(Status::Enabled.as_str(), "ENABLED");
    }
}
