//! API credentials used to sign outbound requests.
//!
//! A credential is a long-lived `(id, secret)` pair issued by the Identra
//! API. The secret participates in request signing and must never appear in
//! logs; `Debug` output redacts it.

use std::env;
use std::fmt;

use crate::error::{CoreError, Result};

/// Environment variable holding the API key id.
pub const API_KEY_ID_ENV_VAR: &str = "IDENTRA_API_KEY_ID";

/// Environment variable holding the API key secret.
pub const API_KEY_SECRET_ENV_VAR: &str = "IDENTRA_API_KEY_SECRET";

/// A long-lived API key id/secret pair.
///
/// Credentials are passed explicitly to the client builder; there is no
/// global registry or implicit lookup beyond the optional
/// [`ApiCredentials::from_env`] convenience constructor.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    id: String,
    secret: String,
}

impl ApiCredentials {
    /// Create credentials from an explicit id and secret.
    ///
    /// Both values must be non-empty.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let secret = secret.into();
        if id.trim().is_empty() {
            return Err(CoreError::invalid_credentials("API key id must not be empty"));
        }
        if secret.trim().is_empty() {
            return Err(CoreError::invalid_credentials(
                "API key secret must not be empty",
            ));
        }
        Ok(Self { id, secret })
    }

    /// Load credentials from the `IDENTRA_API_KEY_ID` and
    /// `IDENTRA_API_KEY_SECRET` environment variables.
    pub fn from_env() -> Result<Self> {
        let id = env::var(API_KEY_ID_ENV_VAR).map_err(|_| {
            CoreError::invalid_credentials(format!("{API_KEY_ID_ENV_VAR} is not set"))
        })?;
        let secret = env::var(API_KEY_SECRET_ENV_VAR).map_err(|_| {
            CoreError::invalid_credentials(format!("{API_KEY_SECRET_ENV_VAR} is not set"))
        })?;
        Self::new(id, secret)
    }

    /// The public key id, included verbatim in the `Authorization` header.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The signing secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_non_empty_pair() {
        let creds = ApiCredentials::new("my-id", "my-secret").unwrap();
        assert_eq!(creds.id(), "my-id");
        assert_eq!(creds.secret(), "my-secret");
    }

    #[test]
    fn rejects_empty_id_or_secret() {
        assert!(ApiCredentials::new("", "secret").is_err());
        assert!(ApiCredentials::new("id", "  ").is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let creds = ApiCredentials::new("my-id", "super-secret").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("my-id"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn from_env_reads_both_variables() {
        std::env::set_var(API_KEY_ID_ENV_VAR, "env-id");
        std::env::set_var(API_KEY_SECRET_ENV_VAR, "env-secret");
        let creds = ApiCredentials::from_env().unwrap();
        assert_eq!(creds.id(), "env-id");
        assert_eq!(creds.secret(), "env-secret");
        std::env::remove_var(API_KEY_ID_ENV_VAR);
        std::env::remove_var(API_KEY_SECRET_ENV_VAR);
    }
}
