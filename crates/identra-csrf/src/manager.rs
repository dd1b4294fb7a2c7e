//! Token issuance and single-use validation.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use identra_core::{Cache, CachePolicy};

use crate::config::CsrfConfig;

/// Result type for token creation.
pub type CsrfResult<T> = std::result::Result<T, CsrfError>;

/// Errors raised while creating tokens.
///
/// Validation never raises: a bad, expired, or replayed token is reported as
/// `false` by [`TokenManager::is_valid`] so callers branch on a boolean
/// instead of handling exceptions.
#[derive(Error, Debug, Clone)]
pub enum CsrfError {
    /// The signing key was empty or otherwise unusable.
    #[error("Invalid signing key: {reason}")]
    InvalidKey {
        /// Detailed reason the key was rejected.
        reason: String,
    },

    /// The token could not be signed.
    #[error("Unable to sign token: {reason}")]
    Signing {
        /// Detailed reason for the signing failure.
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// Issues and validates single-use HS256 tokens.
///
/// Expiry has second granularity (JWT claims are Unix timestamps); a token
/// created with a zero lifetime is invalid immediately.
pub struct TokenManager {
    config: CsrfConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    nonce_cache: Arc<Cache<String, String>>,
}

impl TokenManager {
    /// Create a manager with the default carrier names and the given token
    /// lifetime. The nonce cache is created internally with a time-to-live
    /// equal to the token lifetime.
    pub fn new(signing_key: &[u8], ttl: Duration) -> CsrfResult<Self> {
        Self::with_config(signing_key, CsrfConfig::default().with_ttl(ttl))
    }

    /// Create a manager with explicit carrier/lifetime settings.
    pub fn with_config(signing_key: &[u8], config: CsrfConfig) -> CsrfResult<Self> {
        let nonce_cache = Arc::new(Cache::new(
            "csrf-nonces",
            CachePolicy::unbounded().with_time_to_live(config.ttl),
        ));
        Self::with_nonce_cache(signing_key, config, nonce_cache)
    }

    /// Create a manager using an externally supplied nonce cache.
    ///
    /// The cache's time-to-live must be at least the token lifetime;
    /// otherwise a consumed id could be evicted while its token is still
    /// within its expiry window, reopening the replay it exists to close.
    pub fn with_nonce_cache(
        signing_key: &[u8],
        config: CsrfConfig,
        nonce_cache: Arc<Cache<String, String>>,
    ) -> CsrfResult<Self> {
        if signing_key.is_empty() {
            return Err(CsrfError::InvalidKey {
                reason: "signing key must not be empty".to_string(),
            });
        }
        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            nonce_cache,
        })
    }

    /// The carrier and lifetime settings in effect.
    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Issue a fresh token: random id, `iat = nbf = now`,
    /// `exp = now + ttl`, HS256-signed, compact-serialized.
    pub fn create_token(&self) -> CsrfResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now().timestamp();
        let claims = Claims {
            jti: id.clone(),
            iat: now,
            nbf: now,
            exp: now + self.config.ttl.as_secs() as i64,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CsrfError::Signing {
                reason: e.to_string(),
            })?;
        tracing::debug!(token_id = %id, "issued token");
        Ok(token)
    }

    /// Validate and consume a token.
    ///
    /// Returns `true` exactly once per token: the signature must verify, the
    /// time bounds must hold, and the id must not have been seen before.
    /// Consumption (inserting the id into the nonce cache) happens under one
    /// cache lock, so two concurrent submissions of the same token cannot
    /// both pass. Any failure — malformed input, bad signature, expired or
    /// not-yet-valid claims, replay — is reported as `false`, never as an
    /// error.
    pub fn is_valid(&self, token: &str) -> bool {
        // signature check only; time bounds are enforced explicitly below
        // so a zero-lifetime token is already expired in its issue second
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::new();

        let data = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data,
            Err(error) => {
                // likely to happen in normal operation, not an error condition
                tracing::debug!(error = %error, "token rejected during parse/verify");
                return false;
            }
        };

        let claims = data.claims;
        let now = Utc::now().timestamp();
        if claims.nbf > now {
            tracing::debug!(token_id = %claims.jti, "token not yet valid");
            return false;
        }
        if claims.exp <= now {
            tracing::debug!(token_id = %claims.jti, "token expired");
            return false;
        }

        if self
            .nonce_cache
            .put_if_absent(claims.jti.clone(), token.to_string())
            .is_some()
        {
            tracing::debug!(token_id = %claims.jti, "token already consumed, rejecting replay");
            return false;
        }
        true
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}
