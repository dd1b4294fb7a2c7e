//! SAuthc1 request signing.
//!
//! Every outbound API call carries an `Authorization` header computed from a
//! canonical, whitespace- and ordering-normalized form of the request. The
//! exact byte order of the canonical form matters for interoperability with
//! the server: method, canonical path, canonical query string, canonical
//! headers block, signed-header list, and the lowercase-hex SHA-256 hash of
//! the body, joined by newlines. The signature itself is an HMAC-SHA256 over
//! a derived key ladder seeded with the credential secret, the date stamp,
//! and a per-invocation nonce, which makes signed requests replay-resistant.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use identra_core::ApiCredentials;

use crate::error::{TransportError, TransportResult};
use crate::request::{canonicalize_path, Headers, Request};

/// Authentication scheme name, also the prefix of the derived key ladder.
pub const AUTHENTICATION_SCHEME: &str = "SAuthc1";

/// Algorithm label in the string-to-sign.
pub const ALGORITHM: &str = "HMAC-SHA-256";

/// Terminator of the credential scope id.
pub const ID_TERMINATOR: &str = "sauthc1_request";

/// Custom date header set on every signed request.
pub const DATE_HEADER: &str = "X-Identra-Date";

const HOST_HEADER: &str = "Host";
const AUTHORIZATION_HEADER: &str = "Authorization";
const SAUTHC1_ID: &str = "sauthc1Id";
const SAUTHC1_SIGNED_HEADERS: &str = "sauthcSignedHeaders";
const SAUTHC1_SIGNATURE: &str = "sauthc1Signature";

const DATE_STAMP_FORMAT: &str = "%Y%m%d";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

type HmacSha256 = Hmac<Sha256>;

/// Signs requests with the SAuthc1 scheme.
///
/// The signer holds no per-invocation state beyond local variables, so it is
/// inherently reentrant; every call generates a fresh nonce and timestamp.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    /// Create a signer for the given credentials.
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    /// Sign a request with the current time and a random nonce.
    ///
    /// Sets the `Host`, `X-Identra-Date` and `Authorization` headers in
    /// place. Re-signing the same request (as the executor does between
    /// retry attempts) regenerates both nonce and timestamp.
    pub fn sign(&self, request: &mut Request) -> TransportResult<()> {
        let nonce = Uuid::new_v4().to_string();
        self.sign_with(request, Utc::now(), &nonce)
    }

    /// Sign with an explicit date and nonce.
    ///
    /// The signature is a pure deterministic function of the request, the
    /// credential, the date, and the nonce, which is what makes this entry
    /// point usable for reproducible verification.
    pub fn sign_with(
        &self,
        request: &mut Request,
        date: DateTime<Utc>,
        nonce: &str,
    ) -> TransportResult<()> {
        let host = request
            .url()
            .host_str()
            .ok_or_else(|| TransportError::signature("request URL has no host"))?
            .to_string();
        // the Host header participates in the signature, so it has to be on
        // the request before the canonical form is built
        let host_header = match request.url().port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };
        request.headers_mut().set(HOST_HEADER, host_header);

        let timestamp = date.format(TIMESTAMP_FORMAT).to_string();
        let date_stamp = date.format(DATE_STAMP_FORMAT).to_string();
        request.headers_mut().set(DATE_HEADER, timestamp.clone());

        let method = request.method().as_str();
        let canonical_path = canonicalize_path(request.url().path());
        let canonical_query = request.query().to_canonical_string();
        let (canonical_headers, signed_headers) = canonicalize_headers(request.headers());
        let body_hash = sha256_hex(request.body().unwrap_or(""));

        let canonical_request = format!(
            "{method}\n{canonical_path}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{body_hash}"
        );
        tracing::debug!(
            scheme = AUTHENTICATION_SCHEME,
            canonical_request = %canonical_request,
            "built canonical request"
        );

        let id = format!(
            "{}/{date_stamp}/{nonce}/{ID_TERMINATOR}",
            self.credentials.id()
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{id}\n{}",
            sha256_hex(&canonical_request)
        );

        // derived key ladder: secret -> date -> nonce -> terminator
        let mut k_secret = AUTHENTICATION_SCHEME.as_bytes().to_vec();
        k_secret.extend_from_slice(self.credentials.secret().as_bytes());
        let k_date = hmac_sha256(&k_secret, date_stamp.as_bytes())?;
        let k_nonce = hmac_sha256(&k_date, nonce.as_bytes())?;
        let k_signing = hmac_sha256(&k_nonce, ID_TERMINATOR.as_bytes())?;

        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{AUTHENTICATION_SCHEME} {SAUTHC1_ID}={id}, \
             {SAUTHC1_SIGNED_HEADERS}={signed_headers}, \
             {SAUTHC1_SIGNATURE}={signature}"
        );
        request.headers_mut().set(AUTHORIZATION_HEADER, authorization);
        Ok(())
    }
}

/// Build the canonical headers block and the signed-headers list.
///
/// Names are lowercased and sorted case-insensitively; each block line is
/// `name:comma-joined-values` followed by a newline (the block keeps its
/// trailing newline when joined into the canonical request).
fn canonicalize_headers(headers: &Headers) -> (String, String) {
    let mut pairs: Vec<(&str, &[String])> = headers.iter().collect();
    pairs.sort_by_key(|(name, _)| name.to_lowercase());

    let mut block = String::new();
    let mut signed = String::new();
    for (name, values) in pairs {
        let lower = name.to_lowercase();
        block.push_str(&lower);
        block.push(':');
        block.push_str(&values.join(","));
        block.push('\n');
        if !signed.is_empty() {
            signed.push(';');
        }
        signed.push_str(&lower);
    }
    (block, signed)
}

fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> TransportResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
        TransportError::signature(format!("unable to initialize {ALGORITHM}: {e}"))
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn signer() -> RequestSigner {
        RequestSigner::new(
            ApiCredentials::new("3RLOQCNCD0AHT5HRGPRO7TAPM", "secret").unwrap(),
        )
    }

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    const FIXED_NONCE: &str = "a43a9d25-ab06-421e-8605-33fd1e760825";

    #[test]
    fn signs_get_request_with_known_signature() {
        let mut request =
            Request::new(Method::Get, "https://api.identra.io/v1/applications").unwrap();
        signer()
            .sign_with(&mut request, fixed_date(), FIXED_NONCE)
            .unwrap();

        assert_eq!(request.headers().get("Host"), Some("api.identra.io"));
        assert_eq!(
            request.headers().get(DATE_HEADER),
            Some("20240101T000000Z")
        );
        assert_eq!(
            request.headers().get("Authorization"),
            Some(
                "SAuthc1 sauthc1Id=3RLOQCNCD0AHT5HRGPRO7TAPM/20240101/\
                 a43a9d25-ab06-421e-8605-33fd1e760825/sauthc1_request, \
                 sauthcSignedHeaders=host;x-identra-date, \
                 sauthc1Signature=442609a7fc2d52caa99f9ce24e34177a1dc74f0745aa94dee940e2af01f7110d"
            )
        );
    }

    #[test]
    fn signs_post_request_with_query_and_body() {
        let mut request = Request::new(
            Method::Post,
            "https://api.identra.io/v1/directories/2SKhstu8PlaekcaEXampLE/accounts?limit=25&expand=groups",
        )
        .unwrap()
        .with_body(r#"{"username":"jlpicard"}"#);
        signer()
            .sign_with(&mut request, fixed_date(), FIXED_NONCE)
            .unwrap();

        let authorization = request.headers().get("Authorization").unwrap();
        assert!(authorization.ends_with(
            "sauthc1Signature=81ea5dcce4380be5f2785d31bd6b1daeb9d156c32d24c9b50f56c5ccbe7d77e1"
        ));
    }

    #[test]
    fn signing_is_deterministic_for_fixed_inputs() {
        let mut a = Request::new(Method::Get, "https://api.identra.io/v1/tenants/current").unwrap();
        let mut b = a.clone();
        signer().sign_with(&mut a, fixed_date(), FIXED_NONCE).unwrap();
        signer().sign_with(&mut b, fixed_date(), FIXED_NONCE).unwrap();
        assert_eq!(
            a.headers().get("Authorization"),
            b.headers().get("Authorization")
        );
    }

    #[test]
    fn any_canonical_component_change_alters_the_signature() {
        let base = Request::new(Method::Get, "https://api.identra.io/v1/accounts").unwrap();

        let mut reference = base.clone();
        signer()
            .sign_with(&mut reference, fixed_date(), FIXED_NONCE)
            .unwrap();
        let reference_auth = reference.headers().get("Authorization").unwrap().to_string();

        // different method
        let mut changed = Request::new(Method::Delete, "https://api.identra.io/v1/accounts").unwrap();
        signer()
            .sign_with(&mut changed, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_ne!(changed.headers().get("Authorization").unwrap(), reference_auth);

        // different path
        let mut changed = Request::new(Method::Get, "https://api.identra.io/v1/groups").unwrap();
        signer()
            .sign_with(&mut changed, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_ne!(changed.headers().get("Authorization").unwrap(), reference_auth);

        // extra header value
        let mut changed = base.clone();
        changed.headers_mut().set("Accept", "application/json");
        signer()
            .sign_with(&mut changed, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_ne!(changed.headers().get("Authorization").unwrap(), reference_auth);

        // extra query parameter
        let mut changed = base.clone();
        changed.query_mut().set("limit", "25");
        signer()
            .sign_with(&mut changed, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_ne!(changed.headers().get("Authorization").unwrap(), reference_auth);
    }

    #[test]
    fn query_parameter_order_does_not_affect_the_signature() {
        let mut a = Request::new(
            Method::Get,
            "https://api.identra.io/v1/accounts?offset=0&limit=25",
        )
        .unwrap();
        let mut b = Request::new(
            Method::Get,
            "https://api.identra.io/v1/accounts?limit=25&offset=0",
        )
        .unwrap();
        signer().sign_with(&mut a, fixed_date(), FIXED_NONCE).unwrap();
        signer().sign_with(&mut b, fixed_date(), FIXED_NONCE).unwrap();
        assert_eq!(
            a.headers().get("Authorization"),
            b.headers().get("Authorization")
        );
    }

    #[test]
    fn non_default_port_is_part_of_the_host_header() {
        let mut request =
            Request::new(Method::Get, "https://localhost:8443/v1/accounts").unwrap();
        signer()
            .sign_with(&mut request, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_eq!(request.headers().get("Host"), Some("localhost:8443"));

        let mut request = Request::new(Method::Get, "https://localhost:443/v1/accounts").unwrap();
        signer()
            .sign_with(&mut request, fixed_date(), FIXED_NONCE)
            .unwrap();
        assert_eq!(request.headers().get("Host"), Some("localhost"));
    }

    #[test]
    fn fresh_sign_calls_use_fresh_nonces() {
        let mut a = Request::new(Method::Get, "https://api.identra.io/v1/accounts").unwrap();
        let mut b = a.clone();
        signer().sign(&mut a).unwrap();
        signer().sign(&mut b).unwrap();
        assert_ne!(
            a.headers().get("Authorization"),
            b.headers().get("Authorization")
        );
    }
}
