//! End-to-end signing behavior through the public API.

use chrono::TimeZone;
use pretty_assertions::assert_eq;

use identra_core::ApiCredentials;
use identra_transport::signer::DATE_HEADER;
use identra_transport::{Method, Request, RequestSigner};

#[test]
fn reference_request_produces_the_published_authorization_header() {
    let signer = RequestSigner::new(
        ApiCredentials::new("3RLOQCNCD0AHT5HRGPRO7TAPM", "secret").unwrap(),
    );
    let mut request = Request::new(Method::Get, "https://api.identra.io/v1/applications").unwrap();
    let date = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    signer
        .sign_with(&mut request, date, "a43a9d25-ab06-421e-8605-33fd1e760825")
        .unwrap();

    assert_eq!(request.headers().get("Host"), Some("api.identra.io"));
    assert_eq!(request.headers().get(DATE_HEADER), Some("20240101T000000Z"));
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
fn caller_headers_participate_in_the_signed_header_list() {
    let signer = RequestSigner::new(ApiCredentials::new("id", "secret").unwrap());
    let mut request = Request::new(Method::Get, "https://api.identra.io/v1/accounts").unwrap();
    request.headers_mut().set("Accept", "application/json");

    let date = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    signer.sign_with(&mut request, date, "nonce").unwrap();

    let authorization = request.headers().get("Authorization").unwrap();
    assert!(authorization.contains("sauthcSignedHeaders=accept;host;x-identra-date"));
}
