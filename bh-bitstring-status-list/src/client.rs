// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Retrieval of Status List Credentials over HTTP.

use std::future::Future;

use bherror::traits::ForeignError as _;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use crate::{DecodedStatusList, DetailedError, DetailedResult, Error, Result};

/// Interface providing functionality of sending HTTP GET request.
///
/// It allows the user to plug in a more restrictive HTTP client, e.g. one
/// which only allows a set of known hosts.
pub trait HttpGetClient: Sync {
    /// Error type used by this trait.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Performs a HTTP GET request with provided `url`.
    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<reqwest::Response, Self::Err>> + Send;

    /// Tells what kind of failure the `error` returned by [`Self::get`] is.
    ///
    /// Every failure is treated as a [`TransportFailure::Network`] unless
    /// overridden.
    fn transport_failure(&self, _error: &Self::Err) -> TransportFailure {
        TransportFailure::Network
    }
}

/// The kind of a failed HTTP request that did not produce any response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The host could not be reached.
    Network,
    /// The request was blocked by the cross-origin policy. Only clients
    /// running in a browser can tell this apart from other failures.
    Cors,
    /// The request timed out.
    Timeout,
    /// The request could not even be made, e.g. because of an invalid URL.
    Unknown,
}

impl TransportFailure {
    fn into_error(self, url: &str) -> Error {
        match self {
            Self::Network => Error::Network(url.to_owned()),
            Self::Cors => Error::Cors(url.to_owned()),
            Self::Timeout => Error::Timeout(url.to_owned()),
            Self::Unknown => Error::Unknown(format!("request to {} could not be made", url)),
        }
    }
}

/// [`HttpGetClient`] implementation using the [`reqwest`] crate.
///
/// Its failures are classified as timeouts, request construction failures
/// ([`TransportFailure::Unknown`]) or plain network failures. It never reports
/// [`TransportFailure::Cors`].
pub struct ReqwestGetClient(Client);

impl ReqwestGetClient {
    /// Construct [`ReqwestGetClient`] from [`Client`].
    pub fn new(client: Client) -> Self {
        Self(client)
    }

    /// Construct [`ReqwestGetClient`] from [`ClientBuilder`].
    ///
    /// This is the place to configure timeouts, proxies and TLS.
    pub fn from_builder(builder: ClientBuilder) -> reqwest::Result<Self> {
        Ok(ReqwestGetClient(builder.build()?))
    }
}

impl HttpGetClient for ReqwestGetClient {
    type Err = reqwest::Error;

    fn get(&self, url: &str) -> impl Future<Output = reqwest::Result<reqwest::Response>> {
        self.0.get(url).send()
    }

    fn transport_failure(&self, error: &reqwest::Error) -> TransportFailure {
        if error.is_timeout() {
            TransportFailure::Timeout
        } else if error.is_builder() {
            TransportFailure::Unknown
        } else {
            TransportFailure::Network
        }
    }
}

/// Fetches the Status List Credential at `url` and decodes it.
///
/// An unsuccessful HTTP status is reported with its own error code and the
/// status in [`DetailedError::status_code`]. The body must be a JSON
/// document accepted by [`decode_document`][crate::decode_document].
pub async fn fetch_status_list(
    client: &impl HttpGetClient,
    url: &str,
) -> DetailedResult<DecodedStatusList> {
    fetch(client, url).await.map_err(DetailedError::from)
}

async fn fetch(client: &impl HttpGetClient, url: &str) -> Result<DecodedStatusList> {
    tracing::debug!(url, "Fetching Status List");

    let response = client
        .get(url)
        .await
        .match_foreign_err(|error| client.transport_failure(error).into_error(url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(bherror::Error::root(Error::from_http_status(
            status.as_u16(),
        )));
    }

    let body = response
        .bytes()
        .await
        .foreign_err(|| Error::Network(url.to_owned()))?;

    let document: Value = serde_json::from_slice(&body).foreign_err(|| Error::InvalidJson)?;

    DecodedStatusList::decode(document)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io;

    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde_json::json;

    use super::*;
    use crate::{
        credential::tests::example_credential, envelope::tests::enveloped, utils::tests::gzip,
        CredentialShape, ErrorCode,
    };

    pub(crate) const URL: &str = "https://example.com/credentials/status/3";

    pub(crate) struct StubClient {
        expected_url: &'static str,
        response: http::Response<String>,
    }

    impl StubClient {
        pub(crate) fn new(status: u16, body: String) -> Self {
            Self {
                expected_url: URL,
                response: http::Response::builder()
                    .status(status)
                    .body(body)
                    .unwrap(),
            }
        }

        pub(crate) fn with_json(document: &Value) -> Self {
            Self::new(200, document.to_string())
        }
    }

    impl HttpGetClient for StubClient {
        type Err = reqwest::Error;

        async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
            if url != self.expected_url {
                panic!("Unexpected url: {}", url);
            }
            Ok(reqwest::Response::from(self.response.clone()))
        }
    }

    /// Fails every request with the given I/O error kind.
    struct FailingClient(io::ErrorKind);

    impl HttpGetClient for FailingClient {
        type Err = io::Error;

        async fn get(&self, _url: &str) -> io::Result<reqwest::Response> {
            Err(io::Error::new(self.0, "connection failed"))
        }

        fn transport_failure(&self, error: &io::Error) -> TransportFailure {
            match error.kind() {
                io::ErrorKind::TimedOut => TransportFailure::Timeout,
                io::ErrorKind::PermissionDenied => TransportFailure::Cors,
                io::ErrorKind::InvalidInput => TransportFailure::Unknown,
                _ => TransportFailure::Network,
            }
        }
    }

    /// Uses the default failure classification.
    struct UnreachableClient;

    impl HttpGetClient for UnreachableClient {
        type Err = io::Error;

        async fn get(&self, _url: &str) -> io::Result<reqwest::Response> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no route to host"))
        }
    }

    fn encoded_list(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(gzip(bytes))
    }

    #[tokio::test]
    async fn test_fetch_embedded() {
        let bytes = [0x00u8, 0x04, 0x00, 0x00];
        let client = StubClient::with_json(&example_credential(&encoded_list(&bytes)));

        let decoded = fetch_status_list(&client, URL).await.unwrap();

        assert_eq!(CredentialShape::Embedded, decoded.shape());
        assert_eq!(32, decoded.total_bits());
        assert!(decoded.bit_status(10).unwrap());
        assert!(!decoded.bit_status(11).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_enveloped() {
        let bytes = [0x80u8; 16];
        let credential = example_credential(&encoded_list(&bytes));
        let document = enveloped("data:application/vc-ld+jwt,", &credential);
        let client = StubClient::with_json(&document);

        let decoded = fetch_status_list(&client, URL).await.unwrap();

        assert_eq!(CredentialShape::Enveloped, decoded.shape());
        assert_eq!(Some(&document), decoded.envelope());
        assert!(decoded.bit_status(7).unwrap());
        assert!(!decoded.bit_status(8).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_http_errors() {
        let cases = [
            (404, ErrorCode::NotFound),
            (401, ErrorCode::Unauthorized),
            (403, ErrorCode::Forbidden),
            (500, ErrorCode::ServerError),
            (502, ErrorCode::BadGateway),
            (503, ErrorCode::ServiceUnavailable),
            (418, ErrorCode::ServerError),
        ];

        for (status, code) in cases {
            let client = StubClient::new(status, "{}".to_owned());

            let err = fetch_status_list(&client, URL).await.unwrap_err();

            assert_eq!(code, err.code, "status={}", status);
            assert_eq!(Some(status), err.status_code);
            assert!(err.suggestion.is_some());
        }
    }

    #[tokio::test]
    async fn test_fetch_service_unavailable_serialized() {
        let client = StubClient::new(503, String::new());

        let err = fetch_status_list(&client, URL).await.unwrap_err();
        let value = serde_json::to_value(&err).unwrap();

        assert_eq!(json!("SERVICE_UNAVAILABLE"), value["code"]);
        assert_eq!(json!(503), value["statusCode"]);
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let client = StubClient::new(200, "<html>not json</html>".to_owned());

        let err = fetch_status_list(&client, URL).await.unwrap_err();

        assert_eq!(ErrorCode::InvalidJson, err.code);
        assert!(err.details.is_some());
        assert_eq!(None, err.status_code);
    }

    #[tokio::test]
    async fn test_fetch_missing_type() {
        let client = StubClient::with_json(&json!({
            "credentialSubject": {
                "type": "BitstringStatusList",
                "encodedList": "H4sI"
            }
        }));

        let err = fetch_status_list(&client, URL).await.unwrap_err();

        assert_eq!(ErrorCode::MissingCredentialType, err.code);
    }

    #[tokio::test]
    async fn test_fetch_decoding_error_keeps_code() {
        let client = StubClient::with_json(&example_credential("H4sIAAAA"));

        let err = fetch_status_list(&client, URL).await.unwrap_err();

        assert_eq!(ErrorCode::GzipDecodeError, err.code);
    }

    #[tokio::test]
    async fn test_transport_failures() {
        let cases = [
            (io::ErrorKind::ConnectionRefused, ErrorCode::NetworkError),
            (io::ErrorKind::TimedOut, ErrorCode::Timeout),
            (io::ErrorKind::PermissionDenied, ErrorCode::CorsError),
            (io::ErrorKind::InvalidInput, ErrorCode::UnknownError),
        ];

        for (kind, code) in cases {
            let err = fetch_status_list(&FailingClient(kind), URL)
                .await
                .unwrap_err();

            assert_eq!(code, err.code, "kind={:?}", kind);
            assert_eq!(Some("connection failed".to_owned()), err.details);
            assert_eq!(None, err.status_code);
        }
    }

    #[tokio::test]
    async fn test_default_transport_failure() {
        let err = fetch_status_list(&UnreachableClient, URL)
            .await
            .unwrap_err();

        assert_eq!(ErrorCode::NetworkError, err.code);
        assert!(err.message.contains(URL));
    }

    #[tokio::test]
    async fn test_reqwest_invalid_url() {
        let client = ReqwestGetClient::from_builder(Client::builder()).unwrap();

        let err = fetch_status_list(&client, "not a url").await.unwrap_err();

        assert_eq!(ErrorCode::UnknownError, err.code);
    }

    #[tokio::test]
    async fn test_reqwest_connection_refused() {
        let client = ReqwestGetClient::from_builder(Client::builder().no_proxy()).unwrap();

        // Nothing listens on port 1.
        let err = fetch_status_list(&client, "http://127.0.0.1:1/status/3")
            .await
            .unwrap_err();

        assert_eq!(ErrorCode::NetworkError, err.code);
        assert!(err.details.is_some());
    }
}
