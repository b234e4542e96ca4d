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

use serde::Serialize;

/// Errors that can occur while fetching, decoding or reading a Bitstring
/// Status List.
///
/// Every variant maps to exactly one [`ErrorCode`] (see [`Error::code`]).
#[derive(strum_macros::Display, Debug, Clone, PartialEq)]
pub enum Error {
    /// The Status List could not be retrieved because of a connection error.
    #[strum(to_string = "Unable to reach {0}")]
    Network(String),

    /// The request was rejected by the cross-origin policy of the host.
    #[strum(to_string = "Request to {0} was blocked by the cross-origin policy")]
    Cors(String),

    /// The request did not complete in time.
    #[strum(to_string = "Request to {0} timed out")]
    Timeout(String),

    /// The server responded with `404 Not Found`.
    #[strum(to_string = "Status List not found (HTTP 404)")]
    NotFound,

    /// The server responded with `401 Unauthorized`.
    #[strum(to_string = "Status List requires authentication (HTTP 401)")]
    Unauthorized,

    /// The server responded with `403 Forbidden`.
    #[strum(to_string = "Access to the Status List is forbidden (HTTP 403)")]
    Forbidden,

    /// The server responded with `500` or any other unsuccessful status
    /// without a dedicated variant.
    #[strum(to_string = "Server returned status {0}")]
    Server(u16),

    /// The server responded with `502 Bad Gateway`.
    #[strum(to_string = "Bad gateway (HTTP 502)")]
    BadGateway,

    /// The server responded with `503 Service Unavailable`.
    #[strum(to_string = "Service unavailable (HTTP 503)")]
    ServiceUnavailable,

    /// The document is not valid JSON.
    #[strum(to_string = "Document is not valid JSON")]
    InvalidJson,

    /// The document does not have the shape of a Bitstring Status List
    /// Credential.
    #[strum(to_string = "Invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    /// The document has no `type` property.
    #[strum(to_string = "Credential has no `type` property")]
    MissingCredentialType,

    /// The document `type` is neither an enveloped nor a verifiable
    /// credential.
    #[strum(to_string = "Unsupported credential type: {0}")]
    UnsupportedCredentialType(String),

    /// The credential has no `credentialSubject`.
    #[strum(to_string = "Credential has no `credentialSubject` with a Bitstring Status List")]
    MissingBitstringList,

    /// Data is not valid `base64url`.
    #[strum(to_string = "Unable to decode base64url data")]
    Base64Decode,

    /// The data carries the GZIP magic bytes but fails to decompress.
    #[strum(to_string = "GZIP decompression failed: {0}")]
    GzipDecode(String),

    /// The enveloped JWT is malformed.
    #[strum(to_string = "Unable to parse the enveloped JWT: {0}")]
    JwtParse(String),

    /// No decompression candidate accepted the data. Holds the hex dump of
    /// the first bytes of the input.
    #[strum(to_string = "Unable to decompress the Status List (first bytes: {0})")]
    Decompression(String),

    /// The bit index is outside of the list (index, maximum valid index).
    #[strum(to_string = "Bit index {0} is out of bounds (maximum valid index is {1})")]
    InvalidBitIndex(i64, i64),

    /// The requested bit range is invalid.
    #[strum(to_string = "Invalid bit range: {0}")]
    InvalidBitRange(String),

    /// Any failure not covered by the other variants.
    #[strum(to_string = "Unknown error: {0}")]
    Unknown(String),
}

impl bherror::BhError for Error {}

/// Result type used across the crate.
pub type Result<T> = bherror::Result<T, Error>;

/// Result type returned by the public pipeline operations.
pub type DetailedResult<T> = std::result::Result<T, DetailedError>;

impl Error {
    /// Returns the taxonomy code of the error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Cors(_) => ErrorCode::CorsError,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::NotFound => ErrorCode::NotFound,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::Server(_) => ErrorCode::ServerError,
            Self::BadGateway => ErrorCode::BadGateway,
            Self::ServiceUnavailable => ErrorCode::ServiceUnavailable,
            Self::InvalidJson => ErrorCode::InvalidJson,
            Self::InvalidCredentialFormat(_) => ErrorCode::InvalidCredentialFormat,
            Self::MissingCredentialType => ErrorCode::MissingCredentialType,
            Self::UnsupportedCredentialType(_) => ErrorCode::UnsupportedCredentialType,
            Self::MissingBitstringList => ErrorCode::MissingBitstringList,
            Self::Base64Decode => ErrorCode::Base64DecodeError,
            Self::GzipDecode(_) => ErrorCode::GzipDecodeError,
            Self::JwtParse(_) => ErrorCode::JwtParseError,
            Self::Decompression(_) => ErrorCode::DecompressionError,
            Self::InvalidBitIndex(..) => ErrorCode::InvalidBitIndex,
            Self::InvalidBitRange(_) => ErrorCode::InvalidBitRange,
            Self::Unknown(_) => ErrorCode::UnknownError,
        }
    }

    /// Returns the HTTP status code for errors caused by an unsuccessful
    /// response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::Server(status) => Some(*status),
            Self::BadGateway => Some(502),
            Self::ServiceUnavailable => Some(503),
            _ => None,
        }
    }

    /// Maps an unsuccessful HTTP status to its error variant.
    pub(crate) fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            status => Self::Server(status),
        }
    }
}

/// The closed set of error codes reported by the crate.
#[derive(
    strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Connection failure.
    NetworkError,
    /// Cross-origin rejection.
    CorsError,
    /// The request timed out.
    Timeout,
    /// HTTP `404`.
    NotFound,
    /// HTTP `401`.
    Unauthorized,
    /// HTTP `403`.
    Forbidden,
    /// HTTP `500` and unsuccessful statuses without a dedicated code.
    ServerError,
    /// HTTP `502`.
    BadGateway,
    /// HTTP `503`.
    ServiceUnavailable,
    /// The body or the JWT payload is not JSON.
    InvalidJson,
    /// The credential has an unexpected shape.
    InvalidCredentialFormat,
    /// The credential has no `type`.
    MissingCredentialType,
    /// The credential `type` is not supported.
    UnsupportedCredentialType,
    /// The credential has no `credentialSubject`.
    MissingBitstringList,
    /// `base64url` decoding failed.
    Base64DecodeError,
    /// GZIP decompression failed.
    GzipDecodeError,
    /// The enveloped JWT is malformed.
    JwtParseError,
    /// No decompression candidate succeeded.
    DecompressionError,
    /// A bit index is out of bounds.
    InvalidBitIndex,
    /// A bit range is invalid.
    InvalidBitRange,
    /// Anything else.
    UnknownError,
}

impl ErrorCode {
    /// Returns a human readable hint on how to remedy the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        let suggestion = match self {
            Self::NetworkError => "Check the URL and your network connection.",
            Self::CorsError => {
                "The server does not allow cross-origin requests; fetch the list through a proxy."
            }
            Self::Timeout => "The server took too long to respond; try again later.",
            Self::NotFound => "Verify that the Status List URL is correct.",
            Self::Unauthorized => "The Status List requires credentials to be accessed.",
            Self::Forbidden => "You do not have permission to access this Status List.",
            Self::ServerError | Self::BadGateway | Self::ServiceUnavailable => {
                "The server failed to serve the Status List; try again later."
            }
            Self::InvalidJson => "The URL must point to a JSON Status List Credential.",
            Self::InvalidCredentialFormat | Self::MissingBitstringList => {
                "The document must be a Bitstring Status List Credential with a non-empty `encodedList`."
            }
            Self::MissingCredentialType | Self::UnsupportedCredentialType => {
                "The document must be a VerifiableCredential or an EnvelopedVerifiableCredential."
            }
            Self::Base64DecodeError => "The `encodedList` must be base64url encoded.",
            Self::GzipDecodeError | Self::DecompressionError => {
                "The `encodedList` must be a GZIP compressed bitstring."
            }
            Self::JwtParseError => {
                "The enveloped credential `id` must be a data URL holding a compact JWT."
            }
            Self::InvalidBitIndex | Self::InvalidBitRange => {
                "Use indexes between 0 and the total number of bits minus one."
            }
            Self::UnknownError => return None,
        };

        Some(suggestion)
    }
}

/// The error reported by every public operation of the crate.
///
/// It is a flattened, serializable projection of [`bherror::Error<Error>`]:
/// the source chain of the original error ends up in `details`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedError {
    /// The taxonomy code.
    pub code: ErrorCode,

    /// Short description of the failure.
    pub message: String,

    /// Messages of the underlying errors, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// The HTTP status of the response that caused the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<bherror::Error<Error>> for DetailedError {
    fn from(error: bherror::Error<Error>) -> Self {
        let code = error.error.code();

        Self {
            code,
            message: error.error.to_string(),
            details: source_chain(&error),
            status_code: error.error.status_code(),
            suggestion: code.suggestion().map(str::to_owned),
        }
    }
}

impl std::fmt::Display for DetailedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;

        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }

        Ok(())
    }
}

impl std::error::Error for DetailedError {}

/// Joins the messages of all the sources of `error`.
fn source_chain(error: &dyn std::error::Error) -> Option<String> {
    let mut messages = Vec::new();
    let mut source = error.source();

    while let Some(current) = source {
        messages.push(current.to_string());
        source = current.source();
    }

    (!messages.is_empty()).then(|| messages.join(": "))
}

#[cfg(test)]
mod tests {
    use bherror::traits::ForeignError as _;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_code_serialization() {
        assert_eq!("BASE64_DECODE_ERROR", ErrorCode::Base64DecodeError.to_string());
        assert_eq!(
            json!("SERVICE_UNAVAILABLE"),
            serde_json::to_value(ErrorCode::ServiceUnavailable).unwrap()
        );
        assert_eq!(
            ErrorCode::InvalidBitRange,
            serde_json::from_value(json!("INVALID_BIT_RANGE")).unwrap()
        );
    }

    #[test]
    fn test_http_status_mapping() {
        let cases = [
            (401, ErrorCode::Unauthorized),
            (403, ErrorCode::Forbidden),
            (404, ErrorCode::NotFound),
            (500, ErrorCode::ServerError),
            (502, ErrorCode::BadGateway),
            (503, ErrorCode::ServiceUnavailable),
            (418, ErrorCode::ServerError),
        ];

        for (status, code) in cases {
            let error = Error::from_http_status(status);
            assert_eq!(code, error.code(), "status={}", status);
            assert_eq!(Some(status), error.status_code(), "status={}", status);
        }

        assert_eq!("Server returned status 418", Error::Server(418).to_string());
    }

    #[test]
    fn test_detailed_error_from_root() {
        let error: DetailedError = bherror::Error::root(Error::InvalidBitIndex(16, 15)).into();

        assert_eq!(ErrorCode::InvalidBitIndex, error.code);
        assert_eq!(
            "Bit index 16 is out of bounds (maximum valid index is 15)",
            error.message
        );
        assert!(error.details.is_none());
        assert!(error.status_code.is_none());
        assert!(error.suggestion.is_some());
    }

    #[test]
    fn test_detailed_error_carries_source_message() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let error: DetailedError = parsed.foreign_err(|| Error::InvalidJson).unwrap_err().into();

        assert_eq!(ErrorCode::InvalidJson, error.code);
        assert!(error.details.unwrap().contains("EOF"));
    }

    #[test]
    fn test_detailed_error_serialization() {
        let error: DetailedError = bherror::Error::root(Error::ServiceUnavailable).into();

        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(json!("SERVICE_UNAVAILABLE"), value["code"]);
        assert_eq!(json!(503), value["statusCode"]);
        assert!(value.get("details").is_none());
        assert!(value["suggestion"].is_string());
    }

    #[test]
    fn test_unknown_has_no_suggestion() {
        assert!(ErrorCode::UnknownError.suggestion().is_none());
    }
}
