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

use bherror::traits::ForeignError as _;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// The `type` of the `credentialSubject` of a Bitstring Status List
/// Credential.
pub const BITSTRING_STATUS_LIST_TYPE: &str = "BitstringStatusList";

/// A credential carrying a Bitstring Status List in its `credentialSubject`.
///
/// More can be read [here][1].
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslistcredential
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListCredential {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    types: Vec<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    issuer: Option<Issuer>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    valid_from: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    valid_until: Option<String>,

    /// `validFrom` of the Verifiable Credentials Data Model v1.1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    issuance_date: Option<String>,

    /// `validUntil` of the Verifiable Credentials Data Model v1.1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    expiration_date: Option<String>,

    credential_subject: BitstringStatusList,
}

/// The issuer of a credential, either just its identifier or an object
/// holding the identifier and further properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    /// The issuer identifier.
    Id(String),
    /// The issuer object.
    Object {
        /// The issuer identifier.
        id: String,
        /// Any other property, e.g. `name`.
        #[serde(flatten)]
        properties: Map<String, Value>,
    },
}

impl Issuer {
    /// Returns the issuer identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Object { id, .. } => id,
        }
    }
}

/// The `credentialSubject` of a [`StatusListCredential`].
///
/// Only `type` and `encodedList` are required. A malformed value of any other
/// property is treated as if the property was absent.
///
/// More can be read [here][1].
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslistcredential
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstringStatusList {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// Always [`BITSTRING_STATUS_LIST_TYPE`].
    #[serde(rename = "type")]
    type_: String,

    /// One or more purposes; values that are not strings are skipped.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    status_purpose: Vec<StatusPurpose>,

    /// The `base64url`-encoded, compressed bitstring.
    encoded_list: String,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    valid_from: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    valid_until: Option<String>,

    /// Time in milliseconds the list may be cached for.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    ttl: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    status_size: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    status_messages: Option<Vec<StatusMessage>>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    status_reference: Vec<String>,
}

/// A message describing one of the possible status values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// The status value as a hex string, e.g. `0x0`.
    pub status: String,
    /// Description of the status value.
    pub message: String,
}

/// The purpose of the statuses kept in a list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusPurpose {
    /// A set bit means the credential is revoked, which is permanent.
    Revocation,
    /// A set bit means the credential is suspended, which is reversible.
    Suspension,
    /// A set bit means a refreshed credential is available.
    Refresh,
    /// The statuses index into the `statusMessages`.
    Message,
    /// Any purpose not defined by the W3C Bitstring Status List.
    Other(String),
}

impl StatusPurpose {
    /// Returns the purpose as it appears in a credential.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Revocation => "revocation",
            Self::Suspension => "suspension",
            Self::Refresh => "refresh",
            Self::Message => "message",
            Self::Other(purpose) => purpose,
        }
    }
}

impl From<String> for StatusPurpose {
    fn from(purpose: String) -> Self {
        match purpose.as_str() {
            "revocation" => Self::Revocation,
            "suspension" => Self::Suspension,
            "refresh" => Self::Refresh,
            "message" => Self::Message,
            _ => Self::Other(purpose),
        }
    }
}

impl From<StatusPurpose> for String {
    fn from(purpose: StatusPurpose) -> Self {
        match purpose {
            StatusPurpose::Other(purpose) => purpose,
            purpose => purpose.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for StatusPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusListCredential {
    /// Validates the `document` and parses it into a [`StatusListCredential`].
    ///
    /// See [`validate_credential`] for the checks made before parsing.
    pub(crate) fn parse(document: Value) -> Result<Self> {
        validate_credential(&document)?;

        serde_json::from_value(document).foreign_err(|| {
            Error::InvalidCredentialFormat("unable to parse the credential".to_owned())
        })
    }

    /// Returns the credential identifier.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the credential types.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Returns the issuer of the credential.
    pub fn issuer(&self) -> Option<&Issuer> {
        self.issuer.as_ref()
    }

    /// Returns `validFrom`, or `issuanceDate` for older credentials.
    pub fn valid_from(&self) -> Option<&str> {
        self.valid_from.as_deref().or(self.issuance_date.as_deref())
    }

    /// Returns `validUntil`, or `expirationDate` for older credentials.
    pub fn valid_until(&self) -> Option<&str> {
        self.valid_until.as_deref().or(self.expiration_date.as_deref())
    }

    /// Returns the Bitstring Status List.
    pub fn credential_subject(&self) -> &BitstringStatusList {
        &self.credential_subject
    }
}

impl BitstringStatusList {
    /// Returns the identifier of the list.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the purpose of the statuses in the list, the first one if
    /// several are declared.
    pub fn status_purpose(&self) -> Option<&StatusPurpose> {
        self.status_purpose.first()
    }

    /// Returns all the declared purposes of the list.
    pub fn status_purposes(&self) -> &[StatusPurpose] {
        &self.status_purpose
    }

    /// Returns the `base64url`-encoded, compressed bitstring.
    pub fn encoded_list(&self) -> &str {
        &self.encoded_list
    }

    /// Returns the start of the validity period of the list.
    pub fn valid_from(&self) -> Option<&str> {
        self.valid_from.as_deref()
    }

    /// Returns the end of the validity period of the list.
    pub fn valid_until(&self) -> Option<&str> {
        self.valid_until.as_deref()
    }

    /// Returns how long, in milliseconds, the list may be cached for.
    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    /// Returns the number of bits per status, if declared.
    pub fn status_size(&self) -> Option<u64> {
        self.status_size
    }

    /// Returns the messages describing the status values, if declared.
    pub fn status_messages(&self) -> Option<&[StatusMessage]> {
        self.status_messages.as_deref()
    }

    /// Returns the URLs further describing the status values.
    pub fn status_reference(&self) -> &[String] {
        &self.status_reference
    }
}

/// Checks that the `credential` carries a well-formed Bitstring Status List
/// before any decoding is done.
///
/// # Errors
///
/// The function returns the following errors:
/// - [`Error::MissingBitstringList`] if there is no `credentialSubject`,
/// - [`Error::InvalidCredentialFormat`] if the `credentialSubject` is not an
///   object, its `type` is not [`BITSTRING_STATUS_LIST_TYPE`] or its
///   `encodedList` is missing or empty.
pub(crate) fn validate_credential(credential: &Value) -> Result<()> {
    let subject = match credential.get("credentialSubject") {
        None | Some(Value::Null) => {
            return Err(bherror::Error::root(Error::MissingBitstringList));
        }
        Some(Value::Object(subject)) => subject,
        Some(_) => {
            return Err(bherror::Error::root(Error::InvalidCredentialFormat(
                "`credentialSubject` must be an object".to_owned(),
            )));
        }
    };

    match subject.get("type") {
        Some(Value::String(type_)) if type_ == BITSTRING_STATUS_LIST_TYPE => {}
        Some(type_) => {
            return Err(bherror::Error::root(Error::InvalidCredentialFormat(
                format!(
                    "expected `credentialSubject.type` to be \"{}\", found {}",
                    BITSTRING_STATUS_LIST_TYPE, type_
                ),
            )));
        }
        None => {
            return Err(bherror::Error::root(Error::InvalidCredentialFormat(
                format!(
                    "expected `credentialSubject.type` to be \"{}\", found none",
                    BITSTRING_STATUS_LIST_TYPE
                ),
            )));
        }
    }

    match subject.get("encodedList") {
        Some(Value::String(encoded_list)) if !encoded_list.is_empty() => Ok(()),
        _ => Err(bherror::Error::root(Error::InvalidCredentialFormat(
            "`credentialSubject.encodedList` is missing or empty".to_owned(),
        ))),
    }
}

/// Deserializes either a single value or an array of values, skipping the
/// values which are not a `T`.
fn one_or_many<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
        value => serde_json::from_value(value).into_iter().collect(),
    })
}

/// Deserializes an optional property, treating a malformed value as absent.
fn lenient<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).ok())
}
