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

//! Detection of the credential envelope.
//!
//! A Status List Credential is either published as is, secured with an
//! embedded proof, or wrapped into an [`EnvelopedVerifiableCredential`][1]
//! whose `id` is a data URL holding a JWT of the actual credential.
//!
//! [1]: https://www.w3.org/TR/vc-data-model-2.0/#enveloped-verifiable-credentials

use serde::Serialize;
use serde_json::Value;

use crate::{utils::jwt::decode_payload_unverified, Error, Result};

/// The `type` of a credential wrapped into a JWT data URL.
pub const ENVELOPED_CREDENTIAL_TYPE: &str = "EnvelopedVerifiableCredential";

/// Data URL prefixes recognized in the `id` of an enveloped credential, in
/// the order they are matched.
pub const JWT_DATA_URL_PREFIXES: [&str; 4] = [
    "data:application/vc+jwt,",
    "data:application/vc-ld+jwt,",
    "data:application/vc+ld+jwt,",
    "data:application/jwt,",
];

/// At least one of these needs to be in the `type` of a credential that is
/// not enveloped.
const SUPPORTED_CREDENTIAL_TYPES: [&str; 2] =
    ["VerifiableCredential", "BitstringStatusListCredential"];

/// How the Status List Credential was delivered.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CredentialShape {
    /// The credential was the fetched document itself.
    Embedded,
    /// The credential was the payload of a JWT in the `id` of an
    /// `EnvelopedVerifiableCredential`.
    Enveloped,
}

/// A fetched document classified by its envelope.
#[derive(Debug)]
pub(crate) enum Envelope {
    /// The document is the credential.
    Embedded(Value),
    /// The document wraps the credential.
    Enveloped {
        /// The `EnvelopedVerifiableCredential` document as fetched.
        wrapper: Value,
        /// The unwrapped JWT payload.
        credential: Value,
    },
}

impl Envelope {
    /// Classifies the `document` by its `type` and unwraps the credential if
    /// it is enveloped.
    ///
    /// The signature of an enveloped JWT is **NOT** verified.
    ///
    /// # Errors
    ///
    /// The function returns the following errors:
    /// - [`Error::MissingCredentialType`] if the document has no `type`,
    /// - [`Error::UnsupportedCredentialType`] if the `type` is neither
    ///   [`ENVELOPED_CREDENTIAL_TYPE`] nor contains one of the
    ///   [`SUPPORTED_CREDENTIAL_TYPES`],
    /// - any error of [`unwrap_enveloped`] for enveloped documents.
    pub(crate) fn classify(document: Value) -> Result<Self> {
        match document.get("type") {
            None | Some(Value::Null) => Err(bherror::Error::root(Error::MissingCredentialType)),
            Some(Value::String(type_)) if type_ == ENVELOPED_CREDENTIAL_TYPE => {
                let credential = unwrap_enveloped(&document)?;

                Ok(Self::Enveloped {
                    wrapper: document,
                    credential,
                })
            }
            Some(type_) if is_supported_type(type_) => Ok(Self::Embedded(document)),
            Some(type_) => Err(bherror::Error::root(Error::UnsupportedCredentialType(
                type_.to_string(),
            ))),
        }
    }

    pub(crate) fn shape(&self) -> CredentialShape {
        match self {
            Self::Embedded(_) => CredentialShape::Embedded,
            Self::Enveloped { .. } => CredentialShape::Enveloped,
        }
    }
}

fn is_supported_type(type_: &Value) -> bool {
    let is_supported = |type_: &Value| {
        type_
            .as_str()
            .is_some_and(|type_| SUPPORTED_CREDENTIAL_TYPES.contains(&type_))
    };

    match type_ {
        Value::Array(types) => types.iter().any(is_supported),
        type_ => is_supported(type_),
    }
}

/// Extracts the credential from the JWT held in the `id` of the enveloped
/// credential.
///
/// # Errors
///
/// The function returns the following errors:
/// - [`Error::InvalidCredentialFormat`] if the `id` is missing or empty, or
///   the JWT payload has no `credentialSubject`,
/// - [`Error::JwtParse`] if the `id` does not start with one of the
///   [`JWT_DATA_URL_PREFIXES`] or the JWT is malformed,
/// - [`Error::Base64Decode`] and [`Error::InvalidJson`] if the JWT payload
///   can not be decoded.
fn unwrap_enveloped(wrapper: &Value) -> Result<Value> {
    let id = wrapper
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            bherror::Error::root(Error::InvalidCredentialFormat(
                "the enveloped credential has no `id`".to_owned(),
            ))
        })?;

    let token = JWT_DATA_URL_PREFIXES
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .ok_or_else(|| {
            bherror::Error::root(Error::JwtParse(
                "the `id` is not a data URL of a supported JWT media type".to_owned(),
            ))
        })?;

    tracing::warn!("The signature of the enveloped credential will not be verified");

    let payload = decode_payload_unverified(token)?;

    credential_from_payload(payload)
}

/// Returns the credential from the JWT payload.
///
/// The payload is either the credential itself, or, as in the Verifiable
/// Credentials Data Model v1.1, the credential is held in the `vc` claim.
fn credential_from_payload(mut payload: Value) -> Result<Value> {
    if has_credential_subject(&payload) {
        return Ok(payload);
    }

    if let Some(vc) = payload.get_mut("vc").filter(|vc| has_credential_subject(vc)) {
        tracing::debug!("Using the `vc` claim of the JWT payload as the credential");
        return Ok(vc.take());
    }

    Err(bherror::Error::root(Error::InvalidCredentialFormat(
        "the JWT payload has no `credentialSubject`".to_owned(),
    )))
}

fn has_credential_subject(value: &Value) -> bool {
    value
        .get("credentialSubject")
        .is_some_and(|subject| !subject.is_null())
}
