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
use iref::UriBuf;
use serde::{Deserialize, Serialize};

use crate::{
    fetch_status_list, status_list::bit_status, BitStatus, DecodedStatusList, DetailedError,
    DetailedResult, Error, HttpGetClient, Result, StatusPurpose,
};

/// The `type` of a [`BitstringStatusListEntry`].
pub const BITSTRING_STATUS_LIST_ENTRY_TYPE: &str = "BitstringStatusListEntry";

/// A `credentialStatus` entry of a Verifiable Credential that points into a
/// Bitstring Status List.
///
/// More can be read [here][1].
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslistentry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstringStatusListEntry {
    /// Optional identifier of the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// Always [`BITSTRING_STATUS_LIST_ENTRY_TYPE`].
    #[serde(rename = "type")]
    type_: String,

    /// The purpose of the status, which must match the purpose of the
    /// referenced list.
    status_purpose: StatusPurpose,

    /// The position of the status in the list, as a decimal string.
    status_list_index: String,

    /// The URL of the Bitstring Status List Credential.
    status_list_credential: UriBuf,
}

impl BitstringStatusListEntry {
    /// Creates a new entry for the status at `index` of the list at `uri`.
    pub fn new(uri: UriBuf, index: u64, status_purpose: StatusPurpose) -> Self {
        Self {
            id: None,
            type_: BITSTRING_STATUS_LIST_ENTRY_TYPE.to_owned(),
            status_purpose,
            status_list_index: index.to_string(),
            status_list_credential: uri,
        }
    }

    /// Gets the identifier of the entry.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Gets the purpose of the status.
    pub fn status_purpose(&self) -> &StatusPurpose {
        &self.status_purpose
    }

    /// Gets the index of the status as written in the entry.
    pub fn status_list_index(&self) -> &str {
        &self.status_list_index
    }

    /// Gets the URL of the Status List Credential.
    pub fn status_list_credential(&self) -> &UriBuf {
        &self.status_list_credential
    }

    /// Retrieves the referenced Status List Credential using the given
    /// [`HttpGetClient`] and returns the status this entry points to.
    pub async fn evaluate(&self, client: &impl HttpGetClient) -> DetailedResult<BitStatus> {
        let decoded = fetch_status_list(client, self.status_list_credential.as_str()).await?;

        self.status_in(&decoded)
    }

    /// Returns the status this entry points to in an already `decoded`
    /// list.
    ///
    /// # Errors
    ///
    /// Fails with the `INVALID_CREDENTIAL_FORMAT` code if the purpose of the
    /// entry is not one of the purposes of the list or the index is not a
    /// decimal number, and with the `INVALID_BIT_INDEX` code if the index is
    /// outside of the list.
    pub fn status_in(&self, decoded: &DecodedStatusList) -> DetailedResult<BitStatus> {
        self.read_status(decoded).map_err(DetailedError::from)
    }

    fn read_status(&self, decoded: &DecodedStatusList) -> Result<BitStatus> {
        let purposes = decoded.status_list().status_purposes();

        if !purposes.contains(&self.status_purpose) {
            let found = purposes
                .iter()
                .map(|purpose| format!("\"{}\"", purpose))
                .collect::<Vec<_>>();

            return Err(bherror::Error::root(Error::InvalidCredentialFormat(
                format!(
                    "expected `statusPurpose` \"{}\", found [{}]",
                    self.status_purpose,
                    found.join(", ")
                ),
            )));
        }

        let index: u64 = self.status_list_index.parse().foreign_err(|| {
            Error::InvalidCredentialFormat(format!(
                "`statusListIndex` must be a decimal number, found \"{}\"",
                self.status_list_index
            ))
        })?;

        // Indexes above `i64::MAX` are out of bounds anyway.
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        let status = bit_status(decoded.bytes(), index)?;

        Ok(BitStatus {
            index: index as u64,
            status,
            purpose: Some(self.status_purpose.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde_json::json;

    use super::*;
    use crate::{
        client::tests::{StubClient, URL},
        credential::tests::example_credential,
        decode_document,
        utils::tests::gzip,
        ErrorCode,
    };

    fn example_uri() -> UriBuf {
        iref::Uri::new(URL).unwrap().to_owned()
    }

    fn example_entry() -> BitstringStatusListEntry {
        serde_json::from_value(json!({
            "id": "https://example.com/credentials/23894672394#list",
            "type": "BitstringStatusListEntry",
            "statusPurpose": "revocation",
            "statusListIndex": "94567",
            "statusListCredential": URL
        }))
        .unwrap()
    }

    fn example_list() -> serde_json::Value {
        let mut bytes = vec![0u8; 16 * 1024];
        // 94567 = 11820 * 8 + 7
        bytes[11820] = 0x80;

        example_credential(&URL_SAFE_NO_PAD.encode(gzip(&bytes)))
    }

    #[test]
    fn test_entry_deserialize() {
        let entry = example_entry();

        assert_eq!(
            Some("https://example.com/credentials/23894672394#list"),
            entry.id()
        );
        assert_eq!(&StatusPurpose::Revocation, entry.status_purpose());
        assert_eq!("94567", entry.status_list_index());
        assert_eq!(URL, entry.status_list_credential().as_str());

        let created = BitstringStatusListEntry::new(
            example_uri(),
            94567,
            StatusPurpose::Revocation,
        );
        assert_eq!(
            json!({
                "type": "BitstringStatusListEntry",
                "statusPurpose": "revocation",
                "statusListIndex": "94567",
                "statusListCredential": URL
            }),
            serde_json::to_value(created).unwrap()
        );
    }

    #[tokio::test]
    async fn test_evaluate() {
        let client = StubClient::with_json(&example_list());

        let status = example_entry().evaluate(&client).await.unwrap();

        assert_eq!(
            BitStatus {
                index: 94567,
                status: true,
                purpose: Some(StatusPurpose::Revocation),
            },
            status
        );
    }

    #[tokio::test]
    async fn test_evaluate_unset_bit() {
        let client = StubClient::with_json(&example_list());
        let entry = BitstringStatusListEntry::new(
            example_uri(),
            94566,
            StatusPurpose::Revocation,
        );

        let status = entry.evaluate(&client).await.unwrap();

        assert!(!status.status);
    }

    #[tokio::test]
    async fn test_evaluate_fetch_error() {
        let client = StubClient::new(404, String::new());

        let err = example_entry().evaluate(&client).await.unwrap_err();

        assert_eq!(ErrorCode::NotFound, err.code);
    }

    #[test]
    fn test_purpose_mismatch() {
        let decoded = decode_document(example_list()).unwrap();
        let entry = BitstringStatusListEntry::new(
            example_uri(),
            0,
            StatusPurpose::Suspension,
        );

        let err = entry.status_in(&decoded).unwrap_err();

        assert_eq!(ErrorCode::InvalidCredentialFormat, err.code);
        assert!(err.message.contains("\"revocation\""));
    }

    #[test]
    fn test_list_with_several_purposes() {
        let mut list = example_list();
        list["credentialSubject"]["statusPurpose"] = json!(["revocation", "suspension"]);
        let decoded = decode_document(list).unwrap();

        let entry = BitstringStatusListEntry::new(example_uri(), 94567, StatusPurpose::Suspension);
        let status = entry.status_in(&decoded).unwrap();

        assert!(status.status);
        assert_eq!(Some(StatusPurpose::Suspension), status.purpose);
    }

    #[test]
    fn test_invalid_index() {
        let decoded = decode_document(example_list()).unwrap();

        for index in ["abc", "-1", "", "1.5"] {
            let mut entry = example_entry();
            entry.status_list_index = index.to_owned();

            let err = entry.status_in(&decoded).unwrap_err();
            assert_eq!(ErrorCode::InvalidCredentialFormat, err.code, "index={}", index);
        }

        for index in ["131072", "18446744073709551615"] {
            let mut entry = example_entry();
            entry.status_list_index = index.to_owned();

            let err = entry.status_in(&decoded).unwrap_err();
            assert_eq!(ErrorCode::InvalidBitIndex, err.code, "index={}", index);
        }
    }
}
