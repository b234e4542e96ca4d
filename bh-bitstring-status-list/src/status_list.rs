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
use serde_json::Value;

use crate::{
    envelope::Envelope,
    utils::{decode_and_decompress, Codec},
    BitstringStatusList, CredentialShape, DetailedError, DetailedResult, Error, Result,
    StatusListCredential, StatusPurpose,
};

/// The maximum number of bits returned by a single range query.
pub const MAX_RANGE_SIZE: i64 = 10_000;

/// A Bitstring Status List Credential with its list decoded.
///
/// It is created once per successfully decoded document and never changes
/// afterwards. Bit `0` of the list is the least significant bit of the first
/// byte.
#[derive(Debug, Clone)]
pub struct DecodedStatusList {
    /// The unwrapped credential.
    credential: StatusListCredential,

    /// The unwrapped credential document as it was received.
    credential_json: Value,

    /// How the credential was delivered.
    shape: CredentialShape,

    /// The `EnvelopedVerifiableCredential` as fetched, if enveloped.
    envelope: Option<Value>,

    /// The compression the `encodedList` was stored with.
    codec: Codec,

    /// The decompressed bitstring.
    bytes: Vec<u8>,
}

/// The status of a single bit of a Status List.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitStatus {
    /// Index of the bit within the list.
    pub index: u64,

    /// Whether the bit is set.
    pub status: bool,

    /// The purpose of the list the bit belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<StatusPurpose>,
}

/// A read-only summary of a [`DecodedStatusList`], suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    /// How the credential was delivered.
    pub credential_type: CredentialShape,

    /// The credential identifier, or the list identifier if the credential
    /// has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The purpose of the statuses in the list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_purpose: Option<StatusPurpose>,

    /// The number of bits in the decoded list.
    pub total_bits: usize,

    /// The start of the validity period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,

    /// The end of the validity period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    /// The issuer identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl DecodedStatusList {
    /// Runs the whole decoding pipeline on a fetched `document`: envelope
    /// detection, credential validation, `base64url` decoding and
    /// decompression.
    pub(crate) fn decode(document: Value) -> Result<Self> {
        let envelope = Envelope::classify(document)?;
        let shape = envelope.shape();

        let (credential, envelope) = match envelope {
            Envelope::Embedded(credential) => (credential, None),
            Envelope::Enveloped {
                wrapper,
                credential,
            } => (credential, Some(wrapper)),
        };

        let credential_json = credential.clone();
        let credential = StatusListCredential::parse(credential)?;

        let (codec, bytes) = decode_and_decompress(credential.credential_subject().encoded_list())?;

        tracing::debug!(%shape, %codec, total_bits = bytes.len() * 8, "Decoded Status List");

        Ok(Self {
            credential,
            credential_json,
            shape,
            envelope,
            codec,
            bytes,
        })
    }

    /// Returns the unwrapped credential.
    pub fn credential(&self) -> &StatusListCredential {
        &self.credential
    }

    /// Returns the unwrapped credential document, i.e. the JWT payload for
    /// enveloped credentials.
    pub fn credential_json(&self) -> &Value {
        &self.credential_json
    }

    /// Returns the `credentialSubject` of the credential.
    pub fn status_list(&self) -> &BitstringStatusList {
        self.credential.credential_subject()
    }

    /// Returns how the credential was delivered.
    pub fn shape(&self) -> CredentialShape {
        self.shape
    }

    /// Returns the `EnvelopedVerifiableCredential` exactly as it was fetched,
    /// or `None` if the credential was not enveloped.
    pub fn envelope(&self) -> Option<&Value> {
        self.envelope.as_ref()
    }

    /// Returns the compression the list was stored with.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Returns the decompressed bitstring.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the number of bits in the list.
    pub fn total_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Returns whether the bit at `index` is set.
    ///
    /// # Errors
    ///
    /// Fails with the `INVALID_BIT_INDEX` code if `index` is outside of the
    /// list.
    pub fn bit_status(&self, index: i64) -> DetailedResult<bool> {
        get_bit_status(&self.bytes, index)
    }

    /// Returns the statuses of all the bits from `start` to `end`
    /// (inclusive), tagged with the purpose of this list.
    ///
    /// # Errors
    ///
    /// Fails with the `INVALID_BIT_RANGE` code, see [`get_bit_range`].
    pub fn bit_range(&self, start: i64, end: i64) -> DetailedResult<Vec<BitStatus>> {
        get_bit_range(&self.bytes, start, end, self.status_list().status_purpose())
    }

    /// Returns a read-only summary of the list.
    pub fn info(&self) -> CredentialInfo {
        let subject = self.status_list();

        CredentialInfo {
            credential_type: self.shape,
            id: self.credential.id().or(subject.id()).map(str::to_owned),
            status_purpose: subject.status_purpose().cloned(),
            total_bits: self.total_bits(),
            valid_from: self
                .credential
                .valid_from()
                .or(subject.valid_from())
                .map(str::to_owned),
            valid_until: self
                .credential
                .valid_until()
                .or(subject.valid_until())
                .map(str::to_owned),
            issuer: self.credential.issuer().map(|issuer| issuer.id().to_owned()),
        }
    }
}

/// Decodes a fetched Status List Credential `document`.
///
/// The document is either the credential itself or an
/// `EnvelopedVerifiableCredential` wrapping it into a JWT. The signature of
/// such a JWT is **NOT** verified.
pub fn decode_document(document: Value) -> DetailedResult<DecodedStatusList> {
    DecodedStatusList::decode(document).map_err(DetailedError::from)
}

/// Decodes an `encodedList` value into the bitstring bytes.
///
/// The value is `base64url`-decoded and then decompressed with the first
/// codec that accepts it: GZIP (if the GZIP magic bytes are present), raw
/// `DEFLATE` or none at all.
pub fn decode_status_list(encoded: &str) -> DetailedResult<Vec<u8>> {
    decode_and_decompress(encoded)
        .map(|(_, bytes)| bytes)
        .map_err(DetailedError::from)
}

/// Returns a read-only summary of the `decoded` list.
pub fn format_credential_info(decoded: &DecodedStatusList) -> CredentialInfo {
    decoded.info()
}

/// Returns whether the bit at `index` is set in `bytes`.
///
/// Bit `index` is bit `index % 8` of byte `index / 8`, counting from the
/// least significant bit.
///
/// # Errors
///
/// Fails with the `INVALID_BIT_INDEX` code if `index` is negative or not
/// smaller than `bytes.len() * 8`.
pub fn get_bit_status(bytes: &[u8], index: i64) -> DetailedResult<bool> {
    bit_status(bytes, index).map_err(DetailedError::from)
}

/// Returns the statuses of the bits of `bytes` from `start` to `end`
/// (inclusive), in ascending order, each tagged with `purpose`.
///
/// # Errors
///
/// Fails with the `INVALID_BIT_RANGE` code if `start` is negative, `end` is
/// smaller than `start`, either of them is past the last bit, or the range
/// spans more than [`MAX_RANGE_SIZE`] bits.
pub fn get_bit_range(
    bytes: &[u8],
    start: i64,
    end: i64,
    purpose: Option<&StatusPurpose>,
) -> DetailedResult<Vec<BitStatus>> {
    bit_range(bytes, start, end, purpose).map_err(DetailedError::from)
}

pub(crate) fn bit_status(bytes: &[u8], index: i64) -> Result<bool> {
    let max_index = max_index(bytes);

    if index < 0 || index > max_index {
        return Err(bherror::Error::root(Error::InvalidBitIndex(
            index, max_index,
        )));
    }

    Ok(bit_at(bytes, index as usize))
}

fn bit_range(
    bytes: &[u8],
    start: i64,
    end: i64,
    purpose: Option<&StatusPurpose>,
) -> Result<Vec<BitStatus>> {
    let max_index = max_index(bytes);

    if start < 0 {
        return Err(range_error(format!("start index {start} is negative")));
    }

    if end < start {
        return Err(range_error(format!(
            "end index {end} is smaller than start index {start}"
        )));
    }

    if start > max_index {
        return Err(range_error(format!(
            "start index {start} is past the maximum index {max_index}"
        )));
    }

    if end > max_index {
        return Err(range_error(format!(
            "end index {end} is past the maximum index {max_index}"
        )));
    }

    let size = end - start + 1;

    if size > MAX_RANGE_SIZE {
        return Err(range_error(format!(
            "range too large ({size} bits, at most {MAX_RANGE_SIZE} allowed)"
        )));
    }

    let statuses = (start..=end)
        .map(|index| BitStatus {
            index: index as u64,
            status: bit_at(bytes, index as usize),
            purpose: purpose.cloned(),
        })
        .collect();

    Ok(statuses)
}

fn range_error(reason: String) -> bherror::Error<Error> {
    bherror::Error::root(Error::InvalidBitRange(reason))
}

/// The largest valid bit index, `-1` for an empty list.
fn max_index(bytes: &[u8]) -> i64 {
    bytes.len() as i64 * 8 - 1
}

/// The caller guarantees that `index` is within `bytes`.
fn bit_at(bytes: &[u8], index: usize) -> bool {
    (bytes[index / 8] >> (index % 8)) & 1 != 0
}
