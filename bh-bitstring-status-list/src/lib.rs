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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A `crate` for reading W3C Bitstring Status Lists.
//!
//! The implementation follows the [W3C Bitstring Status List][1]. A Bitstring
//! Status List Credential is published by an issuer of Verifiable
//! Credentials and holds a compressed list of bits. Each credential issued
//! with a [`BitstringStatusListEntry`] points to one bit of that list, which
//! tells whether the credential is e.g. revoked or suspended.
//!
//! The crate fetches the Status List Credential through a [`HttpGetClient`],
//! unwraps it if it is delivered as an `EnvelopedVerifiableCredential`,
//! validates it, decodes and decompresses its `encodedList` and exposes the
//! bits through a [`DecodedStatusList`].
//!
//! Note: signatures of enveloped credentials are **NOT** verified, the JWT
//! payload is only decoded.
//!
//! # Details
//!
//! The main entry points are [`fetch_status_list`] and [`decode_document`],
//! both producing a [`DecodedStatusList`]. The bits are read with
//! [`DecodedStatusList::bit_status`] and [`DecodedStatusList::bit_range`], or
//! with [`get_bit_status`] and [`get_bit_range`] directly on the bytes
//! returned by [`decode_status_list`].
//!
//! Every public operation fails with a [`DetailedError`] carrying an
//! [`ErrorCode`], a message and a remediation suggestion.
//!
//! # Example
//!
//! Implement a dummy [`HttpGetClient`] serving a Status List Credential and
//! read some bits from it.
//! ```
//! use std::io::Write as _;
//!
//! use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
//! use bh_bitstring_status_list::{fetch_status_list, HttpGetClient, StatusPurpose};
//! use flate2::{write::GzEncoder, Compression};
//! use serde_json::json;
//!
//! // Client always responding with the same document.
//! struct DummyClient(String);
//!
//! impl HttpGetClient for DummyClient {
//!     type Err = reqwest::Error;
//!
//!     async fn get(&self, _url: &str) -> reqwest::Result<reqwest::Response> {
//!         Ok(reqwest::Response::from(http::Response::new(self.0.clone())))
//!     }
//! }
//!
//! // A list of 16 bits where only the bit at index 3 is set.
//! let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
//! encoder.write_all(&[0b0000_1000, 0]).unwrap();
//! let encoded_list = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());
//!
//! let credential = json!({
//!     "@context": ["https://www.w3.org/ns/credentials/v2"],
//!     "id": "https://example.com/credentials/status/3",
//!     "type": ["VerifiableCredential", "BitstringStatusListCredential"],
//!     "issuer": "did:example:12345",
//!     "credentialSubject": {
//!         "id": "https://example.com/status/3#list",
//!         "type": "BitstringStatusList",
//!         "statusPurpose": "revocation",
//!         "encodedList": encoded_list
//!     }
//! });
//! let client = DummyClient(credential.to_string());
//!
//! let decoded = tokio_test::block_on(fetch_status_list(
//!     &client,
//!     "https://example.com/credentials/status/3",
//! ))
//! .unwrap();
//!
//! assert!(decoded.bit_status(3).unwrap());
//! assert!(!decoded.bit_status(4).unwrap());
//! assert_eq!(16, decoded.total_bits());
//!
//! let statuses = decoded.bit_range(2, 4).unwrap();
//! assert_eq!(
//!     vec![false, true, false],
//!     statuses.iter().map(|bit| bit.status).collect::<Vec<_>>()
//! );
//!
//! let info = decoded.info();
//! assert_eq!(Some(StatusPurpose::Revocation), info.status_purpose);
//! assert_eq!(Some("did:example:12345"), info.issuer.as_deref());
//!
//! // Out of bounds.
//! let error = decoded.bit_status(16).unwrap_err();
//! assert_eq!("INVALID_BIT_INDEX", error.code.to_string());
//! ```
//!
//! [1]: https://www.w3.org/TR/vc-bitstring-status-list/

mod client;
mod credential;
mod envelope;
mod error;
mod status_list;
mod utils;
mod vc_claim;

pub use client::{fetch_status_list, HttpGetClient, ReqwestGetClient, TransportFailure};
pub use credential::{
    BitstringStatusList, Issuer, StatusListCredential, StatusMessage, StatusPurpose,
    BITSTRING_STATUS_LIST_TYPE,
};
pub use envelope::{CredentialShape, ENVELOPED_CREDENTIAL_TYPE, JWT_DATA_URL_PREFIXES};
pub use error::{DetailedError, DetailedResult, Error, ErrorCode, Result};
pub use iref::{Uri, UriBuf};
pub use status_list::{
    decode_document, decode_status_list, format_credential_info, get_bit_range,
    get_bit_status, BitStatus, CredentialInfo, DecodedStatusList, MAX_RANGE_SIZE,
};
pub use utils::Codec;
pub use vc_claim::{BitstringStatusListEntry, BITSTRING_STATUS_LIST_ENTRY_TYPE};
