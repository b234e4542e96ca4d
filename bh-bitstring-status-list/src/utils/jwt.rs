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
use serde_json::Value;

use crate::{utils::base64_url_decode_text, Error, Result};

/// Number of segments in a JWT compact serialization.
const JWT_SEGMENTS: usize = 3;

/// Decodes the payload of a JWT in the compact serialization **without**
/// verifying its signature.
///
/// # Errors
///
/// The function returns the following errors:
/// - [`Error::JwtParse`] if the token does not have exactly three segments or
///   the payload segment is empty,
/// - [`Error::Base64Decode`] if the payload is not `base64url`-encoded UTF-8,
/// - [`Error::InvalidJson`] if the payload is not JSON.
pub(crate) fn decode_payload_unverified(token: &str) -> Result<Value> {
    let segments: Vec<&str> = token.split('.').collect();

    let [_header, payload, _signature] = segments[..] else {
        return Err(bherror::Error::root(Error::JwtParse(format!(
            "expected {} segments, found {}",
            JWT_SEGMENTS,
            segments.len()
        ))));
    };

    if payload.is_empty() {
        return Err(bherror::Error::root(Error::JwtParse(
            "the payload segment is empty".to_owned(),
        )));
    }

    let payload = base64_url_decode_text(payload)?;

    serde_json::from_str(&payload).foreign_err(|| Error::InvalidJson)
}
