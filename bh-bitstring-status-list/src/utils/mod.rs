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

pub(crate) mod jwt;

use std::io::{self, Read as _};

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    DecodeError, Engine as _,
};
use bherror::traits::ForeignError as _;
use flate2::{read::GzDecoder, Decompress, FlushDecompress, Status};
use serde::Serialize;

use crate::{Error, Result};

/// The first two bytes of every GZIP member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How many leading bytes of an undecodable list end up in the error.
const HEX_DUMP_LEN: usize = 10;

/// Output buffer growth step while inflating.
const INFLATE_CHUNK: usize = 4 * 1024;

/// The compression format the `encodedList` was stored with.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Codec {
    /// `DEFLATE` with the `GZIP` header, as required by the W3C Bitstring
    /// Status List.
    Gzip,
    /// `DEFLATE` without any header.
    RawDeflate,
    /// The list was not compressed at all.
    Uncompressed,
}

/// Candidates tried in order when the data does not start with
/// [`GZIP_MAGIC`]. The failure of the last one is the reported error.
const FALLBACK_CODECS: [Codec; 2] = [Codec::RawDeflate, Codec::Uncompressed];

impl Codec {
    fn decompress(self, payload: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut decompressed = Vec::new();
                GzDecoder::new(payload).read_to_end(&mut decompressed)?;
                Ok(decompressed)
            }
            Self::RawDeflate => inflate(payload),
            Self::Uncompressed if payload.is_empty() => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "an uncompressed Status List can not be empty",
            )),
            Self::Uncompressed => Ok(payload.to_vec()),
        }
    }
}

/// Decodes the `base64url`-encoded `payload` and decompresses the result,
/// returning the [`Codec`] that was used along with the bytes.
pub(crate) fn decode_and_decompress(payload: &str) -> Result<(Codec, Vec<u8>)> {
    let decoded = base64_url_decode(payload)?;
    decompress(&decoded)
}

/// Decodes a `base64url` string.
///
/// The strict, unpadded decoder is tried first. If it rejects the input, the
/// URL-safe alphabet is translated to the standard one, the input is padded
/// to a multiple of `4` and decoded with the standard alphabet. This accepts
/// padded input as well as plain `base64`.
pub(crate) fn base64_url_decode(payload: &str) -> Result<Vec<u8>> {
    match URL_SAFE_NO_PAD.decode(payload) {
        Ok(decoded) => Ok(decoded),
        Err(error) => {
            tracing::debug!(%error, "strict base64url decoding failed, retrying leniently");
            lenient_base64_decode(payload).foreign_err(|| Error::Base64Decode)
        }
    }
}

fn lenient_base64_decode(payload: &str) -> std::result::Result<Vec<u8>, DecodeError> {
    let mut normalized: String = payload
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    STANDARD.decode(normalized)
}

/// Resolves the compression of the given `payload` and decompresses it.
///
/// Data starting with the GZIP magic bytes is only ever treated as GZIP, a
/// failure there is reported as [`Error::GzipDecode`]. Anything else goes
/// through [`FALLBACK_CODECS`] and results in [`Error::Decompression`] if
/// none of them accepts it.
pub(crate) fn decompress(payload: &[u8]) -> Result<(Codec, Vec<u8>)> {
    if payload.starts_with(&GZIP_MAGIC) {
        let decompressed = Codec::Gzip
            .decompress(payload)
            .match_foreign_err(|error| Error::GzipDecode(error.to_string()))?;

        return Ok((Codec::Gzip, decompressed));
    }

    let mut result = Err(io::Error::other("no decompression candidate"));

    for codec in FALLBACK_CODECS {
        result = codec.decompress(payload).map(|decompressed| (codec, decompressed));

        match &result {
            Ok(_) => break,
            Err(error) => tracing::debug!(%codec, %error, "decompression candidate rejected"),
        }
    }

    result.foreign_err(|| Error::Decompression(hex_prefix(payload)))
}

/// Inflates a complete raw `DEFLATE` stream.
///
/// Unlike the `flate2` readers, this fails on a stream that ends before its
/// final block.
fn inflate(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut inflater = Decompress::new(false);
    let mut output = Vec::with_capacity(INFLATE_CHUNK);

    loop {
        if output.len() == output.capacity() {
            output.reserve(INFLATE_CHUNK);
        }

        let (total_in, total_out) = (inflater.total_in(), inflater.total_out());

        let status = inflater
            .decompress_vec(&payload[total_in as usize..], &mut output, FlushDecompress::None)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

        if status == Status::StreamEnd {
            return Ok(output);
        }

        let stalled = inflater.total_in() == total_in && inflater.total_out() == total_out;

        if stalled && output.len() < output.capacity() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "DEFLATE stream ended before its final block",
            ));
        }
    }
}

/// Hex dump of the first [`HEX_DUMP_LEN`] bytes of `payload`.
fn hex_prefix(payload: &[u8]) -> String {
    hex::encode(&payload[..payload.len().min(HEX_DUMP_LEN)])
}

/// Decodes a `base64url` string into UTF-8 text.
pub(crate) fn base64_url_decode_text(payload: &str) -> Result<String> {
    let decoded = base64_url_decode(payload)?;

    String::from_utf8(decoded).foreign_err(|| Error::Base64Decode)
}
