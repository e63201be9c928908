// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chunk encoder (§4.3): RFC 4648 standard Base64, one chunk at a time.
//!
//! Each chunk is encoded independently, padding and all. The receiver is
//! expected to decode chunk-by-chunk, not to treat the concatenation of
//! `write` payloads as a single valid Base64 document (§6, Wire contract).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Failure from the Base64 transform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeError;

/// Encodes `src` into `dst` using the standard (padded) Base64 alphabet.
///
/// Returns the number of bytes written to `dst`. The caller (the
/// Orchestrator) is responsible for sizing `dst` per the Sizer's
/// `b64_chunk_size`/`b64_last_chunk_size`; this function itself just
/// surfaces whatever the underlying engine reports.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Result<usize, EncodeError> {
    STANDARD.encode_slice(src, dst).map_err(|_| EncodeError)
}
