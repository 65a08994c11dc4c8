//! Candidate list codec.
//!
//! The voting contract takes its candidates as one flat byte string: the UTF-8
//! encoding of each name, joined by a single `0x00` byte. The constructor splits
//! on that byte, so a name that itself contains `0x00` would silently turn into
//! two candidates. [`encode`] rejects such names instead.

use alloy_primitives::Bytes;

use crate::error::EncodingError;

/// Byte placed between two encoded candidates.
pub const SEPARATOR: u8 = 0x00;

/// Join candidate names into the contract's wire format.
///
/// An empty list is rejected: it would encode to the same blob as a single
/// empty name, and `decode` could not tell them apart.
pub fn encode<S: AsRef<str>>(candidates: &[S]) -> Result<Bytes, EncodingError> {
    if candidates.is_empty() {
        return Err(EncodingError::Empty);
    }
    let capacity = candidates.iter().map(|c| c.as_ref().len() + 1).sum();
    let mut blob = Vec::with_capacity(capacity);
    for (index, candidate) in candidates.iter().enumerate() {
        let bytes = candidate.as_ref().as_bytes();
        if bytes.contains(&SEPARATOR) {
            return Err(EncodingError::SeparatorByte { index });
        }
        if index > 0 {
            blob.push(SEPARATOR);
        }
        blob.extend_from_slice(bytes);
    }
    Ok(Bytes::from(blob))
}

/// Split a blob produced by [`encode`] back into names.
pub fn decode(blob: &[u8]) -> Result<Vec<String>, EncodingError> {
    blob.split(|b| *b == SEPARATOR)
        .enumerate()
        .map(|(index, segment)| decode_segment(index, segment))
        .collect()
}

/// Decode one candidate as returned by the contract's `getCandidate`.
pub fn decode_candidate(raw: &[u8]) -> Result<String, EncodingError> {
    decode_segment(0, raw)
}

fn decode_segment(index: usize, segment: &[u8]) -> Result<String, EncodingError> {
    String::from_utf8(segment.to_vec()).map_err(|_| EncodingError::InvalidUtf8 { index })
}
