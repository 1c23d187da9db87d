use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::FileFingerprint;
use crate::exception::{UploadException, UploadResult};

/// Identifier of one chunk: `<fingerprint>-<index>`, index zero based.
///
/// Ordering follows the numeric index, so `abc-9` sorts before `abc-10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ChunkIdentifier {
    raw: String,
    index: u64,
}

impl ChunkIdentifier {
    /// Parses an identifier staged under `fingerprint`.
    ///
    /// The index is the decimal number after the last `-` and must be written
    /// without sign or leading zeros, so every index has exactly one identifier.
    pub fn parse(fingerprint: &FileFingerprint, raw: &str) -> UploadResult<Self> {
        let (prefix, index) = raw.rsplit_once('-').ok_or_else(|| {
            UploadException::invalid_request(format!(
                "Chunk identifier: {raw} doesn't end with '-<index>'."
            ))
        })?;
        if prefix != fingerprint.as_str() {
            return Err(UploadException::invalid_request(format!(
                "Chunk identifier: {raw} doesn't belong to file fingerprint: {fingerprint}."
            )));
        }
        let parsed = index.parse::<u64>().map_err(|e| {
            UploadException::invalid_request(format!(
                "Chunk identifier: {raw} has a non numeric index: {e}"
            ))
        })?;
        if parsed.to_string() != index {
            return Err(UploadException::invalid_request(format!(
                "Chunk identifier: {raw} has a non canonical index."
            )));
        }
        Ok(Self {
            raw: raw.to_owned(),
            index: parsed,
        })
    }

    pub fn new(fingerprint: &FileFingerprint, index: u64) -> Self {
        Self {
            raw: format!("{fingerprint}-{index}"),
            index,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for ChunkIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ChunkIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChunkIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<ChunkIdentifier> for String {
    fn from(value: ChunkIdentifier) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> FileFingerprint {
        FileFingerprint::new("abc123").unwrap()
    }

    #[test]
    fn parse_extracts_index() {
        let id = ChunkIdentifier::parse(&fingerprint(), "abc123-10").unwrap();
        assert_eq!(id.index(), 10);
        assert_eq!(id.as_str(), "abc123-10");
        assert_eq!(id, ChunkIdentifier::new(&fingerprint(), 10));
    }

    #[test]
    fn parse_uses_last_delimiter() {
        let fingerprint = FileFingerprint::new("movie-final").unwrap();
        let id = ChunkIdentifier::parse(&fingerprint, "movie-final-3").unwrap();
        assert_eq!(id.index(), 3);
    }

    #[test]
    fn parse_rejects_malformed() {
        let fingerprint = fingerprint();
        for raw in ["abc123", "abc123-", "abc123-x", "abc123-01", "abc123-+1", "other-1", ""] {
            assert!(
                ChunkIdentifier::parse(&fingerprint, raw).is_err(),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn sorts_numerically() {
        let fingerprint = fingerprint();
        let mut ids = ["abc123-10", "abc123-9", "abc123-0", "abc123-2"]
            .iter()
            .map(|raw| ChunkIdentifier::parse(&fingerprint, raw).unwrap())
            .collect::<Vec<_>>();
        ids.sort();
        let order = ids.iter().map(ChunkIdentifier::index).collect::<Vec<_>>();
        assert_eq!(order, vec![0, 2, 9, 10]);
    }
}
