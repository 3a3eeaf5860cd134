//! Self-delimiting, version-tagged serialization of a [`Document`] snapshot.
//!
//! The wire format is not prescribed beyond what §6 of the document model requires:
//! site, clock, root id, every node with its tombstone, every property with its
//! stamp, every child entry with its tombstone. We encode all of it as JSON via the
//! derived `Serialize`/`Deserialize` impls and wrap it in a small envelope carrying
//! a version tag, so a future format change can be detected instead of silently
//! misparsed.
#![cfg(feature = "serde")]

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{Error, Result};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    document: Document,
}

/// Serializes `document` into a self-delimiting, version-tagged byte string.
pub fn serialize(document: &Document) -> Vec<u8> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        document: document.clone(),
    };
    serde_json::to_vec(&snapshot).expect("a Document snapshot always serializes to JSON")
}

/// Parses a byte string previously produced by [`serialize`]. On failure the
/// caller's existing state is left untouched — this function never mutates
/// anything, it only reads `bytes`.
pub fn deserialize(bytes: &[u8]) -> Result<Document> {
    let snapshot: Snapshot =
        serde_json::from_slice(bytes).map_err(|e| Error::MalformedSnapshot(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(Error::MalformedSnapshot(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        )));
    }
    Ok(snapshot.document)
}
