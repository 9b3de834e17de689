//! Serialized child lists.
//!
//! A directory's children are stored as the concatenation of their ids, each
//! [`ID_SIZE`] bytes little-endian. A file reuses the same column for a list of at
//! most one element: the key of its payload row.

use crate::types::{FsId, ID_SIZE};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("child list length {0} is not a multiple of {}", ID_SIZE)]
pub struct MalformedChildList(pub usize);

/// Mutation applied to a child list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildListOp {
    /// Append if absent.
    Add,
    /// Replace the first occurrence with another id.
    Replace(FsId),
    /// Remove every occurrence.
    Del,
}

pub fn encode_ids(ids: &[FsId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ids.len() * ID_SIZE);
    for id in ids {
        out.extend_from_slice(&id.to_le_bytes());
    }
    out
}

pub fn decode_ids(bytes: &[u8]) -> Result<Vec<FsId>, MalformedChildList> {
    if bytes.len() % ID_SIZE != 0 {
        return Err(MalformedChildList(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(ID_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; ID_SIZE];
            raw.copy_from_slice(chunk);
            FsId::from_le_bytes(raw)
        })
        .collect())
}

/// Apply `op` for `id` to `ids`. Returns true if the list changed.
pub fn apply(ids: &mut Vec<FsId>, op: ChildListOp, id: FsId) -> bool {
    match op {
        ChildListOp::Add => {
            if ids.contains(&id) {
                false
            } else {
                ids.push(id);
                true
            }
        }
        ChildListOp::Replace(with) => match ids.iter().position(|c| *c == id) {
            Some(pos) if with != id => {
                ids[pos] = with;
                true
            }
            _ => false,
        },
        ChildListOp::Del => {
            let before = ids.len();
            ids.retain(|c| *c != id);
            ids.len() != before
        }
    }
}
