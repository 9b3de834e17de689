//! Core types for the SQL-backed file system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Underlying integer of an identifier; width is fixed for the whole store at build time.
#[cfg(not(feature = "wide-id"))]
pub type RawId = i32;

/// Underlying integer of an identifier; width is fixed for the whole store at build time.
#[cfg(feature = "wide-id")]
pub type RawId = i64;

/// Number of bytes one identifier occupies in a serialized child list.
pub const ID_SIZE: usize = std::mem::size_of::<RawId>();

/// FsId: primary key of a node row (or of a payload row, when held by a file)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FsId(RawId);

impl FsId {
    /// Never assigned to a row.
    pub const INVALID: FsId = FsId(0);
    /// The root directory.
    pub const ROOT: FsId = FsId(1);
    /// Parent recorded for the root directory.
    pub const ROOT_PARENT: FsId = FsId(0);
    /// Payload reference of a file that was created but never saved.
    pub const NO_PAYLOAD: FsId = FsId(-1);

    pub const fn new(raw: RawId) -> Self {
        FsId(raw)
    }

    pub const fn raw(self) -> RawId {
        self.0
    }

    /// Convert a SQLite integer column into an identifier.
    ///
    /// With 32-bit identifiers the value is truncated to its low 32 bits.
    pub fn from_i64(value: i64) -> Self {
        #[cfg(not(feature = "wide-id"))]
        {
            FsId((value & 0xffff_ffff) as u32 as i32)
        }
        #[cfg(feature = "wide-id")]
        {
            FsId(value)
        }
    }

    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }

    /// True for ids that can reference an existing row.
    pub fn is_valid(self) -> bool {
        self > FsId::INVALID
    }

    pub fn to_le_bytes(self) -> [u8; ID_SIZE] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; ID_SIZE]) -> Self {
        FsId(RawId::from_le_bytes(bytes))
    }
}

impl fmt::Display for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RawId> for FsId {
    fn from(raw: RawId) -> Self {
        FsId(raw)
    }
}

/// Node kind as persisted in the `fsType` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Directory,
    File,
}

impl NodeKind {
    pub fn code(self) -> i64 {
        match self {
            NodeKind::Directory => 0,
            NodeKind::File => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(NodeKind::Directory),
            1 => Some(NodeKind::File),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Directory => write!(f, "dir"),
            NodeKind::File => write!(f, "file"),
        }
    }
}
