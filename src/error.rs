//! Error types for the file system.
//!
//! [`FsError`] is the status every public operation reports on failure. Relational
//! failures never cross this boundary as-is: they are logged where they happen and
//! translated to the nearest status here.

use thiserror::Error;

/// Result type alias using [`FsError`]
pub type Result<T> = std::result::Result<T, FsError>;

/// Broad grouping of failure statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Lookup,
    Structural,
    Payload,
    Infrastructure,
}

/// Per-call failure status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    // validation
    #[error("Path or name is empty")]
    EmptyPath,

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Path must be absolute: {0}")]
    MustBeAbsolute(String),

    #[error("Path must be relative: {0}")]
    MustBeRelative(String),

    #[error("Path must not start or end with a separator: {0}")]
    MustNotStartOrEndWithSeparator(String),

    #[error("Path segment is not a directory: {0}")]
    NotDirInPath(String),

    // lookup
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("Node has no parent")]
    NoParent,

    #[error("Destination directory not found: {0}")]
    DestDirNotFound(String),

    #[error("Node {0} not found")]
    NodeNotFound(String),

    // structural
    #[error("Name already exists: {0}")]
    NameAlreadyExists(String),

    #[error("Child list not updated")]
    ChildListNotUpdated,

    #[error("Cannot rename the root directory")]
    CannotRenameRoot,

    #[error("Cannot move the root directory")]
    CannotMoveRoot,

    #[error("Cannot move a node into itself")]
    CannotMoveToSelf,

    #[error("Cannot move a directory into its own subdirectory")]
    CannotMoveToSubdir,

    #[error("Cannot delete node entry")]
    CannotDeleteEntry,

    // payload
    #[error("Payload id is not valid")]
    InvalidPayloadId,

    #[error("Cannot delete payload entry")]
    CannotDeletePayload,

    #[error("Failed to read payload")]
    GetPayload,

    #[error("Failed to save payload")]
    SavePayload,

    // infrastructure
    #[error("Cannot open store: {0}")]
    CannotOpenStore(String),

    #[error("Cannot close store: {0}")]
    CannotCloseStore(String),

    #[error("Failed to read node field")]
    GetField,

    #[error("Failed to write node field")]
    SetField,

    #[error("Failed to add node")]
    AddNode,

    #[error("Failed to retrieve last insert id")]
    LastInsertId,

    #[error("Failed to read store info")]
    GetInfo,

    #[error("Failed to write store info")]
    WriteInfo,

    #[error("Cannot access root directory")]
    CannotAccessRoot,

    #[error("Child list of node {0} is corrupt")]
    CorruptChildList(String),

    #[error("Transaction failed")]
    Transaction,

    #[error("Store is closed")]
    StoreClosed,
}

impl FsError {
    pub fn category(&self) -> ErrorCategory {
        use FsError::*;
        match self {
            EmptyPath
            | InvalidName(_)
            | MustBeAbsolute(_)
            | MustBeRelative(_)
            | MustNotStartOrEndWithSeparator(_)
            | NotDirInPath(_) => ErrorCategory::Validation,
            ChildNotFound(_) | NoParent | DestDirNotFound(_) | NodeNotFound(_) => {
                ErrorCategory::Lookup
            }
            NameAlreadyExists(_)
            | ChildListNotUpdated
            | CannotRenameRoot
            | CannotMoveRoot
            | CannotMoveToSelf
            | CannotMoveToSubdir
            | CannotDeleteEntry => ErrorCategory::Structural,
            InvalidPayloadId | CannotDeletePayload | GetPayload | SavePayload => {
                ErrorCategory::Payload
            }
            CannotOpenStore(_) | CannotCloseStore(_) | GetField | SetField | AddNode
            | LastInsertId | GetInfo | WriteInfo | CannotAccessRoot | CorruptChildList(_)
            | Transaction | StoreClosed => ErrorCategory::Infrastructure,
        }
    }

    /// False for failures that leave the handle unusable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            FsError::CannotOpenStore(_) | FsError::CannotCloseStore(_) | FsError::StoreClosed
        )
    }
}

/// Errors raised while setting up the process (configuration, logging)
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for SetupError {
    fn from(err: config::ConfigError) -> Self {
        SetupError::Config(err.to_string())
    }
}
