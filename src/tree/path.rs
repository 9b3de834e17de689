//! Path resolution.
//!
//! Relative paths are walked segment by segment from a starting directory;
//! absolute paths are walked from the root. `.` names the current directory and
//! `..` its parent (the root is its own parent).

use crate::db::Database;
use crate::error::{FsError, Result};
use crate::tree::name::SEPARATOR;
use crate::tree::node::{fetch_kind, fetch_parent, find_children};
use crate::types::{FsId, NodeKind};

/// What the last segment of a path must name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Any,
    Directory,
    File,
}

impl Target {
    fn accepts(self, kind: NodeKind) -> bool {
        match self {
            Target::Any => true,
            Target::Directory => kind == NodeKind::Directory,
            Target::File => kind == NodeKind::File,
        }
    }
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}

/// Ensure the root row exists and is a directory.
pub fn check_root(db: &Database) -> Result<()> {
    match fetch_kind(db, FsId::ROOT)? {
        Some(NodeKind::Directory) => Ok(()),
        _ => Err(FsError::CannotAccessRoot),
    }
}

/// Look up one entry of directory `dir`.
pub fn child_of(db: &Database, dir: FsId, name: &str) -> Result<(FsId, NodeKind)> {
    match name {
        "." => Ok((dir, NodeKind::Directory)),
        ".." => {
            if dir == FsId::ROOT {
                return Ok((dir, NodeKind::Directory));
            }
            let parent = fetch_parent(db, dir)?;
            match fetch_kind(db, parent)? {
                Some(NodeKind::Directory) => Ok((parent, NodeKind::Directory)),
                _ => Err(FsError::NoParent),
            }
        }
        _ => find_children(db, dir, Some(name), None)?
            .into_iter()
            .next()
            .ok_or_else(|| FsError::ChildNotFound(name.to_string())),
    }
}

/// Walk `path` from directory `start`.
pub fn resolve_relative(
    db: &Database,
    start: FsId,
    path: &str,
    target: Target,
) -> Result<(FsId, NodeKind)> {
    if path.is_empty() {
        return Err(FsError::EmptyPath);
    }
    let path = if target == Target::File {
        if path.starts_with(SEPARATOR) || path.ends_with(SEPARATOR) {
            return Err(FsError::MustNotStartOrEndWithSeparator(path.to_string()));
        }
        path
    } else {
        if is_absolute(path) {
            return Err(FsError::MustBeRelative(path.to_string()));
        }
        path.strip_suffix(SEPARATOR).unwrap_or(path)
    };

    let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
    let mut current = (start, NodeKind::Directory);
    for (idx, segment) in segments.iter().enumerate() {
        if current.1 != NodeKind::Directory {
            // only reachable when a previous segment named a file
            return Err(FsError::NotDirInPath(segments[idx - 1].to_string()));
        }
        current = child_of(db, current.0, segment)?;
    }

    if !target.accepts(current.1) {
        let last = segments.last().copied().unwrap_or(path);
        return Err(FsError::ChildNotFound(last.to_string()));
    }
    Ok(current)
}

/// Walk an absolute path from the root. `/` alone names the root.
pub fn resolve_absolute(db: &Database, path: &str, target: Target) -> Result<(FsId, NodeKind)> {
    if path.is_empty() {
        return Err(FsError::EmptyPath);
    }
    if !is_absolute(path) {
        return Err(FsError::MustBeAbsolute(path.to_string()));
    }
    check_root(db)?;
    let relative = path.trim_matches(SEPARATOR);
    if relative.is_empty() {
        return match target {
            Target::File => Err(FsError::EmptyPath),
            _ => Ok((FsId::ROOT, NodeKind::Directory)),
        };
    }
    resolve_relative(db, FsId::ROOT, relative, target)
}
