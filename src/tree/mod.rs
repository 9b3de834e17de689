//! Directory tree
//!
//! Nodes are rows of the node table; a handle is just the store plus a row id, so
//! every accessor reads through to the store and two handles for the same id always
//! agree. Operations shared by both kinds live on [`FsNode`]; [`Directory`] and
//! [`File`] add their own.

pub mod child_list;
pub mod directory;
pub mod file;
pub mod name;
pub mod node;
pub mod path;

pub use directory::Directory;
pub use file::File;
pub use node::NodeRecord;

use crate::db::Database;
use crate::error::{FsError, Result};
use crate::store::StoreShared;
use crate::tree::child_list::ChildListOp;
use crate::tree::node::{column, fetch_kind, fetch_name, fetch_parent};
use crate::tree::path::Target;
use crate::types::{FsId, NodeKind};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// A store plus the id of one node row
#[derive(Clone)]
pub struct NodeHandle {
    pub(crate) store: Arc<StoreShared>,
    pub(crate) id: FsId,
}

impl NodeHandle {
    pub(crate) fn new(store: Arc<StoreShared>, id: FsId) -> Self {
        Self { store, id }
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("store", &self.store.path())
            .field("id", &self.id)
            .finish()
    }
}

/// Operations shared by directories and files
pub trait FsNode {
    #[doc(hidden)]
    fn handle(&self) -> &NodeHandle;

    fn kind(&self) -> NodeKind;

    /// Remove this node (and, for a directory, everything below it).
    fn delete(&self) -> Result<()>;

    fn id(&self) -> FsId {
        self.handle().id
    }

    fn record(&self) -> Result<NodeRecord> {
        let h = self.handle();
        h.store.read(|db| {
            node::fetch_record(db, h.id)?.ok_or_else(|| FsError::NodeNotFound(h.id.to_string()))
        })
    }

    fn name(&self) -> Result<String> {
        let h = self.handle();
        h.store.read(|db| fetch_name(db, h.id))
    }

    fn create_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.record()?.created)
    }

    fn last_mod_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.record()?.modified)
    }

    fn size(&self) -> Result<u64> {
        Ok(self.record()?.size)
    }

    /// Containing directory; `None` for the root.
    fn parent(&self) -> Result<Option<Directory>> {
        let h = self.handle();
        h.store.read(|db| {
            parent_of(db, h.id).map(|p| p.map(|id| Directory::from_parts(Arc::clone(&h.store), id)))
        })
    }

    fn rename(&self, new_name: &str) -> Result<()> {
        let h = self.handle();
        h.store
            .write("rename", |db| rename_locked(db, h.id, new_name))
    }

    fn move_to(&self, dest: &Directory) -> Result<()> {
        let h = self.handle();
        let kind = self.kind();
        let dest = dest.id();
        h.store
            .write("move", |db| move_locked(db, h.id, kind, dest))
    }

    /// Move into the directory at `dest`: absolute from the root, relative from
    /// this node's parent.
    fn move_to_path(&self, dest: &str) -> Result<()> {
        let h = self.handle();
        let kind = self.kind();
        h.store.write("move", |db| {
            let dest_id = resolve_destination(db, h.id, dest)?;
            move_locked(db, h.id, kind, dest_id)
        })
    }

    /// True if this node is on `candidate`'s chain of parents.
    fn is_ancestor_of(&self, candidate: &Directory) -> Result<bool> {
        let h = self.handle();
        h.store.read(|db| is_ancestor(db, h.id, candidate.id()))
    }
}

/// A directory or a file
#[derive(Debug, Clone)]
pub enum Node {
    Directory(Directory),
    File(File),
}

impl Node {
    pub(crate) fn from_parts(store: Arc<StoreShared>, id: FsId, kind: NodeKind) -> Self {
        match kind {
            NodeKind::Directory => Node::Directory(Directory::from_parts(store, id)),
            NodeKind::File => Node::File(File::from_parts(store, id)),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<Directory> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }
}

impl FsNode for Node {
    fn handle(&self) -> &NodeHandle {
        match self {
            Node::Directory(d) => d.handle(),
            Node::File(f) => f.handle(),
        }
    }

    fn kind(&self) -> NodeKind {
        match self {
            Node::Directory(_) => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
        }
    }

    fn delete(&self) -> Result<()> {
        match self {
            Node::Directory(d) => d.delete(),
            Node::File(f) => f.delete(),
        }
    }
}

impl From<Directory> for Node {
    fn from(d: Directory) -> Self {
        Node::Directory(d)
    }
}

impl From<File> for Node {
    fn from(f: File) -> Self {
        Node::File(f)
    }
}

/// Parent directory id of `id`, `None` for the root.
pub(crate) fn parent_of(db: &Database, id: FsId) -> Result<Option<FsId>> {
    if id == FsId::ROOT {
        return Ok(None);
    }
    let parent = fetch_parent(db, id)?;
    match fetch_kind(db, parent)? {
        Some(NodeKind::Directory) => Ok(Some(parent)),
        _ => Err(FsError::NoParent),
    }
}

/// Parent of a non-root node that must have one.
pub(crate) fn require_parent(db: &Database, id: FsId) -> Result<FsId> {
    parent_of(db, id)?.ok_or(FsError::NoParent)
}

pub(crate) fn has_child(db: &Database, dir: FsId, name: &str) -> Result<bool> {
    Ok(!node::find_children(db, dir, Some(name), None)?.is_empty())
}

pub(crate) fn is_ancestor(db: &Database, ancestor: FsId, candidate: FsId) -> Result<bool> {
    let mut seen = HashSet::new();
    let mut current = candidate;
    while current != FsId::ROOT && current.is_valid() {
        if !seen.insert(current) {
            error!(id = %current, "cycle in parent chain");
            return Ok(false);
        }
        current = match fetch_parent(db, current) {
            Ok(parent) => parent,
            Err(FsError::NodeNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        if current == ancestor {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn rename_locked(db: &Database, id: FsId, new_name: &str) -> Result<()> {
    let new_name = name::validate_name(new_name)?;
    if id == FsId::ROOT {
        return Err(FsError::CannotRenameRoot);
    }
    let parent = require_parent(db, id)?;
    if has_child(db, parent, &new_name)? {
        return Err(FsError::NameAlreadyExists(new_name));
    }
    node::set_fields(db, id, vec![(column::NAME, new_name.as_str().into())])?;
    debug!(id = %id, name = %new_name, "renamed node");
    Ok(())
}

pub(crate) fn move_locked(db: &Database, id: FsId, kind: NodeKind, dest: FsId) -> Result<()> {
    if id == FsId::ROOT {
        return Err(FsError::CannotMoveRoot);
    }
    if id == dest {
        return Err(FsError::CannotMoveToSelf);
    }
    if fetch_kind(db, dest)? != Some(NodeKind::Directory) {
        return Err(FsError::DestDirNotFound(dest.to_string()));
    }
    if kind == NodeKind::Directory && is_ancestor(db, id, dest)? {
        return Err(FsError::CannotMoveToSubdir);
    }
    let name = fetch_name(db, id)?;
    if has_child(db, dest, &name)? {
        return Err(FsError::NameAlreadyExists(name));
    }
    let parent = require_parent(db, id)?;

    node::update_child_list(db, parent, ChildListOp::Del, id)?;
    node::set_fields(db, id, vec![(column::PARENT, dest.into())])?;
    node::update_child_list(db, dest, ChildListOp::Add, id)?;
    debug!(id = %id, from = %parent, to = %dest, "moved node");
    Ok(())
}

/// Resolve a move destination for node `id`.
fn resolve_destination(db: &Database, id: FsId, dest: &str) -> Result<FsId> {
    if dest.is_empty() {
        return Err(FsError::EmptyPath);
    }
    let not_found = |_| FsError::DestDirNotFound(dest.to_string());
    if path::is_absolute(dest) {
        return path::resolve_absolute(db, dest, Target::Directory)
            .map(|(dir, _)| dir)
            .map_err(not_found);
    }
    let base = parent_of(db, id)
        .ok()
        .flatten()
        .ok_or_else(|| FsError::DestDirNotFound(dest.to_string()))?;
    path::resolve_relative(db, base, dest, Target::Directory)
        .map(|(dir, _)| dir)
        .map_err(not_found)
}
