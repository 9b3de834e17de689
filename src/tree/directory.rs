//! Directories: child management, lookup and recursive delete.

use crate::db::Database;
use crate::error::{FsError, Result};
use crate::payload;
use crate::store::StoreShared;
use crate::tree::child_list::ChildListOp;
use crate::tree::file::payload_id_locked;
use crate::tree::node;
use crate::tree::path::{self, Target};
use crate::tree::{has_child, name, require_parent, FsNode, Node, NodeHandle};
use crate::types::{FsId, NodeKind};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct Directory {
    handle: NodeHandle,
}

impl Directory {
    pub(crate) fn from_parts(store: Arc<StoreShared>, id: FsId) -> Self {
        Self {
            handle: NodeHandle::new(store, id),
        }
    }

    fn store(&self) -> &Arc<StoreShared> {
        &self.handle.store
    }

    fn node(&self, id: FsId, kind: NodeKind) -> Node {
        Node::from_parts(Arc::clone(self.store()), id, kind)
    }

    pub fn is_root(&self) -> bool {
        self.handle.id == FsId::ROOT
    }

    pub fn add_directory(&self, name: &str) -> Result<Directory> {
        let id = self
            .store()
            .write("add_directory", |db| add_child(db, self.id(), name, NodeKind::Directory))?;
        Ok(Directory::from_parts(Arc::clone(self.store()), id))
    }

    /// Create an empty file. It has no payload until the first save.
    pub fn add_file(&self, name: &str) -> Result<super::File> {
        let id = self
            .store()
            .write("add_file", |db| add_child(db, self.id(), name, NodeKind::File))?;
        Ok(super::File::from_parts(Arc::clone(self.store()), id))
    }

    /// Entry named `name`; `.` is this directory and `..` its parent.
    pub fn child(&self, name: &str) -> Result<Node> {
        let (id, kind) = self
            .store()
            .read(|db| path::child_of(db, self.id(), name))?;
        Ok(self.node(id, kind))
    }

    pub fn has_child(&self, name: &str) -> Result<bool> {
        self.store().read(|db| has_child(db, self.id(), name))
    }

    /// Number of entries in the stored child list.
    pub fn child_count(&self) -> Result<usize> {
        self.store()
            .read(|db| node::fetch_children(db, self.id()).map(|ids| ids.len()))
    }

    /// Apply `op` for `id` to the stored child list. Fails with
    /// [`FsError::ChildListNotUpdated`] if the list would not change.
    pub fn update_child_list(&self, op: ChildListOp, id: FsId) -> Result<()> {
        self.store()
            .write("update_child_list", |db| node::update_child_list(db, self.id(), op, id))
    }

    /// All entries in child-list order, or `None` if there are none.
    pub fn children(&self) -> Result<Option<Vec<Node>>> {
        self.list(None)
    }

    pub fn subdirectories(&self) -> Result<Option<Vec<Directory>>> {
        Ok(self.list(Some(NodeKind::Directory))?.map(|nodes| {
            nodes.into_iter().filter_map(Node::into_directory).collect()
        }))
    }

    pub fn files(&self) -> Result<Option<Vec<super::File>>> {
        Ok(self
            .list(Some(NodeKind::File))?
            .map(|nodes| nodes.into_iter().filter_map(Node::into_file).collect()))
    }

    fn list(&self, kind: Option<NodeKind>) -> Result<Option<Vec<Node>>> {
        let entries = self.store().read(|db| list_children(db, self.id(), kind))?;
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            entries
                .into_iter()
                .map(|(id, kind)| self.node(id, kind))
                .collect(),
        ))
    }

    /// Node at a path relative to this directory.
    pub fn resolve(&self, path: &str) -> Result<Node> {
        let (id, kind) = self
            .store()
            .read(|db| path::resolve_relative(db, self.id(), path, Target::Any))?;
        Ok(self.node(id, kind))
    }

    pub fn resolve_directory(&self, path: &str) -> Result<Directory> {
        let (id, _) = self
            .store()
            .read(|db| path::resolve_relative(db, self.id(), path, Target::Directory))?;
        Ok(Directory::from_parts(Arc::clone(self.store()), id))
    }

    pub fn resolve_file(&self, path: &str) -> Result<super::File> {
        let (id, _) = self
            .store()
            .read(|db| path::resolve_relative(db, self.id(), path, Target::File))?;
        Ok(super::File::from_parts(Arc::clone(self.store()), id))
    }
}

impl FsNode for Directory {
    fn handle(&self) -> &NodeHandle {
        &self.handle
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    /// Delete everything below this directory, then the directory itself. The
    /// root is emptied instead of removed.
    fn delete(&self) -> Result<()> {
        self.store()
            .write("delete_directory", |db| delete_directory(db, self.id()))
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Directory").field(&self.handle.id).finish()
    }
}

pub(crate) fn add_child(db: &Database, dir: FsId, name: &str, kind: NodeKind) -> Result<FsId> {
    let name = name::validate_name(name)?;
    if node::fetch_kind(db, dir)? != Some(NodeKind::Directory) {
        return Err(FsError::NodeNotFound(dir.to_string()));
    }
    if has_child(db, dir, &name)? {
        return Err(FsError::NameAlreadyExists(name));
    }
    let id = node::insert_node(db, kind, &name, dir)?;
    if let Err(e) = node::update_child_list(db, dir, ChildListOp::Add, id) {
        if let Err(cleanup) = node::delete_node_row(db, id) {
            error!(id = %id, error = %cleanup, "failed to remove orphaned node row");
        }
        return Err(e);
    }
    debug!(parent = %dir, id = %id, kind = %kind, name = %name, "added node");
    Ok(id)
}

/// Children of `dir` ordered as in its stored child list.
pub(crate) fn list_children(
    db: &Database,
    dir: FsId,
    kind: Option<NodeKind>,
) -> Result<Vec<(FsId, NodeKind)>> {
    let mut rows = node::find_children(db, dir, None, kind)?;
    let order = node::fetch_children(db, dir)?;
    rows.sort_by_key(|(id, _)| {
        (
            order.iter().position(|c| c == id).unwrap_or(usize::MAX),
            *id,
        )
    });
    Ok(rows)
}

/// Every node below `dir`, parents before their children.
fn subtree(db: &Database, dir: FsId) -> Result<Vec<(FsId, NodeKind)>> {
    let mut out = Vec::new();
    let mut pending = vec![dir];
    while let Some(current) = pending.pop() {
        for (id, kind) in node::find_children(db, current, None, None)? {
            if kind == NodeKind::Directory {
                pending.push(id);
            }
            out.push((id, kind));
        }
    }
    Ok(out)
}

/// Remove the payload row a file points at, if it was ever saved.
pub(crate) fn delete_payload_of(db: &Database, file: FsId) -> Result<()> {
    let key = payload_id_locked(db, file)?;
    if key == FsId::NO_PAYLOAD {
        return Ok(());
    }
    if !key.is_valid() {
        return Err(FsError::InvalidPayloadId);
    }
    match payload::delete_row(db, key) {
        Ok(0) => Err(FsError::CannotDeletePayload),
        Ok(_) => Ok(()),
        Err(e) => {
            error!(file = %file, payload = %key, error = %e, "failed to delete payload row");
            Err(FsError::CannotDeletePayload)
        }
    }
}

pub(crate) fn delete_directory(db: &Database, dir: FsId) -> Result<()> {
    if dir != FsId::ROOT {
        let parent = require_parent(db, dir)?;
        node::update_child_list(db, parent, ChildListOp::Del, dir)?;
    }

    // snapshot first, then delete leaves before the directories holding them
    let below = subtree(db, dir)?;
    for (id, kind) in below.iter().rev() {
        if *kind == NodeKind::File {
            delete_payload_of(db, *id)?;
        }
        node::delete_node_row(db, *id)?;
    }

    if dir == FsId::ROOT {
        node::store_children(db, dir, &[])?;
    } else {
        node::delete_node_row(db, dir)?;
    }
    debug!(id = %dir, removed = below.len(), "deleted directory");
    Ok(())
}
