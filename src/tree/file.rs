//! Files: a node row plus a reference to one payload row.

use crate::db::Database;
use crate::error::{FsError, Result};
use crate::payload::Payload;
use crate::store::StoreShared;
use crate::tree::child_list::ChildListOp;
use crate::tree::directory::delete_payload_of;
use crate::tree::node::{self, column};
use crate::tree::{require_parent, FsNode, NodeHandle};
use crate::types::{FsId, NodeKind};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct File {
    handle: NodeHandle,
}

impl File {
    pub(crate) fn from_parts(store: Arc<StoreShared>, id: FsId) -> Self {
        Self {
            handle: NodeHandle::new(store, id),
        }
    }

    fn store(&self) -> &Arc<StoreShared> {
        &self.handle.store
    }

    /// Key of the payload row, [`FsId::NO_PAYLOAD`] if never saved.
    pub fn payload_id(&self) -> Result<FsId> {
        self.store().read(|db| payload_id_locked(db, self.id()))
    }

    pub(crate) fn set_payload_id(&self, key: FsId) -> Result<()> {
        self.store()
            .write("set_payload_id", |db| set_payload_id_locked(db, self.id(), key))
    }

    pub fn has_payload(&self) -> Result<bool> {
        Ok(self.payload_id()?.is_valid())
    }

    pub fn read_payload<P: Payload>(&self) -> Result<P> {
        self.store().read(|db| {
            let key = payload_id_locked(db, self.id())?;
            if !key.is_valid() {
                return Err(FsError::InvalidPayloadId);
            }
            P::load(db, key).map_err(|e| {
                error!(file = %self.id(), payload = %key, error = %e, "failed to load payload");
                FsError::GetPayload
            })
        })
    }

    /// Store `content`, reusing the existing payload row if there is one. Also
    /// updates the file size.
    pub fn save_payload<P: Payload>(&self, content: &P) -> Result<()> {
        self.store()
            .write("save_payload", |db| save_payload_locked(db, self.id(), content))
    }
}

impl FsNode for File {
    fn handle(&self) -> &NodeHandle {
        &self.handle
    }

    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn delete(&self) -> Result<()> {
        self.store()
            .write("delete_file", |db| delete_file(db, self.id()))
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("File").field(&self.handle.id).finish()
    }
}

pub(crate) fn payload_id_locked(db: &Database, file: FsId) -> Result<FsId> {
    Ok(node::fetch_children(db, file)?
        .first()
        .copied()
        .unwrap_or(FsId::NO_PAYLOAD))
}

pub(crate) fn set_payload_id_locked(db: &Database, file: FsId, key: FsId) -> Result<()> {
    node::store_children(db, file, &[key])
}

fn save_payload_locked<P: Payload>(db: &Database, file: FsId, content: &P) -> Result<()> {
    if node::fetch_kind(db, file)? != Some(NodeKind::File) {
        return Err(FsError::NodeNotFound(file.to_string()));
    }
    let current = payload_id_locked(db, file)?;
    if current == FsId::INVALID {
        return Err(FsError::InvalidPayloadId);
    }
    let existing = current.is_valid().then_some(current);
    let key = content.save(db, existing).map_err(|e| {
        error!(file = %file, error = %e, "failed to save payload");
        FsError::SavePayload
    })?;
    if !key.is_valid() {
        error!(file = %file, key = %key, "payload saved under an unusable key");
        return Err(FsError::SavePayload);
    }
    node::set_fields(db, file, vec![(column::SIZE, content.size_in_bytes().into())])?;
    set_payload_id_locked(db, file, key)?;
    debug!(file = %file, payload = %key, size = content.size_in_bytes(), "saved payload");
    Ok(())
}

pub(crate) fn delete_file(db: &Database, file: FsId) -> Result<()> {
    let parent = require_parent(db, file)?;
    node::update_child_list(db, parent, ChildListOp::Del, file)?;
    delete_payload_of(db, file)?;
    node::delete_node_row(db, file)?;
    debug!(id = %file, "deleted file");
    Ok(())
}
