//! Node rows
//!
//! Column layout of the node table and the row-level helpers the tree builds on.
//! Every helper runs on an already locked connection; relational failures are
//! logged here and surface as the matching [`FsError`].

use crate::db::{Column, Condition, Database, DbError, Row, Value};
use crate::error::{FsError, Result};
use crate::filetime::FileTime;
use crate::tree::child_list::{self, ChildListOp};
use crate::types::{FsId, NodeKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

pub const NODE_TABLE: &str = "FsBlock";

pub mod column {
    pub const ID: &str = "fsID";
    pub const KIND: &str = "fsType";
    pub const CREATE_TIME: &str = "fsCreateTime";
    pub const LAST_MOD_TIME: &str = "fsLastModTime";
    pub const SIZE: &str = "fsFileSize";
    pub const NAME: &str = "fsName";
    pub const PARENT: &str = "fsParent";
    pub const CHILDREN: &str = "fsChild";
}

pub fn node_columns() -> Vec<Column> {
    vec![
        Column::new(column::ID, "integer primary key autoincrement"),
        Column::new(column::KIND, "integer"),
        Column::new(column::CREATE_TIME, "integer"),
        Column::new(column::LAST_MOD_TIME, "integer"),
        Column::new(column::SIZE, "integer"),
        Column::new(column::NAME, "varchar(512)"),
        Column::new(column::PARENT, "integer"),
        Column::new(column::CHILDREN, "blob"),
    ]
}

/// Snapshot of one node row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: FsId,
    pub kind: NodeKind,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub size: u64,
    pub parent: FsId,
    /// Child ids for a directory; at most the payload key for a file.
    pub children: Vec<FsId>,
}

fn by_id(id: FsId) -> Condition {
    Condition::eq(column::ID, id)
}

fn get_field_failed(id: FsId, e: DbError) -> FsError {
    error!(id = %id, error = %e, "failed to read node row");
    FsError::GetField
}

fn decode_children(id: FsId, value: &Value) -> Result<Vec<FsId>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Blob(bytes) => child_list::decode_ids(bytes).map_err(|e| {
            error!(id = %id, error = %e, "corrupt child list");
            FsError::CorruptChildList(id.to_string())
        }),
        other => {
            error!(id = %id, value = ?other, "child list column holds a non-blob value");
            Err(FsError::CorruptChildList(id.to_string()))
        }
    }
}

fn int_column(row: &Row, id: FsId, name: &str) -> Result<i64> {
    row.get(name)
        .map_err(|e| get_field_failed(id, e))?
        .as_i64()
        .ok_or_else(|| {
            error!(id = %id, column = name, "expected an integer column");
            FsError::GetField
        })
}

fn record_from_row(id: FsId, row: &Row) -> Result<NodeRecord> {
    let kind = NodeKind::from_code(int_column(row, id, column::KIND)?).ok_or_else(|| {
        error!(id = %id, "unknown node kind");
        FsError::GetField
    })?;
    let name = row
        .get(column::NAME)
        .map_err(|e| get_field_failed(id, e))?
        .as_str()
        .unwrap_or_default()
        .to_string();
    let children = decode_children(id, row.get(column::CHILDREN).map_err(|e| get_field_failed(id, e))?)?;
    Ok(NodeRecord {
        id: FsId::from_i64(int_column(row, id, column::ID)?),
        kind,
        name,
        created: FileTime::from_ticks(int_column(row, id, column::CREATE_TIME)?).to_datetime(),
        modified: FileTime::from_ticks(int_column(row, id, column::LAST_MOD_TIME)?).to_datetime(),
        size: int_column(row, id, column::SIZE)?.max(0) as u64,
        parent: FsId::from_i64(int_column(row, id, column::PARENT)?),
        children,
    })
}

pub fn fetch_record(db: &Database, id: FsId) -> Result<Option<NodeRecord>> {
    let rows = db
        .query(NODE_TABLE, &[], Some(&by_id(id)), None)
        .map_err(|e| get_field_failed(id, e))?;
    rows.first().map(|row| record_from_row(id, row)).transpose()
}

/// Read one column of a node row.
pub fn fetch_field(db: &Database, id: FsId, name: &str) -> Result<Value> {
    let rows = db
        .query(NODE_TABLE, &[name], Some(&by_id(id)), None)
        .map_err(|e| get_field_failed(id, e))?;
    rows.into_iter()
        .next()
        .and_then(|row| row.into_values().into_iter().next())
        .ok_or_else(|| FsError::NodeNotFound(id.to_string()))
}

pub fn fetch_int(db: &Database, id: FsId, name: &str) -> Result<i64> {
    fetch_field(db, id, name)?.as_i64().ok_or_else(|| {
        error!(id = %id, column = name, "expected an integer column");
        FsError::GetField
    })
}

/// Kind of the row with `id`, or `None` if there is no such row.
pub fn fetch_kind(db: &Database, id: FsId) -> Result<Option<NodeKind>> {
    match fetch_int(db, id, column::KIND) {
        Ok(code) => Ok(NodeKind::from_code(code)),
        Err(FsError::NodeNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn fetch_name(db: &Database, id: FsId) -> Result<String> {
    Ok(fetch_field(db, id, column::NAME)?
        .as_str()
        .unwrap_or_default()
        .to_string())
}

pub fn fetch_parent(db: &Database, id: FsId) -> Result<FsId> {
    fetch_int(db, id, column::PARENT).map(FsId::from_i64)
}

pub fn fetch_children(db: &Database, id: FsId) -> Result<Vec<FsId>> {
    decode_children(id, &fetch_field(db, id, column::CHILDREN)?)
}

/// Write columns of a node row. The modification time is always refreshed.
pub fn set_fields(db: &Database, id: FsId, fields: Vec<(&str, Value)>) -> Result<()> {
    let mut fields = fields;
    fields.push((column::LAST_MOD_TIME, FileTime::now().ticks().into()));
    let updated = db.update(NODE_TABLE, &fields, &by_id(id)).map_err(|e| {
        error!(id = %id, error = %e, "failed to update node row");
        FsError::SetField
    })?;
    if updated == 0 {
        return Err(FsError::NodeNotFound(id.to_string()));
    }
    Ok(())
}

pub fn store_children(db: &Database, id: FsId, ids: &[FsId]) -> Result<()> {
    let blob = if ids.is_empty() {
        Value::Null
    } else {
        Value::Blob(child_list::encode_ids(ids))
    };
    set_fields(db, id, vec![(column::CHILDREN, blob)])
}

/// Apply `op` to the child list of `dir`. Fails if the list did not change.
pub fn update_child_list(db: &Database, dir: FsId, op: ChildListOp, id: FsId) -> Result<()> {
    let mut ids = fetch_children(db, dir)?;
    if !child_list::apply(&mut ids, op, id) {
        return Err(FsError::ChildListNotUpdated);
    }
    store_children(db, dir, &ids)
}

/// Insert a fresh node row and return its id.
pub fn insert_node(db: &Database, kind: NodeKind, name: &str, parent: FsId) -> Result<FsId> {
    let now = FileTime::now().ticks();
    let raw = db
        .insert(
            NODE_TABLE,
            &[
                (column::KIND, kind.code().into()),
                (column::CREATE_TIME, now.into()),
                (column::LAST_MOD_TIME, now.into()),
                (column::SIZE, 0i64.into()),
                (column::NAME, name.into()),
                (column::PARENT, parent.into()),
            ],
        )
        .map_err(|e| {
            error!(name, parent = %parent, error = %e, "failed to insert node row");
            FsError::AddNode
        })?;
    let id = FsId::from_i64(raw);
    if !id.is_valid() {
        error!(raw, "store returned an unusable row id");
        return Err(FsError::LastInsertId);
    }
    Ok(id)
}

pub fn delete_node_row(db: &Database, id: FsId) -> Result<()> {
    match db.delete(NODE_TABLE, &by_id(id)) {
        Ok(0) => Err(FsError::CannotDeleteEntry),
        Ok(_) => Ok(()),
        Err(e) => {
            error!(id = %id, error = %e, "failed to delete node row");
            Err(FsError::CannotDeleteEntry)
        }
    }
}

/// Rows whose parent is `parent`, optionally narrowed by name and kind.
pub fn find_children(
    db: &Database,
    parent: FsId,
    name: Option<&str>,
    kind: Option<NodeKind>,
) -> Result<Vec<(FsId, NodeKind)>> {
    let mut cond = Condition::eq(column::PARENT, parent);
    if let Some(name) = name {
        cond = cond.and(Condition::eq(column::NAME, name));
    }
    if let Some(kind) = kind {
        cond = cond.and(Condition::eq(column::KIND, kind.code()));
    }
    let rows = db
        .query(NODE_TABLE, &[column::ID, column::KIND], Some(&cond), Some(column::ID))
        .map_err(|e| get_field_failed(parent, e))?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let id = FsId::from_i64(row.get_i64(0)?);
            let kind = NodeKind::from_code(row.get_i64(1)?)?;
            Some((id, kind))
        })
        .filter(|(id, _)| *id != FsId::ROOT)
        .collect())
}
