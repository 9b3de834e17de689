//! File content storage.
//!
//! A [`Payload`] type owns the schema of the payload table and knows how to turn
//! itself into a row and back. The tree only ever holds the row key.

pub mod simple;

pub use simple::SimplePayload;

use crate::db::{Column, Condition, Database, DbError, DbResult, Row, Value};
use crate::types::FsId;

pub const PAYLOAD_TABLE: &str = "DataBlock";
pub const PAYLOAD_KEY: &str = "dID";

/// File content persisted in the payload table
pub trait Payload: Sized {
    /// Columns besides the primary key. Must not be empty.
    fn columns() -> Vec<Column>;

    /// Column values for this content, in any order.
    fn to_values(&self) -> Vec<(&'static str, Value)>;

    fn from_row(row: &Row) -> DbResult<Self>;

    /// Size recorded on the owning file.
    fn size_in_bytes(&self) -> u64;

    /// Full table schema, key column first.
    fn schema() -> Vec<Column> {
        let mut columns = vec![Column::new(PAYLOAD_KEY, "integer primary key autoincrement")];
        columns.extend(Self::columns());
        columns
    }

    fn load(db: &Database, key: FsId) -> DbResult<Self> {
        let rows = db.query(
            PAYLOAD_TABLE,
            &[],
            Some(&Condition::eq(PAYLOAD_KEY, key)),
            None,
        )?;
        match rows.first() {
            Some(row) => Self::from_row(row),
            None => Err(DbError::RowNotFound {
                table: PAYLOAD_TABLE.to_string(),
                key: key.as_i64(),
            }),
        }
    }

    /// Insert (no key yet) or update in place; returns the row key.
    fn save(&self, db: &Database, existing: Option<FsId>) -> DbResult<FsId> {
        let values = self.to_values();
        match existing {
            None => db.insert(PAYLOAD_TABLE, &values).map(FsId::from_i64),
            Some(key) => {
                let updated =
                    db.update(PAYLOAD_TABLE, &values, &Condition::eq(PAYLOAD_KEY, key))?;
                if updated == 0 {
                    return Err(DbError::RowNotFound {
                        table: PAYLOAD_TABLE.to_string(),
                        key: key.as_i64(),
                    });
                }
                Ok(key)
            }
        }
    }
}

/// Remove a payload row. Returns the number of rows deleted.
pub(crate) fn delete_row(db: &Database, key: FsId) -> DbResult<usize> {
    db.delete(PAYLOAD_TABLE, &Condition::eq(PAYLOAD_KEY, key))
}
