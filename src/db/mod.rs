//! Relational store
//!
//! Table creation, row query/insert/update/delete and transaction primitives over a
//! single SQLite connection. Nothing here knows about nodes or paths; the tree and
//! the store facade build on these calls.

pub mod condition;

pub use condition::{CompareOp, Condition, Literal};

use crate::types::FsId;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// Errors raised by the relational layer
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Column {0} missing from row")]
    MissingColumn(String),

    #[error("No row in {table} with key {key}")]
    RowNotFound { table: String, key: i64 },

    #[error("Cannot decode row: {0}")]
    Decode(String),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Column value passed to or read from the store
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<FsId> for Value {
    fn from(id: FsId) -> Self {
        Value::Integer(id.as_i64())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl<'a> From<ValueRef<'a>> for Value {
    fn from(v: ValueRef<'a>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// Column definition: name plus SQL type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub decl: String,
}

impl Column {
    pub fn new(name: impl Into<String>, decl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl: decl.into(),
        }
    }
}

/// One row of a query result
#[derive(Debug, Clone)]
pub struct Row {
    columns: Rc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Look a value up by column name (case-insensitive, like SQLite).
    pub fn get(&self, column: &str) -> DbResult<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| DbError::MissingColumn(column.to_string()))
    }

    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        self.value(idx).and_then(Value::as_i64)
    }

    pub fn get_str(&self, idx: usize) -> Option<&str> {
        self.value(idx).and_then(Value::as_str)
    }

    pub fn get_blob(&self, idx: usize) -> Option<&[u8]> {
        self.value(idx).and_then(Value::as_blob)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// A single connection to a SQLite store file
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the store file at `path`.
    pub fn open(path: &Path, busy_timeout: Duration) -> DbResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, reporting any failure to flush.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, e)| DbError::from(e))
    }

    /// Names of all tables currently defined in the file.
    pub fn table_names(&self) -> DbResult<Vec<String>> {
        let rows = self.query(
            "sqlite_master",
            &["name"],
            Some(&Condition::eq("type", "table")),
            None,
        )?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get_str(0).map(str::to_string))
            .collect())
    }

    pub fn create_table(&self, table: &str, columns: &[Column]) -> DbResult<()> {
        let cols = columns
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.decl))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE \"{}\" ({})", table, cols);
        trace!(sql = %sql, "create table");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Query `columns` (all when empty) from `table`.
    pub fn query(
        &self,
        table: &str,
        columns: &[&str],
        condition: Option<&Condition>,
        order_by: Option<&str>,
    ) -> DbResult<Vec<Row>> {
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {} FROM \"{}\"", projection, table);
        let mut params = Vec::new();
        if let Some(cond) = condition {
            let (clause, bound) = cond.bind(1);
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = bound;
        }
        if let Some(order) = order_by {
            sql.push_str(" ORDER BY \"");
            sql.push_str(order);
            sql.push('"');
        }
        trace!(sql = %sql, "query");

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Rc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into();
        let width = names.len();
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(Value::from(row.get_ref(idx)?));
            }
            out.push(Row {
                columns: Rc::clone(&names),
                values,
            });
        }
        Ok(out)
    }

    pub fn count(&self, table: &str, condition: Option<&Condition>) -> DbResult<usize> {
        let mut sql = format!("SELECT COUNT(*) FROM \"{}\"", table);
        let mut params = Vec::new();
        if let Some(cond) = condition {
            let (clause, bound) = cond.bind(1);
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = bound;
        }
        trace!(sql = %sql, "count");
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    /// Insert a row and return the generated primary key.
    pub fn insert(&self, table: &str, values: &[(&str, Value)]) -> DbResult<i64> {
        let cols = values
            .iter()
            .map(|(c, _)| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table, cols, placeholders
        );
        trace!(sql = %sql, "insert");
        let params: Vec<&dyn ToSql> = values.iter().map(|(_, v)| v as &dyn ToSql).collect();
        self.conn.execute(&sql, params.as_slice())?;
        Ok(self.last_insert_id())
    }

    /// Update matching rows; returns the number of rows affected.
    pub fn update(
        &self,
        table: &str,
        values: &[(&str, Value)],
        condition: &Condition,
    ) -> DbResult<usize> {
        let assignments = values
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("\"{}\" = ?{}", c, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let (clause, bound) = condition.bind(values.len() + 1);
        let sql = format!("UPDATE \"{}\" SET {} WHERE {}", table, assignments, clause);
        trace!(sql = %sql, "update");
        let params: Vec<&dyn ToSql> = values
            .iter()
            .map(|(_, v)| v as &dyn ToSql)
            .chain(bound.into_iter().map(|l| l as &dyn ToSql))
            .collect();
        Ok(self.conn.execute(&sql, params.as_slice())?)
    }

    /// Delete matching rows; returns the number of rows affected.
    pub fn delete(&self, table: &str, condition: &Condition) -> DbResult<usize> {
        let (clause, bound) = condition.bind(1);
        let sql = format!("DELETE FROM \"{}\" WHERE {}", table, clause);
        trace!(sql = %sql, "delete");
        Ok(self.conn.execute(&sql, params_from_iter(bound))?)
    }

    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub fn begin(&self) -> DbResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    pub fn commit(&self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    pub fn rollback(&self) -> DbResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let temp = TempDir::new().unwrap();
        let db = Database::open(&temp.path().join("t.db"), Duration::from_secs(1)).unwrap();
        (temp, db)
    }

    fn people(db: &Database) {
        db.create_table(
            "people",
            &[
                Column::new("id", "integer primary key autoincrement"),
                Column::new("name", "varchar(64)"),
                Column::new("data", "blob"),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_insert_query_update_delete() {
        let (_temp, db) = open_temp();
        people(&db);
        assert!(db.table_names().unwrap().contains(&"people".to_string()));

        let id = db
            .insert("people", &[("name", "o'neil".into()), ("data", vec![1u8, 2].into())])
            .unwrap();
        assert_eq!(id, 1);
        let id2 = db.insert("people", &[("name", "bob".into())]).unwrap();
        assert_eq!(id2, 2);

        let rows = db
            .query("people", &["id", "name"], Some(&Condition::eq("name", "o'neil")), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64(0), Some(1));
        assert_eq!(rows[0].get("NAME").unwrap().as_str(), Some("o'neil"));

        let n = db
            .update("people", &[("name", "alice".into())], &Condition::eq("id", 2i64))
            .unwrap();
        assert_eq!(n, 1);
        let n = db
            .update("people", &[("name", "zed".into())], &Condition::eq("id", 99i64))
            .unwrap();
        assert_eq!(n, 0);

        assert_eq!(db.count("people", None).unwrap(), 2);
        assert_eq!(
            db.count("people", Some(&Condition::eq("name", "alice"))).unwrap(),
            1
        );

        let all = db.query("people", &[], None, Some("id")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].get("name").unwrap().as_str(), Some("alice"));
        assert!(all[1].get("data").unwrap().is_null());
        assert_eq!(all[0].get("data").unwrap().as_blob(), Some(&[1u8, 2][..]));

        assert_eq!(db.delete("people", &Condition::eq("id", 1i64)).unwrap(), 1);
        assert_eq!(db.delete("people", &Condition::eq("id", 1i64)).unwrap(), 0);
    }

    #[test]
    fn test_control_characters_in_literals_are_bound() {
        let (_temp, db) = open_temp();
        people(&db);
        db.insert("people", &[("name", "a\0b".into())]).unwrap();
        db.insert("people", &[("name", "a".into())]).unwrap();

        let by_name = |name: &str| {
            db.query("people", &["id"], Some(&Condition::eq("name", name)), None)
                .unwrap()
                .len()
        };
        assert_eq!(by_name("a\0b"), 1);
        assert_eq!(by_name("a"), 1);
        assert_eq!(by_name("a\0c"), 0);
        assert_eq!(
            db.update(
                "people",
                &[("data", vec![7u8].into())],
                &Condition::eq("name", "a\0b")
            )
            .unwrap(),
            1
        );
        assert_eq!(db.count("people", Some(&Condition::eq("name", "a\0b"))).unwrap(), 1);
        assert_eq!(db.delete("people", &Condition::eq("name", "a\0b")).unwrap(), 1);
        assert_eq!(db.count("people", None).unwrap(), 1);
    }

    #[test]
    fn test_rollback_discards_changes() {
        let (_temp, db) = open_temp();
        people(&db);
        db.begin().unwrap();
        assert!(db.in_transaction());
        db.insert("people", &[("name", "temp".into())]).unwrap();
        db.rollback().unwrap();
        assert!(!db.in_transaction());
        assert!(db.query("people", &[], None, None).unwrap().is_empty());
    }

    #[test]
    fn test_autoincrement_never_reuses_ids() {
        let (_temp, db) = open_temp();
        people(&db);
        let a = db.insert("people", &[("name", "a".into())]).unwrap();
        db.delete("people", &Condition::eq("id", a)).unwrap();
        let b = db.insert("people", &[("name", "b".into())]).unwrap();
        assert!(b > a);
    }
}
