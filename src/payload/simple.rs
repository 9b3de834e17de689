//! Text or binary content.

use crate::db::{Column, DbError, DbResult, Row, Value};
use crate::payload::Payload;

const TYPE: &str = "dFileType";
const TEXT: &str = "dTextData";
const BINARY: &str = "dRawBinData";

const TEXT_CODE: i64 = 0;
const BINARY_CODE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimplePayload {
    Text(String),
    Binary(Vec<u8>),
}

impl SimplePayload {
    pub fn text(s: impl Into<String>) -> Self {
        SimplePayload::Text(s.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        SimplePayload::Binary(bytes.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SimplePayload::Text(s) => Some(s),
            SimplePayload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SimplePayload::Text(s) => s.as_bytes(),
            SimplePayload::Binary(b) => b,
        }
    }
}

impl Payload for SimplePayload {
    fn columns() -> Vec<Column> {
        vec![
            Column::new(TYPE, "integer"),
            Column::new(TEXT, "text"),
            Column::new(BINARY, "blob"),
        ]
    }

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        match self {
            SimplePayload::Text(s) => vec![
                (TYPE, TEXT_CODE.into()),
                (TEXT, s.as_str().into()),
                (BINARY, Value::Null),
            ],
            SimplePayload::Binary(b) => vec![
                (TYPE, BINARY_CODE.into()),
                (TEXT, Value::Null),
                (BINARY, Value::Blob(b.clone())),
            ],
        }
    }

    fn from_row(row: &Row) -> DbResult<Self> {
        match row.get(TYPE)?.as_i64() {
            Some(TEXT_CODE) => Ok(SimplePayload::Text(
                row.get(TEXT)?.as_str().unwrap_or_default().to_string(),
            )),
            Some(BINARY_CODE) => Ok(SimplePayload::Binary(
                row.get(BINARY)?.as_blob().unwrap_or_default().to_vec(),
            )),
            other => Err(DbError::Decode(format!("unknown payload type {:?}", other))),
        }
    }

    /// Text counts two bytes per UTF-16 code unit.
    fn size_in_bytes(&self) -> u64 {
        match self {
            SimplePayload::Text(s) => s.encode_utf16().count() as u64 * 2,
            SimplePayload::Binary(b) => b.len() as u64,
        }
    }
}
