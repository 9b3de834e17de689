//! WHERE-clause construction.
//!
//! [`Condition::bind`] renders numbered placeholders plus the literals to bind, and is
//! what statements execute. [`Condition::to_sql`] inlines the literals instead (text in
//! single quotes, embedded quotes doubled) for logs and display.

use crate::types::FsId;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use std::fmt;

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(i64::from(v))
    }
}

impl From<FsId> for Literal {
    fn from(id: FsId) -> Self {
        Literal::Integer(id.as_i64())
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl ToSql for Literal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Literal::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Literal::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Literal::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A WHERE condition: single comparisons joined with AND
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        op: CompareOp,
        value: Literal,
    },
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Literal>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, &mut None);
        out
    }

    /// Clause text with `?N` placeholders numbered from `first`, and the literals to
    /// bind to them in order.
    pub fn bind(&self, first: usize) -> (String, Vec<&Literal>) {
        let mut out = String::new();
        let mut params = Some((first, Vec::new()));
        self.write_sql(&mut out, &mut params);
        (out, params.map(|(_, p)| p).unwrap_or_default())
    }

    fn write_sql<'a>(
        &'a self,
        out: &mut String,
        params: &mut Option<(usize, Vec<&'a Literal>)>,
    ) {
        match self {
            Condition::Compare { column, op, value } => {
                out.push('"');
                out.push_str(column);
                out.push('"');
                match (op, value) {
                    (CompareOp::Eq, Literal::Null) => out.push_str(" IS NULL"),
                    (CompareOp::Ne, Literal::Null) => out.push_str(" IS NOT NULL"),
                    _ => {
                        out.push(' ');
                        out.push_str(op.as_sql());
                        out.push(' ');
                        match params {
                            Some((first, bound)) => {
                                bound.push(value);
                                out.push('?');
                                out.push_str(&(*first + bound.len() - 1).to_string());
                            }
                            None => write_literal(out, value),
                        }
                    }
                }
            }
            Condition::And(lhs, rhs) => {
                out.push('(');
                lhs.write_sql(out, params);
                out.push_str(" AND ");
                rhs.write_sql(out, params);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn write_literal(out: &mut String, value: &Literal) {
    match value {
        Literal::Null => out.push_str("NULL"),
        Literal::Integer(v) => out.push_str(&v.to_string()),
        Literal::Text(s) => out.push_str(&quote_text(s)),
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
