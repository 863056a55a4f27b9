//! The single primitive every read and write goes through.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as _, TypeInfo, ValueRef};

use crate::error::SeedError;
use crate::Result;

/// A bound parameter or a decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::UInt(v) => i64::try_from(*v).ok(),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::UInt(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Date(v) => write!(f, "{v}"),
            SqlValue::DateTime(v) => write!(f, "{v}"),
            SqlValue::Time(v) => write!(f, "{v}"),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

/// One result row; columns keep the order the server reported them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        Row {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Affected(u64),
}

impl QueryOutput {
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Affected(_) => Err(SeedError::StringError(
                "expected a result set, got an affected-row count".into(),
            )),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            QueryOutput::Affected(n) => *n,
            QueryOutput::Rows(_) => 0,
        }
    }
}

/// Runs one statement. Read statements yield rows, everything else the
/// number of affected rows. Implementations log their own failures.
#[allow(async_fn_in_trait)]
pub trait QueryExecutor {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput>;
}

pub fn is_read_statement(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

pub(crate) fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for p in params {
        query = match p.clone() {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::UInt(v) => query.bind(v),
            SqlValue::Float(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::Bytes(v) => query.bind(v),
        };
    }
    query
}

pub(crate) fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut out = Row::new();
    for col in row.columns() {
        let i = col.ordinal();
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            out.push(col.name(), SqlValue::Null);
            continue;
        }
        let ty = raw.type_info().name().to_ascii_uppercase();
        let value = match ty.as_str() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                SqlValue::Int(row.try_get::<i64, _>(i)?)
            }
            t if t.ends_with("UNSIGNED") => SqlValue::UInt(row.try_get::<u64, _>(i)?),
            "BOOLEAN" => SqlValue::Bool(row.try_get::<bool, _>(i)?),
            "FLOAT" => SqlValue::Float(row.try_get::<f32, _>(i)? as f64),
            "DOUBLE" => SqlValue::Float(row.try_get::<f64, _>(i)?),
            "DATE" => SqlValue::Date(row.try_get::<NaiveDate, _>(i)?),
            "DATETIME" | "TIMESTAMP" => SqlValue::DateTime(row.try_get::<NaiveDateTime, _>(i)?),
            "TIME" => SqlValue::Time(row.try_get::<NaiveTime, _>(i)?),
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                SqlValue::Bytes(row.try_get::<Vec<u8>, _>(i)?)
            }
            _ => match row.try_get::<String, _>(i) {
                Ok(s) => SqlValue::Text(s),
                Err(_) => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
            },
        };
        out.push(col.name(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_detection_ignores_case_and_leading_space() {
        assert!(is_read_statement("SELECT * FROM t"));
        assert!(is_read_statement("\n   select count(*) from t"));
        assert!(is_read_statement("SeLeCt 1"));
        assert!(!is_read_statement("INSERT INTO t VALUES (1)"));
        assert!(!is_read_statement("  update t set a = 1"));
        assert!(!is_read_statement("sel"));
        assert!(!is_read_statement(""));
    }

    #[test]
    fn row_keeps_column_order() {
        let row: Row = vec![
            ("customer_id", SqlValue::from("ALFKI")),
            ("company_name", SqlValue::from("Alfreds Futterkiste")),
            ("contact_name", SqlValue::from("Maria Anders")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["customer_id", "company_name", "contact_name"]
        );
        assert_eq!(row.get("contact_name"), Some(&SqlValue::from("Maria Anders")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn integer_views() {
        assert_eq!(SqlValue::Int(3).as_i64(), Some(3));
        assert_eq!(SqlValue::UInt(7).as_i64(), Some(7));
        assert_eq!(SqlValue::from(" 12 ").as_i64(), Some(12));
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn output_accessors() {
        assert_eq!(QueryOutput::Affected(2).affected(), 2);
        assert!(QueryOutput::Affected(2).into_rows().is_err());
        assert_eq!(QueryOutput::Rows(vec![]).into_rows().unwrap().len(), 0);
    }
}
