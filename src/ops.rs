//! Ad hoc select/update/delete helpers.
//!
//! Condition fragments are spliced into the statement verbatim: callers must
//! only pass trusted text. Table and column names are checked to be plain
//! identifiers, and update values are always bound.

use log::info;

use crate::error::SeedError;
use crate::executor::{QueryExecutor, Row, SqlValue};
use crate::schema::quote_ident;
use crate::Result;

fn ident(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(quote_ident(name))
    } else {
        Err(SeedError::InvalidIdentifier(name.to_string()))
    }
}

pub async fn select_all<E: QueryExecutor>(exec: &mut E, table: &str) -> Result<Vec<Row>> {
    let sql = format!("SELECT * FROM {}", ident(table)?);
    let rows = exec.execute(&sql, &[]).await?.into_rows()?;
    info!("found {} records in table {table}", rows.len());
    Ok(rows)
}

pub async fn select_where<E: QueryExecutor>(
    exec: &mut E,
    table: &str,
    condition: &str,
) -> Result<Vec<Row>> {
    if condition.trim().is_empty() {
        return select_all(exec, table).await;
    }
    let sql = format!("SELECT * FROM {} WHERE {condition}", ident(table)?);
    let rows = exec.execute(&sql, &[]).await?.into_rows()?;
    info!("found {} records in table {table}", rows.len());
    Ok(rows)
}

/// Sets each `(column, value)` on the rows matching `condition` and returns
/// how many rows changed.
pub async fn update<E: QueryExecutor>(
    exec: &mut E,
    table: &str,
    values: &[(&str, SqlValue)],
    condition: &str,
) -> Result<u64> {
    if values.is_empty() {
        return Err(SeedError::EmptyUpdate);
    }
    let set_clause = values
        .iter()
        .map(|(col, _)| ident(col).map(|c| format!("{c} = ?")))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let params: Vec<SqlValue> = values.iter().map(|(_, v)| v.clone()).collect();
    let sql = format!("UPDATE {} SET {set_clause} WHERE {condition}", ident(table)?);

    let n = exec.execute(&sql, &params).await?.affected();
    info!("updated {n} records in table {table}");
    Ok(n)
}

pub async fn delete<E: QueryExecutor>(exec: &mut E, table: &str, condition: &str) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE {condition}", ident(table)?);
    let n = exec.execute(&sql, &[]).await?.affected();
    info!("deleted {n} records from table {table}");
    Ok(n)
}

/// Row count and order date range of a table with an `order_date` column.
pub async fn table_info<E: QueryExecutor>(exec: &mut E, table: &str) -> Result<Row> {
    let sql = format!(
        "SELECT COUNT(*) AS total_records, MIN(order_date) AS min_date, MAX(order_date) AS max_date FROM {}",
        ident(table)?
    );
    let row = exec
        .execute(&sql, &[])
        .await?
        .into_rows()?
        .into_iter()
        .next()
        .ok_or_else(|| SeedError::StringError(format!("no summary returned for {table}")))?;
    info!("table {table}:");
    for (key, value) in row.iter() {
        info!("  {key}: {value}");
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryOutput;
    use crate::testing::{rows_of, FakeExecutor};

    #[test]
    fn identifiers_are_checked() {
        assert_eq!(ident("orders_data").unwrap(), "`orders_data`");
        assert_eq!(ident("_x1").unwrap(), "`_x1`");
        assert!(ident("").is_err());
        assert!(ident("1abc").is_err());
        assert!(ident("t; DROP TABLE x").is_err());
        assert!(ident("a`b").is_err());
    }

    #[tokio::test]
    async fn select_builds_where_clause() {
        let mut exec = FakeExecutor::new()
            .respond(rows_of("customer_id", &[SqlValue::from("ALFKI")]));
        let rows = select_where(&mut exec, "customers_data", "customer_id = 'ALFKI'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            exec.statements(),
            vec!["SELECT * FROM `customers_data` WHERE customer_id = 'ALFKI'"]
        );

        select_all(&mut exec, "customers_data").await.unwrap();
        assert_eq!(exec.statements()[1], "SELECT * FROM `customers_data`");
    }

    #[tokio::test]
    async fn blank_condition_selects_everything() {
        let mut exec = FakeExecutor::new();
        select_where(&mut exec, "orders_data", "  ").await.unwrap();
        assert_eq!(exec.statements(), vec!["SELECT * FROM `orders_data`"]);
    }

    #[tokio::test]
    async fn update_binds_values() {
        let mut exec = FakeExecutor::new().respond(QueryOutput::Affected(1));
        let n = update(
            &mut exec,
            "customers_data",
            &[("contact_name", SqlValue::from("X")), ("company_name", SqlValue::from("Y"))],
            "customer_id = 'ALFKI'",
        )
        .await
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(
            exec.executed[0].sql,
            "UPDATE `customers_data` SET `contact_name` = ?, `company_name` = ? WHERE customer_id = 'ALFKI'"
        );
        assert_eq!(
            exec.executed[0].params,
            vec![SqlValue::from("X"), SqlValue::from("Y")]
        );
    }

    #[tokio::test]
    async fn update_rejects_bad_input_before_executing() {
        let mut exec = FakeExecutor::new();
        assert!(matches!(
            update(&mut exec, "customers_data", &[], "1 = 1").await,
            Err(SeedError::EmptyUpdate)
        ));
        assert!(matches!(
            update(&mut exec, "customers_data", &[("a b", SqlValue::Null)], "1 = 1").await,
            Err(SeedError::InvalidIdentifier(_))
        ));
        assert!(exec.executed.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_count_and_errors() {
        let mut exec = FakeExecutor::new()
            .respond(QueryOutput::Affected(0))
            .fail("foreign key constraint");
        assert_eq!(delete(&mut exec, "orders_data", "order_id = 1").await.unwrap(), 0);
        assert!(delete(&mut exec, "customers_data", "1 = 1").await.is_err());
    }

    #[tokio::test]
    async fn table_info_returns_summary_row() {
        let summary: Row = vec![
            ("total_records", SqlValue::Int(3)),
            ("min_date", SqlValue::from("1996-07-04")),
            ("max_date", SqlValue::from("1996-07-08")),
        ]
        .into_iter()
        .collect();
        let mut exec = FakeExecutor::new().respond(QueryOutput::Rows(vec![summary.clone()]));
        let row = table_info(&mut exec, "orders_data").await.unwrap();
        assert_eq!(row, summary);
        assert!(exec.executed[0].sql.contains("MIN(order_date)"));
    }
}
