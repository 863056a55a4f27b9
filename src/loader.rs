//! Seed loaders for the three tables.
//!
//! Each loader reads its CSV file, resolves the required fields under either
//! the snake_case or the PascalCase header name, skips incomplete records and
//! inserts the rest one statement at a time. A failed record never stops the
//! batch.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use log::{info, warn};

use crate::csv_reader::{read_records, Record};
use crate::executor::{QueryExecutor, QueryOutput, SqlValue};

pub const CUSTOMERS_FILE: &str = "customers_data.csv";
pub const EMPLOYEES_FILE: &str = "employees_data.csv";
pub const ORDERS_FILE: &str = "orders_data.csv";

/// A required column and the header names it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub alias: &'static str,
}

const fn field(name: &'static str, alias: &'static str) -> Field {
    Field { name, alias }
}

pub const CUSTOMER_FIELDS: [Field; 3] = [
    field("customer_id", "CustomerID"),
    field("company_name", "CompanyName"),
    field("contact_name", "ContactName"),
];

pub const EMPLOYEE_FIELDS: [Field; 5] = [
    field("first_name", "FirstName"),
    field("last_name", "LastName"),
    field("title", "Title"),
    field("birth_date", "BirthDate"),
    field("notes", "Notes"),
];

pub const ORDER_FIELDS: [Field; 4] = [
    field("customer_id", "CustomerID"),
    field("employee_id", "EmployeeID"),
    field("order_date", "OrderDate"),
    field("ship_city", "ShipCity"),
];

const INSERT_CUSTOMER: &str = "INSERT INTO customers_data (customer_id, company_name, contact_name) \
     SELECT ?, ?, ? FROM DUAL \
     WHERE NOT EXISTS (SELECT 1 FROM customers_data WHERE customer_id = ?)";

const INSERT_EMPLOYEE: &str = "INSERT INTO employees_data (employee_id, first_name, last_name, title, birth_date, notes) \
     SELECT ?, ?, ?, ?, ?, ? FROM DUAL \
     WHERE NOT EXISTS (SELECT 1 FROM employees_data WHERE employee_id = ?)";

const INSERT_ORDER: &str =
    "INSERT INTO orders_data (customer_id, employee_id, order_date, ship_city) VALUES (?, ?, ?, ?)";

const SELECT_EMPLOYEE_IDS: &str = "SELECT employee_id FROM employees_data";

/// Looks a field up under its snake_case name, then its alias. Empty
/// values count as absent.
pub fn resolve<'r>(record: &'r Record, field: &Field) -> Option<&'r str> {
    [field.name, field.alias]
        .iter()
        .filter_map(|k| record.get(*k))
        .map(String::as_str)
        .find(|v| !v.is_empty())
}

/// Resolves all `fields` in order, or names the ones that are missing.
pub fn resolve_all<'r>(
    record: &'r Record,
    fields: &[Field],
) -> Result<Vec<&'r str>, Vec<&'static str>> {
    let mut values = Vec::with_capacity(fields.len());
    let mut missing = Vec::new();
    for f in fields {
        match resolve(record, f) {
            Some(v) => values.push(v),
            None => missing.push(f.name),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customers,
    Employees,
    Orders,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Customers => "customers",
            Entity::Employees => "employees",
            Entity::Orders => "orders",
        })
    }
}

/// Outcome of one loader run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub entity: Entity,
    pub read: usize,
    pub inserted: usize,
    /// Records lacking a required field.
    pub incomplete: usize,
    /// Orders whose employee does not exist.
    pub unknown_employee: usize,
    /// Statements that failed or changed nothing (already present).
    pub not_inserted: usize,
}

impl LoadReport {
    fn new(entity: Entity, read: usize) -> Self {
        Self {
            entity,
            read,
            inserted: 0,
            incomplete: 0,
            unknown_employee: 0,
            not_inserted: 0,
        }
    }

    fn record_insert(&mut self, res: crate::Result<QueryOutput>) {
        match res {
            Ok(out) if out.affected() > 0 => self.inserted += 1,
            _ => self.not_inserted += 1,
        }
    }

    fn finish(self) -> Self {
        info!("inserted {} {}", self.inserted, self.entity);
        self
    }
}

fn text(values: &[&str]) -> Vec<SqlValue> {
    values.iter().map(|v| SqlValue::from(*v)).collect()
}

pub async fn insert_customers<E: QueryExecutor>(exec: &mut E, path: impl AsRef<Path>) -> LoadReport {
    let records = read_records(path);
    load_customers(exec, &records).await
}

pub async fn load_customers<E: QueryExecutor>(exec: &mut E, records: &[Record]) -> LoadReport {
    let mut report = LoadReport::new(Entity::Customers, records.len());
    for record in records {
        let values = match resolve_all(record, &CUSTOMER_FIELDS) {
            Ok(v) => v,
            Err(missing) => {
                warn!("skipping incomplete customer record (missing {missing:?}): {record:?}");
                report.incomplete += 1;
                continue;
            }
        };
        let mut params = text(&values);
        params.push(SqlValue::from(values[0]));
        let res = exec.execute(INSERT_CUSTOMER, &params).await;
        report.record_insert(res);
    }
    report.finish()
}

pub async fn insert_employees<E: QueryExecutor>(exec: &mut E, path: impl AsRef<Path>) -> LoadReport {
    let records = read_records(path);
    load_employees(exec, &records).await
}

/// Employee ids are the 1-based position of the record in the file.
pub async fn load_employees<E: QueryExecutor>(exec: &mut E, records: &[Record]) -> LoadReport {
    let mut report = LoadReport::new(Entity::Employees, records.len());
    for (employee_id, record) in (1i64..).zip(records) {
        let values = match resolve_all(record, &EMPLOYEE_FIELDS) {
            Ok(v) => v,
            Err(missing) => {
                warn!(
                    "skipping incomplete employee record #{employee_id} (missing {missing:?}): {record:?}"
                );
                report.incomplete += 1;
                continue;
            }
        };
        let mut params = vec![SqlValue::Int(employee_id)];
        params.extend(text(&values));
        params.push(SqlValue::Int(employee_id));
        let res = exec.execute(INSERT_EMPLOYEE, &params).await;
        report.record_insert(res);
    }
    report.finish()
}

pub async fn insert_orders<E: QueryExecutor>(exec: &mut E, path: impl AsRef<Path>) -> LoadReport {
    let records = read_records(path);
    load_orders(exec, &records).await
}

async fn employee_ids<E: QueryExecutor>(exec: &mut E) -> crate::Result<HashSet<i64>> {
    let rows = exec.execute(SELECT_EMPLOYEE_IDS, &[]).await?.into_rows()?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get("employee_id").and_then(SqlValue::as_i64))
        .collect())
}

/// Orders referencing an employee that is not in `employees_data` are
/// skipped before reaching the database.
pub async fn load_orders<E: QueryExecutor>(exec: &mut E, records: &[Record]) -> LoadReport {
    let mut report = LoadReport::new(Entity::Orders, records.len());
    if records.is_empty() {
        return report.finish();
    }
    let known = match employee_ids(exec).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!("cannot load orders, employee lookup failed: {e}");
            report.not_inserted = records.len();
            return report.finish();
        }
    };

    for record in records {
        let values = match resolve_all(record, &ORDER_FIELDS) {
            Ok(v) => v,
            Err(missing) => {
                warn!("skipping incomplete order record (missing {missing:?}): {record:?}");
                report.incomplete += 1;
                continue;
            }
        };
        let (customer_id, employee_id, order_date, ship_city) =
            (values[0], values[1], values[2], values[3]);
        let employee_id = match employee_id.parse::<i64>() {
            Ok(id) if known.contains(&id) => id,
            _ => {
                warn!("skipping order for unknown employee {employee_id:?}: {record:?}");
                report.unknown_employee += 1;
                continue;
            }
        };
        let params = vec![
            SqlValue::from(customer_id),
            SqlValue::Int(employee_id),
            SqlValue::from(order_date),
            SqlValue::from(ship_city),
        ];
        let res = exec.execute(INSERT_ORDER, &params).await;
        report.record_insert(res);
    }
    report.finish()
}
