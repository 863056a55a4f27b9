use log::{debug, error, info};
use sqlx::{ConnectOptions, Connection, Row};

use crate::config::DbConfig;
use crate::error::SeedError;
use crate::executor::QueryExecutor;
use crate::Result;

pub const CUSTOMERS_TABLE: &str = "customers_data";
pub const EMPLOYEES_TABLE: &str = "employees_data";
pub const ORDERS_TABLE: &str = "orders_data";

/// Table definitions in foreign-key order.
pub const TABLES: [(&str, &str); 3] = [
    (
        CUSTOMERS_TABLE,
        "CREATE TABLE IF NOT EXISTS customers_data (\
            customer_id VARCHAR(10) NOT NULL PRIMARY KEY, \
            company_name VARCHAR(100) NOT NULL, \
            contact_name VARCHAR(50) NOT NULL\
        ) CHARACTER SET 'utf8mb4'",
    ),
    (
        EMPLOYEES_TABLE,
        "CREATE TABLE IF NOT EXISTS employees_data (\
            employee_id INT NOT NULL PRIMARY KEY, \
            first_name VARCHAR(100) NOT NULL, \
            last_name VARCHAR(100) NOT NULL, \
            title VARCHAR(100) NOT NULL, \
            birth_date DATE NOT NULL, \
            notes VARCHAR(1000) NOT NULL\
        ) CHARACTER SET 'utf8mb4'",
    ),
    (
        ORDERS_TABLE,
        "CREATE TABLE IF NOT EXISTS orders_data (\
            order_id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
            customer_id VARCHAR(10) NOT NULL, \
            employee_id INT NOT NULL, \
            order_date DATE NOT NULL, \
            ship_city VARCHAR(100) NOT NULL, \
            FOREIGN KEY (customer_id) REFERENCES customers_data(customer_id), \
            FOREIGN KEY (employee_id) REFERENCES employees_data(employee_id)\
        ) CHARACTER SET 'utf8mb4'",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Created,
    AlreadyExists,
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Creates the target database through a separate administrative
/// connection, unless the server catalog already lists it.
pub async fn create_database(config: &DbConfig) -> Result<DatabaseStatus> {
    let res = try_create_database(config).await;
    if let Err(e) = &res {
        error!("failed to create database: {e}");
    }
    res
}

async fn try_create_database(config: &DbConfig) -> Result<DatabaseStatus> {
    let name = config
        .database_name()
        .ok_or_else(|| SeedError::StringError("no target database configured".into()))?;

    let mut admin = config
        .admin_options()?
        .connect()
        .await
        .map_err(SeedError::connect)?;

    let status = async {
        let existing = sqlx::query(
            "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
        )
        .bind(name)
        .fetch_optional(&mut admin)
        .await?;

        if let Some(row) = existing {
            let found: String = row.try_get(0)?;
            info!("database {found} already exists");
            return Ok(DatabaseStatus::AlreadyExists);
        }
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(name)))
            .execute(&mut admin)
            .await?;
        info!("database {name} created");
        Ok::<_, SeedError>(DatabaseStatus::Created)
    }
    .await;

    if let Err(e) = admin.close().await {
        debug!("error while closing admin connection: {e}");
    }
    status
}

/// Creates the three tables if they are missing. Existing tables are left
/// alone; the first failing statement aborts the rest.
pub async fn create_tables<E: QueryExecutor>(exec: &mut E) -> Result<()> {
    for (table, ddl) in TABLES {
        if let Err(e) = exec.execute(ddl, &[]).await {
            error!("failed to create table {table}: {e}");
            return Err(e);
        }
    }
    info!("tables ready");
    Ok(())
}
