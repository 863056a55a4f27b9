use log::{debug, error, info};
use sqlx::mysql::MySqlConnection;
use sqlx::{ConnectOptions, Connection, Executor};

use crate::config::DbConfig;
use crate::error::{ConnectErrorKind, SeedError};
use crate::executor::{bind_params, decode_row, is_read_statement, QueryExecutor, QueryOutput, SqlValue};
use crate::Result;

/// Owns the one primary connection of a session.
pub struct ConnectionManager<'a> {
    config: &'a DbConfig,
    conn: Option<MySqlConnection>,
    connection_string: Option<String>,
}

impl<'a> ConnectionManager<'a> {
    pub fn new(config: &'a DbConfig) -> Self {
        Self {
            config,
            conn: None,
            connection_string: None,
        }
    }

    pub fn config(&self) -> &'a DbConfig {
        self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    /// Opens the primary connection with autocommit on. A live connection is
    /// reused. Failures are logged with their class and returned.
    pub async fn connect(&mut self, password: Option<&str>) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn_str = self.config.connection_string(self.config.database_name());
        self.connection_string = Some(conn_str.clone());

        match self.open(password).await {
            Ok(conn) => {
                info!(
                    "connected to database {} on server {}",
                    self.config.database.as_deref().unwrap_or(""),
                    self.config.server.as_deref().unwrap_or("")
                );
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) => {
                if let SeedError::Connect { kind, source } = &e {
                    match kind {
                        ConnectErrorKind::Driver => error!("driver error ({conn_str}): {source}"),
                        ConnectErrorKind::Operational => {
                            error!("could not connect ({conn_str}): {source}")
                        }
                        ConnectErrorKind::Unknown => {
                            error!("unexpected error while connecting ({conn_str}): {source}")
                        }
                    }
                } else {
                    error!("could not connect ({conn_str}): {e}");
                }
                Err(e)
            }
        }
    }

    async fn open(&self, password: Option<&str>) -> Result<MySqlConnection> {
        let opts = self.config.connect_options(password)?;
        let mut conn = opts.connect().await.map_err(SeedError::connect)?;
        conn.execute("SET autocommit = 1")
            .await
            .map_err(SeedError::connect)?;
        Ok(conn)
    }

    /// Closes the primary connection. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!("error while closing connection: {e}");
            }
            info!("database connection closed");
        }
        self.connection_string = None;
    }

    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput> {
        if self.conn.is_none() {
            self.connect(None).await?;
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SeedError::StringError("no open connection".into()))?;

        debug!("executing: {}", sql.trim());
        let query = bind_params(sqlx::query(sql), params);
        if is_read_statement(sql) {
            let rows = query.fetch_all(&mut *conn).await?;
            let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
            Ok(QueryOutput::Rows(rows))
        } else {
            let res = query.execute(&mut *conn).await?;
            Ok(QueryOutput::Affected(res.rows_affected()))
        }
    }
}

impl QueryExecutor for ConnectionManager<'_> {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput> {
        self.run(sql, params).await.map_err(|e| {
            // connect already logged its own classified message
            if !matches!(e, SeedError::Connect { .. }) {
                error!("query failed: {e}");
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lazy_connect_failure_surfaces_connect_error() {
        let cfg = DbConfig {
            driver: Some("ODBC Driver 18 for SQL Server".into()),
            ..DbConfig::default()
        };
        let mut manager = ConnectionManager::new(&cfg);
        let res = manager.execute("SELECT 1", &[]).await;
        assert!(matches!(
            res,
            Err(SeedError::Connect {
                kind: ConnectErrorKind::Driver,
                ..
            })
        ));
        assert!(!manager.is_connected());
        assert!(manager.connection_string().is_some());

        manager.close().await;
        manager.close().await;
        assert!(manager.connection_string().is_none());
    }
}
