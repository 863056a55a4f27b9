use clap::Args;
use sqlx::mysql::MySqlConnectOptions;

use crate::error::SeedError;
use crate::Result;

const SUPPORTED_DRIVERS: &[&str] = &["mysql", "mariadb", "tidb"];

/// Where and as whom to connect. Read once at startup, then passed by reference.
#[derive(Args, Debug, Clone, Default)]
pub struct DbConfig {
    /// Server address, optionally with a port (`host:port` or `host,port`)
    #[arg(long, env = "MS_SQL_SERVER")]
    pub server: Option<String>,

    /// Server port, overrides a port given in --server
    #[arg(long, env = "DB_PORT")]
    pub port: Option<u16>,

    /// Target database
    #[arg(long, env = "MS_SQL_DATABASE")]
    pub database: Option<String>,

    #[arg(long, env = "MS_SQL_USER")]
    pub user: Option<String>,

    #[arg(long, env = "MS_SQL_KEY", hide_env_values = true)]
    pub password: Option<String>,

    /// Driver identifier (mysql, mariadb or tidb)
    #[arg(long, env = "MS_SQL_DRIVER", default_value = "mysql")]
    pub driver: Option<String>,

    /// Database used for the bootstrap connection that creates the target
    #[arg(long, env = "MS_SQL_ADMIN_DATABASE")]
    pub admin_database: Option<String>,
}

impl DbConfig {
    /// Splits `server` into host and port. An explicit `port` wins.
    fn host_port(&self) -> (Option<&str>, Option<u16>) {
        let Some(server) = self.server.as_deref() else {
            return (None, self.port);
        };
        match server.rsplit_once([':', ',']) {
            Some((host, port)) => match port.trim().parse::<u16>() {
                Ok(p) => (Some(host.trim()), self.port.or(Some(p))),
                Err(_) => (Some(server), self.port),
            },
            None => (Some(server), self.port),
        }
    }

    fn check_driver(&self) -> Result<()> {
        match self.driver.as_deref() {
            None => Ok(()),
            Some(d) if SUPPORTED_DRIVERS.contains(&d.to_ascii_lowercase().as_str()) => Ok(()),
            Some(d) => Err(SeedError::connect(sqlx::Error::Configuration(
                format!("unsupported driver {d:?}, expected one of {SUPPORTED_DRIVERS:?}").into(),
            ))),
        }
    }

    fn base_options(&self, password: Option<&str>) -> Result<MySqlConnectOptions> {
        self.check_driver()?;
        let mut opts = MySqlConnectOptions::new();
        let (host, port) = self.host_port();
        if let Some(host) = host {
            opts = opts.host(host);
        }
        if let Some(port) = port {
            opts = opts.port(port);
        }
        if let Some(user) = self.user.as_deref() {
            opts = opts.username(user);
        }
        if let Some(pwd) = password.or(self.password.as_deref()) {
            opts = opts.password(pwd);
        }
        Ok(opts.charset("utf8mb4"))
    }

    /// Options for the primary connection to the target database.
    /// `password` overrides the configured one when given.
    pub fn connect_options(&self, password: Option<&str>) -> Result<MySqlConnectOptions> {
        let opts = self.base_options(password)?;
        Ok(match self.database.as_deref() {
            Some(db) => opts.database(db),
            None => opts,
        })
    }

    /// Options for the short-lived administrative connection.
    pub fn admin_options(&self) -> Result<MySqlConnectOptions> {
        let opts = self.base_options(None)?;
        Ok(match self.admin_database.as_deref() {
            Some(db) => opts.database(db),
            None => opts,
        })
    }

    /// Printable connection string. The password is never rendered.
    pub fn connection_string(&self, database: Option<&str>) -> String {
        let driver = self.driver.as_deref().unwrap_or("mysql");
        let user = self.user.as_deref().unwrap_or("");
        let (host, port) = self.host_port();
        let mut s = format!("{driver}://{user}");
        if self.password.is_some() {
            s.push_str(":***");
        }
        s.push('@');
        s.push_str(host.unwrap_or(""));
        if let Some(port) = port {
            s.push_str(&format!(":{port}"));
        }
        s.push('/');
        s.push_str(database.unwrap_or(""));
        s
    }

    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }
}
