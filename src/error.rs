use std::fmt;

use thiserror::Error;

/// Coarse classification of a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// The driver could not be used: bad options, TLS or protocol trouble.
    Driver,
    /// The server could not be reached or refused us.
    Operational,
    Unknown,
}

impl ConnectErrorKind {
    pub fn classify(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::TypeNotFound { .. } => ConnectErrorKind::Driver,
            sqlx::Error::Io(_)
            | sqlx::Error::Database(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => ConnectErrorKind::Operational,
            _ => ConnectErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectErrorKind::Driver => "driver error",
            ConnectErrorKind::Operational => "connection error",
            ConnectErrorKind::Unknown => "unknown connection error",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("{0}")]
    StringError(String),
    #[error("{kind}: {source}")]
    Connect {
        kind: ConnectErrorKind,
        #[source]
        source: sqlx::Error,
    },
    #[error("sqlx error: {sqlx:?}")]
    SqlxError {
        #[from]
        sqlx: sqlx::Error,
    },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("update needs at least one column to set")]
    EmptyUpdate,
}

impl SeedError {
    pub fn connect(source: sqlx::Error) -> Self {
        SeedError::Connect {
            kind: ConnectErrorKind::classify(&source),
            source,
        }
    }
}
