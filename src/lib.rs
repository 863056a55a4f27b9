pub mod config;
pub mod connection;
pub mod csv_reader;
pub mod error;
pub mod executor;
pub mod loader;
pub mod ops;
pub mod schema;
#[cfg(test)]
pub(crate) mod testing;

pub type Result<T> = std::result::Result<T, error::SeedError>;
