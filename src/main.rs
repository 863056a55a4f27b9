use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dbseed::config::DbConfig;
use dbseed::connection::ConnectionManager;
use dbseed::error::SeedError;
use dbseed::executor::SqlValue;
use dbseed::loader::{self, CUSTOMERS_FILE, EMPLOYEES_FILE, ORDERS_FILE};
use dbseed::schema::{self, TABLES};
use dbseed::{ops, Result};
use log::{error, info, warn, LevelFilter};

#[derive(Parser)]
#[command(name = "dbseed")]
#[command(about = "Create the customers/employees/orders schema and load it from CSV")]
struct Cli {
    #[command(flatten)]
    db: DbConfig,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: LevelFilter,

    /// Write the log to this file instead of the terminal
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create database and tables, then load the seed files
    Seed {
        /// Directory holding the seed CSV files
        #[arg(short = 'd', long, default_value = ".")]
        data_dir: PathBuf,

        /// Do not try to create the target database
        #[arg(long)]
        skip_create_database: bool,
    },
    /// Print rows of a table
    Select {
        #[arg(short, long)]
        table: String,
        /// Raw condition, spliced into the WHERE clause as given
        #[arg(short = 'w', long = "where")]
        condition: Option<String>,
    },
    /// Set columns on matching rows
    Update {
        #[arg(short, long)]
        table: String,
        /// column=value, may be repeated
        #[arg(short = 's', long = "set", value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
        #[arg(short = 'w', long = "where")]
        condition: String,
    },
    /// Delete matching rows
    Delete {
        #[arg(short, long)]
        table: String,
        #[arg(short = 'w', long = "where")]
        condition: String,
    },
    /// Row count and order date range of a table
    Info {
        #[arg(short, long, default_value = schema::ORDERS_TABLE)]
        table: String,
    },
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (col, val) = s
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got {s:?}"))?;
    Ok((col.trim().to_string(), val.to_string()))
}

fn setup_logger(cli: &Cli) -> Result<()> {
    match &cli.log_file {
        Some(path) => simple_logging::log_to_file(path, cli.log_level)?,
        None => simple_logger::SimpleLogger::new()
            .with_utc_timestamps()
            .with_colors(true)
            .with_level(cli.log_level)
            .init()
            .map_err(|e| SeedError::StringError(e.to_string()))?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(&cli)?;

    let mut manager = ConnectionManager::new(&cli.db);
    let command = cli.command.as_ref();
    let res = tokio::select! {
        res = run(&mut manager, command) => res,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            Err(SeedError::StringError("interrupted".into()))
        }
    };
    manager.close().await;
    res
}

async fn run(manager: &mut ConnectionManager<'_>, command: Option<&Command>) -> Result<()> {
    match command {
        None => seed(manager, &PathBuf::from("."), false).await,
        Some(Command::Seed {
            data_dir,
            skip_create_database,
        }) => seed(manager, data_dir, *skip_create_database).await,
        Some(Command::Select { table, condition }) => {
            let rows = match condition {
                Some(cond) => ops::select_where(manager, table, cond).await?,
                None => ops::select_all(manager, table).await?,
            };
            for row in rows {
                let line = row
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{line}");
            }
            Ok(())
        }
        Some(Command::Update {
            table,
            values,
            condition,
        }) => {
            let values: Vec<(&str, SqlValue)> = values
                .iter()
                .map(|(c, v)| (c.as_str(), SqlValue::from(v.as_str())))
                .collect();
            ops::update(manager, table, &values, condition).await?;
            Ok(())
        }
        Some(Command::Delete { table, condition }) => {
            ops::delete(manager, table, condition).await?;
            Ok(())
        }
        Some(Command::Info { table }) => {
            ops::table_info(manager, table).await?;
            Ok(())
        }
    }
}

/// Provisions the schema and loads the seed files. Only a failed connection
/// or schema setup stops the run; everything after that is best effort.
async fn seed(
    manager: &mut ConnectionManager<'_>,
    data_dir: &std::path::Path,
    skip_create_database: bool,
) -> Result<()> {
    if !skip_create_database {
        // the target may already exist and be reachable, so keep going
        let _ = schema::create_database(manager.config()).await;
    }
    manager.connect(None).await?;
    schema::create_tables(manager).await?;

    let reports = [
        loader::insert_customers(manager, data_dir.join(CUSTOMERS_FILE)).await,
        loader::insert_employees(manager, data_dir.join(EMPLOYEES_FILE)).await,
        loader::insert_orders(manager, data_dir.join(ORDERS_FILE)).await,
    ];
    for r in &reports {
        info!(
            "{}: read {}, inserted {}, incomplete {}, unknown employee {}, not inserted {}",
            r.entity, r.read, r.inserted, r.incomplete, r.unknown_employee, r.not_inserted
        );
    }

    for (table, _) in TABLES {
        if let Err(e) = ops::select_all(manager, table).await {
            error!("could not read {table}: {e}");
        }
    }
    if let Err(e) = ops::table_info(manager, schema::ORDERS_TABLE).await {
        error!("could not summarize {}: {e}", schema::ORDERS_TABLE);
    }
    Ok(())
}
