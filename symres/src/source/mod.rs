//! Record source
//!
//! One flat query against the `symbols` table. The driver is picked at
//! runtime from the command line, so the connection goes through sqlx's
//! `Any` backend.

use futures::{Stream, TryStreamExt};
use log::info;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::{AnyPool, Row};
use std::str::FromStr;

use crate::domain::{Record, SourceError};

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Postgres,
    MySql,
    Sqlite,
}

impl FromStr for DbDriver {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pq" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(SourceError::UnsupportedDriver(s.to_string())),
        }
    }
}

impl DbDriver {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Turn a driver-specific DSN into a connection URL
    ///
    /// DSNs that already carry the driver's scheme pass through unchanged.
    #[must_use]
    pub fn connection_url(self, dsn: &str) -> String {
        match self {
            Self::Sqlite if dsn.starts_with("sqlite:") => dsn.to_string(),
            Self::Sqlite => format!("sqlite:{dsn}"),
            Self::Postgres if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") => {
                dsn.to_string()
            }
            Self::Postgres => format!("postgres://{dsn}"),
            Self::MySql if dsn.starts_with("mysql://") => dsn.to_string(),
            Self::MySql => format!("mysql://{}", strip_mysql_protocol(dsn)),
        }
    }

    /// The symbol query with this backend's placeholder syntax
    #[must_use]
    pub fn symbol_query(self) -> &'static str {
        match self {
            Self::Postgres => {
                "SELECT symbol_name, symbol_address FROM symbols WHERE symbol_instance_id_ref = $1"
            }
            Self::MySql | Self::Sqlite => {
                "SELECT symbol_name, symbol_address FROM symbols WHERE symbol_instance_id_ref = ?"
            }
        }
    }
}

/// `user:pass@tcp(host:3306)/db` → `user:pass@host:3306/db`
fn strip_mysql_protocol(dsn: &str) -> String {
    let Some(start) = dsn.find("@tcp(") else {
        return dsn.to_string();
    };
    let host_start = start + "@tcp(".len();
    match dsn[host_start..].find(')') {
        Some(len) => {
            let host = &dsn[host_start..host_start + len];
            format!("{}@{host}{}", &dsn[..start], &dsn[host_start + len + 1..])
        }
        None => dsn.to_string(),
    }
}

/// Database handle plus the backend it talks to
#[derive(Debug, Clone)]
pub struct RecordSource {
    pool: AnyPool,
    driver: DbDriver,
}

/// Result of [`RecordSource::fetch`]
///
/// `error` holds the row or stream error that cut the fetch short, if any;
/// `records` holds every row read before it.
#[derive(Debug, Default)]
pub struct Fetched {
    pub records: Vec<Record>,
    pub error: Option<SourceError>,
}

impl RecordSource {
    /// Connect eagerly so a bad DSN fails before any work starts
    ///
    /// # Errors
    /// Returns [`SourceError::Connect`] if the database is unreachable
    pub async fn connect(driver: DbDriver, dsn: &str) -> Result<Self, SourceError> {
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&driver.connection_url(dsn))
            .await
            .map_err(|source| SourceError::Connect { driver: driver.name(), source })?;

        info!("Connected to {} database", driver.name());
        Ok(Self { pool, driver })
    }

    /// Wrap an existing pool
    #[must_use]
    pub fn from_pool(pool: AnyPool, driver: DbDriver) -> Self {
        Self { pool, driver }
    }

    #[must_use]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    #[must_use]
    pub fn driver(&self) -> DbDriver {
        self.driver
    }

    /// Read every `(name, address)` pair recorded for `instance_id`
    ///
    /// The id is bound as an integer when it looks like one, as text otherwise.
    ///
    /// # Errors
    /// Returns [`SourceError::Query`] if the query itself fails
    pub async fn fetch(&self, instance_id: &str) -> Result<Fetched, SourceError> {
        let query = sqlx::query(self.driver.symbol_query());
        let query = match instance_id.trim().parse::<i64>() {
            Ok(id) => query.bind(id),
            Err(_) => query.bind(instance_id.to_string()),
        };

        let fetched = collect_records(query.fetch(&self.pool), |row| {
            Ok(Record { name: row.try_get("symbol_name")?, address: row.try_get("symbol_address")? })
        })
        .await?;

        info!("Fetched {} symbols for instance {instance_id}", fetched.records.len());
        Ok(fetched)
    }
}

/// Drain a row stream into records
///
/// An error before the first row is a query failure. Later stream errors and
/// rows that fail to decode end the fetch but keep what was read before them.
async fn collect_records<S, R, F>(mut rows: S, decode: F) -> Result<Fetched, SourceError>
where
    S: Stream<Item = Result<R, sqlx::Error>> + Unpin,
    F: Fn(&R) -> Result<Record, sqlx::Error>,
{
    let mut fetched = Fetched::default();

    loop {
        let row = match rows.try_next().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(source) if fetched.records.is_empty() => return Err(SourceError::Query(source)),
            Err(source) => {
                fetched.error = Some(SourceError::Query(source));
                break;
            }
        };

        match decode(&row) {
            Ok(record) => fetched.records.push(record),
            Err(source) => {
                fetched.error = Some(SourceError::Row { row: fetched.records.len(), source });
                break;
            }
        }
    }

    Ok(fetched)
}
