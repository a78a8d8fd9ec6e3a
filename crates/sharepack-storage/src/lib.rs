//! sharepack-storage — SQL backends for the batch re-encoder.
//!
//! Backends (each behind a cargo feature, all on by default):
//! - [`mysql`] — MySQL via `sqlx`
//! - [`postgres`] — PostgreSQL via `sqlx`
//! - [`mssql`] — SQL Server via `tiberius`
//!
//! Every backend implements `sharepack_core::ShareStore`: `id`-ordered
//! offset pagination for reads, one transaction per page for writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sharepack_core::{ReencodeError, ShareStore};

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mssql")]
pub use mssql::MssqlShareStore;
#[cfg(feature = "mysql")]
pub use mysql::MysqlShareStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresShareStore;

/// SQL dialect the target database speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Mysql,
    Postgres,
    Mssql,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
            Self::Mssql => write!(f, "mssql"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            other => Err(format!(
                "unknown dialect '{other}' (expected mysql, postgres, or mssql)"
            )),
        }
    }
}

/// Connection parameters for any backend.
///
/// Applied through each driver's typed connect-options builder, so
/// credentials never pass through a URL and need no percent-encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Connect to the database selected by `dialect` and return it as an
/// abstract [`ShareStore`].
pub async fn connect(
    dialect: Dialect,
    params: &ConnectParams,
) -> Result<Box<dyn ShareStore>, ReencodeError> {
    match dialect {
        #[cfg(feature = "mysql")]
        Dialect::Mysql => Ok(Box::new(MysqlShareStore::connect(params).await?)),
        #[cfg(feature = "postgres")]
        Dialect::Postgres => Ok(Box::new(PostgresShareStore::connect(params).await?)),
        #[cfg(feature = "mssql")]
        Dialect::Mssql => Ok(Box::new(MssqlShareStore::connect(params).await?)),
        #[allow(unreachable_patterns)]
        other => Err(ReencodeError::Storage(format!(
            "dialect {other} not compiled in"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build [`ConnectParams`] from `SHAREPACK_TEST_<PREFIX>_*` environment
    /// variables; used by the `#[ignore]`d backend integration tests.
    #[allow(dead_code)]
    pub(crate) fn params_from_env(prefix: &str, default_port: u16) -> ConnectParams {
        let var = |name: &str| std::env::var(format!("SHAREPACK_TEST_{prefix}_{name}"));
        ConnectParams {
            host: var("HOST").expect("SHAREPACK_TEST_*_HOST must be set"),
            port: var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port),
            user: var("USER").unwrap_or_else(|_| "root".into()),
            password: var("PASSWORD").unwrap_or_default(),
            database: var("DATABASE").unwrap_or_else(|_| "sharepack".into()),
        }
    }

    #[test]
    fn dialect_parses_common_spellings() {
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlserver".parse::<Dialect>().unwrap(), Dialect::Mssql);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn dialect_display_roundtrips() {
        for d in [Dialect::Mysql, Dialect::Postgres, Dialect::Mssql] {
            assert_eq!(d.to_string().parse::<Dialect>().unwrap(), d);
        }
    }
}
