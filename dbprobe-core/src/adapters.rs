//! Driver seam: connectors open sessions, sessions run statements.
//!
//! The probe sequence only talks to these traits, so the same code path is
//! driven by the real MySQL binding in production and by scripted fakes in
//! tests. Both traits are object-safe.

use crate::Result;
use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::fmt;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Statement sessions run to read the server version.
pub const VERSION_QUERY: &str = "SELECT VERSION()";

/// Server product and version reported after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Product name, e.g. `MySQL`
    pub product: String,
    /// Full version string as reported by the server
    pub version: String,
}

impl ServerInfo {
    /// Derives the product name from a `VERSION()` string.
    ///
    /// MySQL-compatible servers advertise themselves in the version suffix
    /// (`10.11.6-MariaDB-1`, `8.0.11-TiDB-v7.5.0`); anything else is MySQL.
    ///
    /// ```rust
    /// use dbprobe_core::adapters::ServerInfo;
    ///
    /// assert_eq!(ServerInfo::from_version("8.0.36").product, "MySQL");
    /// assert_eq!(ServerInfo::from_version("10.11.6-MariaDB").product, "MariaDB");
    /// ```
    pub fn from_version(version: impl Into<String>) -> Self {
        let version = version.into();
        let lowered = version.to_ascii_lowercase();
        let product = if lowered.contains("mariadb") {
            "MariaDB"
        } else if lowered.contains("tidb") {
            "TiDB"
        } else {
            "MySQL"
        };

        Self {
            product: product.to_string(),
            version,
        }
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product, self.version)
    }
}

/// Opens sessions against an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Display name of the driver, used in logs
    fn driver_name(&self) -> &'static str;

    /// Opens one session.
    ///
    /// # Errors
    /// Returns [`crate::DbProbeError::Connection`] with driver diagnostics if
    /// the server is unreachable or rejects the handshake.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>>;
}

/// An open database session.
#[async_trait]
pub trait Session: Send {
    /// Queries the server product and version.
    ///
    /// # Errors
    /// Returns a query error if the version query fails.
    async fn server_info(&mut self) -> Result<ServerInfo>;

    /// Runs `statement` over the text protocol and returns the first column
    /// of every row, `None` for SQL `NULL`.
    ///
    /// # Errors
    /// Returns [`crate::DbProbeError::Query`] if the statement fails.
    async fn first_column(&mut self, statement: &str) -> Result<Vec<Option<String>>>;

    /// Releases the session. Calling it twice is a no-op.
    ///
    /// # Errors
    /// Returns an error if the driver reports a failure while closing.
    async fn close(&mut self) -> Result<()>;
}

/// Returns the MySQL connector, or a driver-unavailable error when the
/// `mysql` feature is compiled out.
///
/// # Errors
/// Returns [`crate::DbProbeError::DriverUnavailable`] without the `mysql` feature.
pub fn create_connector() -> Result<Box<dyn Connector>> {
    #[cfg(feature = "mysql")]
    {
        Ok(Box::new(mysql::MySqlConnector::new()))
    }
    #[cfg(not(feature = "mysql"))]
    {
        Err(crate::error::DbProbeError::DriverUnavailable {
            driver: "MySQL",
            feature: "mysql",
        })
    }
}
