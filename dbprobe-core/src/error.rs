//! Error types for the probe.
//!
//! Every error that reaches the user carries enough detail to diagnose a
//! failed probe (driver message, SQL state, vendor error code) but never the
//! password that was supplied on the command line.

use std::fmt;
use thiserror::Error;

/// Diagnostic detail extracted from a driver error.
///
/// Mirrors what a MySQL client reports for a failed operation: the server or
/// driver message, the five-character SQL state and the vendor error number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDiagnostics {
    /// Human-readable message from the server or driver
    pub message: String,
    /// SQLSTATE code, when the failure produced one
    pub sql_state: Option<String>,
    /// Vendor error number, when the server sent one
    pub error_code: Option<u32>,
}

impl SqlDiagnostics {
    /// Creates diagnostics carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            error_code: None,
        }
    }

    /// Builder method to set the SQL state.
    #[must_use]
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    /// Builder method to set the vendor error code.
    #[must_use]
    pub fn with_error_code(mut self, error_code: u32) -> Self {
        self.error_code = Some(error_code);
        self
    }
}

impl fmt::Display for SqlDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Main error type for dbprobe operations.
///
/// Configuration errors are raised before any network activity; the rest
/// come from the driver.
#[derive(Debug, Error)]
pub enum DbProbeError {
    /// One or more required flags were not supplied
    #[error("Missing required arguments: {}", missing.join(", "))]
    MissingArguments {
        /// Keys that were absent, in the order they are documented
        missing: Vec<&'static str>,
    },

    /// A supplied value could not be used
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was wrong with the value
        message: String,
    },

    /// The requested driver was not compiled into this build
    #[error("{driver} driver not available. Rebuild dbprobe with the \"{feature}\" feature enabled.")]
    DriverUnavailable {
        /// Display name of the driver
        driver: &'static str,
        /// Cargo feature that enables it
        feature: &'static str,
    },

    /// Opening the connection failed
    #[error("Database connection failed: {diagnostics}")]
    Connection {
        /// Driver detail for the failure
        diagnostics: SqlDiagnostics,
    },

    /// A statement failed after the connection was established
    #[error("Query failed ({statement}): {diagnostics}")]
    Query {
        /// The statement that failed
        statement: String,
        /// Driver detail for the failure
        diagnostics: SqlDiagnostics,
    },

    /// Writing the transcript failed
    #[error("I/O operation failed: {context}")]
    Io {
        /// What was being written
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with `DbProbeError`
pub type Result<T> = std::result::Result<T, DbProbeError>;

impl DbProbeError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a connection error from driver diagnostics
    pub const fn connection_failed(diagnostics: SqlDiagnostics) -> Self {
        Self::Connection { diagnostics }
    }

    /// Creates a query error for the given statement
    pub fn query_failed(statement: impl Into<String>, diagnostics: SqlDiagnostics) -> Self {
        Self::Query {
            statement: statement.into(),
            diagnostics,
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for errors detected before any connection attempt.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingArguments { .. } | Self::Configuration { .. }
        )
    }

    /// Driver diagnostics, for errors that came from the database.
    pub const fn diagnostics(&self) -> Option<&SqlDiagnostics> {
        match self {
            Self::Connection { diagnostics } | Self::Query { diagnostics, .. } => {
                Some(diagnostics)
            }
            _ => None,
        }
    }
}
