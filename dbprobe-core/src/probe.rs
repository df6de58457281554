//! The diagnostic sequence: connect, report the server, run the two fixed
//! queries, release the connection.
//!
//! Progress and results are written to the supplied writer line by line.
//! Errors are returned, never printed here; reporting them is the caller's
//! job.

use crate::adapters::{Connector, ServerInfo, Session};
use crate::endpoint::Endpoint;
use crate::error::{DbProbeError, Result};
use std::io::Write;
use tracing::{info, warn};

/// Connectivity check statement.
pub const SIMPLE_QUERY: &str = "SELECT 1 AS test_column";

/// Table listing statement.
pub const SHOW_TABLES: &str = "SHOW TABLES";

/// Printed in place of a SQL `NULL` first column.
pub const NULL_DISPLAY: &str = "NULL";

/// What a successful probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Server product and version
    pub server: ServerInfo,
    /// First column of each row of [`SIMPLE_QUERY`]
    pub test_values: Vec<Option<String>>,
    /// First column of each row of [`SHOW_TABLES`]
    pub tables: Vec<Option<String>>,
}

/// Runs the full probe against `endpoint`, writing the transcript to `out`.
///
/// The session is closed on every path once it has been opened. A failure
/// while closing after an otherwise successful probe is logged, not
/// returned.
///
/// # Errors
/// Returns the first connection, query or write error encountered.
pub async fn run_probe<W: Write>(
    connector: &dyn Connector,
    endpoint: &Endpoint,
    out: &mut W,
) -> Result<ProbeReport> {
    emit(out, format_args!("Attempting to connect to: {}", endpoint.descriptor_url()))?;
    emit(out, format_args!("User: {}", endpoint.credentials.username()))?;

    info!("Target: {}", endpoint);
    info!("Connecting with the {} driver", connector.driver_name());
    let mut session = connector.connect(endpoint).await?;

    let outcome = run_queries(session.as_mut(), out).await;
    let closed = session.close().await;

    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(report), Err(e)) => {
            warn!("Ignoring error while releasing the connection: {}", e);
            Ok(report)
        }
        (Err(e), _) => Err(e),
    }
}

async fn run_queries<W: Write>(session: &mut dyn Session, out: &mut W) -> Result<ProbeReport> {
    emit(out, format_args!("Connection established successfully!"))?;

    let server = session.server_info().await?;
    emit(out, format_args!("Connection info: {server}"))?;
    info!("Connected to {}", server);

    emit(out, format_args!("Testing with a simple SELECT query..."))?;
    let test_values = session.first_column(SIMPLE_QUERY).await?;
    emit(out, format_args!("Simple query executed successfully!"))?;
    for value in &test_values {
        emit(out, format_args!("Result: {}", display_value(value.as_deref())))?;
    }

    emit(out, format_args!("Now executing SHOW TABLES..."))?;
    let tables = session.first_column(SHOW_TABLES).await?;
    for table in &tables {
        emit(out, format_args!("{}", display_value(table.as_deref())))?;
    }
    info!("{} tables listed", tables.len());

    Ok(ProbeReport {
        server,
        test_values,
        tables,
    })
}

fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or(NULL_DISPLAY)
}

fn emit<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>) -> Result<()> {
    writeln!(out, "{line}").map_err(|e| DbProbeError::io("Failed to write probe output", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::VERSION_QUERY;
    use crate::endpoint::DriverOptions;
    use crate::error::SqlDiagnostics;
    use crate::security::Credentials;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted connector: per-statement results, optional connect failure.
    #[derive(Default)]
    struct FakeConnector {
        refuse: Option<SqlDiagnostics>,
        version: String,
        results: HashMap<&'static str, std::result::Result<Vec<Option<String>>, SqlDiagnostics>>,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
        fail_server_info: Option<SqlDiagnostics>,
    }

    impl FakeConnector {
        fn healthy(tables: &[&str]) -> Self {
            let mut results = HashMap::new();
            results.insert(SIMPLE_QUERY, Ok(vec![Some("1".to_string())]));
            results.insert(
                SHOW_TABLES,
                Ok(tables.iter().map(|t| Some((*t).to_string())).collect()),
            );
            Self {
                version: "8.0.36".to_string(),
                results,
                ..Default::default()
            }
        }
    }

    struct FakeSession {
        version: String,
        results: HashMap<&'static str, std::result::Result<Vec<Option<String>>, SqlDiagnostics>>,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
        fail_server_info: Option<SqlDiagnostics>,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        fn driver_name(&self) -> &'static str {
            "Fake"
        }

        async fn connect(&self, _endpoint: &Endpoint) -> Result<Box<dyn Session>> {
            if let Some(diagnostics) = &self.refuse {
                return Err(DbProbeError::connection_failed(diagnostics.clone()));
            }
            Ok(Box::new(FakeSession {
                version: self.version.clone(),
                results: self.results.clone(),
                closes: Arc::clone(&self.closes),
                fail_close: self.fail_close,
                fail_server_info: self.fail_server_info.clone(),
            }))
        }
    }

    #[async_trait]
    impl Session for FakeSession {
        async fn server_info(&mut self) -> Result<ServerInfo> {
            if let Some(diagnostics) = &self.fail_server_info {
                return Err(DbProbeError::query_failed(VERSION_QUERY, diagnostics.clone()));
            }
            Ok(ServerInfo::from_version(self.version.clone()))
        }

        async fn first_column(&mut self, statement: &str) -> Result<Vec<Option<String>>> {
            match self.results.get(statement) {
                Some(Ok(rows)) => Ok(rows.clone()),
                Some(Err(diagnostics)) => {
                    Err(DbProbeError::query_failed(statement, diagnostics.clone()))
                }
                None => Ok(Vec::new()),
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(DbProbeError::connection_failed(SqlDiagnostics::message(
                    "close failed",
                )));
            }
            Ok(())
        }
    }

    fn endpoint() -> Endpoint {
        Endpoint {
            host: "db.internal".to_string(),
            port: 3306,
            database: "app".to_string(),
            credentials: Credentials::new("root".to_string(), "secret".to_string()),
            options: DriverOptions::default(),
        }
    }

    fn transcript(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_successful_probe_transcript() {
        let connector = FakeConnector::healthy(&["orders", "users"]);
        let mut out = Vec::new();

        let report = run_probe(&connector, &endpoint(), &mut out).await.unwrap();

        let lines = transcript(&out);
        assert_eq!(
            lines,
            vec![
                format!("Attempting to connect to: {}", endpoint().descriptor_url()),
                "User: root".to_string(),
                "Connection established successfully!".to_string(),
                "Connection info: MySQL 8.0.36".to_string(),
                "Testing with a simple SELECT query...".to_string(),
                "Simple query executed successfully!".to_string(),
                "Result: 1".to_string(),
                "Now executing SHOW TABLES...".to_string(),
                "orders".to_string(),
                "users".to_string(),
            ]
        );
        assert_eq!(report.server.product, "MySQL");
        assert_eq!(report.tables.len(), 2);
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_database_prints_no_table_lines() {
        let connector = FakeConnector::healthy(&[]);
        let mut out = Vec::new();

        let report = run_probe(&connector, &endpoint(), &mut out).await.unwrap();

        assert!(report.tables.is_empty());
        let lines = transcript(&out);
        assert_eq!(lines.last().map(String::as_str), Some("Now executing SHOW TABLES..."));
    }

    #[tokio::test]
    async fn test_transcript_never_contains_password() {
        let connector = FakeConnector::healthy(&["t"]);
        let mut out = Vec::new();
        run_probe(&connector, &endpoint(), &mut out).await.unwrap();

        assert!(!String::from_utf8(out).unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_null_first_column_prints_null() {
        let mut connector = FakeConnector::healthy(&[]);
        connector.results.insert(SIMPLE_QUERY, Ok(vec![None]));
        let mut out = Vec::new();

        run_probe(&connector, &endpoint(), &mut out).await.unwrap();

        assert!(transcript(&out).contains(&"Result: NULL".to_string()));
    }

    #[tokio::test]
    async fn test_connection_refused_opens_no_session() {
        let connector = FakeConnector {
            refuse: Some(
                SqlDiagnostics::message("Access denied for user 'root'")
                    .with_sql_state("28000")
                    .with_error_code(1045),
            ),
            ..Default::default()
        };
        let mut out = Vec::new();

        let error = run_probe(&connector, &endpoint(), &mut out).await.unwrap_err();

        let diagnostics = error.diagnostics().unwrap();
        assert_eq!(diagnostics.sql_state.as_deref(), Some("28000"));
        assert_eq!(diagnostics.error_code, Some(1045));
        assert_eq!(connector.closes.load(Ordering::SeqCst), 0);
        assert_eq!(transcript(&out).len(), 2);
    }

    #[tokio::test]
    async fn test_query_failure_still_closes_session() {
        let mut connector = FakeConnector::healthy(&[]);
        connector.results.insert(
            SHOW_TABLES,
            Err(SqlDiagnostics::message("No database selected")
                .with_sql_state("3D000")
                .with_error_code(1046)),
        );
        let mut out = Vec::new();

        let error = run_probe(&connector, &endpoint(), &mut out).await.unwrap_err();

        match &error {
            DbProbeError::Query { statement, .. } => assert_eq!(statement, SHOW_TABLES),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_info_failure_still_closes_session() {
        let mut connector = FakeConnector::healthy(&["t"]);
        connector.fail_server_info = Some(
            SqlDiagnostics::message("Lost connection to MySQL server during query")
                .with_sql_state("HY000")
                .with_error_code(2013),
        );
        let mut out = Vec::new();

        let error = run_probe(&connector, &endpoint(), &mut out).await.unwrap_err();

        match &error {
            DbProbeError::Query {
                statement,
                diagnostics,
            } => {
                assert_eq!(statement, VERSION_QUERY);
                assert_eq!(diagnostics.error_code, Some(2013));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        assert_eq!(
            transcript(&out).last().map(String::as_str),
            Some("Connection established successfully!")
        );
    }

    #[tokio::test]
    async fn test_close_failure_after_success_is_not_fatal() {
        let mut connector = FakeConnector::healthy(&["t"]);
        connector.fail_close = true;
        let mut out = Vec::new();

        let report = run_probe(&connector, &endpoint(), &mut out).await.unwrap();

        assert_eq!(report.tables, vec![Some("t".to_string())]);
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_io_error() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let connector = FakeConnector::healthy(&["t"]);
        let error = run_probe(&connector, &endpoint(), &mut BrokenPipe)
            .await
            .unwrap_err();

        assert!(matches!(error, DbProbeError::Io { .. }));
        // The first line fails before any session exists
        assert_eq!(connector.closes.load(Ordering::SeqCst), 0);
    }
}
