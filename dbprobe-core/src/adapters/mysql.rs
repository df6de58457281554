//! MySQL binding over sqlx.
//!
//! Statements go through `sqlx::raw_sql`, i.e. the text protocol
//! (`COM_QUERY`), so no server-side prepared statement is ever created.
//! The password is handed to the driver and nowhere else; statement logging
//! is disabled on the connect options.

use super::{Connector, ServerInfo, Session, VERSION_QUERY};
use crate::Result;
use crate::endpoint::Endpoint;
use crate::error::{DbProbeError, SqlDiagnostics};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{
    MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow, MySqlSslMode,
};
use sqlx::{ConnectOptions, Connection, Executor, Row};
use tracing::{debug, warn};

/// SQLSTATE reported for transport-level failures (communication link failure).
pub const COMMUNICATION_LINK_FAILURE: &str = "08S01";

/// Connector for MySQL-protocol servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    /// Creates a connector.
    pub const fn new() -> Self {
        Self
    }
}

/// Translates an endpoint into sqlx connect options.
///
/// sqlx requests the server's RSA public key on its own when
/// `caching_sha2_password` runs without TLS, so
/// `allow_public_key_retrieval` needs no driver switch.
pub fn connect_options(endpoint: &Endpoint) -> MySqlConnectOptions {
    let options = &endpoint.options;
    let ssl_mode = if options.tls {
        MySqlSslMode::Required
    } else {
        MySqlSslMode::Disabled
    };
    // The statement cache only holds server-side prepared statements
    let statement_cache_capacity = if options.server_prepared_statements {
        100
    } else {
        0
    };

    let mut connect = MySqlConnectOptions::new()
        .host(&endpoint.host)
        .port(endpoint.port)
        .database(&endpoint.database)
        .username(endpoint.credentials.username())
        .ssl_mode(ssl_mode)
        .timezone(Some(options.timezone.to_string()))
        .statement_cache_capacity(statement_cache_capacity)
        .disable_statement_logging();

    if endpoint.credentials.has_password() {
        connect = connect.password(endpoint.credentials.password());
    }

    connect
}

/// Extracts message, SQL state and vendor code from a sqlx error.
///
/// Transport failures carry no server diagnostics; they are reported under
/// [`COMMUNICATION_LINK_FAILURE`] with error code 0.
pub fn diagnostics_from(error: &sqlx::Error) -> SqlDiagnostics {
    match error {
        sqlx::Error::Database(db_error) => {
            let mut diagnostics = SqlDiagnostics::message(db_error.message());
            if let Some(state) = db_error.code() {
                diagnostics = diagnostics.with_sql_state(state);
            }
            if let Some(mysql_error) = db_error.try_downcast_ref::<MySqlDatabaseError>() {
                diagnostics = diagnostics.with_error_code(u32::from(mysql_error.number()));
            }
            diagnostics
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            SqlDiagnostics::message(error.to_string())
                .with_sql_state(COMMUNICATION_LINK_FAILURE)
                .with_error_code(0)
        }
        other => SqlDiagnostics::message(other.to_string()),
    }
}

fn first_column_of(row: &MySqlRow) -> std::result::Result<Option<String>, sqlx::Error> {
    // Text-protocol values are UTF-8 regardless of column type, so the
    // unchecked decode reads integers and names alike.
    row.try_get_unchecked::<Option<String>, _>(0)
}

#[async_trait]
impl Connector for MySqlConnector {
    fn driver_name(&self) -> &'static str {
        "MySQL"
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>> {
        debug!("Opening MySQL connection to {}", endpoint);

        let connection = connect_options(endpoint)
            .connect()
            .await
            .map_err(|e| DbProbeError::connection_failed(diagnostics_from(&e)))?;

        Ok(Box::new(MySqlSession {
            connection: Some(connection),
        }))
    }
}

/// One open MySQL connection.
pub struct MySqlSession {
    connection: Option<MySqlConnection>,
}

impl std::fmt::Debug for MySqlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSession")
            .field("open", &self.connection.is_some())
            .finish()
    }
}

impl MySqlSession {
    fn connection(&mut self, statement: &str) -> Result<&mut MySqlConnection> {
        self.connection.as_mut().ok_or_else(|| {
            DbProbeError::query_failed(
                statement,
                SqlDiagnostics::message("Connection already closed"),
            )
        })
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn server_info(&mut self) -> Result<ServerInfo> {
        let connection = self.connection(VERSION_QUERY)?;
        let row = Executor::fetch_one(connection, sqlx::raw_sql(VERSION_QUERY))
            .await
            .map_err(|e| DbProbeError::query_failed(VERSION_QUERY, diagnostics_from(&e)))?;
        let version = first_column_of(&row)
            .map_err(|e| DbProbeError::query_failed(VERSION_QUERY, diagnostics_from(&e)))?
            .unwrap_or_default();

        Ok(ServerInfo::from_version(version))
    }

    async fn first_column(&mut self, statement: &str) -> Result<Vec<Option<String>>> {
        let connection = self.connection(statement)?;
        debug!("Executing: {}", statement);

        sqlx::raw_sql(statement)
            .fetch(&mut *connection)
            .and_then(|row| futures::future::ready(first_column_of(&row)))
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| DbProbeError::query_failed(statement, diagnostics_from(&e)))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        connection.close().await.map_err(|e| {
            warn!("MySQL connection did not close cleanly: {}", e);
            DbProbeError::connection_failed(diagnostics_from(&e))
        })
    }
}
