//! Core library for dbprobe, a MySQL connectivity checker.
//!
//! The binary turns `--key value` arguments into an [`Endpoint`], opens one
//! session through a [`Connector`], runs `SELECT 1 AS test_column` and
//! `SHOW TABLES`, and prints what it saw. This crate holds every piece of
//! that except the process plumbing.
//!
//! # Security Guarantees
//! - Passwords live in zeroizing storage and never appear in `Debug`,
//!   `Display`, log lines or error messages
//! - Both diagnostic statements are read-only
//! - Statements run over the text protocol; nothing is prepared server-side

pub mod adapters;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod params;
pub mod probe;
pub mod security;

// Re-export commonly used types
pub use adapters::{Connector, ServerInfo, Session, create_connector};
pub use endpoint::{DriverOptions, Endpoint};
pub use error::{DbProbeError, Result, SqlDiagnostics};
pub use logging::init_logging;
pub use params::{ConnectionParams, FlagMap, REQUIRED_KEYS, USAGE, parse_flag_pairs};
pub use probe::{ProbeReport, SHOW_TABLES, SIMPLE_QUERY, run_probe};
pub use security::Credentials;
