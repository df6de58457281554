//! Library module for dbprobe
//!
//! Exposes the CLI definition, the probe driver and error reporting so they
//! can be tested without spawning the binary. The binary entry point is in
//! main.rs.

use clap::Parser;
use dbprobe_core::{
    ConnectionParams, DbProbeError, Endpoint, FlagMap, ProbeReport, Result, USAGE,
    create_connector, parse_flag_pairs, run_probe,
};
use std::io::Write;
use tracing::debug;

/// Arguments clap answers itself, and only when given on their own.
const BUILTIN_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

/// CLI argument structure
#[derive(Parser)]
#[command(name = "dbprobe")]
#[command(about = "MySQL connectivity checker")]
#[command(version)]
#[command(long_about = "
dbprobe - check that a MySQL server accepts a login and answers queries

Connects with TLS disabled, a UTC session time zone and server-side prepared
statements off, then runs:
- SELECT 1 AS test_column
- SHOW TABLES

REQUIRED FLAGS:
  --host <host> --port <port> --database <database> --user <user> --password <password>

OPTIONAL FLAGS:
  --verbose <n>   log verbosity, 0 (warnings) to 3 (trace); logs go to stderr
  --quiet true    errors only

Every argument is read as a --key value pair. Unrecognized pairs are ignored.

EXIT STATUS:
  0  connected and both queries succeeded
  1  missing flag, driver unavailable, connection or query failure

EXAMPLES:
  dbprobe --host 127.0.0.1 --port 3306 --database app --user root --password secret
  dbprobe --verbose 2 --host db.internal --port 4000 --database test --user probe --password ''
")]
pub struct Cli {
    /// Connection flags as `--key value` pairs
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "--KEY VALUE",
        help = "Connection flags: --host, --port, --database, --user, --password"
    )]
    pub params: Vec<String>,
}

impl Cli {
    /// Builds the invocation from the process arguments, program name
    /// excluded.
    ///
    /// A lone `--help` or `--version` goes to clap. Everything else is kept
    /// verbatim for the pair scan, so no token is consumed out of turn.
    ///
    /// # Errors
    /// Returns the clap error that renders help or version text.
    pub fn from_args<I, S>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = args.into_iter().map(Into::into).collect();
        if let [only] = params.as_slice()
            && BUILTIN_FLAGS.contains(&only.as_str())
        {
            return Self::try_parse_from(["dbprobe", only.as_str()]);
        }
        Ok(Self { params })
    }

    /// Scans every argument into `--key value` pairs.
    pub fn flags(&self) -> FlagMap {
        parse_flag_pairs(&self.params)
    }
}

/// Log settings carried in the flag pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Value of `--verbose`; 0 when absent or not a number
    pub verbose: u8,
    /// `--quiet true`
    pub quiet: bool,
}

impl LogOptions {
    /// Reads `--verbose` and `--quiet` from `flags`.
    pub fn from_flags(flags: &FlagMap) -> Self {
        Self {
            verbose: flags
                .get("verbose")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            quiet: flags
                .get("quiet")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        }
    }
}

/// Validates the connection flags, then probes the server.
///
/// The transcript is written to `out`. Configuration problems are reported
/// before the driver is even looked up, so no network activity happens for
/// a missing or malformed flag.
///
/// # Errors
/// Returns configuration errors, a driver-unavailable error, or whatever the
/// probe itself returns.
pub async fn run<W: Write>(flags: &FlagMap, out: &mut W) -> Result<ProbeReport> {
    debug!("Recognized {} flag pairs", flags.len());

    let params = ConnectionParams::from_flags(flags)?;
    let endpoint = Endpoint::from_params(&params)?;
    let connector = create_connector()?;

    run_probe(connector.as_ref(), &endpoint, out).await
}

/// Writes the user-facing report for `error` to `err`.
///
/// Missing flags print the usage line; database errors print the message,
/// SQL state and error code on separate lines.
///
/// # Errors
/// Returns the I/O error if `err` cannot be written.
pub fn report_error<W: Write>(error: &DbProbeError, err: &mut W) -> std::io::Result<()> {
    match error {
        DbProbeError::MissingArguments { .. } => writeln!(err, "{USAGE}"),
        DbProbeError::Connection { diagnostics } | DbProbeError::Query { diagnostics, .. } => {
            writeln!(err, "{error}")?;
            writeln!(
                err,
                "SQL State: {}",
                diagnostics.sql_state.as_deref().unwrap_or("unknown")
            )?;
            writeln!(err, "Error Code: {}", diagnostics.error_code.unwrap_or(0))
        }
        other => writeln!(err, "{other}"),
    }
}
