//! `--key value` argument scanning and required-key validation.
//!
//! The scanner is deliberately lenient: it walks the argument list two
//! tokens at a time and keeps every pair whose first token starts with `--`.
//! Anything else is skipped without complaint; only the absence of a
//! required key is an error.

use crate::error::{DbProbeError, Result};
use crate::security::Credentials;
use std::collections::HashMap;
use std::fmt;

/// Keys that must be present before a connection is attempted.
pub const REQUIRED_KEYS: [&str; 5] = ["host", "port", "database", "user", "password"];

/// Usage line printed when a required key is missing.
pub const USAGE: &str = "Usage: dbprobe --host <host> --port <port> --database <database> --user <user> --password <password>";

/// Parsed `--key value` mapping.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FlagMap {
    values: HashMap<String, String>,
}

impl FlagMap {
    /// Looks up the value for `key` (without the leading `--`).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` was supplied.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no pair was recognized.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required keys absent from this mapping, in documented order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !self.contains(key))
            .collect()
    }
}

// Values may include the password.
impl fmt::Debug for FlagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("FlagMap").field("keys", &keys).finish()
    }
}

/// Scans `args` into a [`FlagMap`].
///
/// Tokens are consumed in pairs starting at index 0. A pair is kept when its
/// first token starts with `--` and a second token exists; the key is the
/// first token without the prefix. A later occurrence of a key replaces an
/// earlier one.
///
/// # Example
/// ```rust
/// use dbprobe_core::params::parse_flag_pairs;
///
/// let flags = parse_flag_pairs(["--host", "db.internal", "stray", "--port"]);
/// assert_eq!(flags.get("host"), Some("db.internal"));
/// assert!(!flags.contains("port"));
/// ```
pub fn parse_flag_pairs<I, S>(args: I) -> FlagMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<S> = args.into_iter().collect();
    let mut values = HashMap::new();

    for pair in tokens.chunks(2) {
        if let [flag, value] = pair
            && let Some(key) = flag.as_ref().strip_prefix("--")
        {
            values.insert(key.to_string(), value.as_ref().to_string());
        } else {
            tracing::trace!("Skipping unpaired or malformed argument");
        }
    }

    FlagMap { values }
}

/// The five connection values, validated as present.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Server host name or address
    pub host: String,
    /// Server port, as supplied
    pub port: String,
    /// Database (schema) to select
    pub database: String,
    /// User and password
    pub credentials: Credentials,
}

impl ConnectionParams {
    /// Extracts the required keys from `flags`.
    ///
    /// # Errors
    /// Returns [`DbProbeError::MissingArguments`] listing every absent key.
    pub fn from_flags(flags: &FlagMap) -> Result<Self> {
        let missing = flags.missing_required();
        if !missing.is_empty() {
            return Err(DbProbeError::MissingArguments { missing });
        }

        let take = |key: &str| flags.get(key).map(str::to_string).unwrap_or_default();

        Ok(Self {
            host: take("host"),
            port: take("port"),
            database: take("database"),
            credentials: Credentials::new(take("user"), take("password")),
        })
    }
}
