//! Connection endpoint descriptor.
//!
//! An [`Endpoint`] is everything needed to open one session: where the
//! server is, which database to select, who to authenticate as, and the
//! fixed driver options every probe uses.

use crate::error::{DbProbeError, Result};
use crate::params::ConnectionParams;
use crate::security::Credentials;
use std::fmt;
use url::Url;

/// Fixed driver options applied to every connection.
///
/// `Default` gives the options the probe always uses; the fields exist so the
/// descriptor can report them and the driver binding can apply them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Negotiate TLS with the server
    pub tls: bool,
    /// Session time zone, as sent in `SET time_zone`
    pub timezone: &'static str,
    /// Let the client request the server's RSA key for password exchange
    pub allow_public_key_retrieval: bool,
    /// Use the binary protocol (server-side prepared statements)
    pub server_prepared_statements: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tls: false,
            timezone: "+00:00",
            allow_public_key_retrieval: true,
            server_prepared_statements: false,
        }
    }
}

impl DriverOptions {
    /// Query-string form of the options, in a stable order.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            (
                "ssl-mode",
                if self.tls { "REQUIRED" } else { "DISABLED" }.to_string(),
            ),
            ("timezone", self.timezone.to_string()),
            (
                "allow-public-key-retrieval",
                self.allow_public_key_retrieval.to_string(),
            ),
            (
                "server-prepared-statements",
                self.server_prepared_statements.to_string(),
            ),
        ]
    }
}

/// Host, port, database, credentials and driver options for one session.
///
/// `Display` and [`Endpoint::descriptor_url`] never include the credentials.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Server host name or address
    pub host: String,
    /// Server TCP port
    pub port: u16,
    /// Database to select after authenticating
    pub database: String,
    /// User and password
    pub credentials: Credentials,
    /// Fixed driver options
    pub options: DriverOptions,
}

impl Endpoint {
    /// Builds an endpoint from validated connection parameters.
    ///
    /// # Errors
    /// Returns a configuration error if the port is not a valid non-zero
    /// TCP port or the host is empty.
    pub fn from_params(params: &ConnectionParams) -> Result<Self> {
        let port = params.port.trim().parse::<u16>().map_err(|_| {
            DbProbeError::configuration(format!(
                "Invalid port '{}': must be a number between 1 and 65535",
                params.port
            ))
        })?;

        let endpoint = Self {
            host: params.host.clone(),
            port,
            database: params.database.clone(),
            credentials: params.credentials.clone(),
            options: DriverOptions::default(),
        };
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Validates host and port.
    ///
    /// # Errors
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DbProbeError::configuration("host cannot be empty"));
        }

        if self.port == 0 {
            return Err(DbProbeError::configuration(
                "Invalid port '0': must be a number between 1 and 65535",
            ));
        }

        Ok(())
    }

    /// Describes the endpoint as a `mysql://` URL carrying the driver
    /// options as query parameters.
    ///
    /// # Example
    /// ```rust
    /// use dbprobe_core::endpoint::{DriverOptions, Endpoint};
    /// use dbprobe_core::security::Credentials;
    ///
    /// let endpoint = Endpoint {
    ///     host: "db.internal".to_string(),
    ///     port: 3306,
    ///     database: "app".to_string(),
    ///     credentials: Credentials::new("root".to_string(), "secret".to_string()),
    ///     options: DriverOptions::default(),
    /// };
    /// assert_eq!(
    ///     endpoint.descriptor_url(),
    ///     "mysql://db.internal:3306/app?ssl-mode=DISABLED&timezone=%2B00%3A00\
    ///      &allow-public-key-retrieval=true&server-prepared-statements=false"
    /// );
    /// ```
    pub fn descriptor_url(&self) -> String {
        let authority = format!("mysql://{}:{}", self.url_host(), self.port);
        let Ok(mut url) = Url::parse(&authority) else {
            // Hosts the URL parser rejects still get a readable descriptor
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.options.query_pairs())
                .finish();
            return format!("{authority}/{}?{query}", self.database);
        };

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&self.database);
        }
        url.query_pairs_mut()
            .extend_pairs(self.options.query_pairs());

        url.to_string()
    }

    /// Host as it appears in a URL authority; IPv6 literals are bracketed.
    fn url_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}
