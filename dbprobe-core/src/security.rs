//! Credential container with automatic memory zeroing.
//!
//! # Security
//! - Credentials are stored in `Zeroizing<T>` containers
//! - Memory is cleared when the credentials go out of scope
//! - The password never appears in `Debug` output

use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// User name and password for a single connection attempt.
///
/// # Example
///
/// ```rust
/// use dbprobe_core::security::Credentials;
///
/// let creds = Credentials::new("root".to_string(), "secret".to_string());
/// assert_eq!(creds.username(), "root");
/// assert!(!format!("{creds:?}").contains("secret"));
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: String, password: String) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the password for handing to the driver.
    ///
    /// Callers must not log or print the returned value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Checks if a non-empty password was supplied.
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &"****")
            .finish()
    }
}
