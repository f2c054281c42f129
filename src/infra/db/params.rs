//! Connection parameters for the startup connector.

use std::str::FromStr;

use sea_orm::sqlx::postgres::{PgConnectOptions, PgSslMode};

use super::error::ConnectError;
use crate::config::DatabaseConfig;

/// PostgreSQL TLS negotiation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    #[default]
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

/// An empty string selects `Disable`.
impl FromStr for SslMode {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(ConnectError::InvalidParameters(format!(
                "unknown sslmode {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Immutable connection parameters, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
    password: String,
    pub sslmode: SslMode,
}

impl std::fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("password", &"[REDACTED]")
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl ConnectionParameters {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        dbname: impl Into<String>,
        password: impl Into<String>,
        sslmode: SslMode,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            dbname: dbname.into(),
            password: password.into(),
            sslmode,
        }
    }

    /// Descriptor safe for logs (no password).
    pub fn descriptor(&self) -> String {
        format!(
            "host={} port={} user={} dbname={} sslmode={}",
            self.host, self.port, self.user, self.dbname, self.sslmode
        )
    }

    /// Driver options carrying the configured SSL mode.
    pub fn pg_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(self.sslmode.into())
    }
}

impl TryFrom<&DatabaseConfig> for ConnectionParameters {
    type Error = ConnectError;

    fn try_from(config: &DatabaseConfig) -> Result<Self, Self::Error> {
        if config.host.trim().is_empty() {
            return Err(ConnectError::InvalidParameters(
                "database host is empty".to_string(),
            ));
        }

        Ok(Self::new(
            config.host.clone(),
            config.port,
            config.user.clone(),
            config.dbname.clone(),
            config.password(),
            config.sslmode.parse()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sslmode_means_disable() {
        assert_eq!("".parse::<SslMode>().unwrap(), SslMode::Disable);
        assert_eq!("disable".parse::<SslMode>().unwrap(), SslMode::Disable);
    }

    #[test]
    fn configured_sslmode_is_kept() {
        assert_eq!("require".parse::<SslMode>().unwrap(), SslMode::Require);
        assert_eq!("Verify-Full".parse::<SslMode>().unwrap(), SslMode::VerifyFull);
    }

    #[test]
    fn unknown_sslmode_is_rejected() {
        let err = "sometimes".parse::<SslMode>().unwrap_err();
        assert!(matches!(err, ConnectError::InvalidParameters(_)));
    }

    #[test]
    fn parameters_forward_sslmode_from_config() {
        let mut config = DatabaseConfig::default();
        config.user = "author".to_string();
        config.dbname = "authors_db".to_string();
        config.sslmode = "verify-ca".to_string();

        let params = ConnectionParameters::try_from(&config).unwrap();
        assert_eq!(params.sslmode, SslMode::VerifyCa);
        assert_eq!(
            params.descriptor(),
            "host=localhost port=5432 user=author dbname=authors_db sslmode=verify-ca"
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut config = DatabaseConfig::default();
        config.host = " ".to_string();
        assert!(matches!(
            ConnectionParameters::try_from(&config),
            Err(ConnectError::InvalidParameters(_))
        ));
    }

    #[test]
    fn debug_and_descriptor_hide_password() {
        let params = ConnectionParameters::new("db", 5432, "u", "d", "hunter2", SslMode::Require);
        assert!(!format!("{:?}", params).contains("hunter2"));
        assert!(!params.descriptor().contains("hunter2"));
    }
}
