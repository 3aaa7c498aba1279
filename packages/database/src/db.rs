//! Database connection utilities.

use serde::Deserialize;
use switchy_database::Database;
use switchy_database_connection::Credentials;

use crate::StoreError;

/// Environment variable holding the store password.
pub const PASSWORD_ENV: &str = "FIRE_MAP_DB_PASSWORD";

/// Connection settings for the `PostGIS` store.
///
/// The password is never read from configuration files; it comes from
/// [`PASSWORD_ENV`] via [`StoreConfig::with_password_from_env`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database user.
    pub user: String,
    /// Database name.
    pub database: String,
    /// Per-statement timeout in seconds.
    pub statement_timeout_secs: u64,
    #[serde(skip)]
    password: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "dba".to_string(),
            database: "gina".to_string(),
            statement_timeout_secs: 30,
            password: None,
        }
    }
}

impl StoreConfig {
    /// Sets the password explicitly.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Reads the password from [`PASSWORD_ENV`], if set.
    #[must_use]
    pub fn with_password_from_env(mut self) -> Self {
        self.password = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());
        self
    }

    /// Connection target without credentials, for diagnostics.
    #[must_use]
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    /// Full `postgres://` URL including the password.
    ///
    /// The user and password are percent-encoded so reserved characters
    /// (`@`, `:`, `/`, ...) cannot shift the host or database boundaries.
    #[must_use]
    pub fn url(&self) -> String {
        let user = urlencoding::encode(&self.user);
        let userinfo = self.password.as_ref().map_or_else(
            || user.to_string(),
            |password| format!("{user}:{}", urlencoding::encode(password)),
        );
        format!(
            "postgres://{userinfo}@{}:{}/{}",
            self.host, self.port, self.database
        )
    }
}

/// Opens the single store connection used for the process lifetime.
///
/// The session is made read-only and given a `statement_timeout` so stalled
/// spatial joins fail with an error instead of hanging a request.
///
/// # Errors
///
/// Returns [`StoreError::Connect`] if the credentials are rejected or the
/// server cannot be reached.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn Database>, StoreError> {
    let target = config.target();
    let connect_error = |message: String| StoreError::Connect {
        target: target.clone(),
        message,
    };

    let creds = Credentials::from_url(&config.url()).map_err(|e| connect_error(e.to_string()))?;
    let db = switchy_database_connection::init_postgres_raw_native_tls(creds)
        .await
        .map_err(|e| connect_error(e.to_string()))?;

    db.exec_raw(&format!(
        "SET statement_timeout = '{}s'",
        config.statement_timeout_secs
    ))
    .await
    .map_err(|e| connect_error(e.to_string()))?;
    db.exec_raw("SET default_transaction_read_only = on")
        .await
        .map_err(|e| connect_error(e.to_string()))?;

    log::info!("Connected to store {target}");

    Ok(db)
}
