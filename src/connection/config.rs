use crate::core::{DocError, Result};

const URL_SCHEME: &str = "safedoc://";
const DEFAULT_PORT: u16 = 27017;

/// Store connection settings plus the persistence switches read by models.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Store address, `host:port`
    pub uri: String,

    /// Database name
    pub database: String,

    /// Name reported to the store for diagnostics
    pub app_name: Option<String>,

    /// Write documents back after a read upgraded them. When off, upgraded
    /// documents are returned but the stored copies stay stale.
    pub persist_upgrades: bool,
}

impl StoreConfig {
    pub fn new(database: &str) -> Self {
        Self {
            uri: format!("localhost:{}", DEFAULT_PORT),
            database: database.to_string(),
            app_name: None,
            persist_upgrades: true,
        }
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    pub fn app_name(mut self, app_name: &str) -> Self {
        self.app_name = Some(app_name.to_string());
        self
    }

    pub fn persist_upgrades(mut self, persist: bool) -> Self {
        self.persist_upgrades = persist;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "safedoc://host[:port]/database"
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = StoreConfig::from_url("safedoc://localhost:27017/shop")?;
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url.strip_prefix(URL_SCHEME).ok_or_else(|| {
            DocError::Store(format!("URL must start with '{}'", URL_SCHEME))
        })?;

        let Some((host_port, database)) = rest.split_once('/') else {
            return Err(DocError::Store("Invalid host/database format".to_string()));
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| DocError::Store(format!("Invalid port '{}'", port)))?;
                (host, port)
            }
            None => (host_port, DEFAULT_PORT),
        };

        let config = Self::new(database).uri(&format!("{}:{}", host, port));
        config.validate()?;
        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        format!("{}{}/{}", URL_SCHEME, self.uri, self.database)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() || self.uri.starts_with(':') {
            return Err(DocError::Store("Host cannot be empty".to_string()));
        }

        if self.database.is_empty() {
            return Err(DocError::Store("Database name cannot be empty".to_string()));
        }

        if self.database.contains(['/', ' ', '.']) {
            return Err(DocError::Store(format!(
                "Invalid database name '{}'",
                self.database
            )));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("safedoc")
    }
}
