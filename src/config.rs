use crate::errors::ConfigError;
use std::env;
use std::str::FromStr;

/// Which `CarStore` implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// How `PATCH /car/:id` treats allow-listed fields missing from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Only fields present in the body are written.
    #[default]
    Partial,
    /// Every allow-listed field is written; missing ones become null.
    Replace,
}

impl FromStr for UpdateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "partial" => Ok(Self::Partial),
            "replace" => Ok(Self::Replace),
            other => Err(ConfigError::Invalid {
                key: "UPDATE_MODE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_port: u16,
    pub backend: StoreBackend,
    pub update_mode: UpdateMode,
    pub db: DbConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub uri: Option<String>,
    pub scheme: String,
    pub host: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub database: String,
    pub collection: String,
}

impl DbConfig {
    /// Connection string for the driver. An explicit `MONGODB_URI` wins;
    /// otherwise it is assembled from the parts, with credentials percent-encoded.
    pub fn connection_uri(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }

        let credentials = match (&self.user, &self.pass) {
            (Some(user), Some(pass)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(pass)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            _ => String::new(),
        };

        format!(
            "{}://{}{}/?retryWrites=true&w=majority",
            self.scheme, credentials, self.host
        )
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: env::var("PORT").unwrap_or_default(),
            })?;

        let backend = optional("STORE_BACKEND")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(StoreBackend::Mongo);

        let update_mode = optional("UPDATE_MODE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        let scheme = optional("DB_SCHEME").unwrap_or_else(|| "mongodb".to_string());
        if scheme != "mongodb" && scheme != "mongodb+srv" {
            return Err(ConfigError::Invalid {
                key: "DB_SCHEME",
                value: scheme,
            });
        }

        let db = DbConfig {
            uri: optional("MONGODB_URI"),
            scheme,
            host: optional("DB_HOST").unwrap_or_else(|| "localhost:27017".to_string()),
            user: optional("DB_USER"),
            pass: optional("DB_PASS"),
            database: optional("DB_NAME").unwrap_or_else(|| "toyCarsDB".to_string()),
            collection: optional("DB_COLLECTION").unwrap_or_else(|| "cars".to_string()),
        };

        Ok(Self {
            api_port,
            backend,
            update_mode,
            db,
        })
    }
}

// empty values count as unset
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
