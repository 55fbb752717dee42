//! Configuration for Products API

use core_config::{app_info, env_or_default, env_parse, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::DEFAULT_TABLE_NAME;
use std::fmt;
use std::str::FromStr;

pub use core_config::Environment;

/// Where products are stored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    MongoDb,
    /// Process-local map, lost on restart
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown store '{other}', expected 'mongodb' or 'memory'"
            )),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MongoDb => write!(f, "mongodb"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreKind,
    /// Collection holding the products
    pub table_name: String,
    /// Present when `store` is MongoDB
    pub mongodb: Option<MongoConfig>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let store: StoreKind = env_parse("PRODUCTS_STORE", StoreKind::default())?;
        let table_name = env_or_default("PRODUCTS_TABLE_NAME", DEFAULT_TABLE_NAME);

        let mongodb = match store {
            StoreKind::MongoDb => Some(MongoConfig::from_env()?),
            StoreKind::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            table_name,
            mongodb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "PRODUCTS_STORE",
        "PRODUCTS_TABLE_NAME",
        "MONGODB_URL",
        "MONGO_URL",
    ];

    #[test]
    fn test_store_kind_parsing() {
        assert_eq!("mongodb".parse::<StoreKind>(), Ok(StoreKind::MongoDb));
        assert_eq!("Memory".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert!("dynamo".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_memory_store_needs_no_mongodb() {
        temp_env::with_vars_unset(VARS, || {
            temp_env::with_var("PRODUCTS_STORE", Some("memory"), || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store, StoreKind::Memory);
                assert_eq!(config.table_name, "Products");
                assert!(config.mongodb.is_none());
                assert_eq!(config.app.name, "products_api");
            });
        });
    }

    #[test]
    fn test_mongodb_store_is_default() {
        temp_env::with_vars_unset(VARS, || {
            temp_env::with_vars(
                [
                    ("MONGODB_URL", Some("mongodb://localhost:27017")),
                    ("PRODUCTS_TABLE_NAME", Some("Catalog")),
                ],
                || {
                    let config = Config::from_env().unwrap();
                    assert_eq!(config.store, StoreKind::MongoDb);
                    assert_eq!(config.table_name, "Catalog");
                    assert_eq!(
                        config.mongodb.as_ref().map(|m| m.url()),
                        Some("mongodb://localhost:27017")
                    );
                },
            );
        });
    }

    #[test]
    fn test_mongodb_store_requires_url() {
        temp_env::with_vars_unset(VARS, || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_invalid_store_is_rejected() {
        temp_env::with_vars_unset(VARS, || {
            temp_env::with_var("PRODUCTS_STORE", Some("dynamo"), || {
                assert!(Config::from_env().is_err());
            });
        });
    }
}
