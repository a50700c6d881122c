//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the storefront runs with an in-memory cart
//! store and an empty catalog when nothing is configured.
//!
//! - `POMELO_HOST` - Bind address (default: 127.0.0.1)
//! - `POMELO_PORT` - Listen port (default: 3000)
//! - `POMELO_DATABASE_URL` - `PostgreSQL` connection string for durable cart
//!   snapshots; when absent, snapshots live in process memory only
//! - `POMELO_CATALOG_PATH` - JSON file seeding the static catalog
//! - `POMELO_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is free
//!   (default: 75.00)
//! - `POMELO_SHIPPING_FLAT_FEE` - Flat fee below the threshold (default: 5.99)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use pomelo_core::Price;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FREE_SHIPPING_THRESHOLD: &str = "75.00";
const DEFAULT_SHIPPING_FLAT_FEE: &str = "5.99";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` connection URL for cart snapshots (contains password)
    pub database_url: Option<SecretString>,
    /// JSON file seeding the static catalog
    pub catalog_path: Option<PathBuf>,
    /// Shipping step-function policy values
    pub shipping: ShippingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shipping policy values.
///
/// These are presentation-time policy, deliberately outside the cart
/// aggregate so they can change without touching cart identity rules.
#[derive(Debug, Clone, Copy)]
pub struct ShippingConfig {
    /// Subtotal at or above which shipping is free
    pub free_threshold: Price,
    /// Flat fee charged below the threshold
    pub flat_fee: Price,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = match optional_var("POMELO_HOST") {
            Some(raw) => parse_env("POMELO_HOST", &raw)?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = match optional_var("POMELO_PORT") {
            Some(raw) => parse_env("POMELO_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let free_threshold = parse_price_env(
            "POMELO_FREE_SHIPPING_THRESHOLD",
            &optional_var("POMELO_FREE_SHIPPING_THRESHOLD")
                .unwrap_or_else(|| DEFAULT_FREE_SHIPPING_THRESHOLD.to_owned()),
        )?;

        let flat_fee = parse_price_env(
            "POMELO_SHIPPING_FLAT_FEE",
            &optional_var("POMELO_SHIPPING_FLAT_FEE")
                .unwrap_or_else(|| DEFAULT_SHIPPING_FLAT_FEE.to_owned()),
        )?;

        Ok(Self {
            host,
            port,
            database_url: optional_var("POMELO_DATABASE_URL").map(SecretString::from),
            catalog_path: optional_var("POMELO_CATALOG_PATH").map(PathBuf::from),
            shipping: ShippingConfig {
                free_threshold,
                flat_fee,
            },
            sentry_dsn: optional_var("SENTRY_DSN"),
            sentry_environment: optional_var("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Read an environment variable, treating unset and empty as absent.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parse a value with its `FromStr` impl, reporting the variable name on
/// failure.
fn parse_env<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err: T::Err| ConfigError::InvalidEnvVar(name.to_owned(), err.to_string()))
}

/// Parse a price-valued variable.
fn parse_price_env(name: &str, raw: &str) -> Result<Price, ConfigError> {
    Price::parse(raw).map_err(|err| ConfigError::InvalidEnvVar(name.to_owned(), err.to_string()))
}
