//! Service configuration.

use std::path::{Path, PathBuf};

use tablebill_core::{BillingError, CurrencyCode, LookupPolicy, PlanCatalog};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The catalog file could not be read.
    #[error("failed to read plan catalog {path}: {source}")]
    CatalogIo {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog file is malformed or inconsistent.
    #[error("invalid plan catalog {path}: {source}")]
    CatalogInvalid {
        /// Path of the catalog file.
        path: PathBuf,
        /// Validation error.
        source: BillingError,
    },
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/tablebill"). Only
    /// used with the `rocksdb-backend` feature.
    pub data_dir: String,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Plan price catalog.
    pub catalog: PlanCatalog,

    /// What proration does when a price is missing from the catalog.
    pub lookup_policy: LookupPolicy,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if `CATALOG_PATH` is set but the file cannot be read
    /// or does not hold a valid catalog.
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog = match std::env::var("CATALOG_PATH") {
            Ok(path) => {
                let catalog = load_catalog(&path)?;
                tracing::info!(path = %path, plans = catalog.len(), "Loaded plan catalog from file");
                catalog
            }
            Err(_) => {
                tracing::debug!("CATALOG_PATH not set, using built-in plan catalog");
                PlanCatalog::default()
            }
        };

        warn_missing_yearly_discounts(&catalog);

        let lookup_policy = if env_flag("LENIENT_PRICE_LOOKUP") {
            tracing::warn!("Lenient price lookup enabled - missing prices count as zero");
            LookupPolicy::ZeroPriceFallback
        } else {
            LookupPolicy::Strict
        };

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/tablebill".into()),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            catalog,
            lookup_policy,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/tablebill".into(),
            service_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
            catalog: PlanCatalog::default(),
            lookup_policy: LookupPolicy::Strict,
        }
    }
}

/// Read and validate a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid catalog.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<PlanCatalog, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
        path: path.to_path_buf(),
        source,
    })?;
    PlanCatalog::from_json(&contents).map_err(|source| ConfigError::CatalogInvalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Yearly prices are expected to be discounted; the catalog is still accepted
/// when they are not.
fn warn_missing_yearly_discounts(catalog: &PlanCatalog) {
    let currencies: Vec<CurrencyCode> = catalog.currencies().into_iter().collect();
    for (plan_id, _) in catalog.iter() {
        for currency in &currencies {
            if catalog.yearly_discount_percent(plan_id, *currency).is_none() {
                tracing::warn!(
                    plan_id = %plan_id,
                    currency = %currency,
                    "Yearly price is not below twelve monthly payments"
                );
            }
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
