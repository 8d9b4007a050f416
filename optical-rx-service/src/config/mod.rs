use secrecy::{ExposeSecret, Secret};
use service_core::config::{self as core_config, Environment};
use service_core::error::AppError;
use std::env;

/// Admin key shipped in development setups. Refused in production.
pub const DEFAULT_ADMIN_KEY: &str = "change-this-in-production";

const DEFAULT_OCR_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OCR_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ANALYTICS_RATE_LIMIT_PER_MIN: u32 = 60;

#[derive(Debug, Clone)]
pub struct RxConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub store: StoreConfig,
    pub security: SecurityConfig,
    pub ocr: OcrConfig,
    pub analytics: AnalyticsConfig,
    pub features: FeatureConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}'. Must be one of: mongodb, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub admin_key: Secret<String>,
    /// `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR is disabled (manual entry) when no key is configured.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub rate_limit_per_min: u32,
}

#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Family member, prescription, subscription, alert and OCR routes.
    pub phi_endpoints_enabled: bool,
}

impl RxConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common_config = core_config::Config::load()?;
        if let Ok(level) = env::var("LOG_LEVEL") {
            common_config.log_level = level;
        }
        let environment = Environment::current();
        let is_prod = environment.is_prod();

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), false)?.parse()?;
        let needs_mongo = is_prod && backend == StoreBackend::MongoDb;

        let admin_key = get_env("ADMIN_KEY", Some(DEFAULT_ADMIN_KEY), is_prod)?;
        validate_admin_key(&admin_key, is_prod)?;

        Ok(RxConfig {
            common: common_config,
            environment,
            store: StoreConfig {
                backend,
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), needs_mongo)?,
                database: get_env("MONGODB_DATABASE", Some("optical_rx"), needs_mongo)?,
            },
            security: SecurityConfig {
                admin_key: Secret::new(admin_key),
                allowed_origins: parse_origins(&get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?),
            },
            ocr: OcrConfig {
                api_key: env::var("LLM_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .map(Secret::new),
                model: get_env("OCR_MODEL", Some(DEFAULT_OCR_MODEL), false)?,
                api_base: get_env("OCR_API_BASE", Some(DEFAULT_OCR_API_BASE), false)?,
            },
            analytics: AnalyticsConfig {
                rate_limit_per_min: parse_rate_limit(&get_env(
                    "ANALYTICS_RATE_LIMIT_PER_MIN",
                    Some(&DEFAULT_ANALYTICS_RATE_LIMIT_PER_MIN.to_string()),
                    false,
                )?)?,
            },
            features: FeatureConfig {
                phi_endpoints_enabled: parse_bool(
                    &get_env("PHI_ENDPOINTS_ENABLED", Some("true"), false)?,
                    true,
                ),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }

    /// Development defaults with the in-memory store; used by tests and local runs.
    pub fn in_memory() -> Self {
        RxConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            store: StoreConfig {
                backend: StoreBackend::Memory,
                uri: String::new(),
                database: "optical_rx".to_string(),
            },
            security: SecurityConfig {
                admin_key: Secret::new(DEFAULT_ADMIN_KEY.to_string()),
                allowed_origins: vec!["*".to_string()],
            },
            ocr: OcrConfig {
                api_key: None,
                model: DEFAULT_OCR_MODEL.to_string(),
                api_base: DEFAULT_OCR_API_BASE.to_string(),
            },
            analytics: AnalyticsConfig {
                rate_limit_per_min: DEFAULT_ANALYTICS_RATE_LIMIT_PER_MIN,
            },
            features: FeatureConfig {
                phi_endpoints_enabled: true,
            },
            otlp_endpoint: None,
        }
    }

    pub fn admin_key(&self) -> &str {
        self.security.admin_key.expose_secret()
    }
}

/// Production deployments must not run with the shipped admin key.
pub fn validate_admin_key(key: &str, is_prod: bool) -> Result<(), AppError> {
    if key.trim().is_empty() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "ADMIN_KEY must not be empty"
        )));
    }
    if is_prod && key == DEFAULT_ADMIN_KEY {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "ADMIN_KEY must be changed from its default value in production"
        )));
    }
    Ok(())
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

/// Requests per minute per caller IP; must be a positive integer.
pub fn parse_rate_limit(raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "ANALYTICS_RATE_LIMIT_PER_MIN must be a positive integer, got '{}'",
            raw
        ))),
    }
}

pub fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
