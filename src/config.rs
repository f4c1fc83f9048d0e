//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_WORKERS: usize = 4;
    pub const DEV_LOCAL_ROOT: &str = "./data";
    pub const DEV_CORS_ORIGIN: &str = "http://localhost:3000";

    /// Directory holding one sub-directory per report date.
    pub const REPORTS_ROOT: &str = "/user/rucio01/reports";

    // S3/MinIO defaults for development
    pub const DEV_S3_ENDPOINT: &str = "http://localhost:9100";
    pub const DEV_S3_BUCKET: &str = "reports";
    pub const DEV_S3_REGION: &str = "us-east-1";
    pub const DEV_S3_ACCESS_KEY: &str = "minioadmin";
    pub const DEV_S3_SECRET_KEY: &str = "minioadmin";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// How the `account` query parameter is turned into a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountMatch {
    /// The raw value is embedded as a regex sub-pattern.
    #[default]
    Regex,
    /// The value is escaped and matched as a literal field.
    Literal,
}

impl AccountMatch {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "regex" => Some(Self::Regex),
            "literal" => Some(Self::Literal),
            _ => None,
        }
    }
}

/// S3 storage configuration.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// S3 endpoint URL (for MinIO or custom S3-compatible services)
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Where report files are read from.
#[derive(Debug, Clone)]
pub enum StorageSettings {
    /// A local directory, typically a mount of the distributed filesystem.
    Local { root: PathBuf },
    S3(S3Settings),
}

impl StorageSettings {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::S3(_) => "s3",
        }
    }
}

/// Settings consumed by the report reader.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Path prefix in front of `{date}/http_monitoring_{report}.csv`
    pub reports_root: String,
    pub account_match: AccountMatch,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            reports_root: defaults::REPORTS_ROOT.to_string(),
            account_match: AccountMatch::default(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// Number of HTTP workers; `None` picks a default from the environment
    pub workers: Option<usize>,
    /// Origins allowed to fetch reports cross-site
    pub cors_origins: Vec<String>,
    pub reports: ReportSettings,
    pub storage: StorageSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `HMON_HOST`: Server host (default: 127.0.0.1)
    /// - `HMON_PORT`: Server port (default: 8080)
    /// - `HMON_WORKERS`: Worker count (default: 4 in development, CPU count in production)
    /// - `HMON_REPORTS_ROOT`: Report directory prefix (default: /user/rucio01/reports)
    /// - `HMON_ACCOUNT_MATCH`: `regex` or `literal` (default: regex)
    /// - `HMON_STORAGE`: `local` or `s3` (default: local in development, required in production)
    /// - `HMON_LOCAL_ROOT`: Root directory of the local backend (default: ./data)
    /// - `HMON_CORS_ORIGINS`: Comma-separated list of allowed origins
    /// - `S3_ENDPOINT`, `S3_BUCKET`, `S3_REGION`, `S3_ACCESS_KEY`, `S3_SECRET_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("HMON_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("HMON_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("HMON_PORT must be a valid port number"))?;

        let workers = match env::var("HMON_WORKERS") {
            Ok(raw) => Some(
                raw.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidValue(
                        "HMON_WORKERS must be a positive number",
                    ))?,
            ),
            Err(_) => None,
        };

        let cors_origins = match env::var("HMON_CORS_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) if environment.is_development() => vec![defaults::DEV_CORS_ORIGIN.to_string()],
            Err(_) => Vec::new(),
        };

        let account_match = match env::var("HMON_ACCOUNT_MATCH") {
            Ok(raw) => AccountMatch::parse(&raw).ok_or(ConfigError::InvalidValue(
                "HMON_ACCOUNT_MATCH must be 'regex' or 'literal'",
            ))?,
            Err(_) => AccountMatch::default(),
        };

        let reports = ReportSettings {
            reports_root: env::var("HMON_REPORTS_ROOT")
                .map(|root| root.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| defaults::REPORTS_ROOT.to_string()),
            account_match,
        };

        let storage = match env::var("HMON_STORAGE") {
            Ok(kind) => storage_from_env(&kind, environment)?,
            Err(_) if environment.is_development() => storage_from_env("local", environment)?,
            Err(_) => return Err(ConfigError::MissingEnvVar("HMON_STORAGE")),
        };

        let config = Config {
            environment,
            host,
            port,
            workers,
            cors_origins,
            reports,
            storage,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let StorageSettings::S3(ref s3) = self.storage
            && (s3.access_key == defaults::DEV_S3_ACCESS_KEY
                || s3.secret_key == defaults::DEV_S3_SECRET_KEY)
        {
            errors.push(
                "S3_ACCESS_KEY/S3_SECRET_KEY are using development defaults. Set production S3 credentials."
                    .to_string(),
            );
        }

        if self.reports.reports_root.is_empty() {
            errors.push("HMON_REPORTS_ROOT must not be empty.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    /// Worker count, falling back to 4 in development and one per CPU otherwise.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            if self.is_development() {
                defaults::DEV_WORKERS
            } else {
                num_cpus::get()
            }
        })
    }
}

fn storage_from_env(kind: &str, environment: Environment) -> Result<StorageSettings, ConfigError> {
    match kind.to_lowercase().as_str() {
        "local" => Ok(StorageSettings::Local {
            root: env::var("HMON_LOCAL_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DEV_LOCAL_ROOT)),
        }),
        "s3" => Ok(StorageSettings::S3(S3Settings {
            endpoint: env::var("S3_ENDPOINT").ok().or_else(|| {
                if environment.is_development() {
                    Some(defaults::DEV_S3_ENDPOINT.to_string())
                } else {
                    None
                }
            }),
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| defaults::DEV_S3_BUCKET.to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| defaults::DEV_S3_REGION.to_string()),
            access_key: env::var("S3_ACCESS_KEY")
                .unwrap_or_else(|_| defaults::DEV_S3_ACCESS_KEY.to_string()),
            secret_key: env::var("S3_SECRET_KEY")
                .unwrap_or_else(|_| defaults::DEV_S3_SECRET_KEY.to_string()),
        })),
        _ => Err(ConfigError::InvalidValue(
            "HMON_STORAGE must be 'local' or 's3'",
        )),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
