//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::table::Breakpoints;
use crate::application::transfer::ConflictStrategy;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "proxyboard";
const ENV_PREFIX: &str = "PROXYBOARD";
const DEFAULT_API_URL: &str = "http://127.0.0.1:81/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_FILE: &str = ".proxyboard/token";
const DEFAULT_ROWS_PER_PAGE: usize = 25;
const MAX_ROWS_PER_PAGE: usize = 1000;
const DEFAULT_SEARCH_TTL_SECS: u64 = 300;

/// Flags accepted by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PROXYBOARD_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Control-plane API base URL, e.g. <http://127.0.0.1:81/api>
    #[arg(long = "api-url", env = "PROXYBOARD_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override the per-request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// File holding the session token between invocations.
    #[arg(
        long = "token-file",
        env = "PROXYBOARD_TOKEN_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub token_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Rows shown per table page.
    #[arg(long = "rows-per-page", value_name = "COUNT", global = true)]
    pub rows_per_page: Option<usize>,

    /// Layout width in columns; defaults to the terminal width.
    #[arg(long = "width", value_name = "COLUMNS", global = true)]
    pub width: Option<u16>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
    pub search: SearchSettings,
    pub table: TableSettings,
    pub import: ImportSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub token_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct TableSettings {
    pub rows_per_page: usize,
    pub breakpoints: Breakpoints,
    pub width: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub strategy: ConflictStrategy,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(overrides: &GlobalOverrides) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = overrides.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(overrides);
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    session: RawSessionSettings,
    logging: RawLoggingSettings,
    search: RawSearchSettings,
    table: RawTableSettings,
    import: RawImportSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTableSettings {
    rows_per_page: Option<usize>,
    breakpoints: Option<Breakpoints>,
    width: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImportSettings {
    strategy: Option<String>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(path) = overrides.token_file.as_ref() {
            self.session.token_file = Some(path.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(rows) = overrides.rows_per_page {
            self.table.rows_per_page = Some(rows);
        }
        if let Some(width) = overrides.width {
            self.table.width = Some(width);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            session,
            logging,
            search,
            table,
            import,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            session: build_session_settings(session),
            logging: build_logging_settings(logging)?,
            search: build_search_settings(search),
            table: build_table_settings(table)?,
            import: build_import_settings(import)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let raw_url = api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let base_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("api.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "api.base_url",
            "scheme must be http or https",
        ));
    }

    let timeout_secs = api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_session_settings(session: RawSessionSettings) -> SessionSettings {
    let token_file = session.token_file.unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(DEFAULT_TOKEN_FILE)
    });
    SessionSettings { token_file }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_search_settings(search: RawSearchSettings) -> SearchSettings {
    SearchSettings {
        ttl: Duration::from_secs(search.ttl_seconds.unwrap_or(DEFAULT_SEARCH_TTL_SECS)),
    }
}

fn build_table_settings(table: RawTableSettings) -> Result<TableSettings, LoadError> {
    let rows_per_page = table.rows_per_page.unwrap_or(DEFAULT_ROWS_PER_PAGE);
    if rows_per_page == 0 || rows_per_page > MAX_ROWS_PER_PAGE {
        return Err(LoadError::invalid(
            "table.rows_per_page",
            format!("must be between 1 and {MAX_ROWS_PER_PAGE}"),
        ));
    }

    let breakpoints = table.breakpoints.unwrap_or_default();
    if !breakpoints.is_ordered() {
        return Err(LoadError::invalid(
            "table.breakpoints",
            "expected cards_below <= p2_from <= p3_from",
        ));
    }

    Ok(TableSettings {
        rows_per_page,
        breakpoints,
        width: table.width,
    })
}

fn build_import_settings(import: RawImportSettings) -> Result<ImportSettings, LoadError> {
    let strategy = match import.strategy {
        Some(value) => value
            .parse::<ConflictStrategy>()
            .map_err(|reason| LoadError::invalid("import.strategy", reason))?,
        None => ConflictStrategy::default(),
    };
    Ok(ImportSettings { strategy })
}
