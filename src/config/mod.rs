//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{
    BanArgs, CacheServerOverrides, CliArgs, Command, DispatchOverrides, LoggingOverrides,
    NormalizeArgs, TargetArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vanish";
const DEFAULT_DISPATCH_CONCURRENCY: u64 = 8;
const DEFAULT_DISPATCH_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_DISPATCH_RETRY_BACKOFF_MS: u64 = 200;
const MAX_DISPATCH_RETRIES: u32 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache_server: CacheServerSettings,
    pub dispatch: DispatchSettings,
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
pub struct CacheServerSettings {
    /// Public site URL the ban target is derived from; required to flush.
    pub site_url: Option<String>,
    pub port_override: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub concurrency: NonZeroUsize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub dedup: bool,
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
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VANISH").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    match &cli.command {
        Command::Ban(args) => {
            raw.apply_cache_server_overrides(&args.cache_server);
            raw.apply_dispatch_overrides(&args.dispatch);
        }
        Command::Target(args) => raw.apply_cache_server_overrides(&args.cache_server),
        Command::Normalize(_) => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache_server: RawCacheServerSettings,
    dispatch: RawDispatchSettings,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_cache_server_overrides(&mut self, overrides: &CacheServerOverrides) {
        if let Some(url) = overrides.site_url.as_ref() {
            self.cache_server.site_url = Some(url.clone());
        }
        if let Some(port) = overrides.port_override {
            self.cache_server.port_override = Some(port);
        }
    }

    fn apply_dispatch_overrides(&mut self, overrides: &DispatchOverrides) {
        if let Some(value) = overrides.concurrency {
            self.dispatch.concurrency = Some(value);
        }
        if let Some(value) = overrides.request_timeout_ms {
            self.dispatch.request_timeout_ms = Some(value);
        }
        if let Some(value) = overrides.max_retries {
            self.dispatch.max_retries = Some(value);
        }
        if let Some(value) = overrides.retry_backoff_ms {
            self.dispatch.retry_backoff_ms = Some(value);
        }
        if let Some(value) = overrides.dedup {
            self.dispatch.dedup = Some(value);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache_server,
            dispatch,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let cache_server = build_cache_server_settings(cache_server)?;
        let dispatch = build_dispatch_settings(dispatch)?;

        Ok(Self {
            logging,
            cache_server,
            dispatch,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_server_settings(
    cache_server: RawCacheServerSettings,
) -> Result<CacheServerSettings, LoadError> {
    let site_url = cache_server.site_url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    if cache_server.port_override == Some(0) {
        return Err(LoadError::invalid(
            "cache_server.port_override",
            "port must be greater than zero",
        ));
    }

    Ok(CacheServerSettings {
        site_url,
        port_override: cache_server.port_override,
    })
}

fn build_dispatch_settings(dispatch: RawDispatchSettings) -> Result<DispatchSettings, LoadError> {
    let concurrency = non_zero_usize(
        dispatch.concurrency.unwrap_or(DEFAULT_DISPATCH_CONCURRENCY),
        "dispatch.concurrency",
    )?;

    let timeout_ms = dispatch
        .request_timeout_ms
        .unwrap_or(DEFAULT_DISPATCH_REQUEST_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "dispatch.request_timeout_ms",
            "must be greater than zero",
        ));
    }

    let max_retries = dispatch.max_retries.unwrap_or(0);
    if max_retries > MAX_DISPATCH_RETRIES {
        return Err(LoadError::invalid(
            "dispatch.max_retries",
            format!("must not exceed {MAX_DISPATCH_RETRIES}"),
        ));
    }

    let retry_backoff = Duration::from_millis(
        dispatch
            .retry_backoff_ms
            .unwrap_or(DEFAULT_DISPATCH_RETRY_BACKOFF_MS),
    );

    Ok(DispatchSettings {
        concurrency,
        request_timeout: Duration::from_millis(timeout_ms),
        max_retries,
        retry_backoff,
        dedup: dispatch.dedup.unwrap_or(true),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheServerSettings {
    site_url: Option<String>,
    port_override: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDispatchSettings {
    concurrency: Option<u64>,
    request_timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    dedup: Option<bool>,
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
