//! Operator commands backing the `vanish` binary.

use tracing::info;

use super::error::AppError;
use crate::config::Settings;
use crate::domain::path::normalize;
use crate::invalidation::{
    CacheServerConfig, DispatchConfig, FlushResult, InvalidationEngine, resolve_target,
};

const MISSING_SITE_URL: &str =
    "cache_server.site_url is not configured (use --site-url or VANISH__CACHE_SERVER__SITE_URL)";

fn site_url(settings: &Settings) -> Result<String, AppError> {
    settings
        .cache_server
        .site_url
        .clone()
        .ok_or_else(|| AppError::validation(MISSING_SITE_URL))
}

/// Build an HTTP-backed engine from resolved settings.
pub fn build_engine(settings: &Settings) -> Result<InvalidationEngine, AppError> {
    let site_url = site_url(settings)?;
    let engine = InvalidationEngine::with_http_transport(
        move || site_url.clone(),
        CacheServerConfig::from(&settings.cache_server),
        DispatchConfig::from(&settings.dispatch),
    )?;
    Ok(engine)
}

/// Queue `urls` and `regexes` on `engine` and flush once.
pub async fn ban(
    engine: &InvalidationEngine,
    urls: &[String],
    regexes: &[String],
) -> Result<FlushResult, AppError> {
    if urls.is_empty() && regexes.is_empty() {
        return Err(AppError::validation(
            "nothing to ban: pass at least one --url or --regex",
        ));
    }

    engine.invalidate_urls(urls)?;
    for pattern in regexes {
        engine.invalidate_regex(pattern.as_str());
    }

    let result = engine.flush().await?;
    info!(
        target = "vanish::ban",
        flush_id = %result.flush_id,
        attempted = result.attempted,
        failed = result.failed,
        "Ban command finished"
    );
    Ok(result)
}

/// Resolve the cache-server base URL from settings.
pub fn target(settings: &Settings) -> Result<String, AppError> {
    let site_url = site_url(settings)?;
    let config = CacheServerConfig::from(&settings.cache_server);
    Ok(resolve_target(&site_url, &config)?)
}

/// Normalize each URL, failing on the first invalid one.
pub fn normalize_all(urls: &[String]) -> Result<Vec<String>, AppError> {
    urls.iter()
        .map(|url| {
            normalize(url)
                .map(|target| target.key().to_string())
                .map_err(AppError::from)
        })
        .collect()
}

/// Render a flush result for stdout.
pub fn render_flush(result: &FlushResult, json: bool) -> Result<String, AppError> {
    if json {
        return serde_json::to_string_pretty(result)
            .map_err(|err| AppError::unexpected(format!("failed to encode flush result: {err}")));
    }

    let mut out = format!("{result} target={}", result.target);
    for failure in &result.failures {
        out.push_str(&format!(
            "\n  failed {} after {} attempt(s): {}",
            failure.target, failure.attempts, failure.reason
        ));
    }
    Ok(out)
}
