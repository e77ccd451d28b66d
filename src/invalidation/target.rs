//! Resolve the base URL ban requests are sent to.

use url::{ParseError, Url};

use super::config::CacheServerConfig;
use crate::domain::error::DomainError;

/// Compute `scheme://host:port[path]` for the cache server fronting `site_url`.
///
/// The port is the configured override, else the site URL's explicit port,
/// else the scheme default. It is always written out so the request reaches
/// the proxy listener even when that default is implicit on the public URL.
/// Only a path the site URL actually spells out is carried over; query and
/// fragment are dropped.
pub fn resolve_target(site_url: &str, config: &CacheServerConfig) -> Result<String, DomainError> {
    let parsed = Url::parse(site_url).map_err(|err| match err {
        ParseError::RelativeUrlWithoutBase => {
            DomainError::invalid_config(site_url, "site url has no scheme")
        }
        other => DomainError::invalid_config(site_url, other.to_string()),
    })?;

    let host = parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| DomainError::invalid_config(site_url, "site url has no host"))?;

    let mut target = format!("{}://{host}", parsed.scheme());
    if let Some(port) = config.port_override.or(parsed.port_or_known_default()) {
        target.push(':');
        target.push_str(&port.to_string());
    }
    if carries_path(site_url) {
        target.push_str(parsed.path());
    }

    Ok(target)
}

/// True when the authority of `raw` is followed by an explicit `/`.
fn carries_path(raw: &str) -> bool {
    let Some((_, rest)) = raw.trim().split_once("://") else {
        return false;
    };
    rest.find(['/', '?', '#'])
        .is_some_and(|idx| rest[idx..].starts_with('/'))
}
