//! Reduce arbitrary URLs to the cache key path the proxy bans on.
//!
//! The proxy stores objects under the literal request target, so scheme,
//! credentials, host and port are discarded and everything after the
//! authority is kept byte for byte. Inputs without a scheme are treated as
//! path-like, which means `example.com/baz` becomes `/example.com/baz` rather
//! than guessing a host.

use url::{ParseError, Url};

use super::ban::BanTarget;
use super::error::DomainError;

const PLACEHOLDER_ROOT: &str = "http://placeholder.invalid/";

/// Normalize `raw` into an exact-path ban target.
///
/// The result is the raw `path[?query][#fragment]` with a guaranteed leading
/// `/`. Nothing is percent-encoded or resolved: `/a/./b?q=it's` stays as
/// written, and an empty query or fragment is kept (`/a?` stays `/a?`).
/// The `url` crate only validates the input and locates the authority.
pub fn normalize(raw: &str) -> Result<BanTarget, DomainError> {
    let trimmed = raw.trim_matches(|c: char| c <= ' ');

    let request_target = match Url::parse(trimmed) {
        Ok(parsed) => after_scheme(trimmed, &parsed),
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PLACEHOLDER_ROOT)
                .and_then(|root| root.join(trimmed))
                .map_err(|err| DomainError::invalid_url(raw, err))?;
            if trimmed.starts_with("//") {
                strip_authority(&trimmed[2..], false)
            } else {
                trimmed
            }
        }
        Err(err) => return Err(DomainError::invalid_url(raw, err)),
    };

    Ok(BanTarget::exact_path(request_target))
}

/// Slice of `input` following its scheme and authority.
fn after_scheme<'a>(input: &'a str, parsed: &Url) -> &'a str {
    let scheme_len = parsed.scheme().len();
    let rest = input
        .get(..scheme_len)
        .filter(|scheme| scheme.eq_ignore_ascii_case(parsed.scheme()))
        .and_then(|_| input.get(scheme_len..))
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(input);

    if !parsed.has_authority() {
        return rest;
    }

    // These schemes accept any run of slashes or backslashes before the host.
    let special = matches!(parsed.scheme(), "http" | "https" | "ws" | "wss" | "ftp");
    let authority = if special {
        rest.trim_start_matches(['/', '\\'])
    } else {
        rest.strip_prefix("//").unwrap_or(rest)
    };
    strip_authority(authority, special)
}

/// Drop the leading `userinfo@host:port` from `input`.
fn strip_authority(input: &str, special: bool) -> &str {
    let end = input
        .find(|c: char| matches!(c, '/' | '?' | '#') || (special && c == '\\'))
        .unwrap_or(input.len());
    &input[end..]
}
