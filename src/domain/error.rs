use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid cache server configuration for site url `{site_url}`: {reason}")]
    InvalidConfig { site_url: String, reason: String },
    /// The runtime stopped the dispatch task before it reported back.
    #[error("flush {flush_id} was interrupted before dispatch finished")]
    FlushInterrupted { flush_id: uuid::Uuid },
}

impl DomainError {
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    pub fn invalid_config(site_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            site_url: site_url.into(),
            reason: reason.into(),
        }
    }
}
