//! reqwest-backed ban transport.

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Url};

use super::error::InfraError;
use crate::domain::ban::{BAN_METHOD_HEADER, BanTarget};
use crate::invalidation::{BAN_METHOD, BanTransport, TransportError};

/// Sends `BAN` requests with `X-Ban-Method` and `X-Ban-Url`/`X-Ban-Regex` headers.
#[derive(Clone, Debug)]
pub struct HttpBanTransport {
    client: Client,
    method: Method,
}

impl HttpBanTransport {
    pub fn new() -> Result<Self, InfraError> {
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Self::with_client(client)
    }

    /// Use a preconfigured client (proxy settings, custom roots, ...).
    pub fn with_client(client: Client) -> Result<Self, InfraError> {
        let method = Method::from_bytes(BAN_METHOD.as_bytes())
            .map_err(|err| InfraError::configuration(format!("invalid ban method: {err}")))?;
        Ok(Self { client, method })
    }

    pub fn user_agent() -> &'static str {
        concat!("vanish/", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl BanTransport for HttpBanTransport {
    async fn send(&self, target: &str, ban: &BanTarget) -> Result<u16, TransportError> {
        let url = Url::parse(target)
            .map_err(|err| TransportError::InvalidRequest(format!("target `{target}`: {err}")))?;
        let key = HeaderValue::from_bytes(ban.key().as_bytes()).map_err(|err| {
            TransportError::InvalidRequest(format!("{} is not a valid header value: {err}", ban))
        })?;

        let response = self
            .client
            .request(self.method.clone(), url)
            .header(BAN_METHOD_HEADER, ban.ban_method())
            .header(ban.ban_header(), key)
            .send()
            .await
            .map_err(TransportError::from_request)?;

        Ok(response.status().as_u16())
    }
}
