use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::providers::{KrxAdapter, NaverAdapter, OpenDartAdapter};
use crate::rate_limit::RateLimiter;
use crate::{KfcError, ProviderId};

/// Entry point owning one rate limiter per provider family.
///
/// Adapters handed out by the client share those limiters, so clones of the
/// client and of its adapters all draw from the same buckets.
#[derive(Clone)]
pub struct KfcClient {
    krx: KrxAdapter,
    opendart: OpenDartAdapter,
    naver: NaverAdapter,
}

impl KfcClient {
    pub fn new(config: ClientConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let limiter = |provider_id: ProviderId| {
            RateLimiter::new(provider_id, config.rate_limits.for_provider(provider_id))
        };
        debug!(
            krx = ?config.rate_limits.krx,
            opendart = ?config.rate_limits.opendart,
            naver = ?config.rate_limits.naver,
            has_api_key = config.opendart_api_key.is_some(),
            "building client"
        );

        Self {
            krx: KrxAdapter::new(http_client.clone(), limiter(ProviderId::Krx)),
            opendart: OpenDartAdapter::new(
                http_client.clone(),
                limiter(ProviderId::OpenDart),
                config.opendart_api_key.clone(),
            ),
            naver: NaverAdapter::new(http_client, limiter(ProviderId::Naver)),
        }
    }

    /// Builds a reqwest-backed client from `KFC_*` environment variables.
    pub fn from_env() -> Result<Self, KfcError> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Builds a reqwest-backed client with the default transport timeouts.
    pub fn with_config(config: ClientConfig) -> Result<Self, KfcError> {
        let http_client = ReqwestHttpClient::new().map_err(|source| KfcError::NetworkFailure {
            provider: ProviderId::Krx,
            source,
        })?;
        Ok(Self::new(config, Arc::new(http_client)))
    }

    pub fn krx(&self) -> &KrxAdapter {
        &self.krx
    }

    pub fn opendart(&self) -> &OpenDartAdapter {
        &self.opendart
    }

    pub fn naver(&self) -> &NaverAdapter {
        &self.naver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimitConfig, RateLimitingSettings};
    use crate::http_client::ScriptedHttpClient;

    #[test]
    fn each_family_gets_its_configured_limiter() {
        let settings = RateLimitingSettings {
            krx: RateLimitConfig::new(3, 3).expect("valid"),
            ..RateLimitingSettings::default()
        };
        let client = KfcClient::new(
            ClientConfig::default().with_rate_limits(settings),
            Arc::new(ScriptedHttpClient::new()),
        );

        assert_eq!(client.krx().rate_limiter().config().capacity, 3);
        assert_eq!(client.krx().rate_limiter().provider_id(), ProviderId::Krx);
        assert_eq!(
            client.opendart().rate_limiter().config(),
            RateLimitConfig::opendart_default()
        );
        assert_eq!(client.naver().rate_limiter().provider_id(), ProviderId::Naver);
    }

    #[test]
    fn clones_share_the_same_bucket() {
        let settings = RateLimitingSettings {
            krx: RateLimitConfig::new(1, 1).expect("valid"),
            ..RateLimitingSettings::default()
        };
        let client = KfcClient::new(
            ClientConfig::default().with_rate_limits(settings),
            Arc::new(ScriptedHttpClient::new()),
        );
        let clone = client.clone();

        assert!(client.krx().rate_limiter().try_acquire());
        assert!(!clone.krx().rate_limiter().try_acquire());
    }
}
