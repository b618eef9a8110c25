use crate::{ProviderId, ValidationError};

/// Sustainable throughput for one provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Burst size; the bucket starts full.
    pub capacity: u32,
    /// Tokens added per second.
    pub refill_rate: u32,
    pub enabled: bool,
}

impl RateLimitConfig {
    pub fn new(capacity: u32, refill_rate: u32) -> Result<Self, ValidationError> {
        if capacity == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        if refill_rate == 0 {
            return Err(ValidationError::ZeroRefillRate);
        }
        Ok(Self {
            capacity,
            refill_rate,
            enabled: true,
        })
    }

    pub const fn disabled() -> Self {
        Self {
            capacity: 1,
            refill_rate: 1,
            enabled: false,
        }
    }

    pub const fn krx_default() -> Self {
        Self {
            capacity: 25,
            refill_rate: 25,
            enabled: true,
        }
    }

    pub const fn opendart_default() -> Self {
        Self {
            capacity: 50,
            refill_rate: 50,
            enabled: true,
        }
    }

    pub const fn naver_default() -> Self {
        Self {
            capacity: 50,
            refill_rate: 50,
            enabled: true,
        }
    }

    pub const fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Krx => Self::krx_default(),
            ProviderId::OpenDart => Self::opendart_default(),
            ProviderId::Naver => Self::naver_default(),
        }
    }
}

/// Rate-limit settings for every provider family, fixed at client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitingSettings {
    pub krx: RateLimitConfig,
    pub opendart: RateLimitConfig,
    pub naver: RateLimitConfig,
}

impl Default for RateLimitingSettings {
    fn default() -> Self {
        Self {
            krx: RateLimitConfig::krx_default(),
            opendart: RateLimitConfig::opendart_default(),
            naver: RateLimitConfig::naver_default(),
        }
    }
}

impl RateLimitingSettings {
    pub fn unlimited() -> Self {
        Self {
            krx: RateLimitConfig::disabled(),
            opendart: RateLimitConfig::disabled(),
            naver: RateLimitConfig::disabled(),
        }
    }

    pub const fn for_provider(&self, provider_id: ProviderId) -> RateLimitConfig {
        match provider_id {
            ProviderId::Krx => self.krx,
            ProviderId::OpenDart => self.opendart,
            ProviderId::Naver => self.naver,
        }
    }
}

/// Client configuration: rate limits plus the OPENDART API key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    pub opendart_api_key: Option<String>,
    pub rate_limits: RateLimitingSettings,
}

impl ClientConfig {
    pub const API_KEY_ENV: &'static str = "KFC_OPENDART_API_KEY";
    pub const DISABLE_RATE_LIMIT_ENV: &'static str = "KFC_RATE_LIMIT_DISABLED";

    /// Reads `KFC_OPENDART_API_KEY`, `KFC_RATE_LIMIT_DISABLED` and the per-family
    /// `KFC_{KRX,OPENDART,NAVER}_RATE_LIMIT` overrides (tokens/sec, capacity = rate).
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opendart_api_key = lookup(Self::API_KEY_ENV)
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());

        let disabled = lookup(Self::DISABLE_RATE_LIMIT_ENV)
            .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
        if disabled {
            return Ok(Self {
                opendart_api_key,
                rate_limits: RateLimitingSettings::unlimited(),
            });
        }

        let mut rate_limits = RateLimitingSettings::default();
        for provider_id in ProviderId::ALL {
            let name = rate_limit_env(provider_id);
            let Some(raw) = lookup(name) else {
                continue;
            };
            let rate = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidValue {
                    field: name,
                    value: raw.clone(),
                })?;
            let config = RateLimitConfig::new(rate, rate)?;
            match provider_id {
                ProviderId::Krx => rate_limits.krx = config,
                ProviderId::OpenDart => rate_limits.opendart = config,
                ProviderId::Naver => rate_limits.naver = config,
            }
        }

        Ok(Self {
            opendart_api_key,
            rate_limits,
        })
    }

    pub fn with_opendart_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.opendart_api_key = Some(api_key.into());
        self
    }

    pub fn with_rate_limits(mut self, rate_limits: RateLimitingSettings) -> Self {
        self.rate_limits = rate_limits;
        self
    }
}

const fn rate_limit_env(provider_id: ProviderId) -> &'static str {
    match provider_id {
        ProviderId::Krx => "KFC_KRX_RATE_LIMIT",
        ProviderId::OpenDart => "KFC_OPENDART_RATE_LIMIT",
        ProviderId::Naver => "KFC_NAVER_RATE_LIMIT",
    }
}
