use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Provider families. Each family shares one rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Krx,
    OpenDart,
    Naver,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Krx, Self::OpenDart, Self::Naver];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Krx => "krx",
            Self::OpenDart => "opendart",
            Self::Naver => "naver",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "krx" => Ok(Self::Krx),
            "opendart" | "dart" => Ok(Self::OpenDart),
            "naver" => Ok(Self::Naver),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("KRX".parse::<ProviderId>(), Ok(ProviderId::Krx));
        assert_eq!(" dart ".parse::<ProviderId>(), Ok(ProviderId::OpenDart));
        assert!("yahoo".parse::<ProviderId>().is_err());
    }
}
