use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Path appended to the script origin when no explicit endpoint is given.
pub const DEFAULT_EVENT_PATH: &str = "/api/event";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("tracked domain is missing")]
    MissingDomain,
    #[error("script url {0} has no usable origin")]
    OpaqueOrigin(String),
    #[error("malformed configuration: {0}")]
    Parse(String),
}

/// Read once at initialization; opaque to the tracking logic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Collector URL events are posted to.
    pub endpoint: Url,
    /// Tracked site identifier sent as `d`.
    pub domain: String,
}

impl TrackerConfig {
    /// Builds the configuration from the embedding script's attributes.
    ///
    /// Without `data_api` the endpoint is the script origin plus
    /// [`DEFAULT_EVENT_PATH`]. A relative `data_api` resolves against the
    /// script URL.
    pub fn from_script_attributes(
        script_src: &str,
        data_api: Option<&str>,
        data_domain: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let domain = data_domain
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .ok_or(ConfigError::MissingDomain)?
            .to_string();
        let script = parse_url(script_src)?;

        let endpoint = match data_api.map(str::trim).filter(|api| !api.is_empty()) {
            Some(api) => match Url::parse(api) {
                Ok(url) => url,
                Err(url::ParseError::RelativeUrlWithoutBase) => {
                    script.join(api).map_err(|source| ConfigError::InvalidUrl {
                        url: api.to_string(),
                        source,
                    })?
                }
                Err(source) => {
                    return Err(ConfigError::InvalidUrl {
                        url: api.to_string(),
                        source,
                    })
                }
            },
            None => {
                let origin = script.origin();
                if !origin.is_tuple() {
                    return Err(ConfigError::OpaqueOrigin(script_src.to_string()));
                }
                parse_url(&format!(
                    "{}{}",
                    origin.ascii_serialization(),
                    DEFAULT_EVENT_PATH
                ))?
            }
        };

        Ok(Self { endpoint, domain })
    }

    /// Parses a RON document such as
    /// `(endpoint: "https://stats.example/api/event", domain: "example.com")`.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig =
            ron::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        if config.domain.trim().is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        Ok(config)
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
