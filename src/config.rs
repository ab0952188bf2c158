//! Configuration types for storyboard-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for an export operation
///
/// Works out of the box with `ExportConfig::default()`; every knob that affects
/// fetch behavior, concurrency, or archive output can be overridden.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of concurrent fetch workers (default: 6)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retry behavior for direct fetch attempts
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-kind fetch timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Streaming fetch proxy endpoint, tried exactly once after direct attempts
    /// are exhausted. The asset URL is appended as a `url` query parameter.
    /// None disables the fallback.
    #[serde(default)]
    pub proxy_endpoint: Option<String>,

    /// Deflate compression level for the output archive, 0-9 (default: 6)
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            proxy_endpoint: None,
            compression_level: default_compression_level(),
        }
    }
}

impl ExportConfig {
    /// Validate the configuration, returning a [`Error::Config`] naming the
    /// offending key on failure
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("concurrency".to_string()),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "retry.max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if let Some(endpoint) = &self.proxy_endpoint
            && url::Url::parse(endpoint).is_err()
        {
            return Err(Error::Config {
                message: format!("proxy_endpoint is not a valid URL: {endpoint}"),
                key: Some("proxy_endpoint".to_string()),
            });
        }
        if self.compression_level > 9 {
            return Err(Error::Config {
                message: format!(
                    "compression_level must be 0-9, got {}",
                    self.compression_level
                ),
                key: Some("compression_level".to_string()),
            });
        }
        Ok(())
    }
}

/// Retry configuration for direct fetch attempts
///
/// Backoff is linear: the pause after the Nth failed attempt is
/// `backoff_step * N`. The proxy fallback is outside this budget — it is
/// always tried exactly once, with no pause, after direct attempts run out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of direct attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step between direct attempts (default: 500 ms)
    #[serde(default = "default_backoff_step", with = "duration_ms_serde")]
    pub backoff_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step: default_backoff_step(),
        }
    }
}

/// Per-kind fetch timeouts
///
/// Still images are small and fail fast; audio/video payloads get a longer
/// budget. Each timeout bounds a single attempt, not the whole retry chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Timeout for a single image fetch attempt (default: 20 seconds)
    #[serde(default = "default_image_timeout", with = "duration_ms_serde")]
    pub image: Duration,

    /// Timeout for a single audio/video fetch attempt (default: 120 seconds)
    #[serde(default = "default_media_timeout", with = "duration_ms_serde")]
    pub media: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            image: default_image_timeout(),
            media: default_media_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    6
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step() -> Duration {
    Duration::from_millis(500)
}

fn default_image_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_media_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_compression_level() -> u8 {
    6
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ExportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.concurrency, 6);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_step, Duration::from_millis(500));
        assert!(config.proxy_endpoint.is_none());
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let config = ExportConfig {
            concurrency: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let config = ExportConfig {
            retry: RetryConfig {
                max_attempts: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_proxy_endpoint_fails_validation() {
        let config = ExportConfig {
            proxy_endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("proxy_endpoint"));

        let config = ExportConfig {
            proxy_endpoint: Some("https://proxy.example.com/stream".to_string()),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn compression_level_above_nine_fails_validation() {
        let config = ExportConfig {
            compression_level: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_round_trip_as_milliseconds() {
        let config = ExportConfig {
            retry: RetryConfig {
                max_attempts: 2,
                backoff_step: Duration::from_millis(250),
            },
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(
            json.contains("\"backoff_step\":250"),
            "backoff_step should serialize as milliseconds: {json}"
        );

        let parsed: ExportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.retry.backoff_step, Duration::from_millis(250));
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let parsed: ExportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.concurrency, 6);
        assert_eq!(parsed.timeouts.image, Duration::from_secs(20));
        assert_eq!(parsed.timeouts.media, Duration::from_secs(120));
    }
}
