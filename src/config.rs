//! Configuration types for avif-batch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use utoipa::ToSchema;

/// Input validation limits
///
/// Groups settings that decide which candidate files are accepted into a
/// batch. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Maximum accepted source file size in bytes (default: 10 MiB)
    ///
    /// Enforced on the client side before an entry is created and re-checked
    /// by the conversion service.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

/// AVIF encoder settings
///
/// Passed through to the underlying codec. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EncodingConfig {
    /// AVIF quality in 1-100 (default: 60)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Encoder speed in 1-10, higher is faster but compresses worse (default: 4)
    #[serde(default = "default_speed")]
    pub speed: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            speed: default_speed(),
        }
    }
}

/// Download delivery behavior
///
/// Groups settings for handing converted files back to the user. Used as a
/// nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryConfig {
    /// Delay between staggered single-file downloads, in milliseconds (default: 500)
    ///
    /// Browser hosts suppress rapid consecutive downloads, so the
    /// non-archive download-all path spaces deliveries out by this much.
    #[serde(default = "default_download_stagger_ms")]
    pub download_stagger_ms: u64,

    /// Filename for the combined archive download (default: "converted_images.zip")
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            download_stagger_ms: default_download_stagger_ms(),
            archive_name: default_archive_name(),
        }
    }
}

/// REST API server settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address the API server binds to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Whether to add CORS headers to API responses (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any origin (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for avif-batch
///
/// Fields are organized into logical sub-configs:
/// - [`limits`](LimitsConfig) - input validation
/// - [`encoding`](EncodingConfig) - AVIF encoder settings
/// - [`delivery`](DeliveryConfig) - download behavior
/// - [`api`](ApiConfig) - REST API server
///
/// The validation, encoding, and delivery sub-configs are flattened for
/// serialization, so the JSON/TOML format stays flat. Individual fields are
/// also accessible via convenience accessor methods.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Input validation limits
    #[serde(flatten)]
    pub limits: LimitsConfig,

    /// AVIF encoder settings
    #[serde(flatten)]
    pub encoding: EncodingConfig,

    /// Download delivery behavior
    #[serde(flatten)]
    pub delivery: DeliveryConfig,

    /// REST API server settings
    #[serde(default)]
    pub api: ApiConfig,
}

// Convenience accessors - delegate to the sub-config structs so call sites
// don't need to know the grouping.
impl Config {
    /// Maximum accepted source file size in bytes
    pub fn max_file_size(&self) -> u64 {
        self.limits.max_file_size
    }

    /// Delay between staggered single-file downloads
    pub fn download_stagger(&self) -> Duration {
        Duration::from_millis(self.delivery.download_stagger_ms)
    }

    /// Filename for the combined archive download
    pub fn archive_name(&self) -> &str {
        &self.delivery.archive_name
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key when a setting is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_file_size == 0 {
            return Err(Error::Config {
                message: "max_file_size must be greater than zero".to_string(),
                key: Some("limits.max_file_size".to_string()),
            });
        }
        if self.encoding.quality == 0 || self.encoding.quality > 100 {
            return Err(Error::Config {
                message: format!(
                    "quality must be in 1-100, got {}",
                    self.encoding.quality
                ),
                key: Some("encoding.quality".to_string()),
            });
        }
        if self.encoding.speed == 0 || self.encoding.speed > 10 {
            return Err(Error::Config {
                message: format!("speed must be in 1-10, got {}", self.encoding.speed),
                key: Some("encoding.speed".to_string()),
            });
        }
        if self.delivery.archive_name.is_empty() {
            return Err(Error::Config {
                message: "archive_name must not be empty".to_string(),
                key: Some("delivery.archive_name".to_string()),
            });
        }
        Ok(())
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_quality() -> u8 {
    60
}

fn default_speed() -> u8 {
    4
}

fn default_download_stagger_ms() -> u64 {
    500
}

fn default_archive_name() -> String {
    "converted_images.zip".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
