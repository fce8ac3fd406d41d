// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ImageKitError, Result};
use crate::responsive::{ResponsiveRequest, DEFAULT_DEVICE_BREAKPOINTS, DEFAULT_IMAGE_BREAKPOINTS};
use crate::transformation::{Position, TransformationPolicy};
use crate::url::{SrcOptions, UrlBuilder};

pub const ENV_URL_ENDPOINT: &str = "IMAGEKIT_URL_ENDPOINT";
pub const ENV_PUBLIC_KEY: &str = "IMAGEKIT_PUBLIC_KEY";
pub const ENV_PRIVATE_KEY: &str = "IMAGEKIT_PRIVATE_KEY";
pub const ENV_TRANSFORMATION_POSITION: &str = "IMAGEKIT_TRANSFORMATION_POSITION";
pub const ENV_RESPONSIVE: &str = "IMAGEKIT_RESPONSIVE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account endpoint, e.g. `https://ik.imagekit.io/your_id`
    pub url_endpoint: String,
    /// Account public key. URL building never reads it; it is carried for
    /// upload and client-auth callers that share this config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Signing key; never serialized back out
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub transformation_position: Position,
    /// Whether `ikurl image` prints responsive attributes instead of one URL
    #[serde(default)]
    pub responsive: bool,
    #[serde(default = "default_device_breakpoints")]
    pub device_breakpoints: Vec<u32>,
    #[serde(default = "default_image_breakpoints")]
    pub image_breakpoints: Vec<u32>,
    /// Reject transformation keys outside the known grammar
    #[serde(default)]
    pub strict_transformations: bool,
    #[serde(skip)]
    pub generation: u64, // Config version, increments on reload
}

fn default_device_breakpoints() -> Vec<u32> {
    DEFAULT_DEVICE_BREAKPOINTS.to_vec()
}

fn default_image_breakpoints() -> Vec<u32> {
    DEFAULT_IMAGE_BREAKPOINTS.to_vec()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn new(url_endpoint: impl Into<String>) -> Self {
        Self {
            url_endpoint: url_endpoint.into(),
            public_key: None,
            private_key: None,
            transformation_position: Position::default(),
            responsive: false,
            device_breakpoints: default_device_breakpoints(),
            image_breakpoints: default_image_breakpoints(),
            strict_transformations: false,
            generation: 0,
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ImageKitError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                ImageKitError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let mut config: Config = serde_yaml::from_str(&substituted)
            .map_err(|e| ImageKitError::Config(e.to_string()))?;
        config.generation = 0;

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ImageKitError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Build from `IMAGEKIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let url_endpoint = std::env::var(ENV_URL_ENDPOINT).map_err(|_| {
            ImageKitError::Config(format!(
                "Environment variable '{}' is not set",
                ENV_URL_ENDPOINT
            ))
        })?;

        let mut config = Config::new(url_endpoint);
        config.public_key = std::env::var(ENV_PUBLIC_KEY).ok();
        config.private_key = std::env::var(ENV_PRIVATE_KEY).ok();

        if let Ok(position) = std::env::var(ENV_TRANSFORMATION_POSITION) {
            config.transformation_position = position
                .parse()
                .map_err(|e: ImageKitError| ImageKitError::Config(e.to_string()))?;
        }
        if let Ok(responsive) = std::env::var(ENV_RESPONSIVE) {
            config.responsive = parse_bool(&responsive);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.url_endpoint.trim();
        if endpoint.is_empty() {
            return Err(ImageKitError::Config(
                "url_endpoint cannot be empty".to_string(),
            ));
        }

        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(ImageKitError::Config(format!(
                "url_endpoint '{}' must start with http:// or https://",
                endpoint
            )));
        }

        if self.device_breakpoints.contains(&0) || self.image_breakpoints.contains(&0) {
            return Err(ImageKitError::Config(
                "breakpoints must be greater than 0".to_string(),
            ));
        }

        if self.device_breakpoints.is_empty() && self.image_breakpoints.is_empty() {
            return Err(ImageKitError::Config(
                "at least one of device_breakpoints or image_breakpoints must be set"
                    .to_string(),
            ));
        }

        if let Some(key) = &self.private_key {
            if key.trim().is_empty() {
                return Err(ImageKitError::Config(
                    "private_key cannot be blank".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn transformation_policy(&self) -> TransformationPolicy {
        if self.strict_transformations {
            TransformationPolicy::Strict
        } else {
            TransformationPolicy::Permissive
        }
    }

    /// URL builder seeded with this config's signing key and policy
    pub fn url_builder(&self) -> UrlBuilder {
        let builder = match &self.private_key {
            Some(key) => UrlBuilder::with_private_key(key.as_bytes()),
            None => UrlBuilder::new(),
        };
        builder.policy(self.transformation_policy())
    }

    /// Options for `path` using the configured endpoint and position
    pub fn src_options(&self, path: impl Into<String>) -> SrcOptions {
        SrcOptions::new(path, self.url_endpoint.clone()).position(self.transformation_position)
    }

    /// Responsive request seeded with the configured breakpoints
    pub fn responsive_request(&self, src: SrcOptions) -> ResponsiveRequest {
        ResponsiveRequest::new(src)
            .device_breakpoints(self.device_breakpoints.clone())
            .image_breakpoints(self.image_breakpoints.clone())
    }
}
