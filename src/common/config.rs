use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::common::error::{GateError, Result};
use crate::common::paths;

/// Environment variables that override the endpoint section after the file is read.
pub const ENV_API_BASE_URL: &str = "FACEGATE_API_BASE_URL";
pub const ENV_UPLOAD_PATH: &str = "FACEGATE_UPLOAD_PATH";
pub const ENV_AUTH_PATH: &str = "FACEGATE_AUTH_PATH";
pub const ENV_REGISTER_PATH: &str = "FACEGATE_REGISTER_PATH";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndpointConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
    /// Bucket path watched by the registration hook. Registration is disabled when unset.
    #[serde(default)]
    pub register_path: Option<String>,
    #[serde(default = "default_acl")]
    pub acl: String,
}

fn default_upload_path() -> String { "visitor-pics".to_string() }
fn default_auth_path() -> String { "employee".to_string() }
fn default_acl() -> String { "public-read".to_string() }

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            upload_path: default_upload_path(),
            auth_path: default_auth_path(),
            register_path: None,
            acl: default_acl(),
        }
    }
}

impl EndpointConfig {
    /// Joins the base URL with path segments, collapsing duplicate slashes at the seams.
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub device_index: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_ms: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 480 }
fn default_warmup_frames() -> u32 { 5 }
fn default_warmup_delay() -> u64 { 50 }
fn default_jpeg_quality() -> u8 { 90 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_width(),
            height: default_height(),
            warmup_frames: default_warmup_frames(),
            warmup_delay_ms: default_warmup_delay(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// How a non-success status from the matching service is treated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatusPolicy {
    /// Parse the JSON error body and interpret it like any other result.
    #[default]
    AsResult,
    /// Fail the submission as a transport error.
    AsError,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub error_status: ErrorStatusPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct HttpConfig {
    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_placeholder")]
    pub placeholder: PathBuf,
    #[serde(default)]
    pub preview_width: Option<usize>,
    #[serde(default)]
    pub preview_height: Option<usize>,
}

fn default_placeholder() -> PathBuf { PathBuf::from("assets/placeholder.png") }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            preview_width: None,
            preview_height: None,
        }
    }
}

impl Config {
    /// Loads the config from `explicit` if given, otherwise from the first
    /// candidate location that exists, falling back to built-in defaults.
    /// Environment overrides are applied last, then the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read_file(path)?,
            None => match paths::config_candidates().into_iter().find(|p| p.exists()) {
                Some(path) => Self::read_file(&path)?,
                None => {
                    tracing::info!("No config file found, using built-in defaults");
                    Config::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GateError::Config(format!(
                "Config file not found: {}", path.display()
            )));
        }

        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| GateError::Config(format!("Config parse error: {}", e)))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            self.endpoints.base_url = base_url;
        }
        if let Some(upload_path) = lookup(ENV_UPLOAD_PATH) {
            self.endpoints.upload_path = upload_path;
        }
        if let Some(auth_path) = lookup(ENV_AUTH_PATH) {
            self.endpoints.auth_path = auth_path;
        }
        if let Some(register_path) = lookup(ENV_REGISTER_PATH) {
            self.endpoints.register_path = Some(register_path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.base_url.trim().is_empty() {
            return Err(GateError::Config(format!(
                "endpoints.base_url is not set (config file or {})", ENV_API_BASE_URL
            )));
        }
        let base = reqwest::Url::parse(&self.endpoints.base_url)
            .map_err(|e| GateError::Config(format!(
                "Invalid base URL {}: {}", self.endpoints.base_url, e
            )))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(GateError::Config(format!(
                "Base URL must be http or https, got {}", base.scheme()
            )));
        }

        if self.camera.width == 0 || self.camera.width > 4096 {
            return Err(GateError::Config(format!(
                "Camera width must be between 1 and 4096, got {}", self.camera.width
            )));
        }
        if self.camera.height == 0 || self.camera.height > 4096 {
            return Err(GateError::Config(format!(
                "Camera height must be between 1 and 4096, got {}", self.camera.height
            )));
        }
        if self.camera.jpeg_quality == 0 || self.camera.jpeg_quality > 100 {
            return Err(GateError::Config(format!(
                "JPEG quality must be between 1 and 100, got {}", self.camera.jpeg_quality
            )));
        }

        if let Some(timeout) = self.http.timeout_seconds {
            if timeout == 0 || timeout > 600 {
                return Err(GateError::Config(format!(
                    "HTTP timeout must be between 1 and 600 seconds, got {}", timeout
                )));
            }
        }

        Ok(())
    }
}
