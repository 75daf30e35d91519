// src/config.rs
//! Runtime configuration: a TOML file with `INTAKE_*` env overrides.
//!
//! Load order per field:
//! 1) $INTAKE_CONFIG_PATH (must exist when set)
//! 2) config/intake.toml
//! 3) built-in defaults
//! then env overrides on top, so a container can tweak one knob without
//! shipping a file.

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const ENV_CONFIG_PATH: &str = "INTAKE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/intake.toml";

fn default_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "intake=info,moderation=info,warn".to_string()
}
fn default_env() -> String {
    "development".to_string()
}
fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}
fn default_timeout_secs() -> u64 {
    8
}
fn default_fallback_city() -> String {
    "Bengaluru".to_string()
}
fn default_fallback_state() -> String {
    "Karnataka".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub port: u16,
    /// EnvFilter directive string for tracing.
    pub log_level: String,
    /// "production" switches logs to JSON.
    pub env: String,
    pub geocoder: GeocoderConfig,
    pub vision: VisionConfig,
    pub smtp: SmtpConfig,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            env: default_env(),
            geocoder: GeocoderConfig::default(),
            vision: VisionConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// Reverse-geocoder endpoint plus the fixed degraded-answer fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub fallback_city: String,
    pub fallback_state: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            timeout_secs: default_timeout_secs(),
            fallback_city: default_fallback_city(),
            fallback_state: default_fallback_state(),
        }
    }
}

/// Remote vision moderation endpoint. Disabled (or endpoint-less) means the
/// pipeline runs on local heuristics only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Literal key, or "ENV" to read VISION_API_KEY at startup.
    pub api_key: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            api_key: String::new(),
        }
    }
}

impl VisionConfig {
    /// Resolve the "ENV" indirection. A missing env var yields an empty key;
    /// the endpoint decides whether anonymous calls are acceptable.
    pub fn resolved_api_key(&self) -> String {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            return env::var("VISION_API_KEY").unwrap_or_default();
        }
        self.api_key.clone()
    }
}

/// SMTP relay for officer assignment emails. An empty host disables email
/// entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    /// Literal password, or "ENV" to read SMTP_PASS at startup.
    pub pass: String,
    pub from: String,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.from.trim().is_empty()
    }

    pub fn resolved_pass(&self) -> String {
        if self.pass.trim().eq_ignore_ascii_case("env") {
            return env::var("SMTP_PASS").unwrap_or_default();
        }
        self.pass.clone()
    }
}

impl IntakeConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing intake config toml")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading intake config from {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// File chain plus env overrides. This is what `main` calls once.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("INTAKE_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("INTAKE_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = env::var("INTAKE_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = env::var("INTAKE_ENV") {
            self.env = v;
        }
        if let Ok(v) = env::var("INTAKE_GEOCODER_URL") {
            self.geocoder.base_url = v;
        }
        if let Ok(v) = env::var("INTAKE_VISION_ENDPOINT") {
            self.vision.endpoint = v;
            self.vision.enabled = !self.vision.endpoint.trim().is_empty();
        }
        if let Ok(v) = env::var("INTAKE_SMTP_HOST") {
            self.smtp.host = v;
        }
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}
