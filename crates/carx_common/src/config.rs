//! Car Expert Configuration v2.5.0
//!
//! Configuration lives in /etc/carx/config.toml (override with $CARX_CONFIG).
//! Every field has a default, so a missing file or a partial file is fine.
//!
//! v2.4.0: Pricing and emergency contacts moved out of code into config
//! v2.5.0: Analyzer tie policy

use crate::error::{CarxError, Result};
use crate::language::Bilingual;
use crate::query_analyzer::TiePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/carx";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "CARX_CONFIG";

// ============================================================================
// Sections
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP chat adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7870".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Local language model (Ollama) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Disabled by default; the rule engine answers on its own
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound for one model answer, in seconds
    #[serde(default = "default_response_timeout")]
    pub response_timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_model() -> String {
    "arabic-orpo-llama-3-8b-instruct:q5_k_s".to_string()
}

fn default_max_tokens() -> i32 {
    300
}

fn default_temperature() -> f32 {
    0.18
}

fn default_response_timeout() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            response_timeout_secs: default_response_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity timeout before a session is evicted
    #[serde(default = "default_session_timeout")]
    pub timeout_minutes: i64,

    /// Exchanges kept in the context log
    #[serde(default = "default_max_context")]
    pub max_context: usize,
}

fn default_session_timeout() -> i64 {
    30
}

fn default_max_context() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_session_timeout(),
            max_context: default_max_context(),
        }
    }
}

/// Labor rates and multipliers for the cost calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// EGP per hour
    #[serde(default = "default_rate_standard")]
    pub labor_rate_standard: f64,
    #[serde(default = "default_rate_specialist")]
    pub labor_rate_specialist: f64,
    #[serde(default = "default_rate_dealership")]
    pub labor_rate_dealership: f64,

    #[serde(default = "default_quality_economy")]
    pub quality_economy: f64,
    #[serde(default = "default_quality_standard")]
    pub quality_standard: f64,
    #[serde(default = "default_quality_premium")]
    pub quality_premium: f64,

    /// Applied to parts and labor separately
    #[serde(default = "default_emergency_factor")]
    pub emergency_factor: f64,

    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_rate_standard() -> f64 {
    150.0
}

fn default_rate_specialist() -> f64 {
    250.0
}

fn default_rate_dealership() -> f64 {
    350.0
}

fn default_quality_economy() -> f64 {
    0.7
}

fn default_quality_standard() -> f64 {
    1.0
}

fn default_quality_premium() -> f64 {
    1.4
}

fn default_emergency_factor() -> f64 {
    1.5
}

fn default_currency() -> String {
    "EGP".to_string()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            labor_rate_standard: default_rate_standard(),
            labor_rate_specialist: default_rate_specialist(),
            labor_rate_dealership: default_rate_dealership(),
            quality_economy: default_quality_economy(),
            quality_standard: default_quality_standard(),
            quality_premium: default_quality_premium(),
            emergency_factor: default_emergency_factor(),
            currency: default_currency(),
        }
    }
}

/// A phone contact shown in emergency replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// "emergency", "roadside", ...
    pub service: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyConfig {
    #[serde(default = "default_contacts")]
    pub contacts: Vec<EmergencyContact>,

    /// Static nearby-shop list; there is no maps lookup
    #[serde(default = "default_mechanics")]
    pub mechanics: Vec<Mechanic>,
}

/// A repair shop suggested in emergency replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanic {
    pub name: Bilingual<String>,
    pub distance_km: f64,
    pub rating: f64,
    pub phone: String,
    #[serde(default = "default_true")]
    pub open_now: bool,
}

fn default_true() -> bool {
    true
}

fn default_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            service: "emergency".to_string(),
            number: "122".to_string(), // Egypt emergency number
        },
        EmergencyContact {
            service: "roadside".to_string(),
            number: "01234567890".to_string(),
        },
    ]
}

fn default_mechanics() -> Vec<Mechanic> {
    vec![
        Mechanic {
            name: Bilingual::new("Cairo Auto Care".to_string(), "كايرو أوتو كير".to_string()),
            distance_km: 1.2,
            rating: 4.5,
            phone: "01234567890".to_string(),
            open_now: true,
        },
        Mechanic {
            name: Bilingual::new(
                "Expert Mechanics".to_string(),
                "إكسبرت ميكانيكس".to_string(),
            ),
            distance_km: 2.5,
            rating: 4.3,
            phone: "01234567891".to_string(),
            open_now: true,
        },
    ]
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            contacts: default_contacts(),
            mechanics: default_mechanics(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub tie_policy: TiePolicy,
}

// ============================================================================
// Root Config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarxConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub emergency: EmergencyConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl CarxConfig {
    /// Default config path: $CARX_CONFIG, else /etc/carx/config.toml
    pub fn default_path() -> PathBuf {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE),
        }
    }

    /// Load from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path`. A missing file yields the defaults; a malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CarxError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config = Self::parse(&contents)
            .map_err(|e| CarxError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
