//! Error types for Car Expert.
//!
//! One closed enum for every failure the core can produce. The responder maps
//! each variant to a user-facing [`ErrorCategory`] with an exhaustive match,
//! so adding a variant forces a decision about how it is shown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarxError {
    #[error("Diagnostic error: {0}")]
    Diagnostic(String),

    #[error("Maintenance error: {0}")]
    Maintenance(String),

    #[error("Cost calculation error: {0}")]
    CostCalculation(String),

    #[error("User profile error: {0}")]
    UserProfile(String),

    #[error("Response generation error: {0}")]
    ResponseGeneration(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),
}

/// User-facing bucket for an error reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Maintenance,
    Diagnostic,
    Cost,
    General,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Maintenance => "maintenance",
            ErrorCategory::Diagnostic => "diagnostic",
            ErrorCategory::Cost => "cost",
            ErrorCategory::General => "general",
        }
    }
}

impl CarxError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CarxError::Diagnostic(_) => ErrorCategory::Diagnostic,
            CarxError::Maintenance(_) => ErrorCategory::Maintenance,
            CarxError::CostCalculation(_) => ErrorCategory::Cost,
            CarxError::UserProfile(_)
            | CarxError::ResponseGeneration(_)
            | CarxError::Config(_)
            | CarxError::Llm(_) => ErrorCategory::General,
        }
    }

    /// Stable kind name, carried as the error code of an error reply
    pub fn code(&self) -> &'static str {
        match self {
            CarxError::Diagnostic(_) => "DiagnosticError",
            CarxError::Maintenance(_) => "MaintenanceError",
            CarxError::CostCalculation(_) => "CostCalculationError",
            CarxError::UserProfile(_) => "UserProfileError",
            CarxError::ResponseGeneration(_) => "ResponseGenerationError",
            CarxError::Config(_) => "ConfigError",
            CarxError::Llm(_) => "LlmError",
        }
    }
}

pub type Result<T> = std::result::Result<T, CarxError>;
