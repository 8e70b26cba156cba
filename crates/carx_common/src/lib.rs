//! Carx Common - Shared domain logic for the Car Expert assistant v2.5.0
//!
//! Rule-based, bilingual (Arabic/English) car maintenance advice.
//! Everything here is deterministic; the language model is only an optional
//! fallback wired in by the adapters.

pub mod config;
pub mod cost;
pub mod diagnostics;
pub mod error;
pub mod knowledge;
pub mod language;
pub mod llm;
pub mod maintenance;
pub mod profile;
pub mod query_analyzer;
pub mod responder;
pub mod session;

pub use config::CarxConfig;
pub use cost::{CostCalculator, CostEstimate, QualityTier, RepairType, ShopTier};
pub use diagnostics::{DiagnosisResult, DiagnosticTable, SymptomPath};
pub use error::{CarxError, ErrorCategory};
pub use language::{Bilingual, Language};
pub use llm::OllamaClient;
pub use maintenance::{
    DrivingCondition, MaintenanceScheduler, ServiceProjection, ServiceType, UrgencyTier,
    VehicleCategory,
};
pub use profile::{UserProfile, VehicleDetails, VehicleRecord};
pub use query_analyzer::{IntentCategory, QueryAnalysis, QueryAnalyzer, TiePolicy};
pub use responder::{Response, ResponseGenerator, ResponseKind};
pub use session::{Exchange, Session, SessionStore, SessionUpdate};
