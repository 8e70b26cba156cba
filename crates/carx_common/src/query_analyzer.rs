//! Query Analyzer v2.5.0
//!
//! Fast, LLM-free classification of a user message:
//! - Language: Arabic if any Arabic-range character is present, else English
//! - Intent: maintenance, diagnostic, cost, emergency, or information (fallback)
//! - Emergency flag: independent keyword scan, may be set on any intent
//!
//! v2.5.0: Added `TiePolicy`. `EarliestMention` is the default so that a
//! question like "كم تكلفة تغيير الفرامل" is read as a cost question even
//! though "تغيير" (change) is also a maintenance trigger.
//!
//! The two rules conflict. The documented intent contract is first match by
//! declaration order (`DeclarationOrder`), but under that rule the brake
//! question above is maintenance, not cost as documented. The default keeps
//! the documented example; `[analyzer] tie_policy = "declaration_order"`
//! restores the literal contract.

use crate::language::{Bilingual, Language};
use serde::{Deserialize, Serialize};

// ============================================================================
// Intent Categories
// ============================================================================

/// Intent categories, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    Maintenance,
    Diagnostic,
    Cost,
    Emergency,
    /// Fallback when no trigger matches
    Information,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Diagnostic => "diagnostic",
            Self::Cost => "cost",
            Self::Emergency => "emergency",
            Self::Information => "information",
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Maintenance => "[M]",
            Self::Diagnostic => "[D]",
            Self::Cost => "[$]",
            Self::Emergency => "[!]",
            Self::Information => "[i]",
        }
    }
}

/// How to pick a category when triggers from several categories match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// First category in declaration order with any matching trigger wins
    DeclarationOrder,
    /// Category whose trigger appears first in the text wins;
    /// same position falls back to declaration order
    #[default]
    EarliestMention,
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Result of one classification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// The raw user text
    pub text: String,
    pub language: Language,
    pub intent: IntentCategory,
    pub is_emergency: bool,
    /// Triggers that selected the intent (empty for information)
    pub matched_triggers: Vec<String>,
}

// ============================================================================
// Trigger Tables
// ============================================================================

type Triggers = Bilingual<&'static [&'static str]>;

const MAINTENANCE_TRIGGERS: Triggers = Bilingual::new(
    &[
        "change",
        "service",
        "maintain",
        "check",
        "when should",
        "how often",
    ],
    &["تغيير", "صيانة", "فحص", "متى", "كل قد", "كام"],
);

const DIAGNOSTIC_TRIGGERS: Triggers = Bilingual::new(
    &[
        "problem",
        "issue",
        "broken",
        "not working",
        "failed",
        "wrong",
    ],
    &["مشكلة", "عطل", "مكسور", "مش شغال", "عطلان", "خربان"],
);

const COST_TRIGGERS: Triggers = Bilingual::new(
    &["cost", "price", "expensive", "cheap", "how much", "pay"],
    &["سعر", "تكلفة", "غالي", "رخيص", "بكام", "كلفة"],
);

const EMERGENCY_TRIGGERS: Triggers = Bilingual::new(
    &["emergency", "urgent", "help", "stuck", "smoke", "fire"],
    &["طوارئ", "عاجل", "نجدة", "متعطل", "دخان", "حريق"],
);

const EMERGENCY_KEYWORDS: Triggers = Bilingual::new(
    &[
        "emergency",
        "urgent",
        "help",
        "stuck",
        "smoke",
        "fire",
        "accident",
    ],
    &["طوارئ", "عاجل", "النجدة", "متعطل", "دخان", "حريق", "حادث"],
);

fn triggers_for(lang: Language, triggers: &Triggers) -> &'static [&'static str] {
    match lang {
        Language::Ar => triggers.ar,
        Language::En => triggers.en,
    }
}

// ============================================================================
// Query Analyzer
// ============================================================================

pub struct QueryAnalyzer {
    tie_policy: TiePolicy,
    categories: [(IntentCategory, Triggers); 4],
}

impl QueryAnalyzer {
    pub fn new() -> Self {
        Self::with_policy(TiePolicy::default())
    }

    pub fn with_policy(tie_policy: TiePolicy) -> Self {
        Self {
            tie_policy,
            categories: [
                (IntentCategory::Maintenance, MAINTENANCE_TRIGGERS),
                (IntentCategory::Diagnostic, DIAGNOSTIC_TRIGGERS),
                (IntentCategory::Cost, COST_TRIGGERS),
                (IntentCategory::Emergency, EMERGENCY_TRIGGERS),
            ],
        }
    }

    pub fn tie_policy(&self) -> TiePolicy {
        self.tie_policy
    }

    /// Classify a message. Never fails.
    pub fn analyze(&self, text: &str) -> QueryAnalysis {
        let language = Language::detect(text);
        let lowered = text.to_lowercase();

        let (intent, matched_triggers) = self.classify_intent(&lowered, language);
        let is_emergency = triggers_for(language, &EMERGENCY_KEYWORDS)
            .iter()
            .any(|kw| lowered.contains(kw));

        tracing::debug!(
            "Analyzed query: lang={} intent={} emergency={}",
            language,
            intent.as_str(),
            is_emergency
        );

        QueryAnalysis {
            text: text.to_string(),
            language,
            intent,
            is_emergency,
            matched_triggers,
        }
    }

    fn classify_intent(&self, lowered: &str, language: Language) -> (IntentCategory, Vec<String>) {
        // (category, earliest byte position, matched triggers)
        let mut best: Option<(IntentCategory, usize, Vec<String>)> = None;

        for (category, triggers) in &self.categories {
            let mut earliest: Option<usize> = None;
            let mut matched = Vec::new();
            for trigger in triggers_for(language, triggers) {
                if let Some(pos) = lowered.find(trigger) {
                    matched.push(trigger.to_string());
                    earliest = Some(earliest.map_or(pos, |e| e.min(pos)));
                }
            }

            let Some(pos) = earliest else { continue };

            match self.tie_policy {
                TiePolicy::DeclarationOrder => return (*category, matched),
                TiePolicy::EarliestMention => {
                    // Strict comparison keeps the earlier-declared category on equal positions
                    let earlier = match &best {
                        Some((_, best_pos, _)) => pos < *best_pos,
                        None => true,
                    };
                    if earlier {
                        best = Some((*category, pos, matched));
                    }
                }
            }
        }

        match best {
            Some((category, _, matched)) => (category, matched),
            None => (IntentCategory::Information, Vec::new()),
        }
    }
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wont_start_is_information() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("My car won't start");
        assert_eq!(result.language, Language::En);
        assert_eq!(result.intent, IntentCategory::Information);
        assert!(!result.is_emergency);
        assert!(result.matched_triggers.is_empty());
    }

    #[test]
    fn test_wont_start_with_help_is_emergency() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("My car won't start, help!");
        assert_eq!(result.intent, IntentCategory::Emergency);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_arabic_brake_cost() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("كم تكلفة تغيير الفرامل");
        assert_eq!(result.language, Language::Ar);
        assert_eq!(result.intent, IntentCategory::Cost);
    }

    #[test]
    fn test_declaration_order_prefers_maintenance() {
        let analyzer = QueryAnalyzer::with_policy(TiePolicy::DeclarationOrder);
        let result = analyzer.analyze("كم تكلفة تغيير الفرامل");
        assert_eq!(result.intent, IntentCategory::Maintenance);

        let result = analyzer.analyze("How much does an oil change cost?");
        assert_eq!(result.intent, IntentCategory::Maintenance);
    }

    #[test]
    fn test_earliest_mention_prefers_leading_trigger() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("How much does an oil change cost?");
        assert_eq!(result.intent, IntentCategory::Cost);

        let result = analyzer.analyze("When should I change my oil?");
        assert_eq!(result.intent, IntentCategory::Maintenance);
    }

    #[test]
    fn test_emergency_flag_is_independent_of_intent() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("I need a service after the accident");
        assert_eq!(result.intent, IntentCategory::Maintenance);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_case_insensitive_triggers() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("BRAKES ARE BROKEN");
        assert_eq!(result.intent, IntentCategory::Diagnostic);
    }

    #[test]
    fn test_arabic_triggers_not_used_for_english() {
        let analyzer = QueryAnalyzer::new();
        // English text never consults the Arabic lists and vice versa
        let result = analyzer.analyze("smoke from the hood");
        assert_eq!(result.intent, IntentCategory::Emergency);
        assert!(result.is_emergency);

        let result = analyzer.analyze("في دخان من الكبوت");
        assert_eq!(result.language, Language::Ar);
        assert_eq!(result.intent, IntentCategory::Emergency);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_arabic_emergency_keyword_only_in_keyword_list() {
        let analyzer = QueryAnalyzer::new();
        // "حادث" (accident) is an emergency keyword but not an intent trigger
        let result = analyzer.analyze("عملت حادث امبارح");
        assert_eq!(result.intent, IntentCategory::Information);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_unmatched_is_information() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("Tell me about turbochargers");
        assert_eq!(result.intent, IntentCategory::Information);
        assert!(!result.is_emergency);
        assert_eq!(result.text, "Tell me about turbochargers");
    }

    #[test]
    fn test_matched_triggers_reported() {
        let analyzer = QueryAnalyzer::new();
        let result = analyzer.analyze("what is the price, is it expensive?");
        assert_eq!(result.intent, IntentCategory::Cost);
        assert!(result.matched_triggers.contains(&"price".to_string()));
        assert!(result.matched_triggers.contains(&"expensive".to_string()));
    }

    #[test]
    fn test_indicators() {
        assert_eq!(IntentCategory::Emergency.indicator(), "[!]");
        assert_eq!(IntentCategory::Information.as_str(), "information");
    }
}
