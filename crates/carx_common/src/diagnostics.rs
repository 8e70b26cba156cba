//! Diagnostic Table v2.2.0
//!
//! Static, probability-weighted fault table:
//! system -> symptom -> sub-symptom -> {causes, tests}.
//!
//! Confidence is local: each cause's probability is divided by the sum of the
//! probabilities listed under the same sub-symptom. Causes are returned in
//! declaration order, never re-sorted.

use crate::error::{CarxError, Result};
use crate::language::{Bilingual, Language};
use serde::{Deserialize, Serialize};

/// Raw sum of probabilities above which the overall tier is "high"
const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

// ============================================================================
// Static Table
// ============================================================================

struct Cause {
    part: &'static str,
    probability: f64,
    cost_range: &'static str,
}

struct SubSymptomEntry {
    name: &'static str,
    causes: &'static [Cause],
    tests: &'static [Bilingual],
}

struct SymptomEntry {
    name: &'static str,
    sub_symptoms: &'static [SubSymptomEntry],
}

struct SystemEntry {
    name: &'static str,
    symptoms: &'static [SymptomEntry],
}

static DIAGNOSTIC_DATA: &[SystemEntry] = &[SystemEntry {
    name: "engine",
    symptoms: &[
        SymptomEntry {
            name: "starting",
            sub_symptoms: &[
                SubSymptomEntry {
                    name: "no_crank",
                    causes: &[
                        Cause {
                            part: "battery",
                            probability: 0.4,
                            cost_range: "1400-2500",
                        },
                        Cause {
                            part: "starter",
                            probability: 0.3,
                            cost_range: "1800-3500",
                        },
                        Cause {
                            part: "alternator",
                            probability: 0.2,
                            cost_range: "2500-4500",
                        },
                    ],
                    tests: &[
                        Bilingual::new("Battery voltage", "جهد البطارية"),
                        Bilingual::new("Starter draw", "سحب تيار المارش"),
                        Bilingual::new("Alternator output", "خرج الدينامو"),
                    ],
                },
                SubSymptomEntry {
                    name: "crank_no_start",
                    causes: &[
                        Cause {
                            part: "fuel_pump",
                            probability: 0.35,
                            cost_range: "2100-3700",
                        },
                        Cause {
                            part: "spark_plugs",
                            probability: 0.25,
                            cost_range: "120-270",
                        },
                        Cause {
                            part: "ignition_coil",
                            probability: 0.2,
                            cost_range: "450-1200",
                        },
                    ],
                    tests: &[
                        Bilingual::new("Fuel pressure", "ضغط البنزين"),
                        Bilingual::new("Spark test", "اختبار الشرارة"),
                        Bilingual::new("Compression test", "اختبار الكومبريشن"),
                    ],
                },
            ],
        },
        SymptomEntry {
            name: "running",
            sub_symptoms: &[SubSymptomEntry {
                name: "misfire",
                causes: &[
                    Cause {
                        part: "spark_plugs",
                        probability: 0.3,
                        cost_range: "120-270",
                    },
                    Cause {
                        part: "ignition_coils",
                        probability: 0.3,
                        cost_range: "450-1200",
                    },
                    Cause {
                        part: "fuel_injectors",
                        probability: 0.2,
                        cost_range: "1500-2800",
                    },
                ],
                tests: &[
                    Bilingual::new("Compression test", "اختبار الكومبريشن"),
                    Bilingual::new("Spark test", "اختبار الشرارة"),
                    Bilingual::new("Injector balance", "اتزان البخاخات"),
                ],
            }],
        },
    ],
}];

/// Symptom phrases users actually type, mapped to a table path
static SYMPTOM_PHRASES: &[(&str, SymptomPathRef)] = &[
    ("won't start", ("engine", "starting", "no_crank")),
    ("wont start", ("engine", "starting", "no_crank")),
    ("clicking", ("engine", "starting", "no_crank")),
    ("dead battery", ("engine", "starting", "no_crank")),
    ("hard start", ("engine", "starting", "crank_no_start")),
    ("cranks but", ("engine", "starting", "crank_no_start")),
    ("misfire", ("engine", "running", "misfire")),
    ("shaking", ("engine", "running", "misfire")),
    ("مش عايزة تدور", ("engine", "starting", "no_crank")),
    ("صوت طقطقة", ("engine", "starting", "no_crank")),
    ("البطارية", ("engine", "starting", "no_crank")),
    ("صعب في التشغيل", ("engine", "starting", "crank_no_start")),
    ("رعشة", ("engine", "running", "misfire")),
];

type SymptomPathRef = (&'static str, &'static str, &'static str);

// ============================================================================
// Public Types
// ============================================================================

/// A path into the diagnostic table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomPath {
    pub system: String,
    pub symptom: String,
    pub sub_symptom: String,
}

impl SymptomPath {
    pub fn new(system: &str, symptom: &str, sub_symptom: &str) -> Self {
        Self {
            system: system.to_string(),
            symptom: symptom.to_string(),
            sub_symptom: sub_symptom.to_string(),
        }
    }
}

/// One candidate part with its share of the local probability mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseShare {
    pub part: String,
    /// Percentage, rounded to 2 decimals
    pub confidence: f64,
    /// Cost range in EGP, e.g. "1400-2500"
    pub cost_range: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
}

impl ConfidenceTier {
    pub fn label(&self) -> Bilingual {
        match self {
            ConfidenceTier::High => Bilingual::new("high", "عالية"),
            ConfidenceTier::Medium => Bilingual::new("medium", "متوسطة"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub path: SymptomPath,
    /// Declaration order, not sorted by confidence
    pub possible_causes: Vec<CauseShare>,
    pub recommended_tests: Vec<Bilingual<String>>,
    pub confidence_level: ConfidenceTier,
}

impl DiagnosisResult {
    /// Short human-readable summary in the requested language
    pub fn summary(&self, lang: Language) -> String {
        let mut out = String::new();
        for cause in &self.possible_causes {
            let line = match lang {
                Language::Ar => format!(
                    "• {}: {:.2}% (التكلفة {} جنيه)\n",
                    part_label(&cause.part).get(lang),
                    cause.confidence,
                    cause.cost_range
                ),
                Language::En => format!(
                    "• {}: {:.2}% (cost {} EGP)\n",
                    part_label(&cause.part).get(lang),
                    cause.confidence,
                    cause.cost_range
                ),
            };
            out.push_str(&line);
        }
        let tests_heading = Bilingual::new("Recommended tests", "الفحوصات المقترحة");
        let tests: Vec<&str> = self.recommended_tests.iter().map(|t| t.get(lang)).collect();
        out.push_str(&format!("{}: {}\n", tests_heading.get(lang), tests.join(", ")));
        let level_heading = Bilingual::new("Confidence", "درجة الثقة");
        out.push_str(&format!(
            "{}: {}",
            level_heading.get(lang),
            self.confidence_level.label().get(lang)
        ));
        out
    }
}

/// Display name for a part id
pub fn part_label(part: &str) -> Bilingual<String> {
    let (en, ar) = match part {
        "battery" => ("Battery", "البطارية"),
        "starter" => ("Starter motor", "المارش"),
        "alternator" => ("Alternator", "الدينامو"),
        "fuel_pump" => ("Fuel pump", "طرمبة البنزين"),
        "spark_plugs" => ("Spark plugs", "البوجيهات"),
        "ignition_coil" => ("Ignition coil", "موبينة الإشعال"),
        "ignition_coils" => ("Ignition coils", "موبينات الإشعال"),
        "fuel_injectors" => ("Fuel injectors", "البخاخات"),
        other => (other, other),
    };
    Bilingual::new(en.to_string(), ar.to_string())
}

// ============================================================================
// Diagnostic Table
// ============================================================================

pub struct DiagnosticTable {
    systems: &'static [SystemEntry],
}

impl DiagnosticTable {
    pub fn new() -> Self {
        Self {
            systems: DIAGNOSTIC_DATA,
        }
    }

    /// Look up a sub-symptom and normalize its causes into percentages
    pub fn diagnose(
        &self,
        system: &str,
        symptom: &str,
        sub_symptom: &str,
    ) -> Result<DiagnosisResult> {
        let entry = self
            .systems
            .iter()
            .find(|s| s.name == system)
            .and_then(|s| s.symptoms.iter().find(|sym| sym.name == symptom))
            .and_then(|sym| sym.sub_symptoms.iter().find(|sub| sub.name == sub_symptom))
            .ok_or_else(|| {
                tracing::error!(
                    "Diagnostic lookup failed: {}/{}/{}",
                    system,
                    symptom,
                    sub_symptom
                );
                CarxError::Diagnostic(format!(
                    "Unknown problem: {}/{}/{}",
                    system, symptom, sub_symptom
                ))
            })?;

        let total: f64 = entry.causes.iter().map(|c| c.probability).sum();
        if total <= 0.0 {
            return Err(CarxError::Diagnostic(format!(
                "No probability mass for {}/{}/{}",
                system, symptom, sub_symptom
            )));
        }

        let possible_causes = entry
            .causes
            .iter()
            .map(|c| CauseShare {
                part: c.part.to_string(),
                confidence: round2(c.probability / total * 100.0),
                cost_range: c.cost_range.to_string(),
            })
            .collect();

        Ok(DiagnosisResult {
            path: SymptomPath::new(system, symptom, sub_symptom),
            possible_causes,
            recommended_tests: entry
                .tests
                .iter()
                .map(|t| t.map(|s| s.to_string()))
                .collect(),
            confidence_level: if total > HIGH_CONFIDENCE_THRESHOLD {
                ConfidenceTier::High
            } else {
                ConfidenceTier::Medium
            },
        })
    }

    pub fn diagnose_path(&self, path: &SymptomPath) -> Result<DiagnosisResult> {
        self.diagnose(&path.system, &path.symptom, &path.sub_symptom)
    }

    /// Map free text to a table path using the known symptom phrases
    pub fn identify(&self, text: &str) -> Option<SymptomPath> {
        let lowered = text.to_lowercase();
        SYMPTOM_PHRASES
            .iter()
            .find(|(phrase, _)| lowered.contains(phrase))
            .map(|(_, (system, symptom, sub))| SymptomPath::new(system, symptom, sub))
    }

    /// Every path in the table, in declaration order
    pub fn paths(&self) -> Vec<SymptomPath> {
        let mut out = Vec::new();
        for system in self.systems {
            for symptom in system.symptoms {
                for sub in symptom.sub_symptoms {
                    out.push(SymptomPath::new(system.name, symptom.name, sub.name));
                }
            }
        }
        out
    }
}

impl Default for DiagnosticTable {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_crank_diagnosis() {
        let table = DiagnosticTable::new();
        let result = table.diagnose("engine", "starting", "no_crank").unwrap();

        let parts: Vec<&str> = result
            .possible_causes
            .iter()
            .map(|c| c.part.as_str())
            .collect();
        assert_eq!(parts, vec!["battery", "starter", "alternator"]);
        assert_abs_diff_eq!(result.possible_causes[0].confidence, 44.44);
        assert_abs_diff_eq!(result.possible_causes[1].confidence, 33.33);
        assert_abs_diff_eq!(result.possible_causes[2].confidence, 22.22);
        assert_eq!(result.confidence_level, ConfidenceTier::High);
        assert_eq!(result.recommended_tests.len(), 3);
    }

    #[test]
    fn test_confidences_sum_to_hundred() {
        let table = DiagnosticTable::new();
        for path in table.paths() {
            let result = table.diagnose_path(&path).unwrap();
            let sum: f64 = result.possible_causes.iter().map(|c| c.confidence).sum();
            assert_abs_diff_eq!(sum, 100.0, epsilon = 0.05);
        }
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let table = DiagnosticTable::new();
        // misfire has tied causes; order must follow the table
        let result = table.diagnose("engine", "running", "misfire").unwrap();
        let parts: Vec<&str> = result
            .possible_causes
            .iter()
            .map(|c| c.part.as_str())
            .collect();
        assert_eq!(
            parts,
            vec!["spark_plugs", "ignition_coils", "fuel_injectors"]
        );
        assert_abs_diff_eq!(result.possible_causes[0].confidence, 37.5);
        assert_abs_diff_eq!(result.possible_causes[2].confidence, 25.0);
    }

    #[test]
    fn test_medium_tier_at_threshold() {
        let table = DiagnosticTable::new();
        let result = table
            .diagnose("engine", "starting", "crank_no_start")
            .unwrap();
        assert_eq!(result.confidence_level, ConfidenceTier::Medium);
        assert_abs_diff_eq!(result.possible_causes[0].confidence, 43.75);
    }

    #[test]
    fn test_missing_levels_fail() {
        let table = DiagnosticTable::new();
        for (system, symptom, sub) in [
            ("transmission", "starting", "no_crank"),
            ("engine", "braking", "no_crank"),
            ("engine", "starting", "overheat"),
        ] {
            let err = table.diagnose(system, symptom, sub).unwrap_err();
            assert!(matches!(err, CarxError::Diagnostic(_)));
            assert!(err.to_string().contains(sub));
        }
    }

    #[test]
    fn test_identify_from_text() {
        let table = DiagnosticTable::new();
        assert_eq!(
            table.identify("My car won't start"),
            Some(SymptomPath::new("engine", "starting", "no_crank"))
        );
        assert_eq!(
            table.identify("العربية صعب في التشغيل الصبح"),
            Some(SymptomPath::new("engine", "starting", "crank_no_start"))
        );
        assert_eq!(table.identify("radio is quiet"), None);
    }

    #[test]
    fn test_summary_is_localized() {
        let table = DiagnosticTable::new();
        let result = table.diagnose("engine", "starting", "no_crank").unwrap();
        let en = result.summary(Language::En);
        assert!(en.contains("Battery: 44.44%"));
        assert!(en.contains("Recommended tests"));
        let ar = result.summary(Language::Ar);
        assert!(ar.contains("البطارية"));
        assert!(ar.contains("الفحوصات المقترحة"));
        assert!(ar.contains("جهد البطارية"));
    }

    #[test]
    fn test_arabic_summary_has_no_latin_text() {
        let table = DiagnosticTable::new();
        for path in table.paths() {
            let ar = table.diagnose_path(&path).unwrap().summary(Language::Ar);
            assert!(!ar.chars().any(|c| c.is_ascii_alphabetic()), "{}", ar);
        }
    }
}
