//! Cost Calculator v2.4.0
//!
//! Repair estimate = parts x quality factor + labor hours x shop rate.
//! Emergency jobs multiply parts and labor separately by the surcharge factor.
//! Parts and labor are each rounded to 2 decimals before they are summed.

use crate::config::PricingConfig;
use crate::error::{CarxError, Result};
use crate::language::{Bilingual, Language};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Tiers and Repair Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Economy,
    #[default]
    Standard,
    Premium,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Economy => "economy",
            QualityTier::Standard => "standard",
            QualityTier::Premium => "premium",
        }
    }
}

impl FromStr for QualityTier {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "economy" => Ok(QualityTier::Economy),
            "standard" => Ok(QualityTier::Standard),
            "premium" => Ok(QualityTier::Premium),
            other => Err(CarxError::CostCalculation(format!("Unknown parts quality: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShopTier {
    #[default]
    Standard,
    Specialist,
    Dealership,
}

impl ShopTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShopTier::Standard => "standard",
            ShopTier::Specialist => "specialist",
            ShopTier::Dealership => "dealership",
        }
    }
}

impl FromStr for ShopTier {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ShopTier::Standard),
            "specialist" => Ok(ShopTier::Specialist),
            "dealership" => Ok(ShopTier::Dealership),
            other => Err(CarxError::CostCalculation(format!("Unknown shop type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairType {
    OilChange,
    BrakeService,
    TimingBelt,
}

/// Base parts cost (EGP), labor hours, complexity
struct RepairInfo {
    parts: f64,
    labor_hours: f64,
    complexity: Complexity,
}

impl RepairType {
    pub const ALL: [RepairType; 3] = [
        RepairType::OilChange,
        RepairType::BrakeService,
        RepairType::TimingBelt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepairType::OilChange => "oil_change",
            RepairType::BrakeService => "brake_service",
            RepairType::TimingBelt => "timing_belt",
        }
    }

    pub fn label(&self) -> Bilingual {
        match self {
            RepairType::OilChange => Bilingual::new("Oil Change", "تغيير زيت"),
            RepairType::BrakeService => Bilingual::new("Brake Service", "صيانة فرامل"),
            RepairType::TimingBelt => Bilingual::new("Timing Belt", "تغيير سير الكاتينة"),
        }
    }

    fn info(&self) -> RepairInfo {
        match self {
            RepairType::OilChange => RepairInfo {
                parts: 800.0,
                labor_hours: 1.0,
                complexity: Complexity::Low,
            },
            RepairType::BrakeService => RepairInfo {
                parts: 1200.0,
                labor_hours: 2.0,
                complexity: Complexity::Medium,
            },
            RepairType::TimingBelt => RepairInfo {
                parts: 2500.0,
                labor_hours: 4.0,
                complexity: Complexity::High,
            },
        }
    }

    pub fn base_parts_cost(&self) -> f64 {
        self.info().parts
    }

    pub fn labor_hours(&self) -> f64 {
        self.info().labor_hours
    }

    /// Map free text to a repair type
    pub fn identify(text: &str) -> Option<RepairType> {
        let lowered = text.to_lowercase();
        const PHRASES: &[(&str, RepairType)] = &[
            ("timing belt", RepairType::TimingBelt),
            ("سير الكاتينة", RepairType::TimingBelt),
            ("سير التايمن", RepairType::TimingBelt),
            ("brake", RepairType::BrakeService),
            ("فرامل", RepairType::BrakeService),
            ("oil", RepairType::OilChange),
            ("زيت", RepairType::OilChange),
        ];
        PHRASES
            .iter()
            .find(|(phrase, _)| lowered.contains(phrase))
            .map(|(_, repair)| *repair)
    }
}

impl FromStr for RepairType {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "oil_change" => Ok(RepairType::OilChange),
            "brake_service" => Ok(RepairType::BrakeService),
            "timing_belt" => Ok(RepairType::TimingBelt),
            other => Err(CarxError::CostCalculation(format!(
                "Unknown repair type: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Estimate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub repair_type: RepairType,
    pub parts_cost: f64,
    pub labor_cost: f64,
    pub total_cost: f64,
    pub quality: QualityTier,
    pub is_emergency: bool,
    pub shop: ShopTier,
    /// Labor hours
    pub estimated_hours: f64,
    pub complexity: Complexity,
    pub currency: String,
}

impl CostEstimate {
    pub fn summary(&self, lang: Language) -> String {
        let label = self.repair_type.label();
        match lang {
            Language::Ar => format!(
                "{}: قطع الغيار {:.2} + المصنعية {:.2} = {:.2} {}",
                label.get(lang),
                self.parts_cost,
                self.labor_cost,
                self.total_cost,
                currency_label(&self.currency, lang)
            ),
            Language::En => format!(
                "{}: parts {:.2} + labor {:.2} = {:.2} {}",
                label.get(lang),
                self.parts_cost,
                self.labor_cost,
                self.total_cost,
                self.currency
            ),
        }
    }
}

fn currency_label(currency: &str, lang: Language) -> &str {
    match (currency, lang) {
        ("EGP", Language::Ar) => "جنيه",
        (other, _) => other,
    }
}

pub struct CostCalculator {
    pricing: PricingConfig,
}

impl CostCalculator {
    pub fn new(pricing: PricingConfig) -> Self {
        Self { pricing }
    }

    fn quality_factor(&self, quality: QualityTier) -> f64 {
        match quality {
            QualityTier::Economy => self.pricing.quality_economy,
            QualityTier::Standard => self.pricing.quality_standard,
            QualityTier::Premium => self.pricing.quality_premium,
        }
    }

    fn labor_rate(&self, shop: ShopTier) -> f64 {
        match shop {
            ShopTier::Standard => self.pricing.labor_rate_standard,
            ShopTier::Specialist => self.pricing.labor_rate_specialist,
            ShopTier::Dealership => self.pricing.labor_rate_dealership,
        }
    }

    /// Estimate by repair type name, e.g. "brake_service"
    pub fn estimate(
        &self,
        repair_type: &str,
        quality: QualityTier,
        is_emergency: bool,
        shop: ShopTier,
    ) -> Result<CostEstimate> {
        let repair = repair_type.parse::<RepairType>().map_err(|e| {
            tracing::error!("Cost estimate failed: {}", e);
            e
        })?;
        self.estimate_repair(repair, quality, is_emergency, shop)
    }

    pub fn estimate_repair(
        &self,
        repair: RepairType,
        quality: QualityTier,
        is_emergency: bool,
        shop: ShopTier,
    ) -> Result<CostEstimate> {
        let info = repair.info();

        let mut parts_cost = info.parts * self.quality_factor(quality);
        let mut labor_cost = info.labor_hours * self.labor_rate(shop);

        if is_emergency {
            parts_cost *= self.pricing.emergency_factor;
            labor_cost *= self.pricing.emergency_factor;
        }

        if !parts_cost.is_finite()
            || !labor_cost.is_finite()
            || parts_cost < 0.0
            || labor_cost < 0.0
        {
            return Err(CarxError::CostCalculation(format!(
                "Invalid pricing for {}: parts={} labor={}",
                repair.as_str(),
                parts_cost,
                labor_cost
            )));
        }

        let parts_cost = round2(parts_cost);
        let labor_cost = round2(labor_cost);

        Ok(CostEstimate {
            repair_type: repair,
            parts_cost,
            labor_cost,
            total_cost: round2(parts_cost + labor_cost),
            quality,
            is_emergency,
            shop,
            estimated_hours: info.labor_hours,
            complexity: info.complexity,
            currency: self.pricing.currency.clone(),
        })
    }
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new(PricingConfig::default())
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
    fn test_standard_total_is_parts_plus_labor() {
        let calc = CostCalculator::default();
        for repair in RepairType::ALL {
            let est = calc
                .estimate(
                    repair.as_str(),
                    QualityTier::Standard,
                    false,
                    ShopTier::Standard,
                )
                .unwrap();
            let expected = repair.base_parts_cost() + repair.labor_hours() * 150.0;
            assert_abs_diff_eq!(est.total_cost, expected, epsilon = 0.01);
        }
    }

    #[test]
    fn test_emergency_surcharge() {
        let calc = CostCalculator::default();
        for repair in RepairType::ALL {
            for quality in [
                QualityTier::Economy,
                QualityTier::Standard,
                QualityTier::Premium,
            ] {
                for shop in [
                    ShopTier::Standard,
                    ShopTier::Specialist,
                    ShopTier::Dealership,
                ] {
                    let normal = calc.estimate_repair(repair, quality, false, shop).unwrap();
                    let urgent = calc.estimate_repair(repair, quality, true, shop).unwrap();
                    assert_abs_diff_eq!(urgent.total_cost, normal.total_cost * 1.5, epsilon = 0.02);
                }
            }
        }
    }

    #[test]
    fn test_brake_service_premium_dealership_emergency() {
        let calc = CostCalculator::default();
        let est = calc
            .estimate(
                "brake_service",
                QualityTier::Premium,
                true,
                ShopTier::Dealership,
            )
            .unwrap();
        // 1200 * 1.4 * 1.5 = 2520, 2 * 350 * 1.5 = 1050
        assert_abs_diff_eq!(est.parts_cost, 2520.0);
        assert_abs_diff_eq!(est.labor_cost, 1050.0);
        assert_abs_diff_eq!(est.total_cost, 3570.0);
        assert_eq!(est.complexity, Complexity::Medium);
        assert_eq!(est.currency, "EGP");
        assert!(est.is_emergency);
    }

    #[test]
    fn test_economy_oil_change() {
        let calc = CostCalculator::default();
        let est = calc
            .estimate(
                "oil_change",
                QualityTier::Economy,
                false,
                ShopTier::Specialist,
            )
            .unwrap();
        assert_abs_diff_eq!(est.parts_cost, 560.0);
        assert_abs_diff_eq!(est.labor_cost, 250.0);
        assert_abs_diff_eq!(est.total_cost, 810.0);
        assert_abs_diff_eq!(est.estimated_hours, 1.0);
    }

    #[test]
    fn test_unknown_repair_type() {
        let calc = CostCalculator::default();
        let err = calc
            .estimate(
                "flux_capacitor",
                QualityTier::Standard,
                false,
                ShopTier::Standard,
            )
            .unwrap_err();
        assert!(matches!(err, CarxError::CostCalculation(_)));
        assert!(err.to_string().contains("flux_capacitor"));
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(
            "Premium".parse::<QualityTier>().unwrap(),
            QualityTier::Premium
        );
        assert_eq!(
            "dealership".parse::<ShopTier>().unwrap(),
            ShopTier::Dealership
        );
        assert!("gold".parse::<QualityTier>().is_err());
        assert!("garage".parse::<ShopTier>().is_err());
    }

    #[test]
    fn test_identify_repair() {
        assert_eq!(
            RepairType::identify("كم تكلفة تغيير الفرامل"),
            Some(RepairType::BrakeService)
        );
        assert_eq!(
            RepairType::identify("price of an oil change"),
            Some(RepairType::OilChange)
        );
        assert_eq!(
            RepairType::identify("Timing belt price?"),
            Some(RepairType::TimingBelt)
        );
        assert_eq!(RepairType::identify("how much is a new radio"), None);
        assert_eq!(
            RepairType::identify("بكام تغيير سير الكاتينة"),
            Some(RepairType::TimingBelt)
        );
        // "سير" inside another word is not a timing belt
        assert_eq!(RepairType::identify("بكام تفسير الكود ده"), None);
    }

    #[test]
    fn test_custom_pricing() {
        let pricing = PricingConfig {
            labor_rate_standard: 200.0,
            ..PricingConfig::default()
        };
        let calc = CostCalculator::new(pricing);
        let est = calc
            .estimate_repair(
                RepairType::OilChange,
                QualityTier::Standard,
                false,
                ShopTier::Standard,
            )
            .unwrap();
        assert_abs_diff_eq!(est.total_cost, 1000.0);
    }

    #[test]
    fn test_summary_localized() {
        let calc = CostCalculator::default();
        let est = calc
            .estimate_repair(
                RepairType::BrakeService,
                QualityTier::Standard,
                false,
                ShopTier::Standard,
            )
            .unwrap();
        assert!(est.summary(Language::En).contains("Brake Service"));
        assert!(est.summary(Language::En).contains("1500.00 EGP"));
        assert!(est.summary(Language::Ar).contains("صيانة فرامل"));
        assert!(est.summary(Language::Ar).contains("جنيه"));
    }
}
