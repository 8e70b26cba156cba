//! One-shot commands: ask, diagnose, estimate, schedule
//!
//! Each command returns the text to print so it can be tested without a
//! terminal.

use crate::output::to_json;
use crate::repl::ChatSession;
use anyhow::Result;
use carx_common::{
    CarxConfig, CostCalculator, DiagnosticTable, DrivingCondition, Language, MaintenanceScheduler,
    QualityTier, Response, ServiceType, ShopTier, VehicleCategory,
};
use chrono::{Local, NaiveDate};

/// Answer a single question, with the optional model fallback
pub async fn ask(config: &CarxConfig, text: &str) -> Response {
    let mut chat = ChatSession::new(config);
    chat.respond(text).await
}

pub fn diagnose(
    system: &str,
    symptom: &str,
    sub_symptom: &str,
    lang: Language,
    json: bool,
) -> Result<String> {
    let result = DiagnosticTable::new().diagnose(system, symptom, sub_symptom)?;
    if json {
        return to_json(&result);
    }
    Ok(result.summary(lang))
}

pub fn estimate(
    config: &CarxConfig,
    repair_type: &str,
    quality: &str,
    shop: &str,
    emergency: bool,
    lang: Language,
    json: bool,
) -> Result<String> {
    let quality: QualityTier = quality.parse()?;
    let shop: ShopTier = shop.parse()?;
    let calculator = CostCalculator::new(config.pricing.clone());
    let estimate = calculator.estimate(repair_type, quality, emergency, shop)?;
    if json {
        return to_json(&estimate);
    }
    Ok(estimate.summary(lang))
}

/// Vehicle description for `schedule`
pub struct ScheduleTarget<'a> {
    pub mileage: u64,
    /// Make wins over category when both are given
    pub make: Option<&'a str>,
    pub category: &'a str,
    pub condition: &'a str,
}

pub fn schedule(
    service: Option<&str>,
    target: &ScheduleTarget,
    lang: Language,
    json: bool,
) -> Result<String> {
    schedule_on(service, target, lang, json, Local::now().date_naive())
}

pub fn schedule_on(
    service: Option<&str>,
    target: &ScheduleTarget,
    lang: Language,
    json: bool,
    today: NaiveDate,
) -> Result<String> {
    let category = match target.make {
        Some(make) => VehicleCategory::for_make(make),
        None => target.category.parse()?,
    };
    let condition: DrivingCondition = target.condition.parse()?;
    let scheduler = MaintenanceScheduler::new();

    let projections = match service {
        Some(name) => {
            let service: ServiceType = name.parse()?;
            let projection =
                scheduler.next_service_on(service, target.mileage, category, condition, today)?;
            vec![projection]
        }
        None => scheduler.schedule_all(target.mileage, category, condition, today)?,
    };

    if json {
        return to_json(&projections);
    }
    Ok(projections
        .iter()
        .map(|p| p.summary(lang))
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()
    }

    #[test]
    fn test_diagnose_text_and_json() {
        let text = diagnose("engine", "starting", "no_crank", Language::En, false).unwrap();
        assert!(text.contains("Battery: 44.44%"));

        let json = diagnose("engine", "starting", "no_crank", Language::En, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["confidence_level"], "high");

        assert!(diagnose("engine", "starting", "overheat", Language::En, false).is_err());
    }

    #[test]
    fn test_estimate_arabic() {
        let text = estimate(
            &CarxConfig::default(),
            "brake_service",
            "standard",
            "standard",
            false,
            Language::Ar,
            false,
        )
        .unwrap();
        assert!(text.contains("1500.00 جنيه"));
    }

    #[test]
    fn test_estimate_rejects_unknown_tiers() {
        let config = CarxConfig::default();
        let gold = estimate(
            &config,
            "oil_change",
            "gold",
            "standard",
            false,
            Language::En,
            false,
        );
        assert!(gold.is_err());
        let garage = estimate(
            &config,
            "oil_change",
            "standard",
            "garage",
            false,
            Language::En,
            false,
        );
        assert!(garage.is_err());
    }

    #[test]
    fn test_schedule_single_service_by_make() {
        let target = ScheduleTarget {
            mileage: 50_000,
            make: Some("Porsche"),
            category: "economy",
            condition: "normal",
        };
        let text = schedule_on(Some("oil_change"), &target, Language::En, false, june()).unwrap();
        // 10000 x 0.6 performance x 0.8 summer
        assert!(text.contains("at 54800 km"));
    }

    #[test]
    fn test_schedule_all_services() {
        let target = ScheduleTarget {
            mileage: 0,
            make: None,
            category: "economy",
            condition: "light",
        };
        let json = schedule_on(None, &target, Language::En, true, june()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), ServiceType::ALL.len());
    }

    #[test]
    fn test_schedule_unknown_service() {
        let target = ScheduleTarget {
            mileage: 0,
            make: None,
            category: "economy",
            condition: "normal",
        };
        assert!(schedule_on(Some("wipers"), &target, Language::En, false, june()).is_err());
    }

    #[tokio::test]
    async fn test_ask_one_shot() {
        let response = ask(&CarxConfig::default(), "My car won't start").await;
        assert_eq!(response.knowledge_topic.as_deref(), Some("engine"));
    }
}
