//! Cross-module properties of the rule engine.

use approx::assert_abs_diff_eq;
use carx_common::{
    CostCalculator, DiagnosticTable, DrivingCondition, IntentCategory, Language,
    MaintenanceScheduler, QualityTier, QueryAnalyzer, RepairType, ServiceType, ShopTier,
    VehicleCategory,
};
use chrono::NaiveDate;

#[test]
fn any_arabic_character_means_arabic() {
    for text in ["hello", "Brake pads 2024", "won't start!!"] {
        assert_eq!(Language::detect(text), Language::En, "{}", text);
    }
    for text in ["فرامل", "my car صوت", "BMW موديل 2020"] {
        assert_eq!(Language::detect(text), Language::Ar, "{}", text);
    }
}

#[test]
fn standard_estimate_is_parts_plus_hours_at_150() {
    let calculator = CostCalculator::default();
    for repair in RepairType::ALL {
        let estimate = calculator
            .estimate_repair(repair, QualityTier::Standard, false, ShopTier::Standard)
            .unwrap();
        assert_abs_diff_eq!(
            estimate.total_cost,
            repair.base_parts_cost() + repair.labor_hours() * 150.0,
            epsilon = 0.01
        );
    }
}

#[test]
fn emergency_costs_half_again() {
    let calculator = CostCalculator::default();
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
                let normal = calculator
                    .estimate_repair(repair, quality, false, shop)
                    .unwrap();
                let urgent = calculator
                    .estimate_repair(repair, quality, true, shop)
                    .unwrap();
                assert_abs_diff_eq!(
                    urgent.total_cost,
                    normal.total_cost * 1.5,
                    epsilon = 0.05
                );
            }
        }
    }
}

#[test]
fn diagnoses_sum_to_hundred() {
    let table = DiagnosticTable::new();
    for path in table.paths() {
        let result = table.diagnose_path(&path).unwrap();
        let sum: f64 = result.possible_causes.iter().map(|c| c.confidence).sum();
        assert_abs_diff_eq!(sum, 100.0, epsilon = 0.05);
    }
}

#[test]
fn scheduler_shifts_with_mileage() {
    let scheduler = MaintenanceScheduler::new();
    let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    for service in ServiceType::ALL {
        let base = scheduler
            .next_service_on(
                service,
                20_000,
                VehicleCategory::Luxury,
                DrivingCondition::Severe,
                today,
            )
            .unwrap();
        let later = scheduler
            .next_service_on(
                service,
                27_500,
                VehicleCategory::Luxury,
                DrivingCondition::Severe,
                today,
            )
            .unwrap();
        assert_eq!(later.next_service_km - base.next_service_km, 7_500);
        assert_eq!(later.next_service_date, base.next_service_date);
    }
}

#[test]
fn documented_examples_classify() {
    let analyzer = QueryAnalyzer::new();

    let plain = analyzer.analyze("My car won't start");
    assert_eq!(plain.language, Language::En);
    assert_eq!(plain.intent, IntentCategory::Information);
    assert!(!plain.is_emergency);

    let urgent = analyzer.analyze("My car won't start, help!");
    assert_eq!(urgent.intent, IntentCategory::Emergency);
    assert!(urgent.is_emergency);

    let cost = analyzer.analyze("كم تكلفة تغيير الفرامل");
    assert_eq!(cost.language, Language::Ar);
    assert_eq!(cost.intent, IntentCategory::Cost);
}
