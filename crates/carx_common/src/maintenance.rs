//! Maintenance Scheduler v2.3.0
//!
//! Projects the next service for a vehicle:
//! adjusted interval = base x vehicle category x season x driving condition.
//!
//! - Base interval: per-service "normal" km, 10000 km when a service has none
//! - Season: months 4-10 are summer (0.8), the rest winter (1.0)
//! - Date: today + adjusted / 50 days (assumes 50 km per day)

use crate::error::{CarxError, Result};
use crate::language::{Bilingual, Language};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fallback interval for services without a "normal" entry
pub const DEFAULT_INTERVAL_KM: u32 = 10_000;

/// Assumed average daily usage
pub const KM_PER_DAY: f64 = 50.0;

// ============================================================================
// Service Types and Interval Table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    OilChange,
    AirFilter,
    BrakeFluid,
    TransmissionFluid,
    SparkPlugs,
    TimingBelt,
}

/// Interval table entry. `normal` is what the scheduler uses;
/// the rest is shown to users as advice.
pub struct IntervalSpec {
    pub normal: Option<u32>,
    pub severe: Option<u32>,
    pub time: &'static str,
    pub conditions: &'static [(&'static str, u32)],
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::OilChange,
        ServiceType::AirFilter,
        ServiceType::BrakeFluid,
        ServiceType::TransmissionFluid,
        ServiceType::SparkPlugs,
        ServiceType::TimingBelt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::OilChange => "oil_change",
            ServiceType::AirFilter => "air_filter",
            ServiceType::BrakeFluid => "brake_fluid",
            ServiceType::TransmissionFluid => "transmission_fluid",
            ServiceType::SparkPlugs => "spark_plugs",
            ServiceType::TimingBelt => "timing_belt",
        }
    }

    pub fn label(&self) -> Bilingual {
        match self {
            ServiceType::OilChange => Bilingual::new("Oil Change", "تغيير زيت"),
            ServiceType::AirFilter => Bilingual::new("Air Filter", "فلتر الهواء"),
            ServiceType::BrakeFluid => Bilingual::new("Brake Fluid", "زيت الفرامل"),
            ServiceType::TransmissionFluid => Bilingual::new("Transmission Fluid", "زيت الفتيس"),
            ServiceType::SparkPlugs => Bilingual::new("Spark Plugs", "البوجيهات"),
            ServiceType::TimingBelt => Bilingual::new("Timing Belt", "سير الكاتينة"),
        }
    }

    pub fn intervals(&self) -> IntervalSpec {
        match self {
            // city 5000 / highway 7500 / severe 3000, no "normal" entry
            ServiceType::OilChange => IntervalSpec {
                normal: None,
                severe: Some(3000),
                time: "6 months",
                conditions: &[
                    ("hot_weather", 4000),
                    ("dusty", 4000),
                    ("heavy_traffic", 4000),
                    ("short_trips", 3500),
                ],
            },
            ServiceType::AirFilter => IntervalSpec {
                normal: Some(15000),
                severe: Some(7500),
                time: "12 months",
                conditions: &[
                    ("desert_areas", 7500),
                    ("construction_zones", 8000),
                    ("unpaved_roads", 7500),
                ],
            },
            ServiceType::BrakeFluid => IntervalSpec {
                normal: Some(45000),
                severe: Some(30000),
                time: "24 months",
                conditions: &[
                    ("mountainous", 30000),
                    ("heavy_traffic", 35000),
                    ("high_performance", 25000),
                ],
            },
            ServiceType::TransmissionFluid => IntervalSpec {
                normal: Some(60000),
                severe: Some(40000),
                time: "36 months",
                conditions: &[
                    ("towing", 30000),
                    ("sport_driving", 35000),
                    ("taxi_service", 30000),
                ],
            },
            // standard plugs; platinum 60000, iridium 100000
            ServiceType::SparkPlugs => IntervalSpec {
                normal: Some(40000),
                severe: Some(30000),
                time: "24 months",
                conditions: &[],
            },
            ServiceType::TimingBelt => IntervalSpec {
                normal: Some(90000),
                severe: Some(60000),
                time: "60 months",
                conditions: &[
                    ("hot_climate", 70000),
                    ("frequent_stops", 75000),
                    ("delivery_service", 65000),
                ],
            },
        }
    }

    /// Map free text to a service type
    pub fn identify(text: &str) -> Option<ServiceType> {
        let lowered = text.to_lowercase();
        const PHRASES: &[(&str, ServiceType)] = &[
            ("timing belt", ServiceType::TimingBelt),
            ("سير الكاتينة", ServiceType::TimingBelt),
            ("سير التايمن", ServiceType::TimingBelt),
            ("brake fluid", ServiceType::BrakeFluid),
            ("زيت الفرامل", ServiceType::BrakeFluid),
            ("transmission", ServiceType::TransmissionFluid),
            ("فتيس", ServiceType::TransmissionFluid),
            ("spark plug", ServiceType::SparkPlugs),
            ("بوجيه", ServiceType::SparkPlugs),
            ("air filter", ServiceType::AirFilter),
            ("فلتر الهواء", ServiceType::AirFilter),
            ("oil", ServiceType::OilChange),
            ("زيت", ServiceType::OilChange),
        ];
        PHRASES
            .iter()
            .find(|(phrase, _)| lowered.contains(phrase))
            .map(|(_, service)| *service)
    }
}

impl FromStr for ServiceType {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| CarxError::Maintenance(format!("Unknown service type: {}", s)))
    }
}

// ============================================================================
// Factors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    #[default]
    Economy,
    Luxury,
    Performance,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Economy => "economy",
            VehicleCategory::Luxury => "luxury",
            VehicleCategory::Performance => "performance",
        }
    }

    /// Lower means service is needed sooner
    pub fn maintenance_factor(&self) -> f64 {
        match self {
            VehicleCategory::Economy => 1.0,
            VehicleCategory::Luxury => 0.8,
            VehicleCategory::Performance => 0.6,
        }
    }

    pub fn brands(&self) -> &'static [&'static str] {
        match self {
            VehicleCategory::Economy => &["toyota", "honda", "hyundai", "kia", "nissan"],
            VehicleCategory::Luxury => &["bmw", "mercedes", "audi", "lexus"],
            VehicleCategory::Performance => &["porsche", "ferrari", "maserati"],
        }
    }

    /// Category for a make; unknown makes are economy
    pub fn for_make(make: &str) -> Self {
        let make = make.trim().to_lowercase();
        [
            VehicleCategory::Economy,
            VehicleCategory::Luxury,
            VehicleCategory::Performance,
        ]
        .into_iter()
        .find(|c| c.brands().contains(&make.as_str()))
        .unwrap_or_default()
    }
}

impl FromStr for VehicleCategory {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "economy" => Ok(VehicleCategory::Economy),
            "luxury" => Ok(VehicleCategory::Luxury),
            "performance" => Ok(VehicleCategory::Performance),
            other => Err(CarxError::Maintenance(format!(
                "Unknown vehicle category: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrivingCondition {
    #[default]
    Normal,
    Severe,
    Light,
}

impl DrivingCondition {
    pub fn factor(&self) -> f64 {
        match self {
            DrivingCondition::Normal => 1.0,
            DrivingCondition::Severe => 0.7,
            DrivingCondition::Light => 1.2,
        }
    }
}

impl FromStr for DrivingCondition {
    type Err = CarxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(DrivingCondition::Normal),
            "severe" => Ok(DrivingCondition::Severe),
            "light" => Ok(DrivingCondition::Light),
            other => Err(CarxError::Maintenance(format!(
                "Unknown driving condition: {}",
                other
            ))),
        }
    }
}

/// Egyptian seasons as far as maintenance is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// 35-45°C, high humidity, severe dust
    Summer,
    /// 10-25°C, moderate humidity and dust
    Winter,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        if (4..=10).contains(&month) {
            Season::Summer
        } else {
            Season::Winter
        }
    }

    pub fn maintenance_factor(&self) -> f64 {
        match self {
            Season::Summer => 0.8,
            Season::Winter => 1.0,
        }
    }
}

// ============================================================================
// Projection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Critical,
    Urgent,
    Soon,
    Normal,
}

impl UrgencyTier {
    pub fn from_interval(km: f64) -> Self {
        if km <= 500.0 {
            UrgencyTier::Critical
        } else if km <= 1000.0 {
            UrgencyTier::Urgent
        } else if km <= 2000.0 {
            UrgencyTier::Soon
        } else {
            UrgencyTier::Normal
        }
    }

    pub fn label(&self) -> Bilingual {
        match self {
            UrgencyTier::Critical => Bilingual::new("critical", "حرج"),
            UrgencyTier::Urgent => Bilingual::new("urgent", "عاجل"),
            UrgencyTier::Soon => Bilingual::new("soon", "قريباً"),
            UrgencyTier::Normal => Bilingual::new("normal", "عادي"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProjection {
    pub service_type: ServiceType,
    pub next_service_km: u64,
    pub next_service_date: NaiveDate,
    pub km_remaining: u64,
    pub days_remaining: i64,
    pub weather_factor: f64,
    pub urgency: UrgencyTier,
}

impl ServiceProjection {
    pub fn summary(&self, lang: Language) -> String {
        let label = self.service_type.label();
        match lang {
            Language::Ar => format!(
                "{}: عند {} كم (بعد {} كم) بتاريخ {} - {}",
                label.get(lang),
                self.next_service_km,
                self.km_remaining,
                self.next_service_date,
                self.urgency.label().get(lang)
            ),
            Language::En => format!(
                "{}: at {} km ({} km to go) by {} - {}",
                label.get(lang),
                self.next_service_km,
                self.km_remaining,
                self.next_service_date,
                self.urgency.label().get(lang)
            ),
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MaintenanceScheduler;

impl MaintenanceScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Project the next service using today's local date
    pub fn next_service(
        &self,
        service_type: &str,
        current_mileage: u64,
        vehicle_category: VehicleCategory,
        driving_condition: DrivingCondition,
    ) -> Result<ServiceProjection> {
        let service = service_type.parse::<ServiceType>()?;
        self.next_service_on(
            service,
            current_mileage,
            vehicle_category,
            driving_condition,
            Local::now().date_naive(),
        )
    }

    pub fn next_service_on(
        &self,
        service: ServiceType,
        current_mileage: u64,
        vehicle_category: VehicleCategory,
        driving_condition: DrivingCondition,
        today: NaiveDate,
    ) -> Result<ServiceProjection> {
        let base = service.intervals().normal.unwrap_or(DEFAULT_INTERVAL_KM) as f64;
        let weather_factor = Season::from_month(today.month()).maintenance_factor();

        let adjusted = base
            * vehicle_category.maintenance_factor()
            * weather_factor
            * driving_condition.factor();

        if !adjusted.is_finite() || adjusted <= 0.0 {
            return Err(CarxError::Maintenance(format!(
                "Invalid interval for {}: {}",
                service.as_str(),
                adjusted
            )));
        }

        let km_remaining = adjusted as u64;
        let next_service_km = current_mileage.checked_add(km_remaining).ok_or_else(|| {
            CarxError::Maintenance(format!("Mileage overflow: {}", current_mileage))
        })?;

        let days_remaining = (adjusted / KM_PER_DAY) as i64;
        let next_service_date = today
            .checked_add_signed(Duration::days(days_remaining))
            .ok_or_else(|| CarxError::Maintenance("Service date out of range".to_string()))?;

        Ok(ServiceProjection {
            service_type: service,
            next_service_km,
            next_service_date,
            km_remaining,
            days_remaining,
            weather_factor,
            urgency: UrgencyTier::from_interval(adjusted),
        })
    }

    /// Projections for every service type
    pub fn schedule_all(
        &self,
        current_mileage: u64,
        vehicle_category: VehicleCategory,
        driving_condition: DrivingCondition,
        today: NaiveDate,
    ) -> Result<Vec<ServiceProjection>> {
        ServiceType::ALL
            .into_iter()
            .map(|service| {
                self.next_service_on(
                    service,
                    current_mileage,
                    vehicle_category,
                    driving_condition,
                    today,
                )
            })
            .collect()
    }
}
