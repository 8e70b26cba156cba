//! User profile and vehicle records
//!
//! v2.0.0: Vehicles carry a maintenance schedule that is recomputed whenever
//! the mileage or the make changes. The make decides the vehicle category.

use crate::cost::QualityTier;
use crate::error::{CarxError, Result};
use crate::language::Language;
use crate::maintenance::{
    DrivingCondition, MaintenanceScheduler, ServiceProjection, ServiceType, UrgencyTier,
    VehicleCategory,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The first production automobile
const EARLIEST_MODEL_YEAR: i32 = 1886;

/// How many upcoming services a reminder lists per vehicle
const REMINDERS_PER_VEHICLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStyle {
    Economic,
    #[default]
    Standard,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Preferences {
    pub preferred_shops: Vec<String>,
    pub parts_quality: QualityTier,
    pub notification: NotificationChannel,
    pub maintenance_style: MaintenanceStyle,
}

/// Input for adding a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VehicleDetails {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u64,
    #[serde(default)]
    pub last_service: Option<NaiveDate>,
    #[serde(default)]
    pub driving_condition: DrivingCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u64,
    pub last_service: Option<NaiveDate>,
    pub driving_condition: DrivingCondition,
    pub maintenance_schedule: BTreeMap<ServiceType, ServiceProjection>,
    pub known_issues: Vec<String>,
}

impl VehicleRecord {
    pub fn category(&self) -> VehicleCategory {
        VehicleCategory::for_make(&self.make)
    }

    fn recompute_schedule(&mut self, today: NaiveDate) -> Result<()> {
        let scheduler = MaintenanceScheduler::new();
        let projections =
            scheduler.schedule_all(self.mileage, self.category(), self.driving_condition, today)?;
        self.maintenance_schedule = projections
            .into_iter()
            .map(|p| (p.service_type, p))
            .collect();
        Ok(())
    }

    /// Upcoming services, soonest first
    pub fn upcoming(&self) -> Vec<&ServiceProjection> {
        let mut items: Vec<&ServiceProjection> = self.maintenance_schedule.values().collect();
        items.sort_by_key(|p| (p.km_remaining, p.service_type));
        items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub vehicles: BTreeMap<String, VehicleRecord>,
    pub preferences: Preferences,
}

impl UserProfile {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            vehicles: BTreeMap::new(),
            preferences: Preferences::default(),
        }
    }

    /// Add or replace a vehicle and compute its schedule
    pub fn add_vehicle(
        &mut self,
        vehicle_id: &str,
        details: VehicleDetails,
        today: NaiveDate,
    ) -> Result<()> {
        if vehicle_id.trim().is_empty() {
            return Err(CarxError::UserProfile("Vehicle id must not be empty".to_string()));
        }
        if details.year < EARLIEST_MODEL_YEAR || details.year > today.year() + 1 {
            return Err(CarxError::UserProfile(format!(
                "Invalid model year {} for {}",
                details.year, vehicle_id
            )));
        }

        let mut record = VehicleRecord {
            make: details.make,
            model: details.model,
            year: details.year,
            mileage: details.mileage,
            last_service: details.last_service,
            driving_condition: details.driving_condition,
            maintenance_schedule: BTreeMap::new(),
            known_issues: Vec::new(),
        };
        record
            .recompute_schedule(today)
            .map_err(|e| CarxError::UserProfile(format!("Error adding vehicle: {}", e)))?;

        tracing::info!("Vehicle {} added for {}", vehicle_id, self.username);
        self.vehicles.insert(vehicle_id.to_string(), record);
        Ok(())
    }

    fn vehicle_mut(&mut self, vehicle_id: &str) -> Result<&mut VehicleRecord> {
        self.vehicles
            .get_mut(vehicle_id)
            .ok_or_else(|| CarxError::UserProfile(format!("Unknown vehicle: {}", vehicle_id)))
    }

    /// Odometers only go forward
    pub fn update_mileage(
        &mut self,
        vehicle_id: &str,
        mileage: u64,
        today: NaiveDate,
    ) -> Result<()> {
        let vehicle = self.vehicle_mut(vehicle_id)?;
        if mileage < vehicle.mileage {
            return Err(CarxError::UserProfile(format!(
                "Mileage cannot go back from {} to {}",
                vehicle.mileage, mileage
            )));
        }
        vehicle.mileage = mileage;
        vehicle.recompute_schedule(today)
    }

    pub fn set_make(&mut self, vehicle_id: &str, make: &str, today: NaiveDate) -> Result<()> {
        let vehicle = self.vehicle_mut(vehicle_id)?;
        vehicle.make = make.to_string();
        vehicle.recompute_schedule(today)
    }

    pub fn record_issue(&mut self, vehicle_id: &str, issue: &str) -> Result<()> {
        let vehicle = self.vehicle_mut(vehicle_id)?;
        vehicle.known_issues.push(issue.to_string());
        Ok(())
    }

    /// True if any vehicle has a service that is not "normal" urgency
    pub fn has_due_services(&self) -> bool {
        self.vehicles
            .values()
            .flat_map(|v| v.maintenance_schedule.values())
            .any(|p| p.urgency != UrgencyTier::Normal)
    }

    /// One line per upcoming service, a few per vehicle
    pub fn maintenance_reminders(&self, lang: Language) -> Vec<String> {
        let mut lines = Vec::new();
        for (id, vehicle) in &self.vehicles {
            for projection in vehicle.upcoming().into_iter().take(REMINDERS_PER_VEHICLE) {
                lines.push(format!(
                    "{} {} ({}): {}",
                    vehicle.make,
                    vehicle.model,
                    id,
                    projection.summary(lang)
                ));
            }
        }
        lines
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new("guest")
    }
}
