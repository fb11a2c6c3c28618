//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su modo de disponibilidad
//! y las variantes request/response para CRUD operations.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de vehículo publicado en el marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "car" => Some(VehicleType::Car),
            "bike" => Some(VehicleType::Bike),
            _ => None,
        }
    }
}

/// Modo de disponibilidad del vehículo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AvailabilityMode {
    /// Reservable a cualquier hora
    Always,
    /// Reservable sólo dentro de una ventana horaria diaria
    SpecificHours { from: NaiveTime, to: NaiveTime },
}

/// Vehicle principal del marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub vehicle_type: VehicleType,
    pub availability: AvailabilityMode,
    pub available: bool,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    /// Keys de imágenes en el blob storage
    pub image_keys: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Determina si el modo de disponibilidad admite el intervalo solicitado.
    ///
    /// Un vehículo con `available = false` es inreservable para cualquier
    /// intervalo; con `specific_hours` el intervalo completo debe caber en
    /// la ventana de un mismo día: cualquier intervalo que cruce el cierre
    /// nocturno queda afuera, aunque sus extremos caigan dentro de la ventana.
    pub fn admits_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if !self.available {
            return false;
        }
        match &self.availability {
            AvailabilityMode::Always => true,
            AvailabilityMode::SpecificHours { from, to } => {
                from < to
                    && start.date_naive() == end.date_naive()
                    && start.time() >= *from
                    && end.time() <= *to
            }
        }
    }
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub owner_id: String,
    pub vehicle_type: String,
    pub available: bool,
    pub price_per_hour: String,
    pub price_per_day: String,
    pub created_at: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            owner_id: vehicle.owner_id.to_string(),
            vehicle_type: vehicle.vehicle_type.as_str().to_string(),
            available: vehicle.available,
            price_per_hour: vehicle.price_per_hour.to_string(),
            price_per_day: vehicle.price_per_day.to_string(),
            created_at: vehicle.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vehicle_with(availability: AvailabilityMode, available: bool) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            vehicle_type: VehicleType::Car,
            availability,
            available,
            price_per_hour: Decimal::new(25000, 2),
            price_per_day: Decimal::new(400000, 2),
            image_keys: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_always_mode_admits_any_interval() {
        let vehicle = vehicle_with(AvailabilityMode::Always, true);
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 11, 2, 0, 0).unwrap();
        assert!(vehicle.admits_interval(start, end));
    }

    #[test]
    fn test_unavailable_vehicle_admits_nothing() {
        let vehicle = vehicle_with(AvailabilityMode::Always, false);
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap();
        assert!(!vehicle.admits_interval(start, end));
    }

    #[test]
    fn test_specific_hours_window() {
        let vehicle = vehicle_with(
            AvailabilityMode::SpecificHours {
                from: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                to: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            },
            true,
        );
        let inside_start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let inside_end = Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap();
        assert!(vehicle.admits_interval(inside_start, inside_end));

        let early_start = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        assert!(!vehicle.admits_interval(early_start, inside_end));

        let late_end = Utc.with_ymd_and_hms(2024, 1, 10, 22, 0, 0).unwrap();
        assert!(!vehicle.admits_interval(inside_start, late_end));
    }

    #[test]
    fn test_specific_hours_rejects_interval_crossing_closure() {
        let vehicle = vehicle_with(
            AvailabilityMode::SpecificHours {
                from: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                to: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            },
            true,
        );

        // Extremos dentro de la ventana pero el intervalo cruza el cierre
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 11, 14, 0, 0).unwrap();
        assert!(!vehicle.admits_interval(start, end));

        // Lo mismo para un intervalo que abarca varios días completos
        let far_end = Utc.with_ymd_and_hms(2024, 1, 13, 19, 0, 0).unwrap();
        assert!(!vehicle.admits_interval(start, far_end));
    }
}
