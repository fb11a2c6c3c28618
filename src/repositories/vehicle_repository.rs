//! Repositorio de vehículos
//!
//! Contrato de storage para la entidad Vehicle y su implementación
//! PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::{AvailabilityMode, Vehicle, VehicleType};
use crate::utils::errors::{internal_error, AppError, AppResult};

/// Contrato del colaborador de storage para vehículos
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: Vehicle) -> AppResult<Vehicle>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>>;

    async fn set_available(&self, id: Uuid, available: bool) -> AppResult<()>;
}

// Fila cruda de la tabla vehicles
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    owner_id: Uuid,
    vehicle_type: String,
    availability_mode: String,
    available_from: Option<NaiveTime>,
    available_to: Option<NaiveTime>,
    available: bool,
    price_per_hour: Decimal,
    price_per_day: Decimal,
    image_keys: Vec<String>,
    created_at: DateTime<Utc>,
}

fn row_to_vehicle(row: VehicleRow) -> AppResult<Vehicle> {
    let vehicle_type = VehicleType::parse(&row.vehicle_type)
        .ok_or_else(|| internal_error(&format!("unknown vehicle_type '{}'", row.vehicle_type)))?;

    let availability = match row.availability_mode.as_str() {
        "always" => AvailabilityMode::Always,
        "specific_hours" => {
            let from = row
                .available_from
                .ok_or_else(|| internal_error("specific_hours row without available_from"))?;
            let to = row
                .available_to
                .ok_or_else(|| internal_error("specific_hours row without available_to"))?;
            AvailabilityMode::SpecificHours { from, to }
        }
        other => {
            return Err(internal_error(&format!(
                "unknown availability_mode '{}'",
                other
            )))
        }
    };

    Ok(Vehicle {
        id: row.id,
        owner_id: row.owner_id,
        vehicle_type,
        availability,
        available: row.available,
        price_per_hour: row.price_per_hour,
        price_per_day: row.price_per_day,
        image_keys: row.image_keys,
        created_at: row.created_at,
    })
}

/// Implementación PostgreSQL del repositorio de vehículos
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, vehicle: Vehicle) -> AppResult<Vehicle> {
        let (mode, from, to) = match &vehicle.availability {
            AvailabilityMode::Always => ("always", None, None),
            AvailabilityMode::SpecificHours { from, to } => {
                ("specific_hours", Some(*from), Some(*to))
            }
        };

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles
                (id, owner_id, vehicle_type, availability_mode, available_from,
                 available_to, available, price_per_hour, price_per_day, image_keys, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.owner_id)
        .bind(vehicle.vehicle_type.as_str())
        .bind(mode)
        .bind(from)
        .bind(to)
        .bind(vehicle.available)
        .bind(vehicle.price_per_hour)
        .bind(vehicle.price_per_day)
        .bind(&vehicle.image_keys)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row_to_vehicle(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        row.map(row_to_vehicle).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        rows.into_iter().map(row_to_vehicle).collect()
    }

    async fn set_available(&self, id: Uuid, available: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE vehicles SET available = $2 WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Vehicle with id '{}' not found",
                id
            )));
        }
        Ok(())
    }
}
