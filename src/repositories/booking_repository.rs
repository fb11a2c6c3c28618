//! Repositorio de reservas
//!
//! Contrato de storage para la entidad Booking. La operación crítica es
//! `insert_if_available`: el chequeo de solapamiento y el insert ejecutan en
//! una única transacción, con lock de fila sobre el vehículo, para que dos
//! creates concurrentes sobre intervalos solapados no puedan ganar ambos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingParty, BookingStatus, PaymentStatus, PickupOption,
};
use crate::utils::errors::{internal_error, AppError, AppResult};

/// Contrato del colaborador de storage para reservas
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserta la reserva sólo si ninguna reserva viva del mismo vehículo
    /// solapa el intervalo `[start_time, end_time)`. Atómico: o inserta o
    /// falla con `VehicleUnavailable` sin reservar nada parcialmente.
    async fn insert_if_available(&self, booking: Booking) -> AppResult<Booking>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Persiste la fila completa de la reserva (transición de estado y
    /// bookkeeping monetario en un único update).
    async fn update(&self, booking: &Booking) -> AppResult<()>;

    async fn find_live_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>>;

    async fn count_completed_by_customer(&self, customer_id: Uuid) -> AppResult<i64>;
}

// Fila cruda de la tabla bookings
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    vehicle_id: Uuid,
    customer_id: Option<Uuid>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    payment_status: String,
    total_amount: Decimal,
    security_deposit: Decimal,
    pickup_option: String,
    delivery_address: Option<String>,
    payment_txn_id: Option<String>,
    platform_fee: Option<Decimal>,
    owner_payout: Option<Decimal>,
    created_at: DateTime<Utc>,
}

fn row_to_booking(row: BookingRow) -> AppResult<Booking> {
    let status = BookingStatus::parse(&row.status)
        .ok_or_else(|| internal_error(&format!("unknown booking status '{}'", row.status)))?;
    let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
        internal_error(&format!("unknown payment status '{}'", row.payment_status))
    })?;

    let customer = match row.customer_id {
        Some(customer_id) => BookingParty::Registered { customer_id },
        None => BookingParty::Guest {
            name: row.guest_name.unwrap_or_default(),
            email: row.guest_email.unwrap_or_default(),
            phone: row.guest_phone.unwrap_or_default(),
        },
    };

    let pickup = match row.pickup_option.as_str() {
        "parking" => PickupOption::Parking,
        "delivery" => PickupOption::Delivery {
            address: row
                .delivery_address
                .ok_or_else(|| internal_error("delivery booking without delivery_address"))?,
        },
        other => return Err(internal_error(&format!("unknown pickup_option '{}'", other))),
    };

    Ok(Booking {
        id: row.id,
        vehicle_id: row.vehicle_id,
        customer,
        start_time: row.start_time,
        end_time: row.end_time,
        status,
        payment_status,
        total_amount: row.total_amount,
        security_deposit: row.security_deposit,
        pickup,
        payment_txn_id: row.payment_txn_id,
        platform_fee: row.platform_fee,
        owner_payout: row.owner_payout,
        created_at: row.created_at,
    })
}

fn booking_fields(booking: &Booking) -> (Option<Uuid>, Option<&str>, Option<&str>, Option<&str>) {
    match &booking.customer {
        BookingParty::Registered { customer_id } => (Some(*customer_id), None, None, None),
        BookingParty::Guest { name, email, phone } => {
            (None, Some(name.as_str()), Some(email.as_str()), Some(phone.as_str()))
        }
    }
}

fn pickup_fields(booking: &Booking) -> (&'static str, Option<&str>) {
    match &booking.pickup {
        PickupOption::Parking => ("parking", None),
        PickupOption::Delivery { address } => ("delivery", Some(address.as_str())),
    }
}

/// Implementación PostgreSQL del repositorio de reservas
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_if_available(&self, booking: Booking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock de fila sobre el vehículo: serializa los creates concurrentes
        let vehicle = sqlx::query("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(booking.vehicle_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if vehicle.is_none() {
            return Err(AppError::NotFound(format!(
                "Vehicle with id '{}' not found",
                booking.vehicle_id
            )));
        }

        let (overlaps,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                  AND status NOT IN ('cancelled', 'completed')
                  AND start_time < $3
                  AND end_time > $2
            )
            "#,
        )
        .bind(booking.vehicle_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if overlaps {
            // El drop de tx hace rollback; nada queda reservado
            return Err(AppError::VehicleUnavailable(format!(
                "vehicle '{}' already has a live booking overlapping the interval",
                booking.vehicle_id
            )));
        }

        let (customer_id, guest_name, guest_email, guest_phone) = booking_fields(&booking);
        let (pickup_option, delivery_address) = pickup_fields(&booking);

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings
                (id, vehicle_id, customer_id, guest_name, guest_email, guest_phone,
                 start_time, end_time, status, payment_status, total_amount,
                 security_deposit, pickup_option, delivery_address, payment_txn_id,
                 platform_fee, owner_payout, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.vehicle_id)
        .bind(customer_id)
        .bind(guest_name)
        .bind(guest_email)
        .bind(guest_phone)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.total_amount)
        .bind(booking.security_deposit)
        .bind(pickup_option)
        .bind(delivery_address)
        .bind(&booking.payment_txn_id)
        .bind(booking.platform_fee)
        .bind(booking.owner_payout)
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        row_to_booking(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        row.map(row_to_booking).transpose()
    }

    async fn update(&self, booking: &Booking) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2, payment_status = $3, payment_txn_id = $4,
                platform_fee = $5, owner_payout = $6
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_txn_id)
        .bind(booking.platform_fee)
        .bind(booking.owner_payout)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Booking with id '{}' not found",
                booking.id
            )));
        }
        Ok(())
    }

    async fn find_live_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1 AND status NOT IN ('cancelled', 'completed')
            ORDER BY start_time
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn count_completed_by_customer(&self, customer_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE customer_id = $1 AND status = 'completed'",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count)
    }
}
