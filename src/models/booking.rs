//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking, sus enums de estado y el
//! test de solapamiento de intervalos usado para evitar double-booking.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Estado del ciclo de vida de una reserva
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Una reserva viva sigue ocupando el vehículo en el test de solapamiento
    pub fn is_live(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

/// Estado del pago asociado a la reserva
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Opción de retiro del vehículo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "option", rename_all = "lowercase")]
pub enum PickupOption {
    /// El cliente retira el vehículo en el parking del owner
    Parking,
    /// El vehículo se entrega en la dirección indicada
    Delivery { address: String },
}

/// Quién realiza la reserva: un usuario registrado o un invitado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BookingParty {
    Registered {
        customer_id: Uuid,
    },
    Guest {
        name: String,
        email: String,
        phone: String,
    },
}

impl BookingParty {
    pub fn customer_id(&self) -> Option<Uuid> {
        match self {
            BookingParty::Registered { customer_id } => Some(*customer_id),
            BookingParty::Guest { .. } => None,
        }
    }

    pub fn guest_email(&self) -> Option<&str> {
        match self {
            BookingParty::Registered { .. } => None,
            BookingParty::Guest { email, .. } => Some(email),
        }
    }
}

/// Booking principal del marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer: BookingParty,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub security_deposit: Decimal,
    pub pickup: PickupOption,
    /// Transaction id del gateway; clave de idempotencia del callback
    pub payment_txn_id: Option<String>,
    /// Parte de la plataforma del split de comisión, fijada al confirmar el pago
    pub platform_fee: Option<Decimal>,
    /// Parte del owner del split de comisión, fijada al confirmar el pago
    pub owner_payout: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        self.customer.customer_id()
    }
}

/// Test de solapamiento de intervalos semiabiertos [start, end)
pub fn intervals_overlap(
    new_start: DateTime<Utc>,
    new_end: DateTime<Utc>,
    existing_start: DateTime<Utc>,
    existing_end: DateTime<Utc>,
) -> bool {
    new_start < existing_end && existing_start < new_end
}

/// Request para crear una reserva
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,

    /// "parking" o "delivery"
    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub pickup_option: String,

    /// Requerida si y sólo si pickup_option es "delivery"
    pub delivery_address: Option<String>,

    /// Usuario registrado; None para reservas de invitado
    pub customer_id: Option<Uuid>,

    pub guest_name: Option<String>,

    #[validate(email)]
    pub guest_email: Option<String>,

    pub guest_phone: Option<String>,

    pub security_deposit: Option<Decimal>,
}

/// Response de reserva para la API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub vehicle_id: String,
    pub status: String,
    pub payment_status: String,
    pub start_time: String,
    pub end_time: String,
    pub total_amount: String,
    pub security_deposit: String,
    pub platform_fee: Option<String>,
    pub owner_payout: Option<String>,
    pub created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            vehicle_id: booking.vehicle_id.to_string(),
            status: booking.status.as_str().to_string(),
            payment_status: booking.payment_status.as_str().to_string(),
            start_time: booking.start_time.to_rfc3339(),
            end_time: booking.end_time.to_rfc3339(),
            total_amount: booking.total_amount.to_string(),
            security_deposit: booking.security_deposit.to_string(),
            platform_fee: booking.platform_fee.map(|f| f.to_string()),
            owner_payout: booking.owner_payout.map(|p| p.to_string()),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}
