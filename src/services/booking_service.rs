//! Máquina de estados de reservas
//!
//! Dueña del ciclo de vida de una reserva: `pending → confirmed → active →
//! completed`, con `cancelled` alcanzable desde `pending` y `confirmed`.
//! Cruza disponibilidad del vehículo, verifica el callback del gateway e
//! invoca el split de comisiones y el ledger de wallet en las transiciones
//! que mueven dinero.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::models::booking::{
    Booking, BookingParty, BookingStatus, CreateBookingRequest, PaymentStatus, PickupOption,
};
use crate::models::user::UserRole;
use crate::models::vehicle::Vehicle;
use crate::repositories::{BookingRepository, UserRepository, VehicleRepository};
use crate::services::authorization_service::{AuthorizationService, BookingAction};
use crate::services::commission_service::CommissionService;
use crate::services::notification_service::{
    NotificationSender, TEMPLATE_BOOKING_CANCELLED, TEMPLATE_BOOKING_CONFIRMED,
    TEMPLATE_PAYMENT_SUCCESS,
};
use crate::services::payment_hash_service::{
    PaymentCallback, PaymentHashService, PaymentRequest,
};
use crate::services::wallet_service::WalletService;
use crate::utils::errors::{
    invalid_transition_error, not_found_error, validation_error, AppError, AppResult,
};
use crate::utils::validation::validate_interval;

/// Máquina de estados del ciclo de vida de reservas
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    users: Arc<dyn UserRepository>,
    wallet: WalletService,
    commission: CommissionService,
    hash: PaymentHashService,
    notifier: Arc<dyn NotificationSender>,
    config: AppConfig,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        users: Arc<dyn UserRepository>,
        wallet: WalletService,
        notifier: Arc<dyn NotificationSender>,
        config: AppConfig,
    ) -> Self {
        let commission = CommissionService::new(config.commission.clone());
        let hash = PaymentHashService::new(config.gateway.clone());
        Self {
            bookings,
            vehicles,
            users,
            wallet,
            commission,
            hash,
            notifier,
            config,
        }
    }

    /// Acceso al protocolo de hash (para construir el redirect de pago)
    pub fn payment_hash(&self) -> &PaymentHashService {
        &self.hash
    }

    /// Construye el request firmado hacia el gateway para una reserva
    /// `pending`. Cada llamada genera un transaction id nuevo: el gateway
    /// exige un txnid fresco por intento de pago.
    pub fn build_payment_redirect(
        &self,
        booking: &Booking,
        firstname: &str,
        email: &str,
        phone: &str,
        surl: &str,
        furl: &str,
    ) -> AppResult<(PaymentRequest, String)> {
        if booking.status != BookingStatus::Pending {
            return Err(invalid_transition_error(
                "request payment for",
                booking.status.as_str(),
            ));
        }

        let request = PaymentRequest {
            txnid: self.hash.generate_txnid(),
            amount: booking.total_amount.to_string(),
            productinfo: format!("Vehicle booking {}", booking.id),
            firstname: firstname.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            surl: surl.to_string(),
            furl: furl.to_string(),
            udf: Default::default(),
        };
        let hash = self.hash.sign(&request);
        Ok((request, hash))
    }

    /// Crea una reserva `pending` si el vehículo admite el intervalo y no
    /// hay reserva viva solapada. No mueve fondos.
    pub async fn create(&self, request: CreateBookingRequest) -> AppResult<Booking> {
        request.validate()?;

        if validate_interval(request.start_time, request.end_time).is_err() {
            return Err(validation_error(
                "end_time",
                "end_time must be strictly after start_time",
            ));
        }

        let pickup = match request.pickup_option.as_str() {
            "parking" => PickupOption::Parking,
            "delivery" => match request.delivery_address.clone() {
                Some(address) if !address.trim().is_empty() => {
                    PickupOption::Delivery { address }
                }
                _ => {
                    return Err(validation_error(
                        "delivery_address",
                        "delivery_address is required for delivery pickup",
                    ))
                }
            },
            _ => {
                return Err(validation_error(
                    "pickup_option",
                    "pickup_option must be 'parking' or 'delivery'",
                ))
            }
        };

        let customer = match request.customer_id {
            Some(customer_id) => {
                let user = self
                    .users
                    .find_by_id(customer_id)
                    .await?
                    .ok_or_else(|| not_found_error("User", &customer_id.to_string()))?;
                AuthorizationService::authorize(user.role, BookingAction::Create)?;
                BookingParty::Registered { customer_id }
            }
            None => match (
                request.guest_name.clone(),
                request.guest_email.clone(),
                request.guest_phone.clone(),
            ) {
                (Some(name), Some(email), Some(phone)) => {
                    BookingParty::Guest { name, email, phone }
                }
                _ => {
                    return Err(validation_error(
                        "guest_name",
                        "guest bookings require guest_name, guest_email and guest_phone",
                    ))
                }
            },
        };

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        if !vehicle.admits_interval(request.start_time, request.end_time) {
            return Err(AppError::VehicleUnavailable(format!(
                "vehicle '{}' does not admit the requested interval",
                vehicle.id
            )));
        }

        let total_amount = self.quote(&vehicle, request.start_time, request.end_time);

        let booking = Booking {
            id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            customer,
            start_time: request.start_time,
            end_time: request.end_time,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_amount,
            security_deposit: request.security_deposit.unwrap_or(Decimal::ZERO),
            pickup,
            payment_txn_id: None,
            platform_fee: None,
            owner_payout: None,
            created_at: Utc::now(),
        };

        // El chequeo de solapamiento y el insert son atómicos en el repo
        let booking = self.bookings.insert_if_available(booking).await?;

        info!(
            booking_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            total = %booking.total_amount,
            "reserva creada en pending"
        );
        Ok(booking)
    }

    /// Procesa el callback del gateway. Idempotente por transaction id: el
    /// replay del mismo callback devuelve la reserva ya confirmada sin
    /// volver a aplicar el split.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        callback: &PaymentCallback,
    ) -> AppResult<Booking> {
        let mut booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        // Dedupe por txnid: el gateway puede reentregar el callback
        if booking.payment_status == PaymentStatus::Paid
            && booking.payment_txn_id.as_deref() == Some(callback.txnid.as_str())
        {
            info!(
                booking_id = %booking.id,
                txnid = %callback.txnid,
                "callback duplicado, split ya aplicado"
            );
            return Ok(booking);
        }

        if booking.status != BookingStatus::Pending {
            return Err(invalid_transition_error(
                "confirm payment for",
                booking.status.as_str(),
            ));
        }

        if !self.hash.verify(callback) {
            booking.payment_status = PaymentStatus::Failed;
            self.bookings.update(&booking).await?;
            warn!(booking_id = %booking.id, txnid = %callback.txnid, "hash del gateway inválido");
            return Err(AppError::PaymentVerificationFailed(
                "gateway hash mismatch".to_string(),
            ));
        }

        // El hash es auténtico, pero el monto firmado debe ser el de la reserva
        let callback_amount: Decimal = callback.amount.parse().map_err(|_| {
            AppError::PaymentVerificationFailed(format!(
                "unparseable callback amount '{}'",
                callback.amount
            ))
        })?;
        if callback_amount != booking.total_amount {
            booking.payment_status = PaymentStatus::Failed;
            self.bookings.update(&booking).await?;
            return Err(AppError::PaymentVerificationFailed(format!(
                "callback amount {} does not match booking total {}",
                callback_amount, booking.total_amount
            )));
        }

        if callback.status != "success" {
            // Pago legítimamente rechazado: la reserva queda retryable
            booking.payment_status = PaymentStatus::Failed;
            self.bookings.update(&booking).await?;
            warn!(
                booking_id = %booking.id,
                gateway_status = %callback.status,
                "el gateway reportó el pago como no exitoso"
            );
            return Ok(booking);
        }

        let split = self.commission.split(booking.total_amount);
        booking.status = BookingStatus::Confirmed;
        booking.payment_status = PaymentStatus::Paid;
        booking.payment_txn_id = Some(callback.txnid.clone());
        booking.platform_fee = Some(split.platform_share);
        booking.owner_payout = Some(split.owner_share);
        // Transición de estado y bookkeeping del split en un único update
        self.bookings.update(&booking).await?;

        info!(
            booking_id = %booking.id,
            txnid = %callback.txnid,
            platform = %split.platform_share,
            owner = %split.owner_share,
            "pago confirmado y split registrado"
        );

        self.notify(&booking, TEMPLATE_PAYMENT_SUCCESS).await;
        self.notify(&booking, TEMPLATE_BOOKING_CONFIRMED).await;
        Ok(booking)
    }

    /// Marca el retiro del vehículo: `confirmed → active`
    pub async fn activate(&self, booking_id: Uuid, requester_role: UserRole) -> AppResult<Booking> {
        AuthorizationService::authorize(requester_role, BookingAction::Activate)?;

        let mut booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        if booking.status != BookingStatus::Confirmed {
            return Err(invalid_transition_error("activate", booking.status.as_str()));
        }

        booking.status = BookingStatus::Active;
        self.bookings.update(&booking).await?;
        info!(booking_id = %booking.id, "reserva activada");
        Ok(booking)
    }

    /// Marca la devolución del vehículo: `active → completed`. La primera
    /// reserva completada de un usuario referido dispara el bono de bienvenida.
    pub async fn complete(&self, booking_id: Uuid, requester_role: UserRole) -> AppResult<Booking> {
        AuthorizationService::authorize(requester_role, BookingAction::Complete)?;

        let mut booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        if booking.status != BookingStatus::Active {
            return Err(invalid_transition_error("complete", booking.status.as_str()));
        }

        booking.status = BookingStatus::Completed;
        self.bookings.update(&booking).await?;
        info!(booking_id = %booking.id, "reserva completada");

        if let Some(customer_id) = booking.customer_id() {
            let completed = self.bookings.count_completed_by_customer(customer_id).await?;
            if completed == 1 {
                let user = self
                    .users
                    .find_by_id(customer_id)
                    .await?
                    .ok_or_else(|| not_found_error("User", &customer_id.to_string()))?;
                if user.referred_by.is_some() {
                    let expires_at =
                        Utc::now() + Duration::days(self.config.referral.reward_expiry_days);
                    self.wallet
                        .credit(
                            customer_id,
                            self.config.referral.first_booking_bonus,
                            "First completed booking bonus",
                            Some(expires_at),
                        )
                        .await?;
                }
            }
        }

        Ok(booking)
    }

    /// Cancela una reserva `pending`/`confirmed` y emite el reembolso según
    /// la antelación al inicio. La reserva cancelada libera el vehículo.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        requester_role: UserRole,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        AuthorizationService::authorize(requester_role, BookingAction::Cancel)?;

        let mut booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(invalid_transition_error("cancel", booking.status.as_str()));
        }

        let refund = self.refund_amount(&booking, now);

        let mut refund_to = None;
        if booking.payment_status == PaymentStatus::Paid && refund > Decimal::ZERO {
            match booking.customer_id() {
                Some(customer_id) => {
                    refund_to = Some(customer_id);
                    booking.payment_status = PaymentStatus::Refunded;
                }
                None => {
                    // Invitados sin wallet: el reembolso se gestiona fuera del core
                    warn!(
                        booking_id = %booking.id,
                        refund = %refund,
                        "reembolso de invitado pendiente de gestión manual"
                    );
                }
            }
        }

        // La transición se persiste antes de mover fondos: un retry sobre una
        // reserva ya cancelada es una transición inválida, nunca un segundo
        // reembolso
        booking.status = BookingStatus::Cancelled;
        self.bookings.update(&booking).await?;

        if let Some(customer_id) = refund_to {
            if let Err(error) = self
                .wallet
                .credit(
                    customer_id,
                    refund,
                    &format!("Refund for cancelled booking {}", booking.id),
                    None,
                )
                .await
            {
                warn!(
                    booking_id = %booking.id,
                    refund = %refund,
                    error = %error,
                    "reembolso no acreditado, queda para conciliación"
                );
            }
        }

        info!(
            booking_id = %booking.id,
            refund = %refund,
            "reserva cancelada"
        );
        self.notify(&booking, TEMPLATE_BOOKING_CANCELLED).await;
        Ok(booking)
    }

    /// Cotiza el intervalo: tarifa por hora para reservas cortas, tarifa por
    /// día (redondeando hacia arriba) desde las 24 horas.
    pub fn quote(&self, vehicle: &Vehicle, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        // Ceil desde segundos: cualquier intervalo válido factura al menos
        // una hora
        let seconds = (end - start).num_seconds().max(0);
        let hours = (seconds + 3599) / 3600;

        if hours >= 24 {
            let days = (hours + 23) / 24;
            vehicle.price_per_day * Decimal::from(days)
        } else {
            vehicle.price_per_hour * Decimal::from(hours)
        }
    }

    /// Reembolso por antelación: más del cutoff alto → total menos fee fijo;
    /// entre ambos cutoffs → fracción configurada; menos del cutoff bajo o
    /// no-show → nada.
    fn refund_amount(&self, booking: &Booking, now: DateTime<Utc>) -> Decimal {
        let policy = &self.config.cancellation;
        let until_start = booking.start_time - now;

        if until_start > Duration::hours(policy.full_refund_cutoff_hours) {
            (booking.total_amount - policy.processing_fee).max(Decimal::ZERO)
        } else if until_start >= Duration::hours(policy.half_refund_cutoff_hours) {
            (booking.total_amount * policy.half_refund_rate)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        }
    }

    // Notificación best-effort: los fallos se loggean, nunca revierten una
    // transición ya comprometida
    async fn notify(&self, booking: &Booking, template: &str) {
        let to = match &booking.customer {
            BookingParty::Registered { customer_id } => {
                match self.users.find_by_id(*customer_id).await {
                    Ok(Some(user)) => user.email,
                    Ok(None) => {
                        warn!(booking_id = %booking.id, "cliente de la reserva no encontrado");
                        return;
                    }
                    Err(e) => {
                        warn!(booking_id = %booking.id, error = %e, "no se pudo resolver el email");
                        return;
                    }
                }
            }
            BookingParty::Guest { email, .. } => email.clone(),
        };

        let mut fields = HashMap::new();
        fields.insert("booking_id".to_string(), booking.id.to_string());
        fields.insert("vehicle_id".to_string(), booking.vehicle_id.to_string());
        fields.insert("status".to_string(), booking.status.as_str().to_string());
        fields.insert("start_time".to_string(), booking.start_time.to_rfc3339());
        fields.insert("end_time".to_string(), booking.end_time.to_rfc3339());
        fields.insert("total_amount".to_string(), booking.total_amount.to_string());

        if !self.notifier.send(&to, template, &fields).await {
            warn!(
                booking_id = %booking.id,
                template = %template,
                "el colaborador de notificaciones rechazó el envío"
            );
        }
    }
}
