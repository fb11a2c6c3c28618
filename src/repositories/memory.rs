//! Storage en memoria
//!
//! Implementación en memoria de todos los contratos de repositorio, usada
//! por los tests. Un único mutex cubre el chequeo de solapamiento y el
//! insert de la reserva, preservando la atomicidad que en PostgreSQL da la
//! transacción con lock de fila.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::booking::{intervals_overlap, Booking, BookingStatus};
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::models::wallet::{NewWalletTransaction, WalletTransaction};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::repositories::wallet_repository::{next_balance, WalletRepository};
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct Inner {
    vehicles: HashMap<Uuid, Vehicle>,
    bookings: HashMap<Uuid, Booking>,
    users: HashMap<Uuid, User>,
    wallet: Vec<WalletTransaction>,
}

/// Store compartido en memoria para tests
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn create(&self, vehicle: Vehicle) -> AppResult<Vehicle> {
        let mut inner = self.inner.lock().await;
        inner.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let inner = self.inner.lock().await;
        Ok(inner.vehicles.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .vehicles
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn set_available(&self, id: Uuid, available: bool) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.vehicles.get_mut(&id) {
            Some(vehicle) => {
                vehicle.available = available;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Vehicle with id '{}' not found",
                id
            ))),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_if_available(&self, booking: Booking) -> AppResult<Booking> {
        // Un solo lock cubre chequeo e insert
        let mut inner = self.inner.lock().await;

        if !inner.vehicles.contains_key(&booking.vehicle_id) {
            return Err(AppError::NotFound(format!(
                "Vehicle with id '{}' not found",
                booking.vehicle_id
            )));
        }

        let overlaps = inner.bookings.values().any(|existing| {
            existing.vehicle_id == booking.vehicle_id
                && existing.is_live()
                && intervals_overlap(
                    booking.start_time,
                    booking.end_time,
                    existing.start_time,
                    existing.end_time,
                )
        });

        if overlaps {
            return Err(AppError::VehicleUnavailable(format!(
                "vehicle '{}' already has a live booking overlapping the interval",
                booking.vehicle_id
            )));
        }

        inner.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn update(&self, booking: &Booking) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.bookings.get_mut(&booking.id) {
            Some(stored) => {
                *stored = booking.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Booking with id '{}' not found",
                booking.id
            ))),
        }
    }

    async fn find_live_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.vehicle_id == vehicle_id && b.is_live())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn count_completed_by_customer(&self, customer_id: Uuid) -> AppResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Completed && b.customer_id() == Some(customer_id)
            })
            .count() as i64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut inner = self.inner.lock().await;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_referral_code(&self, code: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.referral_code.as_deref() == Some(code))
            .cloned())
    }

    async fn set_referral_code(&self, id: Uuid, code: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let user = inner.users.get_mut(&id).ok_or_else(|| {
            AppError::NotFound(format!("User with id '{}' not found", id))
        })?;
        if user.referral_code.is_some() {
            return Err(AppError::AlreadyHasCode(format!(
                "user '{}' already has a referral code",
                id
            )));
        }
        user.referral_code = Some(code.to_string());
        Ok(())
    }

    async fn set_referred_by(&self, id: Uuid, code: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let user = inner.users.get_mut(&id).ok_or_else(|| {
            AppError::NotFound(format!("User with id '{}' not found", id))
        })?;
        if user.referred_by.is_some() {
            return Err(AppError::AlreadyReferred(format!(
                "user '{}' was already referred",
                id
            )));
        }
        user.referred_by = Some(code.to_string());
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for InMemoryStore {
    async fn append(&self, txn: NewWalletTransaction) -> AppResult<WalletTransaction> {
        // Un solo lock cubre la lectura del último balance y el insert
        let mut inner = self.inner.lock().await;

        let previous = inner
            .wallet
            .iter()
            .rev()
            .find(|t| t.user_id == txn.user_id)
            .map(|t| t.balance_after)
            .unwrap_or(Decimal::ZERO);
        let balance_after = next_balance(previous, &txn);

        let stored = WalletTransaction {
            id: Uuid::new_v4(),
            user_id: txn.user_id,
            txn_type: txn.txn_type,
            amount: txn.amount,
            balance_after,
            description: txn.description,
            expires_at: txn.expires_at,
            created_at: Utc::now(),
        };
        inner.wallet.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WalletTransaction>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .wallet
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}
