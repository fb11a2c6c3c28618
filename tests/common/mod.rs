//! Harness compartido de los tests de integración
//!
//! Construye los servicios del core sobre el store en memoria.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use vehicle_rental::config::AppConfig;
use vehicle_rental::models::booking::{Booking, CreateBookingRequest};
use vehicle_rental::models::user::{User, UserRole};
use vehicle_rental::models::vehicle::{AvailabilityMode, Vehicle, VehicleType};
use vehicle_rental::repositories::{
    BookingRepository, InMemoryStore, UserRepository, VehicleRepository, WalletRepository,
};
use vehicle_rental::services::{
    BookingService, LogNotifier, PaymentCallback, ReferralService, WalletService,
};

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub bookings: BookingService,
    pub referrals: ReferralService,
    pub wallet: WalletService,
    pub config: AppConfig,
}

pub async fn create_test_app() -> TestApp {
    vehicle_rental::utils::init_tracing();

    let store = Arc::new(InMemoryStore::new());
    let config = AppConfig::default();

    let wallet = WalletService::new(store.clone() as Arc<dyn WalletRepository>);
    let bookings = BookingService::new(
        store.clone() as Arc<dyn BookingRepository>,
        store.clone() as Arc<dyn VehicleRepository>,
        store.clone() as Arc<dyn UserRepository>,
        wallet.clone(),
        Arc::new(LogNotifier),
        config.clone(),
    );
    let referrals = ReferralService::new(
        store.clone() as Arc<dyn UserRepository>,
        wallet.clone(),
        config.referral.clone(),
    );

    TestApp {
        store,
        bookings,
        referrals,
        wallet,
        config,
    }
}

/// Vehículo siempre disponible con la tarifa horaria indicada
pub async fn seed_vehicle(app: &TestApp, price_per_hour: Decimal) -> Vehicle {
    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        vehicle_type: VehicleType::Car,
        availability: AvailabilityMode::Always,
        available: true,
        price_per_hour,
        price_per_day: price_per_hour * Decimal::from(16),
        image_keys: vec![],
        created_at: Utc::now(),
    };
    VehicleRepository::create(app.store.as_ref(), vehicle)
        .await
        .unwrap()
}

pub async fn seed_user(app: &TestApp, role: UserRole, email: &str) -> User {
    let user = User::new(role, "Test User", email);
    UserRepository::create(app.store.as_ref(), user)
        .await
        .unwrap()
}

pub fn booking_request(
    vehicle_id: Uuid,
    customer_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> CreateBookingRequest {
    CreateBookingRequest {
        vehicle_id,
        start_time: start,
        end_time: end,
        pickup_option: "parking".to_string(),
        delivery_address: None,
        customer_id: Some(customer_id),
        guest_name: None,
        guest_email: None,
        guest_phone: None,
        security_deposit: None,
    }
}

/// Callback de pago exitoso con el hash válido del gateway
pub fn paid_callback(app: &TestApp, booking: &Booking, txnid: &str) -> PaymentCallback {
    let mut callback = PaymentCallback {
        txnid: txnid.to_string(),
        amount: booking.total_amount.to_string(),
        productinfo: "Vehicle booking".to_string(),
        firstname: "Test".to_string(),
        email: "customer@example.com".to_string(),
        status: "success".to_string(),
        udf: Default::default(),
        hash: String::new(),
    };
    callback.hash = app.bookings.payment_hash().response_hash(&callback);
    callback
}
