//! Tests de integración del motor de referidos

mod common;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{booking_request, create_test_app, paid_callback, seed_user, seed_vehicle};
use vehicle_rental::models::user::UserRole;
use vehicle_rental::repositories::UserRepository;
use vehicle_rental::utils::errors::AppError;

#[tokio::test]
async fn test_generate_code_once() {
    let app = create_test_app().await;
    let user = seed_user(&app, UserRole::Customer, "ana@example.com").await;

    let code = app.referrals.generate_code(user.id).await.unwrap();
    assert_eq!(code.len(), app.config.referral.code_length);

    let stored = UserRepository::find_by_id(app.store.as_ref(), user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.referral_code, Some(code));

    let err = app.referrals.generate_code(user.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyHasCode(_)));
}

#[tokio::test]
async fn test_apply_code_credits_referrer_once() {
    let app = create_test_app().await;
    let referrer = seed_user(&app, UserRole::Customer, "referrer@example.com").await;
    let referred = seed_user(&app, UserRole::Customer, "referred@example.com").await;

    let code = app.referrals.generate_code(referrer.id).await.unwrap();

    let txn = app.referrals.apply_code(referred.id, &code).await.unwrap();
    assert_eq!(txn.user_id, referrer.id);
    assert_eq!(txn.amount, app.config.referral.reward_amount);

    // La recompensa vence ~90 días después
    let expires_at = txn.expires_at.unwrap();
    let days_out = (expires_at - Utc::now()).num_days();
    assert!((89..=90).contains(&days_out));

    let stored = UserRepository::find_by_id(app.store.as_ref(), referred.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.referred_by, Some(code.clone()));

    // Reaplicar cualquier código a una cuenta ya referida falla
    let other = seed_user(&app, UserRole::Customer, "other@example.com").await;
    let other_code = app.referrals.generate_code(other.id).await.unwrap();
    let err = app
        .referrals
        .apply_code(referred.id, &other_code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyReferred(_)));

    // El referente fue acreditado exactamente una vez
    let history = app.wallet.history(referrer.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_self_referral_is_rejected() {
    let app = create_test_app().await;
    let user = seed_user(&app, UserRole::Customer, "ana@example.com").await;
    let code = app.referrals.generate_code(user.id).await.unwrap();

    let err = app.referrals.apply_code(user.id, &code).await.unwrap_err();
    assert!(matches!(err, AppError::SelfReferral(_)));

    let stored = UserRepository::find_by_id(app.store.as_ref(), user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.referred_by, None);
}

#[tokio::test]
async fn test_unknown_code_is_rejected() {
    let app = create_test_app().await;
    let user = seed_user(&app, UserRole::Customer, "ana@example.com").await;

    let err = app
        .referrals
        .apply_code(user.id, "NOSUCHCODE1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCode(_)));

    // Formato inválido también es InvalidCode
    let err = app.referrals.apply_code(user.id, "bad code").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCode(_)));
}

#[tokio::test]
async fn test_first_completed_booking_bonus_for_referred_customer() {
    let app = create_test_app().await;
    let referrer = seed_user(&app, UserRole::Customer, "referrer@example.com").await;
    let referred = seed_user(&app, UserRole::Customer, "referred@example.com").await;

    let code = app.referrals.generate_code(referrer.id).await.unwrap();
    app.referrals.apply_code(referred.id, &code).await.unwrap();

    let vehicle = seed_vehicle(&app, Decimal::new(10000, 2)).await;
    let start = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();

    let booking = app
        .bookings
        .create(booking_request(vehicle.id, referred.id, start, end))
        .await
        .unwrap();
    let callback = paid_callback(&app, &booking, "TXN-BONUS-1");
    app.bookings.confirm_payment(booking.id, &callback).await.unwrap();
    app.bookings.activate(booking.id, UserRole::Owner).await.unwrap();
    app.bookings.complete(booking.id, UserRole::Owner).await.unwrap();

    // El referido recibe el bono por su primera reserva completada
    let history = app.wallet.history(referred.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, app.config.referral.first_booking_bonus);
    assert!(history[0].expires_at.is_some());

    // Una segunda reserva completada no vuelve a emitir el bono
    let start2 = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
    let end2 = Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap();
    let booking2 = app
        .bookings
        .create(booking_request(vehicle.id, referred.id, start2, end2))
        .await
        .unwrap();
    let callback2 = paid_callback(&app, &booking2, "TXN-BONUS-2");
    app.bookings.confirm_payment(booking2.id, &callback2).await.unwrap();
    app.bookings.activate(booking2.id, UserRole::Owner).await.unwrap();
    app.bookings.complete(booking2.id, UserRole::Owner).await.unwrap();

    let history = app.wallet.history(referred.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_non_referred_customer_gets_no_bonus() {
    let app = create_test_app().await;
    let customer = seed_user(&app, UserRole::Customer, "solo@example.com").await;
    let vehicle = seed_vehicle(&app, Decimal::new(10000, 2)).await;

    let start = Utc.with_ymd_and_hms(2024, 9, 5, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 9, 5, 12, 0, 0).unwrap();
    let booking = app
        .bookings
        .create(booking_request(vehicle.id, customer.id, start, end))
        .await
        .unwrap();
    let callback = paid_callback(&app, &booking, "TXN-NOBONUS-1");
    app.bookings.confirm_payment(booking.id, &callback).await.unwrap();
    app.bookings.activate(booking.id, UserRole::Owner).await.unwrap();
    app.bookings.complete(booking.id, UserRole::Owner).await.unwrap();

    let history = app.wallet.history(customer.id).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_referral_writes_for_unknown_user_are_not_found() {
    let app = create_test_app().await;

    // Usuario inexistente es NotFound, no un conflicto de código
    let err = UserRepository::set_referral_code(app.store.as_ref(), Uuid::new_v4(), "AB12CD34")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = UserRepository::set_referred_by(app.store.as_ref(), Uuid::new_v4(), "AB12CD34")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_apply_code_to_unknown_user() {
    let app = create_test_app().await;
    let referrer = seed_user(&app, UserRole::Customer, "referrer@example.com").await;
    let code = app.referrals.generate_code(referrer.id).await.unwrap();

    let err = app
        .referrals
        .apply_code(Uuid::new_v4(), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
