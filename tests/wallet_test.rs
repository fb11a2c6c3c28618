//! Tests de integración del ledger de wallet

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::create_test_app;
use vehicle_rental::models::wallet::WalletTxnType;
use vehicle_rental::utils::errors::AppError;

#[tokio::test]
async fn test_credit_and_debit_running_balance() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();

    let credit = app
        .wallet
        .credit(user_id, Decimal::new(20000, 2), "signup bonus", None)
        .await
        .unwrap();
    assert_eq!(credit.balance_after, Decimal::new(20000, 2));

    let debit = app
        .wallet
        .debit(user_id, Decimal::new(7500, 2), "applied to booking")
        .await
        .unwrap();
    assert_eq!(debit.balance_after, Decimal::new(12500, 2));

    let balance = app.wallet.usable_balance(user_id, Utc::now()).await.unwrap();
    assert_eq!(balance, Decimal::new(12500, 2));
}

#[tokio::test]
async fn test_rejects_non_positive_amounts() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();

    let err = app
        .wallet
        .credit(user_id, Decimal::ZERO, "nothing", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(_)));

    let err = app
        .wallet
        .credit(user_id, Decimal::new(-100, 2), "negative", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(_)));

    let err = app
        .wallet
        .debit(user_id, Decimal::ZERO, "nothing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(_)));
}

#[tokio::test]
async fn test_debit_checks_usable_balance() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();

    app.wallet
        .credit(user_id, Decimal::new(5000, 2), "small credit", None)
        .await
        .unwrap();

    let err = app
        .wallet
        .debit(user_id, Decimal::new(10000, 2), "too much")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
}

#[tokio::test]
async fn test_expired_credits_do_not_count() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    app.wallet
        .credit(user_id, Decimal::new(10000, 2), "permanent", None)
        .await
        .unwrap();
    app.wallet
        .credit(
            user_id,
            Decimal::new(5000, 2),
            "expiring reward",
            Some(now + Duration::days(1)),
        )
        .await
        .unwrap();

    // Antes del vencimiento cuentan ambos créditos
    let balance = app.wallet.usable_balance(user_id, now).await.unwrap();
    assert_eq!(balance, Decimal::new(15000, 2));

    // Después del vencimiento el crédito expirado deja de contar, sin
    // mutación alguna del historial
    let later = now + Duration::days(2);
    let balance = app.wallet.usable_balance(user_id, later).await.unwrap();
    assert_eq!(balance, Decimal::new(10000, 2));

    let history = app.wallet.history(user_id).await.unwrap();
    assert_eq!(history.len(), 2);

    // Un débito mayor al usable (pero menor al balance crudo) es rechazado
    let err = app
        .wallet
        .debit(user_id, Decimal::new(12000, 2), "overdraw")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
}

#[tokio::test]
async fn test_ledger_replay_reconstructs_balance_after() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();

    app.wallet
        .credit(user_id, Decimal::new(10000, 2), "c1", None)
        .await
        .unwrap();
    app.wallet
        .credit(user_id, Decimal::new(2550, 2), "c2", None)
        .await
        .unwrap();
    app.wallet
        .debit(user_id, Decimal::new(4000, 2), "d1")
        .await
        .unwrap();
    app.wallet
        .credit(user_id, Decimal::new(125, 2), "c3", None)
        .await
        .unwrap();

    let history = app.wallet.history(user_id).await.unwrap();
    let mut replayed = Decimal::ZERO;
    for txn in &history {
        replayed = match txn.txn_type {
            WalletTxnType::Credit => replayed + txn.amount,
            WalletTxnType::Debit => replayed - txn.amount,
        };
        assert_eq!(replayed, txn.balance_after);
    }
    assert_eq!(replayed, history.last().unwrap().balance_after);
}

#[tokio::test]
async fn test_concurrent_credits_keep_ledger_consistent() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();

    // Créditos concurrentes sobre el mismo ledger: cada balance_after debe
    // encadenar sobre el anterior, nunca sobre un snapshot viejo
    let mut handles = Vec::new();
    for _ in 0..50 {
        let wallet = app.wallet.clone();
        handles.push(tokio::spawn(async move {
            wallet
                .credit(user_id, Decimal::new(100, 2), "concurrent credit", None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let history = app.wallet.history(user_id).await.unwrap();
    assert_eq!(history.len(), 50);

    let mut replayed = Decimal::ZERO;
    for txn in &history {
        replayed += txn.amount;
        assert_eq!(replayed, txn.balance_after);
    }
    assert_eq!(replayed, Decimal::new(5000, 2));

    let balance = app.wallet.usable_balance(user_id, Utc::now()).await.unwrap();
    assert_eq!(balance, Decimal::new(5000, 2));
}

#[tokio::test]
async fn test_expiring_soon_window() {
    let app = create_test_app().await;
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    app.wallet
        .credit(user_id, Decimal::new(1000, 2), "no expiry", None)
        .await
        .unwrap();
    app.wallet
        .credit(
            user_id,
            Decimal::new(2000, 2),
            "expires in 3 days",
            Some(now + Duration::days(3)),
        )
        .await
        .unwrap();
    app.wallet
        .credit(
            user_id,
            Decimal::new(3000, 2),
            "expires in 30 days",
            Some(now + Duration::days(30)),
        )
        .await
        .unwrap();

    let soon = app
        .wallet
        .expiring_soon(user_id, now, Duration::days(7))
        .await
        .unwrap();
    assert_eq!(soon.len(), 1);
    assert_eq!(soon[0].description, "expires in 3 days");
}
