//! Servicio del ledger de wallet
//!
//! Ledger append-only por usuario con montos firmados por tipo, balance
//! corrido y vencimiento opcional de créditos. El balance usable es un
//! cálculo de lectura (replay del log excluyendo créditos vencidos), nunca
//! un campo almacenado: la expiración no muta el historial.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::wallet::{NewWalletTransaction, WalletTransaction, WalletTxnType};
use crate::repositories::WalletRepository;
use crate::utils::errors::{AppError, AppResult};

/// Servicio del ledger de wallet
#[derive(Clone)]
pub struct WalletService {
    repo: Arc<dyn WalletRepository>,
}

impl WalletService {
    pub fn new(repo: Arc<dyn WalletRepository>) -> Self {
        Self { repo }
    }

    /// Acredita `amount` al usuario, con vencimiento opcional.
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<WalletTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "credit amount must be positive, got {}",
                amount
            )));
        }

        let txn = self
            .repo
            .append(NewWalletTransaction {
                user_id,
                txn_type: WalletTxnType::Credit,
                amount,
                description: description.to_string(),
                expires_at,
            })
            .await?;

        info!(
            user_id = %user_id,
            amount = %amount,
            balance_after = %txn.balance_after,
            "wallet credit aplicado"
        );
        Ok(txn)
    }

    /// Debita `amount` del balance usable del usuario.
    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> AppResult<WalletTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "debit amount must be positive, got {}",
                amount
            )));
        }

        // Los débitos se aplican contra el balance usable (sin vencidos)
        let usable = self.usable_balance(user_id, Utc::now()).await?;
        if usable < amount {
            return Err(AppError::InsufficientBalance(format!(
                "usable balance {} is less than requested {}",
                usable, amount
            )));
        }

        let txn = self
            .repo
            .append(NewWalletTransaction {
                user_id,
                txn_type: WalletTxnType::Debit,
                amount,
                description: description.to_string(),
                expires_at: None,
            })
            .await?;

        info!(
            user_id = %user_id,
            amount = %amount,
            balance_after = %txn.balance_after,
            "wallet debit aplicado"
        );
        Ok(txn)
    }

    /// Balance usable: créditos no vencidos menos débitos, replay en orden
    /// de creación.
    pub async fn usable_balance(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Decimal> {
        let txns = self.repo.list_by_user(user_id).await?;
        let balance = txns.iter().fold(Decimal::ZERO, |acc, txn| match txn.txn_type {
            WalletTxnType::Credit if !txn.is_expired(now) => acc + txn.amount,
            WalletTxnType::Credit => acc,
            WalletTxnType::Debit => acc - txn.amount,
        });
        Ok(balance)
    }

    /// Créditos cuyo vencimiento cae dentro de `(now, now + window]`;
    /// usado para avisar al usuario antes de que pierda el crédito.
    pub async fn expiring_soon(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        window: Duration,
    ) -> AppResult<Vec<WalletTransaction>> {
        let txns = self.repo.list_by_user(user_id).await?;
        Ok(txns
            .into_iter()
            .filter(|txn| {
                txn.txn_type == WalletTxnType::Credit && txn.expires_within(now, window)
            })
            .collect())
    }

    /// Historial completo del usuario en orden de creación
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<WalletTransaction>> {
        self.repo.list_by_user(user_id).await
    }
}
