//! Repositorio del ledger de wallet
//!
//! El contrato es append-only: no hay update ni delete. El orden de creación
//! es el orden de replay del ledger. El repositorio es además quien calcula
//! `balance_after`: la lectura del último balance y el insert del movimiento
//! ejecutan bajo el mismo lock, así dos appends concurrentes del mismo
//! usuario nunca encadenan sobre el mismo snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::wallet::{NewWalletTransaction, WalletTransaction, WalletTxnType};
use crate::utils::errors::{internal_error, AppError, AppResult};

/// Contrato del colaborador de storage para el ledger de wallet
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Inserta un movimiento calculando `balance_after` a partir de la última
    /// fila del usuario. Atómico frente a otros appends del mismo usuario;
    /// las filas nunca se mutan después.
    async fn append(&self, txn: NewWalletTransaction) -> AppResult<WalletTransaction>;

    /// Movimientos de un usuario en orden de creación
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WalletTransaction>>;
}

/// Balance tras aplicar el movimiento sobre el balance corrido previo
pub fn next_balance(previous: Decimal, txn: &NewWalletTransaction) -> Decimal {
    match txn.txn_type {
        WalletTxnType::Credit => previous + txn.amount,
        WalletTxnType::Debit => previous - txn.amount,
    }
}

// Fila cruda de la tabla wallet_transactions
#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    user_id: Uuid,
    txn_type: String,
    amount: Decimal,
    balance_after: Decimal,
    description: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn row_to_txn(row: WalletRow) -> AppResult<WalletTransaction> {
    let txn_type = WalletTxnType::parse(&row.txn_type)
        .ok_or_else(|| internal_error(&format!("unknown wallet txn type '{}'", row.txn_type)))?;

    Ok(WalletTransaction {
        id: row.id,
        user_id: row.user_id,
        txn_type,
        amount: row.amount,
        balance_after: row.balance_after,
        description: row.description,
        expires_at: row.expires_at,
        created_at: row.created_at,
    })
}

/// Implementación PostgreSQL del ledger de wallet
pub struct PgWalletRepository {
    pool: PgPool,
}

impl PgWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PgWalletRepository {
    async fn append(&self, txn: NewWalletTransaction) -> AppResult<WalletTransaction> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock advisory por usuario: serializa el read-compute-insert frente
        // a appends concurrentes sobre el mismo ledger
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(txn.user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let last: Option<(Decimal,)> = sqlx::query_as(
            r#"
            SELECT balance_after FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(txn.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let previous = last.map(|(balance,)| balance).unwrap_or(Decimal::ZERO);
        let balance_after = next_balance(previous, &txn);

        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallet_transactions
                (id, user_id, txn_type, amount, balance_after, description, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(txn.user_id)
        .bind(txn.txn_type.as_str())
        .bind(txn.amount)
        .bind(balance_after)
        .bind(&txn.description)
        .bind(txn.expires_at)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        row_to_txn(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WalletTransaction>> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT * FROM wallet_transactions WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        rows.into_iter().map(row_to_txn).collect()
    }
}
