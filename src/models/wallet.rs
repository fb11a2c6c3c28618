//! Modelo de WalletTransaction
//!
//! El ledger de wallet es append-only: las filas nunca se actualizan ni se
//! borran después de insertadas. La expiración de créditos es un filtro de
//! lectura, no una mutación del historial.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de movimiento en el ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalletTxnType {
    Credit,
    Debit,
}

impl WalletTxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTxnType::Credit => "credit",
            WalletTxnType::Debit => "debit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "credit" => Some(WalletTxnType::Credit),
            "debit" => Some(WalletTxnType::Debit),
            _ => None,
        }
    }
}

/// Movimiento del ledger de wallet de un usuario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub txn_type: WalletTxnType,
    /// Monto siempre positivo; el signo lo da `txn_type`
    pub amount: Decimal,
    /// Snapshot del balance corrido tras aplicar este movimiento
    pub balance_after: Decimal,
    pub description: String,
    /// Créditos con vencimiento dejan de contar como balance usable
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Un crédito expirado no cuenta para el balance usable
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Determina si el crédito vence dentro de la ventana `(now, now + window]`
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now && expires_at <= now + window,
            None => false,
        }
    }
}

/// Movimiento a insertar en el ledger. `balance_after` no viaja acá: lo
/// calcula el repositorio en el momento del append, bajo el mismo lock o
/// transacción que el insert, para que el balance corrido nunca se base en
/// un snapshot viejo.
#[derive(Debug, Clone)]
pub struct NewWalletTransaction {
    pub user_id: Uuid,
    pub txn_type: WalletTxnType,
    pub amount: Decimal,
    pub description: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response de movimiento de wallet para la API
#[derive(Debug, Serialize)]
pub struct WalletTransactionResponse {
    pub id: String,
    pub txn_type: String,
    pub amount: String,
    pub balance_after: String,
    pub description: String,
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<WalletTransaction> for WalletTransactionResponse {
    fn from(txn: WalletTransaction) -> Self {
        Self {
            id: txn.id.to_string(),
            txn_type: txn.txn_type.as_str().to_string(),
            amount: txn.amount.to_string(),
            balance_after: txn.balance_after.to_string(),
            description: txn.description,
            expires_at: txn.expires_at.map(|e| e.to_rfc3339()),
            created_at: txn.created_at.to_rfc3339(),
        }
    }
}
