//! Motor de referidos
//!
//! Genera códigos únicos por usuario, aplica un código a lo sumo una vez por
//! usuario (inmutabilidad de `referred_by`) y acredita la recompensa al
//! referente con vencimiento configurable.

use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::ReferralConfig;
use crate::models::wallet::WalletTransaction;
use crate::repositories::UserRepository;
use crate::services::wallet_service::WalletService;
use crate::utils::errors::{internal_error, not_found_error, AppError, AppResult};
use crate::utils::validation::validate_referral_code;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 8;

/// Servicio del programa de referidos
pub struct ReferralService {
    users: Arc<dyn UserRepository>,
    wallet: WalletService,
    config: ReferralConfig,
}

impl ReferralService {
    pub fn new(users: Arc<dyn UserRepository>, wallet: WalletService, config: ReferralConfig) -> Self {
        Self {
            users,
            wallet,
            config,
        }
    }

    /// Genera y persiste un código de referido único para el usuario.
    pub async fn generate_code(&self, user_id: Uuid) -> AppResult<String> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id.to_string()))?;

        if user.referral_code.is_some() {
            return Err(AppError::AlreadyHasCode(format!(
                "user '{}' already has a referral code",
                user_id
            )));
        }

        // Chequeo de colisión contra los códigos existentes
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = random_code(self.config.code_length);
            if self.users.find_by_referral_code(&code).await?.is_none() {
                self.users.set_referral_code(user_id, &code).await?;
                info!(user_id = %user_id, code = %code, "código de referido generado");
                return Ok(code);
            }
        }

        Err(internal_error("could not generate a unique referral code"))
    }

    /// Aplica un código de referido al usuario y acredita la recompensa al
    /// referente. Acción única por usuario: `referred_by` es inmutable.
    pub async fn apply_code(&self, user_id: Uuid, code: &str) -> AppResult<WalletTransaction> {
        if validate_referral_code(code).is_err() {
            return Err(AppError::InvalidCode(format!(
                "'{}' is not a valid referral code",
                code
            )));
        }

        let referrer = self
            .users
            .find_by_referral_code(code)
            .await?
            .ok_or_else(|| {
                AppError::InvalidCode(format!("no user owns referral code '{}'", code))
            })?;

        if referrer.id == user_id {
            return Err(AppError::SelfReferral(format!(
                "user '{}' cannot apply their own code",
                user_id
            )));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id.to_string()))?;

        if user.referred_by.is_some() {
            return Err(AppError::AlreadyReferred(format!(
                "user '{}' was already referred",
                user_id
            )));
        }

        // El repositorio vuelve a chequear el NULL: la escritura es única
        self.users.set_referred_by(user_id, code).await?;

        let expires_at = Utc::now() + Duration::days(self.config.reward_expiry_days);
        let txn = self
            .wallet
            .credit(
                referrer.id,
                self.config.reward_amount,
                &format!("Referral reward: code {} applied", code),
                Some(expires_at),
            )
            .await?;

        info!(
            referrer = %referrer.id,
            referred = %user_id,
            amount = %self.config.reward_amount,
            "recompensa de referido acreditada"
        );
        Ok(txn)
    }
}

fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}
