//! Repositorio de usuarios
//!
//! Contrato de storage para la entidad User. `set_referred_by` sólo escribe
//! si el campo sigue en NULL: la inmutabilidad del referido se hace cumplir
//! también a nivel de fila, no sólo en el servicio.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserRole};
use crate::utils::errors::{internal_error, AppError, AppResult};

/// Contrato del colaborador de storage para usuarios
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_referral_code(&self, code: &str) -> AppResult<Option<User>>;

    async fn set_referral_code(&self, id: Uuid, code: &str) -> AppResult<()>;

    /// Fija `referred_by` una única vez; falla con `AlreadyReferred` si ya
    /// estaba fijado.
    async fn set_referred_by(&self, id: Uuid, code: &str) -> AppResult<()>;
}

// Fila cruda de la tabla users
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    role: String,
    full_name: String,
    email: String,
    referral_code: Option<String>,
    referred_by: Option<String>,
    created_at: DateTime<Utc>,
}

fn row_to_user(row: UserRow) -> AppResult<User> {
    let role = UserRole::parse(&row.role)
        .ok_or_else(|| internal_error(&format!("unknown user role '{}'", row.role)))?;

    Ok(User {
        id: row.id,
        role,
        full_name: row.full_name,
        email: row.email,
        referral_code: row.referral_code,
        referred_by: row.referred_by,
        created_at: row.created_at,
    })
}

/// Implementación PostgreSQL del repositorio de usuarios
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_exists(&self, id: Uuid) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(exists)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, role, full_name, email, referral_code, referred_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(user.role.as_str())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.referral_code)
        .bind(&user.referred_by)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row_to_user(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_referral_code(&self, code: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        row.map(row_to_user).transpose()
    }

    async fn set_referral_code(&self, id: Uuid, code: &str) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET referral_code = $2 WHERE id = $1 AND referral_code IS NULL RETURNING id",
        )
        .bind(id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if updated.is_none() {
            // Distinguir usuario inexistente de código ya fijado
            if !self.user_exists(id).await? {
                return Err(AppError::NotFound(format!(
                    "User with id '{}' not found",
                    id
                )));
            }
            return Err(AppError::AlreadyHasCode(format!(
                "user '{}' already has a referral code",
                id
            )));
        }
        Ok(())
    }

    async fn set_referred_by(&self, id: Uuid, code: &str) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET referred_by = $2 WHERE id = $1 AND referred_by IS NULL RETURNING id",
        )
        .bind(id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if updated.is_none() {
            if !self.user_exists(id).await? {
                return Err(AppError::NotFound(format!(
                    "User with id '{}' not found",
                    id
                )));
            }
            return Err(AppError::AlreadyReferred(format!(
                "user '{}' was already referred",
                id
            )));
        }
        Ok(())
    }
}
