//! Modelo de User
//!
//! Este módulo contiene el struct User con su rol y los campos del
//! programa de referidos (`referral_code`, `referred_by`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rol del usuario en el marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Owner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Owner => "owner",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(UserRole::Customer),
            "owner" => Some(UserRole::Owner),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// User principal del marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: UserRole,
    pub full_name: String,
    pub email: String,
    /// Código propio para referir a otros; None hasta que se genera
    pub referral_code: Option<String>,
    /// Código del usuario que lo refirió; inmutable una vez fijado
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(role: UserRole, full_name: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            full_name: full_name.to_string(),
            email: email.to_string(),
            referral_code: None,
            referred_by: None,
            created_at: Utc::now(),
        }
    }
}

/// Response de usuario para la API (sin campos sensibles)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub role: String,
    pub full_name: String,
    pub referral_code: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            role: user.role.as_str().to_string(),
            full_name: user.full_name,
            referral_code: user.referral_code,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}
