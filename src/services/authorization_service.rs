//! Servicio de autorización
//!
//! Un único predicado de autorización evaluado una vez por transición de
//! estado, etiquetado por el rol requerido. Reemplaza los chequeos de rol
//! dispersos por endpoint.

use crate::models::user::UserRole;
use crate::utils::errors::{forbidden_error, AppResult};

/// Acciones sobre el ciclo de vida de una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Create,
    Activate,
    Complete,
    Cancel,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Create => "create booking",
            BookingAction::Activate => "activate booking",
            BookingAction::Complete => "complete booking",
            BookingAction::Cancel => "cancel booking",
        }
    }
}

/// Servicio de autorización por rol
pub struct AuthorizationService;

impl AuthorizationService {
    /// Determina si el rol puede ejecutar la acción
    pub fn can_perform(role: UserRole, action: BookingAction) -> bool {
        match action {
            BookingAction::Create => matches!(role, UserRole::Customer | UserRole::Admin),
            // El handover del vehículo lo registra el owner (o un admin)
            BookingAction::Activate | BookingAction::Complete => {
                matches!(role, UserRole::Owner | UserRole::Admin)
            }
            BookingAction::Cancel => true,
        }
    }

    /// Predicado de autorización; falla con `Forbidden` si el rol no alcanza
    pub fn authorize(role: UserRole, action: BookingAction) -> AppResult<()> {
        if Self::can_perform(role, action) {
            Ok(())
        } else {
            Err(forbidden_error(
                action.as_str(),
                &format!("role '{}' is not allowed", role.as_str()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_permissions() {
        assert!(AuthorizationService::can_perform(UserRole::Customer, BookingAction::Create));
        assert!(AuthorizationService::can_perform(UserRole::Customer, BookingAction::Cancel));
        assert!(!AuthorizationService::can_perform(UserRole::Customer, BookingAction::Activate));
        assert!(!AuthorizationService::can_perform(UserRole::Customer, BookingAction::Complete));
    }

    #[test]
    fn test_owner_permissions() {
        assert!(AuthorizationService::can_perform(UserRole::Owner, BookingAction::Activate));
        assert!(AuthorizationService::can_perform(UserRole::Owner, BookingAction::Complete));
        assert!(!AuthorizationService::can_perform(UserRole::Owner, BookingAction::Create));
    }

    #[test]
    fn test_admin_can_do_everything() {
        for action in [
            BookingAction::Create,
            BookingAction::Activate,
            BookingAction::Complete,
            BookingAction::Cancel,
        ] {
            assert!(AuthorizationService::can_perform(UserRole::Admin, action));
        }
    }

    #[test]
    fn test_authorize_returns_forbidden() {
        let err = AuthorizationService::authorize(UserRole::Customer, BookingAction::Activate)
            .unwrap_err();
        assert!(matches!(err, crate::utils::errors::AppError::Forbidden(_)));
    }
}
