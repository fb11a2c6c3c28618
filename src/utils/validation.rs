//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Formato de código de referido: alfanumérico en mayúsculas, 6 a 12 caracteres
    static ref REFERRAL_CODE_RE: Regex = Regex::new(r"^[A-Z0-9]{6,12}$").unwrap();
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar el formato de un código de referido
pub fn validate_referral_code(value: &str) -> Result<(), ValidationError> {
    if !REFERRAL_CODE_RE.is_match(value) {
        let mut error = ValidationError::new("referral_code");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un intervalo de reserva sea estrictamente positivo
pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        let mut error = ValidationError::new("interval");
        error.add_param("start".into(), &start.to_rfc3339());
        error.add_param("end".into(), &end.to_rfc3339());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_referral_code() {
        assert!(validate_referral_code("AB12CD34").is_ok());
        assert!(validate_referral_code("abc123").is_err());
        assert!(validate_referral_code("SHORT").is_err());
        assert!(validate_referral_code("").is_err());
    }

    #[test]
    fn test_validate_interval() {
        let start = Utc::now();
        let end = start + chrono::Duration::hours(4);
        assert!(validate_interval(start, end).is_ok());
        assert!(validate_interval(end, start).is_err());
        assert!(validate_interval(start, start).is_err());
    }
}
