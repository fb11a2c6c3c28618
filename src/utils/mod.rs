//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y
//! validación de datos comunes a todos los servicios.

pub mod errors;
pub mod validation;

/// Inicializa el logging de tracing; idempotente, útil en tests y binarios
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
