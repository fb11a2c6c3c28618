//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de negocio (comisiones, política de
//! cancelación, referidos) y las credenciales del gateway de pagos.

pub mod settings;

pub use settings::*;
