//! Núcleo del marketplace de alquiler de vehículos
//!
//! Esta librería contiene el ciclo de vida de reservas, el protocolo de hash
//! del gateway de pagos, el split de comisiones, el ledger de wallet y el
//! motor de referidos. La capa HTTP y el renderizado quedan fuera del core.

pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
