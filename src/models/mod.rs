//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos del dominio:
//! vehículos, reservas, usuarios y transacciones de wallet.

pub mod booking;
pub mod user;
pub mod vehicle;
pub mod wallet;
