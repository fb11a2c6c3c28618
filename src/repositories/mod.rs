//! Repositorios de acceso a datos
//!
//! Cada entidad expone un trait de repositorio (el contrato del colaborador
//! de storage) con una implementación PostgreSQL y una implementación en
//! memoria usada por los tests.

pub mod booking_repository;
pub mod memory;
pub mod user_repository;
pub mod vehicle_repository;
pub mod wallet_repository;

pub use booking_repository::{BookingRepository, PgBookingRepository};
pub use memory::InMemoryStore;
pub use user_repository::{PgUserRepository, UserRepository};
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};
pub use wallet_repository::{PgWalletRepository, WalletRepository};
