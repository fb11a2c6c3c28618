//! Services module
//!
//! Este módulo contiene la lógica de negocio del core: la máquina de
//! estados de reservas, el protocolo de hash del gateway, el split de
//! comisiones, el ledger de wallet, el motor de referidos y los contratos
//! de los colaboradores externos (notificaciones, blob storage).

pub mod authorization_service;
pub mod blob_storage_service;
pub mod booking_service;
pub mod commission_service;
pub mod notification_service;
pub mod payment_hash_service;
pub mod referral_service;
pub mod wallet_service;

pub use authorization_service::{AuthorizationService, BookingAction};
pub use blob_storage_service::{BlobStorage, InMemoryBlobStorage};
pub use booking_service::BookingService;
pub use commission_service::{CommissionService, CommissionSplit};
pub use notification_service::{LogNotifier, NotificationSender};
pub use payment_hash_service::{PaymentCallback, PaymentHashService, PaymentRequest};
pub use referral_service::ReferralService;
pub use wallet_service::WalletService;
