//! Colaborador de notificaciones
//!
//! Contrato del sender de emails templados. Los envíos son fire-and-forget
//! desde el core: un fallo de entrega se loggea y nunca revierte una reserva
//! ya comprometida.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

pub const TEMPLATE_BOOKING_CONFIRMED: &str = "booking_confirmed";
pub const TEMPLATE_BOOKING_CANCELLED: &str = "booking_cancelled";
pub const TEMPLATE_PAYMENT_SUCCESS: &str = "payment_success";

/// Contrato del colaborador de notificaciones salientes
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Envía el template al destinatario; `true` si fue aceptado para entrega
    async fn send(&self, to: &str, template: &str, fields: &HashMap<String, String>) -> bool;
}

/// Sender que sólo registra el envío vía tracing; útil en tests y como
/// default hasta cablear el proveedor real de email.
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, to: &str, template: &str, fields: &HashMap<String, String>) -> bool {
        let payload = serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string());
        info!(to = %to, template = %template, payload = %payload, "notificación enviada");
        true
    }
}
