//! Configuración de negocio y del gateway de pagos
//!
//! Los porcentajes de comisión, los tramos de reembolso y los montos de
//! recompensa son entradas de configuración, no literales dispersos en los
//! servicios. Los valores por defecto reflejan la política vigente del
//! marketplace.

use rust_decimal::Decimal;
use std::env;

/// Configuración del split de comisiones
#[derive(Debug, Clone)]
pub struct CommissionConfig {
    /// Fracción del monto pagado que retiene la plataforma (0.30 = 30%)
    pub platform_rate: Decimal,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            platform_rate: Decimal::new(30, 2),
        }
    }
}

/// Política de cancelación por tramos de antelación al pickup
#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    /// Más de estas horas antes del inicio: reembolso total menos fee fijo
    pub full_refund_cutoff_hours: i64,
    /// Entre el tramo anterior y estas horas: reembolso parcial
    pub half_refund_cutoff_hours: i64,
    /// Fee fijo de procesamiento descontado del reembolso total
    pub processing_fee: Decimal,
    /// Fracción reembolsada en el tramo intermedio (0.50 = 50%)
    pub half_refund_rate: Decimal,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            full_refund_cutoff_hours: 24,
            half_refund_cutoff_hours: 6,
            processing_fee: Decimal::new(5000, 2),
            half_refund_rate: Decimal::new(50, 2),
        }
    }
}

/// Configuración del programa de referidos
#[derive(Debug, Clone)]
pub struct ReferralConfig {
    /// Crédito acreditado al referente cuando su código es aplicado
    pub reward_amount: Decimal,
    /// Días de vigencia del crédito de referido
    pub reward_expiry_days: i64,
    /// Longitud de los códigos generados
    pub code_length: usize,
    /// Bono acreditado al referido al completar su primera reserva
    pub first_booking_bonus: Decimal,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            reward_amount: Decimal::new(10000, 2),
            reward_expiry_days: 90,
            code_length: 8,
            first_booking_bonus: Decimal::new(5000, 2),
        }
    }
}

/// Credenciales y parámetros del gateway de pagos
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub merchant_key: String,
    pub merchant_salt: String,
    /// Prefijo de los transaction ids generados para cada intento de pago
    pub txnid_prefix: String,
}

impl GatewayConfig {
    /// Cargar credenciales desde variables de entorno
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            merchant_key: env::var("GATEWAY_MERCHANT_KEY").expect("GATEWAY_MERCHANT_KEY must be set"),
            merchant_salt: env::var("GATEWAY_MERCHANT_SALT").expect("GATEWAY_MERCHANT_SALT must be set"),
            txnid_prefix: env::var("GATEWAY_TXNID_PREFIX").unwrap_or_else(|_| "TXN".to_string()),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            merchant_key: "test_merchant_key".to_string(),
            merchant_salt: "test_merchant_salt".to_string(),
            txnid_prefix: "TXN".to_string(),
        }
    }
}

/// Configuración agregada del core
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub commission: CommissionConfig,
    pub cancellation: CancellationPolicy,
    pub referral: ReferralConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Cargar la configuración completa desde el entorno
    pub fn from_env() -> Self {
        Self {
            gateway: GatewayConfig::from_env(),
            ..Self::default()
        }
    }
}
