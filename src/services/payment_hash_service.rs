//! Protocolo de hash del gateway de pagos
//!
//! Firma determinística estilo HMAC sobre la concatenación ordenada de los
//! campos del pago, separados por pipes y hasheados con SHA-512. El gateway
//! devuelve el hash en orden inverso (con el `status` incluido); la
//! verificación reconstruye esa cadena y compara en tiempo constante.
//!
//! La firma es sensible al formato: `amount` viaja como el string exacto
//! enviado al gateway, nunca se reformatea.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::config::GatewayConfig;

/// Campos del redirect saliente hacia el gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub txnid: String,
    /// String exacto enviado al gateway (la firma es sensible al formato)
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
    /// URL de éxito
    pub surl: String,
    /// URL de fallo
    pub furl: String,
    /// Cinco campos user-defined opcionales; string vacío si ausentes
    pub udf: [String; 5],
}

/// Campos del callback entrante del gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub status: String,
    pub udf: [String; 5],
    /// Hash calculado por el gateway sobre la cadena inversa
    pub hash: String,
}

/// Servicio de firma y verificación del gateway de pagos
pub struct PaymentHashService {
    config: GatewayConfig,
}

impl PaymentHashService {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Firma del request saliente:
    /// `key|txnid|amount|productinfo|firstname|email|udf1|udf2|udf3|udf4|udf5|salt`
    pub fn sign(&self, request: &PaymentRequest) -> String {
        let payload = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.config.merchant_key,
            request.txnid,
            request.amount,
            request.productinfo,
            request.firstname,
            request.email,
            request.udf[0],
            request.udf[1],
            request.udf[2],
            request.udf[3],
            request.udf[4],
            self.config.merchant_salt,
        );
        sha512_hex(&payload)
    }

    /// Hash esperado del callback, en orden inverso:
    /// `salt|status|||||udf5|udf4|udf3|udf2|udf1|email|firstname|productinfo|amount|txnid|key`
    pub fn response_hash(&self, callback: &PaymentCallback) -> String {
        let payload = format!(
            "{}|{}|||||{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.config.merchant_salt,
            callback.status,
            callback.udf[4],
            callback.udf[3],
            callback.udf[2],
            callback.udf[1],
            callback.udf[0],
            callback.email,
            callback.firstname,
            callback.productinfo,
            callback.amount,
            callback.txnid,
            self.config.merchant_key,
        );
        sha512_hex(&payload)
    }

    /// Verifica el hash del callback con comparación en tiempo constante.
    ///
    /// Un mismatch nunca se reintenta con un chequeo relajado: el caller debe
    /// tratarlo como `PaymentVerificationFailed`.
    pub fn verify(&self, callback: &PaymentCallback) -> bool {
        let expected = self.response_hash(callback);

        let expected_bytes = expected.as_bytes();
        let received_bytes = callback.hash.as_bytes();

        if expected_bytes.len() != received_bytes.len() {
            return false;
        }

        expected_bytes.ct_eq(received_bytes).into()
    }

    /// Genera un transaction id único por intento:
    /// `<prefix><millis-timestamp><random 0-999999>`
    pub fn generate_txnid(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..=999_999);
        format!("{}{}{}", self.config.txnid_prefix, millis, suffix)
    }
}

fn sha512_hex(payload: &str) -> String {
    hex::encode(Sha512::digest(payload.as_bytes()))
}
