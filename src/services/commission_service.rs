//! Servicio de comisiones
//!
//! Split de un monto pagado entre la plataforma y el owner del vehículo.
//! Función pura, sin estado ni efectos: la parte del owner se calcula por
//! diferencia para que las dos partes sumen exactamente el monto de entrada.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::CommissionConfig;

/// Resultado del split de comisión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionSplit {
    pub platform_share: Decimal,
    pub owner_share: Decimal,
}

/// Servicio de cálculo de comisiones
pub struct CommissionService {
    config: CommissionConfig,
}

impl CommissionService {
    pub fn new(config: CommissionConfig) -> Self {
        Self { config }
    }

    /// Divide `amount` en parte de la plataforma y parte del owner.
    ///
    /// `platform_share = round(amount * rate, 2)`; la parte del owner es la
    /// diferencia, así `platform_share + owner_share == amount` siempre.
    pub fn split(&self, amount: Decimal) -> CommissionSplit {
        let platform_share = (amount * self.config.platform_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let owner_share = amount - platform_share;

        CommissionSplit {
            platform_share,
            owner_share,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CommissionService {
        CommissionService::new(CommissionConfig::default())
    }

    #[test]
    fn test_split_round_amount() {
        let split = service().split(Decimal::new(100000, 2)); // 1000.00
        assert_eq!(split.platform_share, Decimal::new(30000, 2)); // 300.00
        assert_eq!(split.owner_share, Decimal::new(70000, 2)); // 700.00
    }

    #[test]
    fn test_split_sums_exactly() {
        for cents in [1i64, 999, 99999, 12345, 100001, 33333] {
            let amount = Decimal::new(cents, 2);
            let split = service().split(amount);
            assert_eq!(
                split.platform_share + split.owner_share,
                amount,
                "split drifted for {}",
                amount
            );
        }
    }

    #[test]
    fn test_split_edge_amounts() {
        let split = service().split(Decimal::new(99999, 2)); // 999.99
        assert_eq!(split.platform_share + split.owner_share, Decimal::new(99999, 2));

        let split = service().split(Decimal::new(1, 2)); // 0.01
        assert_eq!(split.platform_share + split.owner_share, Decimal::new(1, 2));
    }

    #[test]
    fn test_custom_rate() {
        let service = CommissionService::new(CommissionConfig {
            platform_rate: Decimal::new(15, 2),
        });
        let split = service.split(Decimal::new(20000, 2)); // 200.00 al 15%
        assert_eq!(split.platform_share, Decimal::new(3000, 2)); // 30.00
        assert_eq!(split.owner_share, Decimal::new(17000, 2)); // 170.00
    }
}
