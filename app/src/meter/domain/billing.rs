use serde::{Deserialize, Serialize};

use crate::core::{math::round_to, time::DateTime, unit::KiloWattHours};

#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub rate: f64,
    pub currency_symbol: String,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            rate: 5.25,
            currency_symbol: "₹".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub device_id: String,
    pub total_energy: KiloWattHours,
    pub tariff_rate: f64,
    pub amount: f64,
    pub generated_at: DateTime,
}

impl Bill {
    pub fn calculate(device_id: &str, energy: KiloWattHours, tariff_rate: f64) -> Self {
        Self {
            device_id: device_id.to_string(),
            total_energy: KiloWattHours(round_to(energy.0, 2)),
            tariff_rate,
            amount: round_to(energy * tariff_rate, 2),
            generated_at: DateTime::now(),
        }
    }

    pub fn formatted_amount(&self, tariff: &Tariff) -> String {
        format!("{}{:.2}", tariff.currency_symbol, self.amount)
    }
}
