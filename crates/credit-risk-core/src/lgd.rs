//! Loss given default.
//!
//! Collateral coverage is haircut by collateral type, reduced further under
//! stressed scenarios, and floored so that no loan is assumed loss-free.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::CreditRiskError;
use crate::types::{CollateralType, Money, Rate, Scenario};
use crate::CreditRiskResult;

/// Floor LGD: 5% of exposure is assumed lost even when fully covered.
pub const LGD_FLOOR: Decimal = dec!(0.05);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LgdInput {
    pub exposure_amount: Money,
    pub collateral_value: Money,
    pub collateral_type: CollateralType,
    pub scenario: Scenario,
}

/// Calculate the loss given default for a collateralized exposure.
pub fn calculate_lgd(input: &LgdInput, config: &EngineConfig) -> CreditRiskResult<Rate> {
    if input.exposure_amount <= Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "exposure_amount".into(),
            reason: "must be positive".into(),
        });
    }
    if input.collateral_value < Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "collateral_value".into(),
            reason: "cannot be negative".into(),
        });
    }

    let coverage = input.collateral_value / input.exposure_amount;
    let factor = config.haircuts.protection_factor(input.collateral_type);
    let effective_coverage = (coverage * factor).min(Decimal::ONE);

    // Stressed scenarios subtract from effective protection before the
    // one-minus, never below zero.
    let shift = config.scenario_table.shift(input.scenario)?;
    let stressed_coverage = (effective_coverage + shift.collateral_haircut).max(Decimal::ZERO);

    Ok((Decimal::ONE - stressed_coverage).clamp(LGD_FLOOR, Decimal::ONE))
}
