//! Probability of default.
//!
//! Maps (rating, horizon, scenario) to a PD via the 1-year anchor table,
//! a compounding term-structure scaling and the scenario PD multiplier.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::CreditRiskError;
use crate::types::{Rate, Rating, Scenario};
use crate::CreditRiskResult;

/// Ceiling for any non-defaulted PD; only rating D reaches 1.0.
pub const MAX_NON_DEFAULT_PD: Decimal = dec!(0.9999);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PdInput {
    pub rating: Rating,
    pub horizon_months: u32,
    pub scenario: Scenario,
}

/// Calculate the probability of default over a horizon under a scenario.
///
/// `pd_h = 1 - (1 - base_pd_1y)^(horizon/12)`, then scaled by the scenario
/// PD multiplier and clamped below 1. Rating D always returns exactly 1.
pub fn calculate_pd(input: &PdInput, config: &EngineConfig) -> CreditRiskResult<Rate> {
    if input.horizon_months == 0 {
        return Err(CreditRiskError::InvalidInput {
            field: "horizon_months".into(),
            reason: "must be positive".into(),
        });
    }

    let base = config.rating_scale.base_pd_1y(input.rating)?;
    if input.rating.is_default() {
        return Ok(Decimal::ONE);
    }

    let survival_1y = Decimal::ONE - base;
    let pd_horizon = Decimal::ONE - year_fraction_pow(survival_1y, input.horizon_months);

    let shift = config.scenario_table.shift(input.scenario)?;
    let stressed = pd_horizon * shift.pd_multiplier;

    Ok(stressed.clamp(Decimal::ZERO, MAX_NON_DEFAULT_PD))
}

/// `base^(months/12)`. Whole years use exact iterative multiplication;
/// fractional years fall back to `checked_powd`, whose underflow on
/// extreme horizons means the survival probability is zero.
pub(crate) fn year_fraction_pow(base: Decimal, months: u32) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if months % 12 == 0 {
        iterative_pow(base, months / 12)
    } else {
        base.checked_powd(Decimal::from(months) / dec!(12))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Integer power via repeated squaring.
pub(crate) fn iterative_pow(base: Decimal, exp: u32) -> Decimal {
    if exp == 0 {
        return Decimal::ONE;
    }
    let mut result = Decimal::ONE;
    let mut b = base;
    let mut e = exp;
    while e > 0 {
        if e & 1 == 1 {
            result *= b;
        }
        b *= b;
        e >>= 1;
    }
    result
}
