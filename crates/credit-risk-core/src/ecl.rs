//! IFRS 9 expected credit loss and staging.
//!
//! Stage 1 provisions the 12-month ECL; stages 2 and 3 provision the
//! lifetime ECL. When the supplied PD covers a horizon beyond 12 months,
//! the 12-month equivalent is recovered by inverting the same survival
//! term structure that produced it.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::CreditRiskError;
use crate::types::{Money, Rate};
use crate::CreditRiskResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EclInput {
    pub pd: Rate,
    pub lgd: Rate,
    pub ead: Money,
    /// Horizon the supplied PD covers. Defaults to 12 months, in which
    /// case the PD is used directly as the 12-month figure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_months: Option<u32>,
}

/// Staged expected-loss figures for a single exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EclResult {
    pub pd: Rate,
    pub lgd: Rate,
    pub ead: Money,
    pub ecl_12_months: Money,
    pub ecl_lifetime: Money,
    pub stage: u8,
    /// Reported provision: 12-month ECL for stage 1, lifetime otherwise.
    pub provision: Money,
    /// Provision as a percentage of EAD.
    pub provision_rate: Rate,
}

/// Calculate staged expected credit loss from PD, LGD and EAD.
pub fn calculate_expected_loss(
    input: &EclInput,
    config: &EngineConfig,
) -> CreditRiskResult<EclResult> {
    if input.pd < Decimal::ZERO || input.pd > Decimal::ONE {
        return Err(CreditRiskError::InvalidInput {
            field: "pd".into(),
            reason: format!("must be in [0, 1], got {}", input.pd),
        });
    }
    if input.lgd < Decimal::ZERO || input.lgd > Decimal::ONE {
        return Err(CreditRiskError::InvalidInput {
            field: "lgd".into(),
            reason: format!("must be in [0, 1], got {}", input.lgd),
        });
    }
    if input.ead < Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "ead".into(),
            reason: "cannot be negative".into(),
        });
    }
    let horizon = input.horizon_months.unwrap_or(12);
    if horizon == 0 {
        return Err(CreditRiskError::InvalidInput {
            field: "horizon_months".into(),
            reason: "must be positive".into(),
        });
    }

    let pd_12m = twelve_month_equivalent(input.pd, horizon);

    let stage = if input.pd >= config.staging.stage_3_pd {
        3
    } else if input.pd >= config.staging.stage_2_pd {
        2
    } else {
        1
    };

    let ecl_12_months = pd_12m * input.lgd * input.ead;
    let ecl_lifetime = input.pd * input.lgd * input.ead;

    let provision = if stage == 1 { ecl_12_months } else { ecl_lifetime };
    let provision_rate = if input.ead > Decimal::ZERO {
        provision / input.ead * dec!(100)
    } else {
        Decimal::ZERO
    };

    Ok(EclResult {
        pd: input.pd,
        lgd: input.lgd,
        ead: input.ead,
        ecl_12_months,
        ecl_lifetime,
        stage,
        provision,
        provision_rate,
    })
}

/// Invert the survival term structure to a 12-month PD:
/// `pd_12m = 1 - (1 - pd)^(12/horizon)`. PDs already covering at most
/// 12 months pass through unchanged.
fn twelve_month_equivalent(pd: Rate, horizon_months: u32) -> Rate {
    if horizon_months <= 12 {
        return pd;
    }
    let survival = Decimal::ONE - pd;
    if survival <= Decimal::ZERO {
        return pd;
    }
    Decimal::ONE - survival.powd(dec!(12) / Decimal::from(horizon_months))
}
