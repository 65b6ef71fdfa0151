//! Exposure at default.
//!
//! `ead = drawn + ccf * undrawn`. The credit conversion factor comes from
//! the product-type schedule when an override exists, otherwise from the
//! caller (default 0.75).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::CreditRiskError;
use crate::types::{Money, ProductType, Rate};
use crate::CreditRiskResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EadInput {
    pub drawn_amount: Money,
    pub undrawn_amount: Money,
    /// Explicit CCF; falls back to the schedule default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccf: Option<Rate>,
    #[serde(default)]
    pub product_type: ProductType,
}

/// Calculate the exposure at default.
pub fn calculate_ead(input: &EadInput, config: &EngineConfig) -> CreditRiskResult<Money> {
    if input.drawn_amount < Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "drawn_amount".into(),
            reason: "cannot be negative".into(),
        });
    }
    if input.undrawn_amount < Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "undrawn_amount".into(),
            reason: "cannot be negative".into(),
        });
    }
    if let Some(ccf) = input.ccf {
        if ccf < Decimal::ZERO || ccf > Decimal::ONE {
            return Err(CreditRiskError::InvalidInput {
                field: "ccf".into(),
                reason: format!("must be in [0, 1], got {}", ccf),
            });
        }
    }

    let ccf = config
        .ccf
        .override_for(input.product_type)
        .or(input.ccf)
        .unwrap_or(config.ccf.default_ccf);

    Ok(input.drawn_amount + ccf * input.undrawn_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn plain_loan_uses_supplied_ccf() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(800_000),
                undrawn_amount: dec!(200_000),
                ccf: Some(dec!(0.75)),
                product_type: ProductType::Loan,
            },
            &config(),
        )
        .unwrap();
        assert_eq!(result, dec!(950_000));
    }

    #[test]
    fn missing_ccf_falls_back_to_default() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(800_000),
                undrawn_amount: dec!(200_000),
                ccf: None,
                product_type: ProductType::Other,
            },
            &config(),
        )
        .unwrap();
        assert_eq!(result, dec!(950_000));
    }

    #[test]
    fn revolving_override_wins_over_supplied_ccf() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(100_000),
                undrawn_amount: dec!(100_000),
                ccf: Some(dec!(0.75)),
                product_type: ProductType::Revolving,
            },
            &config(),
        )
        .unwrap();
        assert_eq!(result, dec!(150_000));
    }

    #[test]
    fn term_loan_fully_converts_undrawn() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(100_000),
                undrawn_amount: dec!(50_000),
                ccf: None,
                product_type: ProductType::TermLoan,
            },
            &config(),
        )
        .unwrap();
        assert_eq!(result, dec!(150_000));
    }

    #[test]
    fn guarantee_converts_one_fifth() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: Decimal::ZERO,
                undrawn_amount: dec!(1_000_000),
                ccf: None,
                product_type: ProductType::Guarantee,
            },
            &config(),
        )
        .unwrap();
        assert_eq!(result, dec!(200_000));
    }

    #[test]
    fn negative_drawn_rejected() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(-1),
                undrawn_amount: Decimal::ZERO,
                ccf: None,
                product_type: ProductType::Loan,
            },
            &config(),
        );
        assert!(matches!(result, Err(CreditRiskError::InvalidInput { .. })));
    }

    #[test]
    fn negative_undrawn_rejected() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(100),
                undrawn_amount: dec!(-1),
                ccf: None,
                product_type: ProductType::Loan,
            },
            &config(),
        );
        assert!(matches!(result, Err(CreditRiskError::InvalidInput { .. })));
    }

    #[test]
    fn out_of_range_ccf_rejected() {
        let result = calculate_ead(
            &EadInput {
                drawn_amount: dec!(100),
                undrawn_amount: dec!(100),
                ccf: Some(dec!(1.5)),
                product_type: ProductType::Loan,
            },
            &config(),
        );
        assert!(matches!(result, Err(CreditRiskError::InvalidInput { .. })));
    }
}
