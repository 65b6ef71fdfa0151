//! Calibration tables injected into every engine call.
//!
//! All tables are immutable value objects. `EngineConfig::default()` carries
//! the standard calibration; custom tables go through checked constructors
//! so that monotonicity and completeness hold by construction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditRiskError;
use crate::types::{CollateralType, ProductType, Rate, Rating, Scenario};
use crate::CreditRiskResult;

// ---------------------------------------------------------------------------
// Rating scale
// ---------------------------------------------------------------------------

/// Ordered table of 1-year baseline default probabilities per rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingScale {
    anchors: Vec<(Rating, Rate)>,
}

impl RatingScale {
    /// Build a scale from explicit anchors. The table must cover every
    /// rating exactly once and be strictly increasing in risk order,
    /// with D anchored at 1.0.
    pub fn new(anchors: Vec<(Rating, Rate)>) -> CreditRiskResult<Self> {
        for rating in Rating::ALL {
            let count = anchors.iter().filter(|(r, _)| *r == rating).count();
            if count != 1 {
                return Err(CreditRiskError::InvalidInput {
                    field: "rating_scale".into(),
                    reason: format!("rating {} appears {} times, expected once", rating, count),
                });
            }
        }
        let mut ordered: Vec<(Rating, Rate)> = anchors;
        ordered.sort_by_key(|(r, _)| *r);
        for pair in ordered.windows(2) {
            if pair[0].1 >= pair[1].1 {
                return Err(CreditRiskError::InvalidInput {
                    field: "rating_scale".into(),
                    reason: format!(
                        "base PD must be strictly increasing: {} = {} vs {} = {}",
                        pair[0].0, pair[0].1, pair[1].0, pair[1].1
                    ),
                });
            }
        }
        let (_, d_anchor) = ordered[ordered.len() - 1];
        if d_anchor != Decimal::ONE {
            return Err(CreditRiskError::InvalidInput {
                field: "rating_scale".into(),
                reason: format!("D must be anchored at 1.0, got {}", d_anchor),
            });
        }
        Ok(RatingScale { anchors: ordered })
    }

    /// 1-year baseline probability of default for a rating.
    pub fn base_pd_1y(&self, rating: Rating) -> CreditRiskResult<Rate> {
        self.anchors
            .iter()
            .find(|(r, _)| *r == rating)
            .map(|(_, pd)| *pd)
            .ok_or_else(|| CreditRiskError::InvalidInput {
                field: "rating".into(),
                reason: format!("rating {} has no anchor in the scale", rating),
            })
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        RatingScale {
            anchors: vec![
                (Rating::AAA, dec!(0.0002)),
                (Rating::AA, dec!(0.0005)),
                (Rating::A, dec!(0.0010)),
                (Rating::BBB, dec!(0.0030)),
                (Rating::BB, dec!(0.0100)),
                (Rating::B, dec!(0.0300)),
                (Rating::CCC, dec!(0.1000)),
                (Rating::CC, dec!(0.2000)),
                (Rating::C, dec!(0.3000)),
                (Rating::D, dec!(1.0000)),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario table
// ---------------------------------------------------------------------------

/// Stress applied by one scenario: a PD multiplier and an additive
/// adjustment to effective collateral coverage (negative under stress).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioShift {
    pub pd_multiplier: Rate,
    pub collateral_haircut: Rate,
}

/// Named macro scenarios and their stress shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTable {
    shifts: Vec<(Scenario, ScenarioShift)>,
}

impl ScenarioTable {
    /// Build a table from explicit shifts. Every scenario must appear
    /// exactly once with a positive PD multiplier.
    pub fn new(shifts: Vec<(Scenario, ScenarioShift)>) -> CreditRiskResult<Self> {
        for scenario in [Scenario::Baseline, Scenario::Adverse, Scenario::Severe] {
            let count = shifts.iter().filter(|(s, _)| *s == scenario).count();
            if count != 1 {
                return Err(CreditRiskError::InvalidInput {
                    field: "scenario_table".into(),
                    reason: format!("scenario {} appears {} times, expected once", scenario, count),
                });
            }
        }
        for (scenario, shift) in &shifts {
            if shift.pd_multiplier <= Decimal::ZERO {
                return Err(CreditRiskError::InvalidInput {
                    field: "scenario_table".into(),
                    reason: format!("{} PD multiplier must be positive", scenario),
                });
            }
        }
        Ok(ScenarioTable { shifts })
    }

    pub fn shift(&self, scenario: Scenario) -> CreditRiskResult<ScenarioShift> {
        self.shifts
            .iter()
            .find(|(s, _)| *s == scenario)
            .map(|(_, shift)| *shift)
            .ok_or_else(|| CreditRiskError::InvalidInput {
                field: "scenario".into(),
                reason: format!("scenario {} has no entry in the table", scenario),
            })
    }
}

impl Default for ScenarioTable {
    fn default() -> Self {
        ScenarioTable {
            shifts: vec![
                (
                    Scenario::Baseline,
                    ScenarioShift {
                        pd_multiplier: dec!(1.0),
                        collateral_haircut: dec!(0.0),
                    },
                ),
                (
                    Scenario::Adverse,
                    ScenarioShift {
                        pd_multiplier: dec!(1.5),
                        collateral_haircut: dec!(-0.05),
                    },
                ),
                (
                    Scenario::Severe,
                    ScenarioShift {
                        pd_multiplier: dec!(2.5),
                        collateral_haircut: dec!(-0.15),
                    },
                ),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Collateral protection factors
// ---------------------------------------------------------------------------

/// Haircut factors applied to collateral coverage by collateral type.
/// Unsecured carries no effective protection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralHaircuts {
    pub unsecured: Rate,
    pub real_estate: Rate,
    pub financial: Rate,
    pub guarantee: Rate,
    pub other: Rate,
}

impl CollateralHaircuts {
    pub fn protection_factor(&self, collateral_type: CollateralType) -> Rate {
        match collateral_type {
            CollateralType::Unsecured => self.unsecured,
            CollateralType::RealEstate => self.real_estate,
            CollateralType::Financial => self.financial,
            CollateralType::Guarantee => self.guarantee,
            CollateralType::Other => self.other,
        }
    }
}

impl Default for CollateralHaircuts {
    fn default() -> Self {
        CollateralHaircuts {
            unsecured: dec!(0.0),
            real_estate: dec!(0.70),
            financial: dec!(0.85),
            guarantee: dec!(0.60),
            other: dec!(0.40),
        }
    }
}

// ---------------------------------------------------------------------------
// CCF schedule
// ---------------------------------------------------------------------------

/// Credit conversion factors for undrawn commitments. Product types
/// without an override fall back to the caller-supplied CCF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcfSchedule {
    pub default_ccf: Rate,
    pub revolving: Rate,
    pub term_loan: Rate,
    pub guarantee: Rate,
}

impl CcfSchedule {
    pub fn override_for(&self, product_type: ProductType) -> Option<Rate> {
        match product_type {
            ProductType::Revolving => Some(self.revolving),
            ProductType::TermLoan => Some(self.term_loan),
            ProductType::Guarantee => Some(self.guarantee),
            ProductType::Loan | ProductType::Other => None,
        }
    }
}

impl Default for CcfSchedule {
    fn default() -> Self {
        CcfSchedule {
            default_ccf: dec!(0.75),
            revolving: dec!(0.50),
            term_loan: dec!(1.00),
            guarantee: dec!(0.20),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy knobs
// ---------------------------------------------------------------------------

/// IFRS 9 staging thresholds on PD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StagingPolicy {
    /// PD at or above which an exposure is stage 2.
    pub stage_2_pd: Rate,
    /// PD at or above which an exposure is stage 3 (credit-impaired).
    pub stage_3_pd: Rate,
}

impl Default for StagingPolicy {
    fn default() -> Self {
        StagingPolicy {
            stage_2_pd: dec!(0.05),
            stage_3_pd: dec!(0.20),
        }
    }
}

/// Configurable policy for the stress orchestrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StressPolicy {
    /// Multiplier applied to total ECL to proxy capital impact.
    pub regulatory_multiplier: Rate,
    /// Provision-increase percentage versus the reference scenario above
    /// which an escalation is recommended.
    pub escalation_threshold_pct: Rate,
    /// Portfolio ECL rate above which a provisioning review is recommended.
    pub high_ecl_rate: Rate,
}

impl Default for StressPolicy {
    fn default() -> Self {
        StressPolicy {
            regulatory_multiplier: dec!(1.0),
            escalation_threshold_pct: dec!(25),
            high_ecl_rate: dec!(0.05),
        }
    }
}

/// Calibration of the model-based migration matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MigrationCalibration {
    /// Decay constant k in p_stay = exp(-base_pd * years * k). Migration
    /// is more likely than outright default, hence k > 1.
    pub decay_k: Rate,
    /// Share of residual probability mass distributed toward worse ratings.
    pub downgrade_share: Rate,
}

impl Default for MigrationCalibration {
    fn default() -> Self {
        MigrationCalibration {
            decay_k: dec!(3.0),
            downgrade_share: dec!(0.60),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Complete immutable configuration for the engine. Constructed once by
/// the caller and passed by reference into every calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rating_scale: RatingScale,
    #[serde(default)]
    pub scenario_table: ScenarioTable,
    #[serde(default)]
    pub haircuts: CollateralHaircuts,
    #[serde(default)]
    pub ccf: CcfSchedule,
    #[serde(default)]
    pub staging: StagingPolicy,
    #[serde(default)]
    pub stress: StressPolicy,
    #[serde(default)]
    pub migration: MigrationCalibration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scale_is_monotone() {
        let scale = RatingScale::default();
        for pair in Rating::ALL.windows(2) {
            let lo = scale.base_pd_1y(pair[0]).unwrap();
            let hi = scale.base_pd_1y(pair[1]).unwrap();
            assert!(lo < hi, "{} anchor {} should be below {} anchor {}", pair[0], lo, pair[1], hi);
        }
    }

    #[test]
    fn default_scale_anchors_d_at_one() {
        let scale = RatingScale::default();
        assert_eq!(scale.base_pd_1y(Rating::D).unwrap(), Decimal::ONE);
    }

    #[test]
    fn custom_scale_rejects_missing_rating() {
        let result = RatingScale::new(vec![(Rating::AAA, dec!(0.0002))]);
        assert!(result.is_err());
    }

    #[test]
    fn custom_scale_rejects_non_monotone() {
        let mut anchors: Vec<(Rating, Rate)> = Rating::ALL
            .iter()
            .enumerate()
            .map(|(i, r)| (*r, Decimal::from(i as i64 + 1) / dec!(100)))
            .collect();
        anchors[9].1 = Decimal::ONE; // D at 1.0
        anchors[3].1 = dec!(0.001); // BBB below A
        assert!(RatingScale::new(anchors).is_err());
    }

    #[test]
    fn custom_scale_rejects_d_below_one() {
        let anchors: Vec<(Rating, Rate)> = Rating::ALL
            .iter()
            .enumerate()
            .map(|(i, r)| (*r, Decimal::from(i as i64 + 1) / dec!(100)))
            .collect();
        // D ends up at 0.10, not 1.0
        assert!(RatingScale::new(anchors).is_err());
    }

    #[test]
    fn default_scenario_shifts() {
        let table = ScenarioTable::default();
        let baseline = table.shift(Scenario::Baseline).unwrap();
        assert_eq!(baseline.pd_multiplier, dec!(1.0));
        assert_eq!(baseline.collateral_haircut, dec!(0.0));
        let severe = table.shift(Scenario::Severe).unwrap();
        assert_eq!(severe.pd_multiplier, dec!(2.5));
        assert_eq!(severe.collateral_haircut, dec!(-0.15));
    }

    #[test]
    fn scenario_table_rejects_zero_multiplier() {
        let mut shifts: Vec<(Scenario, ScenarioShift)> = vec![
            (
                Scenario::Baseline,
                ScenarioShift {
                    pd_multiplier: Decimal::ZERO,
                    collateral_haircut: Decimal::ZERO,
                },
            ),
        ];
        shifts.push((
            Scenario::Adverse,
            ScenarioShift {
                pd_multiplier: dec!(1.5),
                collateral_haircut: dec!(-0.05),
            },
        ));
        shifts.push((
            Scenario::Severe,
            ScenarioShift {
                pd_multiplier: dec!(2.5),
                collateral_haircut: dec!(-0.15),
            },
        ));
        assert!(ScenarioTable::new(shifts).is_err());
    }

    #[test]
    fn ccf_overrides() {
        let ccf = CcfSchedule::default();
        assert_eq!(ccf.override_for(ProductType::Revolving), Some(dec!(0.50)));
        assert_eq!(ccf.override_for(ProductType::TermLoan), Some(dec!(1.00)));
        assert_eq!(ccf.override_for(ProductType::Guarantee), Some(dec!(0.20)));
        assert_eq!(ccf.override_for(ProductType::Loan), None);
        assert_eq!(ccf.override_for(ProductType::Other), None);
    }
}
