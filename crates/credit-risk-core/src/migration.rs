//! Model-based rating migration matrix and stability index.
//!
//! In the absence of observed transition history the matrix is generated
//! from the rating scale: the no-migration probability decays with period
//! length and base PD, and the residual mass is spread over neighbouring
//! ratings with a downgrade bias. D is absorbing.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::CreditRiskError;
use crate::types::{with_metadata, ComputationOutput, Exposure, Rate, Rating};
use crate::CreditRiskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationInput {
    pub portfolio: Vec<Exposure>,
    pub period_months: u32,
}

/// Row-stochastic transition matrix over the rating scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionMatrix {
    /// Rating labels in scale order, AAA first, D last.
    pub ratings: Vec<String>,
    /// Row i = from ratings[i], column j = to ratings[j]; each row sums to 1.
    pub probabilities: Vec<Vec<Rate>>,
}

impl TransitionMatrix {
    pub fn probability(&self, from: Rating, to: Rating) -> Rate {
        self.probabilities[from.index()][to.index()]
    }

    fn identity() -> Self {
        let n = Rating::ALL.len();
        let mut probabilities = vec![vec![Decimal::ZERO; n]; n];
        for (i, row) in probabilities.iter_mut().enumerate() {
            row[i] = Decimal::ONE;
        }
        TransitionMatrix {
            ratings: Rating::ALL.iter().map(|r| r.to_string()).collect(),
            probabilities,
        }
    }
}

/// Expected stay/migrate split for one exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureMigration {
    pub exposure_id: String,
    pub rating: Rating,
    pub stay_probability: Rate,
    pub migrate_probability: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOutput {
    pub matrix: TransitionMatrix,
    pub portfolio_migrations: Vec<ExposureMigration>,
    /// Exposure-weighted average no-migration probability, in [0, 1].
    pub stability_index: Rate,
    /// Set when the portfolio was empty and the identity matrix was
    /// returned in place of the model-based one.
    pub insufficient_data: bool,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Generate a rating migration matrix and stability index for a portfolio
/// over a period.
pub fn generate_rating_migration_matrix(
    input: &MigrationInput,
    config: &EngineConfig,
) -> CreditRiskResult<ComputationOutput<MigrationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.period_months == 0 {
        return Err(CreditRiskError::InvalidInput {
            field: "period_months".into(),
            reason: "must be positive".into(),
        });
    }
    for exp in &input.portfolio {
        if exp.exposure_amount <= Decimal::ZERO {
            return Err(CreditRiskError::InvalidInput {
                field: "exposure_amount".into(),
                reason: format!("exposure '{}' must be positive", exp.exposure_id),
            });
        }
    }

    let output = if input.portfolio.is_empty() {
        warnings.push(
            "empty portfolio: identity matrix returned, stability index defaults to 1".into(),
        );
        MigrationOutput {
            matrix: TransitionMatrix::identity(),
            portfolio_migrations: Vec::new(),
            stability_index: Decimal::ONE,
            insufficient_data: true,
        }
    } else {
        let matrix = build_matrix(input.period_months, config)?;

        let mut weighted_stay = Decimal::ZERO;
        let mut total_amount = Decimal::ZERO;
        let mut portfolio_migrations = Vec::with_capacity(input.portfolio.len());
        for exp in &input.portfolio {
            let stay = matrix.probability(exp.rating, exp.rating);
            weighted_stay += exp.exposure_amount * stay;
            total_amount += exp.exposure_amount;
            portfolio_migrations.push(ExposureMigration {
                exposure_id: exp.exposure_id.clone(),
                rating: exp.rating,
                stay_probability: stay,
                migrate_probability: Decimal::ONE - stay,
            });
        }

        MigrationOutput {
            matrix,
            portfolio_migrations,
            stability_index: weighted_stay / total_amount,
            insufficient_data: false,
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "model": "exponential stay-probability decay with downgrade bias",
        "period_months": input.period_months,
        "decay_k": config.migration.decay_k,
        "downgrade_share": config.migration.downgrade_share,
    });

    Ok(with_metadata(
        "Model-based rating migration / absorbing default state",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Build the model-based transition matrix for a period.
fn build_matrix(period_months: u32, config: &EngineConfig) -> CreditRiskResult<TransitionMatrix> {
    let n = Rating::ALL.len();
    let years = Decimal::from(period_months) / dec!(12);
    let mut probabilities = vec![vec![Decimal::ZERO; n]; n];

    for (i, rating) in Rating::ALL.iter().enumerate() {
        if rating.is_default() {
            probabilities[i][i] = Decimal::ONE;
            continue;
        }

        let base = config.rating_scale.base_pd_1y(*rating)?;
        // checked_exp underflows to None for very long periods; the stay
        // probability collapses to zero rather than aborting.
        let p_stay = (-base * years * config.migration.decay_k)
            .checked_exp()
            .unwrap_or(Decimal::ZERO);
        let residual = Decimal::ONE - p_stay;

        let row = &mut probabilities[i];
        row[i] = p_stay;

        // Geometric weights by distance within each direction; a side with
        // no ratings cedes its mass to the other side.
        let has_better = i > 0;
        let (down_mass, up_mass) = if has_better {
            (
                residual * config.migration.downgrade_share,
                residual * (Decimal::ONE - config.migration.downgrade_share),
            )
        } else {
            (residual, Decimal::ZERO)
        };

        distribute(row, i, down_mass, Direction::Worse);
        distribute(row, i, up_mass, Direction::Better);

        normalize_row(row, i);
    }

    Ok(TransitionMatrix {
        ratings: Rating::ALL.iter().map(|r| r.to_string()).collect(),
        probabilities,
    })
}

enum Direction {
    Worse,
    Better,
}

/// Spread `mass` over the ratings on one side of index `from`, weighted
/// (1/2)^(distance-1) and normalized over the available side.
fn distribute(row: &mut [Rate], from: usize, mass: Decimal, direction: Direction) {
    if mass <= Decimal::ZERO {
        return;
    }
    let n = row.len();
    let targets: Vec<usize> = match direction {
        Direction::Worse => (from + 1..n).collect(),
        Direction::Better => (0..from).rev().collect(),
    };
    if targets.is_empty() {
        return;
    }

    let mut weights = Vec::with_capacity(targets.len());
    let mut weight = Decimal::ONE;
    let mut weight_sum = Decimal::ZERO;
    for _ in &targets {
        weights.push(weight);
        weight_sum += weight;
        weight /= dec!(2);
    }

    for (target, w) in targets.iter().zip(weights.iter()) {
        row[*target] += mass * w / weight_sum;
    }
}

/// Force the row to sum to exactly 1, folding the rounding residue into
/// the diagonal.
fn normalize_row(row: &mut [Rate], diagonal: usize) {
    let sum: Decimal = row.iter().copied().sum();
    if sum > Decimal::ZERO && sum != Decimal::ONE {
        for p in row.iter_mut() {
            *p /= sum;
        }
    }
    let adjusted: Decimal = row.iter().copied().sum();
    row[diagonal] += Decimal::ONE - adjusted;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollateralType, ProductType};
    use pretty_assertions::assert_eq;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn exposure(id: &str, rating: Rating, amount: Decimal) -> Exposure {
        Exposure {
            exposure_id: id.into(),
            borrower_id: format!("BRW-{}", id),
            exposure_amount: amount,
            drawn_amount: amount,
            undrawn_amount: Decimal::ZERO,
            rating,
            collateral_value: Decimal::ZERO,
            collateral_type: CollateralType::Unsecured,
            sector: "corporate".into(),
            country: "FR".into(),
            maturity_months: 12,
            product_type: ProductType::Loan,
        }
    }

    fn run(portfolio: Vec<Exposure>, period_months: u32) -> MigrationOutput {
        generate_rating_migration_matrix(
            &MigrationInput {
                portfolio,
                period_months,
            },
            &config(),
        )
        .unwrap()
        .result
    }

    fn approx_eq(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn rows_sum_to_one() {
        let output = run(vec![exposure("E1", Rating::BBB, dec!(1_000_000))], 12);
        for (i, row) in output.matrix.probabilities.iter().enumerate() {
            let sum: Decimal = row.iter().copied().sum();
            assert!(
                approx_eq(sum, Decimal::ONE, dec!(0.000001)),
                "row {} sums to {}",
                output.matrix.ratings[i],
                sum
            );
        }
    }

    #[test]
    fn all_probabilities_in_unit_interval() {
        let output = run(vec![exposure("E1", Rating::B, dec!(500_000))], 24);
        for row in &output.matrix.probabilities {
            for p in row {
                assert!(*p >= Decimal::ZERO && *p <= Decimal::ONE);
            }
        }
    }

    #[test]
    fn default_state_is_absorbing() {
        let output = run(vec![exposure("E1", Rating::BBB, dec!(1_000_000))], 12);
        let d = Rating::D.index();
        assert_eq!(output.matrix.probabilities[d][d], Decimal::ONE);
        for (j, p) in output.matrix.probabilities[d].iter().enumerate() {
            if j != d {
                assert_eq!(*p, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn stay_probability_decreases_with_risk() {
        let output = run(vec![exposure("E1", Rating::BBB, dec!(1_000_000))], 12);
        // Excluding absorbing D, the diagonal decays as base PD grows
        for pair in Rating::ALL.windows(2) {
            if pair[1].is_default() {
                continue;
            }
            let stay_better = output.matrix.probability(pair[0], pair[0]);
            let stay_worse = output.matrix.probability(pair[1], pair[1]);
            assert!(
                stay_better > stay_worse,
                "{} stay {} should exceed {} stay {}",
                pair[0],
                stay_better,
                pair[1],
                stay_worse
            );
        }
    }

    #[test]
    fn longer_period_lowers_stay_probability() {
        let short = run(vec![exposure("E1", Rating::BB, dec!(1_000_000))], 12);
        let long = run(vec![exposure("E1", Rating::BB, dec!(1_000_000))], 60);
        assert!(
            long.matrix.probability(Rating::BB, Rating::BB)
                < short.matrix.probability(Rating::BB, Rating::BB)
        );
    }

    #[test]
    fn downgrade_mass_exceeds_upgrade_mass() {
        let output = run(vec![exposure("E1", Rating::BBB, dec!(1_000_000))], 12);
        let i = Rating::BBB.index();
        let row = &output.matrix.probabilities[i];
        let upgrade: Decimal = row[..i].iter().copied().sum();
        let downgrade: Decimal = row[i + 1..].iter().copied().sum();
        assert!(downgrade > upgrade);
    }

    #[test]
    fn adjacent_rating_gets_largest_share() {
        let output = run(vec![exposure("E1", Rating::BBB, dec!(1_000_000))], 12);
        let i = Rating::BBB.index();
        let row = &output.matrix.probabilities[i];
        // One notch down (BB) outweighs two notches down (B), and one
        // notch up (A) outweighs two notches up (AA)
        assert!(row[Rating::BB.index()] > row[Rating::B.index()]);
        assert!(row[Rating::A.index()] > row[Rating::AA.index()]);
    }

    #[test]
    fn aaa_residual_goes_entirely_down() {
        let output = run(vec![exposure("E1", Rating::AAA, dec!(1_000_000))], 12);
        let i = Rating::AAA.index();
        let row = &output.matrix.probabilities[i];
        let stay = row[i];
        let downgrade: Decimal = row[i + 1..].iter().copied().sum();
        assert!(approx_eq(stay + downgrade, Decimal::ONE, dec!(0.000001)));
    }

    #[test]
    fn stability_index_weighted_by_exposure() {
        let output = run(
            vec![
                exposure("E1", Rating::AAA, dec!(900_000)),
                exposure("E2", Rating::CCC, dec!(100_000)),
            ],
            12,
        );
        let aaa_stay = output.matrix.probability(Rating::AAA, Rating::AAA);
        let ccc_stay = output.matrix.probability(Rating::CCC, Rating::CCC);
        let expected = (dec!(900_000) * aaa_stay + dec!(100_000) * ccc_stay) / dec!(1_000_000);
        assert_eq!(output.stability_index, expected);
        assert!(output.stability_index > ccc_stay);
        assert!(output.stability_index < aaa_stay);
    }

    #[test]
    fn stability_index_within_unit_interval() {
        for period in [1, 12, 60, 240] {
            let output = run(
                vec![
                    exposure("E1", Rating::C, dec!(1_000_000)),
                    exposure("E2", Rating::D, dec!(500_000)),
                ],
                period,
            );
            assert!(output.stability_index >= Decimal::ZERO);
            assert!(output.stability_index <= Decimal::ONE);
        }
    }

    #[test]
    fn portfolio_migrations_cover_each_exposure() {
        let output = run(
            vec![
                exposure("E1", Rating::A, dec!(100)),
                exposure("E2", Rating::B, dec!(200)),
            ],
            12,
        );
        assert_eq!(output.portfolio_migrations.len(), 2);
        for m in &output.portfolio_migrations {
            assert_eq!(m.stay_probability + m.migrate_probability, Decimal::ONE);
        }
    }

    #[test]
    fn defaulted_exposure_never_migrates() {
        let output = run(vec![exposure("E1", Rating::D, dec!(100))], 12);
        assert_eq!(output.portfolio_migrations[0].stay_probability, Decimal::ONE);
        assert_eq!(output.stability_index, Decimal::ONE);
    }

    #[test]
    fn empty_portfolio_returns_identity_with_flag() {
        let wrapped = generate_rating_migration_matrix(
            &MigrationInput {
                portfolio: vec![],
                period_months: 12,
            },
            &config(),
        )
        .unwrap();
        let output = &wrapped.result;
        assert!(output.insufficient_data);
        assert_eq!(output.stability_index, Decimal::ONE);
        assert!(output.portfolio_migrations.is_empty());
        for (i, row) in output.matrix.probabilities.iter().enumerate() {
            for (j, p) in row.iter().enumerate() {
                let expected = if i == j { Decimal::ONE } else { Decimal::ZERO };
                assert_eq!(*p, expected);
            }
        }
        assert!(!wrapped.warnings.is_empty());
    }

    #[test]
    fn century_period_saturates_without_panic() {
        // exp underflows for low ratings at 100 years; the stay probability
        // bottoms out at zero and the rows stay stochastic
        let output = run(vec![exposure("E1", Rating::C, dec!(1_000_000))], 1200);
        let c = Rating::C.index();
        let stay = output.matrix.probabilities[c][c];
        assert!(stay >= Decimal::ZERO && stay < dec!(0.01));
        for (i, row) in output.matrix.probabilities.iter().enumerate() {
            let sum: Decimal = row.iter().copied().sum();
            assert!(
                approx_eq(sum, Decimal::ONE, dec!(0.000001)),
                "row {} sums to {}",
                output.matrix.ratings[i],
                sum
            );
            for p in row {
                assert!(*p >= Decimal::ZERO && *p <= Decimal::ONE);
            }
        }
        assert!(output.stability_index >= Decimal::ZERO);
        assert!(output.stability_index <= Decimal::ONE);
    }

    #[test]
    fn zero_period_rejected() {
        let result = generate_rating_migration_matrix(
            &MigrationInput {
                portfolio: vec![exposure("E1", Rating::A, dec!(100))],
                period_months: 0,
            },
            &config(),
        );
        assert!(matches!(result, Err(CreditRiskError::InvalidInput { .. })));
    }

    #[test]
    fn non_positive_exposure_rejected() {
        let result = generate_rating_migration_matrix(
            &MigrationInput {
                portfolio: vec![exposure("E1", Rating::A, Decimal::ZERO)],
                period_months: 12,
            },
            &config(),
        );
        assert!(matches!(result, Err(CreditRiskError::InvalidInput { .. })));
    }

    #[test]
    fn deterministic_across_runs() {
        let portfolio = vec![
            exposure("E1", Rating::BBB, dec!(400_000)),
            exposure("E2", Rating::BB, dec!(600_000)),
        ];
        let first = run(portfolio.clone(), 36);
        let second = run(portfolio, 36);
        assert_eq!(first.stability_index, second.stability_index);
        assert_eq!(first.matrix.probabilities, second.matrix.probabilities);
    }
}
