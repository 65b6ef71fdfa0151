//! Portfolio stress testing.
//!
//! Runs the PD -> LGD -> EAD -> ECL pipeline for every (exposure, scenario)
//! pair, aggregates per scenario and compares against a reference scenario.
//! Exposures are evaluated in parallel; a single exposure's failure excludes
//! that exposure with a reason instead of aborting the run.

use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::ead::{self, EadInput};
use crate::ecl::{self, EclInput, EclResult};
use crate::error::CreditRiskError;
use crate::lgd::{self, LgdInput};
use crate::pd::{self, PdInput};
use crate::types::{with_metadata, ComputationOutput, Exposure, Money, Rate, Scenario};
use crate::CreditRiskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestInput {
    pub portfolio: Vec<Exposure>,
    pub scenarios: Vec<Scenario>,
}

/// Full pipeline result for one exposure under one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureStressResult {
    pub exposure_id: String,
    pub borrower_id: String,
    pub ecl: EclResult,
}

/// An exposure dropped from a scenario run, with the failure rendered
/// as a reason code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedExposure {
    pub exposure_id: String,
    pub reason: String,
}

/// Aggregated result of one scenario over the whole portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRunResult {
    pub scenario: Scenario,
    pub total_ecl: Money,
    pub total_ead: Money,
    /// total_ecl / total_ead (zero for an empty or fully excluded run).
    pub ecl_rate: Rate,
    pub capital_impact: Money,
    pub exposure_results: Vec<ExposureStressResult>,
    pub excluded: Vec<ExcludedExposure>,
}

/// Delta of one scenario's total ECL versus the reference scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub scenario: Scenario,
    pub total_ecl: Money,
    pub delta_vs_reference: Money,
    pub delta_pct: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestOutput {
    pub portfolio_size: usize,
    pub reference_scenario: Scenario,
    /// False when baseline was absent and the first input scenario had to
    /// serve as the comparison reference.
    pub reference_is_baseline: bool,
    pub scenarios: BTreeMap<String, ScenarioRunResult>,
    pub comparison: Vec<ScenarioDelta>,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Single-exposure pipeline
// ---------------------------------------------------------------------------

/// Run the full PD/LGD/EAD/ECL pipeline for one exposure under one
/// scenario. All four sub-calculations succeed or the whole call fails.
pub fn assess_exposure(
    exposure: &Exposure,
    scenario: Scenario,
    config: &EngineConfig,
) -> CreditRiskResult<EclResult> {
    let pd = pd::calculate_pd(
        &PdInput {
            rating: exposure.rating,
            horizon_months: exposure.maturity_months,
            scenario,
        },
        config,
    )?;
    let lgd = lgd::calculate_lgd(
        &LgdInput {
            exposure_amount: exposure.exposure_amount,
            collateral_value: exposure.collateral_value,
            collateral_type: exposure.collateral_type,
            scenario,
        },
        config,
    )?;
    let ead = ead::calculate_ead(
        &EadInput {
            drawn_amount: exposure.drawn_amount,
            undrawn_amount: exposure.undrawn_amount,
            ccf: None,
            product_type: exposure.product_type,
        },
        config,
    )?;
    ecl::calculate_expected_loss(
        &EclInput {
            pd,
            lgd,
            ead,
            horizon_months: Some(exposure.maturity_months),
        },
        config,
    )
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run a stress test over a portfolio for a list of scenarios.
pub fn run_stress_test(
    input: &StressTestInput,
    config: &EngineConfig,
) -> CreditRiskResult<ComputationOutput<StressTestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.scenarios.is_empty() {
        return Err(CreditRiskError::InsufficientData(
            "at least one scenario is required".into(),
        ));
    }

    // Collapse duplicate scenarios, first occurrence wins.
    let mut scenarios: Vec<Scenario> = Vec::new();
    for s in &input.scenarios {
        if !scenarios.contains(s) {
            scenarios.push(*s);
        }
    }
    if scenarios.len() < input.scenarios.len() {
        warnings.push("duplicate scenarios collapsed".into());
    }

    let reference_is_baseline = scenarios.contains(&Scenario::Baseline);
    let reference_scenario = if reference_is_baseline {
        Scenario::Baseline
    } else {
        scenarios[0]
    };
    if !reference_is_baseline {
        warnings.push(format!(
            "baseline scenario absent; {} serves as the comparison reference",
            reference_scenario
        ));
    }

    let mut scenario_results: BTreeMap<String, ScenarioRunResult> = BTreeMap::new();
    for scenario in &scenarios {
        let result = run_scenario(&input.portfolio, *scenario, config);
        scenario_results.insert(scenario.to_string(), result);
    }

    let total_excluded: usize = scenario_results.values().map(|r| r.excluded.len()).sum();
    if total_excluded > 0 {
        warnings.push(format!(
            "{} exposure evaluation(s) excluded across scenarios",
            total_excluded
        ));
    }

    let reference_total = scenario_results
        .get(reference_scenario.as_str())
        .map(|r| r.total_ecl)
        .unwrap_or(Decimal::ZERO);

    let comparison: Vec<ScenarioDelta> = scenarios
        .iter()
        .filter(|s| **s != reference_scenario)
        .map(|s| {
            let total = scenario_results
                .get(s.as_str())
                .map(|r| r.total_ecl)
                .unwrap_or(Decimal::ZERO);
            let delta = total - reference_total;
            let delta_pct = if reference_total > Decimal::ZERO {
                delta / reference_total * dec!(100)
            } else {
                Decimal::ZERO
            };
            ScenarioDelta {
                scenario: *s,
                total_ecl: total,
                delta_vs_reference: delta,
                delta_pct,
            }
        })
        .collect();

    let recommendations = build_recommendations(&scenario_results, &comparison, config);

    let output = StressTestOutput {
        portfolio_size: input.portfolio.len(),
        reference_scenario,
        reference_is_baseline,
        scenarios: scenario_results,
        comparison,
        recommendations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "regulatory_multiplier": config.stress.regulatory_multiplier,
        "escalation_threshold_pct": config.stress.escalation_threshold_pct,
        "scenarios": scenarios,
        "reference_scenario": output.reference_scenario,
    });

    Ok(with_metadata(
        "IFRS 9 scenario stress test / staged ECL aggregation",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Evaluate one scenario over the portfolio. Exposures are independent,
/// so the map runs in parallel; aggregation is commutative summation.
fn run_scenario(
    portfolio: &[Exposure],
    scenario: Scenario,
    config: &EngineConfig,
) -> ScenarioRunResult {
    let outcomes: Vec<Result<ExposureStressResult, ExcludedExposure>> = portfolio
        .par_iter()
        .map(|exposure| match assess_exposure(exposure, scenario, config) {
            Ok(ecl) => Ok(ExposureStressResult {
                exposure_id: exposure.exposure_id.clone(),
                borrower_id: exposure.borrower_id.clone(),
                ecl,
            }),
            Err(e) => Err(ExcludedExposure {
                exposure_id: exposure.exposure_id.clone(),
                reason: e.to_string(),
            }),
        })
        .collect();

    let mut exposure_results = Vec::new();
    let mut excluded = Vec::new();
    let mut total_ecl = Decimal::ZERO;
    let mut total_ead = Decimal::ZERO;

    for outcome in outcomes {
        match outcome {
            Ok(result) => {
                total_ecl += result.ecl.provision;
                total_ead += result.ecl.ead;
                exposure_results.push(result);
            }
            Err(exclusion) => excluded.push(exclusion),
        }
    }

    let ecl_rate = if total_ead > Decimal::ZERO {
        total_ecl / total_ead
    } else {
        Decimal::ZERO
    };

    ScenarioRunResult {
        scenario,
        total_ecl,
        total_ead,
        ecl_rate,
        capital_impact: total_ecl * config.stress.regulatory_multiplier,
        exposure_results,
        excluded,
    }
}

fn build_recommendations(
    results: &BTreeMap<String, ScenarioRunResult>,
    comparison: &[ScenarioDelta],
    config: &EngineConfig,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    for delta in comparison {
        if delta.delta_pct > config.stress.escalation_threshold_pct {
            recommendations.push(format!(
                "provision increase of {:.1}% under the {} scenario exceeds the {}% escalation threshold — escalate to the risk committee",
                delta.delta_pct, delta.scenario, config.stress.escalation_threshold_pct
            ));
        }
    }

    for result in results.values() {
        if result.ecl_rate > config.stress.high_ecl_rate {
            recommendations.push(format!(
                "portfolio ECL rate {:.4} under the {} scenario exceeds {} — review provisioning levels",
                result.ecl_rate, result.scenario, config.stress.high_ecl_rate
            ));
        }
        if !result.excluded.is_empty() {
            recommendations.push(format!(
                "{} exposure(s) excluded from the {} scenario — review input data quality",
                result.excluded.len(),
                result.scenario
            ));
        }
    }

    recommendations
}
