use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use credit_risk_core::ead::{calculate_ead, EadInput};
use credit_risk_core::ecl::{calculate_expected_loss, EclInput};
use credit_risk_core::lgd::{calculate_lgd, LgdInput};
use credit_risk_core::pd::{calculate_pd, PdInput};
use credit_risk_core::stress::assess_exposure;
use credit_risk_core::{CollateralType, Exposure, ProductType, Rating, Scenario};

use crate::commands::engine_config;
use crate::input;

/// Arguments for probability-of-default calculation
#[derive(Args)]
pub struct PdArgs {
    /// Credit rating (AAA, AA, A, BBB, BB, B, CCC, CC, C, D)
    #[arg(long)]
    pub rating: Rating,

    /// Horizon in months
    #[arg(long, default_value = "12")]
    pub horizon_months: u32,

    /// Scenario (baseline, adverse, severe)
    #[arg(long, default_value = "baseline")]
    pub scenario: Scenario,

    /// Path to a JSON calibration file (defaults to the standard tables)
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for loss-given-default calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LgdArgs {
    /// Exposure amount
    #[arg(long)]
    pub exposure_amount: Decimal,

    /// Collateral value
    #[arg(long, default_value = "0")]
    pub collateral_value: Decimal,

    /// Collateral type (unsecured, real_estate, financial, guarantee, other)
    #[arg(long, default_value = "unsecured")]
    pub collateral_type: CollateralType,

    /// Scenario (baseline, adverse, severe)
    #[arg(long, default_value = "baseline")]
    pub scenario: Scenario,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for exposure-at-default calculation
#[derive(Args)]
pub struct EadArgs {
    /// Drawn amount
    #[arg(long)]
    pub drawn_amount: Decimal,

    /// Undrawn committed amount
    #[arg(long, default_value = "0")]
    pub undrawn_amount: Decimal,

    /// Credit conversion factor for the undrawn portion
    #[arg(long)]
    pub ccf: Option<Decimal>,

    /// Product type (loan, revolving, term_loan, guarantee, other)
    #[arg(long, default_value = "loan")]
    pub product_type: ProductType,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for expected-credit-loss calculation
#[derive(Args)]
pub struct EclArgs {
    /// Probability of default over the facility lifetime
    #[arg(long)]
    pub pd: Decimal,

    /// Loss given default
    #[arg(long)]
    pub lgd: Decimal,

    /// Exposure at default
    #[arg(long)]
    pub ead: Decimal,

    /// Facility horizon in months (defaults to 12)
    #[arg(long)]
    pub horizon_months: Option<u32>,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for a full single-exposure assessment
#[derive(Args)]
pub struct AssessArgs {
    /// Path to a JSON exposure file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Exposure identifier
    #[arg(long)]
    pub exposure_id: Option<String>,

    /// Borrower identifier
    #[arg(long)]
    pub borrower_id: Option<String>,

    /// Total exposure amount
    #[arg(long)]
    pub exposure_amount: Option<Decimal>,

    /// Drawn amount
    #[arg(long)]
    pub drawn_amount: Option<Decimal>,

    /// Undrawn committed amount
    #[arg(long)]
    pub undrawn_amount: Option<Decimal>,

    /// Credit rating
    #[arg(long)]
    pub rating: Option<Rating>,

    /// Collateral value
    #[arg(long)]
    pub collateral_value: Option<Decimal>,

    /// Collateral type
    #[arg(long)]
    pub collateral_type: Option<CollateralType>,

    /// Industry sector
    #[arg(long)]
    pub sector: Option<String>,

    /// Country of the borrower
    #[arg(long)]
    pub country: Option<String>,

    /// Remaining maturity in months
    #[arg(long)]
    pub maturity_months: Option<u32>,

    /// Product type
    #[arg(long)]
    pub product_type: Option<ProductType>,

    /// Scenario to assess under (baseline, adverse, severe)
    #[arg(long, default_value = "baseline")]
    pub scenario: Scenario,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_pd(args: PdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;
    let pd = calculate_pd(
        &PdInput {
            rating: args.rating,
            horizon_months: args.horizon_months,
            scenario: args.scenario,
        },
        &config,
    )?;
    Ok(json!({
        "rating": args.rating,
        "horizon_months": args.horizon_months,
        "scenario": args.scenario,
        "pd": pd,
    }))
}

pub fn run_lgd(args: LgdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;
    let lgd = calculate_lgd(
        &LgdInput {
            exposure_amount: args.exposure_amount,
            collateral_value: args.collateral_value,
            collateral_type: args.collateral_type,
            scenario: args.scenario,
        },
        &config,
    )?;
    Ok(json!({
        "collateral_type": args.collateral_type,
        "scenario": args.scenario,
        "lgd": lgd,
    }))
}

pub fn run_ead(args: EadArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;
    let ead = calculate_ead(
        &EadInput {
            drawn_amount: args.drawn_amount,
            undrawn_amount: args.undrawn_amount,
            ccf: args.ccf,
            product_type: args.product_type,
        },
        &config,
    )?;
    Ok(json!({
        "product_type": args.product_type,
        "ead": ead,
    }))
}

pub fn run_ecl(args: EclArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;
    let result = calculate_expected_loss(
        &EclInput {
            pd: args.pd,
            lgd: args.lgd,
            ead: args.ead,
            horizon_months: args.horizon_months,
        },
        &config,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assess(args: AssessArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;

    let exposure: Exposure = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        Exposure {
            exposure_id: args.exposure_id.unwrap_or_else(|| "EXP001".into()),
            borrower_id: args.borrower_id.unwrap_or_else(|| "BRW001".into()),
            exposure_amount: args
                .exposure_amount
                .ok_or("--exposure-amount is required (or provide --input)")?,
            drawn_amount: args
                .drawn_amount
                .ok_or("--drawn-amount is required (or provide --input)")?,
            undrawn_amount: args.undrawn_amount.unwrap_or(Decimal::ZERO),
            rating: args.rating.ok_or("--rating is required (or provide --input)")?,
            collateral_value: args.collateral_value.unwrap_or(Decimal::ZERO),
            collateral_type: args.collateral_type.unwrap_or(CollateralType::Unsecured),
            sector: args.sector.unwrap_or_else(|| "other".into()),
            country: args.country.unwrap_or_default(),
            maturity_months: args
                .maturity_months
                .ok_or("--maturity-months is required (or provide --input)")?,
            product_type: args.product_type.unwrap_or(ProductType::Loan),
        }
    };

    let result = assess_exposure(&exposure, args.scenario, &config)?;
    Ok(json!({
        "exposure_id": exposure.exposure_id,
        "borrower_id": exposure.borrower_id,
        "scenario": args.scenario,
        "result": result,
    }))
}
