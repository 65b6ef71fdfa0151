use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CreditRiskError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates and probabilities expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// Credit rating on the standard long-term scale, ordered from least to
/// most risky. `D` is the absorbing default state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rating {
    AAA,
    AA,
    A,
    BBB,
    BB,
    B,
    CCC,
    CC,
    C,
    D,
}

impl Rating {
    /// All ratings in risk order (AAA first, D last).
    pub const ALL: [Rating; 10] = [
        Rating::AAA,
        Rating::AA,
        Rating::A,
        Rating::BBB,
        Rating::BB,
        Rating::B,
        Rating::CCC,
        Rating::CC,
        Rating::C,
        Rating::D,
    ];

    /// Position on the scale: 0 = AAA .. 9 = D.
    pub fn index(self) -> usize {
        Rating::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    pub fn is_default(self) -> bool {
        self == Rating::D
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::AAA => "AAA",
            Rating::AA => "AA",
            Rating::A => "A",
            Rating::BBB => "BBB",
            Rating::BB => "BB",
            Rating::B => "B",
            Rating::CCC => "CCC",
            Rating::CC => "CC",
            Rating::C => "C",
            Rating::D => "D",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = CreditRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AAA" => Ok(Rating::AAA),
            "AA" => Ok(Rating::AA),
            "A" => Ok(Rating::A),
            "BBB" => Ok(Rating::BBB),
            "BB" => Ok(Rating::BB),
            "B" => Ok(Rating::B),
            "CCC" => Ok(Rating::CCC),
            "CC" => Ok(Rating::CC),
            "C" => Ok(Rating::C),
            "D" => Ok(Rating::D),
            other => Err(CreditRiskError::InvalidInput {
                field: "rating".into(),
                reason: format!("unknown rating '{}'", other),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Macroeconomic stress scenario.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Baseline,
    Adverse,
    Severe,
}

impl Scenario {
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::Adverse => "adverse",
            Scenario::Severe => "severe",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = CreditRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(Scenario::Baseline),
            "adverse" => Ok(Scenario::Adverse),
            "severe" => Ok(Scenario::Severe),
            other => Err(CreditRiskError::InvalidInput {
                field: "scenario".into(),
                reason: format!("unknown scenario '{}'", other),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Collateral / product classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollateralType {
    Unsecured,
    RealEstate,
    Financial,
    Guarantee,
    Other,
}

impl CollateralType {
    pub fn as_str(self) -> &'static str {
        match self {
            CollateralType::Unsecured => "unsecured",
            CollateralType::RealEstate => "real_estate",
            CollateralType::Financial => "financial",
            CollateralType::Guarantee => "guarantee",
            CollateralType::Other => "other",
        }
    }
}

impl fmt::Display for CollateralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollateralType {
    type Err = CreditRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsecured" => Ok(CollateralType::Unsecured),
            "real_estate" => Ok(CollateralType::RealEstate),
            "financial" => Ok(CollateralType::Financial),
            "guarantee" => Ok(CollateralType::Guarantee),
            "other" => Ok(CollateralType::Other),
            unknown => Err(CreditRiskError::InvalidInput {
                field: "collateral_type".into(),
                reason: format!("unknown collateral type '{}'", unknown),
            }),
        }
    }
}

/// Facility product type, used for CCF overrides in the EAD calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    Loan,
    Revolving,
    TermLoan,
    Guarantee,
    Other,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Loan => "loan",
            ProductType::Revolving => "revolving",
            ProductType::TermLoan => "term_loan",
            ProductType::Guarantee => "guarantee",
            ProductType::Other => "other",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = CreditRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loan" => Ok(ProductType::Loan),
            "revolving" => Ok(ProductType::Revolving),
            "term_loan" => Ok(ProductType::TermLoan),
            "guarantee" => Ok(ProductType::Guarantee),
            "other" => Ok(ProductType::Other),
            unknown => Err(CreditRiskError::InvalidInput {
                field: "product_type".into(),
                reason: format!("unknown product type '{}'", unknown),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Exposure
// ---------------------------------------------------------------------------

/// A single credit exposure in a portfolio. Owned by the caller and
/// read-only to the engine; every calculation is a pure function of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exposure {
    pub exposure_id: String,
    pub borrower_id: String,
    pub exposure_amount: Money,
    pub drawn_amount: Money,
    #[serde(default)]
    pub undrawn_amount: Money,
    pub rating: Rating,
    #[serde(default)]
    pub collateral_value: Money,
    #[serde(default = "default_collateral_type")]
    pub collateral_type: CollateralType,
    #[serde(default = "default_sector")]
    pub sector: String,
    #[serde(default)]
    pub country: String,
    pub maturity_months: u32,
    #[serde(default)]
    pub product_type: ProductType,
}

fn default_collateral_type() -> CollateralType {
    CollateralType::Unsecured
}

fn default_sector() -> String {
    "other".into()
}

// ---------------------------------------------------------------------------
// Computation envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope for portfolio-level operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every portfolio-level computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
