pub mod config;
pub mod ead;
pub mod ecl;
pub mod error;
pub mod lgd;
pub mod migration;
pub mod pd;
pub mod stress;
pub mod types;

pub use config::EngineConfig;
pub use error::CreditRiskError;
pub use types::*;

/// Standard result type for all credit-risk operations
pub type CreditRiskResult<T> = Result<T, CreditRiskError>;
