use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditRiskError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_field() {
        let err = CreditRiskError::InvalidInput {
            field: "horizon_months".into(),
            reason: "must be positive".into(),
        };
        assert!(err.to_string().contains("horizon_months"));

        let err = CreditRiskError::InsufficientData("at least one scenario is required".into());
        assert!(err.to_string().starts_with("Insufficient data"));
    }
}
