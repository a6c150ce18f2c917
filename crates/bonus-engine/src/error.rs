use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain rule violation.
#[derive(Debug, Clone, PartialEq)]
pub enum BonusError {
    /// One or more fields are malformed or out of range.
    Validation(Vec<FieldError>),
    /// Unknown tier reference or user id.
    NotFound(String),
    /// Tier bounds with `min >= max`.
    InvalidRange { min: f64, max: f64 },
    /// Tier range intersects an existing tier.
    Overlap { tier_id: Uuid, min: f64, max: f64 },
    /// Adjustment would take the bonus balance below zero.
    NegativeBalance { balance: f64, delta: f64 },
}

impl BonusError {
    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl std::fmt::Display for BonusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                write!(f, "validation failed: {}", fields.join(", "))
            }
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::InvalidRange { min, max } => {
                write!(f, "minimum deposit ({min}) must be less than maximum deposit ({max})")
            }
            Self::Overlap { min, max, .. } => {
                write!(f, "tier range overlaps existing tier [{min}, {max}]")
            }
            Self::NegativeBalance { balance, delta } => {
                write!(f, "adjustment of {delta} would make bonus balance ({balance}) negative")
            }
        }
    }
}

impl std::error::Error for BonusError {}

/// Push a field error unless `value` is a finite percentage in [0, 100].
pub(crate) fn check_percent(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        errors.push(FieldError::new(field, "must be between 0 and 100"));
    }
}

/// Largest money amount accepted on input. Keeps every derived bonus and
/// total finite and representable to the cent.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Push a field error unless `value` is a finite amount in [0, MAX_AMOUNT].
pub(crate) fn check_amount(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(FieldError::new(field, "must be a non-negative number"));
    } else if value > MAX_AMOUNT {
        errors.push(FieldError::new(field, "must not exceed 1000000000000"));
    }
}

/// Validate a caller-supplied deposit amount.
pub fn check_deposit_amount(amount: f64) -> Result<(), BonusError> {
    let mut errors = Vec::new();
    check_amount(&mut errors, "amount", amount);
    into_result(errors)
}

pub(crate) fn into_result(errors: Vec<FieldError>) -> Result<(), BonusError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BonusError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_bounds() {
        let mut errors = Vec::new();
        check_percent(&mut errors, "a", 0.0);
        check_percent(&mut errors, "b", 100.0);
        assert!(errors.is_empty());

        check_percent(&mut errors, "c", 100.01);
        check_percent(&mut errors, "d", -1.0);
        check_percent(&mut errors, "e", f64::NAN);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_deposit_amount_bounds() {
        assert!(check_deposit_amount(0.0).is_ok());
        assert!(check_deposit_amount(MAX_AMOUNT).is_ok());
        for bad in [-0.01, f64::NAN, f64::INFINITY, 1.7e308, MAX_AMOUNT * 2.0] {
            assert!(
                matches!(check_deposit_amount(bad), Err(BonusError::Validation(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn test_display_lists_fields() {
        let err = BonusError::Validation(vec![
            FieldError::new("minDeposit", "bad"),
            FieldError::new("bonusPercent", "bad"),
        ]);
        assert_eq!(err.to_string(), "validation failed: minDeposit, bonusPercent");
    }
}
