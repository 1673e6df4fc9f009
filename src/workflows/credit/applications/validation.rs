use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationStatus, CreditApplication, CreditPurpose, NewApplication};
use super::transitions::InvalidTransition;

const TERM_MONTHS_MIN: u16 = 1;
const TERM_MONTHS_MAX: u16 = 360;

/// Business-rule violations, distinguishable from authorization denials.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("purpose_other is required when purpose is 'other'")]
    PurposeOtherRequired,
    #[error("no fields were provided to update")]
    EmptyUpdate,
    #[error("a registered company is required before requesting credit")]
    CompanyRequired,
    #[error("requested_amount must be greater than 0")]
    RequestedAmountNotPositive,
    #[error("term_months must be between {TERM_MONTHS_MIN} and {TERM_MONTHS_MAX}, got {term}")]
    TermOutOfRange { term: u16 },
    #[error("risk_score must be between 0 and 100, got {score}")]
    RiskScoreOutOfRange { score: Decimal },
    #[error("interest_rate must not be negative")]
    InterestRateNegative,
    #[error("interest_rate is required when the status becomes 'approved'")]
    InterestRateRequiredForApproval,
    #[error("approved_amount must be greater than 0")]
    ApprovedAmountNotPositive,
    #[error("approved_amount ({approved}) cannot exceed requested_amount ({requested})")]
    ApprovedAmountExceedsRequested {
        approved: Decimal,
        requested: Decimal,
    },
    #[error("cannot sort by '{field}'; sortable fields: [{}]", .allowed.join(", "))]
    UnknownSortField {
        field: String,
        allowed: &'static [&'static str],
    },
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Caller-supplied partial update. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default)]
    pub requested_amount: Option<Decimal>,
    #[serde(default)]
    pub purpose: Option<CreditPurpose>,
    #[serde(default)]
    pub purpose_other: Option<String>,
    #[serde(default)]
    pub term_months: Option<u16>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub risk_score: Option<Decimal>,
    #[serde(default)]
    pub approved_amount: Option<Decimal>,
    #[serde(default)]
    pub interest_rate: Option<Decimal>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.requested_amount.is_none()
            && self.purpose.is_none()
            && self.purpose_other.is_none()
            && self.term_months.is_none()
            && self.status.is_none()
            && self.risk_score.is_none()
            && self.approved_amount.is_none()
            && self.interest_rate.is_none()
    }

    /// Whether the patch touches status and nothing else.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some()
            && self.requested_amount.is_none()
            && self.purpose.is_none()
            && self.purpose_other.is_none()
            && self.term_months.is_none()
            && self.risk_score.is_none()
            && self.approved_amount.is_none()
            && self.interest_rate.is_none()
    }

    /// Drop review-side fields applicants are not allowed to set. They are
    /// ignored silently rather than rejected. Returns true when anything was
    /// removed.
    pub fn strip_review_fields(&mut self) -> bool {
        let stripped = self.risk_score.is_some() || self.approved_amount.is_some();
        self.risk_score = None;
        self.approved_amount = None;
        stripped
    }
}

fn term_in_range(term: u16) -> Result<(), ValidationError> {
    if (TERM_MONTHS_MIN..=TERM_MONTHS_MAX).contains(&term) {
        Ok(())
    } else {
        Err(ValidationError::TermOutOfRange { term })
    }
}

fn purpose_other_present(purpose_other: Option<&str>) -> Result<(), ValidationError> {
    match purpose_other {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::PurposeOtherRequired),
    }
}

/// Rules for a brand-new application.
pub fn validate_new(input: &NewApplication) -> Result<(), ValidationError> {
    if input.requested_amount <= Decimal::ZERO {
        return Err(ValidationError::RequestedAmountNotPositive);
    }
    term_in_range(input.term_months)?;
    if input.purpose == CreditPurpose::Other {
        purpose_other_present(input.purpose_other.as_deref())?;
    }
    Ok(())
}

/// Cross-field rules for an update, evaluated against the state the row would
/// end up in. Status legality itself is the state machine's concern.
pub fn validate_patch(
    existing: &CreditApplication,
    patch: &ApplicationPatch,
) -> Result<(), ValidationError> {
    if let Some(amount) = patch.requested_amount {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::RequestedAmountNotPositive);
        }
        // Lowering requested_amount must not undercut an approval amount
        // already on the row (or arriving in the same patch).
        if let Some(approved) = patch.approved_amount.or(existing.approved_amount) {
            if approved > amount {
                return Err(ValidationError::ApprovedAmountExceedsRequested {
                    approved,
                    requested: amount,
                });
            }
        }
    }

    if let Some(term) = patch.term_months {
        term_in_range(term)?;
    }

    let resulting_purpose = patch.purpose.unwrap_or(existing.purpose);
    if resulting_purpose == CreditPurpose::Other {
        let resulting_other = patch
            .purpose_other
            .as_deref()
            .or(existing.purpose_other.as_deref());
        purpose_other_present(resulting_other)?;
    }

    if let Some(score) = patch.risk_score {
        if score < Decimal::ZERO || score > Decimal::from(100) {
            return Err(ValidationError::RiskScoreOutOfRange { score });
        }
    }

    if let Some(rate) = patch.interest_rate {
        if rate < Decimal::ZERO {
            return Err(ValidationError::InterestRateNegative);
        }
    }

    // approved_amount is bounded by the stored requested_amount, not by a
    // requested_amount arriving in the same patch.
    if let Some(approved) = patch.approved_amount {
        if approved <= Decimal::ZERO {
            return Err(ValidationError::ApprovedAmountNotPositive);
        }
        if approved > existing.requested_amount {
            return Err(ValidationError::ApprovedAmountExceedsRequested {
                approved,
                requested: existing.requested_amount,
            });
        }
    }

    let resulting_status = patch.status.unwrap_or(existing.status);
    if resulting_status == ApplicationStatus::Approved
        && patch.interest_rate.or(existing.interest_rate).is_none()
    {
        return Err(ValidationError::InterestRateRequiredForApproval);
    }

    Ok(())
}
