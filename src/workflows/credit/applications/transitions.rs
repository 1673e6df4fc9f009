use super::domain::ApplicationStatus;

/// Legal next states for staff-driven review moves. Draft rows are not
/// actionable by staff at all, and terminal states have no exits.
pub const fn staff_transitions(from: ApplicationStatus) -> &'static [ApplicationStatus] {
    match from {
        ApplicationStatus::Pending => &[
            ApplicationStatus::InReview,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ],
        ApplicationStatus::InReview => &[ApplicationStatus::Approved, ApplicationStatus::Rejected],
        ApplicationStatus::Draft | ApplicationStatus::Approved | ApplicationStatus::Rejected => &[],
    }
}

pub const fn is_terminal(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Approved | ApplicationStatus::Rejected
    )
}

/// The single move an applicant may make: submitting a draft.
pub const fn is_applicant_submission(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    matches!(
        (from, to),
        (ApplicationStatus::Draft, ApplicationStatus::Pending)
    )
}

/// Raised when a requested status move is not in the transition table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid status transition: '{}' -> '{}'; legal next states: [{}]",
    .from.label(),
    .to.label(),
    format_states(.allowed)
)]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub allowed: &'static [ApplicationStatus],
}

fn format_states(states: &[ApplicationStatus]) -> String {
    states
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a staff status move against the transition table.
pub fn check_staff_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<(), InvalidTransition> {
    let allowed = staff_transitions(from);
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(InvalidTransition { from, to, allowed })
    }
}
