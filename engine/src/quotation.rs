//! Quotation negotiation state machine.
//!
//! A pure validator: it decides whether a move is legal and returns the
//! new status; persisting the result is the caller's job (see
//! [`crate::negotiation`]). There are no side effects and no retries.

use atelier_core::error::BookingError;
use atelier_core::quotation::{Quotation, QuotationStatus};

/// The allowed targets from each status.
///
/// Terminal statuses (`accepted`, `rejected`, `canceled`) map to the
/// empty set.
#[must_use]
pub const fn allowed_targets(status: QuotationStatus) -> &'static [QuotationStatus] {
    match status {
        QuotationStatus::Pending => &[
            QuotationStatus::Quoted,
            QuotationStatus::Canceled,
            QuotationStatus::Rejected,
        ],
        QuotationStatus::Quoted => &[
            QuotationStatus::Accepted,
            QuotationStatus::Rejected,
            QuotationStatus::Appealed,
        ],
        QuotationStatus::Appealed => &[QuotationStatus::Quoted, QuotationStatus::Rejected],
        QuotationStatus::Accepted | QuotationStatus::Rejected | QuotationStatus::Canceled => &[],
    }
}

/// Whether `target` is reachable from `from` in one step.
#[must_use]
pub fn is_transition_allowed(from: QuotationStatus, target: QuotationStatus) -> bool {
    allowed_targets(from).contains(&target)
}

/// The quotation's current status.
#[must_use]
pub const fn current_state(quotation: &Quotation) -> QuotationStatus {
    quotation.status
}

/// Validates a transition and returns the new status.
///
/// # Errors
///
/// Returns [`BookingError::UnprocessableEntity`] naming both statuses
/// when `target` is not in the allowed set of the quotation's current
/// status. The quotation itself is untouched either way.
pub fn transition(
    quotation: &Quotation,
    target: QuotationStatus,
) -> Result<QuotationStatus, BookingError> {
    if is_transition_allowed(quotation.status, target) {
        Ok(target)
    } else {
        Err(BookingError::unprocessable(format!(
            "quotation {}: cannot move from {} to {}",
            quotation.id, quotation.status, target
        )))
    }
}
