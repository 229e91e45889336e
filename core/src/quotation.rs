//! Quotation entities: the negotiation record preceding an appointment.

use crate::ids::{OfferId, QuotationId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a quotation negotiation.
///
/// `Accepted`, `Rejected` and `Canceled` are terminal; the allowed moves
/// between the non-terminal statuses are owned by the quotation state
/// machine in `atelier-engine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Created by the customer, awaiting the artist's answer.
    Pending,
    /// The artist has proposed a price (or the customer picked an offer).
    Quoted,
    /// The customer pushed back on the quote.
    Appealed,
    /// Terminal: the customer accepted and an appointment was created.
    Accepted,
    /// Terminal: one side rejected the negotiation.
    Rejected,
    /// Terminal: the customer withdrew the request.
    Canceled,
}

impl QuotationStatus {
    /// Every quotation status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Quoted,
        Self::Appealed,
        Self::Accepted,
        Self::Rejected,
        Self::Canceled,
    ];

    /// String form used in persistence and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Quoted => "quoted",
            Self::Appealed => "appealed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }

    /// Parses a status from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known status.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(Self::Pending),
            "quoted" => Ok(Self::Quoted),
            "appealed" => Ok(Self::Appealed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown quotation status: {other}")),
        }
    }

    /// Whether no further transitions are allowed from this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Canceled)
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the quotation was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationType {
    /// Addressed to one specific artist.
    Direct,
    /// Marketplace-style: any artist may submit an offer.
    Open,
}

impl QuotationType {
    /// String form used in persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Open => "open",
        }
    }

    /// Parses a quotation type from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known type.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "direct" => Ok(Self::Direct),
            "open" => Ok(Self::Open),
            other => Err(format!("unknown quotation type: {other}")),
        }
    }
}

/// Customer's budget expectations for the work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    /// Lower bound.
    pub min: Money,
    /// Upper bound.
    pub max: Money,
}

/// An artist's proposal against an open quotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer identifier.
    pub id: OfferId,
    /// The quotation the offer answers.
    pub quotation_id: QuotationId,
    /// The bidding artist.
    pub artist_id: UserId,
    /// Proposed price.
    pub price: Money,
    /// Optional free-text pitch.
    pub message: Option<String>,
    /// When the offer was made.
    pub created_at: DateTime<Utc>,
}

/// A negotiation between one customer and (eventually) one artist.
///
/// Quotations are soft-retained for audit: they are never physically
/// deleted, terminal statuses just stop the machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    /// Quotation identifier.
    pub id: QuotationId,
    /// The requesting customer.
    pub customer_id: UserId,
    /// The artist on the other side. `None` for an open quotation until
    /// the customer picks an offer.
    pub artist_id: Option<UserId>,
    /// Current negotiation status.
    pub status: QuotationStatus,
    /// Direct or open.
    pub kind: QuotationType,
    /// What the customer wants done.
    pub description: String,
    /// Customer's budget expectations, if stated.
    pub budget: Option<BudgetRange>,
    /// Proposed appointment start, once one is on the table.
    pub proposed_start: Option<DateTime<Utc>>,
    /// Requested appointment duration in minutes.
    pub duration_minutes: u32,
    /// Price agreed during negotiation; feeds percentage penalties.
    pub agreed_price: Option<Money>,
    /// Offers received (open quotations only).
    pub offers: Vec<Offer>,
    /// When the negotiation was opened.
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    /// Opens a direct quotation addressed to one artist.
    #[must_use]
    pub fn direct(
        customer_id: UserId,
        artist_id: UserId,
        description: impl Into<String>,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QuotationId::new(),
            customer_id,
            artist_id: Some(artist_id),
            status: QuotationStatus::Pending,
            kind: QuotationType::Direct,
            description: description.into(),
            budget: None,
            proposed_start: None,
            duration_minutes,
            agreed_price: None,
            offers: Vec::new(),
            created_at: now,
        }
    }

    /// Opens an open (marketplace) quotation with no artist attached yet.
    #[must_use]
    pub fn open(
        customer_id: UserId,
        description: impl Into<String>,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QuotationId::new(),
            customer_id,
            artist_id: None,
            status: QuotationStatus::Pending,
            kind: QuotationType::Open,
            description: description.into(),
            budget: None,
            proposed_start: None,
            duration_minutes,
            agreed_price: None,
            offers: Vec::new(),
            created_at: now,
        }
    }

    /// The negotiated value, zero while no price has been agreed.
    #[must_use]
    pub fn value(&self) -> Money {
        self.agreed_price.unwrap_or(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in QuotationStatus::ALL {
            assert_eq!(QuotationStatus::parse(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(QuotationStatus::Accepted.is_terminal());
        assert!(QuotationStatus::Rejected.is_terminal());
        assert!(QuotationStatus::Canceled.is_terminal());
        assert!(!QuotationStatus::Pending.is_terminal());
        assert!(!QuotationStatus::Quoted.is_terminal());
        assert!(!QuotationStatus::Appealed.is_terminal());
    }

    #[test]
    fn value_defaults_to_zero() {
        let quotation = Quotation::open(UserId::new(), "back piece", 120, Utc::now());
        assert_eq!(quotation.value(), Money::ZERO);
    }
}
