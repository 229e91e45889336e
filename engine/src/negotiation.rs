//! Quotation negotiation service.
//!
//! Wires the quotation state machine to the stores and the scheduling
//! engine. Every status change goes through
//! [`crate::quotation::transition`]; accepting a quotation is the moment
//! a negotiation becomes a calendar appointment, so the proposed slot is
//! validated against the artist's availability first.

use atelier_core::actor::{Actor, ActorRole};
use atelier_core::appointment::Appointment;
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::ids::{OfferId, QuotationId, UserId};
use atelier_core::money::Money;
use atelier_core::quotation::{BudgetRange, Offer, Quotation, QuotationStatus, QuotationType};
use atelier_core::store::{AgendaStore, AppointmentStore, QuotationStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::quotation as machine;
use crate::scheduling::Availability;

/// The negotiation service.
pub struct Negotiation {
    quotations: Arc<dyn QuotationStore>,
    agendas: Arc<dyn AgendaStore>,
    appointments: Arc<dyn AppointmentStore>,
    availability: Arc<Availability>,
    clock: Arc<dyn Clock>,
}

impl Negotiation {
    /// Creates the negotiation service over its ports.
    #[must_use]
    pub fn new(
        quotations: Arc<dyn QuotationStore>,
        agendas: Arc<dyn AgendaStore>,
        appointments: Arc<dyn AppointmentStore>,
        availability: Arc<Availability>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quotations,
            agendas,
            appointments,
            availability,
            clock,
        }
    }

    /// Opens a direct quotation addressed to one artist.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the artist has no agenda
    /// - [`BookingError::UnprocessableEntity`] when the agenda is not
    ///   accepting new appointments
    /// - [`BookingError::Store`] when persistence fails
    pub async fn request_direct(
        &self,
        customer_id: UserId,
        artist_id: UserId,
        description: impl Into<String> + Send,
        duration_minutes: u32,
        proposed_start: Option<DateTime<Utc>>,
        budget: Option<BudgetRange>,
    ) -> Result<Quotation, BookingError> {
        let agenda = self
            .agendas
            .find_by_artist(artist_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", artist_id))?;
        if !agenda.open {
            return Err(BookingError::unprocessable(format!(
                "artist {artist_id} is not accepting new appointments"
            )));
        }
        let mut quotation = Quotation::direct(
            customer_id,
            artist_id,
            description,
            duration_minutes,
            self.clock.now(),
        );
        quotation.proposed_start = proposed_start;
        quotation.budget = budget;
        self.quotations.create(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation.id, kind = "direct", "quotation opened");
        Ok(quotation)
    }

    /// Opens an open (marketplace) quotation any artist may bid on.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] when persistence fails.
    pub async fn request_open(
        &self,
        customer_id: UserId,
        description: impl Into<String> + Send,
        duration_minutes: u32,
        proposed_start: Option<DateTime<Utc>>,
        budget: Option<BudgetRange>,
    ) -> Result<Quotation, BookingError> {
        let mut quotation =
            Quotation::open(customer_id, description, duration_minutes, self.clock.now());
        quotation.proposed_start = proposed_start;
        quotation.budget = budget;
        self.quotations.create(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation.id, kind = "open", "quotation opened");
        Ok(quotation)
    }

    /// The artist answers with a price (and optionally a proposed start),
    /// moving the negotiation to `quoted`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation does not exist
    /// - [`BookingError::Forbidden`] when the caller is not the
    ///   quotation's artist
    /// - [`BookingError::UnprocessableEntity`] when `quoted` is not
    ///   reachable from the current status
    /// - [`BookingError::Store`] when persistence fails
    pub async fn submit_quote(
        &self,
        quotation_id: QuotationId,
        artist_id: UserId,
        price: Money,
        proposed_start: Option<DateTime<Utc>>,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        if quotation.artist_id != Some(artist_id) {
            return Err(BookingError::forbidden(format!(
                "artist {artist_id} is not part of quotation {quotation_id}"
            )));
        }
        quotation.status = machine::transition(&quotation, QuotationStatus::Quoted)?;
        quotation.agreed_price = Some(price);
        if proposed_start.is_some() {
            quotation.proposed_start = proposed_start;
        }
        self.quotations.save(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation_id, price = %price, "quote submitted");
        Ok(quotation)
    }

    /// An artist bids on an open quotation. Offers are only collected
    /// while the negotiation is still `pending`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation does not exist
    /// - [`BookingError::UnprocessableEntity`] when the quotation is not
    ///   open, or no longer pending
    /// - [`BookingError::Store`] when persistence fails
    pub async fn submit_offer(
        &self,
        quotation_id: QuotationId,
        artist_id: UserId,
        price: Money,
        message: Option<String>,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        if quotation.kind != QuotationType::Open {
            return Err(BookingError::unprocessable(format!(
                "quotation {quotation_id} is direct and takes no offers"
            )));
        }
        if quotation.status != QuotationStatus::Pending {
            return Err(BookingError::unprocessable(format!(
                "quotation {quotation_id} is {} and takes no more offers",
                quotation.status
            )));
        }
        quotation.offers.push(Offer {
            id: OfferId::new(),
            quotation_id,
            artist_id,
            price,
            message,
            created_at: self.clock.now(),
        });
        self.quotations.save(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation_id, artist_id = %artist_id, "offer submitted");
        Ok(quotation)
    }

    /// The customer picks one offer: the bidding artist and their price
    /// become the quote, moving the negotiation to `quoted`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation or offer does not
    ///   exist
    /// - [`BookingError::Forbidden`] when the caller is not the
    ///   quotation's customer
    /// - [`BookingError::UnprocessableEntity`] when `quoted` is not
    ///   reachable from the current status
    /// - [`BookingError::Store`] when persistence fails
    pub async fn choose_offer(
        &self,
        quotation_id: QuotationId,
        customer_id: UserId,
        offer_id: OfferId,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        self.require_customer(&quotation, customer_id)?;
        let offer = quotation
            .offers
            .iter()
            .find(|offer| offer.id == offer_id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("Offer", offer_id))?;
        quotation.status = machine::transition(&quotation, QuotationStatus::Quoted)?;
        quotation.artist_id = Some(offer.artist_id);
        quotation.agreed_price = Some(offer.price);
        self.quotations.save(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation_id, offer_id = %offer_id, "offer chosen");
        Ok(quotation)
    }

    /// The customer pushes back on the quote.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation does not exist
    /// - [`BookingError::Forbidden`] when the caller is not the
    ///   quotation's customer
    /// - [`BookingError::UnprocessableEntity`] when `appealed` is not
    ///   reachable from the current status
    /// - [`BookingError::Store`] when persistence fails
    pub async fn appeal(
        &self,
        quotation_id: QuotationId,
        customer_id: UserId,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        self.require_customer(&quotation, customer_id)?;
        quotation.status = machine::transition(&quotation, QuotationStatus::Appealed)?;
        self.quotations.save(quotation.clone()).await?;
        Ok(quotation)
    }

    /// Either side walks away from the negotiation.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation does not exist
    /// - [`BookingError::Forbidden`] when the actor is not a party to
    ///   the quotation
    /// - [`BookingError::UnprocessableEntity`] when `rejected` is not
    ///   reachable from the current status
    /// - [`BookingError::Store`] when persistence fails
    pub async fn reject(
        &self,
        quotation_id: QuotationId,
        actor: Actor,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        let is_party = match actor.role {
            ActorRole::Artist => quotation.artist_id == Some(actor.id),
            ActorRole::Customer => quotation.customer_id == actor.id,
        };
        if !is_party {
            return Err(BookingError::forbidden(format!(
                "{} {} is not a party to quotation {}",
                actor.role, actor.id, quotation_id
            )));
        }
        quotation.status = machine::transition(&quotation, QuotationStatus::Rejected)?;
        self.quotations.save(quotation.clone()).await?;
        tracing::info!(quotation_id = %quotation_id, by = %actor.role, "quotation rejected");
        Ok(quotation)
    }

    /// The customer withdraws the request.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation does not exist
    /// - [`BookingError::Forbidden`] when the caller is not the
    ///   quotation's customer
    /// - [`BookingError::UnprocessableEntity`] when `canceled` is not
    ///   reachable from the current status
    /// - [`BookingError::Store`] when persistence fails
    pub async fn cancel(
        &self,
        quotation_id: QuotationId,
        customer_id: UserId,
    ) -> Result<Quotation, BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        self.require_customer(&quotation, customer_id)?;
        quotation.status = machine::transition(&quotation, QuotationStatus::Canceled)?;
        self.quotations.save(quotation.clone()).await?;
        Ok(quotation)
    }

    /// The customer accepts the quote: the proposed slot is validated
    /// against the artist's availability, the appointment is created
    /// `scheduled`, and the negotiation moves to `accepted`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation or the artist's
    ///   agenda does not exist
    /// - [`BookingError::Forbidden`] when the caller is not the
    ///   quotation's customer
    /// - [`BookingError::UnprocessableEntity`] when `accepted` is not
    ///   reachable, no start was proposed, or the slot is not bookable
    /// - [`BookingError::Store`] when persistence fails
    pub async fn accept(
        &self,
        quotation_id: QuotationId,
        customer_id: UserId,
    ) -> Result<(Quotation, Appointment), BookingError> {
        let mut quotation = self.find(quotation_id).await?;
        self.require_customer(&quotation, customer_id)?;
        let next = machine::transition(&quotation, QuotationStatus::Accepted)?;
        let artist_id = quotation.artist_id.ok_or_else(|| {
            BookingError::unprocessable(format!(
                "quotation {quotation_id} has no artist attached yet"
            ))
        })?;
        let start = quotation.proposed_start.ok_or_else(|| {
            BookingError::unprocessable(format!(
                "quotation {quotation_id} has no proposed appointment time"
            ))
        })?;
        let agenda = self
            .agendas
            .find_by_artist(artist_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", artist_id))?;

        let validation = self
            .availability
            .validate_appointment_time(agenda.id, start, quotation.duration_minutes)
            .await?;
        if let Some(reason) = validation.reason {
            return Err(BookingError::unprocessable(format!(
                "proposed slot is not bookable: {reason}"
            )));
        }

        let end = start + Duration::minutes(i64::from(quotation.duration_minutes));
        let appointment = Appointment::schedule(
            agenda.id,
            customer_id,
            Some(quotation_id),
            start,
            end,
            Actor::customer(customer_id),
            self.clock.now(),
        )?;
        self.appointments.create(appointment.clone()).await?;

        quotation.status = next;
        self.quotations.save(quotation.clone()).await?;
        tracing::info!(
            quotation_id = %quotation_id,
            appointment_id = %appointment.id,
            "quotation accepted, appointment scheduled"
        );
        Ok((quotation, appointment))
    }

    /// Books an appointment directly, without a preceding negotiation.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the artist has no agenda
    /// - [`BookingError::UnprocessableEntity`] when the agenda is closed
    ///   or the slot is not bookable
    /// - [`BookingError::BadRequest`] when the duration is zero
    /// - [`BookingError::Store`] when persistence fails
    pub async fn book_direct(
        &self,
        customer_id: UserId,
        artist_id: UserId,
        start: DateTime<Utc>,
        duration_minutes: u32,
        notes: Option<String>,
    ) -> Result<Appointment, BookingError> {
        let agenda = self
            .agendas
            .find_by_artist(artist_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", artist_id))?;
        if !agenda.open {
            return Err(BookingError::unprocessable(format!(
                "artist {artist_id} is not accepting new appointments"
            )));
        }

        let validation = self
            .availability
            .validate_appointment_time(agenda.id, start, duration_minutes)
            .await?;
        if let Some(reason) = validation.reason {
            return Err(BookingError::unprocessable(format!(
                "proposed slot is not bookable: {reason}"
            )));
        }

        let end = start + Duration::minutes(i64::from(duration_minutes));
        let mut appointment = Appointment::schedule(
            agenda.id,
            customer_id,
            None,
            start,
            end,
            Actor::customer(customer_id),
            self.clock.now(),
        )?;
        appointment.notes = notes;
        self.appointments.create(appointment.clone()).await?;
        tracing::info!(appointment_id = %appointment.id, "direct appointment booked");
        Ok(appointment)
    }

    async fn find(&self, quotation_id: QuotationId) -> Result<Quotation, BookingError> {
        self.quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Quotation", quotation_id))
    }

    fn require_customer(
        &self,
        quotation: &Quotation,
        customer_id: UserId,
    ) -> Result<(), BookingError> {
        if quotation.customer_id == customer_id {
            Ok(())
        } else {
            Err(BookingError::forbidden(format!(
                "customer {customer_id} is not a party to quotation {}",
                quotation.id
            )))
        }
    }
}
