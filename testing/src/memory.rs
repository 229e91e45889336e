//! In-memory store fakes.
//!
//! Each fake is a `HashMap` behind a `tokio::sync::RwLock` and is cheap
//! to clone (clones share the map). They implement the same contracts as
//! the Postgres stores, including the optimistic `StaleWrite` guard on
//! appointment writes.

use atelier_core::agenda::{Agenda, BlockedTime};
use atelier_core::appointment::{Appointment, AppointmentStatus};
use atelier_core::ids::{AgendaId, AppointmentId, BlockedTimeId, PenaltyId, QuotationId, UserId};
use atelier_core::penalty::{CancellationPenalty, PenaltyStatus};
use atelier_core::quotation::Quotation;
use atelier_core::store::{
    AgendaStore, AppointmentStore, BlockedTimeStore, PenaltyStore, QuotationStore, StoreError,
    StoreFuture,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`QuotationStore`].
#[derive(Clone, Default)]
pub struct InMemoryQuotationStore {
    inner: Arc<RwLock<HashMap<QuotationId, Quotation>>>,
}

impl InMemoryQuotationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a quotation directly, bypassing the port.
    pub async fn insert(&self, quotation: Quotation) {
        self.inner.write().await.insert(quotation.id, quotation);
    }
}

impl QuotationStore for InMemoryQuotationStore {
    fn find_by_id(&self, id: QuotationId) -> StoreFuture<'_, Option<Quotation>> {
        Box::pin(async move { Ok(self.inner.read().await.get(&id).cloned()) })
    }

    fn create(&self, quotation: Quotation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            if map.contains_key(&quotation.id) {
                return Err(StoreError::Database(format!(
                    "duplicate quotation id {}",
                    quotation.id
                )));
            }
            map.insert(quotation.id, quotation);
            Ok(())
        })
    }

    fn save(&self, quotation: Quotation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            if !map.contains_key(&quotation.id) {
                return Err(StoreError::Database(format!(
                    "quotation {} does not exist",
                    quotation.id
                )));
            }
            map.insert(quotation.id, quotation);
            Ok(())
        })
    }
}

/// In-memory [`AgendaStore`].
#[derive(Clone, Default)]
pub struct InMemoryAgendaStore {
    inner: Arc<RwLock<HashMap<AgendaId, Agenda>>>,
}

impl InMemoryAgendaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an agenda directly, bypassing the port.
    pub async fn insert(&self, agenda: Agenda) {
        self.inner.write().await.insert(agenda.id, agenda);
    }
}

impl AgendaStore for InMemoryAgendaStore {
    fn find_by_id(&self, id: AgendaId) -> StoreFuture<'_, Option<Agenda>> {
        Box::pin(async move { Ok(self.inner.read().await.get(&id).cloned()) })
    }

    fn find_by_artist(&self, artist_id: UserId) -> StoreFuture<'_, Option<Agenda>> {
        Box::pin(async move {
            Ok(self
                .inner
                .read()
                .await
                .values()
                .find(|agenda| agenda.artist_id == artist_id)
                .cloned())
        })
    }

    fn save(&self, agenda: Agenda) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.inner.write().await.insert(agenda.id, agenda);
            Ok(())
        })
    }
}

/// In-memory [`AppointmentStore`].
///
/// Holds a handle to an [`InMemoryAgendaStore`] so `find_with_agenda`
/// can perform the same join the Postgres store does.
#[derive(Clone)]
pub struct InMemoryAppointmentStore {
    inner: Arc<RwLock<HashMap<AppointmentId, Appointment>>>,
    agendas: InMemoryAgendaStore,
}

impl InMemoryAppointmentStore {
    /// Creates an empty store joined to the given agenda store.
    #[must_use]
    pub fn new(agendas: InMemoryAgendaStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            agendas,
        }
    }

    /// Seeds an appointment directly, bypassing the port.
    pub async fn insert(&self, appointment: Appointment) {
        self.inner.write().await.insert(appointment.id, appointment);
    }

    /// Reads an appointment back for assertions.
    pub async fn get(&self, id: AppointmentId) -> Option<Appointment> {
        self.inner.read().await.get(&id).cloned()
    }
}

impl AppointmentStore for InMemoryAppointmentStore {
    fn find_with_agenda(
        &self,
        id: AppointmentId,
    ) -> StoreFuture<'_, Option<(Appointment, Agenda)>> {
        Box::pin(async move {
            let Some(appointment) = self.inner.read().await.get(&id).cloned() else {
                return Ok(None);
            };
            let agenda = self
                .agendas
                .inner
                .read()
                .await
                .get(&appointment.agenda_id)
                .cloned()
                .ok_or_else(|| {
                    StoreError::Database(format!(
                        "appointment {id} references missing agenda {}",
                        appointment.agenda_id
                    ))
                })?;
            Ok(Some((appointment, agenda)))
        })
    }

    fn find_active_between(
        &self,
        agenda_id: AgendaId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<Appointment>> {
        Box::pin(async move {
            let mut found: Vec<Appointment> = self
                .inner
                .read()
                .await
                .values()
                .filter(|a| {
                    a.agenda_id == agenda_id && a.blocks_calendar() && a.overlaps(from, until)
                })
                .cloned()
                .collect();
            found.sort_by_key(|a| a.start);
            Ok(found)
        })
    }

    fn create(&self, appointment: Appointment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            if map.contains_key(&appointment.id) {
                return Err(StoreError::Database(format!(
                    "duplicate appointment id {}",
                    appointment.id
                )));
            }
            map.insert(appointment.id, appointment);
            Ok(())
        })
    }

    fn save(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            match map.get(&appointment.id) {
                None => Err(StoreError::Database(format!(
                    "appointment {} does not exist",
                    appointment.id
                ))),
                Some(current) if current.status() != expected_status => {
                    Err(StoreError::StaleWrite(format!(
                        "appointment {} is {} but the caller read {}",
                        appointment.id,
                        current.status(),
                        expected_status
                    )))
                }
                Some(_) => {
                    map.insert(appointment.id, appointment);
                    Ok(())
                }
            }
        })
    }
}

/// In-memory [`BlockedTimeStore`].
#[derive(Clone, Default)]
pub struct InMemoryBlockedTimeStore {
    inner: Arc<RwLock<HashMap<BlockedTimeId, BlockedTime>>>,
}

impl InMemoryBlockedTimeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockedTimeStore for InMemoryBlockedTimeStore {
    fn find_for_agenda(&self, agenda_id: AgendaId) -> StoreFuture<'_, Vec<BlockedTime>> {
        Box::pin(async move {
            let mut found: Vec<BlockedTime> = self
                .inner
                .read()
                .await
                .values()
                .filter(|b| b.agenda_id == agenda_id)
                .cloned()
                .collect();
            found.sort_by_key(|b| b.start);
            Ok(found)
        })
    }

    fn find_overlapping(
        &self,
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<BlockedTime>> {
        Box::pin(async move {
            let mut found: Vec<BlockedTime> = self
                .inner
                .read()
                .await
                .values()
                .filter(|b| b.agenda_id == agenda_id && b.overlaps_inclusive(start, end))
                .cloned()
                .collect();
            found.sort_by_key(|b| b.start);
            Ok(found)
        })
    }

    fn create(&self, block: BlockedTime) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.inner.write().await.insert(block.id, block);
            Ok(())
        })
    }

    fn delete(&self, agenda_id: AgendaId, id: BlockedTimeId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            match map.get(&id) {
                Some(block) if block.agenda_id == agenda_id => {
                    map.remove(&id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }
}

/// In-memory [`PenaltyStore`].
#[derive(Clone, Default)]
pub struct InMemoryPenaltyStore {
    inner: Arc<RwLock<HashMap<PenaltyId, CancellationPenalty>>>,
}

impl InMemoryPenaltyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows currently held, for assertions.
    pub async fn all(&self) -> Vec<CancellationPenalty> {
        self.inner.read().await.values().cloned().collect()
    }
}

impl PenaltyStore for InMemoryPenaltyStore {
    fn create(&self, penalty: CancellationPenalty) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            if map.contains_key(&penalty.id) {
                return Err(StoreError::Database(format!(
                    "duplicate penalty id {}",
                    penalty.id
                )));
            }
            map.insert(penalty.id, penalty);
            Ok(())
        })
    }

    fn find_by_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> StoreFuture<'_, Vec<CancellationPenalty>> {
        Box::pin(async move {
            Ok(self
                .inner
                .read()
                .await
                .values()
                .filter(|p| p.appointment_id == appointment_id)
                .cloned()
                .collect())
        })
    }

    fn set_status(&self, id: PenaltyId, status: PenaltyStatus) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut map = self.inner.write().await;
            let Some(penalty) = map.get_mut(&id) else {
                return Err(StoreError::Database(format!("penalty {id} does not exist")));
            };
            penalty.status = status;
            Ok(())
        })
    }
}
