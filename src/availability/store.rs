use crate::availability::classifier::{self, DayFlags, DayStatus};
use crate::availability::errors::StoreError;
use crate::client::{ApiError, AvailabilityService};
use crate::models::{AvailabilityRange, AvailabilitySnapshot, PropertyStatus, RangeUpdate};
use crate::session::SessionContext;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct StoreState {
    property_id: Option<String>,
    snapshot: AvailabilitySnapshot,
    /// Bumped on every load and close; responses to requests issued under
    /// an older generation are dropped.
    generation: u64,
}

/// The view a request was issued for
#[derive(Debug, Clone)]
struct Ticket {
    property_id: String,
    generation: u64,
}

/// Clears the in-flight flag when a write finishes, however it finishes
struct WriteGuard<'a>(&'a AtomicBool);

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Authoritative calendar of the currently open property.
///
/// Local ranges only ever change from a service response (or, for a plain
/// range deletion, by dropping the deleted range). Nothing here merges
/// ranges optimistically.
pub struct AvailabilityStore {
    service: Arc<dyn AvailabilityService>,
    session: SessionContext,
    state: Mutex<StoreState>,
    writing: AtomicBool,
}

impl AvailabilityStore {
    pub fn new(service: Arc<dyn AvailabilityService>, session: SessionContext) -> Self {
        Self {
            service,
            session,
            state: Mutex::new(StoreState::default()),
            writing: AtomicBool::new(false),
        }
    }

    pub fn property_id(&self) -> Option<String> {
        self.state().property_id.clone()
    }

    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.state().snapshot.clone()
    }

    pub fn ranges(&self) -> Vec<AvailabilityRange> {
        self.state().snapshot.ranges.clone()
    }

    /// Property-level status from the last response
    pub fn status(&self) -> PropertyStatus {
        self.state().snapshot.status.clone()
    }

    /// Reserved and occupied ranges, earliest first
    pub fn bookings(&self) -> Vec<AvailabilityRange> {
        let mut bookings: Vec<_> = self
            .state()
            .snapshot
            .ranges
            .iter()
            .filter(|range| range.status.is_booked())
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.end_date.cmp(&b.end_date)));
        bookings
    }

    pub fn classify(&self, date: NaiveDate) -> DayFlags {
        classifier::classify(date, &self.state().snapshot.ranges)
    }

    pub fn month(&self, year: i32, month: u32) -> Option<Vec<(NaiveDate, DayStatus)>> {
        classifier::month(year, month, &self.state().snapshot.ranges)
    }

    /// Whether a write is waiting for the service
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::Acquire)
    }

    /// Open `property_id` and replace the local calendar with the service's.
    ///
    /// On failure the calendar is emptied rather than left stale. Reloading
    /// the open property while a write is in flight fails with
    /// [`StoreError::Busy`], so the write's confirmed calendar is not lost.
    pub async fn load(&self, property_id: &str) -> Result<(), StoreError> {
        let ticket = {
            let mut state = self.state();
            if self.is_writing() && state.property_id.as_deref() == Some(property_id) {
                return Err(StoreError::Busy);
            }
            state.generation += 1;
            if state.property_id.as_deref() != Some(property_id) {
                state.property_id = Some(property_id.to_string());
                state.snapshot = AvailabilitySnapshot::default();
            }
            Ticket {
                property_id: property_id.to_string(),
                generation: state.generation,
            }
        };

        info!(property_id, "Loading availability");
        match self.service.fetch_availability(&ticket.property_id).await {
            Ok(snapshot) => {
                let count = snapshot.ranges.len();
                self.commit(&ticket, |state| state.snapshot = snapshot)?;
                info!(property_id, ranges = count, "Availability loaded");
                Ok(())
            }
            Err(err) => {
                warn!(property_id, error = %err, "Failed to load availability");
                self.commit(&ticket, |state| state.snapshot = AvailabilitySnapshot::default())?;
                Err(err.into())
            }
        }
    }

    /// Leave the current property. Responses still in flight are dropped.
    pub fn close(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.property_id = None;
        state.snapshot = AvailabilitySnapshot::default();
    }

    /// Send a range change and adopt the service's resulting calendar.
    ///
    /// On failure the local calendar is left untouched.
    pub async fn upsert_range(&self, update: RangeUpdate) -> Result<(), StoreError> {
        let (ticket, _guard) = self.begin_write()?;

        info!(
            property_id = %ticket.property_id,
            status = %update.status,
            start = %update.start_date,
            end = %update.end_date,
            "Saving range"
        );
        let snapshot = self
            .service
            .upsert_range(&ticket.property_id, &update)
            .await
            .inspect_err(|err| warn!(property_id = %ticket.property_id, error = %err, "Failed to save range"))?;

        let count = snapshot.ranges.len();
        self.commit(&ticket, |state| state.snapshot = snapshot)?;
        debug!(property_id = %ticket.property_id, ranges = count, "Calendar reconciled");
        Ok(())
    }

    /// Delete a range by id and return it.
    ///
    /// A deleted booking does not leave a hole: its interval is marked
    /// available again, and the calendar adopts the service's answer to that.
    /// The local calendar changes only once every call has succeeded; a view
    /// closed meanwhile drops the local update but not the second call.
    pub async fn delete_range(&self, range_id: &str) -> Result<AvailabilityRange, StoreError> {
        let (ticket, _guard) = self.begin_write()?;

        let range = self
            .state()
            .snapshot
            .ranges
            .iter()
            .find(|range| !range_id.is_empty() && range.id == range_id)
            .cloned()
            .ok_or_else(|| StoreError::RangeNotFound(range_id.to_string()))?;

        info!(property_id = %ticket.property_id, range_id, status = %range.status, "Deleting range");
        self.service
            .delete_range(&ticket.property_id, range_id)
            .await
            .inspect_err(|err| warn!(range_id, error = %err, "Failed to delete range"))?;

        let reverted = if range.status.is_booked() {
            let revert = RangeUpdate::available(range.start_date, range.end_date);
            let snapshot = self
                .service
                .upsert_range(&ticket.property_id, &revert)
                .await
                .inspect_err(|err| warn!(range_id, error = %err, "Failed to mark deleted booking available"))?;
            Some(snapshot)
        } else {
            None
        };

        self.commit(&ticket, |state| match reverted {
            Some(snapshot) => state.snapshot = snapshot,
            None => state.snapshot.ranges.retain(|r| r.id != range_id),
        })?;
        Ok(range)
    }

    /// Flip one day between booked and not booked, returning its new
    /// classification. The day may sit inside a larger range, which the
    /// service splits or narrows.
    pub async fn delete_single_day(&self, date: NaiveDate) -> Result<DayFlags, StoreError> {
        let (ticket, _guard) = self.begin_write()?;

        info!(property_id = %ticket.property_id, %date, "Toggling day");
        let snapshot = self
            .service
            .toggle_day(&ticket.property_id, date)
            .await
            .inspect_err(|err| warn!(%date, error = %err, "Failed to toggle day"))?;

        // property-level status is kept; this endpoint only reshapes ranges
        self.commit(&ticket, |state| state.snapshot.ranges = snapshot.ranges)?;
        Ok(self.classify(date))
    }

    fn begin_write(&self) -> Result<(Ticket, WriteGuard<'_>), StoreError> {
        let ticket = {
            let state = self.state();
            let property_id = state.property_id.clone().ok_or(StoreError::NoPropertySelected)?;
            Ticket {
                property_id,
                generation: state.generation,
            }
        };

        if !self.session.is_authenticated() {
            return Err(ApiError::MissingToken.into());
        }

        self.writing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StoreError::Busy)?;

        Ok((ticket, WriteGuard(&self.writing)))
    }

    fn commit(&self, ticket: &Ticket, apply: impl FnOnce(&mut StoreState)) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.generation != ticket.generation {
            debug!(property_id = %ticket.property_id, "Dropping response for a superseded view");
            return Err(StoreError::Superseded);
        }
        apply(&mut state);
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
