use crate::availability::classifier::DayFlags;
use crate::availability::errors::{BookingError, StoreError};
use crate::availability::store::AvailabilityStore;
use crate::availability::validator::{validate, DateSelection, Intent};
use crate::client::AvailabilityService;
use crate::models::{AvailabilityRange, Property, RangeUpdate};
use crate::notify::Notifier;
use crate::session::SessionContext;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Transient inputs of the booking form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub client_name: String,
    pub deposit: Option<f64>,
    pub guests: Option<u32>,
}

impl BookingForm {
    pub fn dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn client(mut self, name: impl Into<String>, guests: u32) -> Self {
        self.client_name = name.into();
        self.guests = Some(guests);
        self
    }

    pub fn deposit(mut self, deposit: f64) -> Self {
        self.deposit = Some(deposit);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Turn a submitted form into a range update, or say why it is refused.
///
/// Checks run in the order the user would fix them: dates, required fields,
/// capacity, then conflicts with the current calendar.
pub fn prepare_update(
    intent: Intent,
    form: &BookingForm,
    capacity: u32,
    ranges: &[AvailabilityRange],
) -> Result<RangeUpdate, BookingError> {
    let (Some(start), Some(end)) = (form.start, form.end) else {
        return Err(BookingError::NoDatesSelected);
    };
    let selection = DateSelection::new(start, end)?;

    if intent == Intent::Free {
        return Ok(RangeUpdate::available(start, end));
    }

    let client_name = form.client_name.trim();
    let guests = match form.guests {
        Some(guests) if guests > 0 && !client_name.is_empty() => guests,
        _ => return Err(BookingError::MissingClientDetails),
    };

    let deposit = form.deposit.unwrap_or(0.0);
    if !deposit.is_finite() || deposit < 0.0 {
        return Err(BookingError::InvalidDeposit);
    }

    validate(intent, &selection, guests, capacity, ranges)?;

    Ok(RangeUpdate {
        start_date: start,
        end_date: end,
        status: intent.target_status(),
        client_name: client_name.to_string(),
        deposit,
        guests,
    })
}

/// Runs user actions on the open property's calendar end to end:
/// validate, write through the store, then notify.
///
/// Validation and authentication failures stop here; they are reported
/// through the notifier and returned, never retried.
pub struct BookingWorkflow<N: Notifier> {
    store: AvailabilityStore,
    session: SessionContext,
    notifier: N,
    property: Option<Property>,
}

impl<N: Notifier> BookingWorkflow<N> {
    pub fn new(service: Arc<dyn AvailabilityService>, session: SessionContext, notifier: N) -> Self {
        Self {
            store: AvailabilityStore::new(service, session.clone()),
            session,
            notifier,
            property: None,
        }
    }

    pub fn store(&self) -> &AvailabilityStore {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn property(&self) -> Option<&Property> {
        self.property.as_ref()
    }

    /// Open a property and load its calendar
    pub async fn open(&mut self, property: Property) -> Result<(), BookingError> {
        let property_id = property.id.clone();
        self.property = Some(property);

        let result = self.store.load(&property_id).await.map_err(BookingError::from);
        self.report(result, None, "Could not load availability")
    }

    pub fn close(&mut self) {
        self.property = None;
        self.store.close();
    }

    pub async fn reserve(&self, form: &mut BookingForm) -> Result<(), BookingError> {
        self.submit(Intent::Reserve, form).await
    }

    pub async fn occupy(&self, form: &mut BookingForm) -> Result<(), BookingError> {
        self.submit(Intent::Occupy, form).await
    }

    pub async fn mark_available(&self, form: &mut BookingForm) -> Result<(), BookingError> {
        self.submit(Intent::Free, form).await
    }

    /// Delete a range; a deleted booking reverts to available
    pub async fn delete_range(&self, range_id: &str) -> Result<AvailabilityRange, BookingError> {
        let result = self.store.delete_range(range_id).await.map_err(BookingError::from);
        self.report(result, Some("Date range deleted"), "Could not delete the date range")
    }

    /// Toggle one day between booked and not booked
    pub async fn toggle_day(&self, date: NaiveDate) -> Result<DayFlags, BookingError> {
        let result = self.store.delete_single_day(date).await.map_err(BookingError::from);
        self.report(result, Some("Date updated"), "Could not update the date")
    }

    async fn submit(&self, intent: Intent, form: &mut BookingForm) -> Result<(), BookingError> {
        let result = self.write(intent, form).await;
        if result.is_ok() {
            form.clear();
        }

        let (success, fallback) = match intent {
            Intent::Reserve => ("Property reserved", "Could not save the reservation"),
            Intent::Occupy => ("Property marked as occupied", "Could not save the occupancy"),
            Intent::Free => ("Date range marked as available", "Could not update availability"),
        };
        self.report(result, Some(success), fallback)
    }

    async fn write(&self, intent: Intent, form: &BookingForm) -> Result<(), BookingError> {
        let capacity = self
            .property
            .as_ref()
            .map(|property| property.capacity)
            .ok_or(StoreError::NoPropertySelected)?;

        let update = prepare_update(intent, form, capacity, &self.store.ranges())?;
        self.store.upsert_range(update).await?;
        Ok(())
    }

    fn report<T>(
        &self,
        result: Result<T, BookingError>,
        success: Option<&str>,
        fallback: &str,
    ) -> Result<T, BookingError> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.notifier.success(message);
                }
            }
            Err(BookingError::Store(StoreError::Superseded)) => {
                debug!("Result of a superseded request ignored");
            }
            Err(BookingError::Store(StoreError::Api(err))) => {
                if err.is_auth() {
                    self.session.invalidate();
                }
                self.notifier.error(&err.user_message(fallback));
            }
            Err(err) => self.notifier.error(&err.to_string()),
        }
        result
    }
}
