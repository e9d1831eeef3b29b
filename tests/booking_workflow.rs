//! End-to-end booking flows against an in-memory availability backend.

use async_trait::async_trait;
use chrono::NaiveDate;
use rental_calendar::availability::{
    AvailabilityStore, BookingError, BookingForm, BookingWorkflow, DayStatus, StoreError,
};
use rental_calendar::client::wire::AvailabilityPayload;
use rental_calendar::client::{ApiError, AvailabilityService};
use rental_calendar::models::{
    AvailabilityRange, AvailabilitySnapshot, Property, PropertyStatus, RangeStatus, RangeUpdate,
};
use rental_calendar::notify::{Level, MemoryNotifier};
use rental_calendar::session::SessionContext;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range(id: &str, start: NaiveDate, end: NaiveDate, status: RangeStatus) -> AvailabilityRange {
    AvailabilityRange {
        id: id.to_string(),
        start_date: start,
        end_date: end,
        status,
        client_name: String::new(),
        deposit: 0.0,
        guests: 1,
    }
}

fn property(capacity: u32) -> Property {
    Property {
        id: "p1".to_string(),
        title: "Depto Palermo".to_string(),
        address: None,
        neighborhood: None,
        capacity,
        min_stay_nights: 1,
        check_in_time: "15:00".to_string(),
        check_out_time: "11:00".to_string(),
        currency: "USD".to_string(),
        price_per_night: 80.0,
        price_per_week: 0.0,
        price_per_month: 0.0,
        status: PropertyStatus::Available,
        availability: Vec::new(),
    }
}

/// Backend that merges writes the way the real service does: the written
/// interval replaces whatever it overlaps.
#[derive(Default)]
struct FakeBackend {
    ranges: Mutex<Vec<AvailabilityRange>>,
    next_id: AtomicU32,
    fail_next: Mutex<Option<ApiError>>,
    fail_call: Mutex<Option<(String, ApiError)>>,
    calls: Mutex<Vec<String>>,
    gated: AtomicBool,
    gate: Notify,
}

impl FakeBackend {
    fn with_ranges(ranges: Vec<AvailabilityRange>) -> Arc<Self> {
        let backend = Self::default();
        *backend.ranges.lock().unwrap() = ranges;
        Arc::new(backend)
    }

    fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Fail the first call whose description starts with `prefix`
    fn fail_call(&self, prefix: &str, err: ApiError) {
        *self.fail_call.lock().unwrap() = Some((prefix.to_string(), err));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let every waiting and later call through
    fn open_gate(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }

    async fn enter(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        {
            let mut fail_call = self.fail_call.lock().unwrap();
            if fail_call.as_ref().is_some_and(|(prefix, _)| call.starts_with(prefix.as_str())) {
                if let Some((_, err)) = fail_call.take() {
                    return Err(err);
                }
            }
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> AvailabilitySnapshot {
        let mut ranges = self.ranges.lock().unwrap().clone();
        ranges.sort_by_key(|r| r.start_date);
        AvailabilitySnapshot {
            status: PropertyStatus::Available,
            ranges,
        }
    }

    fn carve(&self, start: NaiveDate, end: NaiveDate) {
        let mut ranges = self.ranges.lock().unwrap();
        let mut kept = Vec::new();
        for r in ranges.drain(..) {
            if r.end_date < start || r.start_date > end {
                kept.push(r);
                continue;
            }
            if r.start_date < start {
                let mut left = r.clone();
                left.id = format!("{}-l", r.id);
                left.end_date = start.pred_opt().unwrap();
                kept.push(left);
            }
            if r.end_date > end {
                let mut right = r.clone();
                right.id = format!("{}-r", r.id);
                right.start_date = end.succ_opt().unwrap();
                kept.push(right);
            }
        }
        *ranges = kept;
    }

    fn insert(&self, update: &RangeUpdate) {
        self.carve(update.start_date, update.end_date);
        let id = format!("n{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.ranges.lock().unwrap().push(AvailabilityRange {
            id,
            start_date: update.start_date,
            end_date: update.end_date,
            status: update.status,
            client_name: update.client_name.clone(),
            deposit: update.deposit,
            guests: update.guests,
        });
    }
}

#[async_trait]
impl AvailabilityService for FakeBackend {
    async fn fetch_availability(&self, property_id: &str) -> Result<AvailabilitySnapshot, ApiError> {
        self.enter(format!("GET {property_id}")).await?;
        Ok(self.snapshot())
    }

    async fn upsert_range(
        &self,
        property_id: &str,
        update: &RangeUpdate,
    ) -> Result<AvailabilitySnapshot, ApiError> {
        self.enter(format!("PUT {property_id} {}", update.status)).await?;
        self.insert(update);
        Ok(self.snapshot())
    }

    async fn delete_range(&self, property_id: &str, range_id: &str) -> Result<(), ApiError> {
        self.enter(format!("DELETE {property_id}/{range_id}")).await?;
        self.ranges.lock().unwrap().retain(|r| r.id != range_id);
        Ok(())
    }

    async fn toggle_day(
        &self,
        property_id: &str,
        date: NaiveDate,
    ) -> Result<AvailabilitySnapshot, ApiError> {
        self.enter(format!("DELETE {property_id}/date/{date}")).await?;
        let booked = self
            .ranges
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.contains(date) && r.status.is_booked());
        if booked {
            self.insert(&RangeUpdate::available(date, date));
        } else {
            self.carve(date, date);
        }
        Ok(self.snapshot())
    }
}

async fn workflow(
    backend: &Arc<FakeBackend>,
    capacity: u32,
) -> BookingWorkflow<MemoryNotifier> {
    let mut workflow = BookingWorkflow::new(
        backend.clone(),
        SessionContext::with_token("token"),
        MemoryNotifier::new(),
    );
    workflow.open(property(capacity)).await.unwrap();
    workflow
}

#[tokio::test]
async fn reservation_within_open_dates_succeeds_and_clears_form() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;

    let mut form = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 5)).client("Lucía", 4);
    workflow.reserve(&mut form).await.unwrap();

    assert!(form.is_empty());
    for day in 1..=5 {
        assert_eq!(
            workflow.store().classify(date(2024, 6, day)).status(),
            DayStatus::Reserved
        );
    }
    let bookings = workflow.store().bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].client_name, "Lucía");

    let notice = workflow.notifier().last().unwrap();
    assert_eq!(notice.level, Level::Success);
}

#[tokio::test]
async fn reservation_past_open_dates_is_denied_locally() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;

    let mut form = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 10)).client("Lucía", 2);
    let err = workflow.reserve(&mut form).await.unwrap_err();

    assert!(matches!(err, BookingError::NotFullyAvailable));
    assert!(err.is_validation());
    assert!(!form.is_empty());
    assert_eq!(backend.calls(), vec!["GET p1".to_string()]);

    let notice = workflow.notifier().last().unwrap();
    assert_eq!(notice.level, Level::Error);
    assert_eq!(notice.message, err.to_string());
}

#[tokio::test]
async fn overlapping_reservation_is_denied() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 7, 1),
        date(2024, 7, 10),
        RangeStatus::Reserved,
    )]);
    let workflow = workflow(&backend, 4).await;

    let mut form = BookingForm::dates(date(2024, 7, 5), date(2024, 7, 15)).client("Marta", 2);
    assert!(matches!(
        workflow.reserve(&mut form).await,
        Err(BookingError::OverlapsBooking)
    ));
}

#[tokio::test]
async fn occupancy_promotes_a_reservation_but_not_an_occupancy() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 8, 1),
        date(2024, 8, 5),
        RangeStatus::Reserved,
    )]);
    let workflow = workflow(&backend, 4).await;

    let mut form = BookingForm::dates(date(2024, 8, 1), date(2024, 8, 5)).client("Marta", 3);
    workflow.occupy(&mut form).await.unwrap();
    assert!(workflow.store().classify(date(2024, 8, 3)).occupied);

    let mut again = BookingForm::dates(date(2024, 8, 4), date(2024, 8, 4)).client("Pablo", 1);
    assert!(matches!(
        workflow.occupy(&mut again).await,
        Err(BookingError::AlreadyOccupied)
    ));
}

#[tokio::test]
async fn guest_capacity_boundary() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 9, 1),
        date(2024, 9, 30),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;

    let mut over = BookingForm::dates(date(2024, 9, 1), date(2024, 9, 3)).client("Ana", 5);
    assert!(matches!(
        workflow.reserve(&mut over).await,
        Err(BookingError::ExceedsCapacity {
            requested: 5,
            capacity: 4
        })
    ));

    let mut at_capacity = BookingForm::dates(date(2024, 9, 1), date(2024, 9, 3)).client("Ana", 4);
    workflow.reserve(&mut at_capacity).await.unwrap();
}

#[tokio::test]
async fn deleting_a_booking_reverts_it_to_available() {
    let backend = FakeBackend::with_ranges(vec![
        range("a", date(2024, 7, 1), date(2024, 7, 10), RangeStatus::Reserved),
        range("b", date(2024, 7, 11), date(2024, 7, 20), RangeStatus::Available),
    ]);
    let workflow = workflow(&backend, 4).await;

    let removed = workflow.delete_range("a").await.unwrap();
    assert_eq!(removed.status, RangeStatus::Reserved);

    for day in 1..=10 {
        assert_eq!(
            workflow.store().classify(date(2024, 7, day)).status(),
            DayStatus::Available
        );
    }
    assert_eq!(
        backend.calls(),
        vec![
            "GET p1".to_string(),
            "DELETE p1/a".to_string(),
            "PUT p1 disponible".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_revert_of_a_deleted_booking_keeps_the_calendar() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 7, 1),
        date(2024, 7, 10),
        RangeStatus::Occupied,
    )]);
    let workflow = workflow(&backend, 4).await;
    let before = workflow.store().ranges();

    backend.fail_call(
        "PUT",
        ApiError::Remote {
            status: 500,
            message: None,
        },
    );
    let err = workflow.delete_range("a").await.unwrap_err();

    assert!(!err.is_validation());
    assert_eq!(workflow.store().ranges(), before);
    assert!(workflow.store().classify(date(2024, 7, 5)).occupied);
    let notice = workflow.notifier().last().unwrap();
    assert_eq!(notice.level, Level::Error);
    assert_eq!(notice.message, "Could not delete the date range");
    assert_eq!(
        backend.calls(),
        vec![
            "GET p1".to_string(),
            "DELETE p1/a".to_string(),
            "PUT p1 disponible".to_string(),
        ]
    );
}

#[tokio::test]
async fn deleted_booking_reverts_on_the_server_even_if_the_view_closes() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 7, 1),
        date(2024, 7, 10),
        RangeStatus::Reserved,
    )]);
    let store = AvailabilityStore::new(backend.clone(), SessionContext::with_token("token"));
    store.load("p1").await.unwrap();
    backend.gate();

    let (deleted, ()) = tokio::join!(store.delete_range("a"), async {
        store.close();
        backend.open_gate();
    });

    assert!(matches!(deleted, Err(StoreError::Superseded)));
    assert!(store.ranges().is_empty());
    assert!(backend
        .calls()
        .contains(&"PUT p1 disponible".to_string()));

    let server = backend.snapshot().ranges;
    assert_eq!(server.len(), 1);
    assert_eq!(server[0].status, RangeStatus::Available);
    assert_eq!(server[0].start_date, date(2024, 7, 1));
    assert_eq!(server[0].end_date, date(2024, 7, 10));
}

#[tokio::test]
async fn deleting_an_available_range_leaves_days_unset() {
    let backend = FakeBackend::with_ranges(vec![range(
        "b",
        date(2024, 7, 11),
        date(2024, 7, 20),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;

    workflow.delete_range("b").await.unwrap();

    assert!(workflow.store().ranges().is_empty());
    assert_eq!(
        workflow.store().classify(date(2024, 7, 15)).status(),
        DayStatus::Unset
    );
    assert_eq!(backend.calls().len(), 2);

    assert!(matches!(
        workflow.delete_range("b").await,
        Err(BookingError::Store(StoreError::RangeNotFound(_)))
    ));
}

#[tokio::test]
async fn toggling_a_booked_day_frees_only_that_day() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Occupied,
    )]);
    let workflow = workflow(&backend, 4).await;

    let flags = workflow.toggle_day(date(2024, 6, 3)).await.unwrap();
    assert!(flags.available);

    let store = workflow.store();
    assert!(store.classify(date(2024, 6, 2)).occupied);
    assert!(store.classify(date(2024, 6, 4)).occupied);

    let flags = workflow.toggle_day(date(2024, 6, 3)).await.unwrap();
    assert_eq!(flags.status(), DayStatus::Unset);
}

#[tokio::test]
async fn remote_failure_keeps_calendar_and_form() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;
    let before = workflow.store().ranges();

    backend.fail_next(ApiError::Remote {
        status: 409,
        message: Some("Las fechas ya no están disponibles".to_string()),
    });
    let mut form = BookingForm::dates(date(2024, 6, 2), date(2024, 6, 3)).client("Ana", 2);
    let err = workflow.reserve(&mut form).await.unwrap_err();

    assert!(!err.is_validation());
    assert!(!form.is_empty());
    assert_eq!(workflow.store().ranges(), before);
    assert_eq!(
        workflow.notifier().last().unwrap().message,
        "Las fechas ya no están disponibles"
    );
    assert!(!workflow.store().is_writing());
}

#[tokio::test]
async fn expired_session_is_cleared() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    let session = SessionContext::with_token("token");
    let mut workflow = BookingWorkflow::new(backend.clone(), session.clone(), MemoryNotifier::new());
    workflow.open(property(4)).await.unwrap();

    backend.fail_next(ApiError::SessionExpired);
    let mut form = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 2));
    assert!(workflow.mark_available(&mut form).await.is_err());

    assert!(!session.is_authenticated());
    assert_eq!(
        workflow.notifier().last().unwrap().message,
        "Your session has expired. Please log in again."
    );

    // nothing is sent without a token
    let mut form = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 2));
    let calls = backend.calls().len();
    assert!(matches!(
        workflow.mark_available(&mut form).await,
        Err(BookingError::Store(StoreError::Api(ApiError::MissingToken)))
    ));
    assert_eq!(backend.calls().len(), calls);
}

#[tokio::test]
async fn failed_load_empties_the_calendar() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    let store = AvailabilityStore::new(backend.clone(), SessionContext::new());
    store.load("p1").await.unwrap();
    assert_eq!(store.ranges().len(), 1);

    backend.fail_next(ApiError::Remote {
        status: 500,
        message: None,
    });
    assert!(store.load("p1").await.is_err());
    assert!(store.ranges().is_empty());
}

#[tokio::test]
async fn reload_is_idempotent() {
    struct JsonBackend;

    #[async_trait]
    impl AvailabilityService for JsonBackend {
        async fn fetch_availability(&self, _: &str) -> Result<AvailabilitySnapshot, ApiError> {
            let payload: AvailabilityPayload = serde_json::from_str(
                r#"{"estado": "Disponible", "availability": [
                    {"id": "a", "startDate": "2024-06-01", "endDate": "2024-06-03", "status": "Ocupado"},
                    {"id": "b", "startDate": "2024-06-04", "endDate": "2024-06-06", "status": "ocupado_temp"},
                    {"id": "c", "startDate": "2024-06-07", "endDate": "2024-06-09", "status": "RESERVADO"}
                ]}"#,
            )
            .unwrap();
            Ok(payload.into_snapshot())
        }

        async fn upsert_range(&self, _: &str, _: &RangeUpdate) -> Result<AvailabilitySnapshot, ApiError> {
            unreachable!()
        }

        async fn delete_range(&self, _: &str, _: &str) -> Result<(), ApiError> {
            unreachable!()
        }

        async fn toggle_day(&self, _: &str, _: NaiveDate) -> Result<AvailabilitySnapshot, ApiError> {
            unreachable!()
        }
    }

    let store = AvailabilityStore::new(Arc::new(JsonBackend), SessionContext::new());
    store.load("p1").await.unwrap();
    let first = store.snapshot();
    store.load("p1").await.unwrap();
    assert_eq!(store.snapshot(), first);

    // "Ocupado" and "ocupado_temp" classify the same
    assert!(store.classify(date(2024, 6, 2)).occupied);
    assert!(store.classify(date(2024, 6, 5)).occupied);
    assert!(store.classify(date(2024, 6, 8)).reserved);
}

#[tokio::test]
async fn response_for_a_closed_view_is_dropped() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 5),
        RangeStatus::Available,
    )]);
    backend.gate();
    let store = AvailabilityStore::new(backend.clone(), SessionContext::new());

    let (loaded, ()) = tokio::join!(store.load("p1"), async {
        store.close();
        backend.gate.notify_one();
    });

    assert!(matches!(loaded, Err(StoreError::Superseded)));
    assert!(store.property_id().is_none());
    assert!(store.ranges().is_empty());
}

#[tokio::test]
async fn double_submission_is_rejected_while_a_write_is_in_flight() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 30),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;
    backend.gate();

    let mut first = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 3)).client("Ana", 2);
    let mut second = BookingForm::dates(date(2024, 6, 10), date(2024, 6, 12)).client("Luis", 2);

    let (first_result, second_result) = tokio::join!(workflow.reserve(&mut first), async {
        let result = workflow.reserve(&mut second).await;
        backend.gate.notify_one();
        result
    });

    first_result.unwrap();
    assert!(matches!(
        second_result,
        Err(BookingError::Store(StoreError::Busy))
    ));
    assert!(!second.is_empty());
    assert!(!workflow.store().is_writing());
}

#[tokio::test]
async fn reloading_during_a_write_keeps_the_write() {
    let backend = FakeBackend::with_ranges(vec![range(
        "a",
        date(2024, 6, 1),
        date(2024, 6, 30),
        RangeStatus::Available,
    )]);
    let workflow = workflow(&backend, 4).await;
    backend.gate();

    let mut form = BookingForm::dates(date(2024, 6, 1), date(2024, 6, 3)).client("Ana", 2);
    let (reserved, reloaded) = tokio::join!(workflow.reserve(&mut form), async {
        let result = workflow.store().load("p1").await;
        backend.open_gate();
        result
    });

    assert!(matches!(reloaded, Err(StoreError::Busy)));
    reserved.unwrap();
    assert!(form.is_empty());
    assert!(workflow.store().classify(date(2024, 6, 2)).reserved);
    assert_eq!(workflow.notifier().last().unwrap().message, "Property reserved");
}
