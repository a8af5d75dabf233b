use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use icewatch_common::services::{BookingService, BoxFuture, CalendarService, UpdateOutcome};
use icewatch_common::{CalendarDay, CalendarEvent, EventRecord, LocalZone, ProductId};
use icewatch_config::{ProductCatalog, ProductEntry};
use icewatch_db::DbClient;
use icewatch_gcal::CalendarSync;
use icewatch_tracker::{Tracker, TrackerError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("fake service failure")]
struct FakeFailure;

#[derive(Default)]
struct BookingState {
    calendars: HashMap<(u32, i32, String), Vec<CalendarDay>>,
    records: HashMap<(NaiveDate, String), Vec<EventRecord>>,
    failing: bool,
}

#[derive(Clone, Default)]
struct FakeBooking {
    state: Arc<Mutex<BookingState>>,
}

impl FakeBooking {
    fn set_records(&self, date: NaiveDate, product: &str, records: Vec<EventRecord>) {
        self.state
            .lock()
            .unwrap()
            .records
            .insert((date, product.to_string()), records);
    }

    fn set_calendar(&self, month: u32, year: i32, product: &str, days: Vec<CalendarDay>) {
        self.state
            .lock()
            .unwrap()
            .calendars
            .insert((month, year, product.to_string()), days);
    }

    fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl BookingService for FakeBooking {
    type Error = FakeFailure;

    fn fetch_calendar(
        &self,
        month: u32,
        year: i32,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<CalendarDay>, Self::Error> {
        let state = self.state.lock().unwrap();
        let result = if state.failing {
            Err(FakeFailure)
        } else {
            Ok(state
                .calendars
                .get(&(month, year, product.to_string()))
                .cloned()
                .unwrap_or_default())
        };
        Box::pin(async move { result })
    }

    fn fetch_event_records(
        &self,
        date: NaiveDate,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<EventRecord>, Self::Error> {
        let state = self.state.lock().unwrap();
        let result = if state.failing {
            Err(FakeFailure)
        } else {
            Ok(state
                .records
                .get(&(date, product.to_string()))
                .cloned()
                .unwrap_or_default())
        };
        Box::pin(async move { result })
    }
}

#[derive(Default)]
struct CalendarState {
    events: HashMap<(String, String), CalendarEvent>,
    writes: Vec<String>,
    failing: bool,
}

#[derive(Clone, Default)]
struct FakeCalendar {
    state: Arc<Mutex<CalendarState>>,
}

impl FakeCalendar {
    fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    fn event(&self, calendar: &str, id: &str) -> Option<CalendarEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .get(&(calendar.to_string(), id.to_string()))
            .cloned()
    }
}

impl CalendarService for FakeCalendar {
    type Error = FakeFailure;

    fn update_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, UpdateOutcome, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("update {}", calendar_id));
        let key = (calendar_id.to_string(), event.id.clone());
        let result = if state.failing {
            Err(FakeFailure)
        } else if state.events.contains_key(&key) {
            state.events.insert(key, event.clone());
            Ok(UpdateOutcome::Updated)
        } else {
            Ok(UpdateOutcome::NotFound)
        };
        Box::pin(async move { result })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, (), Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(format!("insert {}", calendar_id));
        state
            .events
            .insert((calendar_id.to_string(), event.id.clone()), event.clone());
        Box::pin(async { Ok(()) })
    }
}

struct Harness {
    tracker: Tracker<FakeBooking, FakeCalendar>,
    booking: FakeBooking,
    calendar: FakeCalendar,
}

async fn harness() -> Harness {
    let booking = FakeBooking::default();
    let calendar = FakeCalendar::default();
    let mut entries = BTreeMap::new();
    entries.insert(
        ProductId::from("p1"),
        ProductEntry {
            gcal: Some("cal".to_string()),
            calendars: Vec::new(),
        },
    );
    let catalog = ProductCatalog::new(entries);
    let products = catalog.product_ids();
    let sync = CalendarSync::new(Some(calendar.clone()), catalog, None, LocalZone::utc());
    let db = DbClient::in_memory().await.unwrap();
    Harness {
        tracker: Tracker::new(db, booking.clone(), sync, products, LocalZone::utc()),
        booking,
        calendar,
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

fn session(id: &str, start: &str, available: i64) -> EventRecord {
    EventRecord {
        session_id: id.to_string(),
        product_name: "Public Skate".to_string(),
        location: "Pad 1".to_string(),
        start_time: start.to_string(),
        end_time: "23:00:00".to_string(),
        total_spaces: 50,
        available_spaces: available,
        academy_capacity: 10,
        academy_available: 10,
    }
}

async fn seed_day(h: &Harness, date: NaiveDate) {
    h.booking.set_calendar(
        3,
        2024,
        "p1",
        vec![CalendarDay {
            date,
            has_event: true,
        }],
    );
    let report = h.tracker.check_for_new_days(at(1, 6, 0)).await.unwrap();
    assert_eq!(report.days_added, 1);
}

async fn trail_len(h: &Harness, date: &str, id: &str) -> usize {
    let mut tx = h.tracker.db().begin_read().await.unwrap();
    let day = tx.day(date).await.unwrap().unwrap();
    let events = tx.events_scope(&day).await.unwrap().unwrap();
    let sessions = tx.sessions(&events).await.unwrap();
    let session = sessions.iter().find(|s| s.session_id() == id).unwrap();
    tx.snapshots(session).await.unwrap().len()
}

#[tokio::test]
async fn new_days_are_discovered_from_month_calendars() {
    let h = harness().await;
    h.booking.set_calendar(
        3,
        2024,
        "p1",
        vec![
            CalendarDay {
                date: march(2),
                has_event: true,
            },
            CalendarDay {
                date: march(3),
                has_event: false,
            },
        ],
    );
    h.booking.set_calendar(
        4,
        2024,
        "p1",
        vec![CalendarDay {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            has_event: true,
        }],
    );

    let report = h.tracker.check_for_new_days(at(1, 6, 0)).await.unwrap();
    assert_eq!(report.days_added, 2);
    let again = h.tracker.check_for_new_days(at(1, 7, 0)).await.unwrap();
    assert_eq!(again.days_added, 0);

    let mut tx = h.tracker.db().begin_read().await.unwrap();
    assert!(tx.day("2024-03-03").await.unwrap().is_none());
    let day = tx.day("2024-04-01").await.unwrap().unwrap();
    assert_eq!(tx.products(&day).await.unwrap(), vec![ProductId::from("p1")]);
}

#[tokio::test]
async fn session_lifecycle_from_creation_to_cancellation() {
    let h = harness().await;
    seed_day(&h, march(1)).await;

    // created
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 5)]);
    let report = h.tracker.check_for_events(false, at(1, 9, 0)).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 1);
    assert_eq!(h.calendar.writes(), vec!["update cal", "insert cal"]);

    // unchanged: no snapshot, no calendar call
    let report = h.tracker.check_for_events(false, at(1, 9, 10)).await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 1);
    assert_eq!(h.calendar.writes().len(), 2);

    // availability drops
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 3)]);
    let report = h.tracker.check_for_events(false, at(1, 9, 20)).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 2);
    assert_eq!(h.calendar.writes().len(), 3);

    // gone from the listing before it starts
    h.booking.set_records(march(1), "p1", Vec::new());
    let report = h.tracker.check_for_events(false, at(1, 9, 30)).await.unwrap();
    assert_eq!(report.cancelled, 1);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 3);
    let event = h
        .calendar
        .event("cal", &icewatch_gcal::event_id("S1"))
        .unwrap();
    assert_eq!(event.summary, "Cancelled: Public Skate");

    // and stays cancelled without further writes
    let report = h.tracker.check_for_events(false, at(1, 9, 40)).await.unwrap();
    assert_eq!(report.cancelled, 0);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 3);
}

#[tokio::test]
async fn booking_failure_aborts_the_pass() {
    let h = harness().await;
    seed_day(&h, march(1)).await;
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 5)]);
    h.tracker.check_for_events(false, at(1, 9, 0)).await.unwrap();

    h.booking.set_failing(true);
    let err = h
        .tracker
        .check_for_events(false, at(1, 9, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Booking { .. }));
    // no false cancellation was recorded
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 1);
}

#[tokio::test]
async fn calendar_failure_keeps_local_state() {
    let h = harness().await;
    seed_day(&h, march(1)).await;
    h.calendar.state.lock().unwrap().failing = true;
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 5)]);

    let report = h.tracker.check_for_events(false, at(1, 9, 0)).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.sync.failed, 1);
    assert_eq!(trail_len(&h, "2024-03-01", "S1").await, 1);
}

#[tokio::test]
async fn today_only_ignores_later_days() {
    let h = harness().await;
    h.booking.set_calendar(
        3,
        2024,
        "p1",
        vec![
            CalendarDay {
                date: march(1),
                has_event: true,
            },
            CalendarDay {
                date: march(2),
                has_event: true,
            },
        ],
    );
    h.tracker.check_for_new_days(at(1, 6, 0)).await.unwrap();
    h.booking
        .set_records(march(1), "p1", vec![session("A", "18:00:00", 5)]);
    h.booking
        .set_records(march(2), "p1", vec![session("B", "18:00:00", 5)]);

    let report = h.tracker.check_for_events(true, at(1, 9, 0)).await.unwrap();
    assert_eq!(report.days_refreshed, 1);
    assert_eq!(report.created, 1);

    let report = h.tracker.check_for_events(false, at(1, 9, 5)).await.unwrap();
    assert_eq!(report.days_refreshed, 2);
    assert_eq!(report.created, 1);
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn refresh_triggered_only_when_a_session_starts_soon() {
    let h = harness().await;
    seed_day(&h, march(1)).await;
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 5)]);

    // nothing recorded yet
    assert!(h
        .tracker
        .check_if_events_starting_soon(at(1, 17, 58))
        .await
        .unwrap()
        .is_none());

    h.tracker.check_for_events(true, at(1, 9, 0)).await.unwrap();
    h.booking
        .set_records(march(1), "p1", vec![session("S1", "18:00:00", 2)]);

    assert!(h
        .tracker
        .check_if_events_starting_soon(at(1, 17, 50))
        .await
        .unwrap()
        .is_none());
    assert!(h
        .tracker
        .check_if_events_starting_soon(at(1, 18, 1))
        .await
        .unwrap()
        .is_none());

    let report = h
        .tracker
        .check_if_events_starting_soon(at(1, 17, 56))
        .await
        .unwrap()
        .expect("refresh");
    assert_eq!(report.updated, 1);
}

#[tokio::test]
async fn disabled_calendar_still_records_changes() {
    let booking = FakeBooking::default();
    let catalog = ProductCatalog::new(BTreeMap::from([(
        ProductId::from("p1"),
        ProductEntry::default(),
    )]));
    let products = catalog.product_ids();
    let sync: CalendarSync<FakeCalendar> = CalendarSync::disabled(catalog, LocalZone::utc());
    let tracker = Tracker::new(
        DbClient::in_memory().await.unwrap(),
        booking.clone(),
        sync,
        products,
        LocalZone::utc(),
    );

    booking.set_calendar(
        3,
        2024,
        "p1",
        vec![CalendarDay {
            date: march(1),
            has_event: true,
        }],
    );
    tracker.check_for_new_days(at(1, 6, 0)).await.unwrap();
    booking.set_records(march(1), "p1", vec![session("S1", "18:00:00", 5)]);
    let report = tracker.check_for_events(false, at(1, 9, 0)).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.sync, Default::default());
}
