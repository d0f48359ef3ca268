use async_trait::async_trait;
use futures::channel::oneshot;
use sbook_core::repo::roster_repo::RosterRepository;
use sbook_core::store::{paths, CollectionPath, DocPath, Document, DocumentSnapshot, StoreResult};
use sbook_core::{
    AttendanceError, AttendanceService, AttendanceStatus, DocumentStore, EffectiveIdentity,
    Gesture, KeyValueStore, MemoryAuthProvider, MemoryDocumentStore, MemoryKeyValueStore,
    Principal, ResolutionError, SessionDate, Student,
};
use std::sync::{Arc, Mutex, PoisonError};

const EMAIL: &str = "teacher@example.com";
const PASSWORD: &str = "pw";

struct Screen {
    auth: Arc<MemoryAuthProvider>,
    store: Arc<MemoryDocumentStore>,
    service: AttendanceService,
}

fn date(month: u32, day: u32) -> SessionDate {
    SessionDate::from_ymd(2024, month, day).expect("valid date")
}

async fn screen_with_students(students: &[Student]) -> Screen {
    let auth = Arc::new(MemoryAuthProvider::new());
    auth.sign_in(Principal::new("teacher", Some(EMAIL.to_string())), PASSWORD);
    let store = Arc::new(MemoryDocumentStore::new());
    let secure: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());

    let rosters = RosterRepository::new(store.clone());
    let identity = EffectiveIdentity::own("teacher");
    for student in students {
        rosters
            .put_student(&identity, student)
            .await
            .expect("seed student");
    }

    let service = AttendanceService::new(auth.clone(), store.clone(), secure, date(1, 7));
    Screen {
        auth,
        store,
        service,
    }
}

fn amy_and_bob() -> Vec<Student> {
    vec![Student::new("2", "Bob"), Student::new("1", "Amy")]
}

#[tokio::test]
async fn activation_loads_sorted_roster_and_blank_array() {
    let screen = screen_with_students(&amy_and_bob()).await;
    let identity = screen.service.activate().await.expect("activate");
    assert_eq!(identity.subject_id(), "teacher");

    let snapshot = screen.service.snapshot();
    assert_eq!(snapshot.subject_id.as_deref(), Some("teacher"));
    assert_eq!(snapshot.display_key, "Sun Jan 07 2024");
    assert_eq!(
        snapshot.roster.card_numbers().collect::<Vec<_>>(),
        vec!["1", "2"]
    );
    assert_eq!(snapshot.statuses, vec![AttendanceStatus::None; 2]);
}

#[tokio::test]
async fn nothing_is_fetched_before_activation() {
    let screen = screen_with_students(&amy_and_bob()).await;
    let err = screen.service.save().await.expect_err("not activated");
    assert!(matches!(
        err,
        AttendanceError::Resolution(ResolutionError::NoPrincipal)
    ));
}

#[tokio::test]
async fn signed_out_activation_fails_with_resolution_error() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.auth.sign_out();
    let err = screen.service.activate().await.expect_err("signed out");
    assert!(matches!(err, AttendanceError::Resolution(_)));
    assert!(screen.service.snapshot().roster.is_empty());
}

#[tokio::test]
async fn gestures_then_save_persist_card_keyed_codes() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");

    screen
        .service
        .apply_gesture(0, Gesture::SingleTap)
        .expect("tap Amy");
    screen
        .service
        .apply_gesture(1, Gesture::LongPress)
        .expect("hold Bob");
    let record = screen.service.save().await.expect("save");

    assert_eq!(record.get("1"), Some(&1));
    assert_eq!(record.get("2"), Some(&2));
    assert_eq!(screen.service.snapshot().logged_dates, vec![date(1, 7)]);

    let path = paths::attendance("teacher")
        .and_then(|collection| collection.doc("2024-01-07"))
        .expect("record path");
    assert!(screen
        .store
        .get_document(&path)
        .await
        .expect("read")
        .is_some());
}

#[tokio::test]
async fn non_sunday_selection_is_rejected_without_state_change() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");
    screen
        .service
        .apply_gesture(0, Gesture::SingleTap)
        .expect("tap Amy");
    let before = screen.service.snapshot();

    let err = screen
        .service
        .select_date(date(1, 12))
        .await
        .expect_err("friday");
    assert!(matches!(err, AttendanceError::InvalidDate(_)));
    assert_eq!(err.user_message(), "Please select a Sunday.");
    assert_eq!(screen.service.snapshot(), before);
}

#[tokio::test]
async fn selecting_a_logged_sunday_shows_its_statuses() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");
    screen
        .service
        .apply_gesture(1, Gesture::SingleTap)
        .expect("tap Bob");
    screen.service.save().await.expect("save first sunday");

    screen
        .service
        .select_date(date(1, 14))
        .await
        .expect("next sunday");
    let snapshot = screen.service.snapshot();
    assert_eq!(snapshot.selected_date, date(1, 14));
    assert_eq!(snapshot.statuses, vec![AttendanceStatus::None; 2]);

    screen
        .service
        .select_date(date(1, 7))
        .await
        .expect("back to first sunday");
    assert_eq!(
        screen.service.snapshot().statuses,
        vec![AttendanceStatus::None, AttendanceStatus::Present]
    );
}

#[tokio::test]
async fn deleting_selected_log_resets_array() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");
    screen
        .service
        .apply_gesture(0, Gesture::SingleTap)
        .expect("tap Amy");
    screen.service.save().await.expect("save");

    let err = screen
        .service
        .delete_log(date(1, 7), "wrong")
        .await
        .expect_err("wrong password");
    assert!(matches!(err, AttendanceError::Auth(_)));
    assert_eq!(screen.service.snapshot().logged_dates.len(), 1);

    screen
        .service
        .delete_log(date(1, 7), PASSWORD)
        .await
        .expect("delete log");
    let snapshot = screen.service.snapshot();
    assert!(snapshot.logged_dates.is_empty());
    assert_eq!(snapshot.statuses, vec![AttendanceStatus::None; 2]);
}

#[tokio::test]
async fn deleting_student_reloads_a_realigned_roster() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");
    screen
        .service
        .apply_gesture(1, Gesture::LongPress)
        .expect("hold Bob");
    screen.service.save().await.expect("save");

    screen
        .service
        .delete_student("1", PASSWORD)
        .await
        .expect("delete Amy");
    let snapshot = screen.service.snapshot();
    assert_eq!(snapshot.roster.card_numbers().collect::<Vec<_>>(), vec!["2"]);
    assert_eq!(snapshot.statuses, vec![AttendanceStatus::CardAtHome]);

    let overview = screen.service.overview();
    assert_eq!(overview.rows.len(), 1);
    assert_eq!(overview.rows[0].marks, vec![AttendanceStatus::CardAtHome]);
    assert_eq!(overview.rows[0].present_count, 0);
}

#[tokio::test]
async fn deactivated_screen_refuses_operations_until_reactivated() {
    let screen = screen_with_students(&amy_and_bob()).await;
    screen.service.activate().await.expect("activate");
    screen
        .service
        .apply_gesture(0, Gesture::SingleTap)
        .expect("tap Amy");
    screen.service.deactivate();

    let err = screen.service.save().await.expect_err("deactivated");
    assert!(matches!(err, AttendanceError::Resolution(_)));

    screen.service.activate().await.expect("reactivate");
    assert!(screen.service.snapshot().logged_dates.is_empty());
}

/// One parked store call: signals arrival, then waits to be released.
struct Gate {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Memory store that can hold the next write or listing in flight.
#[derive(Default)]
struct GatedStore {
    inner: MemoryDocumentStore,
    next_write: Mutex<Option<Gate>>,
    next_listing: Mutex<Option<Gate>>,
}

impl GatedStore {
    fn hold_next_write(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        arm(&self.next_write)
    }

    fn hold_next_listing(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        arm(&self.next_listing)
    }
}

fn arm(slot: &Mutex<Option<Gate>>) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
    let (arrived_tx, arrived_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Gate {
        arrived: arrived_tx,
        release: release_rx,
    });
    (arrived_rx, release_tx)
}

async fn pass(slot: &Mutex<Option<Gate>>) {
    let gate = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(gate) = gate {
        let _ = gate.arrived.send(());
        let _ = gate.release.await;
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get_document(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        self.inner.get_document(path).await
    }

    async fn set_document(&self, path: &DocPath, data: Document) -> StoreResult<()> {
        pass(&self.next_write).await;
        self.inner.set_document(path, data).await
    }

    async fn delete_document(&self, path: &DocPath) -> StoreResult<()> {
        self.inner.delete_document(path).await
    }

    /// Reads first, then parks, so the caller gets a response from before the park.
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        let listing = self.inner.list_documents(collection).await;
        pass(&self.next_listing).await;
        listing
    }

    async fn delete_field(&self, path: &DocPath, field_path: &[&str]) -> StoreResult<()> {
        self.inner.delete_field(path, field_path).await
    }
}

async fn gated_screen(students: &[Student]) -> (Arc<GatedStore>, AttendanceService) {
    let auth = Arc::new(MemoryAuthProvider::new());
    auth.sign_in(Principal::new("teacher", Some(EMAIL.to_string())), PASSWORD);
    let store = Arc::new(GatedStore::default());
    let secure: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());

    let rosters = RosterRepository::new(store.clone());
    let identity = EffectiveIdentity::own("teacher");
    for student in students {
        rosters
            .put_student(&identity, student)
            .await
            .expect("seed student");
    }
    let service = AttendanceService::new(auth, store.clone(), secure, date(1, 7));
    (store, service)
}

#[tokio::test]
async fn gesture_made_while_save_is_in_flight_is_kept() {
    let (store, service) = gated_screen(&amy_and_bob()).await;
    service.activate().await.expect("activate");
    service.apply_gesture(0, Gesture::SingleTap).expect("tap Amy");

    let (arrived, release) = store.hold_next_write();
    let (saved, ()) = futures::join!(service.save(), async {
        arrived.await.expect("save reached the store");
        service
            .apply_gesture(1, Gesture::LongPress)
            .expect("hold Bob mid-save");
        release.send(()).expect("release write");
    });

    let record = saved.expect("save");
    assert_eq!(record.get("1"), Some(&1));
    assert_eq!(record.get("2"), Some(&0));

    let snapshot = service.snapshot();
    assert_eq!(
        snapshot.statuses,
        vec![AttendanceStatus::Present, AttendanceStatus::CardAtHome]
    );
    assert_eq!(snapshot.logged_dates, vec![date(1, 7)]);
}

#[tokio::test]
async fn save_finishing_after_deactivation_writes_but_leaves_state_alone() {
    let (store, service) = gated_screen(&amy_and_bob()).await;
    service.activate().await.expect("activate");
    service.apply_gesture(0, Gesture::SingleTap).expect("tap Amy");

    let (arrived, release) = store.hold_next_write();
    let (saved, ()) = futures::join!(service.save(), async {
        arrived.await.expect("save reached the store");
        service.deactivate();
        release.send(()).expect("release write");
    });
    saved.expect("write is not aborted");

    let snapshot = service.snapshot();
    assert!(snapshot.logged_dates.is_empty());
    assert_eq!(snapshot.subject_id, None);

    let path = paths::attendance("teacher")
        .and_then(|collection| collection.doc("2024-01-07"))
        .expect("record path");
    assert!(store.get_document(&path).await.expect("read").is_some());
}

#[tokio::test]
async fn refresh_landing_after_reactivation_is_discarded() {
    let (store, service) = gated_screen(&amy_and_bob()).await;
    service.activate().await.expect("activate");

    let (arrived, release) = store.hold_next_listing();
    let (refreshed, ()) = futures::join!(service.refresh(), async {
        arrived.await.expect("refresh reached the store");
        RosterRepository::new(store.clone())
            .put_student(&EffectiveIdentity::own("teacher"), &Student::new("3", "Cy"))
            .await
            .expect("enroll Cy");
        service.activate().await.expect("reactivate");
        release.send(()).expect("release listing");
    });
    refreshed.expect("stale refresh still completes");

    let snapshot = service.snapshot();
    assert_eq!(
        snapshot.roster.card_numbers().collect::<Vec<_>>(),
        vec!["1", "2", "3"]
    );
    assert_eq!(snapshot.statuses, vec![AttendanceStatus::None; 3]);
}
