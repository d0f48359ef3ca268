use sbook_core::repo::attendance_repo::{AttendanceRecord, AttendanceRepository};
use sbook_core::repo::roster_repo::RosterRepository;
use sbook_core::store::paths;
use sbook_core::{
    AttendanceStatus, DocumentStore, EffectiveIdentity, Gesture, MemoryDocumentStore, Roster,
    SessionDate, SqliteDocumentStore, Student, SyncService,
};
use serde_json::json;
use std::sync::Arc;

fn sunday() -> SessionDate {
    SessionDate::from_ymd(2024, 1, 7).expect("valid date")
}

fn amy_and_bob() -> Vec<Student> {
    vec![Student::new("1", "Amy"), Student::new("2", "Bob")]
}

async fn seed_roster(store: Arc<dyn DocumentStore>, identity: &EffectiveIdentity, students: &[Student]) {
    let repo = RosterRepository::new(store);
    for student in students {
        repo.put_student(identity, student)
            .await
            .expect("seed student");
    }
}

#[tokio::test]
async fn save_writes_card_number_keyed_record() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let identity = EffectiveIdentity::own("teacher");
    let roster = Roster::from_students(amy_and_bob());
    let statuses = vec![
        sbook_core::next_status(AttendanceStatus::None, Gesture::SingleTap),
        sbook_core::next_status(AttendanceStatus::None, Gesture::LongPress),
    ];

    let sync = SyncService::new(store.clone());
    sync.save(&identity, sunday(), &statuses, &roster)
        .await
        .expect("save");

    let path = paths::attendance("teacher")
        .and_then(|collection| collection.doc("2024-01-07"))
        .expect("record path");
    let stored = store.get_document(&path).await.expect("read record");
    let expected = json!({"attendance": {"1": 1, "2": 2}});
    assert_eq!(stored.as_ref(), expected.as_object());
}

#[tokio::test]
async fn load_after_removing_student_drops_their_slot() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let identity = EffectiveIdentity::own("teacher");
    seed_roster(store.clone(), &identity, &amy_and_bob()).await;

    let sync = SyncService::new(store.clone());
    let roster = Roster::from_students(amy_and_bob());
    sync.save(
        &identity,
        sunday(),
        &[AttendanceStatus::Present, AttendanceStatus::CardAtHome],
        &roster,
    )
    .await
    .expect("save");

    RosterRepository::new(store.clone())
        .delete_student(&identity, "1")
        .await
        .expect("remove Amy without cascade");

    let loaded = sync.load_all(&identity).await.expect("load");
    assert_eq!(loaded.roster.len(), 1);
    let entry = loaded.logs.get(sunday()).expect("logged date");
    assert_eq!(entry.statuses, vec![AttendanceStatus::CardAtHome]);
}

#[tokio::test]
async fn load_skips_record_ids_that_are_not_dates() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let identity = EffectiveIdentity::own("teacher");
    seed_roster(store.clone(), &identity, &amy_and_bob()).await;

    let records = AttendanceRepository::new(store.clone());
    let record: AttendanceRecord = [("1".to_string(), 1_i64)].into_iter().collect();
    records
        .put_record(&identity, "2024-01-07", &record)
        .await
        .expect("valid record");
    records
        .put_record(&identity, "backup-copy", &record)
        .await
        .expect("stray record");

    let loaded = SyncService::new(store)
        .load_all(&identity)
        .await
        .expect("load");
    assert_eq!(loaded.logs.len(), 1);
    assert_eq!(loaded.skipped_ids, vec!["backup-copy".to_string()]);
    assert_eq!(
        loaded
            .logs
            .get_by_key("Sun Jan 07 2024")
            .expect("display key lookup")
            .statuses,
        vec![AttendanceStatus::Present, AttendanceStatus::None]
    );
}

#[tokio::test]
async fn sqlite_backend_round_trips_through_load_all() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("sbook.sqlite3");
    let identity = EffectiveIdentity::own("teacher");

    {
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::open(&path).expect("open store"));
        seed_roster(store.clone(), &identity, &amy_and_bob()).await;
        SyncService::new(store)
            .save(
                &identity,
                sunday(),
                &[AttendanceStatus::DifferentLocation, AttendanceStatus::Present],
                &Roster::from_students(amy_and_bob()),
            )
            .await
            .expect("save");
    }

    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteDocumentStore::open(&path).expect("reopen store"));
    let loaded = SyncService::new(store)
        .load_all(&identity)
        .await
        .expect("load");
    assert_eq!(
        loaded.logs.get(sunday()).expect("logged date").statuses,
        vec![AttendanceStatus::DifferentLocation, AttendanceStatus::Present]
    );
}

#[tokio::test]
async fn subjects_do_not_see_each_others_records() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let teacher = EffectiveIdentity::own("teacher");
    let other = EffectiveIdentity::own("other");
    seed_roster(store.clone(), &teacher, &amy_and_bob()).await;

    let sync = SyncService::new(store);
    sync.save(
        &teacher,
        sunday(),
        &[AttendanceStatus::Present, AttendanceStatus::Present],
        &Roster::from_students(amy_and_bob()),
    )
    .await
    .expect("save");

    let loaded = sync.load_all(&other).await.expect("load other subject");
    assert!(loaded.roster.is_empty());
    assert!(loaded.logs.is_empty());
}

#[tokio::test]
async fn load_reads_student_documents_written_with_store_timestamps() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let identity = EffectiveIdentity::own("teacher");
    seed_roster(store.clone(), &identity, &[Student::new("1", "Amy")]).await;

    let bob = paths::entities("teacher")
        .and_then(|collection| collection.doc("2"))
        .expect("student path");
    let body = json!({
        "identifier": "2",
        "name": "Bob",
        "phone": 9876543210_i64,
        "createdAt": {"seconds": 1_704_585_600_i64, "nanoseconds": 0},
    });
    store
        .set_document(&bob, body.as_object().cloned().expect("object"))
        .await
        .expect("write legacy student");

    let sync = SyncService::new(store.clone());
    let roster = Roster::from_students(amy_and_bob());
    sync.save(
        &identity,
        sunday(),
        &[AttendanceStatus::None, AttendanceStatus::Present],
        &roster,
    )
    .await
    .expect("save");

    let loaded = sync.load_all(&identity).await.expect("load despite legacy body");
    let students = loaded.roster.students();
    assert_eq!(students.len(), 2);
    assert_eq!(students[1].phone, "9876543210");
    assert_eq!(students[1].created_at, Some(1_704_585_600_000));
    assert_eq!(
        loaded.logs.get(sunday()).expect("logged date").statuses,
        vec![AttendanceStatus::None, AttendanceStatus::Present]
    );
}
