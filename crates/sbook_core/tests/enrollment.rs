use sbook_core::repo::roster_repo::RosterRepository;
use sbook_core::service::enrollment_service::{EnrollmentError, EnrollmentService, StudentDraft};
use sbook_core::{DocumentStore, EffectiveIdentity, MemoryDocumentStore};
use std::sync::Arc;

fn draft(card_number: &str, name: &str) -> StudentDraft {
    StudentDraft {
        card_number: card_number.to_string(),
        name: name.to_string(),
        phone: "9123456780".to_string(),
        gender: "Male".to_string(),
        standard: "Jr KG".to_string(),
    }
}

fn setup() -> (Arc<dyn DocumentStore>, EnrollmentService, EffectiveIdentity) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let service = EnrollmentService::new(store.clone());
    (store, service, EffectiveIdentity::own("teacher"))
}

#[tokio::test]
async fn enroll_writes_student_with_created_at() {
    let (store, service, identity) = setup();
    let student = service
        .enroll(&identity, &draft("1", "Amy"))
        .await
        .expect("enroll");
    assert!(student.created_at.is_some());

    let loaded = RosterRepository::new(store)
        .get_student(&identity, "1")
        .await
        .expect("read")
        .expect("student exists");
    assert_eq!(loaded, student);
}

#[tokio::test]
async fn duplicate_card_number_or_name_is_rejected() {
    let (_, service, identity) = setup();
    service
        .enroll(&identity, &draft("1", "Amy"))
        .await
        .expect("enroll");

    let err = service
        .enroll(&identity, &draft("1", "Bob"))
        .await
        .expect_err("same card number");
    assert!(matches!(err, EnrollmentError::DuplicateCardNumber(card) if card == "1"));

    let err = service
        .enroll(&identity, &draft("2", "  aMY "))
        .await
        .expect_err("same name");
    assert!(matches!(err, EnrollmentError::DuplicateName(_)));
}

#[tokio::test]
async fn suggested_card_number_follows_highest_enrolled() {
    let (_, service, identity) = setup();
    assert_eq!(
        service
            .suggest_card_number(&identity)
            .await
            .expect("suggest"),
        "1"
    );
    for (card, name) in [("4", "Amy"), ("12", "Bob")] {
        service
            .enroll(&identity, &draft(card, name))
            .await
            .expect("enroll");
    }
    assert_eq!(
        service
            .suggest_card_number(&identity)
            .await
            .expect("suggest"),
        "13"
    );
}

#[tokio::test]
async fn changing_card_number_moves_the_document() {
    let (store, service, identity) = setup();
    let original = service
        .enroll(&identity, &draft("1", "Amy"))
        .await
        .expect("enroll");
    service
        .enroll(&identity, &draft("2", "Bob"))
        .await
        .expect("enroll");

    let err = service
        .update(&identity, "1", &draft("2", "Amy"))
        .await
        .expect_err("card number taken");
    assert!(matches!(err, EnrollmentError::DuplicateCardNumber(_)));

    let moved = service
        .update(&identity, "1", &draft("7", "Amy K"))
        .await
        .expect("move");
    assert_eq!(moved.created_at, original.created_at);

    let roster = RosterRepository::new(store)
        .load_roster(&identity)
        .await
        .expect("roster");
    assert_eq!(roster.card_numbers().collect::<Vec<_>>(), vec!["2", "7"]);
}

#[tokio::test]
async fn updating_unknown_student_is_not_found() {
    let (_, service, identity) = setup();
    let err = service
        .update(&identity, "404", &draft("404", "Ghost"))
        .await
        .expect_err("missing student");
    assert!(matches!(err, EnrollmentError::StudentNotFound(card) if card == "404"));
}
