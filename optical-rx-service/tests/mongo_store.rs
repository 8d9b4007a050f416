//! Runs against a live MongoDB: `TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`

use chrono::{Duration, Utc};
use optical_rx_service::models::{FamilyMember, Prescription, RxType};
use optical_rx_service::services::{AlertScope, MongoStore, RxStore};

async fn store() -> MongoStore {
    let uri = std::env::var("TEST_MONGODB_URI").expect("TEST_MONGODB_URI must be set");
    let database = format!("optical_rx_test_{}", uuid::Uuid::new_v4().simple());
    let store = MongoStore::connect(&uri, &database).await.unwrap();
    store.initialize_indexes().await.unwrap();
    store
}

#[tokio::test]
#[ignore]
async fn member_and_prescription_round_trip() {
    let store = store().await;
    store.health_check().await.unwrap();

    let member = FamilyMember::new("acct".into(), "Ana".into(), "self".into());
    store.insert_member(&member).await.unwrap();
    let today = Utc::now().date_naive();
    let rx = Prescription::new(
        "acct".into(),
        member.id.clone(),
        RxType::Contact,
        "aGVsbG8=".into(),
        String::new(),
        today,
        today + Duration::days(365),
    );
    store.insert_prescription(&rx).await.unwrap();

    let found = store.find_prescription("acct", &rx.id).await.unwrap().unwrap();
    assert_eq!(found.expiry_date, rx.expiry_date);
    assert_eq!(store.count_prescriptions("acct", Some(RxType::Contact)).await.unwrap(), 1);
    assert_eq!(store.count_prescriptions("other", None).await.unwrap(), 0);

    let removed = store
        .delete_member_prescriptions("acct", &member.id)
        .await
        .unwrap();
    assert_eq!(removed, vec![rx.id.clone()]);
    store
        .delete_alerts("acct", AlertScope::Prescriptions(removed))
        .await
        .unwrap();
    assert!(store.delete_member("acct", &member.id).await.unwrap());
}
