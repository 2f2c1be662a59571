use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use storage::{LookupError, UserStore};

#[test]
fn every_known_uid_resolves_to_its_own_record() {
    let store = UserStore::builtin().expect("builtin store");
    for record in store.records() {
        let resolved = store.resolve(record.uid.as_str()).expect("known uid");
        assert_eq!(resolved, record);
    }
}

#[test]
fn store_loaded_from_disk_matches_file_contents() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("atm_store_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("users.json");
    fs::write(
        &path,
        r#"{
            "DEADBEEF": {
                "uid": "DEADBEEF",
                "cardNumber": "4000 0000 0000 0002",
                "name": "Test Holder",
                "accountType": "Savings",
                "balance": 250,
                "transactions": [
                    { "date": "2024-01-02", "type": "Deposit", "amount": 250, "balance": 250 }
                ]
            }
        }"#,
    )
    .expect("write store");

    let store = UserStore::from_path(&path).expect("load");
    assert_eq!(store.len(), 1);
    assert_eq!(store.resolve("DEADBEEF").expect("record").name, "Test Holder");
    assert!(matches!(
        store.resolve("A1B2C3D4"),
        Err(LookupError::NotFound(_))
    ));

    fs::remove_dir_all(temp_root).expect("cleanup");
}
