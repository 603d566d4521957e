mod common;

use csv_user_loader::{
    error::LoaderError,
    persist::{self, DEFAULT_CHUNK_SIZE, PersistStrategy, insert_bulk, insert_transactional},
    record::{NestedRecord, NestedValue, PersistableUser},
    store::{StoreConfig, UserStore},
};
use serde_json::json;

use common::{TestWorkspace, oversized_name, users};

#[test]
fn transactional_path_tolerates_single_row_failure() {
    let mut store = UserStore::open_in_memory().expect("open");
    let mut batch = users(10);
    batch[4].name = oversized_name();

    let result = insert_transactional(&mut store, &batch).expect("insert");

    assert_eq!(result.inserted_count, 9);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].identifier, oversized_name());
    assert!(result.errors[0].message.contains("CHECK"), "{}", result.errors[0].message);
    assert_eq!(store.count().expect("count"), 9);
}

#[test]
fn bulk_path_rolls_back_everything_on_chunk_failure() {
    let mut store = UserStore::open_in_memory().expect("open");
    let mut batch = users(6_000);
    batch[5_000].name = oversized_name();

    let err = insert_bulk(&mut store, &batch, DEFAULT_CHUNK_SIZE).unwrap_err();

    assert!(matches!(err, LoaderError::BulkChunk { chunk: 5, .. }), "{err}");
    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn bulk_path_inserts_every_chunk_in_order() {
    let mut store = UserStore::open_in_memory().expect("open");
    let batch = users(2_503);

    let result = insert_bulk(&mut store, &batch, DEFAULT_CHUNK_SIZE).expect("insert");

    assert_eq!(result.inserted_count, 2_503);
    assert_eq!(result.failed_count, 0);
    assert!(result.errors.is_empty());
    let stored = store.all_records().expect("records");
    assert_eq!(stored.len(), 2_503);
    assert_eq!(stored[0].name, "User 0");
    assert_eq!(stored[1_000].name, "User 1000");
    assert_eq!(stored[2_502].name, "User 2502");
    assert!(stored.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test]
fn both_paths_store_identical_documents() {
    let mut address = NestedRecord::new();
    address.insert("city".into(), NestedValue::Leaf("NYC".into()));
    let mut extra = NestedRecord::new();
    extra.insert("gender".into(), NestedValue::Leaf("f".into()));
    let user = PersistableUser {
        name: "Jane Roe".into(),
        age: 41,
        address: Some(NestedValue::Branch(address)),
        additional_info: Some(extra),
    };

    let mut tx_store = UserStore::open_in_memory().expect("open");
    insert_transactional(&mut tx_store, std::slice::from_ref(&user)).expect("tx insert");
    let mut bulk_store = UserStore::open_in_memory().expect("open");
    insert_bulk(&mut bulk_store, std::slice::from_ref(&user), 1).expect("bulk insert");

    let from_tx = tx_store.all_records().expect("records");
    let from_bulk = bulk_store.all_records().expect("records");
    assert_eq!(from_tx, from_bulk);
    assert_eq!(from_tx[0].address, Some(json!({"city": "NYC"})));
    assert_eq!(from_tx[0].additional_info, Some(json!({"gender": "f"})));
    assert_eq!(from_tx[0].age, 41);
}

#[test]
fn persist_dispatches_on_strategy() {
    let mut store = UserStore::open_in_memory().expect("open");
    let mut batch = users(3);
    batch[1].name = oversized_name();

    let partial = persist::persist(&mut store, &batch, PersistStrategy::Transactional, 2)
        .expect("transactional");
    assert_eq!((partial.inserted_count, partial.failed_count), (2, 1));

    let fatal = persist::persist(&mut store, &batch, PersistStrategy::Bulk, 2);
    assert!(fatal.is_err());
    assert_eq!(store.count().expect("count"), 2);
}

#[test]
fn committed_rows_survive_reopen() {
    let workspace = TestWorkspace::new();
    let config = StoreConfig {
        path: Some(workspace.database()),
        ..StoreConfig::default()
    };
    {
        let mut store = UserStore::open(&config).expect("open");
        insert_bulk(&mut store, &users(12), 5).expect("insert");
    }
    let store = UserStore::open(&config).expect("reopen");
    assert_eq!(store.count().expect("count"), 12);
}

#[test]
fn transactional_path_keeps_nothing_when_sqlite_aborts_the_transaction() {
    let workspace = TestWorkspace::new();
    let config = StoreConfig {
        path: Some(workspace.database()),
        ..StoreConfig::default()
    };
    let mut store = UserStore::open(&config).expect("open");
    {
        let conn = rusqlite::Connection::open(workspace.database()).expect("second connection");
        conn.execute_batch(
            "CREATE TRIGGER abort_on_user_4 BEFORE INSERT ON users
             WHEN NEW.name = 'User 4'
             BEGIN SELECT RAISE(ROLLBACK, 'transaction aborted'); END;",
        )
        .expect("create trigger");
    }

    let err = insert_transactional(&mut store, &users(10)).unwrap_err();

    assert!(
        matches!(err, LoaderError::TransactionAborted { ref identifier, .. } if identifier == "User 4"),
        "{err}"
    );
    assert_eq!(store.count().expect("count"), 0);
    drop(store);
    let reopened = UserStore::open(&config).expect("reopen");
    assert_eq!(reopened.count().expect("count"), 0);
}
