use cartlog_core::db::open_db_in_memory;
use cartlog_core::{
    NewPurchase, ProductRepository, PurchaseRepository, ReceiptRepository, RepoError,
    SqliteProductRepository, SqlitePurchaseRepository, SqliteReceiptRepository,
    SqliteStoreRepository, StoreRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn insert_and_get_receipt_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStoreRepository::try_new(&conn)
        .unwrap()
        .get_or_create("Corner Shop")
        .unwrap();
    let repo = SqliteReceiptRepository::try_new(&conn).unwrap();

    let uuid = Uuid::new_v4();
    let receipt = repo.insert(store.id, uuid, 1_700_000_000_000).unwrap();

    assert_eq!(receipt.store_id, store.id);
    assert_eq!(receipt.uuid, uuid);
    assert_eq!(receipt.purchased_at, 1_700_000_000_000);
    assert!(receipt.imported_at > 0);

    let loaded = repo.get(receipt.id).unwrap().unwrap();
    assert_eq!(loaded, receipt);

    let by_uuid = repo.find_by_uuid(uuid).unwrap().unwrap();
    assert_eq!(by_uuid.id, receipt.id);
}

#[test]
fn insert_with_duplicate_uuid_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStoreRepository::try_new(&conn)
        .unwrap()
        .get_or_create("Corner Shop")
        .unwrap();
    let repo = SqliteReceiptRepository::try_new(&conn).unwrap();

    let uuid = Uuid::new_v4();
    repo.insert(store.id, uuid, 100).unwrap();

    let err = repo.insert(store.id, uuid, 200).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateVisit(dup) if dup == uuid));
}

#[test]
fn receipt_lists_are_newest_purchase_first() {
    let conn = open_db_in_memory().unwrap();
    let stores = SqliteStoreRepository::try_new(&conn).unwrap();
    let store_a = stores.get_or_create("Corner Shop").unwrap();
    let store_b = stores.get_or_create("Zebra Mart").unwrap();
    let repo = SqliteReceiptRepository::try_new(&conn).unwrap();

    let old = repo.insert(store_a.id, Uuid::new_v4(), 100).unwrap();
    let newer = repo.insert(store_a.id, Uuid::new_v4(), 300).unwrap();
    let other_store = repo.insert(store_b.id, Uuid::new_v4(), 200).unwrap();

    let for_store: Vec<i64> = repo
        .list_for_store(store_a.id)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(for_store, vec![newer.id, old.id]);

    let all: Vec<i64> = repo.list_all().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(all, vec![newer.id, other_store.id, old.id]);
}

#[test]
fn purchases_keep_insertion_order_for_receipt() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStoreRepository::try_new(&conn)
        .unwrap()
        .get_or_create("Corner Shop")
        .unwrap();
    let products = SqliteProductRepository::try_new(&conn).unwrap();
    let milk = products.get_or_create("Milk").unwrap();
    let bread = products.get_or_create("Bread").unwrap();
    let receipt = SqliteReceiptRepository::try_new(&conn)
        .unwrap()
        .insert(store.id, Uuid::new_v4(), 100)
        .unwrap();
    let repo = SqlitePurchaseRepository::try_new(&conn).unwrap();

    let first = repo
        .insert(&NewPurchase {
            receipt_id: receipt.id,
            product_id: milk.id,
            quantity: 2.0,
            unit_price_cents: Some(129),
            total_price_cents: 258,
        })
        .unwrap();
    let second = repo
        .insert(&NewPurchase {
            receipt_id: receipt.id,
            product_id: bread.id,
            quantity: 1.0,
            unit_price_cents: None,
            total_price_cents: 199,
        })
        .unwrap();

    assert_eq!(first.quantity, 2.0);
    assert_eq!(first.unit_price_cents, Some(129));

    let lines = repo.list_for_receipt(receipt.id).unwrap();
    assert_eq!(lines, vec![first, second]);
}

#[test]
fn delete_receipt_cascades_to_purchases() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStoreRepository::try_new(&conn)
        .unwrap()
        .get_or_create("Corner Shop")
        .unwrap();
    let milk = SqliteProductRepository::try_new(&conn)
        .unwrap()
        .get_or_create("Milk")
        .unwrap();
    let receipts = SqliteReceiptRepository::try_new(&conn).unwrap();
    let receipt = receipts.insert(store.id, Uuid::new_v4(), 100).unwrap();

    SqlitePurchaseRepository::try_new(&conn)
        .unwrap()
        .insert(&NewPurchase {
            receipt_id: receipt.id,
            product_id: milk.id,
            quantity: 1.0,
            unit_price_cents: None,
            total_price_cents: 129,
        })
        .unwrap();

    receipts.delete(receipt.id).unwrap();

    assert!(receipts.get(receipt.id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "purchases"), 0);
    // Dimension rows survive receipt deletion.
    assert_eq!(count_rows(&conn, "stores"), 1);
    assert_eq!(count_rows(&conn, "products"), 1);
}

#[test]
fn delete_missing_receipt_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteReceiptRepository::try_new(&conn).unwrap();

    let err = repo.delete(42).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            table: "receipts",
            id: 42
        }
    ));
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
