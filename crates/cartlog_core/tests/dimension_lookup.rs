use cartlog_core::db::open_db_in_memory;
use cartlog_core::{
    ProductRepository, RepoError, SqliteProductRepository, SqliteStoreRepository, StoreRepository,
};
use rusqlite::Connection;

#[test]
fn get_or_create_store_creates_once_and_reuses() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    let first = repo.get_or_create("Corner Shop").unwrap();
    let second = repo.get_or_create("Corner Shop").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "Corner Shop");
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn get_or_create_store_normalizes_whitespace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    let first = repo.get_or_create("Corner Shop").unwrap();
    let second = repo.get_or_create("  Corner \t Shop ").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Corner Shop");
}

#[test]
fn get_or_create_store_is_case_insensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    let first = repo.get_or_create("ALDI").unwrap();
    let second = repo.get_or_create("aldi").unwrap();

    assert_eq!(first.id, second.id);
    // The first spelling wins; later casings do not rewrite the row.
    assert_eq!(second.name, "ALDI");
}

#[test]
fn get_or_create_store_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    let err = repo.get_or_create("   ").unwrap_err();
    assert!(matches!(err, RepoError::BlankName { table: "stores" }));
}

#[test]
fn find_store_by_name_and_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    let created = repo.get_or_create("Corner Shop").unwrap();

    let by_name = repo.find_by_name("corner  shop").unwrap().unwrap();
    assert_eq!(by_name.id, created.id);

    let by_id = repo.get(created.id).unwrap().unwrap();
    assert_eq!(by_id.name, "Corner Shop");

    assert!(repo.find_by_name("nowhere").unwrap().is_none());
    assert!(repo.get(created.id + 100).unwrap().is_none());
    assert!(repo.find_by_name("  ").unwrap().is_none());
}

#[test]
fn store_list_is_ordered_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::try_new(&conn).unwrap();

    repo.get_or_create("Zebra Mart").unwrap();
    repo.get_or_create("aldi").unwrap();
    repo.get_or_create("Corner Shop").unwrap();

    let names: Vec<String> = repo.list().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["aldi", "Corner Shop", "Zebra Mart"]);
}

#[test]
fn get_or_create_product_creates_once_and_reuses() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();

    let first = repo.get_or_create("Whole Milk 1L").unwrap();
    let second = repo.get_or_create("whole milk 1l").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn get_or_create_product_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();

    let err = repo.get_or_create("").unwrap_err();
    assert!(matches!(err, RepoError::BlankName { table: "products" }));
}

#[test]
fn stores_and_products_are_independent_dimensions() {
    let conn = open_db_in_memory().unwrap();
    let stores = SqliteStoreRepository::try_new(&conn).unwrap();
    let products = SqliteProductRepository::try_new(&conn).unwrap();

    stores.get_or_create("Milk").unwrap();
    assert!(products.find_by_name("Milk").unwrap().is_none());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteStoreRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        cartlog_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqliteStoreRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("stores"))));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE stores (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );",
    )
    .unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        cartlog_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqliteStoreRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "stores",
            column: "created_at"
        })
    ));
}
