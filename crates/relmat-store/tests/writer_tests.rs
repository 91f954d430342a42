// Integration tests for the insert-and-fetch writer
// Covers: write round-trip, transactional atomicity, missing generated key

use relmat_core::logging_facility::test_capture::init_test_capture;
use relmat_core::model::{Customer, NewCustomer};
use relmat_core::repository::CustomerRepository;
use relmat_core::{Attributes, ExErrorKind, Identity, Value};
use relmat_store::db::open_in_memory;
use relmat_store::{run_in_transaction, InsertAndFetchWriter, SqliteCustomerRepo, TableSpec};
use rusqlite::Connection;

fn customers(conn: &Connection) -> InsertAndFetchWriter<'_> {
    InsertAndFetchWriter::new(conn, TableSpec::for_entity("Customer"))
}

#[test]
fn test_insert_and_fetch_round_trip() {
    // Given: an empty customers table
    let conn = open_in_memory().unwrap();
    let writer = customers(&conn);
    let attrs = Attributes::new().with("name", "X").with("email", "x@x.com");

    // When: we insert and fetch
    let row = writer.insert_and_fetch(&attrs).unwrap();
    let saved = Customer::from_row(&row).unwrap();

    // Then: the row carries a generated id and exactly the written fields
    assert!(saved.id > 0);
    assert_eq!(saved.name, "X");
    assert_eq!(saved.email, "x@x.com");

    // And: fetching by that id returns an equal record
    let again = writer.fetch_by_id(&Identity::from(saved.id)).unwrap();
    assert_eq!(Customer::from_row(&again).unwrap(), saved);
}

#[test]
fn test_fetch_unknown_id_is_not_found() {
    let conn = open_in_memory().unwrap();
    let err = customers(&conn)
        .fetch_by_id(&Identity::from(12345))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.table(), Some("customers"));
    assert_eq!(err.entity_id(), Some("12345"));
}

#[test]
fn test_second_of_three_inserts_fails_nothing_persists() {
    // Given: a customer already holding the email the second insert reuses
    let mut conn = open_in_memory().unwrap();
    let batch = [
        NewCustomer::new("a", "a@a.com"),
        NewCustomer::new("b", "a@a.com"),
        NewCustomer::new("c", "c@c.com"),
    ];

    // When: all three are saved in one transaction
    let result = run_in_transaction(&mut conn, |tx| {
        let repo = SqliteCustomerRepo::new(tx);
        for customer in &batch {
            repo.save(customer)?;
        }
        Ok(())
    });

    // Then: the second insert surfaces the storage constraint unmodified
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Integrity);
    assert!(err.message().contains("UNIQUE constraint failed: customers.email"));

    // And: the first insert was rolled back with it
    let repo = SqliteCustomerRepo::new(&conn);
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn test_committed_batch_persists_every_row() {
    let mut conn = open_in_memory().unwrap();
    let saved = run_in_transaction(&mut conn, |tx| {
        let repo = SqliteCustomerRepo::new(tx);
        let a = repo.save(&NewCustomer::new("a", "a@a.com"))?;
        let b = repo.save(&NewCustomer::new("b", "b@b.com"))?;
        Ok(vec![a, b])
    })
    .unwrap();

    let all = SqliteCustomerRepo::new(&conn).find_all().unwrap();
    assert_eq!(all, saved);
}

#[test]
fn test_table_without_generated_key_fails_and_keeps_nothing() {
    // Given: a table whose id column is not a generated key
    let conn = open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE audit_log (id INTEGER, note TEXT)")
        .unwrap();
    let writer = InsertAndFetchWriter::new(&conn, TableSpec::new("audit_log", "id"));

    // When: we insert without supplying an id
    let err = writer
        .insert_and_fetch(&Attributes::new().with("note", "hello"))
        .unwrap_err();

    // Then: key generation fails
    assert_eq!(err.kind(), ExErrorKind::KeyGeneration);
    assert_eq!(err.table(), Some("audit_log"));

    // And: the keyless row was not left behind
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_log", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_table_without_key_column_fails_key_generation() {
    // Given: a table with no column named like the declared key
    let conn = open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE nokey (note TEXT)").unwrap();
    let writer = InsertAndFetchWriter::new(&conn, TableSpec::new("nokey", "id"));

    // When: we insert a row
    let err = writer
        .insert(&Attributes::new().with("note", "x"))
        .unwrap_err();

    // Then: it is a key generation failure, not a mapping failure
    assert_eq!(err.kind(), ExErrorKind::KeyGeneration);

    // And: the savepoint removed the row
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM nokey", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_row_invisible_after_insert_is_consistency_violation() {
    let capture = init_test_capture();

    // Given: a table whose trigger deletes each row as soon as it lands
    let conn = open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE vanish (id INTEGER PRIMARY KEY AUTOINCREMENT, note TEXT);
         CREATE TRIGGER vanish_after_insert AFTER INSERT ON vanish
         BEGIN DELETE FROM vanish WHERE id = NEW.id; END;",
    )
    .unwrap();
    let writer = InsertAndFetchWriter::new(&conn, TableSpec::new("vanish", "id"));

    // When: we insert and read back
    let err = writer
        .insert_and_fetch(&Attributes::new().with("note", "gone"))
        .unwrap_err();

    // Then: the missing row is a consistency violation caused by NotFound
    assert_eq!(err.kind(), ExErrorKind::ConsistencyViolation);
    assert_eq!(err.table(), Some("vanish"));
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::NotFound)
    );

    // And: the error boundary records the Failed phase
    let failed = capture
        .find("insert_and_fetch", "end_error")
        .into_iter()
        .filter(|e| e.field("table") == Some("vanish"))
        .collect::<Vec<_>>();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].field("phase"), Some("Failed"));
}

#[test]
fn test_missing_key_inside_transaction_keeps_earlier_writes_in_scope() {
    // The savepoint undoes only the failed insert; the caller decides the rest
    let mut conn = open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE audit_log (id INTEGER, note TEXT)")
        .unwrap();

    let kept = run_in_transaction(&mut conn, |tx| {
        let saved = SqliteCustomerRepo::new(tx).save(&NewCustomer::new("a", "a@a.com"))?;
        let audit = InsertAndFetchWriter::new(tx, TableSpec::new("audit_log", "id"));
        let err = audit
            .insert(&Attributes::new().with("note", "x"))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::KeyGeneration);
        Ok(saved)
    })
    .unwrap();

    let repo = SqliteCustomerRepo::new(&conn);
    assert_eq!(repo.find_all().unwrap(), vec![kept]);
}

#[test]
fn test_text_keys_are_returned() {
    let conn = open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tags (code TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(4)))), label TEXT)",
    )
    .unwrap();
    let writer = InsertAndFetchWriter::new(&conn, TableSpec::new("tags", "code"));

    let row = writer
        .insert_and_fetch(&Attributes::new().with("label", "red"))
        .unwrap();

    assert!(matches!(row.get("code"), Some(Value::Text(code)) if code.len() == 8));
    assert_eq!(row.get("label"), Some(&Value::Text("red".to_string())));
}
