// Integration tests for the joined report queries
// Covers: left join without a match, unordered rows, order counts

use proptest::prelude::*;
use relmat_core::model::NewCustomer;
use relmat_core::repository::CustomerRepository;
use relmat_store::db::open_in_memory;
use relmat_store::repo::queries::{customer_order_counts, customers_with_orders};
use relmat_store::{SqliteCustomerRepo, SqliteOrderRepo};
use rusqlite::Connection;

fn seed(conn: &Connection) -> (i64, i64, i64) {
    let repo = SqliteCustomerRepo::new(conn);
    let mitch = repo.save(&NewCustomer::new("mitch", "mitch@mitch.com")).unwrap();
    let mia = repo.save(&NewCustomer::new("mia", "mia@mia.com")).unwrap();
    let valerie = repo
        .save(&NewCustomer::new("valerie", "valerie@valerie.com"))
        .unwrap();
    (mitch.id, mia.id, valerie.id)
}

#[test]
fn test_customer_without_orders_has_empty_collection() {
    // Given: three customers, only two with orders, inserted interleaved
    let conn = open_in_memory().unwrap();
    let (mitch, mia, valerie) = seed(&conn);
    let orders = SqliteOrderRepo::new(&conn);
    orders.save(mitch, "book").unwrap();
    orders.save(mia, "lamp").unwrap();
    orders.save(mitch, "pen").unwrap();

    // When: we materialize the left join
    let result = customers_with_orders(&conn).unwrap();

    // Then: one aggregate per customer
    assert_eq!(result.len(), 3);
    let by_id = |id: i64| result.iter().find(|c| c.id == id).unwrap();

    let skus: Vec<&str> = by_id(mitch).orders.iter().map(|o| o.sku.as_str()).collect();
    assert_eq!(skus, vec!["book", "pen"]);
    assert_eq!(by_id(mia).orders.len(), 1);

    // And: the customer with no orders has none, not a placeholder
    assert!(by_id(valerie).orders.is_empty());
}

#[test]
fn test_order_counts_include_zero() {
    let conn = open_in_memory().unwrap();
    let (mitch, mia, _) = seed(&conn);
    let orders = SqliteOrderRepo::new(&conn);
    orders.save(mitch, "book").unwrap();
    orders.save(mitch, "pen").unwrap();
    orders.save(mia, "lamp").unwrap();

    let counts: Vec<(String, i64)> = customer_order_counts(&conn)
        .unwrap()
        .into_iter()
        .map(|c| (c.name, c.order_count))
        .collect();

    assert_eq!(
        counts,
        vec![
            ("mitch".to_string(), 2),
            ("mia".to_string(), 1),
            ("valerie".to_string(), 0)
        ]
    );
}

#[test]
fn test_empty_database_yields_nothing() {
    let conn = open_in_memory().unwrap();
    assert!(customers_with_orders(&conn).unwrap().is_empty());
    assert!(customer_order_counts(&conn).unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_insertion_order_does_not_change_grouping(
        owners in proptest::collection::vec(0usize..3, 0..12)
    ) {
        let conn = open_in_memory().unwrap();
        let (a, b, c) = seed(&conn);
        let ids = [a, b, c];
        let orders = SqliteOrderRepo::new(&conn);
        for (n, owner) in owners.iter().enumerate() {
            orders.save(ids[*owner], &format!("sku-{}", n)).unwrap();
        }

        let result = customers_with_orders(&conn).unwrap();

        prop_assert_eq!(result.len(), 3);
        for (slot, id) in ids.iter().enumerate() {
            let expected = owners.iter().filter(|o| **o == slot).count();
            let customer = result.iter().find(|cw| cw.id == *id).unwrap();
            prop_assert_eq!(customer.orders.len(), expected);
            prop_assert!(customer.orders.windows(2).all(|w| w[0].id < w[1].id));
        }
    }
}
