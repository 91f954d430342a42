//! Demo harness
//!
//! Seeds the configured database and runs an explicit, ordered list of named
//! scenarios. `--only` narrows the list; the run order is always the list
//! order below, whatever order the names are given in.

use clap::Args;
use relmat_core::model::{Customer, NewCustomer};
use relmat_core::repository::{CustomerRepository, LoggingSaveHook};
use relmat_core::{log_op_end, log_op_start, Identity};
use relmat_store::repo::queries::{customer_order_counts, customers_with_orders};
use relmat_store::{
    run_in_transaction, InsertAndFetchWriter, SqliteCustomerRepo, SqliteOrderRepo, TableSpec,
};
use rusqlite::Connection;

use super::print_json;
use crate::settings::Settings;

type ScenarioResult = Result<(), Box<dyn std::error::Error>>;

/// A named demo step
pub struct Scenario {
    pub name: &'static str,
    pub run: fn(&mut Connection) -> ScenarioResult,
}

/// Every scenario, in run order
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "order-counts",
            run: order_counts,
        },
        Scenario {
            name: "customers-with-orders",
            run: print_customers_with_orders,
        },
        Scenario {
            name: "insert-and-fetch",
            run: insert_and_fetch,
        },
        Scenario {
            name: "repository-save",
            run: repository_save,
        },
    ]
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Run only the named scenarios (repeatable)
    #[arg(long = "only", value_name = "SCENARIO")]
    pub only: Vec<String>,
}

pub fn execute(settings: &Settings, args: DemoArgs) -> ScenarioResult {
    let selected = select(scenarios(), &args.only)?;
    let mut conn = settings.open()?;
    seed(&mut conn)?;

    for scenario in selected {
        log_op_start!("demo_scenario", scenario = scenario.name);
        let start = std::time::Instant::now();
        println!("== {} ==", scenario.name);
        (scenario.run)(&mut conn)?;
        log_op_end!(
            "demo_scenario",
            duration_ms = start.elapsed().as_millis() as u64,
            scenario = scenario.name
        );
    }
    Ok(())
}

/// Keep the scenarios named in `only`, in list order
fn select(all: Vec<Scenario>, only: &[String]) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    if let Some(unknown) = only
        .iter()
        .find(|name| !all.iter().any(|s| s.name == name.as_str()))
    {
        let known: Vec<&str> = all.iter().map(|s| s.name).collect();
        return Err(format!(
            "unknown scenario '{}' (known: {})",
            unknown,
            known.join(", ")
        )
        .into());
    }
    if only.is_empty() {
        return Ok(all);
    }
    Ok(all
        .into_iter()
        .filter(|s| only.iter().any(|name| name == s.name))
        .collect())
}

const SEED_CUSTOMERS: [&str; 4] = ["mitch", "mia", "valerie", "jennifer"];
const SEED_ORDERS: [(&str, &str); 3] = [("mitch", "book"), ("mitch", "lamp"), ("mia", "pen")];

fn seed_email(name: &str) -> String {
    format!("{}@{}.com", name, name)
}

/// Insert the demo customers and their orders unless already present
fn seed(conn: &mut Connection) -> ScenarioResult {
    run_in_transaction(conn, |tx| {
        let customers = SqliteCustomerRepo::new(tx);
        let orders = SqliteOrderRepo::new(tx);
        for name in SEED_CUSTOMERS {
            if customers.find_by_email(&seed_email(name))?.is_some() {
                continue;
            }
            let customer = customers.save(&NewCustomer::new(name, seed_email(name)))?;
            for (_, sku) in SEED_ORDERS.iter().filter(|(owner, _)| *owner == name) {
                orders.save(customer.id, sku)?;
            }
        }
        Ok(())
    })?;
    Ok(())
}

fn order_counts(conn: &mut Connection) -> ScenarioResult {
    for row in customer_order_counts(conn)? {
        print_json(&row)?;
    }
    Ok(())
}

fn print_customers_with_orders(conn: &mut Connection) -> ScenarioResult {
    for customer in customers_with_orders(conn)? {
        print_json(&customer)?;
    }
    Ok(())
}

/// Insert-and-fetch one customer, then read every customer back by id
fn insert_and_fetch(conn: &mut Connection) -> ScenarioResult {
    let repo = SqliteCustomerRepo::new(conn);
    let writer = InsertAndFetchWriter::new(conn, TableSpec::for_entity("Customer"));

    if repo.find_by_email("x@x.com")?.is_none() {
        let attrs = NewCustomer::new("X", "x@x.com").attributes();
        let inserted = Customer::from_row(&writer.insert_and_fetch(&attrs)?)?;
        println!("inserted {}", inserted.id);
    }

    for customer in repo.find_all()? {
        let row = writer.fetch_by_id(&Identity::from(customer.id))?;
        print_json(&Customer::from_row(&row)?)?;
    }
    Ok(())
}

fn repository_save(conn: &mut Connection) -> ScenarioResult {
    let repo = SqliteCustomerRepo::with_hook(conn, LoggingSaveHook);
    let violetta = NewCustomer::new("violetta", "violetta@violetta.com");
    if repo.find_by_email(&violetta.email)?.is_none() {
        repo.save(&violetta)?;
    }
    for customer in repo.find_all()? {
        print_json(&customer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(selected: &[Scenario]) -> Vec<&'static str> {
        selected.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_select_all_by_default() {
        let selected = select(scenarios(), &[]).unwrap();
        assert_eq!(
            names(&selected),
            vec![
                "order-counts",
                "customers-with-orders",
                "insert-and-fetch",
                "repository-save"
            ]
        );
    }

    #[test]
    fn test_select_keeps_list_order() {
        let only = vec!["repository-save".to_string(), "order-counts".to_string()];
        let selected = select(scenarios(), &only).unwrap();
        assert_eq!(names(&selected), vec!["order-counts", "repository-save"]);
    }

    #[test]
    fn test_select_rejects_unknown_name() {
        let err = select(scenarios(), &["nope".to_string()]).err().unwrap();
        assert!(err.to_string().contains("unknown scenario 'nope'"));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut conn = relmat_store::db::open_in_memory().unwrap();
        seed(&mut conn).unwrap();
        seed(&mut conn).unwrap();

        let counts = customer_order_counts(&conn).unwrap();
        let total: i64 = counts.iter().map(|c| c.order_count).sum();
        assert_eq!(counts.len(), 4);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_every_scenario_runs_on_seeded_database() {
        let mut conn = relmat_store::db::open_in_memory().unwrap();
        seed(&mut conn).unwrap();
        for scenario in scenarios() {
            (scenario.run)(&mut conn).unwrap();
        }

        let repo = SqliteCustomerRepo::new(&conn);
        assert!(repo.find_by_email("x@x.com").unwrap().is_some());
        assert!(repo.find_by_email("violetta@violetta.com").unwrap().is_some());
    }
}
