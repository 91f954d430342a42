//! Customer commands

use clap::{Args, Subcommand};
use relmat_core::model::NewCustomer;
use relmat_core::repository::{CustomerRepository, LoggingSaveHook};
use relmat_store::SqliteCustomerRepo;

use super::print_json;
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct CustomerArgs {
    #[command(subcommand)]
    pub command: CustomerCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// Insert a customer and print the persisted row
    Add(AddArgs),
    /// Print every customer
    List,
    /// Print one customer by id
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: i64,
}

pub fn execute(settings: &Settings, args: CustomerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = settings.open()?;
    let repo = SqliteCustomerRepo::with_hook(&conn, LoggingSaveHook);

    match args.command {
        CustomerCommand::Add(add) => {
            let customer = repo.save(&NewCustomer::new(add.name, add.email))?;
            print_json(&customer)
        }
        CustomerCommand::List => {
            for customer in repo.find_all()? {
                print_json(&customer)?;
            }
            Ok(())
        }
        CustomerCommand::Show(show) => match repo.find_by_id(show.id)? {
            Some(customer) => print_json(&customer),
            None => Err(format!("customer {} not found", show.id).into()),
        },
    }
}
