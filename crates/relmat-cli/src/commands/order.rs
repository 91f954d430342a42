//! Order commands

use clap::{Args, Subcommand};
use relmat_store::SqliteOrderRepo;

use super::print_json;
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct OrderArgs {
    #[command(subcommand)]
    pub command: OrderCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Place an order for an existing customer
    Add(AddArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Customer id
    #[arg(long)]
    pub customer: i64,

    #[arg(long)]
    pub sku: String,
}

pub fn execute(settings: &Settings, args: OrderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = settings.open()?;

    match args.command {
        OrderCommand::Add(add) => {
            let order = SqliteOrderRepo::new(&conn).save(add.customer, &add.sku)?;
            print_json(&order)
        }
    }
}
