//! Report commands

use clap::{Args, Subcommand};
use relmat_store::repo::queries::customers_with_orders;

use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Every customer with its orders, as a JSON array
    Orders,
}

pub fn execute(settings: &Settings, args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = settings.open()?;

    match args.command {
        ReportCommand::Orders => {
            let report = customers_with_orders(&conn)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
