//! relmat CLI
//!
//! Command-line interface for the customer/order store and the demo harness

use clap::{Parser, Subcommand};
use relmat_core::logging_facility;

mod commands;
mod settings;

use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "relmat")]
#[command(about = "relmat - joined rows in, customer/order aggregates out", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed the database and run the named demo scenarios in order
    Demo(commands::demo::DemoArgs),
    /// Customer operations
    Customer(commands::customer::CustomerArgs),
    /// Order operations
    Order(commands::order::OrderArgs),
    /// Reports over joined customer/order rows
    Report(commands::report::ReportArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.settings.log.profile());

    let result = match cli.command {
        Commands::Demo(args) => commands::demo::execute(&cli.settings, args),
        Commands::Customer(args) => commands::customer::execute(&cli.settings, args),
        Commands::Order(args) => commands::order::execute(&cli.settings, args),
        Commands::Report(args) => commands::report::execute(&cli.settings, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
