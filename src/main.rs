mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod parser;
mod settings;

use clap::Parser;

use cli::{Cli, Commands, RulesCommands, TransactionsCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file } => cli::import::run(file.as_deref()),
        Commands::Categorize => cli::categorize::run(),
        Commands::Rules { command } => match command {
            RulesCommands::Add { keyword, category } => cli::rules::add(&keyword, &category),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::Add {
                date,
                amount,
                description,
                category,
                account,
            } => cli::transactions::add(
                &date,
                &amount,
                &description,
                category.as_deref(),
                account.as_deref(),
            ),
            TransactionsCommands::List {
                month,
                category,
                limit,
            } => cli::transactions::list(month.as_deref(), category.as_deref(), limit),
            TransactionsCommands::Edit {
                id,
                category,
                subcategory,
                description,
            } => cli::transactions::edit(
                id,
                category.as_deref(),
                subcategory.as_deref(),
                description.as_deref(),
            ),
            TransactionsCommands::Delete { id } => cli::transactions::delete(id),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
