pub mod categorize;
pub mod import;
pub mod init;
pub mod rules;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "haushalt",
    about = "Household bookkeeping CLI: imports and categorizes bank statement CSVs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up haushalt: choose a data directory and initialize the database.
    Init {
        /// Path for haushalt data (default: ~/Documents/haushalt)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import bank statement CSVs from the inbox, or a single file.
    Import {
        /// Path to a single CSV file; without it the inbox directory is processed
        file: Option<String>,
    },
    /// Re-run keyword categorization on stored transactions.
    Categorize,
    /// Manage keyword -> category rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Browse and edit transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a keyword rule.
    Add {
        /// Keyword, matched case-insensitively as a whole word
        keyword: String,
        /// Category to assign
        #[arg(long)]
        category: String,
    },
    /// List all keyword rules.
    List,
    /// Delete a rule by ID.
    Delete {
        /// Rule ID (shown in `haushalt rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// Add a transaction by hand.
    Add {
        /// Booking date (same formats as the importer, e.g. 01.03.2024)
        date: String,
        /// Signed amount: negative = Soll, positive = Haben (e.g. -45,90)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Description
        description: String,
        /// Category (default: resolved via keyword rules)
        #[arg(long)]
        category: Option<String>,
        /// Account identifier (IBAN)
        #[arg(long)]
        account: Option<String>,
    },
    /// List transactions, newest first.
    List {
        /// Month filter: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Category filter
        #[arg(long)]
        category: Option<String>,
        /// Maximum rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Edit a transaction; marks it as manually edited.
    Edit {
        /// Transaction ID (shown in `haushalt transactions list`)
        id: i64,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New subcategory
        #[arg(long)]
        subcategory: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a transaction by ID.
    Delete {
        /// Transaction ID
        id: i64,
    },
}
