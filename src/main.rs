use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use materiel::cli::{
    handle_article_command, handle_dashboard_command, handle_export_command,
    handle_history_command, handle_loan_command, handle_material_command, handle_person_command,
    handle_rental_command, handle_repair_command, handle_transaction_command,
    handle_vault_command,
};
use materiel::config::{paths::MaterielPaths, settings::Settings};
use materiel::crypto::SecureString;
use materiel::storage::Storage;

#[derive(Parser)]
#[command(
    name = "materiel",
    author = "Kaylee Beyene",
    version,
    about = "Inventory, equipment lending and document safe for small workshops",
    long_about = "Materiel tracks articles bought and sold with French VAT, \
                  equipment lent, rented or under repair, and keeps invoices \
                  and photos proving ownership in a password-protected vault."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Articles for sale
    #[command(subcommand)]
    Article(materiel::cli::ArticleCommands),

    /// Purchases and sales
    #[command(subcommand, alias = "txn")]
    Transaction(materiel::cli::TransactionCommands),

    /// Borrowers, customers, suppliers and repairers
    #[command(subcommand)]
    Person(materiel::cli::PersonCommands),

    /// Equipment
    #[command(subcommand)]
    Material(materiel::cli::MaterialCommands),

    /// Equipment lent for free
    #[command(subcommand)]
    Loan(materiel::cli::LoanCommands),

    /// Equipment rented out
    #[command(subcommand)]
    Rental(materiel::cli::RentalCommands),

    /// Equipment under repair
    #[command(subcommand)]
    Repair(materiel::cli::RepairCommands),

    /// Password-protected document safe
    Vault {
        /// Vault password; prompted for when absent
        #[arg(long, env = "MATERIEL_VAULT_PASSWORD", hide_env_values = true, global = true)]
        password: Option<String>,

        #[command(subcommand)]
        command: materiel::cli::VaultCommands,
    },

    /// Export data to JSON or CSV
    #[command(subcommand)]
    Export(materiel::cli::ExportCommands),

    /// Overview of stock, money and equipment
    Dashboard {
        /// Start of the commerce period
        #[arg(long)]
        from: Option<String>,
        /// End of the commerce period
        #[arg(long)]
        to: Option<String>,
    },

    /// Show recent changes from the audit log
    History {
        /// Only one kind of record (article, material, loan, document, ...)
        #[arg(short = 't', long = "type")]
        entity: Option<String>,
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

fn init_logging() {
    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_env("MATERIEL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = MaterielPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Materiel at: {}", paths.base_dir().display());
            if materiel::storage::init::initialize_storage(&paths)? {
                println!("Initialization complete!");
            } else {
                println!("Already initialized, nothing changed.");
            }
            println!();
            println!("Next steps:");
            println!("  materiel article create <name> --purchase <price> --sale <price>");
            println!("  materiel material create <name>");
            println!("  materiel vault setup");
        }
        Some(Commands::Config) => {
            println!("Materiel Configuration");
            println!("======================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Data directory:    {}", paths.data_dir().display());
            println!("Vault directory:   {}", paths.vault_dir().display());
            println!("Exports directory: {}", paths.exports_dir().display());
            println!();
            println!("Settings:");
            println!("  Currency:         {}", settings.currency_symbol);
            println!("  Default VAT rate: {}", settings.default_vat_rate);
            println!("  Date format:      {}", settings.date_format);
            println!("  Loan length:      {} days", settings.default_loan_days);
            println!("  CSV delimiter:    '{}'", settings.csv.delimiter);
            println!("  Biometric unlock: {}", settings.vault.biometrics_enabled);
        }
        Some(Commands::Article(cmd)) => {
            handle_article_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Transaction(cmd)) => {
            handle_transaction_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Person(cmd)) => {
            handle_person_command(&storage, cmd)?;
        }
        Some(Commands::Material(cmd)) => {
            handle_material_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Loan(cmd)) => {
            handle_loan_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Rental(cmd)) => {
            handle_rental_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Repair(cmd)) => {
            handle_repair_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Vault { password, command }) => {
            handle_vault_command(
                &storage,
                &settings,
                password.map(SecureString::from),
                command,
            )?;
        }
        Some(Commands::Export(cmd)) => {
            handle_export_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Dashboard { from, to }) => {
            handle_dashboard_command(&storage, from, to)?;
        }
        Some(Commands::History { entity, count }) => {
            handle_history_command(&storage, entity, count)?;
        }
        None => {
            println!("Materiel - inventory, equipment and document safe");
            println!();
            println!("Run 'materiel --help' for usage information.");
        }
    }

    Ok(())
}
