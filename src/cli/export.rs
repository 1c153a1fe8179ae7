//! CLI commands for data export

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{MaterielError, MaterielResult};
use crate::export::{self, FullExport};
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export all data to a JSON file
    Json {
        /// Output file path
        output: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export articles to CSV
    Articles {
        /// Output file path
        output: PathBuf,
    },

    /// Export transactions to CSV
    Transactions {
        /// Output file path
        output: PathBuf,
    },

    /// Export materials to CSV
    Materials {
        /// Output file path
        output: PathBuf,
    },

    /// Write the JSON snapshot and every CSV file into a directory
    All {
        /// Target directory, defaults to the exports directory
        directory: Option<PathBuf>,
    },

    /// Show export information without writing files
    Info,
}

fn create_file(output: &Path) -> MaterielResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        MaterielError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> MaterielResult<()> {
    match cmd {
        ExportCommands::Json { output, pretty } => {
            let mut writer = create_file(&output)?;
            export::export_full_json(storage, &mut writer, pretty)?;
            println!("Full database exported to: {}", output.display());
        }

        ExportCommands::Articles { output } => {
            export::export_articles_csv(storage, create_file(&output)?, &settings.csv)?;
            println!(
                "Exported {} articles to: {}",
                storage.articles.count()?,
                output.display()
            );
        }

        ExportCommands::Transactions { output } => {
            export::export_transactions_csv(storage, create_file(&output)?, &settings.csv)?;
            println!(
                "Exported {} transactions to: {}",
                storage.transactions.count()?,
                output.display()
            );
        }

        ExportCommands::Materials { output } => {
            export::export_materials_csv(storage, create_file(&output)?, &settings.csv)?;
            println!(
                "Exported {} materials to: {}",
                storage.materials.count()?,
                output.display()
            );
        }

        ExportCommands::All { directory } => {
            let directory = directory.unwrap_or_else(|| storage.paths().exports_dir());
            fs::create_dir_all(&directory).map_err(|e| {
                MaterielError::Export(format!(
                    "Failed to create directory {}: {}",
                    directory.display(),
                    e
                ))
            })?;
            let stamp = Local::now().format("%Y%m%d-%H%M%S");

            let json_path = directory.join(format!("materiel-{}.json", stamp));
            export::export_full_json(storage, &mut create_file(&json_path)?, true)?;

            let articles = directory.join(format!("articles-{}.csv", stamp));
            export::export_articles_csv(storage, create_file(&articles)?, &settings.csv)?;
            let transactions = directory.join(format!("transactions-{}.csv", stamp));
            export::export_transactions_csv(storage, create_file(&transactions)?, &settings.csv)?;
            let materials = directory.join(format!("materials-{}.csv", stamp));
            export::export_materials_csv(storage, create_file(&materials)?, &settings.csv)?;

            println!("Exported to {}:", directory.display());
            for path in [&json_path, &articles, &transactions, &materials] {
                if let Some(name) = path.file_name() {
                    println!("  {}", name.to_string_lossy());
                }
            }
        }

        ExportCommands::Info => {
            let export = FullExport::from_storage(storage)?;

            println!("Export Information");
            println!("==================\n");

            println!("Schema Version: {}", export.schema_version);
            println!("App Version:    {}", export.app_version);
            println!();

            println!("Data Summary:");
            println!("  Articles:      {}", export.metadata.article_count);
            println!("  Transactions:  {}", export.metadata.transaction_count);
            println!("  Materials:     {}", export.metadata.material_count);
            println!("  Persons:       {}", export.metadata.person_count);
            println!("  Loans:         {}", export.loans.len());
            println!("  Rentals:       {}", export.rentals.len());
            println!("  Repairs:       {}", export.repairs.len());

            if let Some(earliest) = &export.metadata.earliest_transaction {
                println!("\nTransaction Date Range:");
                println!("  Earliest: {}", earliest);
            }
            if let Some(latest) = &export.metadata.latest_transaction {
                println!("  Latest:   {}", latest);
            }

            if let Err(problem) = export.validate() {
                println!("\nWarning: {}", problem);
            }

            println!("\nCSV delimiter: '{}'", settings.csv.delimiter);
            println!("Vault documents are never exported.");
        }
    }

    Ok(())
}
