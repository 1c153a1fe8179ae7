//! Material CLI commands

use clap::Subcommand;

use super::input::{clearable, parse_date, parse_money, parse_opt_date, parse_opt_money};
use crate::config::settings::Settings;
use crate::display::{format_material_details, format_material_list, DisplayContext};
use crate::error::{MaterielError, MaterielResult};
use crate::models::{Material, MaterialStatus};
use crate::services::{MaterialService, MaterialUpdate, MaterialWithStatus};
use crate::storage::Storage;

/// Material subcommands
#[derive(Subcommand)]
pub enum MaterialCommands {
    /// Add a piece of equipment
    Create {
        name: String,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        /// Serial number
        #[arg(short, long)]
        serial: Option<String>,
        /// Purchase date
        #[arg(long)]
        bought: Option<String>,
        /// Purchase price HT
        #[arg(short, long)]
        price: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List equipment with its current status
    List {
        /// Filter by status (available, loaned, rented, repair)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show a material with its loans, rentals and repairs
    Show {
        /// Material name or ID
        material: String,
    },
    /// Edit a material; pass an empty value to clear an optional field
    Edit {
        /// Material name or ID
        material: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        #[arg(short, long)]
        serial: Option<String>,
        #[arg(long)]
        bought: Option<String>,
        #[arg(short, long)]
        price: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a material that is not out
    Delete {
        /// Material name or ID
        material: String,
    },
}

fn parse_status(s: &str) -> MaterielResult<MaterialStatus> {
    match s.trim().to_lowercase().as_str() {
        "available" => Ok(MaterialStatus::Available),
        "loaned" | "loan" => Ok(MaterialStatus::Loaned),
        "rented" | "rental" => Ok(MaterialStatus::Rented),
        "repair" | "in_repair" | "in-repair" => Ok(MaterialStatus::InRepair),
        _ => Err(MaterielError::Validation(format!(
            "Invalid status: '{}'. Use available, loaned, rented or repair",
            s
        ))),
    }
}

/// Handle a material command
pub fn handle_material_command(
    storage: &Storage,
    settings: &Settings,
    cmd: MaterialCommands,
) -> MaterielResult<()> {
    let service = MaterialService::new(storage);

    match cmd {
        MaterialCommands::Create {
            name,
            category,
            brand,
            serial,
            bought,
            price,
            notes,
        } => {
            let mut material = Material::new(name);
            material.category = category.unwrap_or_default();
            material.brand = brand;
            material.serial_number = serial;
            material.purchase_date = parse_opt_date(bought.as_deref())?;
            material.purchase_price = parse_opt_money(price.as_deref())?;
            material.notes = notes.unwrap_or_default();

            let material = service.create(material)?;
            println!("Created material: {}", material.name);
            println!("  ID: {}", material.id);
        }

        MaterialCommands::List { status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let materials = service.list(status)?;
            println!("{}", format_material_list(&materials));
            if status.is_none() && !materials.is_empty() {
                println!("Inventory value HT: {}", service.inventory_value()?);
            }
        }

        MaterialCommands::Show { material } => {
            let found = storage.materials.resolve(&material)?;
            let status = service.status(found.id)?;
            let history = service.history(found.id)?;
            let documents = storage
                .vault_items
                .filter(|doc| doc.material_id == Some(found.id))?
                .len();
            let ctx = DisplayContext::load(storage, settings)?;

            let entry = MaterialWithStatus {
                material: found,
                status,
            };
            print!(
                "{}",
                format_material_details(&entry, &history, documents, &ctx)
            );
        }

        MaterialCommands::Edit {
            material,
            name,
            category,
            brand,
            serial,
            bought,
            price,
            notes,
        } => {
            let found = storage.materials.resolve(&material)?;
            let purchase_date = match clearable(bought) {
                Some(Some(date)) => Some(Some(parse_date(&date)?)),
                Some(None) => Some(None),
                None => None,
            };
            let purchase_price = match clearable(price) {
                Some(Some(price)) => Some(Some(parse_money(&price)?)),
                Some(None) => Some(None),
                None => None,
            };

            let updated = service.update(
                found.id,
                MaterialUpdate {
                    name,
                    category,
                    brand: clearable(brand),
                    serial_number: clearable(serial),
                    purchase_date,
                    purchase_price,
                    notes,
                },
            )?;
            println!("Updated material: {}", updated.name);
        }

        MaterialCommands::Delete { material } => {
            let found = storage.materials.resolve(&material)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted material: {}", deleted.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("Available").unwrap(), MaterialStatus::Available);
        assert_eq!(parse_status("repair").unwrap(), MaterialStatus::InRepair);
        assert!(parse_status("lost").is_err());
    }
}
