//! Repair CLI commands

use clap::Subcommand;

use super::input::{parse_money, parse_opt_date, parse_opt_money, parse_vat, today};
use crate::config::settings::Settings;
use crate::display::{format_repair_list, DisplayContext};
use crate::error::{MaterielError, MaterielResult};
use crate::models::{PaymentStatus, Repair, RepairStatus};
use crate::services::RepairService;
use crate::storage::Storage;

/// Repair subcommands
#[derive(Subcommand)]
pub enum RepairCommands {
    /// Send a material to repair
    Create {
        /// Material name or ID
        material: String,
        /// What needs fixing
        description: String,
        /// Repairer (known person name or ID)
        #[arg(short, long)]
        person: Option<String>,
        /// Repairer name when not a known person
        #[arg(short, long, conflicts_with = "person")]
        repairer: Option<String>,
        /// Start date, defaults to today
        #[arg(short, long)]
        start: Option<String>,
        /// Estimated cost HT
        #[arg(short, long)]
        cost: Option<String>,
        #[arg(long)]
        vat: Option<String>,
    },
    /// List repairs
    List {
        /// Include completed repairs
        #[arg(short, long)]
        all: bool,
    },
    /// Change the status of an open repair (pending, in-progress)
    Status {
        /// Repair ID
        id: String,
        status: String,
    },
    /// Close a repair
    Complete {
        /// Repair ID
        id: String,
        /// Completion date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Final cost HT
        #[arg(short, long)]
        cost: Option<String>,
    },
    /// Mark a repair as paid
    Pay {
        /// Repair ID
        id: String,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Delete a repair
    Delete {
        /// Repair ID
        id: String,
    },
}

/// Handle a repair command
pub fn handle_repair_command(
    storage: &Storage,
    settings: &Settings,
    cmd: RepairCommands,
) -> MaterielResult<()> {
    let service = RepairService::new(storage);
    let ctx = DisplayContext::load(storage, settings)?;

    match cmd {
        RepairCommands::Create {
            material,
            description,
            person,
            repairer,
            start,
            cost,
            vat,
        } => {
            let material = storage.materials.resolve(&material)?;
            let start = parse_opt_date(start.as_deref())?.unwrap_or_else(today);

            let mut repair = Repair::new(material.id, description, start);
            if let Some(person) = person {
                let person = storage.persons.resolve(&person)?;
                repair.repairer_id = Some(person.id);
                repair.repairer = person.name;
            } else if let Some(repairer) = repairer {
                repair.repairer = repairer;
            }
            if let Some(cost) = cost {
                repair.cost = parse_money(&cost)?;
                repair.payment = PaymentStatus::unpaid(None);
            }
            if let Some(vat) = vat {
                repair.vat_rate = parse_vat(&vat)?;
            }

            let repair = service.create(repair)?;
            println!("Sent {} to repair", material.name);
            println!("  ID: {}", repair.id);
        }

        RepairCommands::List { all } => {
            let repairs = service.list(!all)?;
            println!("{}", format_repair_list(&repairs, &ctx));
        }

        RepairCommands::Status { id, status } => {
            let repair = storage.repairs.resolve(&id)?;
            let status = RepairStatus::parse(&status).ok_or_else(|| {
                MaterielError::Validation(format!(
                    "Invalid status: '{}'. Use pending or in-progress",
                    status
                ))
            })?;
            let updated = service.set_status(repair.id, status)?;
            println!("Repair {} is now {}", updated.id, updated.status);
        }

        RepairCommands::Complete { id, date, cost } => {
            let repair = storage.repairs.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let cost = parse_opt_money(cost.as_deref())?;
            let completed = service.complete(repair.id, date, cost)?;
            println!(
                "Repair of {} completed on {}",
                ctx.material(completed.material_id),
                ctx.date(date)
            );
            println!(
                "  Cost TTC: {}",
                RepairService::pricing(&completed).net_incl_tax
            );
        }

        RepairCommands::Pay { id, date } => {
            let repair = storage.repairs.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let paid = service.mark_paid(repair.id, date)?;
            println!("Repair {} paid on {}", paid.id, ctx.date(date));
        }

        RepairCommands::Delete { id } => {
            let repair = storage.repairs.resolve(&id)?;
            let deleted = service.delete(repair.id)?;
            println!("Deleted repair {}", deleted.id);
        }
    }

    Ok(())
}
