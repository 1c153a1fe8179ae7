//! Rental CLI commands

use clap::Subcommand;

use super::input::{
    parse_date, parse_discount, parse_money, parse_opt_date, parse_opt_money, parse_vat, today,
};
use crate::config::settings::Settings;
use crate::display::{format_rental_details, format_rental_list, DisplayContext};
use crate::error::MaterielResult;
use crate::models::{Money, PaymentStatus, Rental};
use crate::services::RentalService;
use crate::storage::Storage;

/// Rental subcommands
#[derive(Subcommand)]
pub enum RentalCommands {
    /// Rent a material out
    Create {
        /// Material name or ID
        material: String,
        /// Renter name or ID
        person: String,
        /// Daily rate HT
        #[arg(short, long)]
        rate: String,
        /// Last rented day
        #[arg(short, long)]
        end: String,
        /// First rented day, defaults to today
        #[arg(short, long)]
        start: Option<String>,
        /// VAT rate; defaults to the configured rate
        #[arg(long)]
        vat: Option<String>,
        /// Discount ("10%" or "5,00")
        #[arg(long)]
        discount: Option<String>,
        /// Deposit held during the rental
        #[arg(long)]
        deposit: Option<String>,
        /// Already paid
        #[arg(long)]
        paid: bool,
        /// Payment due date
        #[arg(long, conflicts_with = "paid")]
        due: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List rentals
    List {
        /// Include returned rentals
        #[arg(short, long)]
        all: bool,
    },
    /// Show rental details with pricing
    Show {
        /// Rental ID
        id: String,
    },
    /// Rentals still out after their last day
    Late,
    /// Unpaid rentals
    Unpaid,
    /// Bring a rental back and settle its deposit
    Return {
        /// Rental ID
        id: String,
        /// Return date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Part of the deposit kept
        #[arg(short, long)]
        retain: Option<String>,
    },
    /// Mark a rental as paid
    Pay {
        /// Rental ID
        id: String,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Change the discount of a rental ("0" removes it)
    Discount {
        /// Rental ID
        id: String,
        discount: String,
    },
    /// Delete a rental
    Delete {
        /// Rental ID
        id: String,
    },
}

/// Handle a rental command
pub fn handle_rental_command(
    storage: &Storage,
    settings: &Settings,
    cmd: RentalCommands,
) -> MaterielResult<()> {
    let service = RentalService::new(storage);
    let ctx = DisplayContext::load(storage, settings)?;

    match cmd {
        RentalCommands::Create {
            material,
            person,
            rate,
            end,
            start,
            vat,
            discount,
            deposit,
            paid,
            due,
            notes,
        } => {
            let material = storage.materials.resolve(&material)?;
            let person = storage.persons.resolve(&person)?;
            let start = parse_opt_date(start.as_deref())?.unwrap_or_else(today);
            let vat_rate = match vat {
                Some(v) => parse_vat(&v)?,
                None => settings.default_vat_rate,
            };

            let mut rental = Rental::new(
                material.id,
                person.id,
                start,
                parse_date(&end)?,
                parse_money(&rate)?,
                vat_rate,
            );
            if let Some(discount) = discount {
                rental.discount = parse_discount(&discount)?;
            }
            rental.deposit = parse_opt_money(deposit.as_deref())?.unwrap_or_default();
            rental.payment = if paid {
                PaymentStatus::paid_on(start)
            } else {
                PaymentStatus::unpaid(parse_opt_date(due.as_deref())?)
            };
            rental.notes = notes.unwrap_or_default();

            let rental = service.create(rental)?;
            let priced = RentalService::priced(rental);
            println!("Rented {} to {}", material.name, person.name);
            println!("  Days: {}", priced.days);
            println!("  TTC:  {}", priced.pricing.net_incl_tax);
            println!("  ID:   {}", priced.rental.id);
        }

        RentalCommands::List { all } => {
            let rentals = service.list(!all)?;
            println!("{}", format_rental_list(&rentals, &ctx));
        }

        RentalCommands::Show { id } => {
            let rental = storage.rentals.resolve(&id)?;
            print!(
                "{}",
                format_rental_details(&RentalService::priced(rental), &ctx)
            );
        }

        RentalCommands::Late => {
            let late: Vec<_> = service
                .late(today())?
                .into_iter()
                .map(RentalService::priced)
                .collect();
            println!("{}", format_rental_list(&late, &ctx));
        }

        RentalCommands::Unpaid => {
            let unpaid = service.unpaid(today())?;
            let total: Money = unpaid.iter().map(|(p, _)| p.pricing.net_incl_tax).sum();
            let rentals: Vec<_> = unpaid.into_iter().map(|(p, _)| p).collect();
            println!("{}", format_rental_list(&rentals, &ctx));
            if !rentals.is_empty() {
                println!("Total due: {}", total);
            }
        }

        RentalCommands::Return { id, date, retain } => {
            let rental = storage.rentals.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let retained = parse_opt_money(retain.as_deref())?.unwrap_or_default();

            let returned = service.return_rental(rental.id, date, retained)?;
            println!(
                "{} returned on {}",
                ctx.material(returned.rental.material_id),
                ctx.date(date)
            );
            if !returned.rental.deposit.is_zero() {
                println!("  Deposit:  {}", returned.settlement.outcome);
                println!("  Retained: {}", returned.settlement.retained);
                println!("  Returned: {}", returned.settlement.returned);
            }
        }

        RentalCommands::Pay { id, date } => {
            let rental = storage.rentals.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let paid = service.mark_paid(rental.id, date)?;
            println!("Rental {} paid on {}", paid.id, ctx.date(date));
        }

        RentalCommands::Discount { id, discount } => {
            let rental = storage.rentals.resolve(&id)?;
            let updated = service.set_discount(rental.id, parse_discount(&discount)?)?;
            let priced = RentalService::priced(updated);
            println!("Rental {} now costs {}", priced.rental.id, priced.pricing.net_incl_tax);
        }

        RentalCommands::Delete { id } => {
            let rental = storage.rentals.resolve(&id)?;
            let deleted = service.delete(rental.id)?;
            println!("Deleted rental {}", deleted.id);
        }
    }

    Ok(())
}
