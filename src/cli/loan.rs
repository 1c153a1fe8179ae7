//! Loan CLI commands

use clap::Subcommand;

use super::input::{parse_date, parse_opt_date, today};
use crate::config::settings::Settings;
use crate::display::{format_loan_list, DisplayContext};
use crate::error::MaterielResult;
use crate::services::LoanService;
use crate::storage::Storage;

/// Loan subcommands
#[derive(Subcommand)]
pub enum LoanCommands {
    /// Lend a material to a person
    Create {
        /// Material name or ID
        material: String,
        /// Borrower name or ID
        person: String,
        /// Start date, defaults to today
        #[arg(short, long)]
        start: Option<String>,
        /// Expected return date; defaults to the configured loan length
        #[arg(short, long)]
        until: Option<String>,
        /// No expected return date
        #[arg(long, conflicts_with = "until")]
        open: bool,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List loans
    List {
        /// Include returned loans
        #[arg(short, long)]
        all: bool,
    },
    /// Loans past their expected return date
    Overdue,
    /// Record the return of a loan
    Return {
        /// Loan ID
        id: String,
        /// Return date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Move the expected return date
    Extend {
        /// Loan ID
        id: String,
        /// New expected return date
        until: String,
    },
    /// Delete a loan
    Delete {
        /// Loan ID
        id: String,
    },
}

/// Handle a loan command
pub fn handle_loan_command(
    storage: &Storage,
    settings: &Settings,
    cmd: LoanCommands,
) -> MaterielResult<()> {
    let service = LoanService::new(storage);
    let ctx = DisplayContext::load(storage, settings)?;

    match cmd {
        LoanCommands::Create {
            material,
            person,
            start,
            until,
            open,
            notes,
        } => {
            let material = storage.materials.resolve(&material)?;
            let person = storage.persons.resolve(&person)?;
            let start = parse_opt_date(start.as_deref())?.unwrap_or_else(today);
            let expected_return = match parse_opt_date(until.as_deref())? {
                Some(date) => Some(date),
                None if open => None,
                None => Some(LoanService::default_return(
                    start,
                    settings.default_loan_days,
                )),
            };

            let loan = service.create(
                material.id,
                person.id,
                start,
                expected_return,
                notes.unwrap_or_default(),
            )?;
            println!("Lent {} to {}", material.name, person.name);
            println!("  Expected back: {}", ctx.opt_date(loan.expected_return));
            println!("  ID: {}", loan.id);
        }

        LoanCommands::List { all } => {
            let loans = service.list(!all)?;
            println!("{}", format_loan_list(&loans, today(), &ctx));
        }

        LoanCommands::Overdue => {
            let loans = service.overdue(today())?;
            println!("{}", format_loan_list(&loans, today(), &ctx));
        }

        LoanCommands::Return { id, date } => {
            let loan = storage.loans.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let returned = service.return_loan(loan.id, date)?;
            println!(
                "{} returned by {} on {}",
                ctx.material(returned.material_id),
                ctx.person(returned.person_id),
                ctx.date(date)
            );
        }

        LoanCommands::Extend { id, until } => {
            let loan = storage.loans.resolve(&id)?;
            let extended = service.extend(loan.id, parse_date(&until)?)?;
            println!(
                "Loan of {} now expected back {}",
                ctx.material(extended.material_id),
                ctx.opt_date(extended.expected_return)
            );
        }

        LoanCommands::Delete { id } => {
            let loan = storage.loans.resolve(&id)?;
            let deleted = service.delete(loan.id)?;
            println!("Deleted loan {}", deleted.id);
        }
    }

    Ok(())
}
