//! Person CLI commands

use clap::Subcommand;

use super::input::clearable;
use crate::display::{format_person_details, format_person_list};
use crate::error::MaterielResult;
use crate::models::Person;
use crate::services::{PersonService, PersonUpdate};
use crate::storage::Storage;

/// Person subcommands
#[derive(Subcommand)]
pub enum PersonCommands {
    /// Add a person (borrower, customer, supplier, repairer)
    Create {
        name: String,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List persons
    List,
    /// Show person details
    Show {
        /// Person name or ID
        person: String,
    },
    /// Edit a person; pass an empty value to clear phone or email
    Edit {
        /// Person name or ID
        person: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a person nobody references
    Delete {
        /// Person name or ID
        person: String,
    },
}

/// Handle a person command
pub fn handle_person_command(storage: &Storage, cmd: PersonCommands) -> MaterielResult<()> {
    let service = PersonService::new(storage);

    match cmd {
        PersonCommands::Create {
            name,
            phone,
            email,
            notes,
        } => {
            let mut person = Person::new(name);
            person.phone = phone;
            person.email = email;
            person.notes = notes.unwrap_or_default();

            let person = service.create(person)?;
            println!("Created person: {}", person.name);
            println!("  ID: {}", person.id);
        }

        PersonCommands::List => {
            let persons = service.list()?;
            println!("{}", format_person_list(&persons));
        }

        PersonCommands::Show { person } => {
            let found = storage.persons.resolve(&person)?;
            print!("{}", format_person_details(&found));
        }

        PersonCommands::Edit {
            person,
            name,
            phone,
            email,
            notes,
        } => {
            let found = storage.persons.resolve(&person)?;
            let updated = service.update(
                found.id,
                PersonUpdate {
                    name,
                    phone: clearable(phone),
                    email: clearable(email),
                    notes,
                },
            )?;
            println!("Updated person: {}", updated.name);
        }

        PersonCommands::Delete { person } => {
            let found = storage.persons.resolve(&person)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted person: {}", deleted.name);
        }
    }

    Ok(())
}
