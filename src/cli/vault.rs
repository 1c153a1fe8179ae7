//! Vault CLI commands
//!
//! Each invocation opens its own session: the vault starts locked, the
//! command unlocks it with the password, does its work and the session ends
//! with the process.

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use super::input::{prompt_line, prompt_secret};
use crate::config::settings::Settings;
use crate::crypto::SecureString;
use crate::display::{format_document_list, DisplayContext};
use crate::error::{MaterielError, MaterielResult};
use crate::models::DocumentKind;
use crate::storage::Storage;
use crate::vault::{
    NewDocument, PasswordManager, RecoverySetup, SecretLocation, SessionState, VaultSession,
    RESET_CONFIRMATION,
};

/// Recovery answers accepted per `vault recover` run
const ANSWER_ATTEMPTS: u32 = 3;

/// Vault subcommands
#[derive(Subcommand)]
pub enum VaultCommands {
    /// Create the vault password
    Setup {
        /// Also set a recovery question
        #[arg(short, long)]
        recovery: bool,
    },
    /// Show whether the vault is set up
    Status,
    /// Change the vault password
    ChangePassword,
    /// Set or replace the recovery question
    SetRecovery,
    /// Reset a forgotten password with the recovery answer
    Recover,
    /// Erase the password and every document in the vault
    Reset,
    /// Add a file to the vault
    Add {
        /// File to encrypt and store
        file: PathBuf,
        /// Title, defaults to the file name
        #[arg(short, long)]
        title: Option<String>,
        /// Document kind (photo, invoice, pdf, other); guessed from the extension
        #[arg(short, long)]
        kind: Option<String>,
        /// Material the document proves ownership of
        #[arg(short, long)]
        material: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List documents
    List,
    /// Decrypt a document to a file
    Get {
        /// Document ID or title
        id: String,
        /// Output file, defaults to the original file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a document
    Delete {
        /// Document ID or title
        id: String,
    },
}

/// Handle a vault command
///
/// `password` comes from `MATERIEL_VAULT_PASSWORD` when set; otherwise the
/// password is prompted for.
pub fn handle_vault_command(
    storage: &Storage,
    settings: &Settings,
    password: Option<SecureString>,
    cmd: VaultCommands,
) -> MaterielResult<()> {
    let manager = PasswordManager::open(storage.paths(), settings.vault.hash_params)?;
    let mut session = VaultSession::new(storage, manager, settings.vault.biometrics_enabled);

    match cmd {
        VaultCommands::Setup { recovery } => {
            let (password, confirmation) = match password {
                Some(p) => (p.clone(), p),
                None => (
                    prompt_secret("New vault password: ")?,
                    prompt_secret("Confirm password: ")?,
                ),
            };

            let location = if recovery {
                let question = prompt_line("Recovery question: ")?;
                let answer = prompt_secret("Answer: ")?;
                session.setup(
                    &password,
                    &confirmation,
                    Some(RecoverySetup {
                        question: &question,
                        answer: &answer,
                    }),
                )?
            } else {
                session.setup(&password, &confirmation, None)?
            };

            println!("Vault created.");
            report_location(location);
        }

        VaultCommands::Status => {
            match session.state() {
                SessionState::Uninitialized => {
                    println!("Vault: not set up");
                    println!("Run 'materiel vault setup' to create a password.");
                }
                _ => {
                    println!("Vault: locked");
                    match session.recovery_question() {
                        Some(question) => println!("Recovery question: {}", question),
                        None => println!("Recovery question: none"),
                    }
                    println!("Documents: {}", storage.vault_items.count()?);
                }
            }
        }

        VaultCommands::ChangePassword => {
            let old = unlock(&mut session, password)?;
            let new = prompt_secret("New password: ")?;
            let confirmation = prompt_secret("Confirm new password: ")?;
            let location = session.change_password(&old, &new, &confirmation)?;
            println!("Password changed.");
            report_location(location);
        }

        VaultCommands::SetRecovery => {
            unlock(&mut session, password)?;
            let question = prompt_line("Recovery question: ")?;
            let answer = prompt_secret("Answer: ")?;
            let location = session.set_recovery(&question, &answer)?;
            println!("Recovery question saved.");
            report_location(location);
        }

        VaultCommands::Recover => {
            session.begin_recovery()?;
            if let Some(question) = session.recovery_question() {
                println!("{}", question);
            }
            let mut attempts = 0;
            loop {
                let answer = prompt_secret("Answer: ")?;
                match session.submit_recovery_answer(&answer) {
                    Ok(()) => break,
                    Err(MaterielError::InvalidCredentials) if attempts + 1 < ANSWER_ATTEMPTS => {
                        attempts += 1;
                        println!("Wrong answer, try again.");
                    }
                    Err(e) => return Err(e),
                }
            }

            let new = prompt_secret("New password: ")?;
            let confirmation = prompt_secret("Confirm new password: ")?;
            let location = session.submit_new_password(&new, &confirmation)?;
            println!("Password reset.");
            report_location(location);
        }

        VaultCommands::Reset => {
            session.begin_full_reset()?;
            println!("This deletes the vault password, the recovery question and");
            println!(
                "all {} documents in the vault. It cannot be undone.",
                storage.vault_items.count()?
            );
            session.acknowledge_reset_warning()?;

            let typed = prompt_line(&format!("Type {} to confirm: ", RESET_CONFIRMATION))?;
            if typed.trim() != RESET_CONFIRMATION {
                session.cancel()?;
                println!("Reset cancelled.");
                return Ok(());
            }
            let removed = session.confirm_full_reset(&typed)?;
            println!("Vault reset, {} documents deleted.", removed);
        }

        VaultCommands::Add {
            file,
            title,
            kind,
            material,
            notes,
        } => {
            let kind = kind
                .as_deref()
                .map(|k| {
                    DocumentKind::parse(k).ok_or_else(|| {
                        MaterielError::Validation(format!(
                            "Invalid document kind: '{}'. Use photo, invoice, pdf or other",
                            k
                        ))
                    })
                })
                .transpose()?;
            let material_id = material
                .as_deref()
                .map(|m| storage.materials.resolve(m).map(|m| m.id))
                .transpose()?;

            let content = fs::read(&file).map_err(|e| {
                MaterielError::Io(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".into());

            unlock(&mut session, password)?;
            let item = session.add_document(NewDocument {
                title: title.unwrap_or_else(|| file_name.clone()),
                kind,
                file_name,
                material_id,
                notes: notes.unwrap_or_default(),
                content,
            })?;
            println!("Added {} ({})", item.title, item.kind);
            println!("  ID: {}", item.id);
        }

        VaultCommands::List => {
            unlock(&mut session, password)?;
            let documents = session.list_documents()?;
            let ctx = DisplayContext::load(storage, settings)?;
            println!("{}", format_document_list(&documents, &ctx));
        }

        VaultCommands::Get { id, output } => {
            unlock(&mut session, password)?;
            let item = storage.vault_items.resolve(&id)?;
            let (item, content) = session.read_document(item.id)?;

            let target = output.unwrap_or_else(|| PathBuf::from(&item.file_name));
            if target.exists() {
                return Err(MaterielError::Validation(format!(
                    "{} already exists",
                    target.display()
                )));
            }
            fs::write(&target, content)?;
            println!("Wrote {} to {}", item.title, target.display());
        }

        VaultCommands::Delete { id } => {
            unlock(&mut session, password)?;
            let item = storage.vault_items.resolve(&id)?;
            let deleted = session.delete_document(item.id)?;
            println!("Deleted {}", deleted.title);
        }
    }

    Ok(())
}

/// Unlock the session, returning the password that worked
fn unlock(
    session: &mut VaultSession<'_>,
    password: Option<SecureString>,
) -> MaterielResult<SecureString> {
    if session.state() == SessionState::Uninitialized {
        return Err(MaterielError::InvalidState {
            expected: "locked",
            actual: "vault not set up".into(),
        });
    }

    let password = match password {
        Some(p) => p,
        None => prompt_secret("Vault password: ")?,
    };
    session.unlock(&password)?;
    Ok(password)
}

fn report_location(location: SecretLocation) {
    if location == SecretLocation::Fallback {
        println!("Note: the keystore was unavailable; secrets were saved in the fallback store.");
    }
}
