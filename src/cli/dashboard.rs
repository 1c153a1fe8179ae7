//! Dashboard and audit history commands

use super::input::{parse_opt_date, today};
use crate::audit::EntityType;
use crate::error::{MaterielError, MaterielResult};
use crate::services::DashboardService;
use crate::storage::Storage;

/// Print the dashboard, commerce figures limited to the optional period
pub fn handle_dashboard_command(
    storage: &Storage,
    from: Option<String>,
    to: Option<String>,
) -> MaterielResult<()> {
    let from = parse_opt_date(from.as_deref())?;
    let to = parse_opt_date(to.as_deref())?;

    let dashboard = DashboardService::new(storage).summary(today(), from, to)?;
    print!("{}", dashboard.format_terminal());
    Ok(())
}

/// Print the most recent audit log entries, oldest first
pub fn handle_history_command(
    storage: &Storage,
    entity: Option<String>,
    count: usize,
) -> MaterielResult<()> {
    let entity_type = entity
        .as_deref()
        .map(|e| {
            EntityType::parse(e).ok_or_else(|| {
                MaterielError::Validation(format!("Unknown record type: '{}'", e))
            })
        })
        .transpose()?;

    let entries = storage.audit().read_recent_of(entity_type, count)?;
    if entries.is_empty() {
        println!("No changes recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
