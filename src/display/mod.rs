//! Display formatting for terminal output
//!
//! Lists are rendered as `tabled` tables, detail views as aligned
//! label/value lines.

pub mod commerce;
pub mod equipment;
pub mod report;
pub mod vault;

use std::collections::HashMap;

use chrono::NaiveDate;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::config::settings::Settings;
use crate::error::MaterielResult;
use crate::models::{MaterialId, PersonId};
use crate::storage::Storage;

pub use commerce::{
    format_article_details, format_article_list, format_margin_list, format_transaction_details,
    format_transaction_list, format_unpaid_list,
};
pub use equipment::{
    format_loan_list, format_material_details, format_material_list, format_person_details,
    format_person_list, format_rental_details, format_rental_list, format_repair_list,
};
pub use report::truncate;
pub use vault::format_document_list;

/// Names and preferences needed to render rows that reference other entities
#[derive(Debug, Clone, Default)]
pub struct DisplayContext {
    pub date_format: String,
    materials: HashMap<MaterialId, String>,
    persons: HashMap<PersonId, String>,
}

impl DisplayContext {
    pub fn load(storage: &Storage, settings: &Settings) -> MaterielResult<Self> {
        Ok(Self {
            date_format: settings.date_format.clone(),
            materials: storage
                .materials
                .get_all()?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect(),
            persons: storage
                .persons
                .get_all()?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect(),
        })
    }

    pub fn date(&self, date: NaiveDate) -> String {
        let format = if self.date_format.is_empty() {
            "%d/%m/%Y"
        } else {
            self.date_format.as_str()
        };
        date.format(format).to_string()
    }

    pub fn opt_date(&self, date: Option<NaiveDate>) -> String {
        date.map(|d| self.date(d)).unwrap_or_else(|| "-".into())
    }

    pub fn material(&self, id: MaterialId) -> String {
        self.materials
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn person(&self, id: PersonId) -> String {
        self.persons
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Render rows as a table, right-aligning the columns in `numeric`
pub(crate) fn render_table<T: Tabled>(
    rows: Vec<T>,
    numeric: std::ops::Range<usize>,
) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    if !numeric.is_empty() {
        table.with(Modify::new(Columns::new(numeric)).with(Alignment::right()));
    }
    table.to_string()
}
