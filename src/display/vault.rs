//! Vault document display formatting

use tabled::Tabled;

use super::report::truncate;
use super::DisplayContext;
use crate::models::VaultItem;

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Added")]
    added: String,
}

fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_document_list(documents: &[VaultItem], ctx: &DisplayContext) -> String {
    if documents.is_empty() {
        return "The vault is empty.".to_string();
    }

    let rows = documents
        .iter()
        .map(|d| DocumentRow {
            id: d.id.to_string(),
            title: truncate(&d.title, 30),
            kind: d.kind.to_string(),
            material: d
                .material_id
                .map(|id| truncate(&ctx.material(id), 24))
                .unwrap_or_default(),
            file: truncate(&d.file_name, 24),
            size: human_size(d.size_bytes),
            added: ctx.date(d.created_at.date_naive()),
        })
        .collect();

    super::render_table(rows, 5..6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
