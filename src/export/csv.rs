//! CSV export
//!
//! Files are written for French spreadsheets: UTF-8 with a byte order mark,
//! `;` between fields and a decimal comma in numbers. Delimiter and BOM
//! come from the settings.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Write;

use crate::config::settings::CsvSettings;
use crate::error::{MaterielError, MaterielResult};
use crate::models::Money;
use crate::services::{CommerceService, MaterialService, TransactionFilter};
use crate::storage::Storage;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn export_err(e: impl std::fmt::Display) -> MaterielError {
    MaterielError::Export(e.to_string())
}

fn writer<W: Write>(out: W, options: &CsvSettings) -> MaterielResult<::csv::Writer<W>> {
    if !options.delimiter.is_ascii() {
        return Err(MaterielError::Config(format!(
            "CSV delimiter must be an ASCII character, got '{}'",
            options.delimiter
        )));
    }

    let mut out = out;
    if options.bom {
        out.write_all(UTF8_BOM).map_err(export_err)?;
    }

    Ok(::csv::WriterBuilder::new()
        .delimiter(options.delimiter as u8)
        .from_writer(out))
}

fn amount(money: Money) -> String {
    money.format_plain()
}

fn number(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

/// Export articles with their prices, stock and stock value
pub fn export_articles_csv<W: Write>(
    storage: &Storage,
    out: W,
    options: &CsvSettings,
) -> MaterielResult<()> {
    let mut wtr = writer(out, options)?;
    wtr.write_record([
        "ID",
        "Name",
        "Category",
        "Reference",
        "Purchase price HT",
        "Sale price HT",
        "VAT",
        "Sold by",
        "Stock",
        "Stock value HT",
        "Archived",
    ])
    .map_err(export_err)?;

    let mut articles = storage.articles.get_all()?;
    articles.sort_by_key(|a| a.name.to_lowercase());

    for article in articles {
        wtr.write_record([
            article.id.to_string(),
            article.name.clone(),
            article.category.clone(),
            article.reference.clone().unwrap_or_default(),
            amount(article.purchase_price),
            amount(article.sale_price),
            number(article.vat_rate.percent()),
            article.sold_by.suffix().to_string(),
            number(article.stock),
            amount(article.stock_value()),
            article.archived.to_string(),
        ])
        .map_err(export_err)?;
    }

    wtr.flush().map_err(export_err)?;
    Ok(())
}

/// Export purchases and sales, one row per transaction
pub fn export_transactions_csv<W: Write>(
    storage: &Storage,
    out: W,
    options: &CsvSettings,
) -> MaterielResult<()> {
    let service = CommerceService::new(storage);
    let persons: HashMap<_, _> = storage
        .persons
        .get_all()?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut wtr = writer(out, options)?;
    wtr.write_record([
        "ID",
        "Date",
        "Kind",
        "Counterparty",
        "Lines",
        "Gross TTC",
        "Discount",
        "Net HT",
        "VAT",
        "Net TTC",
        "Paid",
        "Due date",
    ])
    .map_err(export_err)?;

    let mut transactions = service.list(&TransactionFilter::new())?;
    transactions.reverse();

    for txn in transactions {
        let totals = service.totals(&txn);
        let counterparty = if txn.counterparty.is_empty() {
            txn.person_id
                .and_then(|id| persons.get(&id).cloned())
                .unwrap_or_default()
        } else {
            txn.counterparty.clone()
        };

        wtr.write_record([
            txn.id.to_string(),
            txn.date.to_string(),
            txn.kind.to_string(),
            counterparty,
            txn.lines.len().to_string(),
            amount(totals.gross_incl_tax),
            amount(totals.discount),
            amount(totals.net_excl_tax),
            amount(totals.net_tax),
            amount(totals.net_incl_tax),
            txn.payment.is_paid().to_string(),
            txn.payment
                .due_date()
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ])
        .map_err(export_err)?;
    }

    wtr.flush().map_err(export_err)?;
    Ok(())
}

/// Export materials with their current status
pub fn export_materials_csv<W: Write>(
    storage: &Storage,
    out: W,
    options: &CsvSettings,
) -> MaterielResult<()> {
    let mut wtr = writer(out, options)?;
    wtr.write_record([
        "ID",
        "Name",
        "Category",
        "Brand",
        "Serial number",
        "Purchase date",
        "Purchase price",
        "Status",
    ])
    .map_err(export_err)?;

    for entry in MaterialService::new(storage).list(None)? {
        let m = entry.material;
        wtr.write_record([
            m.id.to_string(),
            m.name,
            m.category,
            m.brand.unwrap_or_default(),
            m.serial_number.unwrap_or_default(),
            m.purchase_date.map(|d| d.to_string()).unwrap_or_default(),
            m.purchase_price.map(amount).unwrap_or_default(),
            entry.status.to_string(),
        ])
        .map_err(export_err)?;
    }

    wtr.flush().map_err(export_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::models::{
        Article, Discount, Material, Quantity, SoldBy, Transaction, TransactionKind,
        TransactionLine, VatRate,
    };
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_articles_csv_format() {
        let (_temp_dir, storage) = create_test_storage();
        let mut article = Article::new(
            "Sable; fin",
            Money::from_cents(35),
            Money::from_cents(80),
            VatRate::Reduced,
            SoldBy::Weight,
        );
        article.stock = Decimal::new(125, 1);
        storage.articles.upsert(article).unwrap();

        let mut output = Vec::new();
        export_articles_csv(&storage, &mut output, &CsvSettings::default()).unwrap();

        assert!(output.starts_with(UTF8_BOM));
        let text = String::from_utf8(output[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with("ID;Name;Category"));
        assert!(text.contains("\"Sable; fin\""));
        assert!(text.contains(";0,35;0,80;5,5;kg;12,5;4,38;false"));
    }

    #[test]
    fn test_transactions_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let line = TransactionLine::new(
            "Location échafaudage",
            Money::from_cents(1000),
            Quantity::Units(Decimal::from(3)),
            VatRate::Standard,
        );
        let mut txn = Transaction::new(
            TransactionKind::Sale,
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            vec![line],
        );
        txn.counterparty = "Dupont".into();
        txn.discount = Discount::Percentage(Decimal::from(10));
        storage.transactions.upsert(txn).unwrap();

        let mut output = Vec::new();
        export_transactions_csv(&storage, &mut output, &CsvSettings::default()).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("2025-01-20;Sale;Dupont;1;36,00;3,60;27,00;5,40;32,40;true;"));
    }

    #[test]
    fn test_materials_csv_without_bom() {
        let (_temp_dir, storage) = create_test_storage();
        let mut material = Material::new("Compresseur");
        material.purchase_price = Some(Money::from_cents(24999));
        storage.materials.upsert(material).unwrap();

        let options = CsvSettings {
            delimiter: ',',
            bom: false,
        };
        let mut output = Vec::new();
        export_materials_csv(&storage, &mut output, &options).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("ID,Name"));
        assert!(text.contains("\"249,99\",Available"));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let options = CsvSettings {
            delimiter: '§',
            bom: true,
        };
        let err = export_articles_csv(&storage, Vec::new(), &options).unwrap_err();
        assert!(matches!(err, MaterielError::Config(_)));
    }
}
