//! Article and transaction display formatting

use rust_decimal::Decimal;
use tabled::Tabled;

use super::report::{truncate, yes_no};
use super::{render_table, DisplayContext};
use crate::models::{Article, Money, Quantity, SoldBy, Transaction};
use crate::pricing::{price_incl_tax, transaction_totals};
use crate::services::{ArticleMargin, UnpaidTransaction};

fn quantity(q: &Quantity) -> String {
    let amount = q.amount().normalize().to_string().replace('.', ",");
    match q {
        Quantity::Units(_) => amount,
        Quantity::Weight(_) => format!("{} kg", amount),
    }
}

fn percent(p: Option<Decimal>) -> String {
    p.map(|p| format!("{} %", p.to_string().replace('.', ",")))
        .unwrap_or_else(|| "-".into())
}

#[derive(Tabled)]
struct ArticleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Purchase HT")]
    purchase: String,
    #[tabled(rename = "Sale HT")]
    sale: String,
    #[tabled(rename = "Sale TTC")]
    sale_ttc: String,
    #[tabled(rename = "VAT")]
    vat: String,
    #[tabled(rename = "Stock")]
    stock: String,
}

/// Format a list of articles as a table
pub fn format_article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.".to_string();
    }

    let rows = articles
        .iter()
        .map(|a| ArticleRow {
            id: a.id.to_string(),
            name: if a.archived {
                format!("{} (archived)", truncate(&a.name, 30))
            } else {
                truncate(&a.name, 30)
            },
            category: a.category.clone(),
            purchase: a.purchase_price.to_string(),
            sale: a.sale_price.to_string(),
            sale_ttc: price_incl_tax(a.sale_price, a.vat_rate).to_string(),
            vat: a.vat_rate.to_string(),
            stock: quantity(&Quantity::new(a.sold_by, a.stock)),
        })
        .collect();

    render_table(rows, 3..8)
}

/// Format a single article's details
pub fn format_article_details(article: &Article) -> String {
    let per = match article.sold_by {
        SoldBy::Unit => "",
        SoldBy::Weight => " /kg",
    };

    let mut output = String::new();
    output.push_str(&format!("Article: {}\n", article.name));
    output.push_str(&format!("  ID:             {}\n", article.id));
    if !article.category.is_empty() {
        output.push_str(&format!("  Category:       {}\n", article.category));
    }
    if let Some(reference) = &article.reference {
        output.push_str(&format!("  Reference:      {}\n", reference));
    }
    output.push_str(&format!("  VAT:            {}\n", article.vat_rate));
    output.push('\n');
    output.push_str(&format!(
        "  Purchase price: {}{} HT  ({} TTC)\n",
        article.purchase_price,
        per,
        price_incl_tax(article.purchase_price, article.vat_rate)
    ));
    output.push_str(&format!(
        "  Sale price:     {}{} HT  ({} TTC)\n",
        article.sale_price,
        per,
        price_incl_tax(article.sale_price, article.vat_rate)
    ));
    output.push_str(&format!(
        "  Stock:          {}\n",
        quantity(&Quantity::new(article.sold_by, article.stock))
    ));
    output.push_str(&format!("  Stock value HT: {}\n", article.stock_value()));
    output.push_str(&format!("  Archived:       {}\n", yes_no(article.archived)));
    if !article.notes.is_empty() {
        output.push_str(&format!("\n  Notes: {}\n", article.notes));
    }
    output
}

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Counterparty")]
    counterparty: String,
    #[tabled(rename = "Net HT")]
    net_excl: String,
    #[tabled(rename = "Net TTC")]
    net_incl: String,
    #[tabled(rename = "Payment")]
    payment: String,
}

/// Format transactions as a table
pub fn format_transaction_list(transactions: &[Transaction], ctx: &DisplayContext) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let rows = transactions
        .iter()
        .map(|t| {
            let totals = transaction_totals(&t.lines, &t.discount);
            let counterparty = match (t.counterparty.is_empty(), t.person_id) {
                (true, Some(id)) => ctx.person(id),
                _ => t.counterparty.clone(),
            };
            TransactionRow {
                id: t.id.to_string(),
                date: ctx.date(t.date),
                kind: t.kind.to_string(),
                counterparty: truncate(&counterparty, 24),
                net_excl: totals.net_excl_tax.to_string(),
                net_incl: totals.net_incl_tax.to_string(),
                payment: t.payment.to_string(),
            }
        })
        .collect();

    render_table(rows, 4..6)
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Unit HT")]
    unit: String,
    #[tabled(rename = "VAT")]
    vat: String,
    #[tabled(rename = "Total HT")]
    total_excl: String,
    #[tabled(rename = "Total TTC")]
    total_incl: String,
}

/// Format a transaction with its priced lines and totals
pub fn format_transaction_details(txn: &Transaction, ctx: &DisplayContext) -> String {
    let totals = transaction_totals(&txn.lines, &txn.discount);

    let mut output = String::new();
    output.push_str(&format!("{}: {}\n", txn.kind, txn.id));
    output.push_str(&format!("Date:         {}\n", ctx.date(txn.date)));
    if !txn.counterparty.is_empty() {
        output.push_str(&format!("Counterparty: {}\n", txn.counterparty));
    } else if let Some(id) = txn.person_id {
        output.push_str(&format!("Counterparty: {}\n", ctx.person(id)));
    }
    output.push_str(&format!("Payment:      {}\n", txn.payment));
    output.push('\n');

    let rows: Vec<LineRow> = txn
        .lines
        .iter()
        .zip(&totals.lines)
        .map(|(line, pricing)| LineRow {
            label: truncate(&line.label, 30),
            quantity: quantity(&line.quantity),
            unit: line.unit_price.to_string(),
            vat: line.vat_rate.to_string(),
            total_excl: pricing.gross_excl_tax.to_string(),
            total_incl: pricing.gross_incl_tax.to_string(),
        })
        .collect();
    output.push_str(&render_table(rows, 1..6));
    output.push_str("\n\n");

    output.push_str(&format!("Gross HT:     {:>14}\n", totals.gross_excl_tax.to_string()));
    output.push_str(&format!("VAT:          {:>14}\n", totals.tax.to_string()));
    output.push_str(&format!("Gross TTC:    {:>14}\n", totals.gross_incl_tax.to_string()));
    if !totals.discount.is_zero() {
        output.push_str(&format!(
            "Discount:     {:>14}  ({})\n",
            format!("-{}", totals.discount),
            txn.discount
        ));
        output.push_str(&format!("Net HT:       {:>14}\n", totals.net_excl_tax.to_string()));
        output.push_str(&format!("Net VAT:      {:>14}\n", totals.net_tax.to_string()));
    }
    output.push_str(&format!("Net TTC:      {:>14}\n", totals.net_incl_tax.to_string()));

    if !txn.notes.is_empty() {
        output.push_str(&format!("\nNotes: {}\n", txn.notes));
    }
    output
}

#[derive(Tabled)]
struct UnpaidRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Counterparty")]
    counterparty: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Amount TTC")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Format unpaid transactions, most urgent first
pub fn format_unpaid_list(unpaid: &[UnpaidTransaction], ctx: &DisplayContext) -> String {
    if unpaid.is_empty() {
        return "Nothing unpaid.".to_string();
    }

    let rows = unpaid
        .iter()
        .map(|u| UnpaidRow {
            id: u.transaction.id.to_string(),
            kind: u.transaction.kind.to_string(),
            counterparty: truncate(&u.transaction.counterparty, 24),
            due: ctx.opt_date(u.transaction.payment.due_date()),
            amount: u.amount_due.to_string(),
            status: u.status.to_string(),
        })
        .collect();

    let total: Money = unpaid.iter().map(|u| u.amount_due).sum();
    format!("{}\nTotal: {}", render_table(rows, 4..5), total)
}

#[derive(Tabled)]
struct MarginRow {
    #[tabled(rename = "Article")]
    name: String,
    #[tabled(rename = "Sold")]
    quantity: String,
    #[tabled(rename = "Sales HT")]
    sales: String,
    #[tabled(rename = "Cost HT")]
    cost: String,
    #[tabled(rename = "Margin")]
    margin: String,
    #[tabled(rename = "Margin %")]
    percent: String,
}

/// Format the margin made on each article
pub fn format_margin_list(margins: &[ArticleMargin]) -> String {
    if margins.is_empty() {
        return "No sales in this period.".to_string();
    }

    let rows = margins
        .iter()
        .map(|m| MarginRow {
            name: truncate(&m.name, 30),
            quantity: m.quantity_sold.normalize().to_string().replace('.', ","),
            sales: m.report.sales_excl_tax.to_string(),
            cost: m.report.cost_excl_tax.to_string(),
            margin: m.report.margin.to_string(),
            percent: percent(m.report.margin_percent),
        })
        .collect();

    render_table(rows, 1..6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Discount, TransactionKind, TransactionLine, VatRate};
    use chrono::NaiveDate;

    fn ctx() -> DisplayContext {
        DisplayContext {
            date_format: "%d/%m/%Y".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_article_list() {
        let mut article = Article::new(
            "Câble 2,5 mm²",
            Money::from_cents(60),
            Money::from_cents(120),
            VatRate::Standard,
            SoldBy::Unit,
        );
        article.stock = Decimal::from(40);

        let output = format_article_list(&[article]);
        assert!(output.contains("Câble 2,5 mm²"));
        assert!(output.contains("1,44 €"));
        assert!(output.contains("20 %"));
        assert_eq!(format_article_list(&[]), "No articles found.");
    }

    #[test]
    fn test_transaction_details_with_discount() {
        let line = TransactionLine::new(
            "Ponçage",
            Money::from_cents(1000),
            Quantity::Units(Decimal::from(3)),
            VatRate::Standard,
        );
        let mut txn = Transaction::new(
            TransactionKind::Sale,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            vec![line],
        );
        txn.discount = Discount::Percentage(Decimal::from(10));

        let output = format_transaction_details(&txn, &ctx());
        assert!(output.contains("15/01/2025"));
        assert!(output.contains("36,00 €"));
        assert!(output.contains("-3,60 €"));
        assert!(output.contains("32,40 €"));
        assert!(output.contains("27,00 €"));
    }

    #[test]
    fn test_weight_quantity() {
        assert_eq!(quantity(&Quantity::Weight(Decimal::new(1250, 3))), "1,25 kg");
        assert_eq!(quantity(&Quantity::Units(Decimal::from(2))), "2");
    }
}
