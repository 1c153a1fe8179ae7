//! Purchase and sale CLI commands

use clap::Subcommand;

use super::input::{
    parse_date, parse_decimal, parse_discount, parse_money, parse_opt_date, parse_vat, today,
};
use crate::config::settings::Settings;
use crate::display::{
    format_transaction_details, format_transaction_list, format_unpaid_list, DisplayContext,
};
use crate::error::{MaterielError, MaterielResult};
use crate::models::{
    Discount, PaymentStatus, Quantity, SoldBy, Transaction, TransactionKind, TransactionLine,
};
use crate::services::{CommerceService, PeriodTotals, TransactionFilter};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a sale
    Sale {
        #[command(flatten)]
        entry: TransactionEntry,
    },
    /// Record a purchase
    Purchase {
        #[command(flatten)]
        entry: TransactionEntry,
    },
    /// List transactions
    List {
        /// Filter by kind (sale, purchase)
        #[arg(short, long)]
        kind: Option<String>,
        /// Start date
        #[arg(long)]
        from: Option<String>,
        /// End date
        #[arg(long)]
        to: Option<String>,
        /// Only unpaid transactions
        #[arg(short, long)]
        unpaid: bool,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show transaction details
    Show {
        /// Transaction ID
        id: String,
    },
    /// Mark a transaction as paid
    Pay {
        /// Transaction ID
        id: String,
        /// Payment date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Mark a transaction as unpaid with an optional due date
    Due {
        /// Transaction ID
        id: String,
        /// Due date
        date: Option<String>,
    },
    /// Unpaid transactions, most urgent first
    Unpaid {
        /// Filter by kind (sale, purchase)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Unpaid transactions past their due date
    Overdue,
    /// Delete a transaction and restore the stock it moved
    Delete {
        /// Transaction ID
        id: String,
    },
    /// Sales, purchases and margin over a period
    Summary {
        /// Start date
        #[arg(long)]
        from: Option<String>,
        /// End date
        #[arg(long)]
        to: Option<String>,
    },
}

/// Fields shared by sales and purchases
#[derive(clap::Args)]
pub struct TransactionEntry {
    /// Article line: "ARTICLE:QTY" or "ARTICLE:QTY@PRICE" (price HT)
    #[arg(short, long = "line", required_unless_present = "free")]
    lines: Vec<String>,
    /// Free line not linked to an article: "LABEL:QTY@PRICE[:VAT]"
    #[arg(long)]
    free: Vec<String>,
    /// Known person (name or ID)
    #[arg(short, long)]
    person: Option<String>,
    /// Customer or supplier name when not a known person
    #[arg(short, long)]
    counterparty: Option<String>,
    /// Transaction date, defaults to today
    #[arg(short, long)]
    date: Option<String>,
    /// Discount on the whole transaction ("10%" or "5,00")
    #[arg(long)]
    discount: Option<String>,
    /// Leave unpaid, due on this date
    #[arg(long)]
    due: Option<String>,
    /// Leave unpaid with no due date
    #[arg(long)]
    unpaid: bool,
    #[arg(short, long)]
    notes: Option<String>,
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> MaterielResult<()> {
    let service = CommerceService::new(storage);
    let ctx = DisplayContext::load(storage, settings)?;

    match cmd {
        TransactionCommands::Sale { entry } => {
            record(storage, settings, &ctx, TransactionKind::Sale, entry)?;
        }

        TransactionCommands::Purchase { entry } => {
            record(storage, settings, &ctx, TransactionKind::Purchase, entry)?;
        }

        TransactionCommands::List {
            kind,
            from,
            to,
            unpaid,
            limit,
        } => {
            let mut filter = TransactionFilter::new()
                .date_range(parse_opt_date(from.as_deref())?, parse_opt_date(to.as_deref())?)
                .limit(limit);
            if let Some(kind) = kind {
                filter = filter.kind(parse_kind(&kind)?);
            }
            if unpaid {
                filter = filter.unpaid();
            }
            let transactions = service.list(&filter)?;
            println!("{}", format_transaction_list(&transactions, &ctx));
        }

        TransactionCommands::Show { id } => {
            let txn = storage.transactions.resolve(&id)?;
            print!("{}", format_transaction_details(&txn, &ctx));
        }

        TransactionCommands::Pay { id, date } => {
            let txn = storage.transactions.resolve(&id)?;
            let date = parse_opt_date(date.as_deref())?.unwrap_or_else(today);
            let paid = service.mark_paid(txn.id, date)?;
            println!(
                "Marked {} as paid on {} ({})",
                paid.id,
                ctx.date(date),
                service.totals(&paid).net_incl_tax
            );
        }

        TransactionCommands::Due { id, date } => {
            let txn = storage.transactions.resolve(&id)?;
            let due = parse_opt_date(date.as_deref())?;
            let updated = service.set_due_date(txn.id, due)?;
            println!(
                "{} is unpaid, due {}",
                updated.id,
                ctx.opt_date(updated.payment.due_date())
            );
        }

        TransactionCommands::Unpaid { kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let unpaid = service.unpaid(kind, today())?;
            println!("{}", format_unpaid_list(&unpaid, &ctx));
        }

        TransactionCommands::Overdue => {
            let overdue = service.overdue(today())?;
            println!("{}", format_unpaid_list(&overdue, &ctx));
        }

        TransactionCommands::Delete { id } => {
            let txn = storage.transactions.resolve(&id)?;
            let deleted = service.delete(txn.id)?;
            println!("Deleted {} {} of {}", deleted.kind, deleted.id, ctx.date(deleted.date));
        }

        TransactionCommands::Summary { from, to } => {
            let from = parse_opt_date(from.as_deref())?;
            let to = parse_opt_date(to.as_deref())?;
            let summary = service.summary(from, to)?;

            println!("Period: {} - {}", ctx.opt_date(from), ctx.opt_date(to));
            print_totals("Sales", &summary.sales);
            print_totals("Purchases", &summary.purchases);
            println!();
            println!("Margin:     {}", summary.margin.margin);
            if let Some(percent) = summary.margin.margin_percent {
                println!("Margin %:   {} %", percent.to_string().replace('.', ","));
            }
        }
    }

    Ok(())
}

fn print_totals(label: &str, totals: &PeriodTotals) {
    println!("{} ({}):", label, totals.count);
    println!("  HT:       {}", totals.net_excl_tax);
    println!("  VAT:      {}", totals.net_tax);
    println!("  TTC:      {}", totals.net_incl_tax);
    if !totals.discount.is_zero() {
        println!("  Discount: {}", totals.discount);
    }
}

fn parse_kind(s: &str) -> MaterielResult<TransactionKind> {
    TransactionKind::parse(s).ok_or_else(|| {
        MaterielError::Validation(format!("Invalid kind: '{}'. Use 'sale' or 'purchase'", s))
    })
}

fn record(
    storage: &Storage,
    settings: &Settings,
    ctx: &DisplayContext,
    kind: TransactionKind,
    entry: TransactionEntry,
) -> MaterielResult<()> {
    let mut lines = Vec::new();
    for raw in &entry.lines {
        lines.push(article_line(storage, kind, raw)?);
    }
    for raw in &entry.free {
        lines.push(free_line(settings, raw)?);
    }

    let date = parse_opt_date(entry.date.as_deref())?.unwrap_or_else(today);
    let mut txn = Transaction::new(kind, date, lines);

    if let Some(person) = entry.person {
        txn.person_id = Some(storage.persons.resolve(&person)?.id);
    }
    txn.counterparty = entry.counterparty.unwrap_or_default();
    txn.discount = match entry.discount {
        Some(d) => parse_discount(&d)?,
        None => Discount::None,
    };
    txn.notes = entry.notes.unwrap_or_default();

    let due = entry.due.as_deref().map(parse_date).transpose()?;
    if due.is_some() || entry.unpaid {
        txn.payment = PaymentStatus::unpaid(due);
    }

    let txn = CommerceService::new(storage).record(txn)?;
    let totals = CommerceService::new(storage).totals(&txn);

    println!("Recorded {}: {}", txn.kind.to_string().to_lowercase(), txn.id);
    println!("  Date: {}", ctx.date(txn.date));
    println!("  HT:   {}", totals.net_excl_tax);
    println!("  VAT:  {}", totals.net_tax);
    println!("  TTC:  {}", totals.net_incl_tax);
    if !txn.payment.is_paid() {
        println!("  Unpaid, due {}", ctx.opt_date(txn.payment.due_date()));
    }
    Ok(())
}

/// Parse "ARTICLE:QTY" or "ARTICLE:QTY@PRICE"
///
/// Without an explicit price the article's sale price is used for a sale and
/// its purchase price for a purchase.
fn article_line(
    storage: &Storage,
    kind: TransactionKind,
    raw: &str,
) -> MaterielResult<TransactionLine> {
    let (name, rest) = raw.rsplit_once(':').ok_or_else(|| invalid_line(raw))?;
    let (qty, price) = match rest.split_once('@') {
        Some((qty, price)) => (qty, Some(parse_money(price)?)),
        None => (rest, None),
    };

    let article = storage.articles.resolve(name.trim())?;
    let quantity = Quantity::parse(article.sold_by, qty).ok_or_else(|| invalid_line(raw))?;
    let unit_price = price.unwrap_or(match kind {
        TransactionKind::Sale => article.sale_price,
        TransactionKind::Purchase => article.purchase_price,
    });

    let mut line = TransactionLine::new(article.name.clone(), unit_price, quantity, article.vat_rate);
    line.article_id = Some(article.id);
    Ok(line)
}

/// Parse "LABEL:QTY@PRICE" or "LABEL:QTY@PRICE:VAT"
fn free_line(settings: &Settings, raw: &str) -> MaterielResult<TransactionLine> {
    let mut parts = raw.splitn(3, ':');
    let label = parts.next().unwrap_or_default().trim();
    let priced = parts.next().ok_or_else(|| invalid_line(raw))?;
    let vat = match parts.next() {
        Some(v) => parse_vat(v)?,
        None => settings.default_vat_rate,
    };

    let (qty, price) = priced.split_once('@').ok_or_else(|| invalid_line(raw))?;
    // A whole number is a unit count, anything else a weight
    let amount = parse_decimal(qty)?;
    let sold_by = if amount.fract().is_zero() {
        SoldBy::Unit
    } else {
        SoldBy::Weight
    };
    let quantity = Quantity::new(sold_by, amount);

    Ok(TransactionLine::new(label, parse_money(price)?, quantity, vat))
}

fn invalid_line(raw: &str) -> MaterielError {
    MaterielError::Validation(format!(
        "Invalid line: '{}'. Use NAME:QTY or NAME:QTY@PRICE",
        raw
    ))
}
