//! Article CLI commands

use clap::Subcommand;

use super::input::{clearable, parse_date, parse_decimal, parse_money, parse_opt_date, parse_vat};
use crate::config::settings::Settings;
use crate::display::{format_article_details, format_article_list, format_margin_list};
use crate::error::{MaterielError, MaterielResult};
use crate::models::{Article, SoldBy};
use crate::pricing::price_excl_tax;
use crate::services::{ArticleService, ArticleUpdate, CommerceService};
use crate::storage::Storage;

/// Article subcommands
#[derive(Subcommand)]
pub enum ArticleCommands {
    /// Create a new article
    Create {
        /// Article name
        name: String,
        /// Purchase price per unit or per kg (e.g. "12,50")
        #[arg(short, long)]
        purchase: String,
        /// Sale price per unit or per kg
        #[arg(short, long)]
        sale: String,
        /// VAT rate (0, 2.1, 5.5, 10, 20); defaults to the configured rate
        #[arg(long)]
        vat: Option<String>,
        /// Sold by unit or by weight (unit, kg)
        #[arg(short = 'b', long, default_value = "unit")]
        by: String,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Supplier or internal reference
        #[arg(short, long)]
        reference: Option<String>,
        /// Initial stock
        #[arg(long)]
        stock: Option<String>,
        /// Prices are entered tax included
        #[arg(long)]
        ttc: bool,
    },
    /// List articles
    List {
        /// Include archived articles
        #[arg(short, long)]
        all: bool,
    },
    /// Show article details
    Show {
        /// Article name or ID
        article: String,
    },
    /// Edit an article
    Edit {
        /// Article name or ID
        article: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// New reference (empty to clear)
        #[arg(short, long)]
        reference: Option<String>,
        #[arg(short, long)]
        purchase: Option<String>,
        #[arg(short, long)]
        sale: Option<String>,
        #[arg(long)]
        vat: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Add to (or, negative, remove from) the stock
    Stock {
        /// Article name or ID
        article: String,
        /// Quantity to add, e.g. "5" or "-2,5"
        #[arg(allow_hyphen_values = true)]
        delta: String,
    },
    /// Set the stock after an inventory count
    Count {
        /// Article name or ID
        article: String,
        /// Counted quantity
        quantity: String,
    },
    /// Archive an article
    Archive {
        article: String,
    },
    /// Unarchive an article
    Unarchive {
        article: String,
    },
    /// Delete an article that no transaction references
    Delete {
        article: String,
    },
    /// Margin per article sold
    Margins {
        /// Start date
        #[arg(long)]
        from: Option<String>,
        /// End date
        #[arg(long)]
        to: Option<String>,
    },
}

/// Handle an article command
pub fn handle_article_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ArticleCommands,
) -> MaterielResult<()> {
    let service = ArticleService::new(storage);

    match cmd {
        ArticleCommands::Create {
            name,
            purchase,
            sale,
            vat,
            by,
            category,
            reference,
            stock,
            ttc,
        } => {
            let vat_rate = match vat {
                Some(v) => parse_vat(&v)?,
                None => settings.default_vat_rate,
            };
            let sold_by = SoldBy::parse(&by).ok_or_else(|| {
                MaterielError::Validation(format!(
                    "Invalid sale mode: '{}'. Use 'unit' or 'kg'",
                    by
                ))
            })?;

            let mut purchase_price = parse_money(&purchase)?;
            let mut sale_price = parse_money(&sale)?;
            if ttc {
                purchase_price = price_excl_tax(purchase_price, vat_rate);
                sale_price = price_excl_tax(sale_price, vat_rate);
            }

            let mut article = Article::new(name, purchase_price, sale_price, vat_rate, sold_by);
            article.category = category.unwrap_or_default();
            article.reference = reference;
            if let Some(stock) = stock {
                article.stock = parse_decimal(&stock)?;
            }

            let article = service.create(article)?;
            println!("Created article: {}", article.name);
            println!("  Sale price: {} HT ({})", article.sale_price, article.vat_rate);
            println!("  ID: {}", article.id);
        }

        ArticleCommands::List { all } => {
            let articles = service.list(all)?;
            println!("{}", format_article_list(&articles));
            if !articles.is_empty() {
                println!("Stock value HT: {}", service.total_stock_value()?);
            }
        }

        ArticleCommands::Show { article } => {
            let found = storage.articles.resolve(&article)?;
            print!("{}", format_article_details(&found));
        }

        ArticleCommands::Edit {
            article,
            name,
            category,
            reference,
            purchase,
            sale,
            vat,
            notes,
        } => {
            let found = storage.articles.resolve(&article)?;
            let changes = ArticleUpdate {
                name,
                category,
                reference: clearable(reference),
                purchase_price: purchase.as_deref().map(parse_money).transpose()?,
                sale_price: sale.as_deref().map(parse_money).transpose()?,
                vat_rate: vat.as_deref().map(parse_vat).transpose()?,
                sold_by: None,
                notes,
            };
            let updated = service.update(found.id, changes)?;
            println!("Updated article: {}", updated.name);
        }

        ArticleCommands::Stock { article, delta } => {
            let found = storage.articles.resolve(&article)?;
            let updated = service.adjust_stock(found.id, parse_decimal(&delta)?)?;
            println!("Stock of {}: {}", updated.name, updated.stock.normalize());
        }

        ArticleCommands::Count { article, quantity } => {
            let found = storage.articles.resolve(&article)?;
            let updated = service.set_stock(found.id, parse_decimal(&quantity)?)?;
            println!("Stock of {}: {}", updated.name, updated.stock.normalize());
        }

        ArticleCommands::Archive { article } => {
            let found = storage.articles.resolve(&article)?;
            let archived = service.archive(found.id)?;
            println!("Archived article: {}", archived.name);
        }

        ArticleCommands::Unarchive { article } => {
            let found = storage.articles.resolve(&article)?;
            let unarchived = service.unarchive(found.id)?;
            println!("Unarchived article: {}", unarchived.name);
        }

        ArticleCommands::Delete { article } => {
            let found = storage.articles.resolve(&article)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted article: {}", deleted.name);
        }

        ArticleCommands::Margins { from, to } => {
            let from = parse_opt_date(from.as_deref())?;
            let to = to.as_deref().map(parse_date).transpose()?;
            let margins = CommerceService::new(storage).article_margins(from, to)?;
            println!("{}", format_margin_list(&margins));
        }
    }

    Ok(())
}
