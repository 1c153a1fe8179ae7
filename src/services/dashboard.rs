//! Dashboard
//!
//! One aggregate over every module: stock value, commerce totals and
//! margin, overdue payments, and what equipment is out.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::MaterielResult;
use crate::models::{MaterialStatus, Money};
use crate::pricing::{DueStatus, MarginReport};
use crate::storage::Storage;

use super::article::ArticleService;
use super::commerce::{CommerceService, PeriodTotals};
use super::loan::LoanService;
use super::material::MaterialService;
use super::rental::RentalService;
use super::repair::RepairService;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterialCounts {
    pub total: usize,
    pub available: usize,
    pub loaned: usize,
    pub rented: usize,
    pub in_repair: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,

    /// Stock of active articles valued at purchase price before tax
    pub stock_value: Money,
    pub sales: PeriodTotals,
    pub purchases: PeriodTotals,
    pub margin: MarginReport,
    pub rental_revenue: Money,
    pub repair_costs: Money,

    /// Unpaid sales and purchases
    pub unpaid_transactions: usize,
    pub overdue_transactions: usize,
    pub overdue_amount: Money,
    pub unpaid_rentals: usize,

    pub materials: MaterialCounts,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub active_rentals: usize,
    pub late_rentals: usize,
    pub active_repairs: usize,

    pub documents: usize,
}

pub struct DashboardService<'a> {
    storage: &'a Storage,
}

impl<'a> DashboardService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Build the dashboard as of `today`, commerce figures limited to the
    /// optional period
    pub fn summary(
        &self,
        today: NaiveDate,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> MaterielResult<Dashboard> {
        let commerce = CommerceService::new(self.storage);
        let rentals = RentalService::new(self.storage);
        let loans = LoanService::new(self.storage);
        let repairs = RepairService::new(self.storage);

        let summary = commerce.summary(from, to)?;
        let unpaid = commerce.unpaid(None, today)?;
        let overdue: Vec<_> = unpaid
            .iter()
            .filter(|u| u.status == DueStatus::Overdue)
            .collect();

        let mut materials = MaterialCounts::default();
        for entry in MaterialService::new(self.storage).list(None)? {
            materials.total += 1;
            match entry.status {
                MaterialStatus::Available => materials.available += 1,
                MaterialStatus::Loaned => materials.loaned += 1,
                MaterialStatus::Rented => materials.rented += 1,
                MaterialStatus::InRepair => materials.in_repair += 1,
            }
        }

        Ok(Dashboard {
            today,
            from,
            to,
            stock_value: ArticleService::new(self.storage).total_stock_value()?,
            sales: summary.sales,
            purchases: summary.purchases,
            margin: summary.margin,
            rental_revenue: rentals.revenue(from, to)?,
            repair_costs: repairs.total_cost(from, to)?,
            unpaid_transactions: unpaid.len(),
            overdue_transactions: overdue.len(),
            overdue_amount: overdue.iter().map(|u| u.amount_due).sum(),
            unpaid_rentals: rentals.unpaid(today)?.len(),
            materials,
            active_loans: loans.list(true)?.len(),
            overdue_loans: loans.overdue(today)?.len(),
            active_rentals: rentals.list(true)?.len(),
            late_rentals: rentals.late(today)?.len(),
            active_repairs: repairs.list(true)?.len(),
            documents: self.storage.vault_items.count()?,
        })
    }
}

impl Dashboard {
    /// Format the dashboard for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Dashboard ({})\n", self.today.format("%d/%m/%Y")));
        output.push_str(&"=".repeat(50));
        output.push('\n');

        let period = match (self.from, self.to) {
            (None, None) => "all time".to_string(),
            (from, to) => format!(
                "{} to {}",
                from.map_or("start".into(), |d| d.format("%d/%m/%Y").to_string()),
                to.map_or("today".into(), |d| d.format("%d/%m/%Y").to_string())
            ),
        };
        output.push_str(&format!("Commerce, {}\n", period));
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!(
            "Sales ({:>3}) HT:       {:>18}\n",
            self.sales.count, self.sales.net_excl_tax
        ));
        output.push_str(&format!(
            "Purchases ({:>3}) HT:   {:>18}\n",
            self.purchases.count, self.purchases.net_excl_tax
        ));
        output.push_str(&format!("Margin:                {:>18}", self.margin.margin));
        if let Some(pct) = self.margin.margin_percent {
            output.push_str(&format!(" ({} %)", pct.to_string().replace('.', ",")));
        }
        output.push('\n');
        output.push_str(&format!("Rental revenue TTC:    {:>18}\n", self.rental_revenue));
        output.push_str(&format!("Repair costs TTC:      {:>18}\n", self.repair_costs));
        output.push_str(&format!("Stock value HT:        {:>18}\n", self.stock_value));
        output.push('\n');

        output.push_str("Payments\n");
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!("Unpaid transactions:   {:>18}\n", self.unpaid_transactions));
        output.push_str(&format!(
            "Overdue:               {:>18}\n",
            format!("{} ({})", self.overdue_transactions, self.overdue_amount)
        ));
        output.push_str(&format!("Unpaid rentals:        {:>18}\n", self.unpaid_rentals));
        output.push('\n');

        output.push_str("Equipment\n");
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!(
            "Materials:             {:>18}\n",
            format!(
                "{} ({} available)",
                self.materials.total, self.materials.available
            )
        ));
        output.push_str(&format!(
            "Loans:                 {:>18}\n",
            format!("{} ({} overdue)", self.active_loans, self.overdue_loans)
        ));
        output.push_str(&format!(
            "Rentals:               {:>18}\n",
            format!("{} ({} late)", self.active_rentals, self.late_rentals)
        ));
        output.push_str(&format!("Repairs:               {:>18}\n", self.active_repairs));
        output.push_str(&format!("Vault documents:       {:>18}\n", self.documents));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::models::{
        Article, Loan, Material, PaymentStatus, Person, Quantity, SoldBy, Transaction,
        TransactionKind, TransactionLine, VatRate,
    };
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_empty_dashboard() {
        let (_temp_dir, storage) = create_test_storage();
        let dashboard = DashboardService::new(&storage)
            .summary(date(1), None, None)
            .unwrap();

        assert!(dashboard.stock_value.is_zero());
        assert_eq!(dashboard.materials.total, 0);
        assert_eq!(dashboard.margin.margin_percent, None);
        assert!(dashboard.format_terminal().contains("all time"));
    }

    #[test]
    fn test_dashboard_aggregates() {
        let (_temp_dir, storage) = create_test_storage();

        let article = ArticleService::new(&storage)
            .create(Article::new(
                "Vis",
                Money::from_cents(100),
                Money::from_cents(250),
                VatRate::Standard,
                SoldBy::Unit,
            ))
            .unwrap();
        ArticleService::new(&storage)
            .set_stock(article.id, Decimal::from(10))
            .unwrap();

        let mut line = TransactionLine::new(
            "Vis",
            Money::from_cents(250),
            Quantity::Units(Decimal::from(4)),
            VatRate::Standard,
        );
        line.article_id = Some(article.id);
        let mut sale = Transaction::new(TransactionKind::Sale, date(2), vec![line]);
        sale.payment = PaymentStatus::unpaid(Some(date(5)));
        CommerceService::new(&storage).record(sale).unwrap();

        let drill = MaterialService::new(&storage)
            .create(Material::new("Perceuse"))
            .unwrap();
        MaterialService::new(&storage)
            .create(Material::new("Ponceuse"))
            .unwrap();
        let person = Person::new("Ana");
        storage.persons.upsert(person.clone()).unwrap();
        let mut loan = Loan::new(drill.id, person.id, date(1));
        loan.expected_return = Some(date(3));
        storage.loans.upsert(loan).unwrap();

        let dashboard = DashboardService::new(&storage)
            .summary(date(10), None, None)
            .unwrap();

        assert_eq!(dashboard.stock_value.cents(), 600);
        assert_eq!(dashboard.sales.count, 1);
        assert_eq!(dashboard.sales.net_excl_tax.cents(), 1000);
        assert_eq!(dashboard.margin.margin.cents(), 600);
        assert_eq!(dashboard.unpaid_transactions, 1);
        assert_eq!(dashboard.overdue_transactions, 1);
        assert_eq!(dashboard.overdue_amount.cents(), 1200);
        assert_eq!(dashboard.materials.total, 2);
        assert_eq!(dashboard.materials.loaned, 1);
        assert_eq!(dashboard.overdue_loans, 1);
    }
}
