//! Commerce service
//!
//! Records purchases and sales, moves stock accordingly, and answers the
//! accounting questions: totals, margins per article and unpaid invoices.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{
    ArticleId, Money, PaymentStatus, Transaction, TransactionId, TransactionKind,
};
use crate::pricing::{
    classify_payment, gross_excl_tax, transaction_totals, DueStatus, MarginReport,
    TransactionTotals,
};
use crate::storage::Storage;

use super::article::ArticleService;

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub unpaid_only: bool,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn unpaid(mut self) -> Self {
        self.unpaid_only = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind.map_or(true, |k| txn.kind == k)
            && self.from.map_or(true, |from| txn.date >= from)
            && self.to.map_or(true, |to| txn.date <= to)
            && (!self.unpaid_only || !txn.payment.is_paid())
    }
}

/// Summed totals of a group of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub count: usize,
    pub net_excl_tax: Money,
    pub net_tax: Money,
    pub net_incl_tax: Money,
    pub discount: Money,
}

impl PeriodTotals {
    fn add(&mut self, totals: &TransactionTotals) {
        self.count += 1;
        self.net_excl_tax += totals.net_excl_tax;
        self.net_tax += totals.net_tax;
        self.net_incl_tax += totals.net_incl_tax;
        self.discount += totals.discount;
    }
}

/// Sales, purchases and margin over a period
#[derive(Debug, Clone, Serialize)]
pub struct CommerceSummary {
    pub sales: PeriodTotals,
    pub purchases: PeriodTotals,
    /// Margin on what was sold; lines with no article carry no cost
    pub margin: MarginReport,
}

/// Margin made on one article over a period
#[derive(Debug, Clone, Serialize)]
pub struct ArticleMargin {
    pub article_id: ArticleId,
    pub name: String,
    pub quantity_sold: Decimal,
    pub report: MarginReport,
}

/// An unpaid transaction with its amount and due status
#[derive(Debug, Clone, Serialize)]
pub struct UnpaidTransaction {
    pub transaction: Transaction,
    pub amount_due: Money,
    pub status: DueStatus,
}

/// Service for purchases and sales
pub struct CommerceService<'a> {
    storage: &'a Storage,
}

impl<'a> CommerceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a purchase or a sale
    ///
    /// Lines linked to an article move its stock: a purchase adds the line
    /// quantity, a sale removes it. Line quantities must match the way the
    /// article is sold.
    pub fn record(&self, mut txn: Transaction) -> MaterielResult<Transaction> {
        txn.counterparty = txn.counterparty.trim().to_string();
        txn.validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        if let Some(person_id) = txn.person_id {
            let person = self.storage.persons.require(person_id)?;
            if txn.counterparty.is_empty() {
                txn.counterparty = person.name;
            }
        }

        for (index, line) in txn.lines.iter().enumerate() {
            if let Some(article_id) = line.article_id {
                let article = self.storage.articles.require(article_id)?;
                if article.sold_by != line.quantity.sold_by() {
                    return Err(MaterielError::Validation(format!(
                        "Line {}: '{}' is sold by {}",
                        index + 1,
                        article.name,
                        article.sold_by.suffix()
                    )));
                }
            }
        }

        self.move_stock(&txn, false)?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_create(&txn)?;

        tracing::debug!(id = %txn.id, kind = %txn.kind, "recorded transaction");
        Ok(txn)
    }

    fn move_stock(&self, txn: &Transaction, reverse: bool) -> MaterielResult<()> {
        let articles = ArticleService::new(self.storage);
        for line in &txn.lines {
            let Some(article_id) = line.article_id else {
                continue;
            };
            let mut delta = line.quantity.amount();
            if txn.is_sale() != reverse {
                delta = -delta;
            }
            articles.adjust_stock(article_id, delta)?;
        }
        Ok(())
    }

    pub fn get(&self, id: TransactionId) -> MaterielResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Transaction>> {
        self.storage.transactions.find(identifier)
    }

    /// Transactions matching the filter, most recent first
    pub fn list(&self, filter: &TransactionFilter) -> MaterielResult<Vec<Transaction>> {
        let mut txns = self.storage.transactions.filter(|t| filter.matches(t))?;
        txns.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        if let Some(limit) = filter.limit {
            txns.truncate(limit);
        }
        Ok(txns)
    }

    pub fn totals(&self, txn: &Transaction) -> TransactionTotals {
        transaction_totals(&txn.lines, &txn.discount)
    }

    pub fn mark_paid(&self, id: TransactionId, date: NaiveDate) -> MaterielResult<Transaction> {
        let mut txn = self.storage.transactions.require(id)?;
        if txn.payment.is_paid() {
            return Err(MaterielError::Validation(format!(
                "Transaction {} is already paid",
                txn.id
            )));
        }

        let before = txn.clone();
        txn.mark_paid(date);

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_update(&before, &txn)?;

        Ok(txn)
    }

    /// Change the due date of an unpaid transaction
    pub fn set_due_date(
        &self,
        id: TransactionId,
        due_date: Option<NaiveDate>,
    ) -> MaterielResult<Transaction> {
        let mut txn = self.storage.transactions.require(id)?;
        let before = txn.clone();

        txn.payment = PaymentStatus::unpaid(due_date);
        txn.updated_at = Utc::now();
        txn.validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_update(&before, &txn)?;

        Ok(txn)
    }

    /// Delete a transaction and undo its stock movements
    pub fn delete(&self, id: TransactionId) -> MaterielResult<Transaction> {
        let txn = self.storage.transactions.require(id)?;

        let linked_articles_exist = txn
            .lines
            .iter()
            .filter_map(|l| l.article_id)
            .all(|id| self.storage.articles.exists(id).unwrap_or(false));
        if linked_articles_exist {
            self.move_stock(&txn, true)?;
        } else {
            tracing::warn!(id = %txn.id, "article missing, stock not restored");
        }

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;
        self.storage.log_delete(&txn)?;

        Ok(txn)
    }

    /// Unpaid transactions with their due status, most urgent first
    pub fn unpaid(
        &self,
        kind: Option<TransactionKind>,
        today: NaiveDate,
    ) -> MaterielResult<Vec<UnpaidTransaction>> {
        let mut filter = TransactionFilter::new().unpaid();
        filter.kind = kind;

        let mut unpaid: Vec<UnpaidTransaction> = self
            .list(&filter)?
            .into_iter()
            .map(|txn| UnpaidTransaction {
                amount_due: self.totals(&txn).net_incl_tax,
                status: classify_payment(&txn.payment, today),
                transaction: txn,
            })
            .collect();

        unpaid.sort_by(|a, b| {
            a.status.cmp(&b.status).then(
                a.transaction
                    .payment
                    .due_date()
                    .cmp(&b.transaction.payment.due_date()),
            )
        });
        Ok(unpaid)
    }

    /// Unpaid transactions whose due date is past
    pub fn overdue(&self, today: NaiveDate) -> MaterielResult<Vec<UnpaidTransaction>> {
        Ok(self
            .unpaid(None, today)?
            .into_iter()
            .filter(|u| u.status == DueStatus::Overdue)
            .collect())
    }

    /// Sales, purchases and margin between two optional dates (inclusive)
    pub fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> MaterielResult<CommerceSummary> {
        let filter = TransactionFilter::new().date_range(from, to);
        let mut sales = PeriodTotals::default();
        let mut purchases = PeriodTotals::default();

        for txn in self.list(&filter)? {
            let totals = self.totals(&txn);
            match txn.kind {
                TransactionKind::Sale => sales.add(&totals),
                TransactionKind::Purchase => purchases.add(&totals),
            }
        }

        let cost: Money = self
            .article_margins(from, to)?
            .iter()
            .map(|m| m.report.cost_excl_tax)
            .sum();

        Ok(CommerceSummary {
            sales,
            purchases,
            margin: MarginReport::new(sales.net_excl_tax, cost),
        })
    }

    /// Margin per article sold, best margin first
    ///
    /// Sales are taken net of discount and before tax; cost is the quantity
    /// sold at the article's current purchase price.
    pub fn article_margins(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> MaterielResult<Vec<ArticleMargin>> {
        let filter = TransactionFilter::new()
            .kind(TransactionKind::Sale)
            .date_range(from, to);

        let mut per_article: HashMap<ArticleId, (Decimal, Money)> = HashMap::new();
        for txn in self.list(&filter)? {
            let totals = self.totals(&txn);
            for (line, pricing) in txn.lines.iter().zip(&totals.lines) {
                if let Some(article_id) = line.article_id {
                    let entry = per_article
                        .entry(article_id)
                        .or_insert((Decimal::ZERO, Money::zero()));
                    entry.0 += line.quantity.amount();
                    entry.1 += pricing.net_excl_tax;
                }
            }
        }

        let mut margins = Vec::with_capacity(per_article.len());
        for (article_id, (quantity, sales)) in per_article {
            let Some(article) = self.storage.articles.get(article_id)? else {
                continue;
            };
            let cost = gross_excl_tax(article.purchase_price, quantity);
            margins.push(ArticleMargin {
                article_id,
                name: article.name,
                quantity_sold: quantity,
                report: MarginReport::new(sales, cost),
            });
        }

        margins.sort_by(|a, b| b.report.margin.cmp(&a.report.margin).then(a.name.cmp(&b.name)));
        Ok(margins)
    }
}
