//! Article service
//!
//! Catalogue management: creation, updates, archiving and stock movements.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Article, ArticleId, Money, SoldBy, VatRate};
use crate::storage::Storage;

/// Fields to change on an article; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub reference: Option<Option<String>>,
    pub purchase_price: Option<Money>,
    pub sale_price: Option<Money>,
    pub vat_rate: Option<VatRate>,
    pub sold_by: Option<SoldBy>,
    pub notes: Option<String>,
}

/// Service for article management
pub struct ArticleService<'a> {
    storage: &'a Storage,
}

impl<'a> ArticleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Add an article to the catalogue
    pub fn create(&self, mut article: Article) -> MaterielResult<Article> {
        article.name = article.name.trim().to_string();

        if self.storage.articles.name_exists(&article.name, None)? {
            return Err(MaterielError::Duplicate {
                entity_type: "Article",
                identifier: article.name,
            });
        }

        article
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.articles.upsert(article.clone())?;
        self.storage.articles.save()?;
        self.storage.log_create(&article)?;

        Ok(article)
    }

    pub fn get(&self, id: ArticleId) -> MaterielResult<Option<Article>> {
        self.storage.articles.get(id)
    }

    /// Find an article by name or ID
    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Article>> {
        self.storage.articles.find(identifier)
    }

    /// Articles sorted by name
    pub fn list(&self, include_archived: bool) -> MaterielResult<Vec<Article>> {
        let mut articles = self
            .storage
            .articles
            .filter(|a| include_archived || !a.archived)?;
        articles.sort_by_key(|a| a.name.to_lowercase());
        Ok(articles)
    }

    pub fn update(&self, id: ArticleId, changes: ArticleUpdate) -> MaterielResult<Article> {
        let mut article = self.storage.articles.require(id)?;
        let before = article.clone();

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if self.storage.articles.name_exists(&name, Some(id))? {
                return Err(MaterielError::Duplicate {
                    entity_type: "Article",
                    identifier: name,
                });
            }
            article.name = name;
        }
        if let Some(category) = changes.category {
            article.category = category.trim().to_string();
        }
        if let Some(reference) = changes.reference {
            article.reference = reference;
        }
        if let Some(price) = changes.purchase_price {
            article.purchase_price = price;
        }
        if let Some(price) = changes.sale_price {
            article.sale_price = price;
        }
        if let Some(rate) = changes.vat_rate {
            article.vat_rate = rate;
        }
        if let Some(sold_by) = changes.sold_by {
            article.sold_by = sold_by;
        }
        if let Some(notes) = changes.notes {
            article.notes = notes;
        }

        article.updated_at = Utc::now();
        article
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.articles.upsert(article.clone())?;
        self.storage.articles.save()?;
        self.storage.log_update(&before, &article)?;

        Ok(article)
    }

    /// Move stock in (positive delta) or out (negative delta)
    ///
    /// Stock may go below zero when more is sold than was recorded as
    /// bought; a warning is logged.
    pub fn adjust_stock(&self, id: ArticleId, delta: Decimal) -> MaterielResult<Article> {
        let mut article = self.storage.articles.require(id)?;
        let before = article.clone();

        article.stock += delta;
        article.updated_at = Utc::now();
        article
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        if article.stock < Decimal::ZERO {
            tracing::warn!(article = %article.name, stock = %article.stock, "stock below zero");
        }

        self.storage.articles.upsert(article.clone())?;
        self.storage.articles.save()?;
        self.storage.log_update(&before, &article)?;

        Ok(article)
    }

    /// Set the stock to a counted quantity (inventory)
    pub fn set_stock(&self, id: ArticleId, stock: Decimal) -> MaterielResult<Article> {
        let current = self.storage.articles.require(id)?;
        self.adjust_stock(id, stock - current.stock)
    }

    pub fn archive(&self, id: ArticleId) -> MaterielResult<Article> {
        self.set_archived(id, true)
    }

    pub fn unarchive(&self, id: ArticleId) -> MaterielResult<Article> {
        self.set_archived(id, false)
    }

    fn set_archived(&self, id: ArticleId, archived: bool) -> MaterielResult<Article> {
        let mut article = self.storage.articles.require(id)?;
        if article.archived == archived {
            return Err(MaterielError::Validation(format!(
                "Article '{}' is already {}",
                article.name,
                if archived { "archived" } else { "active" }
            )));
        }

        let before = article.clone();
        article.archived = archived;
        article.updated_at = Utc::now();

        self.storage.articles.upsert(article.clone())?;
        self.storage.articles.save()?;
        self.storage.log_update(&before, &article)?;

        Ok(article)
    }

    /// Delete an article that no transaction refers to
    pub fn delete(&self, id: ArticleId) -> MaterielResult<Article> {
        let article = self.storage.articles.require(id)?;

        let used = self
            .storage
            .transactions
            .filter(|t| t.lines.iter().any(|l| l.article_id == Some(id)))?;
        if !used.is_empty() {
            return Err(MaterielError::InUse {
                entity_type: "Article",
                reason: format!(
                    "'{}' appears in {} transaction(s); archive it instead",
                    article.name,
                    used.len()
                ),
            });
        }

        self.storage.articles.delete(id)?;
        self.storage.articles.save()?;
        self.storage.log_delete(&article)?;

        Ok(article)
    }

    /// Value of all stock at purchase price before tax
    pub fn total_stock_value(&self) -> MaterielResult<Money> {
        Ok(self
            .storage
            .articles
            .filter(|a| !a.archived)?
            .iter()
            .map(Article::stock_value)
            .sum())
    }
}
