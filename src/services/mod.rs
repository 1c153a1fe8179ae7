//! Service layer for Materiel
//!
//! Services hold the business rules on top of the storage layer: validation,
//! derived state such as material status, stock movements, and
//! cross-entity checks. Every mutation is saved and written to the audit log.

pub mod article;
pub mod commerce;
pub mod dashboard;
pub mod loan;
pub mod material;
pub mod person;
pub mod rental;
pub mod repair;

pub use article::{ArticleService, ArticleUpdate};
pub use commerce::{
    ArticleMargin, CommerceService, CommerceSummary, PeriodTotals, TransactionFilter,
    UnpaidTransaction,
};
pub use dashboard::{Dashboard, DashboardService, MaterialCounts};
pub use loan::LoanService;
pub use material::{MaterialHistory, MaterialService, MaterialUpdate, MaterialWithStatus};
pub use person::{PersonService, PersonUpdate};
pub use rental::{PricedRental, RentalReturn, RentalService};
pub use repair::RepairService;
