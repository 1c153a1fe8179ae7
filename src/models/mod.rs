//! Core data models for Materiel
//!
//! Commerce (articles, transactions), equipment tracking (materials,
//! persons, loans, rentals, repairs) and the documents kept in the safe.

pub mod article;
pub mod discount;
pub mod ids;
pub mod loan;
pub mod material;
pub mod money;
pub mod payment;
pub mod person;
pub mod quantity;
pub mod rental;
pub mod repair;
pub mod transaction;
pub mod vat;
pub mod vault_item;

pub use article::Article;
pub use discount::Discount;
pub use ids::{
    ArticleId, LoanId, MaterialId, PersonId, RentalId, RepairId, TransactionId, VaultItemId,
};
pub use loan::Loan;
pub use material::{Material, MaterialStatus};
pub use money::{round2, Money};
pub use payment::PaymentStatus;
pub use person::Person;
pub use quantity::{Quantity, SoldBy, MAX_QUANTITY};
pub use rental::{DepositOutcome, Rental};
pub use repair::{Repair, RepairStatus};
pub use transaction::{Transaction, TransactionKind, TransactionLine};
pub use vat::VatRate;
pub use vault_item::{DocumentKind, VaultItem};
