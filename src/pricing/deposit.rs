//! Deposit (caution) settlement

use serde::Serialize;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{DepositOutcome, Money};

/// How a deposit was split between the workshop and the renter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositSettlement {
    pub retained: Money,
    pub returned: Money,
    pub outcome: DepositOutcome,
}

/// Split a deposit into a retained and a returned part
///
/// `retained` must lie in `[0, deposit]`; anything else is rejected before
/// any amount is computed.
pub fn settle_deposit(deposit: Money, retained: Money) -> MaterielResult<DepositSettlement> {
    if retained.is_negative() {
        return Err(MaterielError::Validation(
            "Retained amount cannot be negative".into(),
        ));
    }
    if retained > deposit {
        return Err(MaterielError::Validation(format!(
            "Retained amount {} exceeds the deposit of {}",
            retained, deposit
        )));
    }

    let outcome = if retained.is_zero() {
        DepositOutcome::FullyReturned
    } else if retained == deposit {
        DepositOutcome::FullyRetained
    } else {
        DepositOutcome::PartiallyRetained(retained)
    };

    Ok(DepositSettlement {
        retained,
        returned: deposit - retained,
        outcome,
    })
}

impl DepositOutcome {
    /// Amount kept out of `deposit` for a settled outcome
    pub fn retained_of(&self, deposit: Money) -> Money {
        match self {
            Self::Pending | Self::FullyReturned => Money::zero(),
            Self::FullyRetained => deposit,
            Self::PartiallyRetained(amount) => *amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_retention() {
        let s = settle_deposit(Money::from_cents(20000), Money::from_cents(5000)).unwrap();
        assert_eq!(s.returned, Money::from_cents(15000));
        assert_eq!(s.outcome, DepositOutcome::PartiallyRetained(Money::from_cents(5000)));
    }

    #[test]
    fn test_retention_above_deposit_rejected() {
        let err = settle_deposit(Money::from_cents(20000), Money::from_cents(25000)).unwrap_err();
        assert!(err.is_validation());
        assert!(settle_deposit(Money::from_cents(20000), Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_full_outcomes() {
        let deposit = Money::from_cents(20000);
        let returned = settle_deposit(deposit, Money::zero()).unwrap();
        assert_eq!(returned.outcome, DepositOutcome::FullyReturned);
        assert_eq!(returned.returned, deposit);

        let retained = settle_deposit(deposit, deposit).unwrap();
        assert_eq!(retained.outcome, DepositOutcome::FullyRetained);
        assert_eq!(retained.returned, Money::zero());
        assert_eq!(retained.outcome.retained_of(deposit), deposit);
    }

    #[test]
    fn test_zero_deposit_is_fully_returned() {
        let s = settle_deposit(Money::zero(), Money::zero()).unwrap();
        assert_eq!(s.outcome, DepositOutcome::FullyReturned);
    }
}
