//! HT/TTC conversions, tax, discounts and line totals

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{round2, Discount, Money, TransactionLine, VatRate};

/// Tax-exclusive amount of a line: `round2(unit_price * quantity)`
///
/// A product beyond the decimal range saturates.
pub fn gross_excl_tax(unit_price: Money, quantity: Decimal) -> Money {
    let price = unit_price.to_decimal();
    match price.checked_mul(quantity) {
        Some(gross) => Money::from_decimal(gross),
        None if price.is_sign_negative() != quantity.is_sign_negative() => {
            Money::from_cents(i64::MIN)
        }
        None => Money::from_cents(i64::MAX),
    }
}

/// `round2(gross_excl_tax * rate)`
pub fn tax_amount(gross_excl_tax: Money, rate: Decimal) -> Money {
    Money::from_decimal(gross_excl_tax.to_decimal() * rate)
}

/// `round2(gross_excl_tax + tax)`
pub fn gross_incl_tax(gross_excl_tax: Money, tax: Money) -> Money {
    Money::from_decimal(gross_excl_tax.to_decimal() + tax.to_decimal())
}

/// Discount taken off a tax-included total
///
/// A fixed discount is clamped so it never exceeds the total.
pub fn discount_amount(gross_incl_tax: Money, discount: &Discount) -> Money {
    match discount {
        Discount::None => Money::zero(),
        Discount::Percentage(pct) => {
            Money::from_decimal(gross_incl_tax.to_decimal() * *pct / Decimal::ONE_HUNDRED)
        }
        Discount::Fixed(amount) => (*amount).min(gross_incl_tax),
    }
}

/// `round2(gross_incl_tax - discount)`
pub fn net_incl_tax(gross_incl_tax: Money, discount: Money) -> Money {
    Money::from_decimal(gross_incl_tax.to_decimal() - discount.to_decimal())
}

/// `round2(net_incl_tax / (1 + rate))`
pub fn net_excl_tax_after_discount(net_incl_tax: Money, rate: Decimal) -> Money {
    let divisor = Decimal::ONE + rate;
    if divisor.is_zero() {
        return net_incl_tax;
    }
    Money::from_decimal(net_incl_tax.to_decimal() / divisor)
}

/// `round2(net_incl_tax - net_excl_tax_after_discount)`
pub fn tax_after_discount(net_incl_tax: Money, net_excl_tax: Money) -> Money {
    Money::from_decimal(net_incl_tax.to_decimal() - net_excl_tax.to_decimal())
}

/// Tax-included price of a tax-exclusive price (article display)
pub fn price_incl_tax(price_excl_tax: Money, vat: VatRate) -> Money {
    gross_incl_tax(price_excl_tax, tax_amount(price_excl_tax, vat.rate()))
}

/// Tax-exclusive price of a tax-included price (article entry in TTC)
pub fn price_excl_tax(price_incl_tax: Money, vat: VatRate) -> Money {
    net_excl_tax_after_discount(price_incl_tax, vat.rate())
}

/// Full breakdown of one priced line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinePricing {
    pub gross_excl_tax: Money,
    pub tax: Money,
    pub gross_incl_tax: Money,
    pub discount: Money,
    pub net_incl_tax: Money,
    pub net_excl_tax: Money,
    pub net_tax: Money,
}

impl LinePricing {
    /// Price a line from scratch
    pub fn compute(unit_price: Money, quantity: Decimal, vat: VatRate, discount: &Discount) -> Self {
        let rate = vat.rate();
        let gross_excl = gross_excl_tax(unit_price, quantity);
        let tax = tax_amount(gross_excl, rate);
        let gross_incl = gross_incl_tax(gross_excl, tax);
        Self::from_gross(gross_excl, tax, gross_incl, discount_amount(gross_incl, discount), rate)
    }

    /// Price a transaction line without discount
    pub fn for_line(line: &TransactionLine) -> Self {
        Self::compute(
            line.unit_price,
            line.quantity.amount(),
            line.vat_rate,
            &Discount::None,
        )
    }

    fn from_gross(
        gross_excl: Money,
        tax: Money,
        gross_incl: Money,
        discount: Money,
        rate: Decimal,
    ) -> Self {
        let net_incl = net_incl_tax(gross_incl, discount);
        let (net_excl, net_tax) = if discount.is_zero() {
            (gross_excl, tax)
        } else {
            let net_excl = net_excl_tax_after_discount(net_incl, rate);
            (net_excl, tax_after_discount(net_incl, net_excl))
        };

        Self {
            gross_excl_tax: gross_excl,
            tax,
            gross_incl_tax: gross_incl,
            discount,
            net_incl_tax: net_incl,
            net_excl_tax: net_excl,
            net_tax,
        }
    }
}

/// Totals of a multi-line transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionTotals {
    pub lines: Vec<LinePricing>,
    pub gross_excl_tax: Money,
    pub tax: Money,
    pub gross_incl_tax: Money,
    pub discount: Money,
    pub net_incl_tax: Money,
    pub net_excl_tax: Money,
    pub net_tax: Money,
}

/// Price every line, then apply the transaction discount to the summed
/// tax-included total
///
/// The discount is spread over the lines in proportion to their
/// tax-included amount (the last line takes the rounding remainder) so
/// that each line backs out its own VAT rate. With a single line this is
/// exactly the single-line formula.
pub fn transaction_totals(lines: &[TransactionLine], discount: &Discount) -> TransactionTotals {
    let undiscounted: Vec<LinePricing> = lines.iter().map(LinePricing::for_line).collect();

    let gross_excl: Money = undiscounted.iter().map(|l| l.gross_excl_tax).sum();
    let tax: Money = undiscounted.iter().map(|l| l.tax).sum();
    let gross_incl: Money = undiscounted.iter().map(|l| l.gross_incl_tax).sum();
    let total_discount = discount_amount(gross_incl, discount);

    let priced: Vec<LinePricing> = if total_discount.is_zero() || gross_incl.is_zero() {
        undiscounted
    } else {
        let mut remaining = total_discount;
        let last = undiscounted.len().saturating_sub(1);
        undiscounted
            .iter()
            .zip(lines)
            .enumerate()
            .map(|(index, (pricing, line))| {
                let share = if index == last {
                    remaining
                } else {
                    let (discount, line_gross, total) = (
                        total_discount.to_decimal(),
                        pricing.gross_incl_tax.to_decimal(),
                        gross_incl.to_decimal(),
                    );
                    let share = Money::from_decimal(match discount.checked_mul(line_gross) {
                        Some(product) => product / total,
                        None => discount * (line_gross / total),
                    });
                    remaining -= share;
                    share
                };
                LinePricing::from_gross(
                    pricing.gross_excl_tax,
                    pricing.tax,
                    pricing.gross_incl_tax,
                    share,
                    line.vat_rate.rate(),
                )
            })
            .collect()
    };

    TransactionTotals {
        gross_excl_tax: gross_excl,
        tax,
        gross_incl_tax: gross_incl,
        discount: total_discount,
        net_incl_tax: priced.iter().map(|l| l.net_incl_tax).sum(),
        net_excl_tax: priced.iter().map(|l| l.net_excl_tax).sum(),
        net_tax: priced.iter().map(|l| l.net_tax).sum(),
        lines: priced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quantity;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_reference_example() {
        // 10.00 HT x 3 at 20 %, 10 % discount
        let p = LinePricing::compute(cents(1000), dec("3"), VatRate::Standard, &Discount::Percentage(dec("10")));
        assert_eq!(p.gross_excl_tax, cents(3000));
        assert_eq!(p.tax, cents(600));
        assert_eq!(p.gross_incl_tax, cents(3600));
        assert_eq!(p.discount, cents(360));
        assert_eq!(p.net_incl_tax, cents(3240));
        assert_eq!(p.net_excl_tax, cents(2700));
        assert_eq!(p.net_tax, cents(540));
    }

    #[test]
    fn test_huge_quantity_saturates() {
        assert_eq!(gross_excl_tax(cents(1000), Decimal::MAX), cents(i64::MAX));
        assert_eq!(gross_excl_tax(cents(-1000), Decimal::MAX), cents(i64::MIN));
        let p = LinePricing::compute(cents(1000), Decimal::MAX, VatRate::Standard, &Discount::None);
        assert_eq!(p.gross_excl_tax, cents(i64::MAX));
    }

    #[test]
    fn test_gross_incl_is_stepwise_rounded() {
        // 1.23 x 1.5 = 1.845 -> 1.85; tax 1.85 * 0.055 = 0.10175 -> 0.10
        let gross = gross_excl_tax(cents(123), dec("1.5"));
        assert_eq!(gross, cents(185));
        let tax = tax_amount(gross, VatRate::Reduced.rate());
        assert_eq!(tax, cents(10));
        assert_eq!(gross_incl_tax(gross, tax), cents(195));

        for (price, qty, vat) in [
            (123, "1.5", VatRate::Reduced),
            (999, "0.333", VatRate::Standard),
            (1, "7", VatRate::SuperReduced),
            (4550, "2.125", VatRate::Intermediate),
        ] {
            let p = LinePricing::compute(cents(price), dec(qty), vat, &Discount::None);
            let expected = round2(
                round2(cents(price).to_decimal() * dec(qty))
                    + round2(round2(cents(price).to_decimal() * dec(qty)) * vat.rate()),
            );
            assert_eq!(p.gross_incl_tax.to_decimal(), expected);
        }
    }

    #[test]
    fn test_stepwise_rounding_differs_from_final_rounding() {
        // 0.09 at 5.5 %: tax 0.00495 rounds to 0.00
        let p = LinePricing::compute(cents(9), dec("1"), VatRate::Reduced, &Discount::None);
        assert_eq!(p.tax, cents(0));
        assert_eq!(p.gross_incl_tax, cents(9));

        // 0.45 x 1.1 = 0.495 -> 0.50 before tax; tax at 20 % = 0.10
        let p = LinePricing::compute(cents(45), dec("1.1"), VatRate::Standard, &Discount::None);
        assert_eq!(p.gross_excl_tax, cents(50));
        assert_eq!(p.gross_incl_tax, cents(60));
        // whereas 0.495 * 1.2 = 0.594 -> 0.59 if rounded only once
        assert_ne!(Money::from_decimal(dec("0.495") * dec("1.2")), p.gross_incl_tax);
    }

    #[test]
    fn test_no_discount_keeps_gross() {
        let p = LinePricing::compute(cents(1999), dec("3"), VatRate::Reduced, &Discount::None);
        assert_eq!(p.discount, Money::zero());
        assert_eq!(p.net_incl_tax, p.gross_incl_tax);
        assert_eq!(p.net_tax, p.tax);
        assert_eq!(p.net_excl_tax, p.gross_excl_tax);
    }

    #[test]
    fn test_fixed_discount_clamped() {
        let gross = cents(3600);
        assert_eq!(discount_amount(gross, &Discount::Fixed(cents(500))), cents(500));
        assert_eq!(discount_amount(gross, &Discount::Fixed(cents(10_000))), gross);

        let p = LinePricing::compute(cents(1000), dec("3"), VatRate::Standard, &Discount::Fixed(cents(99_999)));
        assert_eq!(p.net_incl_tax, Money::zero());
        assert_eq!(p.net_excl_tax, Money::zero());
        assert_eq!(p.net_tax, Money::zero());
    }

    #[test]
    fn test_percentage_discount_rounding() {
        // 33.33 TTC at 15 % = 4.9995 -> 5.00
        assert_eq!(
            discount_amount(cents(3333), &Discount::Percentage(dec("15"))),
            cents(500)
        );
    }

    #[test]
    fn test_zero_rate_back_out() {
        let p = LinePricing::compute(cents(1000), dec("2"), VatRate::Zero, &Discount::Percentage(dec("50")));
        assert_eq!(p.net_incl_tax, cents(1000));
        assert_eq!(p.net_excl_tax, cents(1000));
        assert_eq!(p.net_tax, Money::zero());
    }

    #[test]
    fn test_price_conversions() {
        assert_eq!(price_incl_tax(cents(1000), VatRate::Standard), cents(1200));
        assert_eq!(price_excl_tax(cents(1200), VatRate::Standard), cents(1000));
        assert_eq!(price_incl_tax(cents(999), VatRate::Reduced), cents(1054));
        assert_eq!(price_excl_tax(cents(1054), VatRate::Reduced), cents(999));
    }

    #[test]
    fn test_transaction_totals_single_line_matches_line_formula() {
        let line = TransactionLine::new("Vis", cents(1000), Quantity::Units(dec("3")), VatRate::Standard);
        let discount = Discount::Percentage(dec("10"));
        let totals = transaction_totals(std::slice::from_ref(&line), &discount);
        let single = LinePricing::compute(cents(1000), dec("3"), VatRate::Standard, &discount);

        assert_eq!(totals.net_incl_tax, single.net_incl_tax);
        assert_eq!(totals.net_excl_tax, single.net_excl_tax);
        assert_eq!(totals.net_tax, single.net_tax);
        assert_eq!(totals.discount, single.discount);
    }

    #[test]
    fn test_transaction_totals_mixed_rates() {
        let lines = vec![
            TransactionLine::new("Farine", cents(200), Quantity::Weight(dec("2.5")), VatRate::Reduced),
            TransactionLine::new("Pelle", cents(2500), Quantity::Units(dec("1")), VatRate::Standard),
        ];
        let totals = transaction_totals(&lines, &Discount::None);
        // 5.00 + 0.28 = 5.28 ; 25.00 + 5.00 = 30.00
        assert_eq!(totals.gross_excl_tax, cents(3000));
        assert_eq!(totals.tax, cents(528));
        assert_eq!(totals.gross_incl_tax, cents(3528));
        assert_eq!(totals.net_incl_tax, totals.gross_incl_tax);

        let totals = transaction_totals(&lines, &Discount::Fixed(cents(1000)));
        assert_eq!(totals.discount, cents(1000));
        assert_eq!(totals.net_incl_tax, cents(2528));
        let shares: Money = totals.lines.iter().map(|l| l.discount).sum();
        assert_eq!(shares, cents(1000));
        assert_eq!(totals.net_excl_tax + totals.net_tax, totals.net_incl_tax);
    }

    #[test]
    fn test_transaction_totals_empty() {
        let totals = transaction_totals(&[], &Discount::Fixed(cents(100)));
        assert_eq!(totals.net_incl_tax, Money::zero());
        assert_eq!(totals.discount, Money::zero());
        assert!(totals.lines.is_empty());
    }
}
