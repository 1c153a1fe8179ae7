//! Parsing of command-line values and interactive prompts

use std::io::{IsTerminal, Write};

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::crypto::SecureString;
use crate::error::{MaterielError, MaterielResult};
use crate::models::{Discount, Money, VatRate, MAX_QUANTITY};

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date written as YYYY-MM-DD or DD/MM/YYYY
pub fn parse_date(s: &str) -> MaterielResult<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .ok_or_else(|| {
            MaterielError::Validation(format!(
                "Invalid date: '{}'. Use YYYY-MM-DD or DD/MM/YYYY",
                s
            ))
        })
}

pub fn parse_opt_date(s: Option<&str>) -> MaterielResult<Option<NaiveDate>> {
    s.map(parse_date).transpose()
}

pub fn parse_money(s: &str) -> MaterielResult<Money> {
    Money::parse(s).map_err(|_| {
        MaterielError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '12,50' or '12.50'",
            s
        ))
    })
}

pub fn parse_opt_money(s: Option<&str>) -> MaterielResult<Option<Money>> {
    s.map(parse_money).transpose()
}

/// Parse a decimal quantity; both '.' and ',' are accepted as separator
///
/// Values beyond the largest line quantity in either direction are rejected.
pub fn parse_decimal(s: &str) -> MaterielResult<Decimal> {
    let value: Decimal = s
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| MaterielError::Validation(format!("Invalid number: '{}'", s)))?;
    if value.abs() > MAX_QUANTITY {
        return Err(MaterielError::Validation(format!(
            "Number out of range: '{}' (at most {})",
            s, MAX_QUANTITY
        )));
    }
    Ok(value)
}

pub fn parse_vat(s: &str) -> MaterielResult<VatRate> {
    VatRate::parse(s).ok_or_else(|| {
        MaterielError::Validation(format!(
            "Invalid VAT rate: '{}'. Valid rates: 0, 2.1, 5.5, 10, 20",
            s
        ))
    })
}

pub fn parse_discount(s: &str) -> MaterielResult<Discount> {
    let discount = Discount::parse(s).ok_or_else(|| {
        MaterielError::Validation(format!(
            "Invalid discount: '{}'. Use '10%' for a percentage or '5,00' for an amount",
            s
        ))
    })?;
    discount
        .validate()
        .map_err(|e| MaterielError::Validation(e.to_string()))?;
    Ok(discount)
}

/// An optional field edit: absent leaves the value, empty clears it
pub fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v).filter(|v| !v.trim().is_empty()))
}

/// Prompt for a secret without echo
///
/// When stdin is not a terminal the secret is read as a plain line, so the
/// vault can be driven from a script.
pub fn prompt_secret(prompt: &str) -> MaterielResult<SecureString> {
    if !std::io::stdin().is_terminal() {
        return prompt_line(prompt).map(SecureString::from);
    }
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| MaterielError::Io(format!("Failed to read input: {}", e)))
}

/// Prompt for a visible line of text
pub fn prompt_line(prompt: &str) -> MaterielResult<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_date("2025-03-14").unwrap(), expected);
        assert_eq!(parse_date("14/03/2025").unwrap(), expected);
        assert!(parse_date("03/14/2025").is_err());
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_money("12,50").unwrap().cents(), 1250);
        assert_eq!(parse_decimal("2,5").unwrap(), Decimal::new(25, 1));
        assert_eq!(parse_vat("5,5").unwrap(), VatRate::Reduced);
        assert!(parse_vat("7").is_err());
        assert_eq!(
            parse_discount("10%").unwrap(),
            Discount::Percentage(Decimal::from(10))
        );
        assert!(parse_discount("150%").is_err());
    }

    #[test]
    fn test_huge_numbers_rejected() {
        assert!(parse_money("999999999999999999").unwrap_err().is_validation());
        assert!(parse_decimal("79228162514264337593543950335").unwrap_err().is_validation());
        assert!(parse_decimal("-1000000001").is_err());
        assert_eq!(parse_decimal("-12,5").unwrap(), Decimal::new(-125, 1));
    }

    #[test]
    fn test_clearable() {
        assert_eq!(clearable(None), None);
        assert_eq!(clearable(Some(" ".into())), Some(None));
        assert_eq!(clearable(Some("06".into())), Some(Some("06".into())));
    }
}
