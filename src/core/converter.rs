//! Currency conversion into settlement units

use rust_decimal::Decimal;

use crate::types::{CurrencyRateTable, WalletError};

/// Convert `amount` of `currency` into settlement units
///
/// Exact decimal multiplication by the table rate. A product that `Decimal`
/// could only hold by rounding away fractional digits is rejected.
///
/// # Errors
///
/// * `UnsupportedCurrency` if the table has no rate for `currency`
/// * `PrecisionExceeded` if the exact product needs more than 28 significant
///   or fractional digits
/// * `ArithmeticOverflow` if the product does not fit in a `Decimal`
pub fn convert(
    table: &CurrencyRateTable,
    amount: Decimal,
    currency: &str,
) -> Result<Decimal, WalletError> {
    let rate = table
        .rate(currency)
        .ok_or_else(|| WalletError::unsupported_currency(currency))?;

    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let amount = amount.normalize();
    let rate = rate.normalize();
    let product = amount
        .checked_mul(rate)
        .ok_or_else(|| WalletError::arithmetic_overflow("convert", currency))?;

    // checked_mul keeps the summed scale unless it had to round.
    if product.scale() < amount.scale() + rate.scale() {
        return Err(WalletError::precision_exceeded(amount, currency));
    }

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn table() -> CurrencyRateTable {
        CurrencyRateTable::new(
            "RUB",
            [
                ("RUB", Decimal::ONE),
                ("USD", Decimal::new(100, 0)),
                ("EUR", Decimal::new(105, 0)),
                ("BTC", Decimal::new(10135623, 0)),
            ],
        )
        .unwrap()
    }

    #[rstest]
    #[case("50", "USD", "5000")]
    #[case("0.5", "RUB", "0.5")]
    #[case("1.1", "EUR", "115.5")]
    #[case("0.00001", "BTC", "101.35623")]
    #[case("0.1", "USD", "10")]
    fn test_convert(#[case] amount: &str, #[case] currency: &str, #[case] expected: &str) {
        let amount = Decimal::from_str(amount).unwrap();
        let expected = Decimal::from_str(expected).unwrap();

        assert_eq!(convert(&table(), amount, currency).unwrap(), expected);
    }

    #[test]
    fn test_repeated_conversion_does_not_drift() {
        let step = convert(&table(), Decimal::from_str("0.1").unwrap(), "USD").unwrap();
        let total: Decimal = (0..1000).map(|_| step).sum();

        assert_eq!(total, Decimal::new(10000, 0));
    }

    #[test]
    fn test_unsupported_currency() {
        let result = convert(&table(), Decimal::ONE, "GBP");
        assert_eq!(result, Err(WalletError::unsupported_currency("GBP")));
    }

    #[rstest]
    #[case::mantissa_too_wide("1.000000000000000000000000001", "EUR")]
    #[case::many_fraction_digits("0.1234567890123456789012345678", "EUR")]
    fn test_rounded_product_is_rejected(#[case] amount: &str, #[case] currency: &str) {
        let amount = Decimal::from_str(amount).unwrap();

        let result = convert(&table(), amount, currency);

        assert_eq!(
            result,
            Err(WalletError::precision_exceeded(amount, currency))
        );
    }

    #[test]
    fn test_product_at_full_precision_is_kept() {
        let amount = Decimal::from_str("1.00000000000000000000000001").unwrap();

        let result = convert(&table(), amount, "EUR").unwrap();

        assert_eq!(
            result,
            Decimal::from_str("105.00000000000000000000000105").unwrap()
        );
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        let amount = Decimal::from_str("2.50000000000000000000000000").unwrap();

        assert_eq!(
            convert(&table(), amount, "USD").unwrap(),
            Decimal::new(250, 0)
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = convert(&table(), Decimal::MAX, "BTC");
        assert!(matches!(result, Err(WalletError::ArithmeticOverflow { .. })));
    }
}
