//! Record services over the shop schema.
pub mod catalog;
pub mod customers;
pub mod orders;

use rust_decimal::Decimal;
use validator::ValidationError;

pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use orders::OrderService;

/// Largest magnitude a `DECIMAL(10, 2)` column holds.
const MAX_MONEY: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Money must fit a `DECIMAL(10, 2)` column: at most 8 integer and 2 fractional digits.
pub(crate) fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("money_scale");
        err.message = Some("amount cannot have more than 2 decimal places".into());
        return Err(err);
    }
    if value.abs() >= MAX_MONEY {
        let mut err = ValidationError::new("money_range");
        err.message = Some("amount must be below 100000000".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_fits_ten_two() {
        assert!(validate_money(&dec!(99999999.99)).is_ok());
        assert!(validate_money(&dec!(12.50)).is_ok());
        assert!(validate_money(&dec!(12.500)).is_ok());
        assert!(validate_money(&dec!(-5.25)).is_ok());
        assert!(validate_money(&dec!(12.505)).is_err());
        assert!(validate_money(&dec!(100000000.00)).is_err());
    }
}
