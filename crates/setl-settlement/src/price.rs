use setl_int128::{scale_up_pow10, Int128};

/// Decimal places used when quoting an order's effective price.
const PRICE_DECIMALS: u32 = 7;

/// Effective price of a matched order (sell amount per unit bought) as a
/// 7-decimal string for operator logs. `None` when the order bought
/// nothing or the widening would overflow.
pub(crate) fn effective_price_string(amount_sell: i64, amount_buy: i64) -> Option<String> {
    if amount_buy <= 0 {
        return None;
    }
    let (widened, overflow) = scale_up_pow10(Int128::from_i64(amount_sell), PRICE_DECIMALS);
    if overflow {
        return None;
    }
    let (price, _) = widened.divide(Int128::from_i64(amount_buy)).ok()?;
    Some(price.to_scaled_decimal_string(PRICE_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_at_seven_decimals() {
        assert_eq!(
            effective_price_string(15_000, 25_000).as_deref(),
            Some("0.6000000")
        );
        assert_eq!(
            effective_price_string(25, 15).as_deref(),
            Some("1.6666666")
        );
    }

    #[test]
    fn degenerate_orders_have_no_price() {
        assert_eq!(effective_price_string(10, 0), None);
        assert_eq!(effective_price_string(0, 10).as_deref(), Some("0.0000000"));
    }
}
