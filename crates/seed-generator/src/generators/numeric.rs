//! Numeric value generators.

use rand::Rng;
use rust_decimal::Decimal;

/// Generate a random integer in the given range (inclusive).
pub fn int_range<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    rng.random_range(min..=max)
}

/// Generate a random money amount with 2 decimal places.
///
/// Bounds are given in cents so the result is always exact: `money(rng,
/// 1099, 99999)` yields values from 10.99 to 999.99.
pub fn money<R: Rng + ?Sized>(rng: &mut R, min_cents: i64, max_cents: i64) -> Decimal {
    Decimal::new(rng.random_range(min_cents..=max_cents), 2)
}

/// Round to 2 decimal places (banker's rounding).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::str::FromStr;

    #[test]
    fn test_int_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let v = int_range(&mut rng, 10, 20);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_money_bounds_and_scale() {
        let mut rng = StdRng::seed_from_u64(42);
        let min = Decimal::from_str("10.99").unwrap();
        let max = Decimal::from_str("999.99").unwrap();

        for _ in 0..100 {
            let v = money(&mut rng, 1099, 99999);
            assert!(v >= min && v <= max);
            assert_eq!(v.scale(), 2);
        }
    }

    #[test]
    fn test_round2() {
        let v = Decimal::from_str("12.345").unwrap();
        assert_eq!(round2(v), Decimal::from_str("12.34").unwrap());
        let v = Decimal::from_str("12.355").unwrap();
        assert_eq!(round2(v), Decimal::from_str("12.36").unwrap());
    }
}
