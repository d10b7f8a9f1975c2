//! Timestamp and date generators.
//!
//! Ranges are expressed relative to an anchor time rather than the wall
//! clock, so a generator seeded twice with the same anchor produces the same
//! values.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

/// Generate a timestamp between `anchor - days_back` and `anchor`.
pub fn within_days<R: Rng + ?Sized>(
    rng: &mut R,
    anchor: NaiveDateTime,
    days_back: i64,
) -> NaiveDateTime {
    let span = days_back.max(0) * 86_400;
    let offset = rng.random_range(0..=span);
    anchor - Duration::seconds(offset)
}

/// Generate a date of birth for someone aged `min_age..=max_age` at `anchor`.
pub fn date_of_birth<R: Rng + ?Sized>(
    rng: &mut R,
    anchor: NaiveDateTime,
    min_age: i64,
    max_age: i64,
) -> NaiveDate {
    let youngest = anchor.date() - Duration::days(min_age * 365);
    let extra_days = rng.random_range(0..=(max_age - min_age).max(0) * 365);
    youngest - Duration::days(extra_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_within_days() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let ts = within_days(&mut rng, anchor(), 30);
            assert!(ts <= anchor());
            assert!(ts >= anchor() - Duration::days(30));
        }
    }

    #[test]
    fn test_date_of_birth() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let dob = date_of_birth(&mut rng, anchor(), 18, 80);
            assert!(dob.year() <= 2007);
            assert!(dob.year() >= 1944);
        }
    }

    #[test]
    fn test_deterministic_generation() {
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);

        assert_eq!(
            within_days(&mut rng1, anchor(), 365),
            within_days(&mut rng2, anchor(), 365)
        );
    }
}
