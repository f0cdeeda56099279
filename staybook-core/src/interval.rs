use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BookingError, BookingResult};

/// Half-open stay `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StayInterval {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayInterval {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> BookingResult<Self> {
        if check_in >= check_out {
            return Err(BookingError::invalid("Check-out date must be after check-in date"));
        }
        Ok(Self { check_in, check_out })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Whole nights in the stay. Always at least 1.
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days() as u32
    }

    pub fn overlaps(&self, other: &StayInterval) -> bool {
        overlaps(self.check_in, self.check_out, other.check_in, other.check_out)
    }
}

/// Standard half-open overlap: `a.in < b.out && a.out > b.in`.
///
/// Back-to-back stays (one checks out the day the other checks in) do not overlap.
pub fn overlaps(a_in: NaiveDate, a_out: NaiveDate, b_in: NaiveDate, b_out: NaiveDate) -> bool {
    a_in < b_out && a_out > b_in
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn stay(a: u32, b: u32) -> StayInterval {
        StayInterval::new(d(a), d(b)).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_inverted_ranges() {
        assert!(matches!(StayInterval::new(d(10), d(10)), Err(BookingError::InvalidRequest(_))));
        assert!(matches!(StayInterval::new(d(12), d(10)), Err(BookingError::InvalidRequest(_))));
    }

    #[test]
    fn test_nights() {
        assert_eq!(stay(10, 12).nights(), 2);
        assert_eq!(stay(10, 11).nights(), 1);
    }

    #[test]
    fn test_overlapping_stays() {
        assert!(stay(10, 12).overlaps(&stay(11, 13)));
        assert!(stay(11, 13).overlaps(&stay(10, 12)));
        assert!(stay(10, 20).overlaps(&stay(12, 14)));
        assert!(stay(10, 12).overlaps(&stay(10, 12)));
    }

    #[test]
    fn test_adjacent_stays_do_not_overlap() {
        assert!(!stay(10, 12).overlaps(&stay(12, 14)));
        assert!(!stay(12, 14).overlaps(&stay(10, 12)));
        assert!(!stay(1, 3).overlaps(&stay(20, 25)));
    }
}
