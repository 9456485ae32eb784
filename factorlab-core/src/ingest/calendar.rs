//! Trading calendar checks that need no remote lookup.
//!
//! Exchange holidays come from the KRX calendar through `MarketDataSource`.

use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturday_and_sunday_only() {
        // 2024-01-05 is a Friday
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(!is_weekend(friday));
        assert!(is_weekend(friday.succ_opt().unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
    }
}
