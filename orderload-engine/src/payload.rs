//! Random filler for request bodies

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

/// Values with no business meaning beyond being plausible
#[derive(Debug, Clone)]
pub struct PayloadFiller {
    max_quantity: u32,
    max_delivery_days: i64,
}

impl Default for PayloadFiller {
    fn default() -> Self {
        Self {
            max_quantity: 10,
            max_delivery_days: 30,
        }
    }
}

impl PayloadFiller {
    pub fn quantity(&self) -> u32 {
        rand::rng().random_range(1..=self.max_quantity)
    }

    /// Expected delivery date a few days ahead, in the API's
    /// `YYYY-MM-DDTHH:MM:SS.mmm` local-time format
    pub fn delivery_date(&self) -> String {
        let days = rand::rng().random_range(1..=self.max_delivery_days);
        (Utc::now() + ChronoDuration::days(days))
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.3f")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_quantity_in_range() {
        let filler = PayloadFiller::default();
        for _ in 0..100 {
            assert!((1..=10).contains(&filler.quantity()));
        }
    }

    #[test]
    fn test_delivery_date_format() {
        let date = PayloadFiller::default().delivery_date();
        let parsed = NaiveDateTime::parse_from_str(&date, "%Y-%m-%dT%H:%M:%S%.3f").unwrap();
        assert!(parsed > Utc::now().naive_utc());
    }
}
