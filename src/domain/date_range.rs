//! Calendar date ranges and their decomposition into day-units
//!
//! A [`DateRange`] is inclusive on both ends. It may be constructed with
//! `from > to`; such a range is degenerate and decomposes into zero days.
//! Ordering is enforced separately by [`DateRange::validate`], which callers
//! run before starting a sync.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::constants::date_key;
use crate::domain::errors::RangeError;

/// Inclusive calendar date range keyed by `YYYY-MM-DD` strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[serde(with = "date_key_format")]
    #[ts(type = "string")]
    pub from: NaiveDate,
    #[serde(with = "date_key_format")]
    #[ts(type = "string")]
    pub to: NaiveDate,
}

impl DateRange {
    pub const fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Single-day range
    pub const fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// Parse both endpoints in strict `YYYY-MM-DD` form.
    ///
    /// Does not check ordering.
    pub fn parse(from: &str, to: &str) -> Result<Self, RangeError> {
        Ok(Self {
            from: parse_date_key(from)?,
            to: parse_date_key(to)?,
        })
    }

    /// Upstream range check performed before a run is requested.
    pub fn validate(&self, max_days: u32) -> Result<(), RangeError> {
        if self.from > self.to {
            return Err(RangeError::Reversed {
                from: format_date_key(self.from),
                to: format_date_key(self.to),
            });
        }
        let days = self.day_count();
        if days > max_days as usize {
            return Err(RangeError::TooLong { days, max_days });
        }
        Ok(())
    }

    /// Number of day-units in the range, 0 for a degenerate range
    pub fn day_count(&self) -> usize {
        if self.from > self.to {
            return 0;
        }
        let span = (self.to - self.from).num_days();
        usize::try_from(span).map_or(0, |d| d + 1)
    }

    /// Ordered, inclusive sequence of days from `from` to `to`
    pub fn days(&self) -> Vec<NaiveDate> {
        let count = self.day_count();
        let mut days = Vec::with_capacity(count);
        let mut cursor = self.from;
        for _ in 0..count {
            days.push(cursor);
            match cursor.checked_add_days(Days::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        days
    }

    /// Same as [`DateRange::days`] rendered as date keys
    pub fn day_keys(&self) -> Vec<String> {
        self.days().into_iter().map(format_date_key).collect()
    }

    pub fn is_degenerate(&self) -> bool {
        self.from > self.to
    }

    /// Whether the two ranges share at least one day
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_degenerate() && !other.is_degenerate() && self.from <= other.to && other.from <= self.to
    }

    /// Human readable `"<from> → <to>"` label
    pub fn label(&self) -> String {
        format!(
            "{}{}{}",
            format_date_key(self.from),
            date_key::RANGE_LABEL_SEPARATOR,
            format_date_key(self.to)
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse a strict `YYYY-MM-DD` date key
pub fn parse_date_key(raw: &str) -> Result<NaiveDate, RangeError> {
    // chrono accepts signs and unpadded fields; date keys are always `dddd-dd-dd`
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(RangeError::InvalidDateKey(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, date_key::FORMAT).map_err(|_| RangeError::InvalidDateKey(raw.to_string()))
}

pub fn format_date_key(day: NaiveDate) -> String {
    day.format(date_key::FORMAT).to_string()
}

mod date_key_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date_key(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date_key(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(raw: &str) -> NaiveDate {
        parse_date_key(raw).unwrap()
    }

    #[test]
    fn test_single_day_range_has_one_unit() {
        let range = DateRange::parse("2025-01-01", "2025-01-01").unwrap();
        assert_eq!(range.day_count(), 1);
        assert_eq!(range.day_keys(), vec!["2025-01-01".to_string()]);
    }

    #[test]
    fn test_five_day_range_keys() {
        let range = DateRange::parse("2025-01-01", "2025-01-05").unwrap();
        assert_eq!(
            range.day_keys(),
            vec!["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-04", "2025-01-05"]
        );
    }

    #[test]
    fn test_range_crossing_month_and_leap_day() {
        let range = DateRange::parse("2024-02-27", "2024-03-02").unwrap();
        assert_eq!(
            range.day_keys(),
            vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"]
        );
    }

    #[test]
    fn test_reversed_range_is_degenerate() {
        let range = DateRange::parse("2025-01-05", "2025-01-01").unwrap();
        assert_eq!(range.day_count(), 0);
        assert!(range.days().is_empty());
        assert!(matches!(range.validate(92), Err(RangeError::Reversed { .. })));
    }

    #[test]
    fn test_overlap_detection() {
        let jan = DateRange::new(day("2025-01-01"), day("2025-01-31"));
        assert!(jan.overlaps(&DateRange::new(day("2025-01-31"), day("2025-02-05"))));
        assert!(jan.overlaps(&DateRange::single(day("2025-01-15"))));
        assert!(!jan.overlaps(&DateRange::new(day("2025-02-01"), day("2025-02-05"))));
        assert!(!jan.overlaps(&DateRange::new(day("2025-01-10"), day("2025-01-05"))));
    }

    #[test]
    fn test_validate_rejects_long_ranges() {
        let range = DateRange::parse("2025-01-01", "2025-12-31").unwrap();
        assert!(matches!(
            range.validate(92),
            Err(RangeError::TooLong { days: 365, max_days: 92 })
        ));
        assert!(range.validate(366).is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for raw in [
            "2025-1-01",
            "01/02/2025",
            "2025-02-30",
            "",
            "2025-01-011",
            "+2025-1-01",
            "-2025-1-01",
            "+999-01-01",
            " 2025-01-01 ",
            "2025/01/01",
        ] {
            assert!(
                matches!(parse_date_key(raw), Err(RangeError::InvalidDateKey(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_label_and_serde_shape() {
        let range = DateRange::new(day("2025-01-01"), day("2025-01-05"));
        assert_eq!(range.label(), "2025-01-01 → 2025-01-05");

        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json, serde_json::json!({"from": "2025-01-01", "to": "2025-01-05"}));

        let back: DateRange = serde_json::from_value(json).unwrap();
        assert_eq!(back, range);
    }

    proptest! {
        #[test]
        fn prop_decomposition_is_inclusive_and_strictly_increasing(
            start_offset in 0u64..20_000,
            span in 0u64..400,
        ) {
            let base = day("1990-01-01");
            let from = base.checked_add_days(Days::new(start_offset)).unwrap();
            let to = from.checked_add_days(Days::new(span)).unwrap();
            let range = DateRange::new(from, to);
            let days = range.days();

            prop_assert_eq!(days.len() as u64, span + 1);
            prop_assert_eq!(days.len(), range.day_count());
            prop_assert_eq!(days.first().copied(), Some(from));
            prop_assert_eq!(days.last().copied(), Some(to));
            prop_assert!(days.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
