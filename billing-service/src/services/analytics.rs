//! Revenue bucketing: daily / ISO-week / monthly sums of bill totals in a
//! configured reference timezone.

use crate::models::Bill;
use chrono::{Datelike, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

/// Three partitions of the same revenue total. `BTreeMap` keys the buckets
/// in ascending lexical order, which is chronological order because every
/// key format is zero-padded.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct RevenueBuckets {
    pub daily: BTreeMap<String, f64>,
    pub weekly: BTreeMap<String, f64>,
    pub monthly: BTreeMap<String, f64>,
}

impl RevenueBuckets {
    pub fn daily_total(&self) -> f64 {
        self.daily.values().sum()
    }

    pub fn weekly_total(&self) -> f64 {
        self.weekly.values().sum()
    }

    pub fn monthly_total(&self) -> f64 {
        self.monthly.values().sum()
    }
}

/// Accumulate every bill's `total_amount` into its daily, ISO-week and
/// monthly bucket, with calendar boundaries taken in `tz`.
pub fn bucket_revenue(bills: &[Bill], tz: FixedOffset) -> RevenueBuckets {
    let mut buckets = RevenueBuckets::default();

    for bill in bills {
        let local = bill.created_at.with_timezone(&tz);

        let day_key = local.format("%Y-%m-%d").to_string();
        *buckets.daily.entry(day_key).or_insert(0.0) += bill.total_amount;

        // ISO 8601 week-numbering calendar: weeks run Monday..Sunday and
        // week 1 contains the year's first Thursday, so the ISO year can
        // differ from the calendar year at the boundaries.
        let iso = local.iso_week();
        let week_key = format!("{}-W{:02}", iso.year(), iso.week());
        *buckets.weekly.entry(week_key).or_insert(0.0) += bill.total_amount;

        let month_key = local.format("%Y-%m").to_string();
        *buckets.monthly.entry(month_key).or_insert(0.0) += bill.total_amount;
    }

    buckets
}

/// Parse a `+HH:MM` / `-HH:MM` UTC offset into a fixed timezone.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1i32, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1i32, rest)
    } else {
        return None;
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillInput;
    use chrono::{TimeZone, Utc};

    fn kolkata() -> FixedOffset {
        parse_utc_offset("+05:30").unwrap()
    }

    fn bill_at(total: f64, y: i32, mo: u32, d: u32, h: u32) -> Bill {
        let mut bill = Bill::new(BillInput {
            customer_id: format!("C-{y}{mo}{d}{h}-{total}"),
            customer_name: "x".to_string(),
            phone: None,
            tree_id: "T1".to_string(),
            tree_measurement: "10ft".to_string(),
            tree_quantity: 1,
            total_amount: total,
            amount_paid: 0.0,
        });
        bill.created_at = Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap();
        bill
    }

    #[test]
    fn same_day_bills_share_one_bucket_across_all_partitions() {
        let bills = vec![bill_at(100.0, 2024, 3, 5, 6), bill_at(50.0, 2024, 3, 5, 9)];
        let buckets = bucket_revenue(&bills, kolkata());

        assert_eq!(buckets.daily.get("2024-03-05"), Some(&150.0));
        assert_eq!(buckets.weekly.get("2024-W10"), Some(&150.0));
        assert_eq!(buckets.monthly.get("2024-03"), Some(&150.0));
        assert_eq!(buckets.daily.len(), 1);
        assert_eq!(buckets.weekly.len(), 1);
        assert_eq!(buckets.monthly.len(), 1);
    }

    #[test]
    fn partitions_preserve_the_grand_total() {
        let bills = vec![
            bill_at(10.0, 2024, 1, 31, 12),
            bill_at(20.0, 2024, 2, 1, 12),
            bill_at(30.0, 2024, 6, 15, 12),
            bill_at(40.0, 2024, 12, 31, 12),
        ];
        let buckets = bucket_revenue(&bills, kolkata());

        assert_eq!(buckets.daily_total(), 100.0);
        assert_eq!(buckets.weekly_total(), 100.0);
        assert_eq!(buckets.monthly_total(), 100.0);
    }

    #[test]
    fn offset_conversion_can_move_a_bill_across_midnight() {
        // 2024-03-04 20:00 UTC is 2024-03-05 01:30 in +05:30.
        let buckets = bucket_revenue(&[bill_at(75.0, 2024, 3, 4, 20)], kolkata());
        assert_eq!(buckets.daily.get("2024-03-05"), Some(&75.0));
        assert!(buckets.daily.get("2024-03-04").is_none());
    }

    #[test]
    fn iso_week_year_differs_from_calendar_year_at_the_boundary() {
        // 2024-12-30 is a Monday belonging to ISO week 2025-W01.
        let buckets = bucket_revenue(&[bill_at(10.0, 2024, 12, 30, 12)], kolkata());
        assert_eq!(buckets.weekly.get("2025-W01"), Some(&10.0));
        assert_eq!(buckets.monthly.get("2024-12"), Some(&10.0));
    }

    #[test]
    fn week_keys_are_zero_padded_and_sorted() {
        let bills = vec![
            bill_at(1.0, 2024, 1, 10, 12),  // W02
            bill_at(2.0, 2024, 3, 20, 12),  // W12
            bill_at(3.0, 2024, 10, 20, 12), // W42
        ];
        let buckets = bucket_revenue(&bills, kolkata());
        let keys: Vec<_> = buckets.weekly.keys().cloned().collect();
        assert_eq!(keys, vec!["2024-W02", "2024-W12", "2024-W42"]);
    }

    #[test]
    fn empty_scan_yields_empty_buckets() {
        let buckets = bucket_revenue(&[], kolkata());
        assert!(buckets.daily.is_empty());
        assert!(buckets.weekly.is_empty());
        assert!(buckets.monthly.is_empty());
    }

    #[test]
    fn parses_positive_and_negative_offsets() {
        assert_eq!(
            parse_utc_offset("+05:30"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("-08:00"), FixedOffset::east_opt(-8 * 3600));
        assert_eq!(parse_utc_offset("+00:00"), FixedOffset::east_opt(0));
    }

    #[test]
    fn rejects_malformed_offsets() {
        for raw in ["", "05:30", "+5", "+24:00", "+05:60", "+aa:bb"] {
            assert!(parse_utc_offset(raw).is_none(), "accepted {raw:?}");
        }
    }
}
