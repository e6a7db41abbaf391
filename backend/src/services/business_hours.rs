//! Intersection of a UTC interval with a location's weekly business hours.
//!
//! Every rule is placed on its weekday inside the local calendar week (Sunday
//! first) that contains the interval start. Occurrences in later weeks are not
//! evaluated, so an interval crossing a week boundary only sees the first
//! week's rules.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::models::BusinessHourRule;

/// Minutes of an interval split into open and closed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusinessMinutes {
    /// Minutes inside at least one business-hour occurrence
    pub open_minutes: i64,
    /// Remaining minutes of the interval
    pub closed_minutes: i64,
}

/// Whole minutes between two instants, truncated toward zero.
fn whole_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes()
}

/// Sunday that starts the local calendar week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Resolve a local wall-clock time to a UTC instant.
///
/// Times skipped by a DST jump move forward by the length of the gap; repeated
/// times take the earlier instant.
fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Read the wall time with the offset in force before the gap.
            let before = tz.offset_from_utc_datetime(&(local - Duration::days(1))).fix();
            (local - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
        }
    }
}

/// Split `[start, end]` into minutes inside and outside business hours.
///
/// An interval with `end <= start` has no minutes at all. Overlaps of several
/// rules are summed but never exceed the interval itself.
pub fn business_minutes(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rules: &[BusinessHourRule],
    tz: Tz,
) -> BusinessMinutes {
    let span = whole_minutes(start, end).max(0);
    if span == 0 {
        return BusinessMinutes::default();
    }

    let anchor = week_start(start.with_timezone(&tz).date_naive());

    let open: i64 = rules
        .iter()
        .map(|rule| {
            let day = anchor + Duration::days(i64::from(rule.day_of_week));
            let rule_start = localize(tz, day.and_time(rule.start_time_local));
            let rule_end = localize(tz, day.and_time(rule.end_time_local));

            if start > rule_end || end < rule_start {
                return 0;
            }
            whole_minutes(start.max(rule_start), end.min(rule_end)).max(0)
        })
        .sum();

    let open_minutes = open.min(span);
    BusinessMinutes {
        open_minutes,
        closed_minutes: span - open_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreId;
    use chrono::NaiveTime;
    use chrono_tz::America::New_York;

    fn rule(day: u8, start: (u32, u32), end: (u32, u32)) -> BusinessHourRule {
        BusinessHourRule::new(
            StoreId::new(1),
            day,
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
        .unwrap()
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_week_start_is_sunday() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(week_start(monday), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(week_start(sunday), sunday);
    }

    #[test]
    fn test_interval_inside_business_hours_is_all_open() {
        let rules = [rule(1, (9, 0), (17, 0))];
        let m = business_minutes(ny(2024, 1, 15, 12, 0), ny(2024, 1, 15, 13, 0), &rules, New_York);
        assert_eq!(m, BusinessMinutes { open_minutes: 60, closed_minutes: 0 });
    }

    #[test]
    fn test_interval_straddling_opening_is_split() {
        let rules = [rule(1, (9, 0), (17, 0))];
        let m = business_minutes(ny(2024, 1, 15, 8, 0), ny(2024, 1, 15, 10, 0), &rules, New_York);
        assert_eq!(m.open_minutes, 60);
        assert_eq!(m.closed_minutes, 60);
    }

    #[test]
    fn test_no_rules_means_all_closed() {
        let m = business_minutes(ny(2024, 1, 15, 8, 0), ny(2024, 1, 15, 10, 30), &[], New_York);
        assert_eq!(m.open_minutes, 0);
        assert_eq!(m.closed_minutes, 150);
    }

    #[test]
    fn test_rule_on_other_weekday_does_not_count() {
        let rules = [rule(2, (9, 0), (17, 0))];
        let m = business_minutes(ny(2024, 1, 15, 9, 0), ny(2024, 1, 15, 17, 0), &rules, New_York);
        assert_eq!(m.open_minutes, 0);
        assert_eq!(m.closed_minutes, 480);
    }

    #[test]
    fn test_overlapping_rules_never_exceed_span() {
        let rules = [rule(1, (9, 0), (17, 0)), rule(1, (10, 0), (18, 0))];
        let m = business_minutes(ny(2024, 1, 15, 11, 0), ny(2024, 1, 15, 12, 0), &rules, New_York);
        assert_eq!(m.open_minutes, 60);
        assert_eq!(m.closed_minutes, 0);
    }

    #[test]
    fn test_overnight_rule_contributes_nothing() {
        let rules = [rule(1, (22, 0), (2, 0))];
        let m = business_minutes(ny(2024, 1, 15, 21, 0), ny(2024, 1, 15, 23, 0), &rules, New_York);
        assert_eq!(m.open_minutes, 0);
        assert_eq!(m.closed_minutes, 120);
    }

    #[test]
    fn test_reversed_interval_is_empty() {
        let rules = [rule(1, (9, 0), (17, 0))];
        let m = business_minutes(ny(2024, 1, 15, 13, 0), ny(2024, 1, 15, 12, 0), &rules, New_York);
        assert_eq!(m, BusinessMinutes::default());
    }

    #[test]
    fn test_partial_minutes_are_truncated() {
        let rules = [rule(1, (9, 0), (17, 0))];
        let start = ny(2024, 1, 15, 12, 0);
        let end = start + Duration::seconds(150);
        let m = business_minutes(start, end, &rules, New_York);
        assert_eq!(m.open_minutes, 2);
        assert_eq!(m.closed_minutes, 0);
    }

    #[test]
    fn test_local_time_depends_on_zone() {
        let rules = [rule(1, (9, 0), (17, 0))];
        // 14:00-15:00 UTC is 09:00-10:00 in New York and 08:00-09:00 in Chicago.
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let in_ny = business_minutes(start, end, &rules, New_York);
        let in_chicago = business_minutes(start, end, &rules, chrono_tz::America::Chicago);
        assert_eq!(in_ny.open_minutes, 60);
        assert_eq!(in_chicago.open_minutes, 0);
    }

    #[test]
    fn test_skipped_local_time_moves_forward() {
        // 2024-03-10 02:30 does not exist in New York; the rule opens at 03:30 EDT.
        let rules = [rule(0, (2, 30), (4, 0))];
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let m = business_minutes(start, end, &rules, New_York);
        assert_eq!(m.open_minutes, 30);
    }

    #[test]
    fn test_half_hour_gap_shifts_by_gap_length() {
        // Lord Howe moves from +10:30 to +11:00 at 02:00 on 2024-10-06. A rule
        // opening at 02:15 opens at 02:45 local (15:45 UTC), 15 minutes before
        // its 03:00 close.
        let rules = [rule(0, (2, 15), (3, 0))];
        let start = Utc.with_ymd_and_hms(2024, 10, 5, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 10, 5, 17, 0, 0).unwrap();
        let m = business_minutes(start, end, &rules, chrono_tz::Australia::Lord_Howe);
        assert_eq!(m.open_minutes, 15);
        assert_eq!(m.closed_minutes, 165);
    }

    #[test]
    fn test_repeated_local_time_takes_earlier_instant() {
        // 01:30 on 2024-11-03 happens twice in New York. The first one is
        // 05:30 UTC (EDT), and 03:00 EST closes the rule at 08:00 UTC.
        let rules = [rule(0, (1, 30), (3, 0))];
        let start = Utc.with_ymd_and_hms(2024, 11, 3, 4, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 11, 3, 9, 0, 0).unwrap();
        let m = business_minutes(start, end, &rules, New_York);
        assert_eq!(m.open_minutes, 150);
        assert_eq!(m.closed_minutes, 150);
    }

    #[test]
    fn test_only_first_week_occurrences_are_evaluated() {
        // Saturday 2024-01-13 10:00 through Tuesday 2024-01-16 10:00. The Monday
        // rule is anchored to Monday 2024-01-08, before the interval, so Monday
        // 2024-01-15 09:00-17:00 is counted as closed time.
        let rules = [rule(1, (9, 0), (17, 0))];
        let start = ny(2024, 1, 13, 10, 0);
        let end = ny(2024, 1, 16, 10, 0);
        let m = business_minutes(start, end, &rules, New_York);
        assert_eq!(m.open_minutes, 0);
        assert_eq!(m.closed_minutes, 3 * 24 * 60);
    }

    #[test]
    fn test_week_anchor_uses_local_date() {
        // Sunday 2024-01-14 03:00 UTC is still Saturday evening in New York, so
        // the anchoring week starts on 2024-01-07 and the Sunday rule lands on
        // 2024-01-07 rather than 2024-01-14.
        let rules = [rule(0, (0, 0), (23, 0))];
        let start = Utc.with_ymd_and_hms(2024, 1, 14, 3, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 14, 15, 0, 0).unwrap();
        let m = business_minutes(start, end, &rules, New_York);
        assert_eq!(m.open_minutes, 0);
        assert_eq!(m.closed_minutes, 12 * 60);
    }
}
