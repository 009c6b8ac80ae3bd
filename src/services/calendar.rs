use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

use crate::models::week::DayOfWeek;

/// A resolved 7-day window. `end` is exclusive, for date-range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub today: DayOfWeek,
}

/// Resolve the Monday-anchored week containing `reference`, as seen from the
/// given local offset. This is the canonical window for all plan-authoring
/// and completion operations. The reference instant is a parameter so tests
/// and callers control the clock.
pub fn resolve_week(reference: DateTime<Utc>, offset: FixedOffset) -> WeekWindow {
    let local = reference.with_timezone(&offset).date_naive();
    let days_from_monday = local.weekday().num_days_from_monday() as i64;
    let start = local - Duration::days(days_from_monday);
    WeekWindow {
        start,
        end: start + Duration::days(7),
        today: local.weekday().into(),
    }
}

/// Resolve the Sunday-anchored window used only by the dashboard read path.
/// Distinct from [`resolve_week`] on purpose: the two anchors disagree in the
/// product and collapsing them would change observable dashboard output.
pub fn resolve_display_week(reference: DateTime<Utc>, offset: FixedOffset) -> WeekWindow {
    let local = reference.with_timezone(&offset).date_naive();
    let days_from_sunday = local.weekday().num_days_from_sunday() as i64;
    let start = local - Duration::days(days_from_sunday);
    WeekWindow {
        start,
        end: start + Duration::days(7),
        today: local.weekday().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc0() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn monday_reference_starts_its_own_week() {
        // 2024-06-03 is a Monday
        let w = resolve_week(utc(2024, 6, 3, 12), utc0());
        assert_eq!(w.start, date(2024, 6, 3));
        assert_eq!(w.end, date(2024, 6, 10));
        assert_eq!(w.today, DayOfWeek::Monday);
    }

    #[test]
    fn midweek_reference_rolls_back_to_monday() {
        // 2024-06-06 is a Thursday
        let w = resolve_week(utc(2024, 6, 6, 8), utc0());
        assert_eq!(w.start, date(2024, 6, 3));
        assert_eq!(w.today, DayOfWeek::Thursday);
    }

    #[test]
    fn sunday_belongs_to_the_monday_week_that_started_it() {
        // 2024-06-09 is a Sunday: still inside the week of Monday the 3rd
        let w = resolve_week(utc(2024, 6, 9, 23), utc0());
        assert_eq!(w.start, date(2024, 6, 3));
        assert_eq!(w.today, DayOfWeek::Sunday);
    }

    #[test]
    fn display_week_anchors_on_sunday() {
        // Thursday 2024-06-06: display window began Sunday the 2nd
        let w = resolve_display_week(utc(2024, 6, 6, 8), utc0());
        assert_eq!(w.start, date(2024, 6, 2));
        assert_eq!(w.end, date(2024, 6, 9));
    }

    #[test]
    fn display_and_authoring_windows_disagree_on_sundays() {
        // Sunday 2024-06-09: authoring week started the previous Monday,
        // display week starts today.
        let t = utc(2024, 6, 9, 12);
        assert_eq!(resolve_week(t, utc0()).start, date(2024, 6, 3));
        assert_eq!(resolve_display_week(t, utc0()).start, date(2024, 6, 9));
    }

    #[test]
    fn offset_shifts_the_local_day() {
        // 2024-06-03 01:00 UTC is still Sunday the 2nd at UTC-5
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let w = resolve_week(utc(2024, 6, 3, 1), minus_five);
        assert_eq!(w.today, DayOfWeek::Sunday);
        assert_eq!(w.start, date(2024, 5, 27));

        // while at UTC+2 it is already Monday the 3rd
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let w = resolve_week(utc(2024, 6, 3, 1), plus_two);
        assert_eq!(w.today, DayOfWeek::Monday);
        assert_eq!(w.start, date(2024, 6, 3));
    }
}
