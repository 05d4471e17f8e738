//! End-to-end enumeration scenarios.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use recurrence_engine::{
    Calendar, Direction, Enumerator, Gregorian, Pattern, PatternBuilder, RecurrenceError,
};

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn collect(builder: PatternBuilder) -> Vec<NaiveDateTime> {
    Enumerator::new(builder.build().unwrap())
        .unwrap()
        .collect()
        .unwrap()
        .into_iter()
        .map(|o| o.date_time)
        .collect()
}

fn anniversary(direction: Direction) -> PatternBuilder {
    Pattern::builder(dt(2018, 9, 4, 11, 6), 2)
        .direction(direction)
        .month(9)
        .day(4)
        .hour(11)
        .minute(6)
}

#[test_log::test]
fn test_yearly_anniversary_forward() {
    let dates = collect(anniversary(Direction::Forward));
    assert_eq!(dates, vec![dt(2018, 9, 4, 11, 6), dt(2019, 9, 4, 11, 6)]);
}

#[test_log::test]
fn test_yearly_anniversary_backward() {
    let dates = collect(anniversary(Direction::Backward));
    assert_eq!(dates, vec![dt(2018, 9, 4, 11, 6), dt(2017, 9, 4, 11, 6)]);
}

#[test_log::test]
fn test_mondays_in_september_2018() {
    let dates = collect(
        Pattern::builder(dt(2018, 9, 4, 11, 6), 5)
            .year(2018)
            .month(9)
            .minute(30)
            .weekday(1),
    );
    assert_eq!(dates.len(), 5);
    for (i, date) in dates.iter().enumerate() {
        assert_eq!(date.weekday(), Weekday::Mon);
        assert_eq!(date.minute(), 30);
        assert!(*date >= dt(2018, 9, 4, 0, 0));
        assert!(*date <= dt(2018, 9, 30, 23, 59));
        if i > 0 {
            assert!(dates[i - 1] < *date);
        }
    }
    assert_eq!(dates[0], dt(2018, 9, 10, 0, 30));
    assert_eq!(dates[4], dt(2018, 9, 10, 4, 30));
}

#[test_log::test]
fn test_second_week_of_september() {
    let dates = collect(
        Pattern::builder(dt(2018, 9, 14, 11, 6), 16)
            .month(9)
            .hour(1)
            .minute(30)
            .week_of_month(2),
    );
    assert_eq!(dates.len(), 16);
    assert_eq!(dates[0], dt(2018, 9, 15, 1, 30));
    assert_eq!(dates[1], dt(2018, 9, 16, 1, 30));
    assert_eq!(dates[2], dt(2019, 9, 9, 1, 30));
    assert_eq!(dates[9], dt(2020, 9, 7, 1, 30));
    for date in &dates {
        assert_eq!(date.month(), 9);
        assert_eq!((date.hour(), date.minute()), (1, 30));
        assert_eq!(Gregorian.week_of_month(*date), 2, "{date}");
    }
}

#[test_log::test]
fn test_february_thirty_first_is_rejected() {
    let pattern = Pattern::builder(dt(2018, 9, 4, 11, 6), 5)
        .month(2)
        .day(31)
        .build()
        .unwrap();
    let err = Enumerator::new(pattern).unwrap_err();
    assert!(matches!(err, RecurrenceError::InvalidCalendarValue(_)));
    assert!(err.to_string().contains("02-31"), "got: {err}");
}

#[test_log::test]
fn test_second_monday_every_month() {
    let dates = collect(
        Pattern::builder(dt(2018, 9, 4, 11, 6), 12)
            .hour(1)
            .minute(30)
            .weekday(1)
            .weekday_ordinal(2),
    );
    assert_eq!(dates.len(), 12);
    assert_eq!(dates[0], dt(2018, 9, 10, 1, 30));
    assert_eq!(dates[1], dt(2018, 10, 8, 1, 30));
    for date in &dates {
        assert_eq!(date.weekday(), Weekday::Mon);
        assert_eq!((date.day() - 1) / 7 + 1, 2, "{date}");
    }
}

#[test_log::test]
fn test_pattern_from_json_drives_enumeration() {
    let pattern = Pattern::from_json(
        r#"{
            "origin": "2018-09-04T11:06:00",
            "direction": "backward",
            "month": 9,
            "day": 4,
            "hour": 11,
            "minute": 6,
            "max_matches": 3
        }"#,
    )
    .unwrap();
    let occurrences = Enumerator::new(pattern).unwrap().collect().unwrap();
    let years: Vec<i32> = occurrences.iter().map(|o| o.date_time.year()).collect();
    assert_eq!(years, vec![2018, 2017, 2016]);

    let json = serde_json::to_string(&occurrences[1]).unwrap();
    assert_eq!(json, r#"{"sequence":2,"date_time":"2017-09-04T11:06:00"}"#);
}
