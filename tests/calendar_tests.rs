use chrono::{Datelike, NaiveDate, Weekday};
use teaching_schedule::calendar::{
    WeekCalendar, parse_iso, resolve_slot_date, resolve_week_start, shift_view_date, week1_anchor,
};
use teaching_schedule::{DayLabel, DayMatch, ExpansionConfig};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn thursday_slot_lands_on_the_thursday_of_each_week() {
    let cal = WeekCalendar::default();
    let week1 = d(2025, 9, 1);
    let idx = cal.day_index("Thursday");
    assert_eq!(idx, 3);

    let week1_date = resolve_slot_date(resolve_week_start(week1, 1).unwrap(), idx).unwrap();
    let week2_date = resolve_slot_date(resolve_week_start(week1, 2).unwrap(), idx).unwrap();
    assert_eq!(week1_date, d(2025, 9, 4));
    assert_eq!(week2_date, d(2025, 9, 11));
    assert_eq!(week2_date.weekday(), Weekday::Thu);
}

#[test]
fn week_start_moves_by_whole_weeks() {
    let week1 = d(2025, 9, 1);
    assert_eq!(resolve_week_start(week1, 1), Some(week1));
    assert_eq!(resolve_week_start(week1, 35), Some(d(2026, 4, 27)));
}

#[test]
fn week_arithmetic_past_the_date_range_is_none() {
    assert_eq!(resolve_week_start(NaiveDate::MAX, 2), None);
    assert_eq!(resolve_slot_date(NaiveDate::MAX, 3), None);
    assert_eq!(shift_view_date(d(2025, 9, 1), 1, u32::MAX), None);
    assert_eq!(week1_anchor(NaiveDate::MIN, 2), None);
    assert_eq!(resolve_week_start(d(2025, 9, 1), u32::MAX), None);
}

#[test]
fn vietnamese_and_english_labels_share_an_index() {
    let cal = WeekCalendar::default();
    assert_eq!(cal.day_index("Thứ 2"), 0);
    assert_eq!(cal.day_index("Monday"), 0);
    assert_eq!(cal.day_index("thứ 5"), 3);
    assert_eq!(cal.day_index("Thứ 7"), 5);
    assert_eq!(cal.day_index("Chủ Nhật"), 6);
    assert_eq!(cal.day_index("sun"), 6);
}

#[test]
fn label_with_extra_text_still_matches() {
    let cal = WeekCalendar::default();
    match cal.match_day("Thứ 3 (sáng)") {
        DayMatch::Canonical { index, label } => {
            assert_eq!(index, 1);
            assert_eq!(label, "Thứ 3");
        }
        DayMatch::Unmatched => panic!("expected a match"),
    }
    assert_eq!(cal.display_label("thursday"), "Thứ 5");
}

#[test]
fn unmatched_label_falls_back_to_monday_and_keeps_its_text() {
    let cal = WeekCalendar::default();
    let matched = cal.match_day("Someday");
    assert!(!matched.is_matched());
    assert_eq!(matched.index(), 0);
    assert_eq!(cal.display_label("Someday"), "Someday");
}

#[test]
fn custom_labels_come_from_config() {
    let mut config = ExpansionConfig::default();
    config.day_labels = ["Lun", "Mar", "Mer", "Jeu", "Ven", "Sam", "Dim"]
        .into_iter()
        .map(|label| DayLabel::new(label, Vec::<String>::new()))
        .collect();
    let cal = WeekCalendar::from_config(&config);
    assert_eq!(cal.day_index("Jeu"), 3);
    assert!(!cal.match_day("Thursday").is_matched());
    assert_eq!(cal.display_label("ven"), "Ven");
    assert_eq!(cal.display_label("Friday"), "Friday");
}

#[test]
fn anchor_is_stable_while_navigating_weeks() {
    let view = d(2025, 9, 24);
    let anchor = week1_anchor(view, 4).unwrap();
    assert_eq!(anchor, d(2025, 9, 3));

    let moved = shift_view_date(view, 4, 10).unwrap();
    assert_eq!(moved, d(2025, 11, 5));
    assert_eq!(week1_anchor(moved, 10), Some(anchor));

    let back = shift_view_date(moved, 10, 1);
    assert_eq!(back, Some(anchor));
}

#[test]
fn anchor_for_week_one_is_the_view_date() {
    let view = d(2025, 9, 1);
    assert_eq!(week1_anchor(view, 1), Some(view));
}

#[test]
fn iso_dates_parse_with_surrounding_whitespace() {
    assert_eq!(parse_iso(" 2025-09-01 "), Some(d(2025, 9, 1)));
    assert_eq!(parse_iso("01/09/2025"), None);
}
