#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use teaching_schedule::{
    CurriculumEntry, EquipmentConfigEntry, ExpansionConfig, PersistenceError,
    SqliteWorkbookStore, TimetableSlot, Workbook, WorkbookStore,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_workbook() -> Workbook {
    let config = ExpansionConfig::default().with_week_count(5);
    let mut workbook = Workbook::with_config(config, d(2025, 9, 1)).unwrap();
    workbook.set_timetable(vec![
        TimetableSlot::new("Thứ 2", 1, "Toán", "7A1").with_teacher("Cô Lan"),
        TimetableSlot::new("Thứ 4", 2, "Toán", "7A1").with_teacher("Cô Lan"),
        TimetableSlot::new("Thứ 3", 2, "Vật lý", "8B").with_teacher("Thầy Minh"),
    ]);
    workbook.set_curriculum(vec![
        CurriculumEntry::new("toán", "1", "Tập hợp"),
        CurriculumEntry::new("toán", "2", "Phần tử"),
    ]);
    workbook.set_equipment_config(vec![EquipmentConfigEntry::new("toán", "2", "Bảng phụ", "2")]);
    workbook.apply_all_teachers();
    workbook.select_teacher("Thầy Minh");
    workbook.change_week(3).unwrap();
    workbook
}

#[test]
fn sqlite_store_round_trip_workbook() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteWorkbookStore::new(file.path()).unwrap();
    assert!(store.load_workbook().unwrap().is_none());

    let workbook = sample_workbook();
    store.save_workbook(&workbook).unwrap();

    let reopened = SqliteWorkbookStore::new(file.path()).unwrap();
    let loaded = reopened.load_workbook().unwrap().expect("stored workbook");
    assert_eq!(loaded.config(), workbook.config());
    assert_eq!(loaded.timetable(), workbook.timetable());
    assert_eq!(loaded.curriculum(), workbook.curriculum());
    assert_eq!(loaded.equipment_config(), workbook.equipment_config());
    assert_eq!(loaded.schedule(), workbook.schedule());
    assert_eq!(loaded.equipment(), workbook.equipment());
    assert_eq!(loaded.teacher_name(), "Thầy Minh");
    assert_eq!(loaded.current_week(), 3);
    assert_eq!(loaded.view_date(), d(2025, 9, 15));
}

#[test]
fn saving_again_overwrites_previous_state() {
    let store = SqliteWorkbookStore::in_memory().unwrap();
    let mut workbook = sample_workbook();
    store.save_workbook(&workbook).unwrap();

    workbook.set_timetable(Vec::new());
    workbook.apply_template(&[], Some("Cô Lan"));
    store.save_workbook(&workbook).unwrap();

    let loaded = store.load_workbook().unwrap().unwrap();
    assert!(loaded.timetable().is_empty());
    assert_eq!(loaded.schedule().len(), 5);
    assert!(loaded.schedule().iter().all(|row| row.teacher_name == "Thầy Minh"));
}

#[test]
fn replace_teacher_rows_leaves_other_teachers_alone() {
    let store = SqliteWorkbookStore::in_memory().unwrap();
    let workbook = sample_workbook();
    store.save_workbook(&workbook).unwrap();

    let mut edited = workbook.clone();
    edited.apply_template(
        &[TimetableSlot::new("Thứ 6", 1, "Toán", "7A2")],
        Some("Cô Lan"),
    );
    let schedule: Vec<_> = edited
        .schedule()
        .iter()
        .filter(|row| row.teacher_name == "Cô Lan")
        .cloned()
        .collect();
    let equipment: Vec<_> = edited
        .equipment()
        .iter()
        .filter(|row| row.teacher_name == "Cô Lan")
        .cloned()
        .collect();
    store
        .replace_teacher_rows("Cô Lan", &schedule, &equipment)
        .unwrap();

    let loaded = store.load_workbook().unwrap().unwrap();
    let lan: Vec<_> = loaded
        .schedule()
        .iter()
        .filter(|row| row.teacher_name == "Cô Lan")
        .collect();
    assert_eq!(lan.len(), 5);
    assert!(lan.iter().all(|row| row.class_name == "7A2"));

    let minh_before: Vec<_> = workbook
        .schedule()
        .iter()
        .filter(|row| row.teacher_name == "Thầy Minh")
        .collect();
    let minh_after: Vec<_> = loaded
        .schedule()
        .iter()
        .filter(|row| row.teacher_name == "Thầy Minh")
        .collect();
    assert_eq!(minh_before, minh_after);
    assert_eq!(loaded.equipment().len(), 10);
}

#[test]
fn failed_replace_keeps_previous_rows() {
    let store = SqliteWorkbookStore::in_memory().unwrap();
    let workbook = sample_workbook();
    store.save_workbook(&workbook).unwrap();

    let mut rows: Vec<_> = workbook
        .schedule()
        .iter()
        .filter(|row| row.teacher_name == "Cô Lan")
        .cloned()
        .collect();
    let duplicate = rows[0].clone();
    rows.push(duplicate);
    let err = store.replace_teacher_rows("Cô Lan", &rows, &[]).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));

    let loaded = store.load_workbook().unwrap().unwrap();
    assert_eq!(loaded.schedule(), workbook.schedule());
    assert_eq!(loaded.equipment(), workbook.equipment());
}

#[test]
fn week_rows_are_read_per_teacher_and_week() {
    let store = SqliteWorkbookStore::in_memory().unwrap();
    let workbook = sample_workbook();
    store.save_workbook(&workbook).unwrap();

    let (schedule, equipment) = store.load_week_rows("Cô Lan", 2).unwrap();
    assert_eq!(schedule.len(), 2);
    assert_eq!(equipment.len(), 2);
    assert!(schedule.iter().all(|row| row.week == 2 && row.teacher_name == "Cô Lan"));
    let mut expected = workbook.week_schedule("Cô Lan", 2);
    let mut got = schedule.clone();
    expected.sort_by(|a, b| a.id.cmp(&b.id));
    got.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(got, expected);

    let (schedule, equipment) = store.load_week_rows("Cô Lan", 6).unwrap();
    assert!(schedule.is_empty());
    assert!(equipment.is_empty());
}
