pub mod calendar;
pub mod config;
pub mod counter;
pub mod expander;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod reference;
pub mod subject;
pub mod table;
pub mod timetable;
pub mod workbook;

pub use calendar::{DayMatch, WeekCalendar};
pub use config::{ConfigError, DayLabel, ExpansionConfig, MAX_WEEK};
pub use counter::LessonCounter;
pub use expander::{
    ExpansionDiagnostic, ExpansionOutcome, ExpansionSummary, RecurringScheduleExpander,
    ReferenceKind,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteWorkbookStore;
pub use persistence::{
    JsonFileStore, PersistenceError, PersistenceResult, WorkbookSnapshot, WorkbookStore,
    export_equipment_to_csv, export_schedule_to_csv, load_curriculum_from_csv,
    load_equipment_config_from_csv, load_timetable_from_csv, load_workbook_from_json,
    save_timetable_to_csv, save_workbook_to_json,
};
pub use reference::{
    CurriculumEntry, CurriculumTable, EquipmentConfigEntry, EquipmentTable, Lookup,
    ReferenceTable,
};
pub use subject::SubjectNormalizer;
pub use timetable::{EquipmentRow, ScheduleRow, TimetableSlot};
pub use workbook::{ApplyReport, Workbook, WorkbookError};
