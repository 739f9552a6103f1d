use crate::config::ExpansionConfig;
use crate::reference::{CurriculumEntry, EquipmentConfigEntry};
use crate::timetable::{EquipmentRow, ScheduleRow, TimetableSlot};
use crate::workbook::Workbook;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no workbook stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage for the whole workbook, one typed operation per concern.
///
/// `replace_teacher_rows` must swap a teacher's rows in one atomic step: readers see either the
/// previous rows or the new ones, never a mix.
pub trait WorkbookStore {
    fn save_workbook(&self, workbook: &Workbook) -> PersistenceResult<()>;
    fn load_workbook(&self) -> PersistenceResult<Option<Workbook>>;
    fn replace_teacher_rows(
        &self,
        teacher_name: &str,
        schedule: &[ScheduleRow],
        equipment: &[EquipmentRow],
    ) -> PersistenceResult<()>;
}

/// Serializable form of a [`Workbook`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSnapshot {
    #[serde(default)]
    pub config: ExpansionConfig,
    #[serde(default)]
    pub timetable: Vec<TimetableSlot>,
    #[serde(default)]
    pub curriculum: Vec<CurriculumEntry>,
    #[serde(default)]
    pub equipment_config: Vec<EquipmentConfigEntry>,
    #[serde(default)]
    pub schedule: Vec<ScheduleRow>,
    #[serde(default)]
    pub equipment: Vec<EquipmentRow>,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default = "first_week")]
    pub current_week: u32,
    pub view_date: NaiveDate,
}

fn first_week() -> u32 {
    1
}

impl WorkbookSnapshot {
    pub fn from_workbook(workbook: &Workbook) -> PersistenceResult<Self> {
        validate_rows(workbook.schedule(), workbook.equipment())?;
        Ok(Self {
            config: workbook.config().clone(),
            timetable: workbook.timetable().to_vec(),
            curriculum: workbook.curriculum().entries().to_vec(),
            equipment_config: workbook.equipment_config().entries().to_vec(),
            schedule: workbook.schedule().to_vec(),
            equipment: workbook.equipment().to_vec(),
            teacher_name: workbook.teacher_name().to_string(),
            current_week: workbook.current_week(),
            view_date: workbook.view_date(),
        })
    }

    pub fn into_workbook(self) -> PersistenceResult<Workbook> {
        validate_rows(&self.schedule, &self.equipment)?;
        let mut workbook = Workbook::with_config(self.config, self.view_date)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        workbook.set_timetable(self.timetable);
        workbook.set_curriculum(self.curriculum);
        workbook.set_equipment_config(self.equipment_config);
        workbook.set_rows(self.schedule, self.equipment);
        workbook.set_teacher_name(self.teacher_name);
        workbook
            .set_position(self.current_week, self.view_date)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        Ok(workbook)
    }

    /// Drops every row of `teacher_name` and appends the replacements.
    pub fn replace_teacher_rows(
        &mut self,
        teacher_name: &str,
        schedule: &[ScheduleRow],
        equipment: &[EquipmentRow],
    ) -> PersistenceResult<()> {
        ensure_rows_belong_to(teacher_name, schedule, equipment)?;
        self.schedule.retain(|row| row.teacher_name != teacher_name);
        self.equipment.retain(|row| row.teacher_name != teacher_name);
        self.schedule.extend_from_slice(schedule);
        self.equipment.extend_from_slice(equipment);
        validate_rows(&self.schedule, &self.equipment)
    }
}

/// Rows handed to a per-teacher replace must all carry that teacher's name.
pub fn ensure_rows_belong_to(
    teacher_name: &str,
    schedule: &[ScheduleRow],
    equipment: &[EquipmentRow],
) -> PersistenceResult<()> {
    if let Some(row) = schedule.iter().find(|row| row.teacher_name != teacher_name) {
        return Err(PersistenceError::InvalidData(format!(
            "schedule row {} belongs to '{}', not '{teacher_name}'",
            row.id, row.teacher_name
        )));
    }
    if let Some(row) = equipment.iter().find(|row| row.teacher_name != teacher_name) {
        return Err(PersistenceError::InvalidData(format!(
            "equipment row {} belongs to '{}', not '{teacher_name}'",
            row.id, row.teacher_name
        )));
    }
    Ok(())
}

pub fn validate_rows(schedule: &[ScheduleRow], equipment: &[EquipmentRow]) -> PersistenceResult<()> {
    let mut seen = HashSet::with_capacity(schedule.len());
    for row in schedule {
        if row.week == 0 {
            return Err(PersistenceError::InvalidData(format!(
                "schedule row {} has week 0",
                row.id
            )));
        }
        if !seen.insert(row.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate schedule row id {}",
                row.id
            )));
        }
    }

    let mut seen = HashSet::with_capacity(equipment.len());
    for row in equipment {
        if row.week == 0 {
            return Err(PersistenceError::InvalidData(format!(
                "equipment row {} has week 0",
                row.id
            )));
        }
        if !seen.insert(row.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate equipment row id {}",
                row.id
            )));
        }
    }
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonFileStore, export_equipment_to_csv, export_schedule_to_csv, load_curriculum_from_csv,
    load_equipment_config_from_csv, load_timetable_from_csv, load_workbook_from_json,
    save_timetable_to_csv, save_workbook_to_json,
};
