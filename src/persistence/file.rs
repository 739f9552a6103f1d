use super::{PersistenceError, PersistenceResult, WorkbookSnapshot, WorkbookStore};
use crate::Workbook;
use crate::reference::{CurriculumEntry, EquipmentConfigEntry};
use crate::timetable::{EquipmentRow, ScheduleRow, TimetableSlot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub fn save_workbook_to_json<P: AsRef<Path>>(workbook: &Workbook, path: P) -> PersistenceResult<()> {
    let snapshot = WorkbookSnapshot::from_workbook(workbook)?;
    write_snapshot(&snapshot, path.as_ref())
}

pub fn load_workbook_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Workbook> {
    read_snapshot(path.as_ref())?.into_workbook()
}

fn read_snapshot(path: &Path) -> PersistenceResult<WorkbookSnapshot> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// Writes next to the target and renames over it, so a crash never leaves half a file.
fn write_snapshot(snapshot: &WorkbookSnapshot, path: &Path) -> PersistenceResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let file = File::create(&tmp)?;
        serde_json::to_writer_pretty(file, snapshot)?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Workbook kept as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl WorkbookStore for JsonFileStore {
    fn save_workbook(&self, workbook: &Workbook) -> PersistenceResult<()> {
        save_workbook_to_json(workbook, &self.path)
    }

    fn load_workbook(&self) -> PersistenceResult<Option<Workbook>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_workbook_from_json(&self.path).map(Some)
    }

    fn replace_teacher_rows(
        &self,
        teacher_name: &str,
        schedule: &[ScheduleRow],
        equipment: &[EquipmentRow],
    ) -> PersistenceResult<()> {
        if !self.path.exists() {
            return Err(PersistenceError::NotFound);
        }
        let mut snapshot = read_snapshot(&self.path)?;
        snapshot.replace_teacher_rows(teacher_name, schedule, equipment)?;
        write_snapshot(&snapshot, &self.path)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TimetableCsvRecord {
    day: String,
    period: u32,
    subject: String,
    class: String,
    #[serde(default)]
    teacher: String,
}

impl From<&TimetableSlot> for TimetableCsvRecord {
    fn from(slot: &TimetableSlot) -> Self {
        Self {
            day: slot.day_of_week.clone(),
            period: slot.period,
            subject: slot.subject.clone(),
            class: slot.class_name.clone(),
            teacher: slot.teacher_name.clone().unwrap_or_default(),
        }
    }
}

impl TimetableCsvRecord {
    fn into_slot(self) -> PersistenceResult<TimetableSlot> {
        if self.subject.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "timetable row '{} period {}' has no subject",
                self.day, self.period
            )));
        }
        let mut slot = TimetableSlot::new(self.day, self.period, self.subject, self.class);
        if !self.teacher.trim().is_empty() {
            slot.teacher_name = Some(self.teacher);
        }
        Ok(slot)
    }
}

#[derive(Debug, Deserialize)]
struct CurriculumCsvRecord {
    subject: String,
    lesson_number: String,
    #[serde(default)]
    lesson_name: String,
}

#[derive(Debug, Deserialize)]
struct EquipmentConfigCsvRecord {
    subject: String,
    lesson_number: String,
    #[serde(default)]
    equipment_name: String,
    #[serde(default)]
    quantity: String,
}

fn read_csv<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize::<T>() {
        records.push(record?);
    }
    Ok(records)
}

fn require_lesson_number(subject: &str, lesson_number: &str) -> PersistenceResult<()> {
    if lesson_number.is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "reference row for '{subject}' has no lesson number"
        )));
    }
    Ok(())
}

/// Columns: `day,period,subject,class,teacher` (teacher optional).
pub fn load_timetable_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<TimetableSlot>> {
    read_csv::<TimetableCsvRecord, _>(path)?
        .into_iter()
        .map(TimetableCsvRecord::into_slot)
        .collect()
}

pub fn save_timetable_to_csv<P: AsRef<Path>>(
    slots: &[TimetableSlot],
    path: P,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for slot in slots {
        writer.serialize(TimetableCsvRecord::from(slot))?;
    }
    writer.flush()?;
    Ok(())
}

/// Columns: `subject,lesson_number,lesson_name`.
pub fn load_curriculum_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<CurriculumEntry>> {
    read_csv::<CurriculumCsvRecord, _>(path)?
        .into_iter()
        .map(|record| {
            require_lesson_number(&record.subject, &record.lesson_number)?;
            Ok(CurriculumEntry::new(
                record.subject,
                record.lesson_number,
                record.lesson_name,
            ))
        })
        .collect()
}

/// Columns: `subject,lesson_number,equipment_name,quantity`.
pub fn load_equipment_config_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<EquipmentConfigEntry>> {
    read_csv::<EquipmentConfigCsvRecord, _>(path)?
        .into_iter()
        .map(|record| {
            require_lesson_number(&record.subject, &record.lesson_number)?;
            Ok(EquipmentConfigEntry::new(
                record.subject,
                record.lesson_number,
                record.equipment_name,
                record.quantity,
            ))
        })
        .collect()
}

pub fn export_schedule_to_csv<P: AsRef<Path>>(rows: &[ScheduleRow], path: P) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_equipment_to_csv<P: AsRef<Path>>(
    rows: &[EquipmentRow],
    path: P,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
