use crate::calendar;
use crate::config::{ConfigError, ExpansionConfig, MAX_WEEK};
use crate::expander::{ExpansionDiagnostic, ExpansionSummary, RecurringScheduleExpander};
use crate::reference::{CurriculumEntry, CurriculumTable, EquipmentConfigEntry, EquipmentTable};
use crate::subject::SubjectNormalizer;
use crate::timetable::{EquipmentRow, ScheduleRow, TimetableSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("week {0} is out of range (weeks run from 1 to {max})", max = MAX_WEEK)]
    InvalidWeek(u32),
    #[error("date {0} is too close to the limits of the calendar")]
    DateOutOfRange(NaiveDate),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a template application did, for the caller to report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub summaries: Vec<ExpansionSummary>,
    pub diagnostics: Vec<ExpansionDiagnostic>,
}

impl ApplyReport {
    pub fn is_applied(&self) -> bool {
        !self.summaries.is_empty()
    }

    pub fn to_cli_summary(&self) -> String {
        if self.summaries.is_empty() {
            return "nothing applied".to_string();
        }
        let mut parts: Vec<String> = self
            .summaries
            .iter()
            .map(ExpansionSummary::to_cli_summary)
            .collect();
        if !self.diagnostics.is_empty() {
            parts.push(format!("warnings={}", self.diagnostics.len()));
        }
        parts.join("; ")
    }
}

/// In-memory application state: the reference tables, the timetable template, the generated
/// rows of every teacher and the editor's current position.
#[derive(Debug, Clone)]
pub struct Workbook {
    config: ExpansionConfig,
    timetable: Vec<TimetableSlot>,
    curriculum: CurriculumTable,
    equipment_config: EquipmentTable,
    schedule: Vec<ScheduleRow>,
    equipment: Vec<EquipmentRow>,
    teacher_name: String,
    current_week: u32,
    view_date: NaiveDate,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

impl Workbook {
    pub fn new(view_date: NaiveDate) -> Self {
        Self {
            config: ExpansionConfig::default(),
            timetable: Vec::new(),
            curriculum: CurriculumTable::default(),
            equipment_config: EquipmentTable::default(),
            schedule: Vec::new(),
            equipment: Vec::new(),
            teacher_name: String::new(),
            current_week: 1,
            view_date,
        }
    }

    pub fn with_config(config: ExpansionConfig, view_date: NaiveDate) -> Result<Self, WorkbookError> {
        config.validate()?;
        let mut workbook = Self::new(view_date);
        workbook.config = config;
        Ok(workbook)
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ExpansionConfig) -> Result<(), WorkbookError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn timetable(&self) -> &[TimetableSlot] {
        &self.timetable
    }

    pub fn set_timetable(&mut self, slots: Vec<TimetableSlot>) {
        self.timetable = slots;
    }

    pub fn add_slot(&mut self, slot: TimetableSlot) {
        self.timetable.push(slot);
    }

    pub fn curriculum(&self) -> &CurriculumTable {
        &self.curriculum
    }

    pub fn set_curriculum(&mut self, entries: Vec<CurriculumEntry>) {
        self.curriculum = CurriculumTable::new(entries);
    }

    pub fn equipment_config(&self) -> &EquipmentTable {
        &self.equipment_config
    }

    pub fn set_equipment_config(&mut self, entries: Vec<EquipmentConfigEntry>) {
        self.equipment_config = EquipmentTable::new(entries);
    }

    pub fn schedule(&self) -> &[ScheduleRow] {
        &self.schedule
    }

    pub fn equipment(&self) -> &[EquipmentRow] {
        &self.equipment
    }

    pub fn teacher_name(&self) -> &str {
        &self.teacher_name
    }

    pub fn set_teacher_name(&mut self, name: impl Into<String>) {
        self.teacher_name = name.into();
    }

    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    pub fn view_date(&self) -> NaiveDate {
        self.view_date
    }

    /// Sets the date shown for the current week. Rejected when week 1 would fall before the
    /// earliest representable date.
    pub fn set_view_date(&mut self, date: NaiveDate) -> Result<(), WorkbookError> {
        if calendar::week1_anchor(date, self.current_week).is_none() {
            return Err(WorkbookError::DateOutOfRange(date));
        }
        self.view_date = date;
        Ok(())
    }

    pub fn week1_anchor(&self) -> NaiveDate {
        // set_view_date, change_week and set_position only store positions with an anchor
        calendar::week1_anchor(self.view_date, self.current_week).unwrap_or(self.view_date)
    }

    /// Navigates to `new_week`, moving the viewed date by the same number of weeks.
    pub fn change_week(&mut self, new_week: u32) -> Result<(), WorkbookError> {
        if new_week == 0 || new_week > MAX_WEEK {
            return Err(WorkbookError::InvalidWeek(new_week));
        }
        if new_week != self.current_week {
            self.view_date = calendar::shift_view_date(self.view_date, self.current_week, new_week)
                .ok_or(WorkbookError::InvalidWeek(new_week))?;
        }
        self.current_week = new_week;
        Ok(())
    }

    /// Replays `slots` over the configured weeks for `target_teacher`, falling back to the selected
    /// teacher. Without any teacher name nothing changes.
    pub fn apply_template(
        &mut self,
        slots: &[TimetableSlot],
        target_teacher: Option<&str>,
    ) -> ApplyReport {
        let teacher = target_teacher
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.teacher_name.as_str())
            .to_string();
        if teacher.trim().is_empty() {
            return ApplyReport::default();
        }

        let week1 = self.week1_anchor();
        let schedule = std::mem::take(&mut self.schedule);
        let equipment = std::mem::take(&mut self.equipment);
        let expander =
            RecurringScheduleExpander::new(&self.config, &self.curriculum, &self.equipment_config);
        let outcome = expander.expand(slots, &teacher, week1, schedule, equipment);

        self.schedule = outcome.schedule;
        self.equipment = outcome.equipment;
        self.teacher_name = teacher;
        ApplyReport {
            summaries: outcome.summaries,
            diagnostics: outcome.diagnostics,
        }
    }

    /// Slots of the stored timetable taught by `teacher` (case-insensitive).
    pub fn slots_for_teacher(&self, teacher: &str) -> Vec<TimetableSlot> {
        self.timetable
            .iter()
            .filter(|slot| slot.taught_by(teacher))
            .cloned()
            .collect()
    }

    /// Selects a teacher; a teacher without generated rows gets their stored timetable applied.
    pub fn select_teacher(&mut self, name: &str) -> ApplyReport {
        self.teacher_name = name.to_string();
        let has_rows = self.schedule.iter().any(|row| row.teacher_name == name);
        if has_rows {
            return ApplyReport::default();
        }
        let slots = self.slots_for_teacher(name);
        if slots.is_empty() {
            return ApplyReport::default();
        }
        self.apply_template(&slots, Some(name))
    }

    /// Distinct teacher names of the stored timetable, compared case-insensitively, sorted.
    pub fn teachers(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for name in self.timetable.iter().filter_map(|slot| slot.teacher_name.as_deref()) {
            if name.trim().is_empty() {
                continue;
            }
            if seen.insert(name.to_lowercase()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        names
    }

    /// Expands every teacher of the stored timetable in one pass.
    pub fn apply_all_teachers(&mut self) -> ApplyReport {
        let groups: Vec<(String, Vec<TimetableSlot>)> = self
            .teachers()
            .into_iter()
            .map(|teacher| {
                let slots = self.slots_for_teacher(&teacher);
                (teacher, slots)
            })
            .collect();
        if groups.is_empty() {
            return ApplyReport::default();
        }

        let week1 = self.week1_anchor();
        let schedule = std::mem::take(&mut self.schedule);
        let equipment = std::mem::take(&mut self.equipment);
        let expander =
            RecurringScheduleExpander::new(&self.config, &self.curriculum, &self.equipment_config);
        let outcome = expander.expand_teachers(&groups, week1, schedule, equipment);

        self.schedule = outcome.schedule;
        self.equipment = outcome.equipment;
        ApplyReport {
            summaries: outcome.summaries,
            diagnostics: outcome.diagnostics,
        }
    }

    /// Grade-qualified subjects a teacher teaches, sorted and deduplicated.
    pub fn teacher_subjects(&self, teacher: &str) -> Vec<String> {
        if teacher.is_empty() {
            return Vec::new();
        }
        let normalizer = SubjectNormalizer::from_config(&self.config);
        self.timetable
            .iter()
            .filter(|slot| slot.taught_by(teacher))
            .map(|slot| normalizer.normalize(&slot.subject, &slot.class_name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows of one teacher and week, in day then period order.
    pub fn week_schedule(&self, teacher: &str, week: u32) -> Vec<ScheduleRow> {
        let mut rows: Vec<ScheduleRow> = self
            .schedule
            .iter()
            .filter(|row| row.teacher_name == teacher && row.week == week)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.date, row.period));
        rows
    }

    pub fn week_equipment(&self, teacher: &str, week: u32) -> Vec<EquipmentRow> {
        let mut rows: Vec<EquipmentRow> = self
            .equipment
            .iter()
            .filter(|row| row.teacher_name == teacher && row.week == week)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.date, row.period));
        rows
    }

    /// Replaces the selected teacher's rows for the current week with edited rows.
    pub fn replace_week_schedule(&mut self, rows: Vec<ScheduleRow>) {
        let (teacher, week) = (self.teacher_name.clone(), self.current_week);
        self.schedule
            .retain(|row| row.teacher_name != teacher || row.week != week);
        self.schedule.extend(rows);
    }

    pub fn replace_week_equipment(&mut self, rows: Vec<EquipmentRow>) {
        let (teacher, week) = (self.teacher_name.clone(), self.current_week);
        self.equipment
            .retain(|row| row.teacher_name != teacher || row.week != week);
        self.equipment.extend(rows);
    }

    pub fn delete_schedule_row(&mut self, id: &str) -> bool {
        let before = self.schedule.len();
        self.schedule.retain(|row| row.id != id);
        self.schedule.len() != before
    }

    pub fn delete_equipment_row(&mut self, id: &str) -> bool {
        let before = self.equipment.len();
        self.equipment.retain(|row| row.id != id);
        self.equipment.len() != before
    }

    /// Replaces the stored rows wholesale; used when loading from a store.
    pub(crate) fn set_rows(&mut self, schedule: Vec<ScheduleRow>, equipment: Vec<EquipmentRow>) {
        self.schedule = schedule;
        self.equipment = equipment;
    }

    pub(crate) fn set_position(
        &mut self,
        current_week: u32,
        view_date: NaiveDate,
    ) -> Result<(), WorkbookError> {
        if current_week == 0 || current_week > MAX_WEEK {
            return Err(WorkbookError::InvalidWeek(current_week));
        }
        if calendar::week1_anchor(view_date, current_week).is_none() {
            return Err(WorkbookError::DateOutOfRange(view_date));
        }
        self.current_week = current_week;
        self.view_date = view_date;
        Ok(())
    }
}
