use crate::calendar::{self, DayMatch, WeekCalendar};
use crate::config::ExpansionConfig;
use crate::counter::LessonCounter;
use crate::reference::{CurriculumTable, EquipmentTable, Lookup};
use crate::subject::SubjectNormalizer;
use crate::timetable::{EquipmentRow, ScheduleRow, TimetableSlot, new_row_id};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Curriculum,
    Equipment,
}

/// Non-fatal observations made while expanding; the rows are produced regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpansionDiagnostic {
    UnmatchedDayLabel {
        day_of_week: String,
    },
    /// Generation stopped at `week` because its dates fall outside the calendar.
    DateOutOfRange {
        week: u32,
    },
    AmbiguousReference {
        table: ReferenceKind,
        subject: String,
        lesson_number: String,
        extra_matches: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSummary {
    pub teacher_name: String,
    pub first_week: u32,
    pub last_week: u32,
    pub generated_rows: usize,
    pub replaced_rows: usize,
}

impl ExpansionSummary {
    pub fn to_cli_summary(&self) -> String {
        format!(
            "teacher={}, weeks={}-{}, rows={}, replaced={}",
            self.teacher_name,
            self.first_week,
            self.last_week,
            self.generated_rows,
            self.replaced_rows
        )
    }
}

/// Rows generated for one teacher, before they are merged into the full row sets.
#[derive(Debug, Clone, Default)]
pub struct GeneratedRows {
    pub schedule: Vec<ScheduleRow>,
    pub equipment: Vec<EquipmentRow>,
    pub diagnostics: Vec<ExpansionDiagnostic>,
}

/// Full replacement row sets. `summaries` is empty when nothing was applied.
#[derive(Debug, Clone, Default)]
pub struct ExpansionOutcome {
    pub schedule: Vec<ScheduleRow>,
    pub equipment: Vec<EquipmentRow>,
    pub summaries: Vec<ExpansionSummary>,
    pub diagnostics: Vec<ExpansionDiagnostic>,
}

impl ExpansionOutcome {
    fn unchanged(schedule: Vec<ScheduleRow>, equipment: Vec<EquipmentRow>) -> Self {
        Self {
            schedule,
            equipment,
            summaries: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        !self.summaries.is_empty()
    }

    pub fn summary(&self) -> Option<&ExpansionSummary> {
        self.summaries.first()
    }
}

/// Replays one week of timetable slots across the configured week window.
pub struct RecurringScheduleExpander<'a> {
    config: &'a ExpansionConfig,
    calendar: WeekCalendar,
    normalizer: SubjectNormalizer,
    curriculum: &'a CurriculumTable,
    equipment: &'a EquipmentTable,
}

impl<'a> RecurringScheduleExpander<'a> {
    pub fn new(
        config: &'a ExpansionConfig,
        curriculum: &'a CurriculumTable,
        equipment: &'a EquipmentTable,
    ) -> Self {
        Self {
            config,
            calendar: WeekCalendar::from_config(config),
            normalizer: SubjectNormalizer::from_config(config),
            curriculum,
            equipment,
        }
    }

    /// Slots ordered by (weekday, period). Lesson numbering follows this order, so it never
    /// depends on how the template happened to be entered. Slots with an unrecognised day come
    /// before every Monday slot.
    pub fn sort_slots(&self, slots: &[TimetableSlot]) -> Vec<TimetableSlot> {
        let mut sorted = slots.to_vec();
        sorted.sort_by_key(|slot| {
            let day = self.calendar.match_day(&slot.day_of_week);
            (day.is_matched(), day.index(), slot.period)
        });
        sorted
    }

    /// Generates the rows of every configured week for `teacher_name`.
    pub fn generate(
        &self,
        slots: &[TimetableSlot],
        teacher_name: &str,
        week1_monday: NaiveDate,
    ) -> GeneratedRows {
        let sorted = self.sort_slots(slots);
        let mut generated = GeneratedRows::default();
        let capacity = sorted.len() * self.config.week_count as usize;
        generated.schedule.reserve(capacity);
        generated.equipment.reserve(capacity);

        let mut reported_days = HashSet::new();
        for slot in &sorted {
            if !self.calendar.match_day(&slot.day_of_week).is_matched()
                && reported_days.insert(slot.day_of_week.clone())
            {
                tracing::warn!(
                    day_of_week = %slot.day_of_week,
                    "unrecognised day label, using the first day of the week"
                );
                generated
                    .diagnostics
                    .push(ExpansionDiagnostic::UnmatchedDayLabel {
                        day_of_week: slot.day_of_week.clone(),
                    });
            }
        }

        let mut counter = LessonCounter::new();
        'weeks: for week in self.config.weeks() {
            for slot in &sorted {
                let day = self.calendar.match_day(&slot.day_of_week);
                let date = calendar::resolve_week_start(week1_monday, week)
                    .and_then(|start| calendar::resolve_slot_date(start, day.index()));
                let Some(date) = date else {
                    tracing::warn!(week, %week1_monday, "week dates out of range, stopping");
                    generated
                        .diagnostics
                        .push(ExpansionDiagnostic::DateOutOfRange { week });
                    break 'weeks;
                };
                let day_of_week = match day {
                    DayMatch::Canonical { label, .. } => label.to_string(),
                    DayMatch::Unmatched => slot.day_of_week.clone(),
                };
                let ppct_number = counter
                    .next_for(&slot.subject, &slot.class_name)
                    .to_string();
                let subject = self.normalizer.normalize(&slot.subject, &slot.class_name);

                let lesson = self.curriculum.lookup(&subject, &ppct_number);
                self.note_lookup(
                    &mut generated.diagnostics,
                    ReferenceKind::Curriculum,
                    &subject,
                    &ppct_number,
                    &lesson,
                );
                let row = ScheduleRow {
                    id: new_row_id(),
                    week,
                    day_of_week,
                    date,
                    period: slot.period,
                    subject,
                    class_name: slot.class_name.clone(),
                    ppct_number,
                    lesson_name: lesson
                        .entry()
                        .map(|entry| entry.lesson_name.clone())
                        .unwrap_or_default(),
                    notes: String::new(),
                    teacher_name: teacher_name.to_string(),
                };

                let equipment = self.equipment.lookup(&row.subject, &row.ppct_number);
                self.note_lookup(
                    &mut generated.diagnostics,
                    ReferenceKind::Equipment,
                    &row.subject,
                    &row.ppct_number,
                    &equipment,
                );
                let equipment_row = match equipment.entry() {
                    Some(entry) => EquipmentRow::for_schedule_row(
                        &row,
                        entry.equipment_name.clone(),
                        entry.effective_quantity(),
                    ),
                    None => EquipmentRow::for_schedule_row(&row, "", ""),
                };

                generated.schedule.push(row);
                generated.equipment.push(equipment_row);
            }
        }
        generated
    }

    fn note_lookup<T>(
        &self,
        diagnostics: &mut Vec<ExpansionDiagnostic>,
        table: ReferenceKind,
        subject: &str,
        lesson_number: &str,
        lookup: &Lookup<'_, T>,
    ) {
        match lookup {
            Lookup::Match { ambiguous_with, .. } if *ambiguous_with > 0 => {
                tracing::warn!(
                    ?table,
                    subject,
                    lesson_number,
                    extra_matches = *ambiguous_with,
                    "several reference entries match, using the first"
                );
                diagnostics.push(ExpansionDiagnostic::AmbiguousReference {
                    table,
                    subject: subject.to_string(),
                    lesson_number: lesson_number.to_string(),
                    extra_matches: *ambiguous_with,
                });
            }
            Lookup::Match { .. } => {}
            Lookup::NoMatch => {
                tracing::debug!(?table, subject, lesson_number, "no reference entry");
            }
        }
    }

    /// Expands `slots` for `target_teacher` and returns the full row sets with every earlier row
    /// of that teacher replaced. A blank teacher name leaves both sets untouched.
    pub fn expand(
        &self,
        slots: &[TimetableSlot],
        target_teacher: &str,
        week1_monday: NaiveDate,
        existing_schedule: Vec<ScheduleRow>,
        existing_equipment: Vec<EquipmentRow>,
    ) -> ExpansionOutcome {
        if target_teacher.trim().is_empty() {
            return ExpansionOutcome::unchanged(existing_schedule, existing_equipment);
        }
        let generated = self.generate(slots, target_teacher, week1_monday);
        let mut outcome = ExpansionOutcome::unchanged(existing_schedule, existing_equipment);
        self.apply(&mut outcome, target_teacher, generated);
        outcome
    }

    /// Expands several teachers at once. Generation runs in parallel; replacements are applied in
    /// ascending teacher order so the result matches applying them one by one.
    pub fn expand_teachers(
        &self,
        groups: &[(String, Vec<TimetableSlot>)],
        week1_monday: NaiveDate,
        existing_schedule: Vec<ScheduleRow>,
        existing_equipment: Vec<EquipmentRow>,
    ) -> ExpansionOutcome {
        let mut generated: Vec<(&str, GeneratedRows)> = groups
            .par_iter()
            .filter(|(teacher, _)| !teacher.trim().is_empty())
            .map(|(teacher, slots)| {
                (
                    teacher.as_str(),
                    self.generate(slots, teacher, week1_monday),
                )
            })
            .collect();
        generated.sort_by(|a, b| a.0.cmp(b.0));

        let mut outcome = ExpansionOutcome::unchanged(existing_schedule, existing_equipment);
        for (teacher, rows) in generated {
            self.apply(&mut outcome, teacher, rows);
        }
        outcome
    }

    fn apply(&self, outcome: &mut ExpansionOutcome, teacher_name: &str, generated: GeneratedRows) {
        let before = outcome.schedule.len();
        outcome
            .schedule
            .retain(|row| row.teacher_name != teacher_name);
        outcome
            .equipment
            .retain(|row| row.teacher_name != teacher_name);
        let replaced_rows = before - outcome.schedule.len();

        let summary = ExpansionSummary {
            teacher_name: teacher_name.to_string(),
            first_week: self.config.first_week,
            last_week: self.config.last_week(),
            generated_rows: generated.schedule.len(),
            replaced_rows,
        };
        tracing::info!(
            teacher = teacher_name,
            first_week = summary.first_week,
            last_week = summary.last_week,
            rows = summary.generated_rows,
            replaced = summary.replaced_rows,
            "applied timetable template"
        );

        outcome.schedule.extend(generated.schedule);
        outcome.equipment.extend(generated.equipment);
        outcome.diagnostics.extend(generated.diagnostics);
        outcome.summaries.push(summary);
    }
}
