use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recurring cell of a weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub day_of_week: String,
    pub period: u32,
    pub subject: String,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
}

impl TimetableSlot {
    pub fn new(
        day_of_week: impl Into<String>,
        period: u32,
        subject: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            day_of_week: day_of_week.into(),
            period,
            subject: subject.into(),
            class_name: class_name.into(),
            teacher_name: None,
        }
    }

    pub fn with_teacher(mut self, teacher_name: impl Into<String>) -> Self {
        self.teacher_name = Some(teacher_name.into());
        self
    }

    /// Case-insensitive teacher comparison used when picking a teacher's slots out of a school timetable.
    pub fn taught_by(&self, teacher: &str) -> bool {
        self.teacher_name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            == teacher.to_lowercase()
    }
}

/// One dated lesson of a teacher's year schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub id: String,
    pub week: u32,
    pub day_of_week: String,
    pub date: NaiveDate,
    pub period: u32,
    pub subject: String,
    pub class_name: String,
    pub ppct_number: String,
    #[serde(default)]
    pub lesson_name: String,
    #[serde(default)]
    pub notes: String,
    pub teacher_name: String,
}

/// Equipment request paired with a [`ScheduleRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRow {
    pub id: String,
    pub week: u32,
    pub day_of_week: String,
    pub date: NaiveDate,
    pub period: u32,
    pub subject: String,
    pub class_name: String,
    pub ppct_number: String,
    #[serde(default)]
    pub equipment_name: String,
    #[serde(default)]
    pub quantity: String,
    pub teacher_name: String,
}

impl ScheduleRow {
    /// Same row without its identifier, for comparing two expansions.
    pub fn content_key(&self) -> (u32, &str, NaiveDate, u32, &str, &str, &str, &str, &str) {
        (
            self.week,
            self.day_of_week.as_str(),
            self.date,
            self.period,
            self.subject.as_str(),
            self.class_name.as_str(),
            self.ppct_number.as_str(),
            self.lesson_name.as_str(),
            self.teacher_name.as_str(),
        )
    }
}

impl EquipmentRow {
    pub fn for_schedule_row(
        row: &ScheduleRow,
        equipment_name: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            id: new_row_id(),
            week: row.week,
            day_of_week: row.day_of_week.clone(),
            date: row.date,
            period: row.period,
            subject: row.subject.clone(),
            class_name: row.class_name.clone(),
            ppct_number: row.ppct_number.clone(),
            equipment_name: equipment_name.into(),
            quantity: quantity.into(),
            teacher_name: row.teacher_name.clone(),
        }
    }

    pub fn content_key(&self) -> (u32, &str, NaiveDate, u32, &str, &str, &str, &str, &str) {
        (
            self.week,
            self.day_of_week.as_str(),
            self.date,
            self.period,
            self.subject.as_str(),
            self.class_name.as_str(),
            self.ppct_number.as_str(),
            self.equipment_name.as_str(),
            self.quantity.as_str(),
        )
    }
}

pub fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}
