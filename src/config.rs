use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_WEEK_COUNT: u32 = 35;
/// Highest week number a workbook navigates to or generates rows for (two school years).
pub const MAX_WEEK: u32 = 104;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One canonical weekday label plus the alternative spellings that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLabel {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl DayLabel {
    pub fn new<I, S>(label: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Settings for replaying a weekly timetable template across a school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default = "default_first_week")]
    pub first_week: u32,
    #[serde(default = "default_week_count")]
    pub week_count: u32,
    /// Monday..Sunday, in that order.
    #[serde(default = "default_day_labels")]
    pub day_labels: Vec<DayLabel>,
    /// Subjects that are never qualified with a grade (assemblies, homeroom, activities).
    #[serde(default = "default_grade_exempt_subjects")]
    pub grade_exempt_subjects: Vec<String>,
}

fn default_first_week() -> u32 {
    1
}

fn default_week_count() -> u32 {
    DEFAULT_WEEK_COUNT
}

fn default_day_labels() -> Vec<DayLabel> {
    vec![
        DayLabel::new("Thứ 2", ["Monday", "Mon"]),
        DayLabel::new("Thứ 3", ["Tuesday", "Tue"]),
        DayLabel::new("Thứ 4", ["Wednesday", "Wed"]),
        DayLabel::new("Thứ 5", ["Thursday", "Thu"]),
        DayLabel::new("Thứ 6", ["Friday", "Fri"]),
        DayLabel::new("Thứ 7", ["Saturday", "Sat"]),
        DayLabel::new("Chủ Nhật", ["Sunday", "Sun"]),
    ]
}

fn default_grade_exempt_subjects() -> Vec<String> {
    ["Chào Cờ", "SHL", "HĐTN", "Trải nghiệm"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            first_week: default_first_week(),
            week_count: default_week_count(),
            day_labels: default_day_labels(),
            grade_exempt_subjects: default_grade_exempt_subjects(),
        }
    }
}

impl ExpansionConfig {
    pub fn with_week_count(mut self, week_count: u32) -> Self {
        self.week_count = week_count;
        self
    }

    pub fn last_week(&self) -> u32 {
        self.first_week
            .saturating_add(self.week_count.saturating_sub(1))
    }

    pub fn weeks(&self) -> std::ops::RangeInclusive<u32> {
        self.first_week..=self.last_week()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_week == 0 {
            return Err(ConfigError::Invalid("first_week must be at least 1".into()));
        }
        if self.week_count == 0 {
            return Err(ConfigError::Invalid("week_count must be at least 1".into()));
        }
        match self.first_week.checked_add(self.week_count - 1) {
            Some(last) if last <= MAX_WEEK => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "first_week {} with week_count {} runs past week {MAX_WEEK}",
                    self.first_week, self.week_count
                )));
            }
        }
        if self.day_labels.len() != 7 {
            return Err(ConfigError::Invalid(format!(
                "expected 7 day labels (Monday..Sunday), got {}",
                self.day_labels.len()
            )));
        }
        if let Some(idx) = self
            .day_labels
            .iter()
            .position(|day| day.label.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!("day label #{idx} is empty")));
        }
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: ExpansionConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
