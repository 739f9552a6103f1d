use crate::config::ExpansionConfig;

/// Derives the grade-qualified display name of a subject ("Toán" + "7A1" -> "Toán 7").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectNormalizer {
    exempt_lowercase: Vec<String>,
}

impl Default for SubjectNormalizer {
    fn default() -> Self {
        Self::from_config(&ExpansionConfig::default())
    }
}

impl SubjectNormalizer {
    pub fn new<I, S>(grade_exempt_subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exempt_lowercase: grade_exempt_subjects
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ExpansionConfig) -> Self {
        Self::new(&config.grade_exempt_subjects)
    }

    pub fn normalize(&self, subject: &str, class_name: &str) -> String {
        if subject.is_empty() {
            return String::new();
        }
        let Some(grade) = grade_of(class_name) else {
            return subject.to_string();
        };
        if subject.contains(grade) {
            return subject.to_string();
        }
        if self.is_grade_exempt(subject) {
            return subject.to_string();
        }
        format!("{subject} {grade}").trim().to_string()
    }

    pub fn is_grade_exempt(&self, subject: &str) -> bool {
        let lowered = subject.to_lowercase();
        self.exempt_lowercase
            .iter()
            .any(|exempt| lowered.contains(exempt.as_str()))
    }
}

/// First run of ASCII digits in a class label ("10A2" -> "10").
pub fn grade_of(class_name: &str) -> Option<&str> {
    let start = class_name.find(|c: char| c.is_ascii_digit())?;
    let rest = &class_name[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}
