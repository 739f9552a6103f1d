use std::collections::HashMap;

/// Running lesson count per (subject, class) for a single expansion run.
#[derive(Debug, Default, Clone)]
pub struct LessonCounter {
    counts: HashMap<String, u32>,
}

impl LessonCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(subject: &str, class_name: &str) -> String {
        format!("{}_{}", subject.to_lowercase(), class_name.to_lowercase())
    }

    /// Previous value + 1, starting at 1 for an unseen key.
    pub fn next(&mut self, key: &str) -> u32 {
        let slot = self.counts.entry(key.to_string()).or_insert(0);
        *slot += 1;
        *slot
    }

    pub fn next_for(&mut self, subject: &str, class_name: &str) -> u32 {
        self.next(&Self::key(subject, class_name))
    }
}
