//! crates/lehrjournal_core/src/catalog.rs
//!
//! The static vocabulary of work categories, tasks and competencies.
//! Statistics are computed against this table, not against whatever names
//! happen to appear in the data.

/// A work category and the tasks that belong to it.
#[derive(Debug, Clone, Copy)]
pub struct WorkCategory {
    pub name: &'static str,
    pub tasks: &'static [&'static str],
}

/// Occurrences at which a task counts as complete.
pub const TASK_COMPLETE_THRESHOLD: usize = 2;

/// Occurrences at which a competency counts as complete.
pub const COMPETENCY_COMPLETE_THRESHOLD: usize = 3;

/// Bucket for tasks whose category is unknown.
pub const OTHER_CATEGORY: &str = "Sonstiges";

pub const CATEGORIES: &[WorkCategory] = &[
    WorkCategory {
        name: "Arbeitsvorbereitung",
        tasks: &["Pläne lesen", "Materialliste erstellen", "Arbeitsplatz einrichten"],
    },
    WorkCategory {
        name: "Maschinenarbeiten",
        tasks: &["Zuschneiden", "Hobeln", "Fräsen", "Bohren"],
    },
    WorkCategory {
        name: "Handarbeiten",
        tasks: &["Schleifen", "Verleimen", "Beschläge montieren"],
    },
    WorkCategory {
        name: "Oberflächenbehandlung",
        tasks: &["Beizen", "Lackieren", "Ölen"],
    },
    WorkCategory {
        name: "Montage",
        tasks: &["Möbel montieren", "Türen einbauen", "Küchen montieren"],
    },
    WorkCategory {
        name: "Unterhalt",
        tasks: &["Maschinen warten", "Werkstatt reinigen"],
    },
];

pub const COMPETENCIES: &[&str] = &[
    "Selbstständigkeit",
    "Sorgfalt",
    "Teamfähigkeit",
    "Kommunikation",
    "Zuverlässigkeit",
    "Pünktlichkeit",
    "Lernbereitschaft",
    "Arbeitssicherheit",
];

/// The catalog category a task belongs to.
pub fn category_of_task(task: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|c| c.tasks.contains(&task))
        .map(|c| c.name)
}

pub fn is_category(name: &str) -> bool {
    CATEGORIES.iter().any(|c| c.name == name)
}

pub fn is_competency(name: &str) -> bool {
    COMPETENCIES.contains(&name)
}

/// Number of tasks across all categories.
pub fn task_count() -> usize {
    CATEGORIES.iter().map(|c| c.tasks.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_task_belongs_to_exactly_one_category() {
        let mut seen = HashSet::new();
        for category in CATEGORIES {
            for task in category.tasks {
                assert!(seen.insert(*task), "task '{}' listed twice", task);
                assert_eq!(category_of_task(task), Some(category.name));
            }
        }
        assert_eq!(seen.len(), task_count());
    }

    #[test]
    fn lookups() {
        assert_eq!(category_of_task("Hobeln"), Some("Maschinenarbeiten"));
        assert_eq!(category_of_task("Kaffee kochen"), None);
        assert!(is_category("Montage"));
        assert!(!is_category(OTHER_CATEGORY));
        assert!(is_competency("Sorgfalt"));
        assert!(!is_competency("Hobeln"));
    }
}
