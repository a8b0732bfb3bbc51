//! crates/lehrjournal_core/src/stats.rs
//!
//! Progress statistics over an already-fetched list of entries.
//!
//! Everything here is pure: the caller passes the entries and the reference
//! date, and the whole view is recomputed on every call.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::catalog::{
    self, COMPETENCIES, COMPETENCY_COMPLETE_THRESHOLD, OTHER_CATEGORY, TASK_COMPLETE_THRESHOLD,
};
use crate::domain::{CompetencyStatus, Entry};

//=========================================================================================
// Time Filter
//=========================================================================================

/// The window of entries a statistic is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeFilter {
    All,
    /// The ISO week (Monday to Sunday) containing the reference date.
    Week,
    /// The calendar month of the reference date.
    Month,
    /// The calendar year of the reference date.
    Year,
    /// An inclusive custom range.
    Custom { from: NaiveDate, to: NaiveDate },
}

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl TimeFilter {
    /// Builds a filter from the query parameters `filter`, `from` and `to`.
    pub fn from_query(
        kind: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Self, String> {
        match kind.unwrap_or("all") {
            "all" => Ok(TimeFilter::All),
            "week" => Ok(TimeFilter::Week),
            "month" => Ok(TimeFilter::Month),
            "year" => Ok(TimeFilter::Year),
            "custom" => match (from, to) {
                (Some(from), Some(to)) if from <= to => Ok(TimeFilter::Custom { from, to }),
                (Some(_), Some(_)) => Err("'from' must not be after 'to'".to_string()),
                _ => Err("custom filter needs both 'from' and 'to'".to_string()),
            },
            other => Err(format!("unknown filter '{}'", other)),
        }
    }

    /// The concrete range relative to `today`; `None` means unbounded.
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        match *self {
            TimeFilter::All => None,
            TimeFilter::Week => {
                let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                Some(DateRange {
                    from: monday,
                    to: monday + Duration::days(6),
                })
            }
            TimeFilter::Month => {
                let from = today.with_day(1).unwrap_or(today);
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                let to = NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(today);
                Some(DateRange { from, to })
            }
            TimeFilter::Year => {
                let from = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let to = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                Some(DateRange { from, to })
            }
            TimeFilter::Custom { from, to } => Some(DateRange { from, to }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeFilter::All => "Gesamte Ausbildung",
            TimeFilter::Week => "Diese Woche",
            TimeFilter::Month => "Dieser Monat",
            TimeFilter::Year => "Dieses Jahr",
            TimeFilter::Custom { .. } => "Zeitraum",
        }
    }
}

/// The entries whose date falls inside the filter window.
pub fn filter_entries<'a>(entries: &'a [Entry], filter: TimeFilter, today: NaiveDate) -> Vec<&'a Entry> {
    match filter.range(today) {
        None => entries.iter().collect(),
        Some(range) => entries.iter().filter(|e| range.contains(e.date)).collect(),
    }
}

//=========================================================================================
// Derived View
//=========================================================================================

/// Completion tier derived from an occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionTier {
    Missing,
    InProgress,
    Complete,
}

impl CompletionTier {
    fn from_count(count: usize, complete_at: usize) -> Self {
        if count >= complete_at {
            CompletionTier::Complete
        } else if count > 0 {
            CompletionTier::InProgress
        } else {
            CompletionTier::Missing
        }
    }

    pub fn for_task(count: usize) -> Self {
        Self::from_count(count, TASK_COMPLETE_THRESHOLD)
    }

    pub fn for_competency(count: usize) -> Self {
        Self::from_count(count, COMPETENCY_COMPLETE_THRESHOLD)
    }
}

/// Colour band of an average self-rating (Swiss 1–6 scale, 4 is sufficient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingBand {
    Good,
    Sufficient,
    Insufficient,
}

impl RatingBand {
    /// Rounds only for the band; the displayed average stays exact.
    pub fn from_average(average: f64) -> Self {
        let rounded = average.round();
        if rounded >= 5.0 {
            RatingBand::Good
        } else if rounded >= 4.0 {
            RatingBand::Sufficient
        } else {
            RatingBand::Insufficient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub name: String,
    pub hours: f64,
    pub count: usize,
    pub tier: CompletionTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub name: String,
    pub total_hours: f64,
    pub tasks: Vec<TaskStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyStats {
    pub name: String,
    pub count: usize,
    pub hours: f64,
    pub practiced: usize,
    pub improved: usize,
    pub average_rating: Option<f64>,
    pub rating_count: usize,
    pub band: Option<RatingBand>,
    pub tier: CompletionTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStatistics {
    pub filter: TimeFilter,
    pub period: Option<DateRange>,
    pub entry_count: usize,
    pub total_hours: f64,
    pub competency_hours: f64,
    pub categories: Vec<CategoryStats>,
    pub competencies: Vec<CompetencyStats>,
    pub tasks_complete: usize,
    pub task_total: usize,
    pub competencies_complete: usize,
    pub competency_total: usize,
}

//=========================================================================================
// Computation
//=========================================================================================

#[derive(Default)]
struct TaskAcc {
    category: String,
    hours: f64,
    count: usize,
}

#[derive(Default)]
struct CompetencyAcc {
    count: usize,
    hours: f64,
    practiced: usize,
    improved: usize,
    ratings: Vec<u8>,
}

/// Computes the full statistics view for the entries inside `filter`.
pub fn compute(entries: &[Entry], filter: TimeFilter, today: NaiveDate) -> ProgressStatistics {
    let selected = filter_entries(entries, filter, today);

    // Tasks are keyed by name alone so a task lands in exactly one category.
    let mut tasks: HashMap<String, TaskAcc> = HashMap::new();
    let mut competencies: HashMap<String, CompetencyAcc> = HashMap::new();

    for entry in &selected {
        let names: BTreeSet<&String> = entry.tasks.iter().chain(entry.task_hours.keys()).collect();
        for name in names {
            let acc = tasks.entry(name.clone()).or_insert_with(|| TaskAcc {
                category: task_category(name, &entry.category).to_string(),
                ..TaskAcc::default()
            });
            acc.count += 1;
            acc.hours += entry.hours_for(name);
        }

        for detail in &entry.competencies {
            let acc = competencies.entry(detail.name.clone()).or_default();
            acc.count += 1;
            acc.hours += detail.hours;
            match detail.status {
                CompetencyStatus::Geuebt => acc.practiced += 1,
                CompetencyStatus::Verbessert => acc.improved += 1,
            }
            if let Some(rating) = detail.rating.filter(|r| (1..=6).contains(r)) {
                acc.ratings.push(rating);
            }
        }
    }

    let categories = build_categories(&tasks);
    let competencies = build_competencies(&competencies);

    let total_hours = categories.iter().map(|c| c.total_hours).sum();
    let competency_hours = competencies.iter().map(|c| c.hours).sum();
    let all_tasks = categories.iter().flat_map(|c| c.tasks.iter());
    let task_total = all_tasks.clone().count();
    let tasks_complete = all_tasks
        .filter(|t| t.tier == CompletionTier::Complete)
        .count();
    let competencies_complete = competencies
        .iter()
        .filter(|c| c.tier == CompletionTier::Complete)
        .count();

    ProgressStatistics {
        filter,
        period: filter.range(today),
        entry_count: selected.len(),
        total_hours,
        competency_hours,
        task_total,
        tasks_complete,
        competency_total: competencies.len(),
        competencies_complete,
        categories,
        competencies,
    }
}

/// Catalog category of a task, falling back to the entry's category.
fn task_category<'a>(task: &str, entry_category: &'a str) -> &'a str {
    if let Some(name) = catalog::category_of_task(task) {
        return name;
    }
    if catalog::is_category(entry_category) {
        entry_category
    } else {
        OTHER_CATEGORY
    }
}

fn task_stats(name: &str, acc: Option<&TaskAcc>) -> TaskStats {
    let (hours, count) = acc.map(|a| (a.hours, a.count)).unwrap_or((0.0, 0));
    TaskStats {
        name: name.to_string(),
        hours,
        count,
        tier: CompletionTier::for_task(count),
    }
}

fn build_categories(tasks: &HashMap<String, TaskAcc>) -> Vec<CategoryStats> {
    let mut extra_names: Vec<&String> = tasks
        .iter()
        .filter(|(name, _)| catalog::category_of_task(name).is_none())
        .map(|(name, _)| name)
        .collect();
    extra_names.sort();

    let extras_in = |category: &str| -> Vec<TaskStats> {
        extra_names
            .iter()
            .filter(|name| tasks[name.as_str()].category == category)
            .map(|name| task_stats(name, tasks.get(name.as_str())))
            .collect()
    };

    let mut out: Vec<CategoryStats> = catalog::CATEGORIES
        .iter()
        .map(|category| {
            let mut rows: Vec<TaskStats> = category
                .tasks
                .iter()
                .map(|task| task_stats(task, tasks.get(*task)))
                .collect();
            rows.extend(extras_in(category.name));
            CategoryStats {
                name: category.name.to_string(),
                total_hours: rows.iter().map(|t| t.hours).sum(),
                tasks: rows,
            }
        })
        .collect();

    let other = extras_in(OTHER_CATEGORY);
    if !other.is_empty() {
        out.push(CategoryStats {
            name: OTHER_CATEGORY.to_string(),
            total_hours: other.iter().map(|t| t.hours).sum(),
            tasks: other,
        });
    }
    out
}

fn competency_stats(name: &str, acc: Option<&CompetencyAcc>) -> CompetencyStats {
    let Some(acc) = acc else {
        return CompetencyStats {
            name: name.to_string(),
            count: 0,
            hours: 0.0,
            practiced: 0,
            improved: 0,
            average_rating: None,
            rating_count: 0,
            band: None,
            tier: CompletionTier::Missing,
        };
    };
    let average_rating = if acc.ratings.is_empty() {
        None
    } else {
        let sum: u32 = acc.ratings.iter().map(|r| u32::from(*r)).sum();
        Some(f64::from(sum) / acc.ratings.len() as f64)
    };
    CompetencyStats {
        name: name.to_string(),
        count: acc.count,
        hours: acc.hours,
        practiced: acc.practiced,
        improved: acc.improved,
        average_rating,
        rating_count: acc.ratings.len(),
        band: average_rating.map(RatingBand::from_average),
        tier: CompletionTier::for_competency(acc.count),
    }
}

fn build_competencies(acc: &HashMap<String, CompetencyAcc>) -> Vec<CompetencyStats> {
    let mut out: Vec<CompetencyStats> = COMPETENCIES
        .iter()
        .map(|name| competency_stats(name, acc.get(*name)))
        .collect();

    let mut extra: Vec<&String> = acc.keys().filter(|n| !catalog::is_competency(n)).collect();
    extra.sort();
    out.extend(extra.into_iter().map(|name| competency_stats(name, acc.get(name))));
    out
}

//=========================================================================================
// Tests
//=========================================================================================
