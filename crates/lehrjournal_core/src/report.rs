//! crates/lehrjournal_core/src/report.rs
//!
//! Lays out the printable progress report as a list of A4 pages made of text
//! and rectangle operations. Turning the pages into a PDF file is left to an
//! adapter; this module only decides what goes where.
//!
//! Coordinates are millimetres measured from the top-left corner of a page.
//! Text `y` is the baseline.

use chrono::NaiveDate;

use crate::stats::{CategoryStats, CompetencyStats, CompletionTier, ProgressStatistics, RatingBand};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
/// Space kept free at the bottom of every page for the footer.
pub const FOOTER_HEIGHT: f32 = 12.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const TITLE_HEIGHT: f32 = 34.0;
const SUMMARY_HEIGHT: f32 = 24.0;
const SECTION_HEADER_HEIGHT: f32 = 10.0;
const ROW_HEIGHT: f32 = 6.5;
const BADGE_HEIGHT: f32 = 7.5;
const BLOCK_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const TEXT: Rgb = Rgb(33, 33, 33);
pub const MUTED: Rgb = Rgb(117, 117, 117);
pub const PANEL: Rgb = Rgb(238, 238, 238);
pub const ACCENT: Rgb = Rgb(21, 101, 192);
pub const GREEN: Rgb = Rgb(46, 125, 50);
pub const ORANGE: Rgb = Rgb(239, 108, 0);
pub const RED: Rgb = Rgb(198, 40, 40);
pub const GREY: Rgb = Rgb(189, 189, 189);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub pages: Vec<Page>,
}

/// Who and when the report is about.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub apprentice_name: String,
    pub company_name: Option<String>,
    pub trainer_name: Option<String>,
    pub generated_on: NaiveDate,
}

pub fn tier_color(tier: CompletionTier) -> Rgb {
    match tier {
        CompletionTier::Complete => GREEN,
        CompletionTier::InProgress => ORANGE,
        CompletionTier::Missing => RED,
    }
}

pub fn band_color(band: Option<RatingBand>) -> Rgb {
    match band {
        Some(RatingBand::Good) => GREEN,
        Some(RatingBand::Sufficient) => ORANGE,
        Some(RatingBand::Insufficient) => RED,
        None => GREY,
    }
}

fn tier_label(tier: CompletionTier) -> &'static str {
    match tier {
        CompletionTier::Complete => "erfüllt",
        CompletionTier::InProgress => "in Arbeit",
        CompletionTier::Missing => "offen",
    }
}

/// `<Name>_Fortschritt_<YYYY-MM-DD>.pdf`, whitespace in the name replaced by `_`.
pub fn report_file_name(apprentice_name: &str, date: NaiveDate) -> String {
    let name = apprentice_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_Fortschritt_{}.pdf", name, date.format("%Y-%m-%d"))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn hours(h: f64) -> String {
    format!("{:.1} h", h)
}

//=========================================================================================
// Composer
//=========================================================================================

struct Composer {
    pages: Vec<Page>,
    cursor: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: MARGIN,
        }
    }

    fn bottom() -> f32 {
        PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT
    }

    /// Starts a new page unless `height` still fits below the cursor.
    /// Returns true when a page break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor + height <= Self::bottom() {
            return false;
        }
        self.pages.push(Page::default());
        self.cursor = MARGIN;
        true
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, color: Rgb, text: impl Into<String>) {
        self.push(DrawOp::Text {
            x,
            y,
            size,
            bold,
            color,
            text: text.into(),
        });
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }
}

//=========================================================================================
// Blocks
//=========================================================================================

fn title_block(c: &mut Composer, header: &ReportHeader, stats: &ProgressStatistics) {
    let top = c.cursor;
    c.rect(MARGIN, top, CONTENT_WIDTH, 1.5, ACCENT);
    c.text(MARGIN, top + 10.0, 18.0, true, TEXT, "Ausbildungsfortschritt");
    c.text(MARGIN, top + 18.0, 12.0, true, TEXT, header.apprentice_name.clone());

    let mut details = Vec::new();
    if let Some(company) = &header.company_name {
        details.push(format!("Betrieb: {}", company));
    }
    if let Some(trainer) = &header.trainer_name {
        details.push(format!("Berufsbildner/in: {}", trainer));
    }
    c.text(MARGIN, top + 24.0, 9.0, false, MUTED, details.join("   "));

    let period = match stats.period {
        Some(range) => format!(
            "{}: {} - {}",
            stats.filter.label(),
            format_date(range.from),
            format_date(range.to)
        ),
        None => stats.filter.label().to_string(),
    };
    c.text(MARGIN, top + 29.0, 9.0, false, MUTED, format!(
        "Zeitraum: {}   Erstellt am {}",
        period,
        format_date(header.generated_on)
    ));
    c.cursor = top + TITLE_HEIGHT;
}

fn summary_strip(c: &mut Composer, stats: &ProgressStatistics) {
    c.ensure_space(SUMMARY_HEIGHT);
    let top = c.cursor;
    let gap = 3.0;
    let width = (CONTENT_WIDTH - 3.0 * gap) / 4.0;
    let metrics = [
        ("Arbeitsstunden", hours(stats.total_hours)),
        ("Einträge", stats.entry_count.to_string()),
        (
            "Tätigkeiten erfüllt",
            format!("{} / {}", stats.tasks_complete, stats.task_total),
        ),
        (
            "Kompetenzen erfüllt",
            format!("{} / {}", stats.competencies_complete, stats.competency_total),
        ),
    ];
    for (i, (label, value)) in metrics.into_iter().enumerate() {
        let x = MARGIN + i as f32 * (width + gap);
        c.rect(x, top, width, SUMMARY_HEIGHT - BLOCK_GAP, PANEL);
        c.text(x + 3.0, top + 6.0, 8.0, false, MUTED, label);
        c.text(x + 3.0, top + 14.0, 14.0, true, TEXT, value);
    }
    c.cursor = top + SUMMARY_HEIGHT;
}

fn section_title(c: &mut Composer, title: &str, right: Option<String>) {
    let top = c.cursor;
    c.rect(MARGIN, top, CONTENT_WIDTH, SECTION_HEADER_HEIGHT - 2.0, PANEL);
    c.text(MARGIN + 2.0, top + 5.5, 11.0, true, TEXT, title);
    if let Some(right) = right {
        c.text(MARGIN + CONTENT_WIDTH - 30.0, top + 5.5, 10.0, true, TEXT, right);
    }
    c.cursor = top + SECTION_HEADER_HEIGHT;
}

fn category_block(c: &mut Composer, category: &CategoryStats) {
    let first_row = if category.tasks.is_empty() { 0.0 } else { ROW_HEIGHT };
    c.ensure_space(SECTION_HEADER_HEIGHT + first_row);
    section_title(c, &category.name, Some(hours(category.total_hours)));

    for task in &category.tasks {
        if c.ensure_space(ROW_HEIGHT) {
            section_title(c, &format!("{} (Fortsetzung)", category.name), None);
        }
        let top = c.cursor;
        let color = tier_color(task.tier);
        c.rect(MARGIN + 2.0, top + 1.0, 3.0, 3.0, color);
        c.text(MARGIN + 8.0, top + 4.0, 9.0, false, TEXT, task.name.clone());
        c.text(MARGIN + 110.0, top + 4.0, 9.0, false, color, tier_label(task.tier));
        c.text(MARGIN + 140.0, top + 4.0, 9.0, false, TEXT, format!("{}x", task.count));
        c.text(MARGIN + 160.0, top + 4.0, 9.0, false, TEXT, hours(task.hours));
        c.cursor = top + ROW_HEIGHT;
    }
    c.cursor += BLOCK_GAP;
}

fn competency_badge(c: &mut Composer, competency: &CompetencyStats) {
    let top = c.cursor;
    let color = band_color(competency.band);
    c.rect(MARGIN, top, 4.0, BADGE_HEIGHT - 1.5, color);
    c.text(MARGIN + 7.0, top + 4.5, 9.5, true, TEXT, competency.name.clone());
    c.text(
        MARGIN + 70.0,
        top + 4.5,
        9.0,
        false,
        tier_color(competency.tier),
        tier_label(competency.tier),
    );
    c.text(
        MARGIN + 100.0,
        top + 4.5,
        9.0,
        false,
        TEXT,
        format!("{}x geübt, {}x verbessert", competency.practiced, competency.improved),
    );
    let rating = competency
        .average_rating
        .map(|avg| format!("Schnitt {:.2}", avg))
        .unwrap_or_else(|| "ohne Bewertung".to_string());
    c.text(MARGIN + 150.0, top + 4.5, 9.0, false, color, rating);
    c.cursor = top + BADGE_HEIGHT;
}

fn footers(pages: &mut [Page], header: &ReportHeader) {
    let total = pages.len();
    let y = PAGE_HEIGHT - MARGIN;
    for (i, page) in pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Text {
            x: MARGIN,
            y,
            size: 8.0,
            bold: false,
            color: MUTED,
            text: format!(
                "{} - Fortschrittsbericht vom {}",
                header.apprentice_name,
                format_date(header.generated_on)
            ),
        });
        page.ops.push(DrawOp::Text {
            x: PAGE_WIDTH - MARGIN - 20.0,
            y,
            size: 8.0,
            bold: false,
            color: MUTED,
            text: format!("Seite {} / {}", i + 1, total),
        });
    }
}

/// Lays out the whole report for the given statistics.
pub fn layout_report(header: &ReportHeader, stats: &ProgressStatistics) -> ReportLayout {
    let mut c = Composer::new();
    title_block(&mut c, header, stats);
    summary_strip(&mut c, stats);

    for category in &stats.categories {
        category_block(&mut c, category);
    }

    let first_badge = if stats.competencies.is_empty() { 0.0 } else { BADGE_HEIGHT };
    c.ensure_space(SECTION_HEADER_HEIGHT + first_badge);
    section_title(&mut c, "Kompetenzen", Some(hours(stats.competency_hours)));
    for competency in &stats.competencies {
        if c.ensure_space(BADGE_HEIGHT) {
            section_title(&mut c, "Kompetenzen (Fortsetzung)", None);
        }
        competency_badge(&mut c, competency);
    }

    let mut pages = c.pages;
    footers(&mut pages, header);
    ReportLayout {
        title: format!("Fortschritt {}", header.apprentice_name),
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entry, EntryStatus};
    use crate::stats::{compute, TimeFilter};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn header() -> ReportHeader {
        ReportHeader {
            apprentice_name: "Lea Frei".into(),
            company_name: Some("Holzbau AG".into()),
            trainer_name: Some("Bea Berger".into()),
            generated_on: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    fn entries(extra_tasks: usize) -> Vec<Entry> {
        let tasks: Vec<String> = (0..extra_tasks)
            .map(|i| format!("Sonderaufgabe {:03}", i))
            .chain(["Hobeln".to_string()])
            .collect();
        vec![Entry {
            id: Uuid::new_v4(),
            apprentice_id: Uuid::nil(),
            company_id: None,
            trainer_id: None,
            category: "Montage".into(),
            task_hours: tasks.iter().map(|t| (t.clone(), 0.5)).collect::<BTreeMap<_, _>>(),
            tasks,
            competencies: Vec::new(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            status: EntryStatus::Pending,
            trainer_note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }]
    }

    fn stats(extra_tasks: usize) -> ProgressStatistics {
        compute(
            &entries(extra_tasks),
            TimeFilter::All,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(report_file_name("Lea Frei", date), "Lea_Frei_Fortschritt_2024-03-07.pdf");
        assert_eq!(report_file_name("Anna", date), "Anna_Fortschritt_2024-03-07.pdf");
    }

    #[test]
    fn small_report_fits_and_has_all_blocks() {
        let layout = layout_report(&header(), &stats(0));
        let all: Vec<&str> = layout.pages.iter().flat_map(texts).collect();
        assert!(all.contains(&"Ausbildungsfortschritt"));
        assert!(all.contains(&"Maschinenarbeiten"));
        assert!(all.contains(&"Kompetenzen"));
        assert!(all.contains(&"Sorgfalt"));
        let last = layout.pages.last().unwrap();
        let total = layout.pages.len();
        assert!(texts(last).contains(&format!("Seite {} / {}", total, total).as_str()));
    }

    #[test]
    fn long_reports_paginate_within_bounds() {
        let layout = layout_report(&header(), &stats(80));
        assert!(layout.pages.len() > 2);

        let limit = PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT;
        for (i, page) in layout.pages.iter().enumerate() {
            let footer = format!("Seite {} / {}", i + 1, layout.pages.len());
            assert!(texts(page).contains(&footer.as_str()));
            for op in &page.ops {
                match op {
                    DrawOp::Rect { y, height, .. } => assert!(y + height <= limit),
                    DrawOp::Text { y, text, .. } if !text.starts_with("Seite") && !text.contains("Fortschrittsbericht") => {
                        assert!(*y <= limit, "'{}' at {} overflows", text, y)
                    }
                    DrawOp::Text { .. } => {}
                }
            }
        }
        let continued = layout
            .pages
            .iter()
            .flat_map(texts)
            .filter(|t| t.ends_with("(Fortsetzung)"))
            .count();
        assert!(continued >= 1);
    }

    #[test]
    fn colours_follow_tiers_and_bands() {
        assert_eq!(tier_color(CompletionTier::Complete), GREEN);
        assert_eq!(tier_color(CompletionTier::InProgress), ORANGE);
        assert_eq!(tier_color(CompletionTier::Missing), RED);
        assert_eq!(band_color(Some(RatingBand::Good)), GREEN);
        assert_eq!(band_color(None), GREY);
    }

    #[test]
    fn layout_is_reproducible() {
        let s = stats(5);
        assert_eq!(layout_report(&header(), &s), layout_report(&header(), &s));
    }
}
