//! Assembly of a report into document flowables.
//!
//! Page structure: a title page carrying the topic, generation date and summary; one page
//! per section; a final sources page.

use super::fonts::BULLET;
use super::layout::{
    Align, CellStyle, Color, Flowable, Paragraph, ParagraphStyle, TableFlow,
};
use crate::blocks::{classify_blocks, Block, Table};
use crate::constants::{MAX_SOURCE_SNIPPET_CHARS, MAX_SOURCE_URL_CHARS};
use crate::markup::{parse_inline, Run, RunStyle};
use crate::report::{ReportDraft, Source};
use crate::sanitize::{sanitize_text, truncate_with_marker};
use chrono::NaiveDate;

const INCH: f32 = 72.0;
const LIST_TEXT_INDENT: f32 = 30.0;
const LIST_MARKER_INDENT: f32 = 15.0;

const DEFAULT_TITLE: &str = "Research Report";
const NO_SUMMARY: &str = "No summary available";
const UNTITLED_SECTION: &str = "Untitled Section";
const NO_CONTENT: &str = "No content available";
const SOURCES_TITLE: &str = "Sources";
const NO_SOURCES: &str = "No sources available";
const NO_URL: &str = "No URL provided";

struct Styles {
    title: ParagraphStyle,
    date: ParagraphStyle,
    normal: ParagraphStyle,
    list: ParagraphStyle,
    headings: [ParagraphStyle; 3],
    band: ParagraphStyle,
    quote: ParagraphStyle,
    source_title: ParagraphStyle,
    url: ParagraphStyle,
    source: ParagraphStyle,
    table_header: CellStyle,
    table_body: CellStyle,
}

impl Styles {
    fn new() -> Self {
        let normal = ParagraphStyle {
            size: 11.0,
            leading: 16.0,
            space_before: 6.0,
            space_after: 8.0,
            ..ParagraphStyle::default()
        };
        let heading = |size: f32, leading: f32, before: f32, after: f32| ParagraphStyle {
            size,
            leading,
            bold: true,
            color: Color::DARK_BLUE,
            space_before: before,
            space_after: after,
            ..ParagraphStyle::default()
        };
        let h1 = heading(16.0, 20.0, 16.0, 10.0);

        Self {
            title: ParagraphStyle {
                size: 20.0,
                leading: 24.0,
                bold: true,
                color: Color::DARK_BLUE,
                align: Align::Center,
                space_after: 24.0,
                ..ParagraphStyle::default()
            },
            date: ParagraphStyle {
                size: 9.0,
                leading: 12.0,
                color: Color::GREY,
                align: Align::Right,
                ..normal.clone()
            },
            list: ParagraphStyle {
                left_indent: LIST_TEXT_INDENT,
                space_before: 3.0,
                space_after: 3.0,
                ..normal.clone()
            },
            band: ParagraphStyle {
                background: Some(Color::LIGHT_GREY.tint(0.3)),
                padding: 8.0,
                ..h1.clone()
            },
            quote: ParagraphStyle {
                italic: true,
                color: Color::DARK_SLATE_GREY,
                left_indent: 40.0,
                right_indent: 40.0,
                background: Some(Color::LIGHT_GREY.tint(0.2)),
                padding: 10.0,
                ..normal.clone()
            },
            source_title: ParagraphStyle {
                background: Some(Color::LIGHT_GREY.tint(0.15)),
                padding: 8.0,
                ..heading(12.0, 15.0, 12.0, 4.0)
            },
            url: ParagraphStyle {
                size: 9.0,
                leading: 12.0,
                color: Color::BLUE,
                space_before: 2.0,
                space_after: 6.0,
                ..normal.clone()
            },
            source: ParagraphStyle {
                size: 10.0,
                leading: 14.0,
                space_before: 4.0,
                space_after: 6.0,
                ..normal.clone()
            },
            table_header: CellStyle {
                text: ParagraphStyle {
                    size: 10.0,
                    leading: 12.0,
                    bold: true,
                    color: Color::DARK_BLUE,
                    align: Align::Center,
                    ..ParagraphStyle::default()
                },
                backgrounds: vec![Color::LIGHT_GREY],
            },
            table_body: CellStyle {
                text: ParagraphStyle {
                    size: 9.0,
                    leading: 11.0,
                    ..ParagraphStyle::default()
                },
                backgrounds: vec![Color::WHITE, Color::WHITE_SMOKE],
            },
            headings: [
                h1,
                heading(14.0, 18.0, 14.0, 8.0),
                heading(12.0, 15.0, 12.0, 6.0),
            ],
            normal,
        }
    }
}

fn markup(text: &str, style: &ParagraphStyle) -> Flowable {
    Flowable::Paragraph(Paragraph::new(parse_inline(&sanitize_text(text)), style.clone()))
}

fn or_default<'a>(text: &'a str, default: &'a str) -> &'a str {
    if text.trim().is_empty() {
        default
    } else {
        text
    }
}

/// Builds the complete flowable sequence for a report.
pub(crate) fn report_flowables(
    topic: &str,
    draft: &ReportDraft,
    generated_on: NaiveDate,
) -> Vec<Flowable> {
    let styles = Styles::new();
    let mut out = Vec::new();

    out.push(Flowable::Spacer(0.2 * INCH));
    out.push(markup(or_default(topic, DEFAULT_TITLE), &styles.title));
    out.push(Flowable::Paragraph(Paragraph::new(
        vec![Run::plain(format!(
            "Generated on: {}",
            generated_on.format("%B %d, %Y")
        ))],
        styles.date.clone(),
    )));
    out.push(Flowable::Spacer(0.3 * INCH));
    out.push(Flowable::Rule {
        thickness: 1.0,
        color: Color::LIGHT_GREY,
        space_before: 0.1 * INCH,
        space_after: 0.3 * INCH,
    });
    push_blocks(&mut out, or_default(&draft.summary, NO_SUMMARY), &styles);
    out.push(Flowable::Spacer(0.2 * INCH));

    for section in &draft.sections {
        out.push(Flowable::PageBreak);
        out.push(Flowable::Spacer(0.1 * INCH));
        out.push(markup(or_default(&section.title, UNTITLED_SECTION), &styles.band));
        out.push(Flowable::Spacer(0.2 * INCH));
        push_blocks(&mut out, or_default(&section.content, NO_CONTENT), &styles);
    }

    out.push(Flowable::PageBreak);
    out.push(Flowable::Spacer(0.1 * INCH));
    out.push(markup(SOURCES_TITLE, &styles.band));
    out.push(Flowable::Spacer(0.2 * INCH));
    if draft.sources.is_empty() {
        out.push(markup(NO_SOURCES, &styles.normal));
    }
    for (index, source) in draft.sources.iter().enumerate() {
        push_source(&mut out, index + 1, source, &styles);
    }

    out
}

fn push_blocks(out: &mut Vec<Flowable>, text: &str, styles: &Styles) {
    for block in classify_blocks(&sanitize_text(text)) {
        match block {
            Block::Heading { level, text } => {
                let index = usize::from(level.clamp(1, 3)) - 1;
                out.push(markup(&text, &styles.headings[index]));
                let gap = if level == 1 { 0.1 } else { 0.05 };
                out.push(Flowable::Spacer(gap * INCH));
            }
            Block::BulletItem(text) => out.push(Flowable::Paragraph(
                Paragraph::new(parse_inline(&text), styles.list.clone())
                    .with_bullet(BULLET.to_string(), LIST_MARKER_INDENT),
            )),
            Block::NumberedItem { number, text } => out.push(Flowable::Paragraph(
                Paragraph::new(parse_inline(&text), styles.list.clone())
                    .with_bullet(format!("{}.", number), LIST_MARKER_INDENT),
            )),
            Block::Quote(text) => {
                out.push(markup(&text, &styles.quote));
                out.push(Flowable::Spacer(0.1 * INCH));
            }
            Block::Table(table) => {
                out.push(Flowable::Spacer(0.1 * INCH));
                out.push(Flowable::Table(table_flow(&table, styles)));
                out.push(Flowable::Spacer(0.2 * INCH));
            }
            Block::Paragraph(text) => out.push(markup(&text, &styles.normal)),
        }
    }
}

fn cell_runs(row: &[String]) -> Vec<Vec<Run>> {
    row.iter().map(|cell| parse_inline(cell)).collect()
}

fn table_flow(table: &Table, styles: &Styles) -> TableFlow {
    TableFlow {
        header: cell_runs(&table.headers),
        rows: table.rows.iter().map(|row| cell_runs(row)).collect(),
        header_style: styles.table_header.clone(),
        body_style: styles.table_body.clone(),
        grid_color: Color::GREY,
        space_before: 0.0,
        space_after: 0.0,
    }
}

fn push_source(out: &mut Vec<Flowable>, number: usize, source: &Source, styles: &Styles) {
    let title = if source.title.trim().is_empty() {
        format!("Source {}", number)
    } else {
        sanitize_text(&source.title)
    };
    out.push(Flowable::Paragraph(Paragraph::new(
        vec![Run::plain(format!("{}. {}", number, title))],
        styles.source_title.clone(),
    )));

    let url = sanitize_text(source.url.trim());
    let url_runs = if url.is_empty() {
        vec![Run::plain("URL: "), Run::plain(NO_URL)]
    } else {
        vec![
            Run::plain("URL: "),
            Run::link(truncate_with_marker(&url, MAX_SOURCE_URL_CHARS), url.clone()),
        ]
    };
    out.push(Flowable::Paragraph(Paragraph::new(url_runs, styles.url.clone())));

    if let Some(snippet) = source.snippet.as_deref().filter(|s| !s.trim().is_empty()) {
        let snippet = truncate_with_marker(&sanitize_text(snippet), MAX_SOURCE_SNIPPET_CHARS);
        let mut runs = vec![
            Run::styled("Description:", RunStyle::italic()),
            Run::plain(" "),
        ];
        runs.extend(parse_inline(&snippet));
        out.push(Flowable::Paragraph(Paragraph::new(runs, styles.source.clone())));
    }

    out.push(Flowable::Spacer(0.2 * INCH));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Section;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    fn paragraph_texts(flowables: &[Flowable]) -> Vec<String> {
        flowables
            .iter()
            .filter_map(|f| match f {
                Flowable::Paragraph(p) => {
                    Some(p.runs.iter().map(|r| r.text.as_str()).collect::<String>())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_report_uses_placeholders() {
        let flowables = report_flowables("  ", &ReportDraft::default(), date());
        let texts = paragraph_texts(&flowables);
        assert_eq!(texts[0], "Research Report");
        assert_eq!(texts[1], "Generated on: March 05, 2026");
        assert!(texts.contains(&"No summary available".to_string()));
        assert!(texts.contains(&"No sources available".to_string()));
        let breaks = flowables
            .iter()
            .filter(|f| matches!(f, Flowable::PageBreak))
            .count();
        assert_eq!(breaks, 1);
    }

    #[test]
    fn test_sections_get_page_breaks_and_defaults() {
        let draft = ReportDraft {
            summary: "Sum".into(),
            sections: vec![
                Section {
                    title: String::new(),
                    content: String::new(),
                },
                Section {
                    title: "Second".into(),
                    content: "Body".into(),
                },
            ],
            sources: vec![],
        };
        let flowables = report_flowables("Topic", &draft, date());
        let breaks = flowables
            .iter()
            .filter(|f| matches!(f, Flowable::PageBreak))
            .count();
        assert_eq!(breaks, 3);
        let texts = paragraph_texts(&flowables);
        assert!(texts.contains(&"Untitled Section".to_string()));
        assert!(texts.contains(&"No content available".to_string()));
    }

    #[test]
    fn test_sources_are_numbered_and_truncated() {
        let long_url = format!("https://example.com/{}", "p".repeat(120));
        let draft = ReportDraft {
            summary: "Sum".into(),
            sections: vec![],
            sources: vec![
                Source {
                    title: "Ünicode title".into(),
                    url: long_url.clone(),
                    snippet: Some("s".repeat(400)),
                },
                Source {
                    title: String::new(),
                    url: String::new(),
                    snippet: None,
                },
            ],
        };
        let flowables = report_flowables("Topic", &draft, date());
        let texts = paragraph_texts(&flowables);
        assert!(texts.contains(&"1. ?nicode title".to_string()));
        assert!(texts.contains(&"2. Source 2".to_string()));
        assert!(texts.contains(&"URL: No URL provided".to_string()));

        let url_line = texts.iter().find(|t| t.starts_with("URL: https")).unwrap();
        assert_eq!(url_line.chars().count(), "URL: ".len() + 80);
        let description = texts
            .iter()
            .find(|t| t.starts_with("Description:"))
            .unwrap();
        assert_eq!(description.chars().count(), "Description: ".len() + 300);
    }

    #[test]
    fn test_blocks_map_to_styled_flowables() {
        let draft = ReportDraft {
            summary: "# Head\n\n- item\n\n3. third\n\n> quote\n\n| a | b |\n|---|---|\n| 1 | 2 |"
                .into(),
            sections: vec![],
            sources: vec![],
        };
        let flowables = report_flowables("T", &draft, date());
        let bullets: Vec<String> = flowables
            .iter()
            .filter_map(|f| match f {
                Flowable::Paragraph(p) => p.bullet.as_ref().map(|b| b.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(bullets, vec![BULLET.to_string(), "3.".to_string()]);
        assert_eq!(
            flowables
                .iter()
                .filter(|f| matches!(f, Flowable::Table(_)))
                .count(),
            1
        );
        let quote = flowables.iter().find_map(|f| match f {
            Flowable::Paragraph(p) if p.style.italic => Some(p),
            _ => None,
        });
        assert!(quote.is_some());
    }
}
