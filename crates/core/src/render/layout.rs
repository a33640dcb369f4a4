//! Page layout.
//!
//! A document is described as a flat list of [`Flowable`]s. Layout flows them top to bottom
//! onto US Letter pages, wrapping text to the content width and breaking to a new page when
//! space runs out. The result is a list of [`Page`]s holding positioned [`DrawOp`]s in PDF
//! user-space coordinates (origin bottom left, units in points).

use super::fonts::Font;
use crate::markup::{Run, RunStyle};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
/// 0.85 inch on every side.
pub const MARGIN: f32 = 61.2;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TOP: f32 = PAGE_HEIGHT - MARGIN;
const BOTTOM: f32 = MARGIN;

const FOOTER_RULE_Y: f32 = 36.0;
const FOOTER_TEXT_Y: f32 = 25.2;
const FOOTER_SIZE: f32 = 8.0;

const SCRIPT_SCALE: f32 = 0.7;
const SUPERSCRIPT_RISE: f32 = 0.35;
const SUBSCRIPT_DROP: f32 = 0.15;

const CELL_PADDING_X: f32 = 6.0;
const CELL_PADDING_Y: f32 = 3.0;
const GRID_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const WHITE_SMOKE: Color = Color::rgb(0.961, 0.961, 0.961);
    pub const GREY: Color = Color::rgb(0.502, 0.502, 0.502);
    pub const LIGHT_GREY: Color = Color::rgb(0.827, 0.827, 0.827);
    pub const DARK_BLUE: Color = Color::rgb(0.0, 0.0, 0.545);
    pub const DARK_SLATE_GREY: Color = Color::rgb(0.184, 0.31, 0.31);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// This colour composited at `alpha` over a white page.
    pub fn tint(self, alpha: f32) -> Self {
        Self {
            r: 1.0 - alpha * (1.0 - self.r),
            g: 1.0 - alpha * (1.0 - self.g),
            b: 1.0 - alpha * (1.0 - self.b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Visual style of a paragraph. Run styles are combined with `bold` and `italic`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub size: f32,
    pub leading: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub align: Align,
    pub space_before: f32,
    pub space_after: f32,
    pub left_indent: f32,
    pub right_indent: f32,
    pub background: Option<Color>,
    pub padding: f32,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            size: 11.0,
            leading: 16.0,
            bold: false,
            italic: false,
            color: Color::BLACK,
            align: Align::Left,
            space_before: 0.0,
            space_after: 0.0,
            left_indent: 0.0,
            right_indent: 0.0,
            background: None,
            padding: 0.0,
        }
    }
}

/// Marker drawn to the left of the first line of a list paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub text: String,
    /// Offset of the marker from the left margin.
    pub indent: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub style: ParagraphStyle,
    pub bullet: Option<Bullet>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>, style: ParagraphStyle) -> Self {
        Self {
            runs,
            style,
            bullet: None,
        }
    }

    pub fn with_bullet(mut self, text: impl Into<String>, indent: f32) -> Self {
        self.bullet = Some(Bullet {
            text: text.into(),
            indent,
        });
        self
    }
}

/// Cell styling shared by all header cells or all body cells of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub text: ParagraphStyle,
    /// Backgrounds cycled row by row.
    pub backgrounds: Vec<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableFlow {
    pub header: Vec<Vec<Run>>,
    pub rows: Vec<Vec<Vec<Run>>>,
    pub header_style: CellStyle,
    pub body_style: CellStyle,
    pub grid_color: Color,
    pub space_before: f32,
    pub space_after: f32,
}

/// A unit of document content.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph(Paragraph),
    Spacer(f32),
    Rule {
        thickness: f32,
        color: Color,
        space_before: f32,
        space_after: f32,
    },
    Table(TableFlow),
    PageBreak,
}

/// A positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Color,
        text: String,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
    /// Clickable area opening `url`.
    Link {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        url: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Concatenated text of every text op on this page, in drawing order.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Flows `flowables` onto pages. Always returns at least one page.
pub fn layout(flowables: &[Flowable]) -> Vec<Page> {
    let mut composer = Composer::new();
    for flowable in flowables {
        match flowable {
            Flowable::Paragraph(p) => composer.paragraph(p),
            Flowable::Spacer(height) => composer.spacer(*height),
            Flowable::Rule {
                thickness,
                color,
                space_before,
                space_after,
            } => composer.rule(*thickness, *color, *space_before, *space_after),
            Flowable::Table(table) => composer.table(table),
            Flowable::PageBreak => composer.page_break(),
        }
    }
    composer.finish()
}

/// Draws the footer rule, attribution and page number on every page.
pub fn apply_footer(pages: &mut [Page], footer_text: &str) {
    for (index, page) in pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Line {
            x1: MARGIN,
            y1: FOOTER_RULE_Y,
            x2: PAGE_WIDTH - MARGIN,
            y2: FOOTER_RULE_Y,
            width: GRID_WIDTH,
            color: Color::LIGHT_GREY,
        });

        let footer_width = Font::HelveticaOblique.text_width(footer_text, FOOTER_SIZE);
        page.ops.push(DrawOp::Text {
            x: (PAGE_WIDTH - footer_width) / 2.0,
            y: FOOTER_TEXT_Y,
            font: Font::HelveticaOblique,
            size: FOOTER_SIZE,
            color: Color::GREY,
            text: footer_text.to_string(),
        });

        let label = format!("Page {}", index + 1);
        let label_width = Font::Helvetica.text_width(&label, FOOTER_SIZE);
        page.ops.push(DrawOp::Text {
            x: PAGE_WIDTH - MARGIN - label_width,
            y: FOOTER_TEXT_Y,
            font: Font::Helvetica,
            size: FOOTER_SIZE,
            color: Color::GREY,
            text: label,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    text: String,
    font: Font,
    size: f32,
    rise: f32,
    color: Color,
    strike: bool,
    link: Option<String>,
    width: f32,
}

impl Fragment {
    fn new(text: &str, run: RunStyle, link: Option<String>, base: &ParagraphStyle) -> Self {
        let font = Font::for_style(base.bold || run.bold, base.italic || run.italic, run.code);
        let (size, rise) = if run.superscript {
            (base.size * SCRIPT_SCALE, base.size * SUPERSCRIPT_RISE)
        } else if run.subscript {
            (base.size * SCRIPT_SCALE, -base.size * SUBSCRIPT_DROP)
        } else {
            (base.size, 0.0)
        };
        let color = if link.is_some() {
            Color::BLUE
        } else {
            base.color
        };
        Self {
            text: text.to_string(),
            font,
            size,
            rise,
            color,
            strike: run.strike,
            width: font.text_width(text, size),
            link,
        }
    }

    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            width: self.font.text_width(text, self.size),
            ..self.clone()
        }
    }

    fn same_format(&self, other: &Fragment) -> bool {
        self.font == other.font
            && self.size == other.size
            && self.rise == other.rise
            && self.color == other.color
            && self.strike == other.strike
            && self.link == other.link
    }
}

#[derive(Debug, Clone, Default)]
struct Line {
    fragments: Vec<Fragment>,
    width: f32,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push(&mut self, fragment: Fragment) {
        self.width += fragment.width;
        match self.fragments.last_mut() {
            Some(last) if last.same_format(&fragment) => {
                last.text.push_str(&fragment.text);
                last.width += fragment.width;
            }
            _ => self.fragments.push(fragment),
        }
    }
}

struct Piece {
    text: String,
    style: RunStyle,
    link: Option<String>,
}

/// Splits runs into words on whitespace. A word may span several runs.
fn words(runs: &[Run]) -> Vec<Vec<Piece>> {
    let mut words = Vec::new();
    let mut word: Vec<Piece> = Vec::new();

    for run in runs {
        let mut buf = String::new();
        for c in run.text.chars() {
            if c.is_whitespace() {
                if !buf.is_empty() {
                    word.push(Piece {
                        text: std::mem::take(&mut buf),
                        style: run.style,
                        link: run.link.clone(),
                    });
                }
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                buf.push(c);
            }
        }
        if !buf.is_empty() {
            word.push(Piece {
                text: buf,
                style: run.style,
                link: run.link.clone(),
            });
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// Greedy line breaking. Words wider than `available` are broken between characters.
fn wrap(runs: &[Run], style: &ParagraphStyle, available: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for word in words(runs) {
        let fragments: Vec<Fragment> = word
            .into_iter()
            .map(|p| Fragment::new(&p.text, p.style, p.link, style))
            .collect();
        let width: f32 = fragments.iter().map(|f| f.width).sum();

        let space = match (line.fragments.last(), fragments.first()) {
            (Some(prev), Some(next)) if prev.same_format(next) => Some(prev.with_text(" ")),
            (Some(_), _) => Some(Fragment::new(" ", RunStyle::PLAIN, None, style)),
            (None, _) => None,
        };
        let space_width = space.as_ref().map_or(0.0, |s| s.width);

        if !line.is_empty() && line.width + space_width + width > available {
            lines.push(std::mem::take(&mut line));
        } else if let Some(space) = space {
            line.push(space);
        }

        if width > available {
            for fragment in fragments {
                for c in fragment.text.chars() {
                    let piece = fragment.with_text(c.encode_utf8(&mut [0; 4]));
                    if !line.is_empty() && line.width + piece.width > available {
                        lines.push(std::mem::take(&mut line));
                    }
                    line.push(piece);
                }
            }
        } else {
            for fragment in fragments {
                line.push(fragment);
            }
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Baseline of a line whose box starts at `top`.
fn baseline(top: f32, style: &ParagraphStyle) -> f32 {
    top - (style.leading + style.size) / 2.0 - style.size * 0.1
}

struct Composer {
    pages: Vec<Page>,
    cursor: f32,
    fresh: bool,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: TOP,
            fresh: true,
        }
    }

    /// Pages left empty by a trailing spacer or break are dropped.
    fn finish(mut self) -> Vec<Page> {
        while self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.ops.is_empty()) {
            self.pages.pop();
        }
        self.pages
    }

    fn ops(&mut self) -> &mut Vec<DrawOp> {
        let last = self.pages.len() - 1;
        &mut self.pages[last].ops
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = TOP;
        self.fresh = true;
    }

    fn space_before(&mut self, amount: f32) {
        if !self.fresh {
            self.cursor -= amount;
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if !self.fresh && self.cursor - height < BOTTOM {
            self.new_page();
        }
    }

    /// An overflowing spacer fills the page; the break waits for the next content.
    fn spacer(&mut self, height: f32) {
        self.cursor = (self.cursor - height).max(BOTTOM);
        self.fresh = false;
    }

    fn page_break(&mut self) {
        if !self.fresh {
            self.new_page();
        }
    }

    fn rule(&mut self, thickness: f32, color: Color, space_before: f32, space_after: f32) {
        self.space_before(space_before);
        self.ensure_room(thickness);
        let y = self.cursor - thickness / 2.0;
        self.ops().push(DrawOp::Line {
            x1: MARGIN,
            y1: y,
            x2: MARGIN + CONTENT_WIDTH,
            y2: y,
            width: thickness,
            color,
        });
        self.cursor -= thickness + space_after;
        self.fresh = false;
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let style = &paragraph.style;
        let box_left = MARGIN + style.left_indent;
        let box_width = CONTENT_WIDTH - style.left_indent - style.right_indent;
        let text_left = box_left + style.padding;
        let available = box_width - 2.0 * style.padding;
        let lines = wrap(&paragraph.runs, style, available);

        self.space_before(style.space_before);
        self.ensure_room(style.leading + 2.0 * style.padding);

        let mut index = 0;
        while index < lines.len() {
            let chunk_top = self.cursor;
            let mut chunk: Vec<DrawOp> = Vec::new();
            self.cursor -= style.padding;

            let chunk_start = index;
            while index < lines.len() {
                if index > chunk_start && self.cursor - style.leading - style.padding < BOTTOM {
                    break;
                }
                let line = &lines[index];
                let y = baseline(self.cursor, style);
                let x = match style.align {
                    Align::Left => text_left,
                    Align::Center => text_left + (available - line.width) / 2.0,
                    Align::Right => text_left + available - line.width,
                };
                if index == 0 {
                    if let Some(bullet) = &paragraph.bullet {
                        chunk.push(DrawOp::Text {
                            x: MARGIN + bullet.indent,
                            y,
                            font: Font::for_style(style.bold, style.italic, false),
                            size: style.size,
                            color: style.color,
                            text: bullet.text.clone(),
                        });
                    }
                }
                draw_line(&mut chunk, line, x, y);
                self.cursor -= style.leading;
                index += 1;
            }

            self.cursor -= style.padding;
            if let Some(color) = style.background {
                let cursor = self.cursor;
                self.ops().push(DrawOp::FillRect {
                    x: box_left,
                    y: cursor,
                    width: box_width,
                    height: chunk_top - cursor,
                    color,
                });
            }
            self.ops().extend(chunk);
            self.fresh = false;

            if index < lines.len() {
                self.new_page();
            }
        }

        self.cursor -= style.space_after;
    }

    fn table(&mut self, table: &TableFlow) {
        let columns = table.header.len().max(1);
        let column_width = CONTENT_WIDTH / columns as f32;

        self.space_before(table.space_before);

        let header = std::iter::once((&table.header, &table.header_style, 0));
        let body = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row, &table.body_style, i));

        for (cells, cell_style, row_index) in header.chain(body) {
            let text_style = &cell_style.text;
            let wrapped: Vec<Vec<Line>> = cells
                .iter()
                .map(|runs| wrap(runs, text_style, column_width - 2.0 * CELL_PADDING_X))
                .collect();
            let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let leading = text_style.leading;
            let full_height = line_count as f32 * leading + 2.0 * CELL_PADDING_Y;
            if full_height <= TOP - BOTTOM {
                self.ensure_room(full_height);
            }

            // Rows taller than the room left are drawn in slices, one per page.
            let mut first = 0;
            while first < line_count {
                let room = ((self.cursor - BOTTOM - 2.0 * CELL_PADDING_Y) / leading + 1e-3).floor();
                if room < 1.0 && !self.fresh {
                    self.new_page();
                    continue;
                }
                let last = (first + (room.max(1.0) as usize)).min(line_count);
                let row_height = (last - first) as f32 * leading + 2.0 * CELL_PADDING_Y;
                let top = self.cursor;
                let bottom = top - row_height;

                if !cell_style.backgrounds.is_empty() {
                    let color = cell_style.backgrounds[row_index % cell_style.backgrounds.len()];
                    self.ops().push(DrawOp::FillRect {
                        x: MARGIN,
                        y: bottom,
                        width: column_width * columns as f32,
                        height: row_height,
                        color,
                    });
                }

                let mut ops = Vec::new();
                for (column, lines) in wrapped.iter().enumerate() {
                    let cell_left = MARGIN + column as f32 * column_width + CELL_PADDING_X;
                    let available = column_width - 2.0 * CELL_PADDING_X;
                    let mut line_top = top - CELL_PADDING_Y;
                    for line in lines.iter().skip(first).take(last - first) {
                        let x = match text_style.align {
                            Align::Left => cell_left,
                            Align::Center => cell_left + (available - line.width) / 2.0,
                            Align::Right => cell_left + available - line.width,
                        };
                        draw_line(&mut ops, line, x, baseline(line_top, text_style));
                        line_top -= leading;
                    }
                }
                self.ops().extend(ops);
                self.grid(top, bottom, columns, column_width, table.grid_color);

                self.cursor = bottom;
                self.fresh = false;
                first = last;
                if first < line_count {
                    self.new_page();
                }
            }
        }

        self.cursor -= table.space_after;
    }

    fn grid(&mut self, top: f32, bottom: f32, columns: usize, column_width: f32, color: Color) {
        let right = MARGIN + column_width * columns as f32;
        for y in [top, bottom] {
            self.ops().push(DrawOp::Line {
                x1: MARGIN,
                y1: y,
                x2: right,
                y2: y,
                width: GRID_WIDTH,
                color,
            });
        }
        for column in 0..=columns {
            let x = MARGIN + column as f32 * column_width;
            self.ops().push(DrawOp::Line {
                x1: x,
                y1: top,
                x2: x,
                y2: bottom,
                width: GRID_WIDTH,
                color,
            });
        }
    }
}

fn draw_line(ops: &mut Vec<DrawOp>, line: &Line, x: f32, y: f32) {
    let mut x = x;
    for fragment in &line.fragments {
        let text_y = y + fragment.rise;
        ops.push(DrawOp::Text {
            x,
            y: text_y,
            font: fragment.font,
            size: fragment.size,
            color: fragment.color,
            text: fragment.text.clone(),
        });
        if fragment.strike {
            let strike_y = text_y + fragment.size * 0.3;
            ops.push(DrawOp::Line {
                x1: x,
                y1: strike_y,
                x2: x + fragment.width,
                y2: strike_y,
                width: GRID_WIDTH,
                color: fragment.color,
            });
        }
        if let Some(url) = &fragment.link {
            ops.push(DrawOp::Link {
                x1: x,
                y1: text_y - fragment.size * 0.25,
                x2: x + fragment.width,
                y2: text_y + fragment.size * 0.85,
                url: url.clone(),
            });
        }
        x += fragment.width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_inline;

    fn body(text: &str) -> Flowable {
        Flowable::Paragraph(Paragraph::new(parse_inline(text), ParagraphStyle::default()))
    }

    fn text_ops(page: &Page) -> Vec<(f32, f32, String)> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, text, .. } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_short_paragraph_is_one_line() {
        let pages = layout(&[body("Hello world")]);
        assert_eq!(pages.len(), 1);
        let texts = text_ops(&pages[0]);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].2, "Hello world");
        assert_eq!(texts[0].0, MARGIN);
    }

    #[test]
    fn test_long_paragraph_wraps_within_content_width() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let lines = wrap(&parse_inline(&text), &ParagraphStyle::default(), CONTENT_WIDTH);
        assert!(lines.len() > 5);
        assert!(lines.iter().all(|l| l.width <= CONTENT_WIDTH));
    }

    #[test]
    fn test_overlong_word_is_broken() {
        let word = "x".repeat(400);
        let lines = wrap(&[Run::plain(word)], &ParagraphStyle::default(), 100.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 100.0));
    }

    #[test]
    fn test_styled_words_keep_their_fonts() {
        let lines = wrap(
            &parse_inline("plain **bold** tail"),
            &ParagraphStyle::default(),
            CONTENT_WIDTH,
        );
        assert_eq!(lines.len(), 1);
        let fonts: Vec<Font> = lines[0].fragments.iter().map(|f| f.font).collect();
        assert_eq!(
            fonts,
            vec![Font::Helvetica, Font::HelveticaBold, Font::Helvetica]
        );
    }

    #[test]
    fn test_paragraphs_overflow_onto_new_pages() {
        let flowables: Vec<Flowable> = (0..80).map(|i| body(&format!("Line {}", i))).collect();
        let pages = layout(&flowables);
        assert!(pages.len() >= 2);
        for page in &pages {
            for (_, y, _) in text_ops(page) {
                assert!(y >= BOTTOM && y <= TOP);
            }
        }
    }

    #[test]
    fn test_page_break_skips_blank_pages() {
        let pages = layout(&[
            Flowable::PageBreak,
            body("first"),
            Flowable::PageBreak,
            Flowable::PageBreak,
            body("second"),
        ]);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text(), "first");
        assert_eq!(pages[1].text(), "second");
    }

    #[test]
    fn test_links_produce_annotations() {
        let pages = layout(&[body("see [docs](https://example.com) here")]);
        let links: Vec<&DrawOp> = pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Link { .. }))
            .collect();
        assert_eq!(links.len(), 1);
        match links[0] {
            DrawOp::Link { url, x1, x2, .. } => {
                assert_eq!(url, "https://example.com");
                assert!(x2 > x1);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_table_draws_every_cell_and_grid() {
        let style = CellStyle {
            text: ParagraphStyle {
                size: 9.0,
                leading: 11.0,
                ..ParagraphStyle::default()
            },
            backgrounds: vec![Color::WHITE, Color::WHITE_SMOKE],
        };
        let table = TableFlow {
            header: vec![vec![Run::plain("A")], vec![Run::plain("B")]],
            rows: vec![vec![vec![Run::plain("1")], vec![Run::plain("2")]]],
            header_style: style.clone(),
            body_style: style,
            grid_color: Color::GREY,
            space_before: 6.0,
            space_after: 6.0,
        };
        let pages = layout(&[Flowable::Table(table)]);
        let texts: Vec<String> = text_ops(&pages[0]).into_iter().map(|t| t.2).collect();
        assert_eq!(texts, vec!["A", "B", "1", "2"]);
        let lines = pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count();
        assert_eq!(lines, 2 * (2 + 3));
    }

    #[test]
    fn test_shaded_paragraph_fill_spans_its_lines() {
        let style = ParagraphStyle {
            background: Some(Color::WHITE_SMOKE),
            padding: 5.0,
            ..ParagraphStyle::default()
        };
        let text = "shaded words ".repeat(60);
        let pages = layout(&[Flowable::Paragraph(Paragraph::new(parse_inline(&text), style))]);
        let fills: Vec<(f32, f32)> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { y, height, .. } => Some((*y, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 1);
        let (y, height) = fills[0];
        assert!((y + height - TOP).abs() < 0.01);
        for (_, text_y, _) in text_ops(&pages[0]) {
            assert!(text_y > y && text_y < TOP);
        }
    }

    #[test]
    fn test_trailing_spacer_adds_no_blank_page() {
        let mut flowables: Vec<Flowable> = (0..41).map(|i| body(&format!("Line {}", i))).collect();
        flowables.push(Flowable::Spacer(14.4));
        let pages = layout(&flowables);
        assert!(pages.iter().all(|p| !p.ops.is_empty()));

        let filled = pages.len();
        flowables.push(Flowable::Spacer(500.0));
        flowables.push(body("after the gap"));
        let pages = layout(&flowables);
        assert_eq!(pages.len(), filled + 1);
        assert_eq!(pages.last().map(Page::text).as_deref(), Some("after the gap"));
    }

    #[test]
    fn test_tall_table_row_splits_across_pages() {
        let words: Vec<String> = (0..1500).map(|i| format!("w{}", i)).collect();
        let style = CellStyle {
            text: ParagraphStyle::default(),
            backgrounds: vec![Color::WHITE],
        };
        let table = TableFlow {
            header: vec![vec![Run::plain("Key")], vec![Run::plain("Value")]],
            rows: vec![vec![vec![Run::plain("long")], vec![Run::plain(words.join(" "))]]],
            header_style: style.clone(),
            body_style: style,
            grid_color: Color::GREY,
            space_before: 6.0,
            space_after: 6.0,
        };
        let pages = layout(&[body("intro"), Flowable::Table(table)]);
        assert!(pages.len() >= 2);
        for page in &pages {
            for (_, y, _) in text_ops(page) {
                assert!(y >= BOTTOM && y <= TOP, "text drawn at {}", y);
            }
        }
        let all_text: String = pages.iter().map(Page::text).collect::<Vec<_>>().join(" ");
        assert!(all_text.contains("w0 "));
        assert!(all_text.contains("w1499"));
    }

    #[test]
    fn test_footer_numbers_every_page() {
        let mut pages = vec![Page::default(), Page::default(), Page::default()];
        apply_footer(&mut pages, "Footer");
        for (i, page) in pages.iter().enumerate() {
            let texts: Vec<String> = text_ops(page).into_iter().map(|t| t.2).collect();
            assert_eq!(texts, vec!["Footer".to_string(), format!("Page {}", i + 1)]);
        }
    }

    #[test]
    fn test_tint_over_white() {
        assert_eq!(Color::BLACK.tint(0.0), Color::WHITE);
        assert_eq!(Color::BLACK.tint(1.0), Color::BLACK);
    }
}
