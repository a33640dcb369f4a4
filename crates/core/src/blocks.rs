//! Block-level classification of report text.
//!
//! Text is split into blocks on blank lines and each block is classified independently.
//! Inline markup inside a block is left untouched here; see [`crate::markup`].

/// Deepest heading level rendered distinctly. Deeper headings are clamped to it.
const MAX_HEADING_LEVEL: u8 = 3;

/// Minimum number of non-empty lines (header, separator, one body row) for a table.
const MIN_TABLE_LINES: usize = 3;

/// A classified block of report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    BulletItem(String),
    NumberedItem { number: String, text: String },
    Quote(String),
    Table(Table),
    Paragraph(String),
}

/// A pipe-delimited table with a header row and uniformly sized body rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Splits `text` into blocks on blank lines and classifies each one.
///
/// List blocks expand into one block per line: a line carrying the list's marker becomes an
/// item and any other line becomes a paragraph.
pub fn classify_blocks(text: &str) -> Vec<Block> {
    let normalized = text.replace("\r\n", "\n");
    let mut blocks = Vec::new();

    for raw in normalized.split("\n\n") {
        let block = raw.trim();
        if block.is_empty() {
            continue;
        }
        if is_bullet_line(block) || numbered_item(block).is_some() {
            let numbered = !is_bullet_line(block);
            blocks.extend(
                block
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(|line| list_line(line, numbered)),
            );
        } else {
            blocks.push(classify_block(block));
        }
    }

    blocks
}

fn list_line(line: &str, numbered: bool) -> Block {
    let item = if numbered {
        numbered_item(line)
    } else {
        strip_bullet(line).map(|text| Block::BulletItem(text.to_string()))
    };
    item.unwrap_or_else(|| Block::Paragraph(line.to_string()))
}

/// Classifies a single trimmed block as a whole. [`classify_blocks`] additionally splits list
/// blocks into per-line items.
pub fn classify_block(block: &str) -> Block {
    if let Some(heading) = heading(block) {
        return heading;
    }
    if let Some(item) = strip_bullet(block) {
        return Block::BulletItem(item.to_string());
    }
    if let Some(numbered) = numbered_item(block) {
        return numbered;
    }
    if block.starts_with('>') {
        return Block::Quote(quote_text(block));
    }
    if looks_like_table(block) {
        if let Some(table) = parse_table(block) {
            return Block::Table(table);
        }
        tracing::warn!("malformed table block, rendering as paragraph");
    }
    Block::Paragraph(block.to_string())
}

fn heading(block: &str) -> Option<Block> {
    let hashes = block.chars().take_while(|&c| c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &block[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let level = u8::try_from(hashes)
        .unwrap_or(MAX_HEADING_LEVEL)
        .min(MAX_HEADING_LEVEL);
    Some(Block::Heading {
        level,
        text: rest.trim().to_string(),
    })
}

fn is_bullet_line(line: &str) -> bool {
    line.starts_with("- ") || line.starts_with("* ")
}

fn strip_bullet(line: &str) -> Option<&str> {
    is_bullet_line(line).then(|| line[2..].trim())
}

fn numbered_item(block: &str) -> Option<Block> {
    let digits = block.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || !block[digits..].starts_with('.') {
        return None;
    }
    Some(Block::NumberedItem {
        number: block[..digits].to_string(),
        text: block[digits + 1..].trim().to_string(),
    })
}

fn quote_text(block: &str) -> String {
    block
        .lines()
        .map(|line| line.trim().trim_start_matches('>').trim())
        .collect::<Vec<_>>()
        .join("\n")
}

fn looks_like_table(block: &str) -> bool {
    block.contains('|') && (block.contains("---") || block.contains("-+-"))
}

fn is_separator_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | '+' | ' ' | '\t'))
}

fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(str::to_string).collect()
}

/// Parses a pipe table. Returns `None` unless there are at least three non-empty lines, every
/// line contains a pipe, the second line is the separator and every body row has as many
/// cells as the header.
fn parse_table(block: &str) -> Option<Table> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < MIN_TABLE_LINES || !lines.iter().all(|l| l.contains('|')) {
        return None;
    }

    let headers = split_row(lines[0]);
    if headers.is_empty() || !is_separator_row(lines[1]) {
        return None;
    }

    let mut rows = Vec::new();
    for line in &lines[2..] {
        let row = split_row(line);
        if row.len() != headers.len() {
            return None;
        }
        rows.push(row);
    }

    Some(Table { headers, rows })
}
