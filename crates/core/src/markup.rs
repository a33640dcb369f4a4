//! Inline markup conversion.
//!
//! Report text uses a small markdown-like inline syntax. Conversion happens in two steps:
//! the text is first rewritten into a tag-based intermediate form (`<b>`, `<i>`, `<link>`,
//! `<code>`, `<strike>`, `<super>`, `<sub>`) by an ordered list of substitutions, and the
//! tagged text is then parsed into styled [`Run`]s for layout.
//!
//! Markup characters `&`, `<`, `>` and `"` in the source are entity-escaped before any
//! substitution, so every `<` left in the intermediate form is a tag. Code span contents and
//! link targets are literal: they are set aside before the emphasis substitutions run and
//! restored afterwards.
//!
//! | Syntax            | Result          |
//! |-------------------|-----------------|
//! | `**x**`, `__x__`  | bold            |
//! | `*x*`, `_x_`      | italic          |
//! | `[label](url)`    | link            |
//! | `` `x` ``         | monospace       |
//! | `~~x~~`           | strikethrough   |
//! | `^x^`             | superscript     |
//! | `~x~`             | subscript       |

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Delimits placeholders for set-aside literals. Sanitized text never contains NUL.
const PLACEHOLDER: char = '\u{0}';

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid regex"));

/// Emphasis substitutions, applied in order. Bold precedes italic and strikethrough precedes
/// subscript so the doubled markers are consumed first.
static EMPHASIS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"), "<b>$1</b>"),
        (Regex::new(r"__(.+?)__").expect("valid regex"), "<b>$1</b>"),
        (Regex::new(r"\*([^*]+)\*").expect("valid regex"), "<i>$1</i>"),
        (Regex::new(r"\b_([^_]+)_\b").expect("valid regex"), "<i>$1</i>"),
        (Regex::new(r"~~(.+?)~~").expect("valid regex"), "<strike>$1</strike>"),
        (Regex::new(r"\^([^\^]+)\^").expect("valid regex"), "<super>$1</super>"),
        (Regex::new(r"~([^~]+)~").expect("valid regex"), "<sub>$1</sub>"),
    ]
});

static PLACEHOLDER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00([CU])(\d+)\x00").expect("valid regex"));

/// Style flags of one run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strike: bool,
    pub superscript: bool,
    pub subscript: bool,
}

impl RunStyle {
    pub const PLAIN: RunStyle = RunStyle {
        bold: false,
        italic: false,
        code: false,
        strike: false,
        superscript: false,
        subscript: false,
    };

    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::PLAIN
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::PLAIN
        }
    }

    pub fn code() -> Self {
        Self {
            code: true,
            ..Self::PLAIN
        }
    }
}

/// A maximal span of text sharing one style and link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
    pub link: Option<String>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, RunStyle::PLAIN)
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::PLAIN,
            link: Some(url.into()),
        }
    }
}

/// Escapes the characters that have meaning in the tagged intermediate form.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_markup`].
pub fn unescape_markup(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Rewrites inline markup into the tagged intermediate form.
pub fn to_tagged(text: &str) -> String {
    let escaped = escape_markup(text);

    let mut literals: Vec<String> = Vec::new();
    let mut urls: Vec<String> = Vec::new();

    let stashed = CODE_SPAN.replace_all(&escaped, |caps: &Captures| {
        literals.push(caps[1].to_string());
        format!("{p}C{}{p}", literals.len() - 1, p = PLACEHOLDER)
    });
    let stashed = LINK.replace_all(&stashed, |caps: &Captures| {
        urls.push(caps[2].trim().to_string());
        format!(
            "<link href=\"{p}U{}{p}\">{}</link>",
            urls.len() - 1,
            &caps[1],
            p = PLACEHOLDER
        )
    });

    let mut tagged = stashed.into_owned();
    for (pattern, replacement) in EMPHASIS.iter() {
        tagged = pattern.replace_all(&tagged, *replacement).into_owned();
    }

    PLACEHOLDER_TOKEN
        .replace_all(&tagged, |caps: &Captures| {
            let index: usize = caps[2].parse().unwrap_or(usize::MAX);
            match &caps[1] {
                "C" => literals
                    .get(index)
                    .map(|code| format!("<code>{}</code>", code))
                    .unwrap_or_default(),
                _ => urls.get(index).cloned().unwrap_or_default(),
            }
        })
        .into_owned()
}

/// Converts inline markup into styled runs.
pub fn parse_inline(text: &str) -> Vec<Run> {
    parse_tagged(&to_tagged(text))
}

/// Parses the tagged intermediate form into runs, merging neighbours with identical style.
///
/// Unknown or unbalanced tags are tolerated: unknown tags are dropped and a closing tag
/// without an opener has no effect.
pub fn parse_tagged(tagged: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut depth = StyleDepth::default();
    let mut link: Option<String> = None;
    let mut rest = tagged;

    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_run(&mut runs, rest, depth.style(), link.clone());
            break;
        };
        if open > 0 {
            push_run(&mut runs, &rest[..open], depth.style(), link.clone());
        }
        let Some(close) = rest[open..].find('>') else {
            push_run(&mut runs, &rest[open..], depth.style(), link.clone());
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        match tag {
            "b" => depth.bold += 1,
            "/b" => depth.bold = depth.bold.saturating_sub(1),
            "i" => depth.italic += 1,
            "/i" => depth.italic = depth.italic.saturating_sub(1),
            "code" => depth.code += 1,
            "/code" => depth.code = depth.code.saturating_sub(1),
            "strike" => depth.strike += 1,
            "/strike" => depth.strike = depth.strike.saturating_sub(1),
            "super" => depth.superscript += 1,
            "/super" => depth.superscript = depth.superscript.saturating_sub(1),
            "sub" => depth.subscript += 1,
            "/sub" => depth.subscript = depth.subscript.saturating_sub(1),
            "/link" => link = None,
            t if t.starts_with("link ") => link = link_target(t),
            _ => {}
        }
    }

    runs
}

#[derive(Debug, Default)]
struct StyleDepth {
    bold: u32,
    italic: u32,
    code: u32,
    strike: u32,
    superscript: u32,
    subscript: u32,
}

impl StyleDepth {
    fn style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: self.code > 0,
            strike: self.strike > 0,
            superscript: self.superscript > 0,
            subscript: self.subscript > 0,
        }
    }
}

fn link_target(tag: &str) -> Option<String> {
    let start = tag.find("href=\"")? + "href=\"".len();
    let end = tag[start..].find('"')? + start;
    Some(unescape_markup(&tag[start..end]))
}

fn push_run(runs: &mut Vec<Run>, escaped: &str, style: RunStyle, link: Option<String>) {
    let text = unescape_markup(escaped);
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style && last.link == link => last.text.push_str(&text),
        _ => runs.push(Run { text, style, link }),
    }
}

/// Concatenated text of `runs` without styling.
pub fn plain_text(runs: &[Run]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_inline_markup() {
        let runs = parse_inline("**a** and *b* and [c](http://x) and `d`");
        assert_eq!(
            runs,
            vec![
                Run::styled("a", RunStyle::bold()),
                Run::plain(" and "),
                Run::styled("b", RunStyle::italic()),
                Run::plain(" and "),
                Run::link("c", "http://x"),
                Run::plain(" and "),
                Run::styled("d", RunStyle::code()),
            ]
        );
    }

    #[test]
    fn test_to_tagged_forms() {
        assert_eq!(to_tagged("**a**"), "<b>a</b>");
        assert_eq!(to_tagged("__a__"), "<b>a</b>");
        assert_eq!(to_tagged("_a_ b"), "<i>a</i> b");
        assert_eq!(to_tagged("~~gone~~"), "<strike>gone</strike>");
        assert_eq!(to_tagged("H~2~O"), "H<sub>2</sub>O");
        assert_eq!(to_tagged("x^2^"), "x<super>2</super>");
        assert_eq!(
            to_tagged("[c](http://x)"),
            "<link href=\"http://x\">c</link>"
        );
    }

    #[test]
    fn test_markup_characters_are_escaped() {
        assert_eq!(to_tagged("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(
            parse_inline("a < b & <script>"),
            vec![Run::plain("a < b & <script>")]
        );
    }

    #[test]
    fn test_code_and_urls_are_literal() {
        assert_eq!(
            parse_inline("`**not bold**`"),
            vec![Run::styled("**not bold**", RunStyle::code())]
        );
        assert_eq!(
            parse_inline("[docs](https://x.org/_private_/a*b*c)"),
            vec![Run::link("docs", "https://x.org/_private_/a*b*c")]
        );
    }

    #[test]
    fn test_snake_case_words_stay_plain() {
        assert_eq!(
            parse_inline("call my_function_name now"),
            vec![Run::plain("call my_function_name now")]
        );
    }

    #[test]
    fn test_nested_styles_and_merging() {
        let runs = parse_inline("**bold *both* bold**");
        assert_eq!(
            runs,
            vec![
                Run::styled("bold ", RunStyle::bold()),
                Run::styled(
                    "both",
                    RunStyle {
                        bold: true,
                        italic: true,
                        ..RunStyle::PLAIN
                    }
                ),
                Run::styled(" bold", RunStyle::bold()),
            ]
        );
        assert_eq!(parse_tagged("a<b></b>b"), vec![Run::plain("ab")]);
    }

    #[test]
    fn test_unbalanced_tags_are_tolerated() {
        assert_eq!(parse_tagged("x</b>y<unknown>z"), vec![Run::plain("xyz")]);
        assert_eq!(plain_text(&parse_inline("*open only")), "*open only");
    }
}
