//! Standard Type 1 fonts and their glyph metrics.
//!
//! Only the base-14 fonts are used, so nothing is embedded. Widths come from the Adobe font
//! metrics for the printable ASCII range and are expressed in 1/1000 of the font size.
//! Oblique variants share the widths of their upright counterparts.

/// Bullet glyph, encoded as 0x95 in WinAnsiEncoding.
pub const BULLET: char = '\u{2022}';

const BULLET_WIDTH: u16 = 350;
const COURIER_WIDTH: u16 = 600;

/// Widths of `' '..='~'` in Helvetica.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Widths of `' '..='~'` in Helvetica-Bold.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// A standard font used in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
}

impl Font {
    pub const ALL: [Font; 5] = [
        Font::Helvetica,
        Font::HelveticaBold,
        Font::HelveticaOblique,
        Font::HelveticaBoldOblique,
        Font::Courier,
    ];

    /// Picks the font for a combination of style flags. Monospace wins over emphasis.
    pub fn for_style(bold: bool, italic: bool, code: bool) -> Self {
        match (code, bold, italic) {
            (true, _, _) => Font::Courier,
            (false, true, true) => Font::HelveticaBoldOblique,
            (false, true, false) => Font::HelveticaBold,
            (false, false, true) => Font::HelveticaOblique,
            (false, false, false) => Font::Helvetica,
        }
    }

    /// PostScript name used as `/BaseFont`.
    pub fn base_name(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
            Font::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Font::Courier => "Courier",
        }
    }

    /// Name of the font in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
            Font::HelveticaOblique => "F3",
            Font::HelveticaBoldOblique => "F4",
            Font::Courier => "F5",
        }
    }

    fn glyph_width(self, c: char) -> u16 {
        if c == BULLET {
            return match self {
                Font::Courier => COURIER_WIDTH,
                _ => BULLET_WIDTH,
            };
        }
        let table = match self {
            Font::Courier => return COURIER_WIDTH,
            Font::Helvetica | Font::HelveticaOblique => &HELVETICA_WIDTHS,
            Font::HelveticaBold | Font::HelveticaBoldOblique => &HELVETICA_BOLD_WIDTHS,
        };
        match c {
            ' '..='~' => table[c as usize - ' ' as usize],
            '\t' => table[0],
            _ => table['?' as usize - ' ' as usize],
        }
    }

    /// Width of `text` in points when set at `size`.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        units as f32 * size / 1000.0
    }
}

/// Encodes text for a WinAnsiEncoding font. Anything outside printable ASCII other than the
/// bullet becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            BULLET => 0x95,
            ' '..='~' => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(Font::Helvetica.text_width("i", 1000.0), 222.0);
        assert_eq!(Font::HelveticaBold.text_width("i", 1000.0), 278.0);
        assert_eq!(Font::HelveticaOblique.text_width("W", 10.0), 9.44);
        assert_eq!(Font::Courier.text_width("abc", 10.0), 18.0);
        assert_eq!(Font::Helvetica.text_width("~", 1000.0), 584.0);
    }

    #[test]
    fn test_style_selection() {
        assert_eq!(Font::for_style(true, true, true), Font::Courier);
        assert_eq!(Font::for_style(true, true, false), Font::HelveticaBoldOblique);
        assert_eq!(Font::for_style(false, true, false), Font::HelveticaOblique);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("\u{2022} a"), vec![0x95, b' ', b'a']);
        assert_eq!(encode_win_ansi("é"), vec![b'?']);
    }
}
