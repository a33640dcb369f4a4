//! Serialization of laid-out pages into a PDF file.

use super::fonts::{encode_win_ansi, Font};
use super::layout::{Color, DrawOp, Page, PAGE_HEIGHT, PAGE_WIDTH};
use super::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

const PDF_VERSION: &str = "1.5";
const PRODUCER: &str = "LibreResearch";

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn color_operands(color: Color) -> Vec<Object> {
    vec![real(color.r), real(color.g), real(color.b)]
}

/// Writes `pages` as a PDF document and returns its bytes.
///
/// # Errors
///
/// Returns `RenderError::Encode` if page content cannot be encoded and `RenderError::Write`
/// if the document cannot be serialized.
pub fn write_pdf(pages: &[Page], title: &str) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_name(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let annotations: Vec<Object> = link_annotations(page)
            .into_iter()
            .map(|annotation| Object::Reference(doc.add_object(annotation)))
            .collect();

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !annotations.is_empty() {
            page_dict.set("Annots", annotations);
        }
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = info_dictionary(&mut doc, title);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Write(e.to_string()))?;
    Ok(bytes)
}

fn info_dictionary(doc: &mut Document, title: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal(PRODUCER),
    })
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(*y), real(*width), real(*height)],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![real(*width)]));
                ops.push(Operation::new("m", vec![real(*x1), real(*y1)]));
                ops.push(Operation::new("l", vec![real(*x2), real(*y2)]));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Text {
                x,
                y,
                font,
                size,
                color,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font.resource_name().as_bytes().to_vec()),
                        real(*size),
                    ],
                ));
                ops.push(Operation::new("Td", vec![real(*x), real(*y)]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Link { .. } => {}
        }
    }
    ops
}

fn link_annotations(page: &Page) -> Vec<Dictionary> {
    page.ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Link {
                x1,
                y1,
                x2,
                y2,
                url,
            } => Some(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Link",
                "Rect" => vec![real(*x1), real(*y1), real(*x2), real(*y2)],
                "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
                "A" => dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal(url.as_bytes().to_vec()),
                },
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::{apply_footer, layout, Flowable, Paragraph, ParagraphStyle};
    use crate::markup::parse_inline;

    #[test]
    fn test_written_document_loads_with_expected_pages() {
        let flowables = vec![
            Flowable::Paragraph(Paragraph::new(
                parse_inline("first page with a [link](https://example.com)"),
                ParagraphStyle::default(),
            )),
            Flowable::PageBreak,
            Flowable::Paragraph(Paragraph::new(
                parse_inline("second page"),
                ParagraphStyle::default(),
            )),
        ];
        let mut pages = layout(&flowables);
        apply_footer(&mut pages, "Footer");
        let bytes = write_pdf(&pages, "Title").unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_link_annotations_only_for_links() {
        let pages = layout(&[Flowable::Paragraph(Paragraph::new(
            parse_inline("[a](http://a) and [b](http://b)"),
            ParagraphStyle::default(),
        ))]);
        assert_eq!(link_annotations(&pages[0]).len(), 2);
    }
}
