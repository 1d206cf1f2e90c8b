//! Integration tests for span extraction and page editing.

use lopdf::{Object, Stream, dictionary};
use paperlayout_core::{BBox, Rgb};
use paperlayout_pdf::{BackendError, PdfSource};

/// Build a PDF with one page per content stream. The media box is set on
/// the page tree so pages inherit it.
fn build_pdf(contents: &[&[u8]]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

const TWO_LINES: &[u8] =
    b"BT /F1 10 Tf 72 700 Td (Header text) Tj ET BT /F1 10 Tf 72 400 Td (Body) Tj ( tail) Tj ET";

#[test]
fn open_rejects_garbage() {
    let err = PdfSource::open(b"not a pdf at all").unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[test]
fn page_count_and_inherited_size() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES, b""])).unwrap();
    assert_eq!(source.page_count(), 2);
    assert_eq!(source.page_size(1).unwrap(), (612.0, 792.0));
    assert!(matches!(
        source.page_size(2),
        Err(BackendError::PageOutOfRange { index: 2, count: 2 })
    ));
}

#[test]
fn spans_are_positioned_top_left() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES])).unwrap();
    let spans = source.page_spans(0).unwrap();
    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Header text", "Body", " tail"]);

    let header = &spans[0];
    assert!((header.bbox.x0 - 72.0).abs() < 1e-3);
    assert!((header.bbox.bottom - 94.0).abs() < 1e-3);
    assert!(header.bbox.top < header.bbox.bottom);
    // second span on the body line starts where the first ended
    assert!((spans[2].bbox.x0 - spans[1].bbox.x1).abs() < 1e-3);
}

#[test]
fn empty_page_has_no_spans() {
    let source = PdfSource::open(&build_pdf(&[b""])).unwrap();
    assert!(source.page_spans(0).unwrap().is_empty());
}

#[test]
fn redaction_removes_only_covered_text() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES])).unwrap();
    let mut editor = source.editor();
    editor
        .redact(0, BBox::new(0.0, 80.0, 612.0, 100.0))
        .unwrap();
    let saved = editor.save().unwrap();

    let cleaned = PdfSource::open(&saved).unwrap();
    let spans = cleaned.page_spans(0).unwrap();
    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Body", " tail"]);
    assert!((spans[0].bbox.x0 - 72.0).abs() < 1e-3);
}

#[test]
fn redaction_keeps_following_text_in_place() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES])).unwrap();
    let before = source.page_spans(0).unwrap();
    let body = before[1].bbox;

    let mut editor = source.editor();
    editor.redact(0, body.expand(0.5)).unwrap();
    let after = PdfSource::open(&editor.save().unwrap())
        .unwrap()
        .page_spans(0)
        .unwrap();
    let tail = after.iter().find(|s| s.text == " tail").unwrap();
    assert!((tail.bbox.x0 - before[2].bbox.x0).abs() < 1e-2);
    assert!(after.iter().all(|s| s.text != "Body"));
}

#[test]
fn annotations_add_label_text() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES])).unwrap();
    let mut editor = source.editor();
    let region = BBox::new(60.0, 300.0, 300.0, 420.0);
    editor.draw_box(0, region, Rgb(1.0, 0.0, 0.0), 1.0).unwrap();
    editor
        .draw_label(0, region, "1. plain text (93%)", Rgb(0.0, 0.5, 0.0))
        .unwrap();
    let annotated = PdfSource::open(&editor.save().unwrap()).unwrap();

    let spans = annotated.page_spans(0).unwrap();
    let label = spans
        .iter()
        .find(|s| s.text == "1. plain text (93%)")
        .expect("label text drawn");
    assert!(label.bbox.bottom <= region.top + 1e-3);
    // original text survives annotation
    assert!(spans.iter().any(|s| s.text == "Header text"));
}

#[test]
fn editor_rejects_pages_out_of_range() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES])).unwrap();
    let mut editor = source.editor();
    assert!(matches!(
        editor.redact(3, BBox::new(0.0, 0.0, 1.0, 1.0)),
        Err(BackendError::PageOutOfRange { index: 3, count: 1 })
    ));
}

#[test]
fn unedited_save_round_trips() {
    let source = PdfSource::open(&build_pdf(&[TWO_LINES, TWO_LINES])).unwrap();
    let saved = source.editor().save().unwrap();
    let reopened = PdfSource::open(&saved).unwrap();
    assert_eq!(reopened.page_count(), 2);
    assert_eq!(reopened.page_spans(1).unwrap().len(), 3);
}
