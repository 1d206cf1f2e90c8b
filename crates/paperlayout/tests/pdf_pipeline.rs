//! End-to-end tests over generated PDFs and CSV detections.

use lopdf::{Object, Stream, dictionary};
use paperlayout::{CsvDetections, DiagnosticCode, Engine, EngineError, Relevance};
use paperlayout_pdf::PdfSource;

/// Three pages, each with a heading, a body line and a running footer.
fn paper_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=3 {
        let content = format!(
            "BT /F1 12 Tf 72 700 Td (Section {n} heading) Tj ET \
             BT /F1 10 Tf 72 400 Td (Body text of page {n}.) Tj ET \
             BT /F1 8 Tf 250 30 Td (Proceedings of Tests 2024, page {n}) Tj ET"
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(3),
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

/// Detections in points (72 DPI) matching [`paper_pdf`].
fn paper_detections() -> CsvDetections {
    let mut csv = String::from("page_number,order,class_id,confidence,x0,y0,x1,y1\n");
    for page in 1..=3 {
        csv.push_str(&format!("{page},1,0,0.93,60,70,540,110\n"));
        csv.push_str(&format!("{page},2,1,0.91,60,380,540,420\n"));
        csv.push_str(&format!("{page},3,1,0.85,200,745,500,775\n"));
    }
    CsvDetections::from_reader(csv.as_bytes(), 72.0).unwrap()
}

#[test]
fn transcript_skips_running_footers() {
    let engine = Engine::new(paper_detections());
    let transcript = engine.transcript(&paper_pdf()).unwrap();
    assert_eq!(
        transcript.value,
        "Section 1 heading\n\nBody text of page 1.\n\n\
         Section 2 heading\n\nBody text of page 2.\n\n\
         Section 3 heading\n\nBody text of page 3."
    );
}

#[test]
fn analyze_marks_footers_as_noise() {
    let doc = Engine::new(paper_detections()).analyze(&paper_pdf()).unwrap();
    assert_eq!(doc.pages.len(), 3);
    for page in &doc.pages {
        let footer = page.regions.iter().find(|r| r.bbox().top > 700.0).unwrap();
        assert_eq!(footer.relevance(), Some(Relevance::Noise));
        assert_eq!(
            footer.text(),
            Some(format!("Proceedings of Tests 2024, page {}", page.index + 1).as_str())
        );
    }
}

#[test]
fn cleaned_pdf_drops_footer_text_only() {
    let cleaned = Engine::new(paper_detections())
        .cleaned_pdf(&paper_pdf())
        .unwrap()
        .value;
    let source = PdfSource::open(&cleaned).unwrap();
    assert_eq!(source.page_count(), 3);
    for page in 0..3 {
        let texts: Vec<String> = source
            .page_spans(page)
            .unwrap()
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                format!("Section {} heading", page + 1),
                format!("Body text of page {}.", page + 1),
            ]
        );
    }
}

#[test]
fn annotated_pdf_keeps_text_and_adds_labels() {
    let annotated = Engine::new(paper_detections())
        .annotated_pdf(&paper_pdf())
        .unwrap()
        .value;
    let source = PdfSource::open(&annotated).unwrap();
    let texts: Vec<String> = source
        .page_spans(0)
        .unwrap()
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert!(texts.contains(&"Body text of page 1.".to_string()));
    assert!(texts.contains(&"1. title (93%)".to_string()));
    assert!(texts.contains(&"3. plain text (85%)".to_string()));
}

#[test]
fn markdown_headings() {
    let bundle = Engine::new(paper_detections())
        .markdown(&paper_pdf(), "paper")
        .unwrap()
        .value;
    assert!(bundle.markdown.starts_with("# Section 1 heading\n\nBody text of page 1.\n\n## Section 2 heading"));
    assert!(!bundle.markdown.contains("Proceedings"));
    assert!(bundle.images.is_empty());
}

#[test]
fn detections_csv_reproduces_boxes() {
    let csv = Engine::new(paper_detections())
        .detections_csv(&paper_pdf(), 72.0)
        .unwrap()
        .value;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines[1].starts_with("1,1,0,0.93,60"));
    assert!(lines[3].starts_with("1,3,1,0.85,200"));
    assert!(lines[9].starts_with("3,3,1,0.85,200"));
}

#[cfg(not(feature = "pdfium"))]
#[test]
fn figures_without_renderer_are_reported() {
    let csv = "page_number,order,class_id,confidence,x0,y0,x1,y1\n1,1,3,0.9,100,150,500,350\n";
    let detections = CsvDetections::from_reader(csv.as_bytes(), 72.0).unwrap();
    let archive = Engine::new(detections)
        .figure_archive(&paper_pdf(), "paper")
        .unwrap();

    let codes: Vec<&DiagnosticCode> = archive.diagnostics.iter().map(|d| &d.code).collect();
    // once from extraction, once from the archive
    assert_eq!(
        codes
            .iter()
            .filter(|c| ***c == DiagnosticCode::ExtractionFailed)
            .count(),
        2
    );
    let zip = zip::ZipArchive::new(std::io::Cursor::new(archive.value)).unwrap();
    assert_eq!(zip.len(), 0);
}

#[test]
fn corrupt_input_is_unparseable() {
    let err = Engine::new(paper_detections())
        .analyze(b"%PDF-1.5 truncated")
        .unwrap_err();
    assert!(matches!(err, EngineError::UnparseablePdf(_)));
}
