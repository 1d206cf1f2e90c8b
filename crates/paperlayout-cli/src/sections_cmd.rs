use std::path::Path;

use paperlayout::SectionKind;
use serde_json::json;

use crate::cli::{InputArgs, OutputFormat};
use crate::shared::{fail, load_job, report, write_output};

pub fn run(
    input: &InputArgs,
    sections: &[SectionKind],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), i32> {
    let job = load_job(input)?;
    let found = report(job.engine.sections(&job.pdf, sections).map_err(fail)?);
    let text = match format {
        OutputFormat::Text => render_text(&found),
        OutputFormat::Json => render_json(&found).map_err(fail)?,
    };
    write_output(output, text.as_bytes())
}

/// One `== name ==` block per section; missing sections print `(not found)`.
fn render_text(sections: &[(SectionKind, String)]) -> String {
    let mut out = String::new();
    for (kind, text) in sections {
        out.push_str(&format!("== {kind} ==\n"));
        if text.is_empty() {
            out.push_str("(not found)\n");
        } else {
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn render_json(sections: &[(SectionKind, String)]) -> Result<String, serde_json::Error> {
    let entries: Vec<_> = sections
        .iter()
        .map(|(kind, text)| json!({ "section": kind.name(), "text": text }))
        .collect();
    let mut json = serde_json::to_string_pretty(&entries)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_marks_missing_sections() {
        let out = render_text(&[
            (SectionKind::Methods, "Methods\nWe measured.\n".to_string()),
            (SectionKind::Results, String::new()),
        ]);
        assert_eq!(
            out,
            "== methods ==\nMethods\nWe measured.\n\n== results ==\n(not found)\n\n"
        );
    }

    #[test]
    fn json_lists_sections_in_order() {
        let out = render_json(&[
            (SectionKind::Discussion, "Discussion\nIt works.".to_string()),
            (SectionKind::DataAvailability, String::new()),
        ])
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["section"], "discussion");
        assert_eq!(value[0]["text"], "Discussion\nIt works.");
        assert_eq!(value[1]["section"], "data_availability");
        assert_eq!(value[1]["text"], "");
    }
}
