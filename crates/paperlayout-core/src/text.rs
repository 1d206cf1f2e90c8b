//! Positioned text spans and their normalization into region text.

use crate::geometry::BBox;

/// A run of text shown by one text operator, in page coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextSpan {
    /// Decoded text.
    pub text: String,
    /// Bounding box in top-left origin coordinates.
    pub bbox: BBox,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Collapse every run of whitespace to one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Line {
    text: String,
    bbox: BBox,
}

/// Horizontal gap, as a multiple of the span height, that separates table
/// cells rather than words.
const CELL_GAP_RATIO: f64 = 1.0;

fn group_lines(spans: &[TextSpan], cell_separator: Option<char>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        let same_line = lines.last().is_some_and(|line| {
            let height = line.bbox.height().max(span.bbox.height());
            (span.bbox.center_y() - line.bbox.center_y()).abs() <= height / 2.0
        });

        if same_line {
            if let Some(line) = lines.last_mut() {
                let gap = span.bbox.x0 - line.bbox.x1;
                match cell_separator {
                    Some(separator) if gap > span.bbox.height() * CELL_GAP_RATIO => {
                        line.text.push(separator);
                    }
                    _ => {
                        let needs_space = gap > span.bbox.height() * 0.15
                            && !line.text.ends_with(char::is_whitespace)
                            && !span.text.starts_with(char::is_whitespace);
                        if needs_space {
                            line.text.push(' ');
                        }
                    }
                }
                line.text.push_str(&span.text);
                line.bbox = line.bbox.union(&span.bbox);
            }
        } else {
            lines.push(Line {
                text: span.text.clone(),
                bbox: span.bbox,
            });
        }
    }

    for line in &mut lines {
        line.text = match cell_separator {
            Some(separator) => line
                .text
                .split(separator)
                .map(collapse_whitespace)
                .collect::<Vec<_>>()
                .join(&separator.to_string()),
            None => collapse_whitespace(&line.text),
        };
    }
    lines.retain(|line| !line.text.trim().is_empty());
    lines
}

/// Join `next` onto `text`, undoing end-of-line hyphenation.
fn append_line(text: &mut String, next: &str) {
    if text.is_empty() {
        text.push_str(next);
        return;
    }
    let mut chars = text.chars().rev();
    let hyphenated = chars.next() == Some('-') && chars.next().is_some_and(char::is_alphabetic);
    if hyphenated {
        if next.chars().next().is_some_and(char::is_lowercase) {
            text.pop();
        }
    } else {
        text.push(' ');
    }
    text.push_str(next);
}

/// Turn a region's spans into normalized text.
///
/// Spans are taken in the order given. A span whose vertical center moves
/// by more than half a line height starts a new line; lines are joined with
/// single spaces (rejoining hyphenated words), and a vertical gap larger
/// than `paragraph_gap_ratio` times the line height starts a new paragraph
/// (`"\n\n"`).
pub fn spans_to_text(spans: &[TextSpan], paragraph_gap_ratio: f64) -> String {
    let lines = group_lines(spans, None);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<&BBox> = None;

    for line in &lines {
        if let Some(prev) = previous {
            let gap = line.bbox.top - prev.bottom;
            if gap > prev.height() * paragraph_gap_ratio && !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        }
        append_line(&mut current, &line.text);
        previous = Some(&line.bbox);
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs.join("\n\n")
}

/// Turn a table region's spans into rows of tab-separated cells.
///
/// Spans on one line separated by more than a line height become separate
/// cells; each line becomes one row.
pub fn spans_to_table_text(spans: &[TextSpan]) -> String {
    group_lines(spans, Some('\t'))
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}
