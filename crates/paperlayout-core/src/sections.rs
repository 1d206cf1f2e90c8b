//! Named-section extraction over a plain-text transcript.
//!
//! Scientific papers announce sections with a small vocabulary of headers
//! ("Methods", "2. Results", "M E T H O D S", "3 | DISCUSSION"). A section
//! runs from its header to the next header of any other known kind.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A kind of paper section, each with its set of header terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SectionKind {
    Introduction,
    Methods,
    Results,
    Discussion,
    Conclusion,
    DataAvailability,
    References,
    Acknowledgements,
    Funding,
    ConflictOfInterest,
    AuthorContributions,
    Abbreviations,
    Limitations,
    SupplementaryData,
    Ethics,
}

impl SectionKind {
    pub const ALL: [SectionKind; 15] = [
        SectionKind::Introduction,
        SectionKind::Methods,
        SectionKind::Results,
        SectionKind::Discussion,
        SectionKind::Conclusion,
        SectionKind::DataAvailability,
        SectionKind::References,
        SectionKind::Acknowledgements,
        SectionKind::Funding,
        SectionKind::ConflictOfInterest,
        SectionKind::AuthorContributions,
        SectionKind::Abbreviations,
        SectionKind::Limitations,
        SectionKind::SupplementaryData,
        SectionKind::Ethics,
    ];

    /// Sections extracted when the caller asks for "all".
    pub const DEFAULT: [SectionKind; 4] = [
        SectionKind::Methods,
        SectionKind::Results,
        SectionKind::Discussion,
        SectionKind::DataAvailability,
    ];

    /// Header terms announcing this section (matched case-insensitively).
    pub fn terms(self) -> &'static [&'static str] {
        match self {
            SectionKind::Introduction => &["Introduction", "Background"],
            SectionKind::Methods => &[
                "Materials and Methods",
                "Methods and Materials",
                "Online Methods",
                "Experimental Procedures",
                "Experimental Section",
                "Methodology",
                "Methods",
            ],
            SectionKind::Results => &["Results and Discussion", "Results", "Findings"],
            SectionKind::Discussion => &["General Discussion", "Discussion"],
            SectionKind::Conclusion => &["Concluding Remarks", "Conclusions", "Conclusion"],
            SectionKind::DataAvailability => &[
                "Data Availability Statement",
                "Data and Code Availability",
                "Availability of Data and Materials",
                "Data Availability",
                "Code Availability",
            ],
            SectionKind::References => &[
                "References",
                "Bibliography",
                "Literature Cited",
                "Works Cited",
            ],
            SectionKind::Acknowledgements => &[
                "Acknowledgements",
                "Acknowledgments",
                "Acknowledgement",
                "Acknowledgment",
            ],
            SectionKind::Funding => &["Funding Information", "Financial Support", "Funding"],
            SectionKind::ConflictOfInterest => &[
                "Declaration of Competing Interest",
                "Conflicts of Interest",
                "Conflict of Interest",
                "Competing Interests",
                "Disclosures",
            ],
            SectionKind::AuthorContributions => &[
                "CRediT authorship contribution statement",
                "Authors' Contributions",
                "Author Contributions",
            ],
            SectionKind::Abbreviations => &["List of Abbreviations", "Abbreviations"],
            SectionKind::Limitations => &["Study Limitations", "Limitations"],
            SectionKind::SupplementaryData => &[
                "Supplementary Information",
                "Supplementary Material",
                "Supplementary Data",
                "Supporting Information",
            ],
            SectionKind::Ethics => &["Ethics Statement", "Ethics Approval", "Ethical Approval"],
        }
    }

    /// Snake-case name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::Methods => "methods",
            SectionKind::Results => "results",
            SectionKind::Discussion => "discussion",
            SectionKind::Conclusion => "conclusion",
            SectionKind::DataAvailability => "data_availability",
            SectionKind::References => "references",
            SectionKind::Acknowledgements => "acknowledgements",
            SectionKind::Funding => "funding",
            SectionKind::ConflictOfInterest => "conflict_of_interest",
            SectionKind::AuthorContributions => "author_contributions",
            SectionKind::Abbreviations => "abbreviations",
            SectionKind::Limitations => "limitations",
            SectionKind::SupplementaryData => "supplementary_data",
            SectionKind::Ethics => "ethics",
        }
    }

    /// Parse a name produced by [`SectionKind::name`] (dashes accepted).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|kind| kind.name() == normalized)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drop repeated non-empty lines after their first occurrence.
///
/// Empty (whitespace-only) lines are always kept.
pub fn remove_duplicate_paragraphs(text: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    text.split('\n')
        .filter(|line| line.trim().is_empty() || seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn alternation(terms: &[&str]) -> String {
    terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|")
}

fn spaced_alternation(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|term| {
            term.chars()
                .map(|c| regex::escape(&c.to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("|")
}

const BLANK_LINE: &str = r"\n\s*\n\s*";
const HEADER_END: &str = r"\s*[\n:]";

/// Compiled header patterns for one section kind.
struct SectionPatterns {
    /// Plain, spaced, numbered and piped header styles, tried in that order.
    headers: Vec<Regex>,
    /// A header of any other kind.
    next: Option<Regex>,
    /// A line starting with an inline header (`Methods: ...`).
    inline: Option<Regex>,
}

impl SectionPatterns {
    fn new(kind: SectionKind) -> Self {
        let terms = alternation(kind.terms());
        let headers = [
            format!("(?i){BLANK_LINE}({terms}){HEADER_END}"),
            format!("(?i){BLANK_LINE}({}){HEADER_END}", spaced_alternation(kind.terms())),
            format!(r"(?i){BLANK_LINE}(?:\d+\.|\[?\d+\]?\.?|[IVX]+\.)\s*({terms}){HEADER_END}"),
            format!(r"(?i){BLANK_LINE}(?:\d+\s*\|\s*)({terms}){HEADER_END}"),
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect();

        let others: Vec<&str> = SectionKind::ALL
            .iter()
            .filter(|other| **other != kind)
            .flat_map(|other| other.terms().iter().copied())
            .filter(|term| !kind.terms().contains(term))
            .collect();
        let next = Regex::new(&format!(
            r"(?i){BLANK_LINE}(?:\d+\.|\[?\d+\]?\.?|[IVX]+\.|\d+\s*\|\s*)?\s*({}|{}){HEADER_END}",
            alternation(&others),
            spaced_alternation(&others)
        ))
        .ok();

        let inline = Regex::new(&format!(r"(?i)\n\s*({terms})[\s:]([^\n]+)")).ok();

        Self { headers, next, inline }
    }

    fn get(kind: SectionKind) -> &'static SectionPatterns {
        &PATTERNS[kind as usize]
    }
}

/// One entry per kind, in `SectionKind::ALL` order.
static PATTERNS: LazyLock<Vec<SectionPatterns>> =
    LazyLock::new(|| SectionKind::ALL.into_iter().map(SectionPatterns::new).collect());

/// Byte offset of the first header of `kind`, trying the plain, spaced,
/// numbered and piped header styles in that order.
fn find_header(text: &str, kind: SectionKind) -> Option<usize> {
    SectionPatterns::get(kind)
        .headers
        .iter()
        .find_map(|re| re.find(text).map(|m| m.start()))
}

/// Byte offset (relative to `text`) of the next header of any other kind.
fn find_next_header(text: &str, kind: SectionKind) -> Option<usize> {
    let re = SectionPatterns::get(kind).next.as_ref()?;
    re.find(text).map(|m| m.start())
}

/// Extract one section from a transcript.
///
/// Duplicate lines are removed first. The header must start after a blank
/// line and be followed by a newline or colon; the returned text includes
/// the header and ends before the next known section header (or at the end
/// of the text). When no standalone header exists, a line starting with an
/// inline header (`Methods: ...`) is returned instead. Returns an empty
/// string if the section is absent.
pub fn extract_section(text: &str, kind: SectionKind) -> String {
    // Headers at the very start of the text still need a preceding blank line.
    let text = format!("\n\n{}\n", remove_duplicate_paragraphs(text));

    let Some(start) = find_header(&text, kind) else {
        return SectionPatterns::get(kind)
            .inline
            .as_ref()
            .and_then(|re| re.find(&text))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
    };

    let rest = &text[start + 1..];
    let end = find_next_header(rest, kind).map_or(text.len(), |offset| start + 1 + offset);
    text[start..end].trim().to_string()
}

/// Cut the transcript at its references section, if one is found.
pub fn remove_references_section(text: &str) -> String {
    let references = extract_section(text, SectionKind::References);
    if references.is_empty() {
        return text.to_string();
    }
    match text.find(&references) {
        Some(start) => text[..start].trim().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "A Study of Things\n\nAbstract text here.\n\n1. Introduction\nWe introduce.\n\n2. Methods\nWe measured things.\nCarefully.\n\n3. Results\nThings were found.\n\nReferences\n[1] Someone.";

    #[test]
    fn numbered_section_stops_at_next_header() {
        assert_eq!(
            extract_section(PAPER, SectionKind::Methods),
            "2. Methods\nWe measured things.\nCarefully."
        );
        assert_eq!(
            extract_section(PAPER, SectionKind::Results),
            "3. Results\nThings were found."
        );
    }

    #[test]
    fn plain_header_at_start_of_text() {
        let text = "Methods\nWe did it.\n\nDiscussion\nIt worked.";
        assert_eq!(extract_section(text, SectionKind::Methods), "Methods\nWe did it.");
        assert_eq!(extract_section(text, SectionKind::Discussion), "Discussion\nIt worked.");
    }

    #[test]
    fn spaced_letter_header() {
        let text = "Intro.\n\nM E T H O D S\nSpaced out.\n\nR E S U L T S\nFound.";
        assert_eq!(
            extract_section(text, SectionKind::Methods),
            "M E T H O D S\nSpaced out."
        );
    }

    #[test]
    fn piped_header() {
        let text = "Title\n\n1 | INTRODUCTION\nHello.\n\n2 | METHODS\nHow.";
        assert_eq!(
            extract_section(text, SectionKind::Introduction),
            "1 | INTRODUCTION\nHello."
        );
    }

    #[test]
    fn inline_header_returns_line() {
        let text = "Summary\nData availability: on request.\nMore text.";
        assert_eq!(
            extract_section(text, SectionKind::DataAvailability),
            "Data availability: on request."
        );
    }

    #[test]
    fn missing_section_is_empty() {
        assert_eq!(extract_section(PAPER, SectionKind::Funding), "");
    }

    #[test]
    fn duplicate_lines_removed_blank_lines_kept() {
        assert_eq!(
            remove_duplicate_paragraphs("a\n\nb\na\n\nb\nc"),
            "a\n\nb\n\nc"
        );
    }

    #[test]
    fn references_are_cut() {
        let cut = remove_references_section(PAPER);
        assert!(cut.ends_with("Things were found."));
        assert!(!cut.contains("Someone"));
        assert_eq!(remove_references_section("No refs here."), "No refs here.");
    }

    #[test]
    fn patterns_compile_for_every_kind() {
        for kind in SectionKind::ALL {
            let patterns = SectionPatterns::get(kind);
            assert_eq!(patterns.headers.len(), 4, "{kind}");
            assert!(patterns.next.is_some(), "{kind}");
            assert!(patterns.inline.is_some(), "{kind}");
        }
    }

    #[test]
    fn repeated_extraction_is_stable() {
        let first = extract_section(PAPER, SectionKind::Methods);
        for _ in 0..3 {
            assert_eq!(extract_section(PAPER, SectionKind::Methods), first);
        }
        assert_eq!(first, "2. Methods\nWe measured things.\nCarefully.");
        assert_eq!(
            extract_section(PAPER, SectionKind::Results),
            "3. Results\nThings were found."
        );
    }

    #[test]
    fn names_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(
            SectionKind::from_name("data-availability"),
            Some(SectionKind::DataAvailability)
        );
    }
}
