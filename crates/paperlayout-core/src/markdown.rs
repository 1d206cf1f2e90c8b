//! Plain-text and Markdown rendering of an analyzed document.
//!
//! Both renderers walk content regions in global reading order. Noise and
//! abandoned regions never contribute text.

use std::collections::{HashMap, HashSet};

use crate::document::Document;
use crate::error::{Diagnostic, DiagnosticCode};
use crate::region::{Region, RegionClass, RegionId};
use crate::text::collapse_whitespace;

/// Options for Markdown rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarkdownOptions {
    /// Directory (relative to the Markdown file) holding referenced images.
    /// Default: `"images"`.
    pub image_dir: String,
    /// Heading level for titles. The first title of the first page is always
    /// level 1. Default: `2`.
    pub heading_level: u8,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            image_dir: "images".to_string(),
            heading_level: 2,
        }
    }
}

/// An image the Markdown text links to.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownImage {
    /// Relative path used in the Markdown link.
    pub path: String,
    /// Region whose image payload provides the bytes.
    pub region: RegionId,
}

/// Markdown text plus the images it references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedMarkdown {
    pub markdown: String,
    pub images: Vec<MarkdownImage>,
    /// Best-effort fallbacks taken while rendering.
    pub diagnostics: Vec<Diagnostic>,
}

fn renders_text(region: &Region) -> bool {
    region.is_content() && region.class() != RegionClass::Abandon
}

/// Cell text of a table: the image's text layer, or the text payload kept
/// when the crop failed.
fn table_text(region: &Region) -> Option<&str> {
    region
        .image()
        .and_then(|image| image.text_layer.as_deref())
        .or_else(|| region.text())
}

fn region_text(region: &Region) -> Option<String> {
    region
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Concatenate content text in reading order, one blank line between regions.
pub fn render_transcript(document: &Document) -> String {
    document
        .ordered_regions()
        .into_iter()
        .filter(|r| renders_text(r) && r.class() != RegionClass::Table)
        .filter_map(region_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lowercased, underscore-separated slug of the first eight words of a
/// caption, at most 60 characters.
pub fn caption_slug(caption: &str) -> String {
    let words: Vec<&str> = caption.split_whitespace().take(8).collect();
    let mut slug = String::new();
    let mut pending_separator = false;
    for ch in words.join(" ").chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }
    slug.chars().take(60).collect::<String>().trim_end_matches('_').to_string()
}

/// File names for every content Figure or Table region of `class`.
///
/// Names follow `{stem}_page{p}_{kind}{k}[_{slug}].png`, with `p` the
/// 1-based page, `k` the 1-based position of the region among regions of
/// that class on its page in reading order, and `slug` taken from the
/// linked caption.
pub fn visual_file_names(
    document: &Document,
    stem: &str,
    class: RegionClass,
) -> Vec<(RegionId, String)> {
    let kind = match class {
        RegionClass::Figure => "figure",
        RegionClass::Table => "table",
        _ => return Vec::new(),
    };
    let mut names = Vec::new();
    for page in &document.pages {
        let regions = page
            .ordered()
            .into_iter()
            .filter(|r| r.class() == class && r.is_content());
        for (k, region) in regions.enumerate() {
            let slug = region
                .associated_caption()
                .and_then(|id| document.region(id))
                .and_then(|caption| caption.text())
                .map(caption_slug)
                .filter(|slug| !slug.is_empty());
            let name = match slug {
                Some(slug) => format!("{stem}_page{}_{kind}{}_{slug}.png", page.index + 1, k + 1),
                None => format!("{stem}_page{}_{kind}{}.png", page.index + 1, k + 1),
            };
            names.push((region.id(), name));
        }
    }
    names
}

/// Split a tab/multi-space separated table text into GFM.
///
/// Returns `None` unless there are at least two rows and every row splits
/// into the same number (at least two) of cells.
pub fn table_text_to_gfm(text: &str) -> Option<String> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.replace('\t', "  ")
                .split("  ")
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.replace('|', "\\|"))
                .collect()
        })
        .collect();

    let columns = rows.first()?.len();
    if rows.len() < 2 || columns < 2 || rows.iter().any(|row| row.len() != columns) {
        return None;
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!("| {} |", row.join(" | ")));
        if i == 0 {
            let sep: Vec<&str> = row.iter().map(|_| "---").collect();
            lines.push(format!("| {} |", sep.join(" | ")));
        }
    }
    Some(lines.join("\n"))
}

fn alt_text(caption: Option<&str>, fallback: &str) -> String {
    caption
        .map(collapse_whitespace)
        .map(|c| c.replace(['[', ']'], ""))
        .unwrap_or_else(|| fallback.to_string())
}

fn image_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

struct MarkdownWriter<'a> {
    document: &'a Document,
    options: &'a MarkdownOptions,
    names: HashMap<RegionId, String>,
    blocks: Vec<String>,
    out: RenderedMarkdown,
}

impl MarkdownWriter<'_> {
    fn linked_text(&self, id: Option<RegionId>) -> Option<String> {
        id.and_then(|id| self.document.region(id))
            .filter(|r| renders_text(r))
            .and_then(region_text)
            .map(|t| collapse_whitespace(&t))
    }

    fn push_image(&mut self, region: &Region, alt: &str) -> bool {
        let Some(name) = self.names.get(&region.id()) else {
            return false;
        };
        if region.image().is_none() {
            return false;
        }
        let path = image_path(&self.options.image_dir, name);
        self.blocks.push(format!("![{alt}]({path})"));
        self.out.images.push(MarkdownImage {
            path,
            region: region.id(),
        });
        true
    }

    fn push_italic(&mut self, text: Option<String>) {
        if let Some(text) = text {
            self.blocks.push(format!("*{text}*"));
        }
    }

    fn heading(&mut self, region: &Region, first_title: bool) {
        if let Some(text) = region_text(region) {
            let level = if first_title { 1 } else { self.options.heading_level.clamp(1, 6) };
            let hashes = "#".repeat(level as usize);
            self.blocks.push(format!("{hashes} {}", collapse_whitespace(&text)));
        }
    }

    fn figure(&mut self, region: &Region) {
        let caption = self.linked_text(region.associated_caption());
        self.push_image(region, &alt_text(caption.as_deref(), "Figure"));
        self.push_italic(caption);
    }

    fn table(&mut self, region: &Region) {
        let caption = self.linked_text(region.associated_caption());
        let footnote = self.linked_text(region.associated_footnote());
        let gfm = table_text(region).and_then(table_text_to_gfm);

        match gfm {
            Some(table) => {
                self.blocks.push(table);
                self.push_italic(caption);
            }
            None => {
                let linked = self.push_image(region, &alt_text(caption.as_deref(), "Table"));
                let description = if linked {
                    "table structure could not be inferred; emitted as image"
                } else {
                    "table structure could not be inferred and no image is available; \
                     emitted caption only"
                };
                self.out.diagnostics.push(Diagnostic::for_region(
                    DiagnosticCode::TableMarkdownFallback,
                    description,
                    region.id(),
                ));
                self.push_italic(caption);
            }
        }
        self.push_italic(footnote);
    }

    fn formula(&mut self, region: &Region) {
        let Some(text) = region_text(region) else {
            return;
        };
        let mut block = format!("$$\n{}\n$$", text.trim());
        if let Some(caption) = self.linked_text(region.associated_caption()) {
            block.push_str(&format!("\n({caption})"));
        }
        self.blocks.push(block);
    }
}

/// Render the document as Markdown.
///
/// Titles become headings, plain text paragraphs, figures image links
/// followed by their italic caption, tables GFM when their text layer has a
/// consistent cell structure (otherwise an image link and a
/// `TableMarkdownFallback` diagnostic), formulas `$$` blocks. Captions and
/// footnotes emitted with their parent are not repeated.
pub fn render_markdown(
    document: &Document,
    stem: &str,
    options: &MarkdownOptions,
) -> RenderedMarkdown {
    let names: HashMap<RegionId, String> = [RegionClass::Figure, RegionClass::Table]
        .into_iter()
        .flat_map(|class| visual_file_names(document, stem, class))
        .collect();

    let ordered: Vec<&Region> = document
        .ordered_regions()
        .into_iter()
        .filter(|r| renders_text(r))
        .collect();

    let mut attached: HashSet<RegionId> = HashSet::new();
    for region in &ordered {
        let emits_parent = match region.class() {
            RegionClass::Figure | RegionClass::Table => true,
            RegionClass::Formula => region_text(region).is_some(),
            _ => false,
        };
        if emits_parent {
            attached.extend(region.associated_caption());
            attached.extend(region.associated_footnote());
        }
    }

    let first_title = document
        .pages
        .first()
        .and_then(|page| {
            page.ordered()
                .into_iter()
                .find(|r| r.class() == RegionClass::Title && renders_text(r))
        })
        .map(|r| r.id());

    let mut writer = MarkdownWriter {
        document,
        options,
        names,
        blocks: Vec::new(),
        out: RenderedMarkdown::default(),
    };

    for region in ordered {
        if attached.contains(&region.id()) {
            continue;
        }
        match region.class() {
            RegionClass::Title => writer.heading(region, Some(region.id()) == first_title),
            RegionClass::PlainText => {
                if let Some(text) = region_text(region) {
                    writer.blocks.push(text);
                }
            }
            RegionClass::Figure => writer.figure(region),
            RegionClass::Table => writer.table(region),
            RegionClass::Formula => writer.formula(region),
            RegionClass::FormulaCaption => {
                if let Some(text) = region_text(region) {
                    writer.blocks.push(collapse_whitespace(&text));
                }
            }
            RegionClass::FigureCaption | RegionClass::TableCaption | RegionClass::TableFootnote => {
                writer.push_italic(region_text(region).map(|t| collapse_whitespace(&t)));
            }
            RegionClass::Abandon => {}
        }
    }

    let mut out = writer.out;
    out.markdown = writer.blocks.join("\n\n");
    if !out.markdown.is_empty() {
        out.markdown.push('\n');
    }
    out
}
