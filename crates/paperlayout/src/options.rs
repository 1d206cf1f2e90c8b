//! Engine configuration.
//!
//! Every stage has its own options struct with defaults; [`EngineOptions`]
//! bundles them and can be loaded from JSON, with omitted fields taking
//! their defaults.

use paperlayout_core::{
    AssociationOptions, DedupeOptions, MarkdownOptions, OrderOptions, RelevanceOptions,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Filter applied to raw detections before they become regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionFilter {
    /// Detections scoring below this are discarded. Default: `0.2`.
    pub min_confidence: f64,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self { min_confidence: 0.2 }
    }
}

/// Options for the content extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Padding in points added around figure/table crops. Default: `2.0`.
    pub crop_padding: f64,
    /// Resolution for page renders and crops. Default: `150.0`.
    pub render_dpi: f32,
    /// Vertical gap between lines, relative to line height, that starts a
    /// new paragraph. Default: `0.6`.
    pub paragraph_gap_ratio: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            crop_padding: 2.0,
            render_dpi: 150.0,
            paragraph_gap_ratio: 0.6,
        }
    }
}

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub detection: DetectionFilter,
    pub dedupe: DedupeOptions,
    pub order: OrderOptions,
    pub relevance: RelevanceOptions,
    pub association: AssociationOptions,
    pub extract: ExtractOptions,
    pub markdown: MarkdownOptions,
    /// Size of a dedicated worker pool for the per-page phase. `None` uses
    /// the global pool.
    pub threads: Option<usize>,
}

impl EngineOptions {
    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = EngineOptions::default();
        assert_eq!(opts.detection.min_confidence, 0.2);
        assert_eq!(opts.extract.crop_padding, 2.0);
        assert_eq!(opts.dedupe.iou_threshold, 0.5);
        assert!(opts.threads.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = EngineOptions::from_json(
            r#"{"dedupe": {"iou_threshold": 0.7}, "relevance": {"min_pages": 3}, "threads": 2}"#,
        )
        .unwrap();
        assert_eq!(opts.dedupe.iou_threshold, 0.7);
        assert_eq!(opts.relevance.min_pages, 3);
        assert_eq!(opts.relevance.header_margin, 0.08);
        assert_eq!(opts.order, OrderOptions::default());
        assert_eq!(opts.threads, Some(2));
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(EngineOptions::from_json("{}").unwrap(), EngineOptions::default());
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(matches!(
            EngineOptions::from_json("{not json"),
            Err(EngineError::Json(_))
        ));
    }
}
