//! Narrative employee-count extraction.
//!
//! Used only when a filing carries no structured headcount. Candidate numbers
//! are found with the configured pattern templates, then filtered by a sanity
//! window and by false-positive markers in the surrounding text. When several
//! distinct counts survive, the largest one wins: smaller figures in filing
//! prose usually describe a subset (a segment, a country, a union).

use payout_core::{EmployeeCountSource, NarrativeConfig, PayoutError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Method tag recorded on evidence produced by this extractor.
pub const EXTRACTION_METHOD: &str = "narrative_regex";

/// A surviving headcount candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Parsed headcount.
    pub count: u64,
    /// Character offsets of the whole pattern match.
    pub span: (usize, usize),
    /// Text window around the match.
    pub context: String,
}

/// Result of scanning one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeExtraction {
    /// Selected headcount, if any candidate survived.
    pub count: Option<u64>,
    /// `Reported` when a count was found, `Unknown` otherwise.
    pub source: EmployeeCountSource,
    /// Context window of the selected candidate.
    pub quote: Option<String>,
    /// Character offsets of the selected match.
    pub span: Option<(usize, usize)>,
    /// Ambiguity notes.
    pub warnings: Vec<String>,
}

/// Pattern-based employee-count extractor.
#[derive(Debug, Clone)]
pub struct NarrativeExtractor {
    patterns: Vec<Regex>,
    markers: Vec<String>,
    context_radius: usize,
    min_count: u64,
    max_count: u64,
}

impl NarrativeExtractor {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidParameter`] if a pattern does not compile,
    /// has no capture group, or the sanity window is empty.
    pub fn new(config: &NarrativeConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|pattern| {
                let re = Regex::new(pattern).map_err(|e| {
                    PayoutError::InvalidParameter(format!("invalid pattern {pattern:?}: {e}"))
                })?;
                if re.captures_len() < 2 {
                    return Err(PayoutError::InvalidParameter(format!(
                        "pattern {pattern:?} has no capture group for the count"
                    )));
                }
                Ok(re)
            })
            .collect::<Result<Vec<_>>>()?;

        if config.min_count > config.max_count {
            return Err(PayoutError::InvalidParameter(format!(
                "min_count {} exceeds max_count {}",
                config.min_count, config.max_count
            )));
        }

        Ok(Self {
            patterns,
            markers: config
                .false_positive_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            context_radius: config.context_radius,
            min_count: config.min_count,
            max_count: config.max_count,
        })
    }

    /// Finds every candidate that survives the sanity window and the
    /// false-positive markers, one per distinct count, in document order.
    #[must_use]
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut found: Vec<Candidate> = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };

                let Ok(count) = number.as_str().replace(',', "").parse::<u64>() else {
                    trace!(token = number.as_str(), "Unparseable count");
                    continue;
                };

                if count < self.min_count || count > self.max_count {
                    trace!(count, "Count outside sanity window");
                    continue;
                }

                let context = context_window(text, whole.start(), whole.end(), self.context_radius);
                let lowered = context.to_lowercase();
                if let Some(marker) = self.markers.iter().find(|m| lowered.contains(m.as_str())) {
                    debug!(count, marker = %marker, "Suppressed false-positive headcount");
                    continue;
                }

                let start = char_offset(text, whole.start());
                found.push(Candidate {
                    count,
                    span: (start, start + whole.as_str().chars().count()),
                    context: context.trim().to_string(),
                });
            }
        }

        found.sort_by_key(|c| c.span.0);
        let mut distinct: Vec<Candidate> = Vec::with_capacity(found.len());
        for candidate in found {
            if !distinct.iter().any(|c| c.count == candidate.count) {
                distinct.push(candidate);
            }
        }
        distinct
    }

    /// Scans `text` and picks one headcount.
    #[must_use]
    pub fn extract(&self, text: &str) -> NarrativeExtraction {
        let candidates = self.candidates(text);

        let Some(chosen) = select_largest(&candidates) else {
            debug!("No headcount candidates survived");
            return NarrativeExtraction::default();
        };

        let mut warnings = Vec::new();
        if candidates.len() > 1 {
            let counts: Vec<String> = candidates.iter().map(|c| c.count.to_string()).collect();
            warnings.push(format!(
                "{} ({})",
                PayoutError::AmbiguousExtraction {
                    candidates: candidates.len()
                },
                counts.join(", ")
            ));
        }

        debug!(count = chosen.count, candidates = candidates.len(), "Extracted headcount");
        NarrativeExtraction {
            count: Some(chosen.count),
            source: EmployeeCountSource::Reported,
            quote: Some(chosen.context.clone()),
            span: Some(chosen.span),
            warnings,
        }
    }
}

/// Picks the largest count; ties go to the earliest mention.
#[must_use]
pub fn select_largest(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().reduce(|best, c| {
        if c.count > best.count { c } else { best }
    })
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Returns up to `radius` characters on each side of `start..end`.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}
