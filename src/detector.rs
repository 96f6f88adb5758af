// WHY: two-phase brute-force search for a 5-7-5 partition of a chat message
// Iteration order is the tie-break: the first partition found in ascending index order wins

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::mora::MoraCounter;
use crate::normalizer::TextNormalizer;
use crate::segmenter::segment;

/// Mora targets for the upper, middle and lower lines
pub const SENRYU_PATTERN: [usize; 3] = [5, 7, 5];

/// A detected 5-7-5 partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenryuMatch {
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

impl SenryuMatch {
    fn new(line1: impl Into<String>, line2: impl Into<String>, line3: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
            line3: line3.into(),
        }
    }
}

impl fmt::Display for SenryuMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.line1, self.line2, self.line3)
    }
}

/// Stateless detector; the only shared resource is the counter's annotator
pub struct SenryuDetector {
    normalizer: TextNormalizer,
    counter: Arc<MoraCounter>,
}

impl SenryuDetector {
    /// Detector using the process-wide lindera counter
    pub fn new() -> Result<Self> {
        Self::with_counter(MoraCounter::global())
    }

    /// Detector using a caller-supplied counter
    pub fn with_counter(counter: Arc<MoraCounter>) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            counter,
        })
    }

    pub fn counter(&self) -> &Arc<MoraCounter> {
        &self.counter
    }

    /// Find the first 5-7-5 partition of `raw`, trying punctuation segments before raw offsets.
    /// Absence of a pattern is the common case and is not an error.
    pub async fn detect(&self, raw: &str) -> Option<SenryuMatch> {
        let clean = self.normalizer.normalize(raw);
        if clean.is_empty() {
            return None;
        }

        let segments = segment(&clean);
        debug!(segments = segments.len(), chars = clean.chars().count(), "Searching for senryu");

        if let Some(found) = self.search_segments(&segments).await {
            info!(
                "Senryu detected: [{}](5) [{}](7) [{}](5)",
                found.line1, found.line2, found.line3
            );
            return Some(found);
        }

        if let Some(found) = self.search_continuous(&clean).await {
            info!(
                "Continuous senryu detected: [{}](5) [{}](7) [{}](5)",
                found.line1, found.line2, found.line3
            );
            return Some(found);
        }

        None
    }

    /// Segment-combination search over triples i < j < k.
    /// line1 joins segments [i, j), line2 joins [j, k), line3 is segment k alone.
    pub async fn search_segments(&self, segments: &[String]) -> Option<SenryuMatch> {
        let [upper, middle, lower] = SENRYU_PATTERN;
        let n = segments.len();

        for i in 0..n.saturating_sub(2) {
            tokio::task::yield_now().await;

            for j in (i + 1)..n.saturating_sub(1) {
                let line1 = segments[i..j].concat();
                // line1 depends only on (i, j); a miss rules out every k
                if self.counter.count_morae(&line1).await != upper {
                    continue;
                }

                for k in (j + 1)..n {
                    let line2 = segments[j..k].concat();
                    if self.counter.count_morae(&line2).await != middle {
                        continue;
                    }

                    let line3 = &segments[k];
                    if self.counter.count_morae(line3).await == lower {
                        return Some(SenryuMatch::new(line1, line2, line3.as_str()));
                    }
                }
            }
        }

        None
    }

    /// Continuous search over character cut points 1 <= i < j < len.
    /// Cut points are Unicode scalar values, not UTF-16 code units, so a character
    /// outside the Basic Multilingual Plane that survives normalization is one position.
    pub async fn search_continuous(&self, clean: &str) -> Option<SenryuMatch> {
        let [upper, middle, lower] = SENRYU_PATTERN;
        let chars: Vec<char> = clean.chars().collect();
        let len = chars.len();

        for i in 1..len.saturating_sub(1) {
            tokio::task::yield_now().await;

            let line1: String = chars[..i].iter().collect();
            if self.counter.count_morae(&line1).await != upper {
                continue;
            }

            for j in (i + 1)..len {
                let line2: String = chars[i..j].iter().collect();
                if self.counter.count_morae(&line2).await != middle {
                    continue;
                }

                let line3: String = chars[j..].iter().collect();
                if self.counter.count_morae(&line3).await == lower {
                    return Some(SenryuMatch::new(line1, line2, line3));
                }
            }
        }

        None
    }
}
