//! Analysis results and their severity presentation.
//!
//! Classification is a pure, total function of the severity label returned by
//! the analysis service. Labels outside the known set never fail; they map to
//! [`SeverityTier::Unknown`].

use serde::{Deserialize, Serialize};

/// Diagnostic result returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnosis: String,

    pub description: String,

    /// Model confidence in percent (0 to 100)
    pub confidence: f64,

    /// Raw severity label as sent by the server (`None`, `Low`, `Medium`, `High`)
    pub severity: Option<String>,

    /// Modality, e.g. `MRI`, `CT`, `X-RAY`
    pub scan_type: String,

    /// Human-readable analysis duration, e.g. `3.2 seconds`
    pub analysis_time: String,

    /// Ordered clinical recommendations
    pub recommendations: Vec<String>,

    /// When the client received this result
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl AnalysisResult {
    /// Severity presentation for this result. Recomputed on every call.
    #[must_use]
    pub fn classification(&self) -> SeverityClassification {
        classify(self.severity.as_deref())
    }

    #[must_use]
    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }
}

/// Canonical severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityTier {
    None,
    Low,
    Medium,
    High,
    Unknown,
}

impl SeverityTier {
    /// Parse a server label. Case-insensitive; surrounding whitespace ignored.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim) else {
            return Self::Unknown;
        };

        if label.eq_ignore_ascii_case("high") {
            Self::High
        } else if label.eq_ignore_ascii_case("medium") {
            Self::Medium
        } else if label.eq_ignore_ascii_case("low") {
            Self::Low
        } else if label.eq_ignore_ascii_case("none") {
            Self::None
        } else {
            Self::Unknown
        }
    }

    /// Risk-descending rank: High sorts first, Unknown last.
    #[must_use]
    pub fn sort_rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::None => 3,
            Self::Unknown => 4,
        }
    }

    #[must_use]
    pub fn color_key(self) -> &'static str {
        match self {
            Self::High => "error",
            Self::Medium => "warning",
            Self::Low => "info",
            Self::None => "success",
            Self::Unknown => "default",
        }
    }

    #[must_use]
    pub fn icon_key(self) -> &'static str {
        match self {
            Self::High => "error",
            Self::Medium => "warning",
            Self::Low => "info",
            Self::None => "check_circle",
            Self::Unknown => "info",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Display metadata derived from a severity label. Never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityClassification {
    pub tier: SeverityTier,
    pub color_key: &'static str,
    pub icon_key: &'static str,
    pub sort_rank: u8,
}

/// Classify a raw severity label.
#[must_use]
pub fn classify(label: Option<&str>) -> SeverityClassification {
    let tier = SeverityTier::from_label(label);
    SeverityClassification {
        tier,
        color_key: tier.color_key(),
        icon_key: tier.icon_key(),
        sort_rank: tier.sort_rank(),
    }
}

/// Coarse label for a confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceBand {
    ExtremelyHigh,
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    /// Bands are open on their lower boundary: exactly 90 is `High` and
    /// exactly 70 is `Low`.
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 90.0 {
            Self::ExtremelyHigh
        } else if confidence > 80.0 {
            Self::High
        } else if confidence > 70.0 {
            Self::Moderate
        } else {
            // NaN lands here as well
            Self::Low
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ExtremelyHigh => "extremely high",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low, manual review recommended",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
