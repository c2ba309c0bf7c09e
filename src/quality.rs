//! Quality scoring.
//!
//! Maps an actual quantity against an ideal and a tolerance band onto a
//! 0..1 score, then discretises the score into named bands.
//!
//! ```text
//!  score
//!   1.0 ┤        ┌───────┐
//!       │       ╱│ ±tol  │╲
//!       │      ╱ │       │ ╲
//!   0.0 ┼─────┘  │ ideal │  └─────
//!         ideal×0.5            ideal×1.5
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Discrete quality
// ---------------------------------------------------------------------------

/// Named quality band, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityLevel {
    Terrible,
    Poor,
    Acceptable,
    Good,
    Perfect,
}

impl QualityLevel {
    /// Human-readable label shown to the player.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Terrible => "Terrible",
            Self::Poor => "Poor",
            Self::Acceptable => "Acceptable",
            Self::Good => "Good",
            Self::Perfect => "Perfect",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower score bound of each band.  Anything below `poor` is Terrible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBands {
    pub perfect: f32,
    pub good: f32,
    pub acceptable: f32,
    pub poor: f32,
}

impl Default for QualityBands {
    fn default() -> Self {
        Self {
            perfect: 0.9,
            good: 0.7,
            acceptable: 0.5,
            poor: 0.3,
        }
    }
}

impl QualityBands {
    /// Bands must be strictly decreasing inside (0, 1].
    pub fn validate(&self) -> Result<()> {
        let ordered = self.perfect <= 1.0
            && self.perfect > self.good
            && self.good > self.acceptable
            && self.acceptable > self.poor
            && self.poor > 0.0;
        if ordered {
            Ok(())
        } else {
            Err(Error::Config("quality bands must be strictly decreasing within (0, 1]"))
        }
    }

    /// Classify a score.  Every score maps to exactly one band.
    pub fn classify(&self, score: f32) -> QualityLevel {
        if score >= self.perfect {
            QualityLevel::Perfect
        } else if score >= self.good {
            QualityLevel::Good
        } else if score >= self.acceptable {
            QualityLevel::Acceptable
        } else if score >= self.poor {
            QualityLevel::Poor
        } else {
            QualityLevel::Terrible
        }
    }
}

// ---------------------------------------------------------------------------
// Result value
// ---------------------------------------------------------------------------

/// Derived, transient quality of one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    /// Score in [0, 1].
    pub score: f32,
    pub level: QualityLevel,
    /// The quantity the score was computed from.
    pub amount: f32,
}

impl QualityResult {
    pub const fn label(&self) -> &'static str {
        self.level.label()
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Pure function of an amount plus the ideal/tolerance pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityEvaluator {
    ideal: f32,
    tolerance: f32,
    bands: QualityBands,
}

impl QualityEvaluator {
    pub fn new(ideal: f32, tolerance: f32, bands: QualityBands) -> Self {
        Self {
            ideal,
            tolerance,
            bands,
        }
    }

    pub fn ideal(&self) -> f32 {
        self.ideal
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Score an amount.
    ///
    /// Inside the tolerance band the score is exactly 1.0; outside it falls
    /// off linearly, reaching 0 at 50 % deviation from the ideal.
    pub fn evaluate(&self, actual: f32) -> f32 {
        if actual.is_nan() || actual <= 0.0 {
            return 0.0;
        }
        let deviation = (actual - self.ideal).abs();
        if deviation <= self.tolerance {
            return 1.0;
        }
        let falloff = self.ideal * 0.5;
        if falloff <= 0.0 {
            return 0.0;
        }
        1.0 - clamp01(deviation / falloff)
    }

    pub fn label(&self, score: f32) -> QualityLevel {
        self.bands.classify(score)
    }

    /// Score and classify in one step.
    pub fn assess(&self, actual: f32) -> QualityResult {
        let score = self.evaluate(actual);
        QualityResult {
            score,
            level: self.bands.classify(score),
            amount: actual.max(0.0),
        }
    }
}

/// Clamp into [0, 1]; NaN maps to 0.
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
