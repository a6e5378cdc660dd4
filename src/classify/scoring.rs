//! Rule-table scoring and the final tri-state decision.
//!
//! Each criterion owns an ordered list of `ScoreRule`s over one feature. The
//! first rule whose open interval contains the value contributes its delta and
//! the rest of that list is skipped, so at most one bucket fires per criterion.
//! The tables are plain data; nothing here touches pixels.

use serde::{Deserialize, Serialize};

use crate::classify::features::FeatureVector;

/// One bucket: `above < value < below`, either bound optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    pub delta: i32,
}

impl ScoreRule {
    pub const fn below(limit: f64, delta: i32) -> Self {
        Self {
            above: None,
            below: Some(limit),
            delta,
        }
    }

    pub const fn above(limit: f64, delta: i32) -> Self {
        Self {
            above: Some(limit),
            below: None,
            delta,
        }
    }

    pub const fn between(lower: f64, upper: f64, delta: i32) -> Self {
        Self {
            above: Some(lower),
            below: Some(upper),
            delta,
        }
    }

    /// NaN never matches.
    pub fn matches(&self, value: f64) -> bool {
        !value.is_nan()
            && self.above.map_or(true, |limit| value > limit)
            && self.below.map_or(true, |limit| value < limit)
    }
}

/// Delta of the first matching rule, or 0 when none matches.
pub fn first_match_delta(rules: &[ScoreRule], value: f64) -> i32 {
    rules
        .iter()
        .find(|rule| rule.matches(value))
        .map_or(0, |rule| rule.delta)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    SkinRatio,
    NonSkinRatio,
    MaskColorRatio,
    EdgeDensity,
    ColorVariance,
    TextureStd,
}

impl Criterion {
    /// Evaluation order; also the column order of diagnostics.
    pub const ALL: [Criterion; 6] = [
        Criterion::SkinRatio,
        Criterion::NonSkinRatio,
        Criterion::MaskColorRatio,
        Criterion::EdgeDensity,
        Criterion::ColorVariance,
        Criterion::TextureStd,
    ];

    pub fn value(&self, features: &FeatureVector) -> f64 {
        match self {
            Criterion::SkinRatio => features.skin_ratio,
            Criterion::NonSkinRatio => features.non_skin_ratio,
            Criterion::MaskColorRatio => features.mask_color_ratio,
            Criterion::EdgeDensity => features.edge_density,
            Criterion::ColorVariance => features.color_variance,
            Criterion::TextureStd => features.texture_std,
        }
    }
}

/// Rule tables for the six criteria.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skin_ratio: Vec<ScoreRule>,
    pub non_skin_ratio: Vec<ScoreRule>,
    pub mask_color_ratio: Vec<ScoreRule>,
    pub edge_density: Vec<ScoreRule>,
    pub color_variance: Vec<ScoreRule>,
    pub texture_std: Vec<ScoreRule>,
}

impl ScoringConfig {
    pub fn rules(&self, criterion: Criterion) -> &[ScoreRule] {
        match criterion {
            Criterion::SkinRatio => &self.skin_ratio,
            Criterion::NonSkinRatio => &self.non_skin_ratio,
            Criterion::MaskColorRatio => &self.mask_color_ratio,
            Criterion::EdgeDensity => &self.edge_density,
            Criterion::ColorVariance => &self.color_variance,
            Criterion::TextureStd => &self.texture_std,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            // Low skin visibility dominates; the two negative buckets are only
            // reached once every positive bucket has failed.
            skin_ratio: vec![
                ScoreRule::below(0.03, 5),
                ScoreRule::below(0.08, 4),
                ScoreRule::below(0.15, 3),
                ScoreRule::below(0.25, 2),
                ScoreRule::below(0.35, 1),
                ScoreRule::above(0.60, -5),
                ScoreRule::above(0.45, -4),
            ],
            non_skin_ratio: vec![
                ScoreRule::above(0.80, 4),
                ScoreRule::above(0.60, 3),
                ScoreRule::above(0.40, 2),
                ScoreRule::above(0.20, 1),
            ],
            mask_color_ratio: vec![ScoreRule::above(0.30, 2), ScoreRule::above(0.15, 1)],
            edge_density: vec![
                ScoreRule::above(0.20, 2),
                ScoreRule::above(0.12, 1),
                ScoreRule::below(0.05, -1),
            ],
            color_variance: vec![
                ScoreRule::below(150.0, 2),
                ScoreRule::below(300.0, 1),
                ScoreRule::above(800.0, -1),
            ],
            texture_std: vec![
                ScoreRule::below(12.0, 2),
                ScoreRule::below(20.0, 1),
                ScoreRule::above(35.0, -1),
            ],
        }
    }
}

/// Score thresholds and the skin-ratio tie-break.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub mask_present_score: i32,
    pub mask_absent_score: i32,
    pub skin_ratio_high: f64,
    pub skin_ratio_low: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            mask_present_score: 5,
            mask_absent_score: -3,
            skin_ratio_high: 0.50,
            skin_ratio_low: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaskLabel {
    MaskPresent,
    MaskAbsent,
    Unknown,
}

impl MaskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskLabel::MaskPresent => "MASK_PRESENT",
            MaskLabel::MaskAbsent => "MASK_ABSENT",
            MaskLabel::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MaskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total score plus what each criterion contributed to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub total: i32,
    pub contributions: Vec<(Criterion, i32)>,
}

pub fn score_features(features: &FeatureVector, table: &ScoringConfig) -> ScoreBreakdown {
    let contributions: Vec<(Criterion, i32)> = Criterion::ALL
        .iter()
        .map(|&criterion| {
            let delta = first_match_delta(table.rules(criterion), criterion.value(features));
            (criterion, delta)
        })
        .collect();
    let total = contributions.iter().map(|(_, delta)| delta).sum();
    ScoreBreakdown {
        total,
        contributions,
    }
}

/// Combined score first; the raw skin ratio only breaks ties in between.
pub fn decide(score: i32, skin_ratio: f64, decision: &DecisionConfig) -> MaskLabel {
    if score >= decision.mask_present_score {
        MaskLabel::MaskPresent
    } else if score <= decision.mask_absent_score {
        MaskLabel::MaskAbsent
    } else if skin_ratio > decision.skin_ratio_high {
        MaskLabel::MaskAbsent
    } else if skin_ratio < decision.skin_ratio_low {
        MaskLabel::MaskPresent
    } else {
        MaskLabel::Unknown
    }
}
