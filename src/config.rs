use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::{
    DecisionConfig, FeatureConfig, HsvRange, LocatorConfig, ScoreRule, ScoringConfig,
};
use crate::detect::PERSON_CLASS_ID;
use crate::reduce::ReducerConfig;

const CONFIG_ENV: &str = "MASK_KERNEL_CONFIG";
const IOU_THRESHOLD_ENV: &str = "MASK_KERNEL_IOU_THRESHOLD";
const MIN_AREA_ENV: &str = "MASK_KERNEL_MIN_AREA";
const FACE_PENALTY_ENV: &str = "MASK_KERNEL_FACE_PENALTY";
const TARGET_CLASS_ENV: &str = "MASK_KERNEL_TARGET_CLASS";

const DEFAULT_MIN_DETECTOR_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EngineConfigFile {
    detector: Option<DetectorConfigFile>,
    reducer: Option<ReducerConfigFile>,
    locator: Option<LocatorConfigFile>,
    features: Option<FeatureConfigFile>,
    scoring: Option<ScoringConfigFile>,
    decision: Option<DecisionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    target_class_id: Option<u32>,
    min_detector_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ReducerConfigFile {
    iou_threshold: Option<f64>,
    min_area: Option<i64>,
    min_aspect_ratio: Option<f64>,
    max_aspect_ratio: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct LocatorConfigFile {
    face_iou_threshold: Option<f64>,
    face_width_ratio: Option<f64>,
    face_height_ratio: Option<f64>,
    estimated_confidence_penalty: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FeatureConfigFile {
    analysis_window_ratio: Option<f64>,
    canny_low: Option<f32>,
    canny_high: Option<f32>,
    skin_ranges: Option<Vec<HsvRange>>,
    mask_color_ranges: Option<Vec<HsvRange>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ScoringConfigFile {
    skin_ratio: Option<Vec<ScoreRule>>,
    non_skin_ratio: Option<Vec<ScoreRule>>,
    mask_color_ratio: Option<Vec<ScoreRule>>,
    edge_density: Option<Vec<ScoreRule>>,
    color_variance: Option<Vec<ScoreRule>>,
    texture_std: Option<Vec<ScoreRule>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DecisionConfigFile {
    mask_present_score: Option<i32>,
    mask_absent_score: Option<i32>,
    skin_ratio_high: Option<f64>,
    skin_ratio_low: Option<f64>,
}

/// Which raw detections count as persons at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub target_class_id: u32,
    pub min_detector_confidence: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            target_class_id: PERSON_CLASS_ID,
            min_detector_confidence: DEFAULT_MIN_DETECTOR_CONFIDENCE,
        }
    }
}

/// Every tunable of the engine. Built once and handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineConfig {
    pub detector: DetectorSettings,
    pub reducer: ReducerConfig,
    pub locator: LocatorConfig,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
    pub decision: DecisionConfig,
}

impl EngineConfig {
    /// Defaults, then the file named by `MASK_KERNEL_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load one config file over the defaults, ignoring the environment.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let cfg = Self::from_file(read_config_file(path.as_ref())?);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: EngineConfigFile) -> Self {
        let detector_defaults = DetectorSettings::default();
        let detector = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            target_class_id: detector
                .target_class_id
                .unwrap_or(detector_defaults.target_class_id),
            min_detector_confidence: detector
                .min_detector_confidence
                .unwrap_or(detector_defaults.min_detector_confidence),
        };

        let reducer_defaults = ReducerConfig::default();
        let reducer = file.reducer.unwrap_or_default();
        let reducer = ReducerConfig {
            iou_threshold: reducer.iou_threshold.unwrap_or(reducer_defaults.iou_threshold),
            min_area: reducer.min_area.unwrap_or(reducer_defaults.min_area),
            min_aspect_ratio: reducer
                .min_aspect_ratio
                .unwrap_or(reducer_defaults.min_aspect_ratio),
            max_aspect_ratio: reducer
                .max_aspect_ratio
                .unwrap_or(reducer_defaults.max_aspect_ratio),
        };

        let locator_defaults = LocatorConfig::default();
        let locator = file.locator.unwrap_or_default();
        let locator = LocatorConfig {
            face_iou_threshold: locator
                .face_iou_threshold
                .unwrap_or(locator_defaults.face_iou_threshold),
            face_width_ratio: locator
                .face_width_ratio
                .unwrap_or(locator_defaults.face_width_ratio),
            face_height_ratio: locator
                .face_height_ratio
                .unwrap_or(locator_defaults.face_height_ratio),
            estimated_confidence_penalty: locator
                .estimated_confidence_penalty
                .unwrap_or(locator_defaults.estimated_confidence_penalty),
        };

        let feature_defaults = FeatureConfig::default();
        let features = file.features.unwrap_or_default();
        let features = FeatureConfig {
            analysis_window_ratio: features
                .analysis_window_ratio
                .unwrap_or(feature_defaults.analysis_window_ratio),
            canny_low: features.canny_low.unwrap_or(feature_defaults.canny_low),
            canny_high: features.canny_high.unwrap_or(feature_defaults.canny_high),
            skin_ranges: features.skin_ranges.unwrap_or(feature_defaults.skin_ranges),
            mask_color_ranges: features
                .mask_color_ranges
                .unwrap_or(feature_defaults.mask_color_ranges),
        };

        let scoring_defaults = ScoringConfig::default();
        let scoring = file.scoring.unwrap_or_default();
        let scoring = ScoringConfig {
            skin_ratio: scoring.skin_ratio.unwrap_or(scoring_defaults.skin_ratio),
            non_skin_ratio: scoring
                .non_skin_ratio
                .unwrap_or(scoring_defaults.non_skin_ratio),
            mask_color_ratio: scoring
                .mask_color_ratio
                .unwrap_or(scoring_defaults.mask_color_ratio),
            edge_density: scoring.edge_density.unwrap_or(scoring_defaults.edge_density),
            color_variance: scoring
                .color_variance
                .unwrap_or(scoring_defaults.color_variance),
            texture_std: scoring.texture_std.unwrap_or(scoring_defaults.texture_std),
        };

        let decision_defaults = DecisionConfig::default();
        let decision = file.decision.unwrap_or_default();
        let decision = DecisionConfig {
            mask_present_score: decision
                .mask_present_score
                .unwrap_or(decision_defaults.mask_present_score),
            mask_absent_score: decision
                .mask_absent_score
                .unwrap_or(decision_defaults.mask_absent_score),
            skin_ratio_high: decision
                .skin_ratio_high
                .unwrap_or(decision_defaults.skin_ratio_high),
            skin_ratio_low: decision
                .skin_ratio_low
                .unwrap_or(decision_defaults.skin_ratio_low),
        };

        Self {
            detector,
            reducer,
            locator,
            features,
            scoring,
            decision,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(value) = env_value(IOU_THRESHOLD_ENV) {
            self.reducer.iou_threshold = value
                .parse()
                .map_err(|_| anyhow!("{} must be a number", IOU_THRESHOLD_ENV))?;
        }
        if let Some(value) = env_value(MIN_AREA_ENV) {
            self.reducer.min_area = value
                .parse()
                .map_err(|_| anyhow!("{} must be an integer pixel area", MIN_AREA_ENV))?;
        }
        if let Some(value) = env_value(FACE_PENALTY_ENV) {
            self.locator.estimated_confidence_penalty = value
                .parse()
                .map_err(|_| anyhow!("{} must be a number", FACE_PENALTY_ENV))?;
        }
        if let Some(value) = env_value(TARGET_CLASS_ENV) {
            self.detector.target_class_id = value
                .parse()
                .map_err(|_| anyhow!("{} must be a class id", TARGET_CLASS_ENV))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval(
            "detector.min_detector_confidence",
            self.detector.min_detector_confidence as f64,
        )?;

        check_unit_interval("reducer.iou_threshold", self.reducer.iou_threshold)?;
        if self.reducer.min_area < 0 {
            return Err(anyhow!("reducer.min_area must not be negative"));
        }
        if !(self.reducer.min_aspect_ratio > 0.0)
            || !self.reducer.max_aspect_ratio.is_finite()
            || self.reducer.min_aspect_ratio > self.reducer.max_aspect_ratio
        {
            return Err(anyhow!(
                "reducer aspect ratio range [{}, {}] is invalid",
                self.reducer.min_aspect_ratio,
                self.reducer.max_aspect_ratio
            ));
        }

        check_unit_interval("locator.face_iou_threshold", self.locator.face_iou_threshold)?;
        check_ratio("locator.face_width_ratio", self.locator.face_width_ratio)?;
        check_ratio("locator.face_height_ratio", self.locator.face_height_ratio)?;
        check_ratio(
            "locator.estimated_confidence_penalty",
            self.locator.estimated_confidence_penalty as f64,
        )?;

        let window_ratio = self.features.analysis_window_ratio;
        if !(0.0..1.0).contains(&window_ratio) {
            return Err(anyhow!(
                "features.analysis_window_ratio must be in [0, 1), got {}",
                window_ratio
            ));
        }
        let (canny_low, canny_high) = (self.features.canny_low, self.features.canny_high);
        if !canny_low.is_finite()
            || !canny_high.is_finite()
            || canny_low < 0.0
            || canny_low > canny_high
        {
            return Err(anyhow!(
                "canny thresholds ({}, {}) must satisfy 0 <= low <= high",
                self.features.canny_low,
                self.features.canny_high
            ));
        }
        for range in self
            .features
            .skin_ranges
            .iter()
            .chain(self.features.mask_color_ranges.iter())
        {
            range.validate()?;
        }

        if self.decision.mask_absent_score >= self.decision.mask_present_score {
            return Err(anyhow!(
                "decision.mask_absent_score ({}) must be below mask_present_score ({})",
                self.decision.mask_absent_score,
                self.decision.mask_present_score
            ));
        }
        check_unit_interval("decision.skin_ratio_high", self.decision.skin_ratio_high)?;
        check_unit_interval("decision.skin_ratio_low", self.decision.skin_ratio_low)?;
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.trim().to_string())
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be in [0, 1], got {}", name, value));
    }
    Ok(())
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(anyhow!("{} must be in (0, 1], got {}", name, value));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<EngineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?
    };
    Ok(cfg)
}
