//! Weave configuration and per-clip treatment settings.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::WeaveError;
use crate::types::{Profile, CROSSFEED};

/// Configuration for the weave pipeline.
///
/// Every field has a default; a JSON file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveConfig {
    /// How far a clip is pulled back into the end of the previous clip on the same stream
    pub overlap_ms: f64,
    /// Lead delay assumed when estimating output duration
    pub lead_delay_ms: f64,
    /// Right-stream delay for the first `initial_clips` of the main weave
    pub initial_delay_ms: f64,
    /// Right-stream delay for the remaining clips
    pub rest_delay_ms: f64,
    pub initial_clips: usize,
    pub crossfeed: f64,
    /// Accepted distance from the target duration when selecting clips
    pub tolerance_ms: f64,
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
    /// Before this point a stream plays clips back to back, with no tempo change
    pub no_overlap_until_ms: f64,
    pub min_clips_for_intro: usize,
    pub intro_pause_ms: f64,
    pub intro_final_pause_ms: f64,
    pub target_duration_s: Option<f64>,
    pub seed: Option<u64>,
    /// Alternated per clip index within a stream: even, odd
    pub profiles: [Profile; 2],
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            overlap_ms: 1500.0,
            lead_delay_ms: 3000.0,
            initial_delay_ms: 2000.0,
            rest_delay_ms: 1000.0,
            initial_clips: 2,
            crossfeed: CROSSFEED,
            tolerance_ms: 4000.0,
            fade_in_ms: 100.0,
            fade_out_ms: 500.0,
            no_overlap_until_ms: 30000.0,
            min_clips_for_intro: 3,
            intro_pause_ms: 1000.0,
            intro_final_pause_ms: 1000.0,
            target_duration_s: None,
            seed: None,
            profiles: [Profile::warm(), Profile::bright()],
        }
    }
}

impl WeaveConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the weave cannot honour: negative or non-finite timings,
    /// a crossfeed outside [0, 1], an empty initial segment, bad tempos.
    pub fn validate(&self) -> Result<(), WeaveError> {
        let timings = [
            ("overlap_ms", self.overlap_ms),
            ("lead_delay_ms", self.lead_delay_ms),
            ("initial_delay_ms", self.initial_delay_ms),
            ("rest_delay_ms", self.rest_delay_ms),
            ("tolerance_ms", self.tolerance_ms),
            ("fade_in_ms", self.fade_in_ms),
            ("fade_out_ms", self.fade_out_ms),
            ("no_overlap_until_ms", self.no_overlap_until_ms),
            ("intro_pause_ms", self.intro_pause_ms),
            ("intro_final_pause_ms", self.intro_final_pause_ms),
            ("target_duration_s", self.target_duration_s.unwrap_or(0.0)),
        ];
        for (field, value) in timings {
            if !value.is_finite() || value < 0.0 {
                return Err(WeaveError::InvalidConfig {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }
        if !(self.crossfeed.is_finite() && (0.0..=1.0).contains(&self.crossfeed)) {
            return Err(WeaveError::InvalidConfig {
                field: "crossfeed",
                reason: "must be within [0, 1]",
            });
        }
        if self.initial_clips == 0 {
            return Err(WeaveError::InvalidConfig {
                field: "initial_clips",
                reason: "must be at least 1",
            });
        }
        for profile in &self.profiles {
            if !profile.tempo.is_finite() || profile.tempo <= 0.0 {
                return Err(WeaveError::InvalidTempo(profile.tempo));
            }
        }
        Ok(())
    }

    /// The per-clip treatment (profiles and fades) this configuration implies.
    pub fn treatment(&self) -> Treatment {
        Treatment {
            profiles: self.profiles.clone(),
            fade_in_ms: self.fade_in_ms,
            fade_out_ms: self.fade_out_ms,
        }
    }
}

/// What every placed clip goes through: an alternating profile, fades, panning.
#[derive(Debug, Clone, PartialEq)]
pub struct Treatment {
    pub profiles: [Profile; 2],
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
}

impl Default for Treatment {
    fn default() -> Self {
        WeaveConfig::default().treatment()
    }
}

impl Treatment {
    /// Profile for the clip at `index` within its stream segment.
    pub fn profile(&self, index: usize) -> &Profile {
        &self.profiles[index % 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WeaveConfig::default();
        assert_eq!(config.overlap_ms, 1500.0);
        assert_eq!(config.lead_delay_ms, 3000.0);
        assert_eq!(config.initial_delay_ms, 2000.0);
        assert_eq!(config.rest_delay_ms, 1000.0);
        assert_eq!(config.crossfeed, 0.30);
        assert_eq!(config.tolerance_ms, 4000.0);
        assert_eq!(config.fade_in_ms, 100.0);
        assert_eq!(config.fade_out_ms, 500.0);
        assert_eq!(config.no_overlap_until_ms, 30000.0);
        assert_eq!(config.min_clips_for_intro, 3);
        assert!(config.seed.is_none());
        assert!(config.target_duration_s.is_none());
        assert_eq!(config.profiles[0], Profile::warm());
        assert_eq!(config.profiles[1], Profile::bright());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WeaveConfig = serde_json::from_str(r#"{"seed": 7, "overlap_ms": 900}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.overlap_ms, 900.0);
        assert_eq!(config.fade_out_ms, 500.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = WeaveConfig {
            target_duration_s: Some(60.0),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        let back: WeaveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join(format!("voiceweave_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("weave.json");
        std::fs::write(&path, r#"{"crossfeed": 0.5}"#).unwrap();

        let config = WeaveConfig::from_json_file(&path).unwrap();
        assert_eq!(config.crossfeed, 0.5);

        std::fs::write(&path, "not json").unwrap();
        assert!(WeaveConfig::from_json_file(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(WeaveConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let zero_initial = WeaveConfig {
            initial_clips: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_initial.validate(),
            Err(WeaveError::InvalidConfig { field: "initial_clips", .. })
        ));

        let nan_crossfeed = WeaveConfig {
            crossfeed: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan_crossfeed.validate(),
            Err(WeaveError::InvalidConfig { field: "crossfeed", .. })
        ));

        let negative_overlap = WeaveConfig {
            overlap_ms: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            negative_overlap.validate(),
            Err(WeaveError::InvalidConfig { field: "overlap_ms", .. })
        ));

        let infinite_target = WeaveConfig {
            target_duration_s: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(infinite_target.validate().is_err());

        let mut zero_tempo = WeaveConfig::default();
        zero_tempo.profiles[1].tempo = 0.0;
        assert_eq!(zero_tempo.validate(), Err(WeaveError::InvalidTempo(0.0)));
    }

    #[test]
    fn test_treatment_alternates_profiles() {
        let treatment = WeaveConfig::default().treatment();
        assert_eq!(treatment.profile(0).name, "warm/slow");
        assert_eq!(treatment.profile(1).name, "bright/fast");
        assert_eq!(treatment.profile(4).name, "warm/slow");
    }
}
