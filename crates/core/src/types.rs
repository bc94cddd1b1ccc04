use serde::{Deserialize, Serialize};

/// Bleed fraction of a stream into the opposite channel for "soft" positions.
pub const CROSSFEED: f64 = 0.30;

/// Sample rate used for empty buffers that have no source clip to inherit from.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// A decoded audio clip.
///
/// Samples are stored planar: one `Vec<f64>` per channel, all the same
/// length, normalized to [-1, 1]. Clips are never modified in place by the
/// weaving pipeline; every transform returns a new `Clip`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Display name (usually the source file name)
    pub name: String,
    pub channels: Vec<Vec<f64>>,
    pub sample_rate: u32,
}

impl AsRef<Clip> for Clip {
    fn as_ref(&self) -> &Clip {
        self
    }
}

impl Clip {
    pub fn new(name: impl Into<String>, channels: Vec<Vec<f64>>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            channels,
            sample_rate,
        }
    }

    pub fn mono(name: impl Into<String>, samples: Vec<f64>, sample_rate: u32) -> Self {
        Self::new(name, vec![samples], sample_rate)
    }

    /// A silent clip of `frames` frames.
    pub fn silent(name: impl Into<String>, frames: usize, num_channels: usize, sample_rate: u32) -> Self {
        Self::new(name, vec![vec![0.0; frames]; num_channels], sample_rate)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_ms() / 1000.0
    }

    /// Convert a duration in milliseconds to a frame count at this clip's rate.
    pub fn ms_to_frames(&self, ms: f64) -> usize {
        ms_to_frames(ms, self.sample_rate)
    }

    /// Build a new clip by transforming each channel independently.
    pub fn map_channels<F>(&self, mut f: F) -> anyhow::Result<Clip>
    where
        F: FnMut(&[f64]) -> anyhow::Result<Vec<f64>>,
    {
        let channels = self
            .channels
            .iter()
            .map(|c| f(c))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Clip::new(self.name.clone(), channels, self.sample_rate))
    }
}

/// Milliseconds to frames, rounded to the nearest frame. Negative input yields 0.
pub fn ms_to_frames(ms: f64, sample_rate: u32) -> usize {
    (ms.max(0.0) / 1000.0 * sample_rate as f64).round() as usize
}

/// Stereo placement as a (left gain, right gain) pair, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub left: f64,
    pub right: f64,
}

impl Position {
    pub const HARD_LEFT: Position = Position { left: 1.0, right: 0.0 };
    pub const SOFT_LEFT: Position = Position { left: 1.0, right: CROSSFEED };
    pub const SOFT_RIGHT: Position = Position { left: CROSSFEED, right: 1.0 };
    pub const HARD_RIGHT: Position = Position { left: 0.0, right: 1.0 };

    /// Gains are clamped into [0, 1].
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            left: left.clamp(0.0, 1.0),
            right: right.clamp(0.0, 1.0),
        }
    }

    /// Left-side cycle (hard-left, soft-left) with the given crossfeed.
    pub fn left_cycle(crossfeed: f64) -> Vec<Position> {
        vec![Position::new(1.0, 0.0), Position::new(1.0, crossfeed)]
    }

    /// Right-side cycle (hard-right, soft-right) with the given crossfeed.
    pub fn right_cycle(crossfeed: f64) -> Vec<Position> {
        vec![Position::new(0.0, 1.0), Position::new(crossfeed, 1.0)]
    }

    /// Short label used in diagnostics, e.g. "HARD-L".
    pub fn label(&self) -> &'static str {
        match (self.left >= 1.0, self.right >= 1.0) {
            (true, true) => "CENTER",
            (true, false) if self.right <= 0.0 => "HARD-L",
            (true, false) => "SOFT-L",
            (false, true) if self.left <= 0.0 => "HARD-R",
            (false, true) => "SOFT-R",
            (false, false) => "CUSTOM",
        }
    }
}

/// Tonal and tempo coloration applied to a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub lowpass_hz: Option<f64>,
    pub highpass_hz: Option<f64>,
    /// >1.0 is faster/shorter, <1.0 is slower/longer. Never 0.
    pub tempo: f64,
}

impl Profile {
    /// Lightly low-passed and slowed.
    pub fn warm() -> Self {
        Self {
            name: "warm/slow".to_string(),
            lowpass_hz: Some(3500.0),
            highpass_hz: None,
            tempo: 0.97,
        }
    }

    /// Lightly high-passed and sped up.
    pub fn bright() -> Self {
        Self {
            name: "bright/fast".to_string(),
            lowpass_hz: None,
            highpass_hz: Some(180.0),
            tempo: 1.02,
        }
    }

    /// A profile that leaves the clip untouched.
    pub fn neutral() -> Self {
        Self {
            name: "neutral".to_string(),
            lowpass_hz: None,
            highpass_hz: None,
            tempo: 1.0,
        }
    }
}

/// One entry of a stream plan, for diagnostics and `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    pub position: String,
    pub profile: String,
}

/// Composition of both streams, in playback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeavePlan {
    pub left: Vec<PlanEntry>,
    pub right: Vec<PlanEntry>,
}

/// Output of a weave.
#[derive(Debug, Clone)]
pub struct WeaveResult {
    /// Two-channel mix
    pub audio: Clip,
    pub diagnostics: Vec<String>,
    pub plan: WeavePlan,
    pub used_intro: bool,
}

impl WeaveResult {
    pub fn duration_s(&self) -> f64 {
        self.audio.duration_s()
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_duration() {
        let clip = Clip::mono("a.wav", vec![0.0; 16000], 16000);
        assert_eq!(clip.frames(), 16000);
        assert_eq!(clip.num_channels(), 1);
        assert!((clip.duration_ms() - 1000.0).abs() < 1e-9);
        assert!((clip.duration_s() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_silent_clip() {
        let clip = Clip::silent("gap", 100, 2, 8000);
        assert_eq!(clip.num_channels(), 2);
        assert_eq!(clip.frames(), 100);
        assert!(clip.channels.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_clip() {
        let clip = Clip::new("none", vec![], 16000);
        assert!(clip.is_empty());
        assert_eq!(clip.duration_ms(), 0.0);
    }

    #[test]
    fn test_ms_to_frames() {
        assert_eq!(ms_to_frames(100.0, 16000), 1600);
        assert_eq!(ms_to_frames(1500.0, 44100), 66150);
        assert_eq!(ms_to_frames(-5.0, 16000), 0);
    }

    #[test]
    fn test_canonical_positions() {
        assert_eq!(Position::HARD_LEFT, Position::new(1.0, 0.0));
        assert_eq!(Position::HARD_RIGHT, Position::new(0.0, 1.0));
        assert_eq!(Position::SOFT_LEFT.right, CROSSFEED);
        assert_eq!(Position::SOFT_RIGHT.left, CROSSFEED);
        assert_eq!(Position::left_cycle(CROSSFEED), vec![Position::HARD_LEFT, Position::SOFT_LEFT]);
        assert_eq!(Position::right_cycle(CROSSFEED), vec![Position::HARD_RIGHT, Position::SOFT_RIGHT]);
    }

    #[test]
    fn test_position_clamped() {
        let p = Position::new(1.5, -0.2);
        assert_eq!(p, Position::HARD_LEFT);
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(Position::HARD_LEFT.label(), "HARD-L");
        assert_eq!(Position::SOFT_LEFT.label(), "SOFT-L");
        assert_eq!(Position::SOFT_RIGHT.label(), "SOFT-R");
        assert_eq!(Position::HARD_RIGHT.label(), "HARD-R");
    }

    #[test]
    fn test_profiles() {
        let warm = Profile::warm();
        assert_eq!(warm.lowpass_hz, Some(3500.0));
        assert!(warm.highpass_hz.is_none());
        assert!(warm.tempo < 1.0);

        let bright = Profile::bright();
        assert!(bright.lowpass_hz.is_none());
        assert_eq!(bright.highpass_hz, Some(180.0));
        assert!(bright.tempo > 1.0);
    }

    #[test]
    fn test_map_channels_keeps_metadata() {
        let clip = Clip::new("s.wav", vec![vec![1.0; 4], vec![2.0; 4]], 8000);
        let doubled = clip
            .map_channels(|c| Ok(c.iter().map(|s| s * 2.0).collect()))
            .unwrap();
        assert_eq!(doubled.name, "s.wav");
        assert_eq!(doubled.sample_rate, 8000);
        assert_eq!(doubled.channels[1][0], 4.0);
        // Source untouched
        assert_eq!(clip.channels[1][0], 2.0);
    }

    #[test]
    fn test_plan_serde_roundtrip() {
        let plan = WeavePlan {
            left: vec![PlanEntry {
                name: "a.wav".into(),
                position: "HARD-L".into(),
                profile: "warm/slow".into(),
            }],
            right: vec![],
        };
        let json = serde_json::to_string(&plan).unwrap();
        let back: WeavePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
