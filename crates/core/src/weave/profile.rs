//! Tonal and tempo coloration of individual clips.

use anyhow::Result;

use crate::audio::effects::{change_tempo, high_pass, low_pass};
use crate::error::WeaveError;
use crate::types::{Clip, Profile};

/// Apply a profile to a clip, returning a new clip.
///
/// Order: low-pass (if set), high-pass (if set), then tempo change when
/// `apply_tempo` is true and the multiplier is not 1.0. The tempo change is
/// resample-based and shifts pitch along with duration.
pub fn apply_profile(clip: &Clip, profile: &Profile, apply_tempo: bool) -> Result<Clip> {
    if !profile.tempo.is_finite() || profile.tempo <= 0.0 {
        return Err(WeaveError::InvalidTempo(profile.tempo).into());
    }

    let sr = clip.sample_rate;
    let use_tempo = apply_tempo && profile.tempo != 1.0;
    log::debug!(
        "Profile {} on {} (tempo {})",
        profile.name,
        clip.name,
        if use_tempo { "applied" } else { "skipped" }
    );

    clip.map_channels(|samples| {
        let mut out = match profile.lowpass_hz {
            Some(hz) => low_pass(samples, sr, hz)?,
            None => samples.to_vec(),
        };
        if let Some(hz) = profile.highpass_hz {
            out = high_pass(&out, sr, hz)?;
        }
        if use_tempo {
            out = change_tempo(&out, sr, profile.tempo)?;
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, sr: u32) -> Clip {
        let samples = (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * 528.0 * i as f64 / sr as f64).sin() * 0.5)
            .collect();
        Clip::mono("tone_528hz.wav", samples, sr)
    }

    #[test]
    fn test_lowpass_keeps_length() {
        let clip = tone(16000, 16000);
        let out = apply_profile(&clip, &Profile::warm(), false).unwrap();
        assert_eq!(out.frames(), clip.frames());
        assert_ne!(out.channels[0], clip.channels[0]);
    }

    #[test]
    fn test_highpass_keeps_length() {
        let clip = tone(16000, 16000);
        let out = apply_profile(&clip, &Profile::bright(), false).unwrap();
        assert_eq!(out.frames(), clip.frames());
    }

    #[test]
    fn test_tempo_skipped_when_disabled() {
        let clip = tone(16000, 16000);
        for profile in [Profile::warm(), Profile::bright()] {
            let out = apply_profile(&clip, &profile, false).unwrap();
            assert_eq!(out.frames(), clip.frames());
        }
    }

    #[test]
    fn test_faster_tempo_shortens() {
        let clip = tone(16000, 16000);
        let out = apply_profile(&clip, &Profile::bright(), true).unwrap();
        assert!(out.frames() < clip.frames());
    }

    #[test]
    fn test_slower_tempo_lengthens() {
        let clip = tone(16000, 16000);
        let out = apply_profile(&clip, &Profile::warm(), true).unwrap();
        assert!(out.frames() > clip.frames());
    }

    #[test]
    fn test_neutral_profile_is_identity() {
        let clip = tone(1000, 16000);
        let out = apply_profile(&clip, &Profile::neutral(), true).unwrap();
        assert_eq!(out, clip);
    }

    #[test]
    fn test_stereo_channels_processed_together() {
        let mono = tone(8000, 16000);
        let clip = Clip::new("s", vec![mono.channels[0].clone(), mono.channels[0].clone()], 16000);
        let out = apply_profile(&clip, &Profile::bright(), true).unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.channels[0].len(), out.channels[1].len());
        assert!(out.frames() < clip.frames());
    }

    #[test]
    fn test_zero_tempo_rejected() {
        let profile = Profile { tempo: 0.0, ..Profile::neutral() };
        let err = apply_profile(&tone(100, 16000), &profile, false).unwrap_err();
        assert_eq!(err.downcast_ref::<WeaveError>(), Some(&WeaveError::InvalidTempo(0.0)));
    }

    #[test]
    fn test_input_untouched() {
        let clip = tone(4000, 16000);
        let before = clip.clone();
        let _ = apply_profile(&clip, &Profile::warm(), true).unwrap();
        assert_eq!(clip, before);
    }
}
