//! Mono-to-stereo placement.

use crate::audio::effects::{apply_gain, to_mono, vol_to_db};
use crate::types::{Clip, Position};

/// Pan a clip to a stereo position.
///
/// The clip is downmixed to mono first; each output channel is the mono
/// signal gained by that side's volume. A zero gain resolves to the fixed
/// silent floor rather than an undefined logarithm.
pub fn pan_to_stereo(clip: &Clip, position: Position) -> Clip {
    let mono = to_mono(clip);
    let samples = mono.channels.first().map(|c| c.as_slice()).unwrap_or(&[]);
    let left = apply_gain(samples, vol_to_db(position.left));
    let right = apply_gain(samples, vol_to_db(position.right));
    Clip::new(clip.name.clone(), vec![left, right], clip.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::effects::{db_to_gain, SILENT_DB};
    use crate::types::CROSSFEED;

    fn tone() -> Clip {
        let samples = (0..1600)
            .map(|i| (2.0 * std::f64::consts::PI * 528.0 * i as f64 / 16000.0).sin() * 0.8)
            .collect();
        Clip::mono("tone", samples, 16000)
    }

    fn peak(samples: &[f64]) -> f64 {
        samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_hard_left() {
        let clip = tone();
        let stereo = pan_to_stereo(&clip, Position::HARD_LEFT);
        assert_eq!(stereo.num_channels(), 2);
        assert_eq!(stereo.channels[0], clip.channels[0]);
        let floor = db_to_gain(SILENT_DB);
        assert!((peak(&stereo.channels[1]) - peak(&clip.channels[0]) * floor).abs() < 1e-12);
    }

    #[test]
    fn test_hard_right() {
        let clip = tone();
        let stereo = pan_to_stereo(&clip, Position::HARD_RIGHT);
        assert_eq!(stereo.channels[1], clip.channels[0]);
        assert!(peak(&stereo.channels[0]) <= 1e-6);
    }

    #[test]
    fn test_soft_left_crossfeed() {
        let clip = tone();
        let stereo = pan_to_stereo(&clip, Position::SOFT_LEFT);
        assert_eq!(stereo.channels[0], clip.channels[0]);
        let ratio = peak(&stereo.channels[1]) / peak(&clip.channels[0]);
        assert!((ratio - CROSSFEED).abs() < 1e-9);
    }

    #[test]
    fn test_soft_right_crossfeed() {
        let clip = tone();
        let stereo = pan_to_stereo(&clip, Position::SOFT_RIGHT);
        let ratio = peak(&stereo.channels[0]) / peak(&clip.channels[0]);
        assert!((ratio - CROSSFEED).abs() < 1e-9);
    }

    #[test]
    fn test_stereo_input_downmixed() {
        let clip = Clip::new("s", vec![vec![1.0; 10], vec![0.0; 10]], 8000);
        let stereo = pan_to_stereo(&clip, Position::HARD_LEFT);
        assert_eq!(stereo.channels[0], vec![0.5; 10]);
        assert_eq!(stereo.frames(), 10);
    }
}
