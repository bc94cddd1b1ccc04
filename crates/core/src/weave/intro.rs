//! The scripted opening that introduces each stream before the weave.

use anyhow::{bail, Result};

use crate::audio::effects::{concat, generate_silence, overlay};
use crate::error::WeaveError;
use crate::types::{Clip, Position};
use crate::weave::config::Treatment;
use crate::weave::sequence::prepare_clip;

/// Build the intro from the first two clips of each stream.
///
/// 1. left clip 1 alone (first left position)
/// 2. pause
/// 3. right clip 1 alone (first right position)
/// 4. pause
/// 5. left clip 2 (second left position)
/// 6. right clip 2 (second right position), overlaid starting halfway through step 5
/// 7. final pause
///
/// No tempo change is applied to any intro clip. Returns the intro and the
/// clips of each stream that it did not consume.
pub fn build_intro<'a, C: AsRef<Clip>>(
    left: &'a [C],
    right: &'a [C],
    left_positions: &[Position],
    right_positions: &[Position],
    pause_ms: f64,
    final_pause_ms: f64,
    treatment: &Treatment,
) -> Result<(Clip, &'a [C], &'a [C])> {
    if left.len() < 2 || right.len() < 2 {
        bail!(
            "Intro needs two clips per stream (left has {}, right has {})",
            left.len(),
            right.len()
        );
    }
    if left_positions.is_empty() || right_positions.is_empty() {
        return Err(WeaveError::EmptyPositions.into());
    }
    let second = |positions: &[Position]| positions[1 % positions.len()];

    let left_first = prepare_clip(left[0].as_ref(), treatment, 0, left_positions[0], false)?;
    let right_first = prepare_clip(right[0].as_ref(), treatment, 0, right_positions[0], false)?;
    let left_second = prepare_clip(left[1].as_ref(), treatment, 1, second(left_positions), false)?;
    let right_second = prepare_clip(right[1].as_ref(), treatment, 1, second(right_positions), false)?;

    let sr = left_first.sample_rate;
    let silence = |ms: f64| Clip::new("pause", vec![generate_silence(ms, sr); 2], sr);
    let pause = silence(pause_ms);
    let final_pause = silence(final_pause_ms);

    let halfway = left_second.frames() / 2;
    let paired = overlay(&left_second, &right_second, halfway);

    let mut intro = concat(&[&left_first, &pause, &right_first, &pause, &paired, &final_pause]);
    intro.name = "intro".to_string();

    log::info!("Intro built: {:.1}s", intro.duration_s());
    Ok((intro, &left[2..], &right[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Profile;

    fn constant(name: &str, frames: usize) -> Clip {
        Clip::mono(name, vec![0.5; frames], 1000)
    }

    fn neutral() -> Treatment {
        Treatment {
            profiles: [Profile::neutral(), Profile::neutral()],
            fade_in_ms: 0.0,
            fade_out_ms: 0.0,
        }
    }

    fn streams(n: usize) -> (Vec<Clip>, Vec<Clip>) {
        let left = (0..n).map(|i| constant(&format!("l{}", i), 1000)).collect();
        let right = (0..n).map(|i| constant(&format!("r{}", i), 1000)).collect();
        (left, right)
    }

    #[test]
    fn test_intro_layout_and_remaining() {
        let (left, right) = streams(4);
        let (intro, rem_left, rem_right) = build_intro(
            &left,
            &right,
            &Position::left_cycle(0.3),
            &Position::right_cycle(0.3),
            1000.0,
            1000.0,
            &neutral(),
        )
        .unwrap();

        // 1000 + 1000 + 1000 + 1000 + (500 + 1000) + 1000
        assert_eq!(intro.frames(), 6500);
        assert_eq!(intro.num_channels(), 2);
        assert_eq!(rem_left.len(), 2);
        assert_eq!(rem_right.len(), 2);
        assert_eq!(rem_left[0].name, "l2");
        assert_eq!(rem_right[1].name, "r3");
    }

    #[test]
    fn test_intro_solo_clips_are_hard_panned() {
        let (left, right) = streams(3);
        let (intro, _, _) = build_intro(
            &left,
            &right,
            &Position::left_cycle(0.3),
            &Position::right_cycle(0.3),
            1000.0,
            1000.0,
            &neutral(),
        )
        .unwrap();

        // Step 1: hard left
        assert!((intro.channels[0][500] - 0.5).abs() < 1e-12);
        assert!(intro.channels[1][500].abs() < 1e-6);
        // Step 2: pause
        assert_eq!(intro.channels[0][1500], 0.0);
        // Step 3: hard right
        assert!(intro.channels[0][2500].abs() < 1e-6);
        assert!((intro.channels[1][2500] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_intro_second_pair_overlaps_halfway() {
        let (left, right) = streams(3);
        let (intro, _, _) = build_intro(
            &left,
            &right,
            &Position::left_cycle(0.3),
            &Position::right_cycle(0.3),
            1000.0,
            1000.0,
            &neutral(),
        )
        .unwrap();

        let pair_start = 4000;
        // Before halfway: soft-left alone
        assert!((intro.channels[0][pair_start + 250] - 0.5).abs() < 1e-12);
        assert!((intro.channels[1][pair_start + 250] - 0.15).abs() < 1e-9);
        // After halfway: both clips mixed
        assert!((intro.channels[0][pair_start + 750] - 0.65).abs() < 1e-9);
        assert!((intro.channels[1][pair_start + 750] - 0.65).abs() < 1e-9);
        // After left ends: soft-right alone
        assert!((intro.channels[1][pair_start + 1250] - 0.5).abs() < 1e-12);
        // Final pause
        assert_eq!(intro.channels[1][intro.frames() - 1], 0.0);
    }

    #[test]
    fn test_intro_requires_two_clips() {
        let (left, right) = streams(1);
        assert!(build_intro(
            &left,
            &right,
            &Position::left_cycle(0.3),
            &Position::right_cycle(0.3),
            1000.0,
            1000.0,
            &neutral(),
        )
        .is_err());
    }
}
