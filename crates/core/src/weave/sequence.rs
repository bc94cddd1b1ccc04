//! Lay out one stream of clips on a continuous stereo timeline.

use anyhow::Result;

use crate::audio::effects::{apply_fades, mix_into};
use crate::error::WeaveError;
use crate::types::{ms_to_frames, Clip, Position, DEFAULT_SAMPLE_RATE};
use crate::weave::config::Treatment;
use crate::weave::pan::pan_to_stereo;
use crate::weave::profile::apply_profile;

/// Profile, fade and pan one clip, ready to be placed on a timeline.
///
/// `index` is the clip's position within its stream segment and picks the
/// profile (even/odd).
pub fn prepare_clip(
    clip: &Clip,
    treatment: &Treatment,
    index: usize,
    position: Position,
    apply_tempo: bool,
) -> Result<Clip> {
    let profiled = apply_profile(clip, treatment.profile(index), apply_tempo)?;
    let faded = apply_fades(&profiled, treatment.fade_in_ms, treatment.fade_out_ms);
    Ok(pan_to_stereo(&faded, position))
}

/// Sequence clips into one stereo timeline with overlap.
///
/// Positions cycle through `positions`, profiles alternate per index. While
/// the timeline is no longer than `no_overlap_until_ms`, each clip starts
/// exactly where the previous one ended and keeps its original tempo. Past
/// that point clips are pulled back by `overlap_ms` into the previous clip
/// and the profile's tempo change applies. Clips are mixed additively.
///
/// All clips must share one sample rate.
pub fn sequence_stream<C: AsRef<Clip>>(
    clips: &[C],
    positions: &[Position],
    overlap_ms: f64,
    no_overlap_until_ms: f64,
    treatment: &Treatment,
) -> Result<Clip> {
    if positions.is_empty() {
        return Err(WeaveError::EmptyPositions.into());
    }
    let Some(first) = clips.first() else {
        return Ok(Clip::silent("stream", 0, 2, DEFAULT_SAMPLE_RATE));
    };

    let mut timeline = prepare_clip(first.as_ref(), treatment, 0, positions[0], false)?;
    timeline.name = "stream".to_string();

    let sr = timeline.sample_rate;
    let threshold = ms_to_frames(no_overlap_until_ms, sr);
    let overlap = ms_to_frames(overlap_ms, sr);
    let mut current_end = timeline.frames();

    for (i, clip) in clips.iter().enumerate().skip(1) {
        let past_threshold = current_end > threshold;
        let position = positions[i % positions.len()];
        let placed = prepare_clip(clip.as_ref(), treatment, i, position, past_threshold)?;

        let effective_overlap = if past_threshold { overlap } else { 0 };
        let start = current_end.saturating_sub(effective_overlap);
        mix_into(&mut timeline, &placed, start);
        current_end = start + placed.frames();
    }

    Ok(timeline)
}
