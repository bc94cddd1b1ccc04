//! Voiceweave pipeline: two independently shuffled streams of clips woven
//! into one stereo soundscape.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::audio::effects::{concat, delay, mix_into, pad_to};
use crate::audio::io::resample_clip;
use crate::error::WeaveError;
use crate::types::{ms_to_frames, Clip, PlanEntry, Position, WeavePlan, WeaveResult};
use crate::weave::config::{Treatment, WeaveConfig};
use crate::weave::intro::build_intro;
use crate::weave::select::{estimate_duration, select_clips_for_duration};
use crate::weave::sequence::sequence_stream;

/// Resample clips so they all share the highest sample rate present.
fn conform_sample_rates(clips: &[Clip]) -> Result<Vec<Clip>> {
    let target = clips.iter().map(|c| c.sample_rate).max().unwrap_or_default();
    clips
        .iter()
        .map(|clip| {
            if clip.sample_rate != target {
                log::warn!(
                    "Resampling {} from {}Hz to {}Hz",
                    clip.name,
                    clip.sample_rate,
                    target
                );
            }
            resample_clip(clip, target)
        })
        .collect()
}

/// Overlay a left and a right stream, the right one starting `delay_ms` later.
///
/// The shorter side is padded with trailing silence before mixing.
fn mix_sides(left: &Clip, right: &Clip, delay_ms: f64) -> Clip {
    let right = delay(right, ms_to_frames(delay_ms, right.sample_rate));
    let len = left.frames().max(right.frames());
    let mut mixed = pad_to(left, len);
    mix_into(&mut mixed, &pad_to(&right, len), 0);
    mixed
}

/// Sequence both sides of one weave segment and mix them with a lead delay.
fn weave_segment(
    left: &[&Clip],
    right: &[&Clip],
    config: &WeaveConfig,
    treatment: &Treatment,
    delay_ms: f64,
) -> Result<Clip> {
    let left_stream = sequence_stream(
        left,
        &Position::left_cycle(config.crossfeed),
        config.overlap_ms,
        config.no_overlap_until_ms,
        treatment,
    )?;
    let right_stream = sequence_stream(
        right,
        &Position::right_cycle(config.crossfeed),
        config.overlap_ms,
        config.no_overlap_until_ms,
        treatment,
    )?;
    Ok(mix_sides(&left_stream, &right_stream, delay_ms))
}

/// The main weave: an initial segment with the longer lead delay, then the
/// rest with the shorter one. A segment with an empty side is skipped.
fn build_main_weave(
    left: &[&Clip],
    right: &[&Clip],
    config: &WeaveConfig,
    treatment: &Treatment,
) -> Result<Option<Clip>> {
    let split_left = config.initial_clips.min(left.len());
    let split_right = config.initial_clips.min(right.len());
    let (initial_left, rest_left) = left.split_at(split_left);
    let (initial_right, rest_right) = right.split_at(split_right);

    let mut segments = Vec::new();
    if !initial_left.is_empty() && !initial_right.is_empty() {
        segments.push(weave_segment(initial_left, initial_right, config, treatment, config.initial_delay_ms)?);
    }
    if !rest_left.is_empty() && !rest_right.is_empty() {
        segments.push(weave_segment(rest_left, rest_right, config, treatment, config.rest_delay_ms)?);
    }
    if segments.is_empty() {
        return Ok(None);
    }
    let refs: Vec<&Clip> = segments.iter().collect();
    Ok(Some(concat(&refs)))
}

fn plan_stream(order: &[&Clip], positions: &[Position], treatment: &Treatment) -> Vec<PlanEntry> {
    order
        .iter()
        .enumerate()
        .map(|(i, clip)| PlanEntry {
            name: clip.name.clone(),
            position: positions[i % positions.len()].label().to_string(),
            profile: treatment.profile(i).name.clone(),
        })
        .collect()
}

fn describe_stream(title: &str, entries: &[PlanEntry]) -> Vec<String> {
    let mut lines = vec![String::new(), title.to_string()];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "  {}. [{}] [{}] {}",
            i + 1,
            entry.position,
            entry.profile,
            entry.name
        ));
    }
    lines
}

/// A weave whose clips are selected and ordered but not yet rendered.
///
/// Holds the stream plan and its diagnostic lines so callers can report the
/// composition before the (slower) rendering starts.
#[derive(Debug, Clone)]
pub struct PreparedWeave {
    pub plan: WeavePlan,
    pub diagnostics: Vec<String>,
    config: WeaveConfig,
    pool: Vec<Clip>,
    left_order: Vec<usize>,
    right_order: Vec<usize>,
}

impl PreparedWeave {
    fn left(&self) -> Vec<&Clip> {
        self.left_order.iter().map(|&i| &self.pool[i]).collect()
    }

    fn right(&self) -> Vec<&Clip> {
        self.right_order.iter().map(|&i| &self.pool[i]).collect()
    }
}

/// Select and order clips for a weave.
///
/// With a seed, the result is a pure function of the inputs and the seed:
/// the one generator drives clip selection, then the left shuffle, then the
/// right shuffle, in that order.
pub fn plan_weave(clips: &[Clip], config: &WeaveConfig) -> Result<PreparedWeave> {
    if clips.is_empty() {
        return Err(WeaveError::NoClips.into());
    }
    config.validate()?;

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let clips = conform_sample_rates(clips)?;
    let mut diagnostics = vec![format!("Total clips available: {}", clips.len())];

    // --- Select subset for target duration ---
    let pool: Vec<Clip> = match config.target_duration_s {
        Some(target_s) => {
            let selected = select_clips_for_duration(
                &clips,
                target_s * 1000.0,
                config.overlap_ms,
                config.lead_delay_ms,
                config.tolerance_ms,
                &mut rng,
            );
            let estimated = estimate_duration(&selected, config.overlap_ms, config.lead_delay_ms);
            let line = format!(
                "Selected {} clips for ~{:.1}s target duration",
                selected.len(),
                estimated / 1000.0
            );
            log::info!("{}", line);
            diagnostics.push(line);
            selected.into_iter().cloned().collect()
        }
        None => clips,
    };

    // --- Two independent orderings ---
    let mut left_order: Vec<usize> = (0..pool.len()).collect();
    let mut right_order = left_order.clone();
    left_order.shuffle(&mut rng);
    right_order.shuffle(&mut rng);

    let mut prepared = PreparedWeave {
        plan: WeavePlan::default(),
        diagnostics,
        config: config.clone(),
        pool,
        left_order,
        right_order,
    };

    let treatment = config.treatment();
    let plan = WeavePlan {
        left: plan_stream(&prepared.left(), &Position::left_cycle(config.crossfeed), &treatment),
        right: plan_stream(&prepared.right(), &Position::right_cycle(config.crossfeed), &treatment),
    };
    prepared
        .diagnostics
        .extend(describe_stream("Left-side stream (hard-left <-> soft-left):", &plan.left));
    prepared
        .diagnostics
        .extend(describe_stream("Right-side stream (hard-right <-> soft-right):", &plan.right));
    for line in &prepared.diagnostics {
        log::debug!("{}", line);
    }
    prepared.plan = plan;
    Ok(prepared)
}

/// Render a prepared weave: the intro when both streams are long enough,
/// then the main weave.
pub fn render_weave(prepared: PreparedWeave) -> Result<WeaveResult> {
    let config = &prepared.config;
    let treatment = config.treatment();
    let left_positions = Position::left_cycle(config.crossfeed);
    let right_positions = Position::right_cycle(config.crossfeed);
    let left_order = prepared.left();
    let right_order = prepared.right();

    // --- Intro ---
    let min_for_intro = config.min_clips_for_intro.max(2);
    let use_intro = left_order.len() >= min_for_intro && right_order.len() >= min_for_intro;

    let (intro, remaining_left, remaining_right) = if use_intro {
        log::info!("Building intro sequence");
        let (intro, rem_left, rem_right) = build_intro(
            &left_order,
            &right_order,
            &left_positions,
            &right_positions,
            config.intro_pause_ms,
            config.intro_final_pause_ms,
            &treatment,
        )?;
        (Some(intro), rem_left, rem_right)
    } else {
        log::warn!(
            "Not enough clips for intro ({} per stream, need {}), using simple weave",
            left_order.len(),
            min_for_intro
        );
        (None, &left_order[..], &right_order[..])
    };

    // --- Main weave ---
    log::info!("Building main weave");
    let main = build_main_weave(remaining_left, remaining_right, config, &treatment)?;

    let mut audio = match (intro, main) {
        (Some(intro), Some(main)) => concat(&[&intro, &main]),
        (Some(intro), None) => intro,
        (None, Some(main)) => main,
        (None, None) => return Err(WeaveError::NoClips.into()),
    };
    audio.name = "weave".to_string();

    let line = format!("Total duration: {:.1}s", audio.duration_s());
    log::info!("{}", line);
    let mut diagnostics = prepared.diagnostics.clone();
    diagnostics.push(String::new());
    diagnostics.push(line);

    Ok(WeaveResult {
        audio,
        diagnostics,
        plan: prepared.plan.clone(),
        used_intro: use_intro,
    })
}

/// Run the full weave: [`plan_weave`] then [`render_weave`].
///
/// Takes decoded clips and returns the stereo mix plus diagnostic lines.
pub fn weave(clips: &[Clip], config: &WeaveConfig) -> Result<WeaveResult> {
    render_weave(plan_weave(clips, config)?)
}
