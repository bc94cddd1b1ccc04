//! Audio effects: silence, fades, gain, filtering, tempo change, mono
//! downmix, and timeline mixing (overlay, concatenation, padding).
//!
//! Every function here leaves its inputs untouched and returns new samples.

use anyhow::{anyhow, bail, Result};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Type, Q_BUTTERWORTH_F64};

use crate::audio::io::resample;
use crate::error::WeaveError;
use crate::types::Clip;

/// Attenuation used for a gain of zero (or below): effectively silent.
pub const SILENT_DB: f64 = -120.0;

/// Generate silence of given duration.
pub fn generate_silence(duration_ms: f64, sr: u32) -> Vec<f64> {
    let n_samples = (duration_ms.max(0.0) / 1000.0 * sr as f64).round() as usize;
    vec![0.0; n_samples]
}

/// Linear fade-in over the first `fade_samples` samples.
///
/// A fade longer than the input spans the whole input.
pub fn fade_in(samples: &[f64], fade_samples: usize) -> Vec<f64> {
    let mut out = samples.to_vec();
    let n = fade_samples.min(out.len());
    for (i, s) in out[..n].iter_mut().enumerate() {
        *s *= i as f64 / n as f64;
    }
    out
}

/// Linear fade-out over the last `fade_samples` samples.
pub fn fade_out(samples: &[f64], fade_samples: usize) -> Vec<f64> {
    let mut out = samples.to_vec();
    let n = fade_samples.min(out.len());
    let start = out.len() - n;
    for (i, s) in out[start..].iter_mut().enumerate() {
        *s *= (n - i) as f64 / n as f64;
    }
    out
}

/// Apply a short fade-in and a longer fade-out to every channel.
pub fn apply_fades(clip: &Clip, fade_in_ms: f64, fade_out_ms: f64) -> Clip {
    let in_samples = clip.ms_to_frames(fade_in_ms);
    let out_samples = clip.ms_to_frames(fade_out_ms);
    let channels = clip
        .channels
        .iter()
        .map(|c| fade_out(&fade_in(c, in_samples), out_samples))
        .collect();
    Clip::new(clip.name.clone(), channels, clip.sample_rate)
}

/// Convert a volume fraction to decibels.
///
/// Zero or negative volume maps to [`SILENT_DB`] rather than `-inf`.
pub fn vol_to_db(vol: f64) -> f64 {
    if vol <= 0.0 {
        return SILENT_DB;
    }
    20.0 * vol.log10()
}

/// Convert decibels to a linear gain factor.
pub fn db_to_gain(db: f64) -> f64 {
    10.0f64.powf(db / 20.0)
}

/// Scale samples by a dB amount.
pub fn apply_gain(samples: &[f64], db: f64) -> Vec<f64> {
    if db.abs() < 1e-9 {
        return samples.to_vec();
    }
    let gain = db_to_gain(db);
    samples.iter().map(|s| s * gain).collect()
}

/// Downmix to a single channel by averaging. Mono input is returned as-is.
pub fn to_mono(clip: &Clip) -> Clip {
    if clip.num_channels() <= 1 {
        return clip.clone();
    }
    let n = clip.num_channels() as f64;
    let mono = (0..clip.frames())
        .map(|i| clip.channels.iter().map(|c| c[i]).sum::<f64>() / n)
        .collect();
    Clip::mono(clip.name.clone(), mono, clip.sample_rate)
}

/// Cutoff in biquad's normalized units, where 1.0 is Nyquist.
fn normalized_cutoff(cutoff_hz: f64, sr: u32) -> f64 {
    2.0 * cutoff_hz / sr as f64
}

/// Bilinear one-pole high-pass: a zero at DC, unity gain at Nyquist.
fn one_pole_high_pass(cutoff_hz: f64, sr: u32) -> Coefficients<f64> {
    let k = (std::f64::consts::PI * cutoff_hz / sr as f64).tan();
    let a0 = 1.0 + k;
    Coefficients {
        a1: (k - 1.0) / a0,
        a2: 0.0,
        b0: 1.0 / a0,
        b1: -1.0 / a0,
        b2: 0.0,
    }
}

fn run_biquad(samples: &[f64], coeffs: Coefficients<f64>) -> Vec<f64> {
    let mut state = DirectForm2Transposed::<f64>::new(coeffs);
    samples.iter().map(|&x| state.run(x)).collect()
}

/// One-pole (6 dB/octave) low-pass, -3 dB at `cutoff_hz`.
///
/// A cutoff at or above Nyquist leaves the signal unchanged.
pub fn low_pass(samples: &[f64], sr: u32, cutoff_hz: f64) -> Result<Vec<f64>> {
    if cutoff_hz.is_nan() || cutoff_hz <= 0.0 {
        bail!("Low-pass cutoff must be positive, got {}Hz", cutoff_hz);
    }
    if cutoff_hz * 2.0 >= sr as f64 {
        log::debug!("Low-pass {}Hz at or above Nyquist for {}Hz, skipping", cutoff_hz, sr);
        return Ok(samples.to_vec());
    }
    let coeffs = Coefficients::<f64>::from_normalized_params(
        Type::SinglePoleLowPass,
        normalized_cutoff(cutoff_hz, sr),
        Q_BUTTERWORTH_F64,
    )
    .map_err(|e| anyhow!("Failed to design low-pass at {}Hz: {:?}", cutoff_hz, e))?;
    Ok(run_biquad(samples, coeffs))
}

/// One-pole (6 dB/octave) high-pass, -3 dB at `cutoff_hz`.
pub fn high_pass(samples: &[f64], sr: u32, cutoff_hz: f64) -> Result<Vec<f64>> {
    if cutoff_hz.is_nan() || cutoff_hz <= 0.0 {
        bail!("High-pass cutoff must be positive, got {}Hz", cutoff_hz);
    }
    if cutoff_hz * 2.0 >= sr as f64 {
        return Err(WeaveError::FilterCutoff { cutoff_hz, sample_rate: sr }.into());
    }
    Ok(run_biquad(samples, one_pole_high_pass(cutoff_hz, sr)))
}

/// Change tempo by reinterpreting the sample rate and resampling back.
///
/// The samples are treated as if recorded at `sr * tempo`, then resampled to
/// `sr`. This shortens (`tempo` > 1.0) or lengthens (`tempo` < 1.0) the audio
/// and shifts its pitch by the same ratio. A tempo of exactly 1.0 is a no-op.
pub fn change_tempo(samples: &[f64], sr: u32, tempo: f64) -> Result<Vec<f64>> {
    if !tempo.is_finite() || tempo <= 0.0 {
        return Err(WeaveError::InvalidTempo(tempo).into());
    }
    if tempo == 1.0 {
        return Ok(samples.to_vec());
    }
    let reinterpreted_sr = (sr as f64 * tempo) as u32;
    if reinterpreted_sr == 0 {
        return Err(WeaveError::InvalidTempo(tempo).into());
    }
    resample(samples, reinterpreted_sr, sr)
}

/// Additively mix `other` into a copy of `base`, starting at `offset` frames.
///
/// The result is extended with silence when `other` runs past the end of
/// `base`. Channels are matched by index.
pub fn overlay(base: &Clip, other: &Clip, offset: usize) -> Clip {
    let mut out = base.clone();
    mix_into(&mut out, other, offset);
    out
}

/// In-place form of [`overlay`] for timelines owned by the caller.
pub(crate) fn mix_into(dest: &mut Clip, src: &Clip, offset: usize) {
    let end = offset + src.frames();
    if end > dest.frames() {
        for channel in dest.channels.iter_mut() {
            channel.resize(end, 0.0);
        }
    }
    for (d, s) in dest.channels.iter_mut().zip(src.channels.iter()) {
        for (i, &v) in s.iter().enumerate() {
            d[offset + i] += v;
        }
    }
}

/// Join clips end to end. Channel counts must agree; the first clip's name
/// and sample rate are kept.
pub fn concat(clips: &[&Clip]) -> Clip {
    let Some(first) = clips.first() else {
        return Clip::new("", vec![], crate::types::DEFAULT_SAMPLE_RATE);
    };
    let total: usize = clips.iter().map(|c| c.frames()).sum();
    let mut channels = vec![Vec::with_capacity(total); first.num_channels()];
    for clip in clips {
        for (d, s) in channels.iter_mut().zip(clip.channels.iter()) {
            d.extend_from_slice(s);
        }
    }
    Clip::new(first.name.clone(), channels, first.sample_rate)
}

/// Prepend `frames` of silence.
pub fn delay(clip: &Clip, frames: usize) -> Clip {
    let channels = clip
        .channels
        .iter()
        .map(|c| {
            let mut out = vec![0.0; frames];
            out.extend_from_slice(c);
            out
        })
        .collect();
    Clip::new(clip.name.clone(), channels, clip.sample_rate)
}

/// Extend with trailing silence to at least `frames` frames.
pub fn pad_to(clip: &Clip, frames: usize) -> Clip {
    let mut out = clip.clone();
    if frames > out.frames() {
        for channel in out.channels.iter_mut() {
            channel.resize(frames, 0.0);
        }
    }
    out
}
