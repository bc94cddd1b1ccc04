//! Audio I/O: WAV read/write, multi-format decode, resampling.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

use crate::types::Clip;

/// Display name for a clip loaded from `path`.
fn clip_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Split interleaved samples into one vector per channel.
fn deinterleave(interleaved: &[f64], channels: usize) -> Vec<Vec<f64>> {
    let channels = channels.max(1);
    let frames = interleaved.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            planar[ch].push(s);
        }
    }
    planar
}

/// Read a WAV file into a [`Clip`].
///
/// - Normalizes int8..int32 to f64 in [-1, 1]
/// - Passes through float WAVs as f64
/// - Keeps every channel
pub fn read_wav(path: &Path) -> Result<Clip> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Failed to read WAV samples")?
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read WAV samples")?,
    };

    Ok(Clip::new(
        clip_name(path),
        deinterleave(&interleaved, channels),
        spec.sample_rate,
    ))
}

/// Decode any format symphonia understands (WAV, MP3, AAC/MP4) into a [`Clip`].
pub fn decode_audio(path: &Path) -> Result<Clip> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Unsupported format: {}", path.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported codec")?;

    let mut interleaved: Vec<f64> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();
                let mut sample_buf = SampleBuffer::<f64>::new(decoded.frames() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(sample_buf.samples());
            }
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if interleaved.is_empty() {
        bail!("No audio decoded from {}", path.display());
    }

    Ok(Clip::new(clip_name(path), deinterleave(&interleaved, channels), sample_rate))
}

/// Load one clip: `.wav` through hound, anything else through symphonia.
pub fn load_clip(path: &Path) -> Result<Clip> {
    let is_wav = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        read_wav(path)
    } else {
        decode_audio(path)
    }
}

/// Load clips in order, logging each one.
pub fn load_clips(paths: &[PathBuf]) -> Result<Vec<Clip>> {
    let mut clips = Vec::with_capacity(paths.len());
    for path in paths {
        let clip = load_clip(path)?;
        log::info!("Loaded: {} ({:.2}s)", clip.name, clip.duration_s());
        clips.push(clip);
    }
    Ok(clips)
}

fn write_wav_samples(path: &Path, clip: &Clip) -> Result<()> {
    let spec = WavSpec {
        channels: clip.num_channels() as u16,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for frame in 0..clip.frames() {
        for channel in &clip.channels {
            let clipped = channel[frame].clamp(-1.0, 1.0);
            writer.write_sample((clipped * 32767.0) as i16)?;
        }
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

/// Write a clip to a 16-bit PCM WAV file with the clip's channel count.
///
/// Clips values to [-1, 1] before conversion. Creates parent directories if
/// needed. Writes to a temp file first and renames it into place, so a failed
/// export never leaves a partial file at `path`.
pub fn write_wav(path: &Path, clip: &Clip) -> Result<()> {
    if clip.num_channels() == 0 {
        bail!("Cannot write a clip with no channels: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let tmp_path = path.with_extension("wav.tmp");
    if let Err(e) = write_wav_samples(&tmp_path, clip) {
        std::fs::remove_file(&tmp_path).ok();
        return Err(e);
    }
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move WAV into place: {}", path.display()))?;
    Ok(())
}

/// Resample audio from source sample rate to target sample rate.
///
/// Uses rubato for band-limited resampling. The filter delay is removed and
/// the result is exactly `round(len * to_sr / from_sr)` samples long.
pub fn resample(samples: &[f64], from_sr: u32, to_sr: u32) -> Result<Vec<f64>> {
    if from_sr == to_sr {
        return Ok(samples.to_vec());
    }

    if samples.is_empty() {
        return Ok(vec![]);
    }

    use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

    const SINC_LEN: usize = 256;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_sr as f64 / from_sr as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    // Trailing zeros flush the filter so the tail survives delay removal
    let mut padded = Vec::with_capacity(samples.len() + SINC_LEN);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + SINC_LEN, 0.0);

    let mut resampler = SincFixedIn::<f64>::new(
        ratio,
        2.0, // max relative ratio (allows some flexibility)
        params,
        padded.len(),
        1, // mono
    )?;

    let delay = resampler.output_delay();
    let input = vec![padded];
    let output = resampler.process(&input, None)?;
    let mut out: Vec<f64> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .collect();
    out.resize(expected_len, 0.0);

    Ok(out)
}

/// Resample every channel of a clip to `to_sr`.
pub fn resample_clip(clip: &Clip, to_sr: u32) -> Result<Clip> {
    if clip.sample_rate == to_sr {
        return Ok(clip.clone());
    }
    let mut out = clip.map_channels(|c| resample(c, clip.sample_rate, to_sr))?;
    out.sample_rate = to_sr;
    Ok(out)
}
