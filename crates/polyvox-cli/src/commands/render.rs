//! Offline rendering to WAV.

use anyhow::{Context, bail};
use clap::Args;
use polyvox_config::resolve_preset;
use polyvox_synth::PolySynth;
use std::path::{Path, PathBuf};

/// Frames rendered per call, like an audio callback would.
const BLOCK_FRAMES: usize = 512;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Factory preset name or path to a .toml/.json patch
    #[arg(short, long)]
    preset: Option<String>,

    /// MIDI note to play when no chord is given
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u8).range(0..=127))]
    note: u8,

    /// Note-on velocity
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=127))]
    velocity: u8,

    /// Comma-separated MIDI notes, e.g. 60,64,67
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u8).range(0..=127))]
    chord: Vec<u8>,

    /// Seconds the notes are held
    #[arg(long, default_value = "1.0")]
    hold: f32,

    /// Seconds rendered after note-off
    #[arg(long, default_value = "1.0")]
    tail: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "44100", value_parser = clap::value_parser!(u32).range(8000..=192_000))]
    sample_rate: u32,

    /// Voice pool size
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u16).range(1..=64))]
    voices: u16,

    /// Base seed for noise, drift and random LFO steps
    #[arg(long)]
    seed: Option<u64>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    for (flag, secs) in [("--hold", args.hold), ("--tail", args.tail)] {
        if !secs.is_finite() || secs < 0.0 {
            bail!("{} must be a non-negative number of seconds, got {}", flag, secs);
        }
    }

    let sample_rate = args.sample_rate as f32;
    let voices = usize::from(args.voices);
    let mut synth = match args.seed {
        Some(seed) => PolySynth::with_seed(sample_rate, voices, seed),
        None => PolySynth::new(sample_rate, voices),
    };

    if let Some(name) = &args.preset {
        let patch = resolve_preset(name).with_context(|| format!("loading preset '{}'", name))?;
        tracing::info!(preset = %patch.name, "applying preset");
        patch.apply_to(&mut synth);
    }

    let notes = if args.chord.is_empty() {
        vec![args.note]
    } else {
        args.chord.clone()
    };

    let hold_frames = (args.hold * sample_rate).round() as usize;
    let tail_frames = (args.tail * sample_rate).round() as usize;
    let samples = render_notes(&mut synth, &notes, args.velocity, hold_frames, tail_frames);

    write_stereo_wav(&args.output, &samples, args.sample_rate)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let stats = Stats::measure(&samples);
    println!("Rendered {} to {}", describe_notes(&notes), args.output.display());
    println!(
        "  {:.2} s at {} Hz, {} voices",
        (hold_frames + tail_frames) as f32 / sample_rate,
        args.sample_rate,
        voices
    );
    println!("  peak:        {:.4} ({:.1} dBFS)", stats.peak, to_db(stats.peak));
    println!("  rms L:       {:.4} ({:.1} dBFS)", stats.rms_left, to_db(stats.rms_left));
    println!("  rms R:       {:.4} ({:.1} dBFS)", stats.rms_right, to_db(stats.rms_right));
    println!("  correlation: {:.3}", stats.correlation);

    if stats.peak > 1.0 {
        tracing::warn!(peak = stats.peak, "output exceeds full scale");
    }
    Ok(())
}

/// Play `notes` for `hold` frames, release them, render `tail` more frames.
/// Returns interleaved stereo.
fn render_notes(synth: &mut PolySynth, notes: &[u8], velocity: u8, hold: usize, tail: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; (hold + tail) * 2];
    let (held, released) = out.split_at_mut(hold * 2);

    for &note in notes {
        synth.note_on(note, velocity);
    }
    for block in held.chunks_mut(BLOCK_FRAMES * 2) {
        synth.render_interleaved(block);
    }

    for &note in notes {
        synth.note_off(note);
    }
    for block in released.chunks_mut(BLOCK_FRAMES * 2) {
        synth.render_interleaved(block);
    }

    tracing::debug!(active = synth.active_voice_count(), "render finished");
    out
}

fn write_stereo_wav(path: &Path, interleaved: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn describe_notes(notes: &[u8]) -> String {
    let list: Vec<String> = notes.iter().map(ToString::to_string).collect();
    if notes.len() == 1 {
        format!("note {}", list[0])
    } else {
        format!("chord {}", list.join(","))
    }
}

fn to_db(x: f32) -> f32 {
    20.0 * x.max(1e-10).log10()
}

/// Level summary of an interleaved stereo buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stats {
    peak: f32,
    rms_left: f32,
    rms_right: f32,
    /// Pearson correlation of L and R; 1 for identical channels, 0 when
    /// either channel is silent.
    correlation: f32,
}

impl Stats {
    fn measure(interleaved: &[f32]) -> Self {
        let frames = interleaved.len() / 2;
        if frames == 0 {
            return Self {
                peak: 0.0,
                rms_left: 0.0,
                rms_right: 0.0,
                correlation: 0.0,
            };
        }

        let n = frames as f64;
        let (mut sum_l, mut sum_r) = (0.0f64, 0.0f64);
        let mut peak = 0.0f32;
        for frame in interleaved.chunks_exact(2) {
            sum_l += f64::from(frame[0]);
            sum_r += f64::from(frame[1]);
            peak = peak.max(frame[0].abs()).max(frame[1].abs());
        }
        let (mean_l, mean_r) = (sum_l / n, sum_r / n);

        let (mut sq_l, mut sq_r) = (0.0f64, 0.0f64);
        let (mut cov, mut var_l, mut var_r) = (0.0f64, 0.0f64, 0.0f64);
        for frame in interleaved.chunks_exact(2) {
            let (l, r) = (f64::from(frame[0]), f64::from(frame[1]));
            sq_l += l * l;
            sq_r += r * r;
            let (dl, dr) = (l - mean_l, r - mean_r);
            cov += dl * dr;
            var_l += dl * dl;
            var_r += dr * dr;
        }

        let denom = (var_l * var_r).sqrt();
        Self {
            peak,
            rms_left: (sq_l / n).sqrt() as f32,
            rms_right: (sq_r / n).sqrt() as f32,
            correlation: if denom > 1e-20 { (cov / denom) as f32 } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_identical_channels() {
        let buf: Vec<f32> = (0..1000)
            .flat_map(|i| {
                let s = (i as f32 * 0.1).sin() * 0.5;
                [s, s]
            })
            .collect();
        let stats = Stats::measure(&buf);
        assert!((stats.correlation - 1.0).abs() < 1e-6);
        assert_eq!(stats.rms_left, stats.rms_right);
        assert!(stats.peak <= 0.5 && stats.peak > 0.49);
    }

    #[test]
    fn test_stats_inverted_and_silent() {
        let inverted: Vec<f32> = (0..100).flat_map(|i| [i as f32 / 100.0, -(i as f32) / 100.0]).collect();
        assert!((Stats::measure(&inverted).correlation + 1.0).abs() < 1e-6);

        let silent_right: Vec<f32> = (0..100).flat_map(|i| [i as f32 / 100.0, 0.0]).collect();
        let stats = Stats::measure(&silent_right);
        assert_eq!(stats.correlation, 0.0);
        assert_eq!(stats.rms_right, 0.0);

        assert_eq!(Stats::measure(&[]).peak, 0.0);
    }

    #[test]
    fn test_render_notes_releases() {
        let mut synth = PolySynth::new(44100.0, 4);
        let out = render_notes(&mut synth, &[60, 64, 67], 100, 4410, 44100);
        assert_eq!(out.len(), (4410 + 44100) * 2);
        assert!(out[..4410 * 2].iter().any(|&s| s != 0.0));
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn test_describe_notes() {
        assert_eq!(describe_notes(&[60]), "note 60");
        assert_eq!(describe_notes(&[60, 64, 67]), "chord 60,64,67");
    }
}
