//! End-to-end rendering scenarios at 44.1 kHz.
//!
//! Each test drives the synth through its public API only and checks a
//! measurable property of the rendered audio.

use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use polyvox_synth::{EnvelopeParams, ParamId, PolySynth, Waveform};

const SR: f32 = 44100.0;

fn seconds(s: f32) -> usize {
    (s * SR) as usize
}

fn render(synth: &mut PolySynth, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    synth.render(&mut left, &mut right);
    (left, right)
}

fn rms(x: &[f32]) -> f32 {
    (x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32).sqrt()
}

/// RMS of the first difference over RMS of the signal. Rises with spectral
/// centroid.
fn brightness(x: &[f32]) -> f32 {
    let diff: Vec<f32> = x.windows(2).map(|w| w[1] - w[0]).collect();
    rms(&diff) / rms(x)
}

fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len() as f64;
    let ma = a.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let mb = b.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let dx = f64::from(x) - ma;
        let dy = f64::from(y) - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    (cov / (va * vb).sqrt()) as f32
}

fn open_envelopes(synth: &mut PolySynth) {
    let fast = EnvelopeParams::new(0.001, 0.0, 1.0, 0.01);
    synth.set_amp_envelope(fast);
    synth.set_filter_envelope(fast);
}

#[test]
fn sine_a4_is_clean_and_releases() {
    let mut synth = PolySynth::new(SR, 2);
    synth.set_int(ParamId::Osc1Waveform, Waveform::Sine.index()).unwrap();
    synth.set_float(ParamId::Osc1Level, 1.0).unwrap();
    synth.set_float(ParamId::Osc2Level, 0.0).unwrap();
    synth.set_float(ParamId::VcfCutoff, 20000.0).unwrap();
    open_envelopes(&mut synth);

    synth.note_on(69, 100);
    let (left, right) = render(&mut synth, seconds(1.0));
    assert_eq!(left, right, "centered voice must be identical in both channels");

    // Two-voice pool divides by 1; the centered pan law contributes 1/√2.
    // Sample n averages two subsamples, shifting the phase by half a step.
    let half_step = TAU * 440.0 / (2.0 * SR);
    for (n, &l) in left.iter().enumerate().take(2000).skip(100) {
        let expected = FRAC_1_SQRT_2
            * half_step.cos()
            * (TAU * 440.0 * n as f32 / SR + half_step).sin();
        assert!((l - expected).abs() < 1e-3, "frame {}: {} vs {}", n, l, expected);
    }

    let crossings = left
        .windows(2)
        .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
        .count();
    assert!((438..=441).contains(&crossings), "{} rising crossings in 1 s", crossings);

    let peak = left[seconds(0.5)..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - FRAC_1_SQRT_2).abs() < 2e-3, "peak {}", peak);

    synth.note_off(69);
    let (tail, _) = render(&mut synth, seconds(0.1));
    assert!(tail[tail.len() - 1].abs() < 1e-4);
    assert_eq!(synth.active_voice_count(), 0);
}

#[test]
fn filter_envelope_sweeps_saw_brightness() {
    let mut synth = PolySynth::new(SR, 2);
    synth.set_int(ParamId::Osc1Waveform, Waveform::Saw.index()).unwrap();
    synth.set_int(ParamId::FilterType, 0).unwrap();
    synth.set_float(ParamId::VcfCutoff, 200.0).unwrap();
    synth.set_float(ParamId::VcfResonance, 0.3).unwrap();
    synth.set_float(ParamId::VcfEnvAmount, 0.7).unwrap();
    synth.set_filter_envelope(EnvelopeParams::new(0.1, 1.0, 0.0, 0.5));

    synth.note_on(60, 110);
    let (out, _) = render(&mut synth, seconds(2.5));
    synth.note_off(60);

    let window = |a: f32, b: f32| &out[seconds(a)..seconds(b)];
    let early = window(0.02, 0.04);
    let peak = window(0.09, 0.11);
    let late = window(0.6, 0.65);

    assert!(rms(peak) > rms(early) * 5.0, "amplitude should rise through the attack");
    assert!(
        brightness(peak) > brightness(early) * 2.0,
        "brightness {} at 0.1 s vs {} at 0.03 s",
        brightness(peak),
        brightness(early)
    );
    assert!(
        brightness(peak) > brightness(late) * 2.0,
        "brightness {} at 0.1 s vs {} at 0.6 s",
        brightness(peak),
        brightness(late)
    );
}

#[test]
fn unison_spreads_stereo_without_clipping() {
    let mut synth = PolySynth::new(SR, 8);
    synth.set_int(ParamId::Osc1Waveform, Waveform::Saw.index()).unwrap();
    synth.set_float(ParamId::Osc2Level, 0.0).unwrap();
    synth.set_float(ParamId::VcfCutoff, 20000.0).unwrap();
    synth.set_int(ParamId::UnisonEnabled, 1).unwrap();
    synth.set_float(ParamId::UnisonDetune, 15.0).unwrap();
    synth.set_float(ParamId::UnisonSpread, 0.9).unwrap();

    synth.note_on(60, 100);
    assert_eq!(synth.active_voice_count(), 8);
    let (left, right) = render(&mut synth, seconds(1.0));

    let peak = left.iter().chain(&right).fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak < 1.0, "peak {}", peak);

    let corr = correlation(&left, &right);
    assert!(corr < 0.6, "correlation {}", corr);

    let balance_db = 20.0 * (rms(&left) / rms(&right)).log10();
    assert!(balance_db.abs() < 1.0, "L/R balance {} dB", balance_db);
}

/// Count of large downward steps: saw resets, natural or synced. A reset
/// that lands between two subsamples spreads over two frames, so runs of
/// steep frames count once.
fn saw_resets(x: &[f32]) -> usize {
    let steep: Vec<bool> = x.windows(2).map(|w| w[1] - w[0] < -0.3).collect();
    steep.windows(2).filter(|w| !w[0] && w[1]).count()
}

#[test]
fn hard_sync_follows_vco_b() {
    let render_c4 = |sync: bool| {
        let mut synth = PolySynth::new(SR, 2);
        synth.set_int(ParamId::Osc1Waveform, Waveform::Saw.index()).unwrap();
        synth.set_float(ParamId::Osc2Level, 0.0).unwrap();
        synth.set_float(ParamId::VcfCutoff, 20000.0).unwrap();
        synth.set_int(ParamId::VcoBKeyFollow, 0).unwrap();
        // ±0.5 on the knob spans ±30 semitones; 1.5× is a fifth up
        let knob = 0.5 + 12.0 * 1.5f32.log2() / 60.0;
        synth.set_float(ParamId::VcoBFreqKnob, knob).unwrap();
        synth.set_int(ParamId::Sync, i32::from(sync)).unwrap();
        open_envelopes(&mut synth);
        synth.note_on(60, 127);
        let (out, _) = render(&mut synth, seconds(1.1));
        out[seconds(0.1)..].to_vec()
    };

    let free = saw_resets(&render_c4(false));
    let synced = saw_resets(&render_c4(true));
    assert!((259..=264).contains(&free), "free-running resets {}", free);
    // VCO-B at 1.5 × 261.63 Hz restarts VCO-A before it can wrap
    assert!((389..=395).contains(&synced), "synced resets {}", synced);
}

#[test]
fn glide_is_exponential() {
    let mut synth = PolySynth::new(SR, 1);
    synth.set_int(ParamId::GlideEnabled, 1).unwrap();
    synth.set_float(ParamId::GlideTime, 0.5).unwrap();

    synth.note_on(48, 100);
    render(&mut synth, seconds(0.1));
    synth.note_on(72, 100);

    let freq = |s: &PolySynth| s.voice(0).map_or(0.0, |v| v.current_freq());
    assert!((freq(&synth) - 130.81).abs() < 0.05);

    let mut last = freq(&synth);
    for _ in 0..25 {
        render(&mut synth, seconds(0.01));
        let f = freq(&synth);
        assert!(f > last, "glide must rise monotonically");
        last = f;
    }
    // 0.35 s: halfway through the glide, at the geometric midpoint
    let mid = freq(&synth);
    assert!((mid - 261.63).abs() < 261.63 * 0.005, "midpoint {}", mid);

    render(&mut synth, seconds(0.3));
    assert!((freq(&synth) - 523.25).abs() < 0.05);
    assert!(!synth.voice(0).is_some_and(|v| v.is_gliding()));
}

#[test]
fn reverb_tail_follows_rt60() {
    let mut synth = PolySynth::new(SR, 2);
    synth.set_int(ParamId::Osc1Waveform, Waveform::Saw.index()).unwrap();
    synth.set_amp_envelope(EnvelopeParams::new(0.01, 0.1, 0.0, 0.1));
    synth.set_int(ParamId::ReverbEnabled, 1).unwrap();
    synth.set_float(ParamId::ReverbRt60, 2.5).unwrap();
    synth.set_float(ParamId::ReverbMix, 0.5).unwrap();

    synth.note_on(60, 127);
    render(&mut synth, seconds(0.2));
    synth.note_off(60);
    let (tail, _) = render(&mut synth, seconds(1.6));
    assert_eq!(synth.active_voice_count(), 0, "dry note is over");

    // Windows 1 s apart, starting 0.2 s after the release
    let first = rms(&tail[seconds(0.2)..seconds(0.3)]);
    let second = rms(&tail[seconds(1.2)..seconds(1.3)]);
    let drop_db = 20.0 * (first / second).log10();
    // 60 dB per 2.5 s is 24 dB per second
    assert!((19.2..=28.8).contains(&drop_db), "tail dropped {} dB in 1 s", drop_db);
}

#[test]
fn silence_with_no_notes_even_with_reverb() {
    let mut synth = PolySynth::new(SR, 4);
    synth.set_int(ParamId::ReverbEnabled, 1).unwrap();
    let (left, right) = render(&mut synth, 4096);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}
