//! Criterion benchmarks for polyvox-synth
//!
//! Run with: cargo bench -p polyvox-synth
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polyvox_synth::{
    EnvelopeParams, FilterType, ModBundle, Oscillator, ParamId, PolySynth, Vcf, Voice,
    VoiceParams, Waveform,
};

const SAMPLE_RATE: f32 = 44100.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

// ============================================================================
// Component benchmarks
// ============================================================================

fn bench_oscillator_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillator");

    for waveform in Waveform::ALL {
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.set_frequency(440.0);
        osc.set_waveform(waveform);
        if waveform == Waveform::Additive {
            for i in 0..8 {
                osc.set_harmonic(i, 1.0 / (i + 1) as f32);
            }
        }

        group.bench_function(waveform.name(), |b| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..256 {
                    sum += osc.process();
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

fn bench_filter_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vcf");

    for filter_type in FilterType::ALL {
        let mut vcf = Vcf::new(SAMPLE_RATE);
        vcf.set_filter_type(filter_type);
        vcf.set_cutoff(1200.0);
        vcf.set_resonance(0.5);

        group.bench_function(filter_type.name(), |b| {
            let mut x = 0.0f32;
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..256 {
                    x = if x > 0.9 { -1.0 } else { x + 0.01 };
                    sum += vcf.process(black_box(x), 0.0);
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

fn bench_voice(c: &mut Criterion) {
    let params = VoiceParams {
        osc2_level: 0.5,
        noise_level: 0.1,
        drive: 0.3,
        xmod_2_to_1: 0.2,
        pitch_drift_cents: 5.0,
        amp_env: EnvelopeParams::new(0.01, 0.1, 1.0, 0.2),
        ..VoiceParams::default()
    };
    let mut voice = Voice::new(SAMPLE_RATE, 7);
    voice.apply_params(&params);
    voice.note_on(261.63, 0.8, 60, false, 0.0);
    let bundle = ModBundle::default();

    c.bench_function("Voice/256", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for _ in 0..256 {
                sum += voice.process(&bundle, 0.0, 2.0);
            }
            black_box(sum)
        })
    });
}

// ============================================================================
// Full synth benchmarks
// ============================================================================

fn bench_polyphony(c: &mut Criterion) {
    let mut group = c.benchmark_group("PolySynth");

    for &voices in &[4usize, 8, 16] {
        for &block_size in BLOCK_SIZES {
            let mut synth = PolySynth::new(SAMPLE_RATE, voices);
            synth.set_int(ParamId::Waveform, Waveform::Saw.index()).ok();
            synth.set_float(ParamId::Osc2Level, 0.6).ok();
            synth.set_int(ParamId::ReverbEnabled, 1).ok();
            synth.set_amp_envelope(EnvelopeParams::new(0.01, 0.1, 1.0, 0.5));
            for i in 0..voices {
                synth.note_on(48 + (i * 3) as u8, 100);
            }
            let mut buffer = vec![0.0f32; block_size * 2];

            group.bench_with_input(
                BenchmarkId::new(format!("{}voices", voices), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        synth.render_interleaved(&mut buffer);
                        black_box(buffer[0])
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_unison(c: &mut Criterion) {
    let mut synth = PolySynth::new(SAMPLE_RATE, 8);
    synth.set_int(ParamId::UnisonEnabled, 1).ok();
    synth.set_float(ParamId::UnisonDetune, 15.0).ok();
    synth.note_on(60, 100);
    let mut buffer = vec![0.0f32; 512];

    c.bench_function("PolySynth/unison8/256", |b| {
        b.iter(|| {
            synth.render_interleaved(&mut buffer);
            black_box(buffer[0])
        })
    });
}

criterion_group!(
    benches,
    bench_oscillator_waveforms,
    bench_filter_modes,
    bench_voice,
    bench_polyphony,
    bench_unison
);
criterion_main!(benches);
