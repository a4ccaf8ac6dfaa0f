//! Property-based tests for the polyphonic synth.
//!
//! Arbitrary parameter writes and note streams must keep the output finite
//! and inside the limiter ceiling, reads must return the clamped write,
//! released notes must decay to exact silence, and equal seeds must render
//! equal audio.

use polyvox_core::SOFT_LIMIT_CEILING;
use polyvox_synth::{ParamId, PolySynth};
use proptest::prelude::*;

const SR: f32 = 44100.0;

fn any_param() -> impl Strategy<Value = ParamId> {
    (0..ParamId::ALL.len()).prop_map(|i| ParamId::ALL[i])
}

fn write(synth: &mut PolySynth, id: ParamId, raw: f32) {
    let result = if id.is_stepped() {
        synth.set_int(id, raw as i32)
    } else {
        synth.set_float(id, raw)
    };
    // Out-of-range enum indices are the only accepted failure
    if let Err(e) = result {
        assert!(id.is_stepped(), "{} rejected {}: {}", id, raw, e);
    }
}

#[derive(Debug, Clone)]
enum Event {
    On(u8, u8),
    Off(u8),
    Param(ParamId, f32),
}

fn any_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0u8..128, 1u8..128).prop_map(|(n, v)| Event::On(n, v)),
        (0u8..128).prop_map(Event::Off),
        (any_param(), -2.0e4f32..2.0e4f32).prop_map(|(id, v)| Event::Param(id, v)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No combination of settings and notes produces NaN or infinity.
    #[test]
    fn output_stays_finite(
        voices in 1usize..9,
        events in prop::collection::vec(any_event(), 1..40),
    ) {
        let mut synth = PolySynth::new(SR, voices);
        for event in events {
            match event {
                Event::On(n, v) => synth.note_on(n, v),
                Event::Off(n) => synth.note_off(n),
                Event::Param(id, v) => write(&mut synth, id, v),
            }
            prop_assert!(synth.active_voice_count() <= synth.voice_count());
            for _ in 0..64 {
                let (l, r) = synth.process();
                prop_assert!(l.is_finite() && r.is_finite(), "({}, {})", l, r);
            }
        }
    }

    /// In-range settings and any chord stay within the output ceiling.
    #[test]
    fn output_stays_within_ceiling(
        voices in 1usize..9,
        settings in prop::collection::vec((any_param(), 0.0f32..=1.0), 0..48),
        notes in prop::collection::vec((0u8..128, 1u8..128), 1..9),
        reverb in any::<bool>(),
    ) {
        let mut synth = PolySynth::new(SR, voices);
        for (id, position) in settings {
            synth.set_normalized(id, position).unwrap();
        }
        synth.set_int(ParamId::ReverbEnabled, i32::from(reverb)).unwrap();
        for (note, velocity) in notes {
            synth.note_on(note, velocity);
        }
        for _ in 0..4096 {
            let (l, r) = synth.process();
            prop_assert!(l.is_finite() && r.is_finite(), "({}, {})", l, r);
            prop_assert!(
                l.abs() <= SOFT_LIMIT_CEILING && r.abs() <= SOFT_LIMIT_CEILING,
                "({}, {})", l, r
            );
        }
    }

    /// Once the amp release has run out the dry mix is exactly zero.
    #[test]
    fn released_note_returns_to_exact_silence(
        note in 0u8..128,
        velocity in 1u8..128,
        release in 0.001f32..0.5,
        voices in 1usize..9,
    ) {
        let mut synth = PolySynth::new(SR, voices);
        synth.set_float(ParamId::AmpEnvRelease, release).unwrap();
        synth.set_float(ParamId::FilterEnvRelease, release).unwrap();
        synth.set_float(ParamId::NoiseLevel, 0.3).unwrap();
        synth.note_on(note, velocity);
        for _ in 0..2205 {
            synth.process();
        }
        synth.note_off(note);
        for _ in 0..((release + 0.05) * SR) as usize {
            synth.process();
        }
        prop_assert_eq!(synth.active_voice_count(), 0);
        for _ in 0..512 {
            prop_assert_eq!(synth.process(), (0.0, 0.0));
        }
    }

    /// Reads return the written value clamped into the descriptor range.
    #[test]
    fn continuous_params_round_trip(id in any_param(), value in -1.0e5f32..1.0e5f32) {
        prop_assume!(!id.is_stepped());
        let mut synth = PolySynth::new(SR, 2);
        synth.set_float(id, value).unwrap();
        let expected = id.descriptor().clamp(value);
        prop_assert_eq!(synth.get_float(id), Ok(expected));
    }

    /// Same seed, same events, same audio, with every random source live.
    #[test]
    fn equal_seeds_render_identically(seed in any::<u64>(), note in 24u8..96) {
        let run = || {
            let mut synth = PolySynth::with_seed(SR, 4, seed);
            synth.set_float(ParamId::NoiseLevel, 0.5).unwrap();
            synth.set_float(ParamId::PitchDrift, 20.0).unwrap();
            synth.set_float(ParamId::PwDrift, 0.2).unwrap();
            synth.set_int(ParamId::LfoWaveform, 4).unwrap();
            synth.set_float(ParamId::LfoToVcfCutoff, 800.0).unwrap();
            synth.set_int(ParamId::WheelSource, 1).unwrap();
            synth.set_float(ParamId::ModWheel, 1.0).unwrap();
            synth.set_float(ParamId::WheelToFilter, 0.5).unwrap();
            synth.note_on(note, 100);
            let mut buf = vec![0.0f32; 2048];
            synth.render_interleaved(&mut buf);
            buf
        };
        prop_assert_eq!(run(), run());
    }
}

#[test]
fn different_seeds_differ_when_noise_is_audible() {
    let run = |seed| {
        let mut synth = PolySynth::with_seed(SR, 2, seed);
        synth.set_float(ParamId::Osc1Level, 0.0).unwrap();
        synth.set_float(ParamId::NoiseLevel, 1.0).unwrap();
        synth.note_on(60, 100);
        (0..512).map(|_| synth.process().0).collect::<Vec<_>>()
    };
    assert_ne!(run(1), run(2));
}

#[test]
fn reverb_tail_decays_to_exact_silence() {
    let mut synth = PolySynth::new(SR, 4);
    synth.set_int(ParamId::ReverbEnabled, 1).unwrap();
    synth.set_float(ParamId::ReverbMix, 0.5).unwrap();
    synth.note_on(60, 127);
    synth.note_on(67, 127);
    for _ in 0..(SR * 0.2) as usize {
        synth.process();
    }
    synth.note_off(60);
    synth.note_off(67);

    let rt60 = synth.get_float(ParamId::ReverbRt60).unwrap();
    let release = synth.get_float(ParamId::AmpEnvRelease).unwrap();
    // Feedback state is flushed below 1e-20, about 400 dB down
    let tail = ((rt60 * 10.0 + release + 1.0) * SR) as usize;
    let mut heard_tail = false;
    for _ in 0..tail {
        let (l, r) = synth.process();
        heard_tail |= synth.active_voice_count() == 0 && (l != 0.0 || r != 0.0);
    }
    assert!(heard_tail, "reverb should ring past the voices");
    for _ in 0..4410 {
        assert_eq!(synth.process(), (0.0, 0.0));
    }
}
