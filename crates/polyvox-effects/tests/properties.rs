//! Property-based tests for the stereo reverb.
//!
//! Any combination of in-range (and out-of-range) parameter writes must
//! keep the output finite and the derived comb feedback inside [0, 0.999].

use polyvox_core::StereoEffect;
use polyvox_effects::Reverb;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn reverb_output_finite_and_bounded(
        mix in -0.5f32..1.5f32,
        room in -0.5f32..1.5f32,
        damping in -0.5f32..1.5f32,
        wet_gain in 0.0f32..3.0f32,
        rt60 in 0.0f32..30.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_mix(mix);
        reverb.set_room_size(room);
        reverb.set_damping(damping);
        reverb.set_wet_gain(wet_gain);
        reverb.set_rt60(rt60);

        for i in 0..8 {
            let fb = reverb.comb_feedback(i).unwrap_or(-1.0);
            prop_assert!((0.0..=0.999).contains(&fb), "comb {} feedback {}", i, fb);
        }

        for _ in 0..64 {
            for &x in &input {
                let (l, r) = reverb.process_stereo(x, -x);
                prop_assert!(l.is_finite() && r.is_finite());
                // |dry·(1−mix)| + |tanh(·)·mix| ≤ 1 for |x| ≤ 1
                prop_assert!(l.abs() <= 1.0 + 1e-6 && r.abs() <= 1.0 + 1e-6, "({}, {})", l, r);
            }
        }
    }

    #[test]
    fn short_rt60_dies_within_a_second(rt60 in 0.0f32..0.06f32) {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_mix(1.0);
        reverb.set_rt60(rt60);
        reverb.process_stereo(1.0, 1.0);
        let mut last = 1.0f32;
        for _ in 0..44100 {
            let (l, r) = reverb.process_stereo(0.0, 0.0);
            last = l.abs().max(r.abs());
        }
        prop_assert!(last < 1e-4, "tail still at {} after 1 s", last);
    }
}
