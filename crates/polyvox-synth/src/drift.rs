//! Slow pseudo-random drift imitating analog component wander.
//!
//! The signal is a stack of sample-and-hold layers. Layer `i` redraws a
//! uniform value in `[-1, 1]` every `2^i` samples; the output is the mean of
//! all layers, so it is bounded by ±1 and dominated by the slow layers.

use polyvox_core::Noise;

/// Number of layers used by [`AnalogDrift::new`].
pub const DEFAULT_DRIFT_OCTAVES: usize = 5;
/// Upper bound on layers.
pub const MAX_DRIFT_OCTAVES: usize = 16;

/// Layered sample-and-hold drift generator.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::AnalogDrift;
///
/// let mut drift = AnalogDrift::new(42);
/// for _ in 0..1000 {
///     let v = drift.next_value();
///     assert!((-1.0..=1.0).contains(&v));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AnalogDrift {
    values: [f32; MAX_DRIFT_OCTAVES],
    counters: [u32; MAX_DRIFT_OCTAVES],
    octaves: usize,
    noise: Noise,
}

impl AnalogDrift {
    /// Five-layer drift seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_octaves(seed, DEFAULT_DRIFT_OCTAVES)
    }

    /// Drift with `octaves` layers, clamped to `1..=MAX_DRIFT_OCTAVES`.
    pub fn with_octaves(seed: u64, octaves: usize) -> Self {
        Self {
            values: [0.0; MAX_DRIFT_OCTAVES],
            counters: [0; MAX_DRIFT_OCTAVES],
            octaves: octaves.clamp(1, MAX_DRIFT_OCTAVES),
            noise: Noise::new(seed),
        }
    }

    /// Number of layers.
    pub fn octaves(&self) -> usize {
        self.octaves
    }

    /// Restart the random stream and clear all layers.
    pub fn reseed(&mut self, seed: u64) {
        self.noise.reseed(seed);
        self.values = [0.0; MAX_DRIFT_OCTAVES];
        self.counters = [0; MAX_DRIFT_OCTAVES];
    }

    /// Advance one sample.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        let mut sum = 0.0;
        for i in 0..self.octaves {
            self.counters[i] += 1;
            if self.counters[i] >= 1 << i {
                self.counters[i] = 0;
                self.values[i] = self.noise.next_bipolar();
            }
            sum += self.values[i];
        }
        sum / self.octaves as f32
    }
}
