//! Damped feedback comb filter for Schroeder reverbs.
//!
//! The feedback path runs through a one-pole lowpass, so high frequencies
//! die away faster than lows, the way air and wall absorption behave.

use core::f32::consts::PI;
use libm::expf;

use crate::delay::{AllocError, DelayBuffer};
use crate::flush_denormal;

/// Maximum comb feedback; keeps the loop strictly decaying.
pub const MAX_COMB_FEEDBACK: f32 = 0.999;

/// Feedback comb with a one-pole damping filter.
///
/// Per sample: read the delayed value, run it through the damping filter
/// `y = (1 − α)·read + α·y`, write `clamp(input + y·feedback, ±2)` back and
/// return `y`.
///
/// # Example
///
/// ```rust
/// use polyvox_core::DampedComb;
///
/// let mut comb = DampedComb::new(2000);
/// comb.set_delay_samples(1310);
/// comb.set_feedback(0.8);
/// comb.set_damping_cutoff(5000.0, 44100.0);
///
/// let output = comb.process(1.0);
/// assert_eq!(output, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DampedComb {
    delay: DelayBuffer,
    feedback: f32,
    alpha: f32,
    filter_store: f32,
}

impl DampedComb {
    /// Create a comb able to hold up to `capacity` samples of delay.
    pub fn new(capacity: usize) -> Self {
        Self::from_buffer(DelayBuffer::new(capacity))
    }

    /// Fallible constructor for control-thread reallocation.
    pub fn try_new(capacity: usize) -> Result<Self, AllocError> {
        DelayBuffer::try_with_capacity(capacity).map(Self::from_buffer)
    }

    fn from_buffer(delay: DelayBuffer) -> Self {
        Self {
            delay,
            feedback: 0.7,
            alpha: 0.0,
            filter_store: 0.0,
        }
    }

    /// Set the active delay in samples (clamped to `1..=capacity`).
    pub fn set_delay_samples(&mut self, samples: usize) {
        self.delay.set_len(samples);
    }

    /// Active delay in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay.len()
    }

    /// Allocated capacity in samples.
    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }

    /// Set loop feedback, clamped to `[0, 0.999]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_COMB_FEEDBACK);
    }

    /// Current loop feedback.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set the damping lowpass cutoff.
    ///
    /// `α = exp(−2π·cutoff/SR)`; cutoffs at or above `0.499 × Nyquist`
    /// disable damping (`α = 0`), cutoffs at or below 1 Hz pin `α` to 0.9999.
    pub fn set_damping_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let nyquist = sample_rate * 0.5;
        let alpha = if cutoff_hz >= nyquist * 0.499 {
            0.0
        } else if cutoff_hz <= 1.0 {
            0.9999
        } else {
            expf(-2.0 * PI * cutoff_hz / sample_rate)
        };
        self.alpha = alpha.clamp(0.0, 0.9999);
    }

    /// Current damping coefficient α.
    pub fn damping_alpha(&self) -> f32 {
        self.alpha
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let read = self.delay.read();
        self.filter_store =
            flush_denormal((1.0 - self.alpha) * read + self.alpha * self.filter_store);
        let write = (input + self.filter_store * self.feedback).clamp(-2.0, 2.0);
        self.delay.write_advance(write);
        self.filter_store
    }

    /// Clear the delay line and damping state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.filter_store = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_impulse_echo() {
        let mut comb = DampedComb::new(200);
        comb.set_delay_samples(100);
        comb.set_feedback(0.5);
        comb.set_damping_cutoff(30000.0, 44100.0);

        assert_eq!(comb.process(1.0), 0.0);
        for _ in 0..99 {
            assert_eq!(comb.process(0.0), 0.0);
        }
        let echo = comb.process(0.0);
        assert!((echo - 1.0).abs() < 1e-6, "undamped echo should be 1.0, got {}", echo);

        for _ in 0..99 {
            comb.process(0.0);
        }
        let second = comb.process(0.0);
        assert!((second - 0.5).abs() < 1e-6, "second echo should be 0.5, got {}", second);
    }

    #[test]
    fn test_comb_feedback_clamped() {
        let mut comb = DampedComb::new(10);
        comb.set_feedback(1.5);
        assert_eq!(comb.feedback(), MAX_COMB_FEEDBACK);
        comb.set_feedback(-0.2);
        assert_eq!(comb.feedback(), 0.0);
    }

    #[test]
    fn test_comb_damping_alpha_edges() {
        let mut comb = DampedComb::new(10);
        comb.set_damping_cutoff(20000.0, 44100.0);
        assert_eq!(comb.damping_alpha(), 0.0);
        comb.set_damping_cutoff(0.5, 44100.0);
        assert!((comb.damping_alpha() - 0.9999).abs() < 1e-6);
        comb.set_damping_cutoff(500.0, 44100.0);
        let expected = expf(-2.0 * PI * 500.0 / 44100.0);
        assert!((comb.damping_alpha() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_comb_buffer_writes_are_clamped() {
        let mut comb = DampedComb::new(4);
        comb.set_delay_samples(1);
        comb.set_feedback(0.999);
        for _ in 0..1000 {
            let out = comb.process(1.0);
            assert!(out.abs() <= 2.0, "comb output escaped clamp: {}", out);
        }
    }

    #[test]
    fn test_comb_decays_to_silence() {
        let mut comb = DampedComb::new(50);
        comb.set_feedback(0.7);
        comb.set_damping_cutoff(2000.0, 44100.0);
        comb.process(1.0);
        let mut last = 0.0;
        for _ in 0..20000 {
            last = comb.process(0.0);
        }
        assert!(last.abs() < 1e-6, "comb should ring out, got {}", last);
    }

    #[test]
    fn test_comb_clear() {
        let mut comb = DampedComb::new(10);
        for _ in 0..20 {
            comb.process(1.0);
        }
        comb.clear();
        assert_eq!(comb.process(0.0), 0.0);
    }
}
