//! Schroeder allpass for reverb diffusion.

use crate::delay::{AllocError, DelayBuffer};
use crate::flush_denormal;

/// Schroeder allpass filter.
///
/// ```text
/// read   = buf[w]
/// out    = −g·x + read
/// buf[w] = clamp(x + g·out, ±2)
/// ```
///
/// # Example
///
/// ```rust
/// use polyvox_core::SchroederAllpass;
///
/// let mut ap = SchroederAllpass::new(300);
/// ap.set_delay_samples(220);
/// ap.set_feedback(0.5);
///
/// // The direct path is −g·x
/// assert_eq!(ap.process(1.0), -0.5);
/// ```
#[derive(Debug, Clone)]
pub struct SchroederAllpass {
    delay: DelayBuffer,
    feedback: f32,
}

impl SchroederAllpass {
    /// Create an allpass able to hold up to `capacity` samples of delay.
    pub fn new(capacity: usize) -> Self {
        Self {
            delay: DelayBuffer::new(capacity),
            feedback: 0.5,
        }
    }

    /// Fallible constructor for control-thread reallocation.
    pub fn try_new(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            delay: DelayBuffer::try_with_capacity(capacity)?,
            feedback: 0.5,
        })
    }

    /// Set the active delay in samples (clamped to `1..=capacity`).
    pub fn set_delay_samples(&mut self, samples: usize) {
        self.delay.set_len(samples);
    }

    /// Active delay in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay.len()
    }

    /// Set the coefficient `g`, clamped to `[-0.99, 0.99]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Current coefficient.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let read = self.delay.read();
        let output = -self.feedback * input + read;
        self.delay
            .write_advance(flush_denormal((input + self.feedback * output).clamp(-2.0, 2.0)));
        output
    }

    /// Clear the delay line.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allpass_impulse_response() {
        let g = 0.5;
        let mut ap = SchroederAllpass::new(10);
        ap.set_delay_samples(4);
        ap.set_feedback(g);

        let first = ap.process(1.0);
        assert!((first + g).abs() < 1e-6, "direct path should be -g, got {}", first);
        for _ in 0..3 {
            assert_eq!(ap.process(0.0), 0.0);
        }
        // buf held x + g·out = 1 − g² = 0.75
        let delayed = ap.process(0.0);
        assert!((delayed - (1.0 - g * g)).abs() < 1e-6, "got {}", delayed);
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let mut ap = SchroederAllpass::new(64);
        ap.set_delay_samples(37);
        ap.set_feedback(0.5);

        let mut energy = ap.process(1.0).powi(2);
        for _ in 0..20000 {
            energy += ap.process(0.0).powi(2);
        }
        assert!(
            (energy - 1.0).abs() < 1e-3,
            "allpass impulse energy should be 1.0, got {}",
            energy
        );
    }

    #[test]
    fn test_allpass_feedback_clamped() {
        let mut ap = SchroederAllpass::new(8);
        ap.set_feedback(2.0);
        assert_eq!(ap.feedback(), 0.99);
        ap.set_feedback(-2.0);
        assert_eq!(ap.feedback(), -0.99);
    }

    #[test]
    fn test_allpass_clear() {
        let mut ap = SchroederAllpass::new(8);
        for _ in 0..8 {
            ap.process(1.0);
        }
        ap.clear();
        assert_eq!(ap.process(0.0), 0.0);
    }
}
