//! Stereo Schroeder reverb.
//!
//! Per channel: eight damped feedback combs in parallel, summed, then four
//! allpass diffusers in series. The wet signal is soft-limited with `tanh`
//! before the dry/wet mix. Left and right use slightly different delay
//! lists so the two tails decorrelate.
//!
//! Comb feedback is derived from RT60, so the tail length is set in
//! seconds rather than as a raw coefficient:
//!
//! ```text
//! feedback = 10^(−3 · delay_s / RT60)
//! ```
//!
//! Delay buffers are allocated once for the largest room size. Changing the
//! room only moves the active length, so every setter is safe to call from
//! the audio thread. Only [`Reverb::try_set_sample_rate`] allocates.

use libm::{expf, logf, tanhf};
use polyvox_core::{AllocError, DampedComb, SchroederAllpass, StereoEffect, sanitize};

/// Left comb delays in milliseconds at room scale 1.0.
const COMB_DELAYS_MS_L: [f32; 8] = [29.7, 37.1, 41.1, 43.7, 53.3, 61.3, 67.7, 73.3];
/// Right comb delays, offset from the left list for decorrelation.
const COMB_DELAYS_MS_R: [f32; 8] = [30.1, 38.3, 41.9, 44.3, 54.7, 62.1, 68.1, 74.1];
/// Left allpass delays in milliseconds.
const ALLPASS_DELAYS_MS_L: [f32; 4] = [5.0, 1.7, 6.1, 2.3];
/// Right allpass delays in milliseconds.
const ALLPASS_DELAYS_MS_R: [f32; 4] = [5.3, 1.9, 6.3, 2.5];

/// Fixed allpass coefficient.
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Room scale at `room_size = 1.0`; buffers are sized for it.
const MAX_ROOM_SCALE: f32 = 1.5;

/// Damping cutoff at `damping = 1.0`.
const MIN_DAMPING_CUTOFF_HZ: f32 = 500.0;
/// Damping cutoff at `damping = 0.0`, before the Nyquist cap.
const MAX_DAMPING_CUTOFF_HZ: f32 = 20000.0;

/// Accepted RT60 range in seconds.
pub const RT60_RANGE: (f32, f32) = (0.05, 20.0);

/// Floor used inside the feedback formula.
const RT60_FLOOR: f32 = 0.01;

const DEFAULT_MIX: f32 = 0.3;
const DEFAULT_ROOM_SIZE: f32 = 0.5;
const DEFAULT_DAMPING: f32 = 0.5;
const DEFAULT_WET_GAIN: f32 = 1.0;
const DEFAULT_RT60: f32 = 1.2;

/// Delay in whole samples, at least one.
fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    ((ms * 0.001 * sample_rate) as usize).max(1)
}

/// Log-spaced damping cutoff: 0 → bright (20 kHz or 0.49·SR), 1 → 500 Hz.
fn damping_cutoff_hz(damping: f32, sample_rate: f32) -> f32 {
    let max_cutoff = MAX_DAMPING_CUTOFF_HZ.min(sample_rate * 0.49);
    if damping <= 0.0 {
        return max_cutoff;
    }
    if damping >= 1.0 {
        return MIN_DAMPING_CUTOFF_HZ;
    }
    let log_max = logf(max_cutoff);
    let log_min = logf(MIN_DAMPING_CUTOFF_HZ);
    expf(log_max - damping * (log_max - log_min))
}

/// One channel of the network: comb bank plus diffuser chain.
#[derive(Debug, Clone)]
struct Channel {
    combs: [DampedComb; 8],
    allpasses: [SchroederAllpass; 4],
    comb_ms: &'static [f32; 8],
    allpass_ms: &'static [f32; 4],
}

impl Channel {
    fn new(comb_ms: &'static [f32; 8], allpass_ms: &'static [f32; 4], sample_rate: f32) -> Self {
        Self {
            combs: core::array::from_fn(|i| {
                DampedComb::new(ms_to_samples(comb_ms[i] * MAX_ROOM_SCALE, sample_rate))
            }),
            allpasses: core::array::from_fn(|i| {
                SchroederAllpass::new(ms_to_samples(allpass_ms[i] * MAX_ROOM_SCALE, sample_rate))
            }),
            comb_ms,
            allpass_ms,
        }
    }

    /// Fallible rebuild; nothing is replaced unless every buffer succeeds.
    fn try_new(
        comb_ms: &'static [f32; 8],
        allpass_ms: &'static [f32; 4],
        sample_rate: f32,
    ) -> Result<Self, AllocError> {
        let mut combs: [DampedComb; 8] = core::array::from_fn(|_| DampedComb::new(1));
        for (comb, &ms) in combs.iter_mut().zip(comb_ms) {
            *comb = DampedComb::try_new(ms_to_samples(ms * MAX_ROOM_SCALE, sample_rate))?;
        }
        let mut allpasses: [SchroederAllpass; 4] =
            core::array::from_fn(|_| SchroederAllpass::new(1));
        for (ap, &ms) in allpasses.iter_mut().zip(allpass_ms) {
            *ap = SchroederAllpass::try_new(ms_to_samples(ms * MAX_ROOM_SCALE, sample_rate))?;
        }
        Ok(Self {
            combs,
            allpasses,
            comb_ms,
            allpass_ms,
        })
    }

    fn configure(&mut self, room_scale: f32, rt60: f32, cutoff_hz: f32, sample_rate: f32) {
        for (comb, &base) in self.combs.iter_mut().zip(self.comb_ms) {
            let delay_ms = base * room_scale;
            comb.set_delay_samples(ms_to_samples(delay_ms, sample_rate));
            comb.set_feedback(libm::powf(10.0, -3.0 * delay_ms * 0.001 / rt60));
            comb.set_damping_cutoff(cutoff_hz, sample_rate);
        }
        for (ap, &base) in self.allpasses.iter_mut().zip(self.allpass_ms) {
            ap.set_delay_samples(ms_to_samples(base * room_scale, sample_rate));
            ap.set_feedback(ALLPASS_FEEDBACK);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        for ap in &mut self.allpasses {
            wet = ap.process(wet);
        }
        wet
    }

    fn clear(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for ap in &mut self.allpasses {
            ap.clear();
        }
    }
}

/// Stereo Schroeder reverb with RT60-derived comb feedback.
///
/// # Parameters
///
/// | Parameter | Range | Default |
/// |-----------|-------|---------|
/// | `mix` | 0..1 | 0.3 |
/// | `room_size` | 0..1 (delay scale 0.5..1.5) | 0.5 |
/// | `damping` | 0..1 (20 kHz..500 Hz) | 0.5 |
/// | `wet_gain` | 0..2 | 1.0 |
/// | `rt60` | 0.05..20 s | 1.2 |
///
/// # Example
///
/// ```rust
/// use polyvox_core::StereoEffect;
/// use polyvox_effects::Reverb;
///
/// let mut reverb = Reverb::new(44100.0);
/// reverb.set_rt60(2.5);
/// reverb.set_mix(0.5);
///
/// let (l, r) = reverb.process_stereo(1.0, 1.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Reverb {
    left: Channel,
    right: Channel,
    sample_rate: f32,
    mix: f32,
    room_size: f32,
    damping: f32,
    wet_gain: f32,
    rt60: f32,
    enabled: bool,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Reverb {
    /// Create an enabled reverb with default parameters.
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            left: Channel::new(&COMB_DELAYS_MS_L, &ALLPASS_DELAYS_MS_L, sample_rate),
            right: Channel::new(&COMB_DELAYS_MS_R, &ALLPASS_DELAYS_MS_R, sample_rate),
            sample_rate,
            mix: DEFAULT_MIX,
            room_size: DEFAULT_ROOM_SIZE,
            damping: DEFAULT_DAMPING,
            wet_gain: DEFAULT_WET_GAIN,
            rt60: DEFAULT_RT60,
            enabled: true,
        };
        reverb.update_parameters();
        reverb
    }

    /// Dry/wet balance, 0 = dry only.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = sanitize(mix, DEFAULT_MIX).clamp(0.0, 1.0);
    }

    /// Current dry/wet balance.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Room size; scales every delay by `0.5 + room_size`.
    pub fn set_room_size(&mut self, room_size: f32) {
        self.room_size = sanitize(room_size, DEFAULT_ROOM_SIZE).clamp(0.0, 1.0);
        self.update_parameters();
    }

    /// Current room size.
    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    /// High-frequency absorption in the comb loops.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = sanitize(damping, DEFAULT_DAMPING).clamp(0.0, 1.0);
        self.update_parameters();
    }

    /// Current damping amount.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Gain into the `tanh` limiter on the wet path.
    pub fn set_wet_gain(&mut self, gain: f32) {
        self.wet_gain = sanitize(gain, DEFAULT_WET_GAIN).clamp(0.0, 2.0);
    }

    /// Current wet gain.
    pub fn wet_gain(&self) -> f32 {
        self.wet_gain
    }

    /// Decay time to −60 dB in seconds.
    pub fn set_rt60(&mut self, seconds: f32) {
        self.rt60 = sanitize(seconds, DEFAULT_RT60).clamp(RT60_RANGE.0, RT60_RANGE.1);
        self.update_parameters();
    }

    /// Current RT60.
    pub fn rt60(&self) -> f32 {
        self.rt60
    }

    /// Sample rate the buffers are sized for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Cutoff of the comb damping lowpass for the current settings.
    pub fn damping_cutoff_hz(&self) -> f32 {
        damping_cutoff_hz(self.damping, self.sample_rate)
    }

    /// Feedback of left comb `index`.
    pub fn comb_feedback(&self, index: usize) -> Option<f32> {
        self.left.combs.get(index).map(DampedComb::feedback)
    }

    /// Active delay in samples of left comb `index`.
    pub fn comb_delay_samples(&self, index: usize) -> Option<usize> {
        self.left.combs.get(index).map(DampedComb::delay_samples)
    }

    /// Recompute comb/allpass delays, feedbacks and damping from the
    /// current parameters. Never allocates.
    pub fn update_parameters(&mut self) {
        let room_scale = 0.5 + self.room_size;
        let rt60 = self.rt60.max(RT60_FLOOR);
        let cutoff = damping_cutoff_hz(self.damping, self.sample_rate);
        self.left.configure(room_scale, rt60, cutoff, self.sample_rate);
        self.right.configure(room_scale, rt60, cutoff, self.sample_rate);
    }
}

impl StereoEffect for Reverb {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !self.enabled {
            return (left, right);
        }
        let wet_l = tanhf(self.left.process(left) * self.wet_gain);
        let wet_r = tanhf(self.right.process(right) * self.wet_gain);
        (
            left * (1.0 - self.mix) + wet_l * self.mix,
            right * (1.0 - self.mix) + wet_r * self.mix,
        )
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    fn try_set_sample_rate(&mut self, sample_rate: f32) -> Result<(), AllocError> {
        if sample_rate == self.sample_rate {
            return Ok(());
        }
        let left = Channel::try_new(&COMB_DELAYS_MS_L, &ALLPASS_DELAYS_MS_L, sample_rate)?;
        let right = Channel::try_new(&COMB_DELAYS_MS_R, &ALLPASS_DELAYS_MS_R, sample_rate)?;
        self.left = left;
        self.right = right;
        self.sample_rate = sample_rate;
        self.update_parameters();
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, "reverb buffers reallocated");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "reverb"
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}
