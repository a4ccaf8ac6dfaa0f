//! Linear ADSR envelope.
//!
//! Five states, one level per sample in `0..=1`. Attack, decay and release
//! are straight-line ramps whose slopes come from the stage times:
//!
//! ```text
//! attack  : +1 / (attack · SR)                 toward 1
//! decay   : −(1 − sustain) / (decay · SR)      toward sustain
//! release : −level_at_note_off / (release · SR) toward 0
//! ```
//!
//! A retrigger starts the attack from wherever the level currently is, so
//! legato and fast repeated notes do not click.

use polyvox_core::sanitize;

/// Shortest stage time in seconds.
pub const MIN_STAGE_TIME: f32 = 0.001;
/// Longest stage time in seconds.
pub const MAX_STAGE_TIME: f32 = 20.0;

/// Envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Silent; output is zero.
    #[default]
    Idle,
    /// Rising toward 1.
    Attack,
    /// Falling from 1 toward the sustain level.
    Decay,
    /// Holding the sustain level while the gate is open.
    Sustain,
    /// Falling to zero after note-off.
    Release,
}

/// ADSR stage times (seconds) and sustain level (0..1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level, 0..1.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl EnvelopeParams {
    /// Default amplitude envelope.
    pub const AMP_DEFAULT: Self = Self::new(0.01, 0.1, 0.9, 0.2);
    /// Default filter envelope.
    pub const FILTER_DEFAULT: Self = Self::new(0.01, 0.1, 0.7, 0.3);

    /// Build from raw values. Use [`clamped`](Self::clamped) before feeding
    /// untrusted input to an envelope.
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Clamp times to `MIN_STAGE_TIME..=MAX_STAGE_TIME` and sustain to 0..1.
    /// Non-finite fields fall back to `fallback`'s value.
    pub fn clamped(self, fallback: Self) -> Self {
        Self {
            attack: clamp_time(self.attack, fallback.attack),
            decay: clamp_time(self.decay, fallback.decay),
            sustain: sanitize(self.sustain, fallback.sustain).clamp(0.0, 1.0),
            release: clamp_time(self.release, fallback.release),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::AMP_DEFAULT
    }
}

fn clamp_time(seconds: f32, fallback: f32) -> f32 {
    sanitize(seconds, fallback).clamp(MIN_STAGE_TIME, MAX_STAGE_TIME)
}

/// Linear ADSR envelope generator.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::{Envelope, EnvelopeParams, EnvelopeState};
///
/// let mut env = Envelope::new(44100.0, EnvelopeParams::new(0.01, 0.1, 0.5, 0.2));
/// env.note_on();
/// for _ in 0..450 {
///     env.step();
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
///
/// env.note_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    sample_rate: f32,
    state: EnvelopeState,
    level: f32,
    /// Level captured at note-off; sets the release slope.
    release_start: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(48000.0, EnvelopeParams::AMP_DEFAULT)
    }
}

impl Envelope {
    /// Create an idle envelope.
    pub fn new(sample_rate: f32, params: EnvelopeParams) -> Self {
        Self {
            params: params.clamped(EnvelopeParams::AMP_DEFAULT),
            sample_rate,
            state: EnvelopeState::Idle,
            level: 0.0,
            release_start: 0.0,
        }
    }

    /// Replace the stage settings. The current stage and level are kept.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params.clamped(self.params);
    }

    /// Current stage settings.
    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Change the sample rate; slopes follow on the next step.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Start (or restart) the attack from the current level.
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Enter release from the current level. No-op when idle.
    pub fn note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.release_start = self.level;
            self.state = EnvelopeState::Release;
        }
    }

    /// Jump to idle at zero.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_start = 0.0;
    }

    /// Current stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Last output level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True in every stage except [`EnvelopeState::Idle`].
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn step(&mut self) -> f32 {
        let sr = self.sample_rate;
        let p = self.params;
        match self.state {
            EnvelopeState::Idle => {}
            EnvelopeState::Attack => {
                self.level += 1.0 / (p.attack * sr);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                if p.sustain >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Sustain;
                } else {
                    self.level -= (1.0 - p.sustain) / (p.decay * sr);
                    if self.level <= p.sustain {
                        self.level = p.sustain;
                        self.state = EnvelopeState::Sustain;
                    }
                }
            }
            EnvelopeState::Sustain => {
                self.level = p.sustain;
            }
            EnvelopeState::Release => {
                self.level -= self.release_start / (p.release * sr);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.release_start = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }
}
