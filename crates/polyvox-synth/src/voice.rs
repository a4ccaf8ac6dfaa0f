//! One synthesizer voice.
//!
//! A voice owns two oscillators, a filter envelope, an amp envelope, a
//! multimode filter, four drift generators and a noise source. It renders one
//! mono sample per call from the shared [`ModBundle`] plus the current pitch
//! bend.
//!
//! # Signal flow
//!
//! ```text
//!  glide ─► VCO-A freq ◄── drift, LFO/wheel, bend, PolyMod(env)
//!              ▲ xmod 2→1
//!  VCO-B ──────┤ (sync on rising zero crossing, PolyMod PW)
//!    ▲ xmod 1→2 (previous VCO-A sample)
//!
//!  A·l1 + B·l2 + noise·n + A·B·ring ─► drive ─► VCF ─► × amp env ─► out
//! ```
//!
//! The order matters: VCO-B is rendered before VCO-A so that its output can
//! modulate A's frequency, pulse width and sync within the same sample, while
//! A's contribution to B is always one sample late.

use libm::{expf, log, tanhf};
use polyvox_core::{Noise, cents_to_ratio, derive_seed, semitones_to_ratio};

use crate::drift::AnalogDrift;
use crate::envelope::{Envelope, EnvelopeParams};
use crate::filter::{FilterType, Vcf};
use crate::modulation::ModBundle;
use crate::oscillator::{MAX_HARMONICS, Oscillator, Waveform};

/// Cross-FM depth in octaves at amount 1.
pub const FM_OCTAVE_RANGE: f32 = 5.0;
/// Mixer input gain at full drive is `1 + MAX_DRIVE_BOOST`.
pub const MAX_DRIVE_BOOST: f32 = 4.0;
/// VCO-B frequency when it has never captured a note.
pub const VCO_B_DEFAULT_HZ: f32 = 261.63;
/// Low-frequency VCO-B range in Hz.
pub const VCO_B_LFO_RANGE: (f32, f32) = (0.05, 20.0);
/// VCO-B knob offset at either extreme, in semitones.
pub const VCO_B_KNOB_SEMITONES: f32 = 30.0;
/// PolyMod cutoff depth in Hz at amount 1.
pub const POLYMOD_CUTOFF_HZ: f32 = 2000.0;

const DRIVE_EPSILON: f32 = 0.001;
const XMOD_EPSILON: f32 = 0.001;
const GLIDE_MIN_TIME: f32 = 1e-4;

/// Every per-voice setting. The synth keeps one master copy and pushes it
/// to all voices with [`Voice::apply_params`].
///
/// Values are stored as given; the synth's parameter dispatch clamps them
/// first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceParams {
    /// VCO-A waveform.
    pub osc1_waveform: Waveform,
    /// VCO-B waveform.
    pub osc2_waveform: Waveform,
    /// VCO-A mixer level, 0..1.
    pub osc1_level: f32,
    /// VCO-B mixer level, 0..1.
    pub osc2_level: f32,
    /// Noise mixer level, 0..1.
    pub noise_level: f32,
    /// Ring modulator (A·B) level, 0..1.
    pub ring_mod_level: f32,
    /// Mixer saturation, 0..1.
    pub drive: f32,
    /// Gain after the saturator, 0..2.
    pub post_gain: f32,
    /// VCO-B fine detune in cents.
    pub vco_b_detune_cents: f32,
    /// VCO-B runs as a 0.05–20 Hz modulator.
    pub vco_b_low_freq: bool,
    /// VCO-B coarse knob, 0..1 (0.5 is unison).
    pub vco_b_freq_knob: f32,
    /// VCO-B tracks the keyboard.
    pub vco_b_key_follow: bool,
    /// Hard-sync VCO-A to VCO-B.
    pub sync: bool,
    /// Base pulse width of both oscillators.
    pub pulse_width: f32,
    /// LFO PWM depth of both oscillators.
    pub pwm_depth: f32,
    /// VCO-A harmonic table.
    pub osc1_harmonics: [f32; MAX_HARMONICS],
    /// VCO-B harmonic table.
    pub osc2_harmonics: [f32; MAX_HARMONICS],
    /// Velocity sensitivity of the filter envelope, 0..1.
    pub filter_env_velocity: f32,
    /// Velocity sensitivity of the output level, 0..1.
    pub amp_velocity: f32,
    /// PolyMod: filter envelope to VCO-A frequency, 0..1.
    pub pm_env_to_freq_a: f32,
    /// PolyMod: filter envelope to VCO-A pulse width, 0..1.
    pub pm_env_to_pw_a: f32,
    /// PolyMod: filter envelope to cutoff, 0..1.
    pub pm_env_to_cutoff: f32,
    /// PolyMod: VCO-B to VCO-A pulse width, 0..1.
    pub pm_osc_b_to_pw_a: f32,
    /// PolyMod: VCO-B to cutoff, 0..1.
    pub pm_osc_b_to_cutoff: f32,
    /// Cross-FM from VCO-A into VCO-B, −1..1.
    pub xmod_1_to_2: f32,
    /// Cross-FM from VCO-B into VCO-A, −1..1.
    pub xmod_2_to_1: f32,
    /// Filter mode.
    pub filter_type: FilterType,
    /// Base cutoff in Hz.
    pub filter_cutoff: f32,
    /// Filter resonance, 0..1.
    pub filter_resonance: f32,
    /// Filter key follow, 0..1.
    pub filter_key_follow: f32,
    /// Filter envelope amount, −1..1.
    pub filter_env_amount: f32,
    /// Filter envelope stages.
    pub filter_env: EnvelopeParams,
    /// Amp envelope stages.
    pub amp_env: EnvelopeParams,
    /// Analog pitch drift depth in cents.
    pub pitch_drift_cents: f32,
    /// Analog pulse-width drift depth.
    pub pw_drift: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        let mut harmonics = [0.0; MAX_HARMONICS];
        harmonics[0] = 1.0;
        Self {
            osc1_waveform: Waveform::Sine,
            osc2_waveform: Waveform::Sine,
            osc1_level: 1.0,
            osc2_level: 0.0,
            noise_level: 0.0,
            ring_mod_level: 0.0,
            drive: 0.0,
            post_gain: 1.0,
            vco_b_detune_cents: 0.0,
            vco_b_low_freq: false,
            vco_b_freq_knob: 0.5,
            vco_b_key_follow: true,
            sync: false,
            pulse_width: 0.5,
            pwm_depth: 0.0,
            osc1_harmonics: harmonics,
            osc2_harmonics: harmonics,
            filter_env_velocity: 0.0,
            amp_velocity: 0.0,
            pm_env_to_freq_a: 0.0,
            pm_env_to_pw_a: 0.0,
            pm_env_to_cutoff: 0.0,
            pm_osc_b_to_pw_a: 0.0,
            pm_osc_b_to_cutoff: 0.0,
            xmod_1_to_2: 0.0,
            xmod_2_to_1: 0.0,
            filter_type: FilterType::Lpf24,
            filter_cutoff: 1000.0,
            filter_resonance: 0.0,
            filter_key_follow: 0.0,
            filter_env_amount: 0.0,
            filter_env: EnvelopeParams::FILTER_DEFAULT,
            amp_env: EnvelopeParams::AMP_DEFAULT,
            pitch_drift_cents: 0.0,
            pw_drift: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Glide {
    active: bool,
    start: f32,
    log_step: f32,
    elapsed: u32,
    total: u32,
}

/// A single synthesizer voice.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::{ModBundle, Voice};
///
/// let mut voice = Voice::new(44100.0, 1);
/// voice.note_on(440.0, 0.8, 69, false, 0.0);
///
/// let bundle = ModBundle::default();
/// let out: Vec<f32> = (0..256).map(|_| voice.process(&bundle, 0.0, 2.0)).collect();
/// assert!(out.iter().any(|s| s.abs() > 0.0));
///
/// voice.note_off();
/// assert!(!voice.is_gate_open());
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    sample_rate: f32,
    params: VoiceParams,
    osc1: Oscillator,
    osc2: Oscillator,
    filter_env: Envelope,
    amp_env: Envelope,
    filter: Vcf,
    /// Pitch A, pitch B, PW A, PW B.
    drift: [AnalogDrift; 4],
    noise: Noise,

    gate: bool,
    note: u8,
    velocity: f32,
    timestamp: u64,
    pan: f32,

    current_freq: f32,
    target_freq: f32,
    glide: Glide,
    first_note: bool,
    vco_b_fixed: Option<f32>,

    last_s1: f32,
    last_s2: f32,
}

impl Voice {
    /// Idle voice with default parameters. `seed` feeds its noise source and
    /// drift generators.
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let params = VoiceParams::default();
        let mut voice = Self {
            sample_rate,
            params,
            osc1: Oscillator::new(sample_rate),
            osc2: Oscillator::new(sample_rate),
            filter_env: Envelope::new(sample_rate, params.filter_env),
            amp_env: Envelope::new(sample_rate, params.amp_env),
            filter: Vcf::new(sample_rate),
            drift: core::array::from_fn(|i| AnalogDrift::new(derive_seed(seed, i as u64 + 1))),
            noise: Noise::new(derive_seed(seed, 0)),
            gate: false,
            note: 60,
            velocity: 1.0,
            timestamp: 0,
            pan: 0.0,
            current_freq: 0.0,
            target_freq: 0.0,
            glide: Glide::default(),
            first_note: true,
            vco_b_fixed: None,
            last_s1: 0.0,
            last_s2: 0.0,
        };
        voice.apply_params(&params);
        voice
    }

    /// Restart the noise and drift streams from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.noise.reseed(derive_seed(seed, 0));
        for (i, d) in self.drift.iter_mut().enumerate() {
            d.reseed(derive_seed(seed, i as u64 + 1));
        }
    }

    /// Push a full parameter set into the voice.
    ///
    /// Envelope stages change without restarting the envelopes. The filter
    /// state is cleared only when the mode changes. Turning VCO-B key follow
    /// on while the gate is open recaptures its fixed base to the current note.
    pub fn apply_params(&mut self, params: &VoiceParams) {
        let key_follow_enabled = params.vco_b_key_follow && !self.params.vco_b_key_follow;

        self.osc1.set_waveform(params.osc1_waveform);
        self.osc2.set_waveform(params.osc2_waveform);
        for osc in [&mut self.osc1, &mut self.osc2] {
            osc.set_pulse_width(params.pulse_width);
            osc.set_pwm_depth(params.pwm_depth);
        }
        for (i, (&a, &b)) in params
            .osc1_harmonics
            .iter()
            .zip(params.osc2_harmonics.iter())
            .enumerate()
        {
            self.osc1.set_harmonic(i, a);
            self.osc2.set_harmonic(i, b);
        }

        self.filter.set_filter_type(params.filter_type);
        self.filter.set_cutoff(params.filter_cutoff);
        self.filter.set_resonance(params.filter_resonance);
        self.filter.set_key_follow(params.filter_key_follow);
        self.filter.set_env_amount(params.filter_env_amount);

        self.filter_env.set_params(params.filter_env);
        self.amp_env.set_params(params.amp_env);

        self.params = *params;

        if key_follow_enabled && self.gate {
            self.vco_b_fixed = Some(self.target_freq);
        }
    }

    /// Current parameter set.
    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    /// Change the sample rate of every component.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.osc1.set_sample_rate(sample_rate);
        self.osc2.set_sample_rate(sample_rate);
        self.filter_env.set_sample_rate(sample_rate);
        self.amp_env.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.filter.set_cutoff(self.params.filter_cutoff);
    }

    /// Start a note.
    ///
    /// `velocity` is normalized 0..1. When `use_glide` is set and this voice
    /// has already played, the pitch slides exponentially from whatever it
    /// was producing to `freq` over `glide_time` seconds.
    pub fn note_on(&mut self, freq: f32, velocity: f32, note: u8, use_glide: bool, glide_time: f32) {
        self.target_freq = freq;
        self.velocity = velocity.clamp(0.0, 1.0);
        self.note = note;
        self.gate = true;
        self.last_s1 = 0.0;

        if self.params.vco_b_key_follow || self.vco_b_fixed.is_none() {
            self.vco_b_fixed = Some(freq);
        }

        self.osc1.reset_phase();
        self.osc2.reset_phase();
        self.filter_env.note_on();
        self.amp_env.note_on();
        self.filter.set_note(note);

        let start = self.current_freq;
        if use_glide
            && !self.first_note
            && start > 0.0
            && freq > 0.0
            && start != freq
            && glide_time > GLIDE_MIN_TIME
        {
            let total = ((glide_time * self.sample_rate) as u32).max(1);
            let ratio = f64::from(freq) / f64::from(start);
            self.glide = Glide {
                active: true,
                start,
                log_step: (log(ratio) / f64::from(total)) as f32,
                elapsed: 0,
                total,
            };
        } else {
            self.current_freq = freq;
            self.glide.active = false;
        }
        self.first_note = false;
    }

    /// Close the gate and release both envelopes.
    pub fn note_off(&mut self) {
        self.gate = false;
        self.filter_env.note_off();
        self.amp_env.note_off();
    }

    /// Silence immediately: gate closed, envelopes idle, filter cleared,
    /// glide cancelled.
    pub fn reset(&mut self) {
        self.gate = false;
        self.filter_env.reset();
        self.amp_env.reset();
        self.filter.reset();
        self.glide.active = false;
        self.last_s1 = 0.0;
        self.last_s2 = 0.0;
    }

    /// Gate open, or either envelope still running.
    pub fn is_active(&self) -> bool {
        self.gate || self.filter_env.is_active() || self.amp_env.is_active()
    }

    /// Key currently held.
    pub fn is_gate_open(&self) -> bool {
        self.gate
    }

    /// Gate closed and both envelopes idle.
    pub fn is_idle(&self) -> bool {
        !self.is_active()
    }

    /// Gate closed but an envelope is still running.
    pub fn is_releasing(&self) -> bool {
        !self.gate && (self.filter_env.is_active() || self.amp_env.is_active())
    }

    /// Current amp envelope level.
    pub fn amp_level(&self) -> f32 {
        self.amp_env.level()
    }

    /// MIDI note of the last note-on.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Normalized velocity of the last note-on.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Allocation timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Set the allocation timestamp.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Stereo position, −1..1.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Set the stereo position, clamped to −1..1.
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Start both oscillators at `phase` instead of 0. Unison calls this
    /// right after [`note_on`](Self::note_on).
    pub fn offset_phase(&mut self, phase: f32) {
        self.osc1.set_phase(phase);
        self.osc2.set_phase(phase);
    }

    /// Phase of VCO-A in `[0, 1)`.
    pub fn osc1_phase(&self) -> f32 {
        self.osc1.phase()
    }

    /// Pitch the voice is producing before drift and modulation.
    pub fn current_freq(&self) -> f32 {
        self.current_freq
    }

    /// Pitch requested by the last note-on.
    pub fn target_freq(&self) -> f32 {
        self.target_freq
    }

    /// True while a glide is in progress.
    pub fn is_gliding(&self) -> bool {
        self.glide.active
    }

    /// Frequency VCO-B uses when key follow is off.
    pub fn vco_b_fixed_freq(&self) -> f32 {
        self.vco_b_fixed.unwrap_or(VCO_B_DEFAULT_HZ)
    }

    #[inline]
    fn advance_glide(&mut self) {
        if self.glide.active {
            self.glide.elapsed += 1;
            if self.glide.elapsed >= self.glide.total {
                self.current_freq = self.target_freq;
                self.glide.active = false;
            } else {
                self.current_freq =
                    self.glide.start * expf(self.glide.log_step * self.glide.elapsed as f32);
            }
        } else if self.gate {
            self.current_freq = self.target_freq;
        }
    }

    /// Render one sample.
    ///
    /// `bend` is −1..1 and `bend_range` is in semitones.
    #[inline]
    pub fn process(&mut self, bundle: &ModBundle, bend: f32, bend_range: f32) -> f32 {
        self.advance_glide();

        if !self.is_active() {
            self.last_s1 = 0.0;
            return 0.0;
        }

        let p = &self.params;

        let filter_env_raw = self.filter_env.step();
        let amp_env_raw = self.amp_env.step();
        let filter_env =
            filter_env_raw * ((1.0 - p.filter_env_velocity) + self.velocity * p.filter_env_velocity);
        let env_bipolar = (filter_env - 0.5) * 2.0;

        let drift_pitch_a = self.drift[0].next_value() * p.pitch_drift_cents;
        let drift_pitch_b = self.drift[1].next_value() * p.pitch_drift_cents;
        let drift_pw_a = self.drift[2].next_value() * p.pw_drift;
        let drift_pw_b = self.drift[3].next_value() * p.pw_drift;

        self.osc1.set_pwm_source(bundle.osc1_pw);
        self.osc1.set_wheel_pw(bundle.osc1_pw_wheel);
        self.osc2.set_pwm_source(bundle.osc2_pw);
        self.osc2.set_wheel_pw(bundle.osc2_pw_wheel);

        let bend_semitones = bend * bend_range;

        // VCO-A before cross-FM
        let base = self.current_freq;
        let freq_a = base
            * cents_to_ratio(drift_pitch_a)
            * semitones_to_ratio(bundle.osc1_freq + bend_semitones)
            + env_bipolar * p.pm_env_to_freq_a * (base * 2.0);

        // VCO-B before cross-FM
        let freq_b = if p.vco_b_low_freq {
            let (lo, hi) = VCO_B_LFO_RANGE;
            lo * libm::powf(hi / lo, p.vco_b_freq_knob) * semitones_to_ratio(bundle.osc2_freq)
        } else {
            let base_b = if p.vco_b_key_follow {
                self.current_freq
            } else {
                self.vco_b_fixed.unwrap_or(VCO_B_DEFAULT_HZ)
            };
            let knob = (p.vco_b_freq_knob - 0.5) * 2.0 * VCO_B_KNOB_SEMITONES;
            base_b
                * cents_to_ratio(drift_pitch_b)
                * semitones_to_ratio(bundle.osc2_freq + bend_semitones)
                * semitones_to_ratio(knob)
                * cents_to_ratio(p.vco_b_detune_cents)
        };

        let mut freq_b_final = freq_b;
        if p.xmod_1_to_2.abs() > XMOD_EPSILON {
            freq_b_final *= libm::exp2f(self.last_s1 * p.xmod_1_to_2 * FM_OCTAVE_RANGE);
        }
        self.osc2.set_frequency(freq_b_final);
        self.osc2.set_drift_pw(drift_pw_b);
        let s2 = self.osc2.process();

        let mut freq_a_final = freq_a;
        if p.xmod_2_to_1.abs() > XMOD_EPSILON {
            freq_a_final *= libm::exp2f(s2 * p.xmod_2_to_1 * FM_OCTAVE_RANGE);
        }
        self.osc1.set_frequency(freq_a_final);
        self.osc1.set_drift_pw(drift_pw_a);
        self.osc1.set_polymod_pw(
            env_bipolar * p.pm_env_to_pw_a * 0.5 + s2 * p.pm_osc_b_to_pw_a * 0.5,
        );

        if p.sync && s2 > 0.0 && self.last_s2 <= 0.0 {
            self.osc1.sync();
        }
        self.last_s2 = s2;

        let s1 = self.osc1.process();
        self.last_s1 = s1;

        let noise = self.noise.next_bipolar();
        let pre = p.osc1_level * s1
            + p.osc2_level * s2
            + p.noise_level * noise
            + p.ring_mod_level * s1 * s2;

        let mixed = if p.drive <= DRIVE_EPSILON {
            pre
        } else {
            tanhf(pre * (1.0 + p.drive * MAX_DRIVE_BOOST)) * p.post_gain
        };

        let direct_hz = bundle.vcf_cutoff
            + env_bipolar * p.pm_env_to_cutoff * POLYMOD_CUTOFF_HZ
            + s2 * p.pm_osc_b_to_cutoff * POLYMOD_CUTOFF_HZ;
        self.filter.set_envelope_value(filter_env);
        let filtered = self.filter.process(mixed, direct_hz);

        let amp = amp_env_raw * ((1.0 - p.amp_velocity) + self.velocity * p.amp_velocity);
        filtered * amp
    }
}
