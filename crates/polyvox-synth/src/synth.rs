//! Polyphonic synthesizer: voice pool, allocation, shared modulation and
//! the stereo effects chain.
//!
//! # Per-frame flow
//!
//! 1. Step the LFO and draw one wheel-noise value.
//! 2. Compose the [`ModBundle`] from LFO and wheel routing.
//! 3. Render every active voice and pan it with the equal-power law.
//! 4. Divide by `max(1, V/2)` (and by a further 1.5 in unison).
//! 5. Run the effects chain. The built-in reverb sits at index 0.
//! 6. Soft-limit each channel with [`soft_limit`]: unity up to full scale,
//!    never beyond ±1.5.
//!
//! # Allocation
//!
//! A note-on first reuses a voice already sounding that note. Otherwise it
//! takes, in order: an idle voice, the quietest releasing voice, the oldest
//! held voice, voice 0. In unison every voice takes the note, spread in pitch
//! and stereo position, with start phases staggered evenly over one cycle.

use alloc::vec::Vec;
use polyvox_core::{
    AllocError, EffectChain, EffectHandle, Lfo, LfoWaveform, Noise, StereoEffect, cents_to_ratio,
    derive_seed, equal_power_pan, sanitize, soft_limit, tuned_midi_to_freq,
};
use polyvox_effects::Reverb;

#[cfg(feature = "std")]
use crate::control::{CommandReceiver, SynthCommand};
use crate::envelope::EnvelopeParams;
use crate::filter::FilterType;
use crate::modulation::{ModMatrix, WheelSource};
use crate::oscillator::Waveform;
use crate::params::{ParamError, ParamId, ParamValue};
use crate::voice::{Voice, VoiceParams};

/// Seed used by [`PolySynth::new`].
pub const DEFAULT_SEED: u64 = 0x5EED_0F_A11;
/// Extra mixdown attenuation while unison is on.
pub const UNISON_GAIN_DIVISOR: f32 = 1.5;

const LFO_STREAM: u64 = 0x1F0;
const WHEEL_NOISE_STREAM: u64 = 0x1F1;

/// Polyphonic synthesizer.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::{ParamId, PolySynth};
///
/// let mut synth = PolySynth::new(44100.0, 8);
/// synth.set_int(ParamId::Osc1Waveform, 1).unwrap(); // saw
/// synth.set_float(ParamId::VcfCutoff, 3000.0).unwrap();
///
/// synth.note_on(60, 100);
/// synth.note_on(64, 100);
///
/// let mut buffer = vec![0.0f32; 512];
/// synth.render_interleaved(&mut buffer);
/// assert!(buffer.iter().any(|s| s.abs() > 0.0));
/// assert_eq!(synth.active_voice_count(), 2);
/// ```
#[derive(Debug)]
pub struct PolySynth {
    sample_rate: f32,
    seed: u64,
    voices: Vec<Voice>,
    params: VoiceParams,

    lfo: Lfo,
    wheel_noise: Noise,
    matrix: ModMatrix,

    unison: bool,
    unison_detune: f32,
    unison_spread: f32,
    last_unison_note: Option<u8>,

    glide: bool,
    glide_time: f32,
    master_tune: f32,
    pitch_bend: f32,
    bend_range: f32,

    next_timestamp: u64,

    effects: EffectChain,
    reverb: EffectHandle<Reverb>,

    #[cfg(feature = "std")]
    control: Option<CommandReceiver>,
}

impl PolySynth {
    /// Create a synth with `voices` voices (at least one) and the default seed.
    pub fn new(sample_rate: f32, voices: usize) -> Self {
        Self::with_seed(sample_rate, voices, DEFAULT_SEED)
    }

    /// Create a synth whose noise, drift and sample-and-hold streams all
    /// derive from `seed`. Equal seeds render identical audio.
    pub fn with_seed(sample_rate: f32, voices: usize, seed: u64) -> Self {
        let voices = (0..voices.max(1))
            .map(|i| Voice::new(sample_rate, derive_seed(seed, i as u64)))
            .collect();

        let mut effects = EffectChain::new();
        let mut reverb = Reverb::new(sample_rate);
        reverb.set_enabled(false);
        let reverb = effects.add(reverb);

        Self {
            sample_rate,
            seed,
            voices,
            params: VoiceParams::default(),
            lfo: Lfo::with_seed(sample_rate, derive_seed(seed, LFO_STREAM)),
            wheel_noise: Noise::new(derive_seed(seed, WHEEL_NOISE_STREAM)),
            matrix: ModMatrix::default(),
            unison: false,
            unison_detune: ParamId::UnisonDetune.descriptor().default,
            unison_spread: ParamId::UnisonSpread.descriptor().default,
            last_unison_note: None,
            glide: false,
            glide_time: ParamId::GlideTime.descriptor().default,
            master_tune: 0.0,
            pitch_bend: 0.0,
            bend_range: ParamId::PitchBendRange.descriptor().default,
            next_timestamp: 0,
            effects,
            reverb,
            #[cfg(feature = "std")]
            control: None,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Base seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    // --- Notes ---------------------------------------------------------

    /// MIDI note-on with a 0..127 velocity.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.note_on_normalized(note, f32::from(velocity) / 127.0);
    }

    /// Note-on with velocity already normalized to 0..1.
    pub fn note_on_normalized(&mut self, note: u8, velocity: f32) {
        let note = note.min(127);
        let velocity = sanitize(velocity, 1.0).clamp(0.0, 1.0);
        let freq = tuned_midi_to_freq(note, self.master_tune);

        if self.unison {
            self.last_unison_note = Some(note);
            let count = self.voices.len();
            let timestamp = self.next_timestamp;
            for (i, voice) in self.voices.iter_mut().enumerate() {
                let factor = unison_factor(i, count);
                voice.set_timestamp(timestamp);
                voice.set_pan(factor * self.unison_spread);
                voice.note_on(
                    freq * cents_to_ratio(self.unison_detune * factor),
                    velocity,
                    note,
                    self.glide,
                    self.glide_time,
                );
                voice.offset_phase(i as f32 / count as f32);
            }
            self.next_timestamp += 1;
            return;
        }

        let index = self.find_voice_for_note(note).unwrap_or_else(|| self.allocate_voice());
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;
        let voice = &mut self.voices[index];
        #[cfg(feature = "tracing")]
        {
            if voice.is_gate_open() && voice.note() != note {
                tracing::debug!(voice = index, stolen = voice.note(), note, "voice stolen");
            }
        }
        voice.set_timestamp(timestamp);
        voice.set_pan(0.0);
        voice.note_on(freq, velocity, note, self.glide, self.glide_time);
    }

    /// Release a note. In unison this only acts on the last unison note.
    pub fn note_off(&mut self, note: u8) {
        if self.unison {
            if self.last_unison_note != Some(note) {
                return;
            }
            self.last_unison_note = None;
        }
        for voice in &mut self.voices {
            if voice.is_gate_open() && voice.note() == note {
                voice.note_off();
            }
        }
    }

    /// Release every held voice.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            if voice.is_gate_open() {
                voice.note_off();
            }
        }
        self.last_unison_note = None;
    }

    /// Silence everything now: voices idle, filters and reverb cleared, LFO
    /// phase restarted. Parameters are untouched.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.effects.reset();
        self.lfo.reset_phase();
        self.last_unison_note = None;
    }

    /// Pitch bend, −1..1.
    pub fn set_pitch_bend(&mut self, value: f32) {
        self.pitch_bend = sanitize(value, 0.0).clamp(-1.0, 1.0);
    }

    /// Mod wheel, 0..1.
    pub fn set_mod_wheel(&mut self, value: f32) {
        self.matrix.wheel.value = sanitize(value, 0.0).clamp(0.0, 1.0);
    }

    fn find_voice_for_note(&self, note: u8) -> Option<usize> {
        self.voices
            .iter()
            .position(|v| v.is_active() && v.note() == note)
    }

    fn allocate_voice(&self) -> usize {
        if let Some(i) = self.voices.iter().position(Voice::is_idle) {
            return i;
        }

        let quietest = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_releasing())
            .min_by(|(_, a), (_, b)| a.amp_level().total_cmp(&b.amp_level()))
            .map(|(i, _)| i);
        if let Some(i) = quietest {
            return i;
        }

        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_gate_open())
            .min_by_key(|(_, v)| v.timestamp())
            .map_or(0, |(i, _)| i)
    }

    // --- Rendering -----------------------------------------------------

    /// Render one stereo frame.
    #[inline]
    pub fn process(&mut self) -> (f32, f32) {
        let lfo_value = self.lfo.step();
        let noise_value = self.wheel_noise.next_bipolar();
        let bundle = self.matrix.compose(lfo_value, noise_value);

        let mut left = 0.0;
        let mut right = 0.0;
        for voice in &mut self.voices {
            if voice.is_active() {
                let s = voice.process(&bundle, self.pitch_bend, self.bend_range);
                let (gl, gr) = equal_power_pan(voice.pan());
                left += s * gl;
                right += s * gr;
            }
        }

        let mut norm = (self.voices.len() / 2).max(1) as f32;
        if self.unison {
            norm *= UNISON_GAIN_DIVISOR;
        }
        let (left, right) = self.effects.process_stereo(left / norm, right / norm);
        (soft_limit(left), soft_limit(right))
    }

    /// Render into separate channel buffers (the shorter length wins).
    /// Pending control commands are applied first.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        #[cfg(feature = "std")]
        self.drain_commands();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process();
        }
    }

    /// Render interleaved `L R L R …` frames. A trailing odd sample is left
    /// untouched. Pending control commands are applied first.
    pub fn render_interleaved(&mut self, buffer: &mut [f32]) {
        #[cfg(feature = "std")]
        self.drain_commands();
        for frame in buffer.chunks_exact_mut(2) {
            let (l, r) = self.process();
            frame[0] = l;
            frame[1] = r;
        }
    }

    // --- Control queue -------------------------------------------------

    /// Install the receiving end of a [`control_channel`](crate::control_channel).
    #[cfg(feature = "std")]
    pub fn attach_control(&mut self, receiver: CommandReceiver) {
        self.control = Some(receiver);
    }

    /// Remove and return the installed receiver.
    #[cfg(feature = "std")]
    pub fn detach_control(&mut self) -> Option<CommandReceiver> {
        self.control.take()
    }

    #[cfg(feature = "std")]
    fn drain_commands(&mut self) {
        let Some(rx) = self.control.take() else {
            return;
        };
        while let Some(command) = rx.try_next() {
            self.handle_command(command);
        }
        self.control = Some(rx);
    }

    /// Apply one command immediately. Invalid parameter writes are dropped.
    #[cfg(feature = "std")]
    pub fn handle_command(&mut self, command: SynthCommand) {
        let result = match command {
            SynthCommand::NoteOn { note, velocity } => {
                self.note_on(note, velocity);
                Ok(())
            }
            SynthCommand::NoteOff { note } => {
                self.note_off(note);
                Ok(())
            }
            SynthCommand::PitchBend(v) => {
                self.set_pitch_bend(v);
                Ok(())
            }
            SynthCommand::ModWheel(v) => {
                self.set_mod_wheel(v);
                Ok(())
            }
            SynthCommand::SetFloat(id, v) => self.set_float(id, v),
            SynthCommand::SetInt(id, v) => self.set_int(id, v),
            SynthCommand::SetNormalized(id, v) => self.set_normalized(id, v),
            SynthCommand::AllNotesOff => {
                self.all_notes_off();
                Ok(())
            }
        };
        #[cfg(feature = "tracing")]
        {
            if let Err(e) = result {
                tracing::debug!(error = %e, "control command dropped");
            }
        }
        #[cfg(not(feature = "tracing"))]
        let _ = result;
    }

    // --- Parameters ----------------------------------------------------

    /// Write a continuous parameter. The value is clamped to the
    /// parameter's range; NaN and infinities fall back to its default.
    pub fn set_float(&mut self, id: ParamId, value: f32) -> Result<(), ParamError> {
        if !id.is_valid() {
            return Err(ParamError::UnknownParam(id));
        }
        if id.is_stepped() {
            return Err(ParamError::TypeMismatch(id));
        }
        let v = id.descriptor().clamp(sanitize(value, id.default_value()));

        let p = &mut self.params;
        match id {
            ParamId::Osc1Level => p.osc1_level = v,
            ParamId::Osc2Level => p.osc2_level = v,
            ParamId::PulseWidth => p.pulse_width = v,
            ParamId::PwmDepth => p.pwm_depth = v,
            ParamId::VcoBDetune => p.vco_b_detune_cents = v,
            ParamId::VcoBFreqKnob => p.vco_b_freq_knob = v,
            ParamId::Osc1Harmonic(i) => p.osc1_harmonics[usize::from(i)] = v,
            ParamId::Osc2Harmonic(i) => p.osc2_harmonics[usize::from(i)] = v,
            ParamId::NoiseLevel => p.noise_level = v,
            ParamId::RingModLevel => p.ring_mod_level = v,
            ParamId::MixerDrive => p.drive = v,
            ParamId::MixerPostGain => p.post_gain = v,
            ParamId::VcfCutoff => p.filter_cutoff = v,
            ParamId::VcfResonance => p.filter_resonance = v,
            ParamId::VcfKeyFollow => p.filter_key_follow = v,
            ParamId::VcfEnvAmount => p.filter_env_amount = v,
            ParamId::FilterEnvAttack => p.filter_env.attack = v,
            ParamId::FilterEnvDecay => p.filter_env.decay = v,
            ParamId::FilterEnvSustain => p.filter_env.sustain = v,
            ParamId::FilterEnvRelease => p.filter_env.release = v,
            ParamId::AmpEnvAttack => p.amp_env.attack = v,
            ParamId::AmpEnvDecay => p.amp_env.decay = v,
            ParamId::AmpEnvSustain => p.amp_env.sustain = v,
            ParamId::AmpEnvRelease => p.amp_env.release = v,
            ParamId::PmFilterEnvToFreqA => p.pm_env_to_freq_a = v,
            ParamId::PmFilterEnvToPwA => p.pm_env_to_pw_a = v,
            ParamId::PmFilterEnvToCutoff => p.pm_env_to_cutoff = v,
            ParamId::PmOscBToPwA => p.pm_osc_b_to_pw_a = v,
            ParamId::PmOscBToCutoff => p.pm_osc_b_to_cutoff = v,
            ParamId::XmodOsc1ToOsc2 => p.xmod_1_to_2 = v,
            ParamId::XmodOsc2ToOsc1 => p.xmod_2_to_1 = v,
            ParamId::FilterEnvVelocity => p.filter_env_velocity = v,
            ParamId::AmpVelocity => p.amp_velocity = v,
            ParamId::PitchDrift => p.pitch_drift_cents = v,
            ParamId::PwDrift => p.pw_drift = v,
            _ => {
                self.set_global_float(id, v);
                return Ok(());
            }
        }
        self.push_voice_params();
        Ok(())
    }

    fn set_global_float(&mut self, id: ParamId, v: f32) {
        let lfo = &mut self.matrix.lfo;
        let wheel = &mut self.matrix.wheel;
        match id {
            ParamId::LfoRate => self.lfo.set_rate(v),
            ParamId::LfoToOsc1Freq => lfo.to_osc1_freq = v,
            ParamId::LfoToOsc2Freq => lfo.to_osc2_freq = v,
            ParamId::LfoToOsc1Pw => lfo.to_osc1_pw = v,
            ParamId::LfoToOsc2Pw => lfo.to_osc2_pw = v,
            ParamId::LfoToVcfCutoff => lfo.to_vcf_cutoff = v,
            ParamId::ModWheel => wheel.value = v,
            ParamId::WheelToFreqA => wheel.to_freq_a = v,
            ParamId::WheelToFreqB => wheel.to_freq_b = v,
            ParamId::WheelToPwA => wheel.to_pw_a = v,
            ParamId::WheelToPwB => wheel.to_pw_b = v,
            ParamId::WheelToFilter => wheel.to_filter = v,
            ParamId::UnisonDetune => self.unison_detune = v,
            ParamId::UnisonSpread => self.unison_spread = v,
            ParamId::GlideTime => self.glide_time = v,
            ParamId::MasterTune => self.master_tune = v,
            ParamId::PitchBend => self.pitch_bend = v,
            ParamId::PitchBendRange => self.bend_range = v,
            ParamId::ReverbMix => self.with_reverb(|r| r.set_mix(v)),
            ParamId::ReverbRoomSize => self.with_reverb(|r| r.set_room_size(v)),
            ParamId::ReverbDamping => self.with_reverb(|r| r.set_damping(v)),
            ParamId::ReverbWetGain => self.with_reverb(|r| r.set_wet_gain(v)),
            ParamId::ReverbRt60 => self.with_reverb(|r| r.set_rt60(v)),
            _ => {}
        }
    }

    /// Write a stepped parameter (toggles take 0/1; enums take their index).
    pub fn set_int(&mut self, id: ParamId, value: i32) -> Result<(), ParamError> {
        if !id.is_stepped() {
            return Err(ParamError::TypeMismatch(id));
        }
        let on = value != 0;
        let invalid = ParamError::InvalidEnumValue(id, value);
        match id {
            ParamId::Waveform => {
                let wf = Waveform::from_index(value).ok_or(invalid)?;
                self.params.osc1_waveform = wf;
                self.params.osc2_waveform = wf;
            }
            ParamId::Osc1Waveform => {
                self.params.osc1_waveform = Waveform::from_index(value).ok_or(invalid)?;
            }
            ParamId::Osc2Waveform => {
                self.params.osc2_waveform = Waveform::from_index(value).ok_or(invalid)?;
            }
            ParamId::FilterType => {
                self.params.filter_type = FilterType::from_index(value).ok_or(invalid)?;
            }
            ParamId::VcoBLowFreq => self.params.vco_b_low_freq = on,
            ParamId::VcoBKeyFollow => self.params.vco_b_key_follow = on,
            ParamId::Sync => self.params.sync = on,
            ParamId::LfoWaveform => {
                self.lfo.set_waveform(LfoWaveform::from_index(value).ok_or(invalid)?);
                return Ok(());
            }
            ParamId::WheelSource => {
                self.matrix.wheel.source = WheelSource::from_index(value).ok_or(invalid)?;
                return Ok(());
            }
            ParamId::UnisonEnabled => {
                self.set_unison(on);
                return Ok(());
            }
            ParamId::GlideEnabled => {
                self.glide = on;
                return Ok(());
            }
            ParamId::ReverbEnabled => {
                self.effects.set_enabled(self.reverb.index(), on);
                return Ok(());
            }
            _ => return Err(ParamError::UnknownParam(id)),
        }
        self.push_voice_params();
        Ok(())
    }

    /// Write either kind of value.
    pub fn set(&mut self, id: ParamId, value: ParamValue) -> Result<(), ParamError> {
        match value {
            ParamValue::Float(v) => self.set_float(id, v),
            ParamValue::Int(v) => self.set_int(id, v),
        }
    }

    /// Write a parameter from a 0..1 control position, mapped through the
    /// descriptor's scale. Stepped parameters take the nearest step.
    pub fn set_normalized(&mut self, id: ParamId, normalized: f32) -> Result<(), ParamError> {
        let d = id.descriptor();
        let v = d.denormalize(sanitize(normalized, d.normalize(d.default)));
        if d.is_stepped() {
            self.set_int(id, libm::roundf(v) as i32)
        } else {
            self.set_float(id, v)
        }
    }

    /// Current value as a 0..1 control position.
    pub fn get_normalized(&self, id: ParamId) -> Result<f32, ParamError> {
        self.get_float(id).map(|v| id.descriptor().normalize(v))
    }

    /// Read a parameter as a float. Stepped parameters read back as their
    /// integer value.
    pub fn get_float(&self, id: ParamId) -> Result<f32, ParamError> {
        if !id.is_valid() {
            return Err(ParamError::UnknownParam(id));
        }
        if id.is_stepped() {
            return self.get_int(id).map(|v| v as f32);
        }
        let p = &self.params;
        let lfo = &self.matrix.lfo;
        let wheel = &self.matrix.wheel;
        let v = match id {
            ParamId::Osc1Level => p.osc1_level,
            ParamId::Osc2Level => p.osc2_level,
            ParamId::PulseWidth => p.pulse_width,
            ParamId::PwmDepth => p.pwm_depth,
            ParamId::VcoBDetune => p.vco_b_detune_cents,
            ParamId::VcoBFreqKnob => p.vco_b_freq_knob,
            ParamId::Osc1Harmonic(i) => p.osc1_harmonics[usize::from(i)],
            ParamId::Osc2Harmonic(i) => p.osc2_harmonics[usize::from(i)],
            ParamId::NoiseLevel => p.noise_level,
            ParamId::RingModLevel => p.ring_mod_level,
            ParamId::MixerDrive => p.drive,
            ParamId::MixerPostGain => p.post_gain,
            ParamId::VcfCutoff => p.filter_cutoff,
            ParamId::VcfResonance => p.filter_resonance,
            ParamId::VcfKeyFollow => p.filter_key_follow,
            ParamId::VcfEnvAmount => p.filter_env_amount,
            ParamId::FilterEnvAttack => p.filter_env.attack,
            ParamId::FilterEnvDecay => p.filter_env.decay,
            ParamId::FilterEnvSustain => p.filter_env.sustain,
            ParamId::FilterEnvRelease => p.filter_env.release,
            ParamId::AmpEnvAttack => p.amp_env.attack,
            ParamId::AmpEnvDecay => p.amp_env.decay,
            ParamId::AmpEnvSustain => p.amp_env.sustain,
            ParamId::AmpEnvRelease => p.amp_env.release,
            ParamId::PmFilterEnvToFreqA => p.pm_env_to_freq_a,
            ParamId::PmFilterEnvToPwA => p.pm_env_to_pw_a,
            ParamId::PmFilterEnvToCutoff => p.pm_env_to_cutoff,
            ParamId::PmOscBToPwA => p.pm_osc_b_to_pw_a,
            ParamId::PmOscBToCutoff => p.pm_osc_b_to_cutoff,
            ParamId::XmodOsc1ToOsc2 => p.xmod_1_to_2,
            ParamId::XmodOsc2ToOsc1 => p.xmod_2_to_1,
            ParamId::FilterEnvVelocity => p.filter_env_velocity,
            ParamId::AmpVelocity => p.amp_velocity,
            ParamId::PitchDrift => p.pitch_drift_cents,
            ParamId::PwDrift => p.pw_drift,
            ParamId::LfoRate => self.lfo.rate(),
            ParamId::LfoToOsc1Freq => lfo.to_osc1_freq,
            ParamId::LfoToOsc2Freq => lfo.to_osc2_freq,
            ParamId::LfoToOsc1Pw => lfo.to_osc1_pw,
            ParamId::LfoToOsc2Pw => lfo.to_osc2_pw,
            ParamId::LfoToVcfCutoff => lfo.to_vcf_cutoff,
            ParamId::ModWheel => wheel.value,
            ParamId::WheelToFreqA => wheel.to_freq_a,
            ParamId::WheelToFreqB => wheel.to_freq_b,
            ParamId::WheelToPwA => wheel.to_pw_a,
            ParamId::WheelToPwB => wheel.to_pw_b,
            ParamId::WheelToFilter => wheel.to_filter,
            ParamId::UnisonDetune => self.unison_detune,
            ParamId::UnisonSpread => self.unison_spread,
            ParamId::GlideTime => self.glide_time,
            ParamId::MasterTune => self.master_tune,
            ParamId::PitchBend => self.pitch_bend,
            ParamId::PitchBendRange => self.bend_range,
            ParamId::ReverbMix => self.reverb_value(id, Reverb::mix),
            ParamId::ReverbRoomSize => self.reverb_value(id, Reverb::room_size),
            ParamId::ReverbDamping => self.reverb_value(id, Reverb::damping),
            ParamId::ReverbWetGain => self.reverb_value(id, Reverb::wet_gain),
            ParamId::ReverbRt60 => self.reverb_value(id, Reverb::rt60),
            _ => return Err(ParamError::UnknownParam(id)),
        };
        Ok(v)
    }

    /// Read a stepped parameter.
    pub fn get_int(&self, id: ParamId) -> Result<i32, ParamError> {
        let p = &self.params;
        Ok(match id {
            ParamId::Waveform | ParamId::Osc1Waveform => p.osc1_waveform.index(),
            ParamId::Osc2Waveform => p.osc2_waveform.index(),
            ParamId::FilterType => p.filter_type.index(),
            ParamId::VcoBLowFreq => i32::from(p.vco_b_low_freq),
            ParamId::VcoBKeyFollow => i32::from(p.vco_b_key_follow),
            ParamId::Sync => i32::from(p.sync),
            ParamId::LfoWaveform => self.lfo.waveform().index(),
            ParamId::WheelSource => self.matrix.wheel.source.index(),
            ParamId::UnisonEnabled => i32::from(self.unison),
            ParamId::GlideEnabled => i32::from(self.glide),
            ParamId::ReverbEnabled => i32::from(self.reverb_enabled()),
            _ => return Err(ParamError::TypeMismatch(id)),
        })
    }

    /// Read either kind of value.
    pub fn get(&self, id: ParamId) -> Result<ParamValue, ParamError> {
        if id.is_stepped() {
            self.get_int(id).map(ParamValue::Int)
        } else {
            self.get_float(id).map(ParamValue::Float)
        }
    }

    /// Put every parameter (harmonics included) back to its default.
    /// Sounding voices keep playing with the new settings.
    pub fn reset_params(&mut self) {
        for &id in ParamId::ALL {
            let d = id.descriptor();
            let result = if d.is_stepped() {
                self.set_int(id, d.default as i32)
            } else {
                self.set_float(id, d.default)
            };
            debug_assert!(result.is_ok(), "default for {} rejected: {:?}", id, result);
        }
        for id in ParamId::harmonics(1).chain(ParamId::harmonics(2)) {
            let result = self.set_float(id, id.default_value());
            debug_assert!(result.is_ok(), "default for {} rejected: {:?}", id, result);
        }
    }

    /// Replace all four amp envelope stages at once.
    pub fn set_amp_envelope(&mut self, params: EnvelopeParams) {
        self.params.amp_env = params.clamped(self.params.amp_env);
        self.push_voice_params();
    }

    /// Replace all four filter envelope stages at once.
    pub fn set_filter_envelope(&mut self, params: EnvelopeParams) {
        self.params.filter_env = params.clamped(self.params.filter_env);
        self.push_voice_params();
    }

    /// Current amp envelope stages.
    pub fn amp_envelope(&self) -> EnvelopeParams {
        self.params.amp_env
    }

    /// Current filter envelope stages.
    pub fn filter_envelope(&self) -> EnvelopeParams {
        self.params.filter_env
    }

    /// The per-voice parameter set shared by every voice.
    pub fn voice_params(&self) -> &VoiceParams {
        &self.params
    }

    fn set_unison(&mut self, on: bool) {
        if self.unison == on {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(enabled = on, "unison switched");
        self.unison = on;
        self.last_unison_note = None;
    }

    fn push_voice_params(&mut self) {
        let params = self.params;
        for voice in &mut self.voices {
            voice.apply_params(&params);
        }
    }

    // --- Effects -------------------------------------------------------

    /// Append an effect after the reverb.
    pub fn add_effect<T: StereoEffect>(&mut self, effect: T) -> EffectHandle<T> {
        self.effects.add(effect)
    }

    /// Typed access to an effect.
    pub fn effect<T: StereoEffect>(&self, handle: EffectHandle<T>) -> Option<&T> {
        self.effects.get(handle)
    }

    /// Typed mutable access to an effect.
    pub fn effect_mut<T: StereoEffect>(&mut self, handle: EffectHandle<T>) -> Option<&mut T> {
        self.effects.get_mut(handle)
    }

    /// Drop every added effect. The built-in reverb stays at index 0.
    pub fn clear_effects(&mut self) {
        self.effects.truncate(self.reverb.index() + 1);
    }

    /// Number of effects, reverb included.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Enable or bypass the effect at `index`. False if out of range.
    pub fn set_effect_enabled(&mut self, index: usize, enabled: bool) -> bool {
        self.effects.set_enabled(index, enabled)
    }

    /// Whether the effect at `index` is enabled.
    pub fn is_effect_enabled(&self, index: usize) -> Option<bool> {
        self.effects.get_dyn(index).map(|e| e.is_enabled())
    }

    /// Handle of the built-in reverb.
    pub fn reverb_handle(&self) -> EffectHandle<Reverb> {
        self.reverb
    }

    /// The built-in reverb.
    pub fn reverb(&self) -> Option<&Reverb> {
        self.effects.get(self.reverb)
    }

    /// The built-in reverb, mutably.
    pub fn reverb_mut(&mut self) -> Option<&mut Reverb> {
        self.effects.get_mut(self.reverb)
    }

    fn reverb_enabled(&self) -> bool {
        self.reverb().is_some_and(StereoEffect::is_enabled)
    }

    fn with_reverb(&mut self, f: impl FnOnce(&mut Reverb)) {
        if let Some(r) = self.reverb_mut() {
            f(r);
        }
    }

    fn reverb_value(&self, id: ParamId, f: fn(&Reverb) -> f32) -> f32 {
        self.reverb().map_or(id.descriptor().default, f)
    }

    // --- Voices --------------------------------------------------------

    /// Size of the voice pool.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Voices with an open gate or a running envelope.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Whether voice `index` is active; false when out of range.
    pub fn is_voice_active(&self, index: usize) -> bool {
        self.voices.get(index).is_some_and(Voice::is_active)
    }

    /// Read-only access to one voice.
    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    /// Change the sample rate. The reverb's buffers are reallocated first;
    /// if that fails nothing changes and the error is returned.
    pub fn try_set_sample_rate(&mut self, sample_rate: f32) -> Result<(), AllocError> {
        self.effects.try_set_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.lfo.set_sample_rate(sample_rate);
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
        Ok(())
    }
}

/// Unison spread factor in −1..1 for voice `i` of `count`; the middle voice
/// of an odd pool sits at 0.
fn unison_factor(i: usize, count: usize) -> f32 {
    if count <= 1 || (count % 2 == 1 && i == count / 2) {
        return 0.0;
    }
    (i as f32 / (count - 1) as f32 - 0.5) * 2.0
}
