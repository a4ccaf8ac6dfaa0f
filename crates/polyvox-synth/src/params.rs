//! Typed parameter identifiers and their metadata.
//!
//! Every externally settable value has a [`ParamId`]. The synth exposes one
//! dispatch point, [`PolySynth::set_float`](crate::PolySynth::set_float) /
//! [`set_int`](crate::PolySynth::set_int), which looks up the descriptor,
//! clamps, and stores. Presets and the control queue go through the same
//! path.
//!
//! Stepped parameters (toggles, waveforms, modes) take integers; everything
//! else takes floats. Writing the wrong kind is a [`ParamError::TypeMismatch`].

use core::fmt;
use polyvox_core::{ParamDescriptor, ParamScale, ParamUnit};

use crate::oscillator::MAX_HARMONICS;

/// Parameter identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ParamId {
    // Oscillators
    /// Sets both oscillator waveforms; reads back VCO-A's.
    Waveform,
    Osc1Waveform,
    Osc2Waveform,
    Osc1Level,
    Osc2Level,
    PulseWidth,
    PwmDepth,
    VcoBDetune,
    VcoBLowFreq,
    VcoBFreqKnob,
    VcoBKeyFollow,
    Sync,
    /// Additive amplitude of VCO-A harmonic `n` (0 = fundamental).
    Osc1Harmonic(u8),
    /// Additive amplitude of VCO-B harmonic `n`.
    Osc2Harmonic(u8),

    // Mixer
    NoiseLevel,
    RingModLevel,
    MixerDrive,
    MixerPostGain,

    // Filter
    FilterType,
    VcfCutoff,
    VcfResonance,
    VcfKeyFollow,
    VcfEnvAmount,

    // Envelopes
    FilterEnvAttack,
    FilterEnvDecay,
    FilterEnvSustain,
    FilterEnvRelease,
    AmpEnvAttack,
    AmpEnvDecay,
    AmpEnvSustain,
    AmpEnvRelease,

    // LFO
    LfoRate,
    LfoWaveform,
    LfoToOsc1Freq,
    LfoToOsc2Freq,
    LfoToOsc1Pw,
    LfoToOsc2Pw,
    LfoToVcfCutoff,

    // PolyMod and cross-FM
    PmFilterEnvToFreqA,
    PmFilterEnvToPwA,
    PmFilterEnvToCutoff,
    PmOscBToPwA,
    PmOscBToCutoff,
    XmodOsc1ToOsc2,
    XmodOsc2ToOsc1,

    // Wheel
    ModWheel,
    WheelSource,
    WheelToFreqA,
    WheelToFreqB,
    WheelToPwA,
    WheelToPwB,
    WheelToFilter,

    // Performance
    UnisonEnabled,
    UnisonDetune,
    UnisonSpread,
    GlideEnabled,
    GlideTime,
    FilterEnvVelocity,
    AmpVelocity,
    MasterTune,
    PitchBend,
    PitchBendRange,
    PitchDrift,
    PwDrift,

    // Reverb
    ReverbEnabled,
    ReverbMix,
    ReverbRoomSize,
    ReverbDamping,
    ReverbWetGain,
    ReverbRt60,
}

/// Value carried by a generic parameter write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    /// Continuous parameter.
    Float(f32),
    /// Stepped parameter (toggle as 0/1, enum as index).
    Int(i32),
}

/// Parameter lookup or write failure. The synth state is unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamError {
    /// The id does not name a parameter (harmonic index out of range).
    UnknownParam(ParamId),
    /// Float written to a stepped parameter or int to a continuous one.
    TypeMismatch(ParamId),
    /// No parameter has this name.
    UnknownName,
    /// Integer is not a valid value for this enum parameter.
    InvalidEnumValue(ParamId, i32),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::UnknownParam(id) => write!(f, "unknown parameter {}", id),
            ParamError::TypeMismatch(id) => write!(f, "wrong value type for parameter {}", id),
            ParamError::UnknownName => write!(f, "unknown parameter name"),
            ParamError::InvalidEnumValue(id, v) => write!(f, "invalid value {} for parameter {}", v, id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParamError {}

const fn float(
    name: &'static str,
    id: &'static str,
    group: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamDescriptor {
    ParamDescriptor::new(name, id, group, min, max, default)
}

const fn toggle(name: &'static str, id: &'static str, group: &'static str, on: bool) -> ParamDescriptor {
    ParamDescriptor::new(name, id, group, 0.0, 1.0, if on { 1.0 } else { 0.0 }).stepped()
}

const fn choice(
    name: &'static str,
    id: &'static str,
    group: &'static str,
    count: usize,
    default: i32,
) -> ParamDescriptor {
    ParamDescriptor::new(name, id, group, 0.0, (count - 1) as f32, default as f32).stepped()
}

const fn time(name: &'static str, id: &'static str, group: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::new(name, id, group, 0.001, 20.0, default)
        .with_unit(ParamUnit::Seconds)
        .with_scale(ParamScale::Logarithmic)
}

impl ParamId {
    /// Every scalar parameter, in listing order. Harmonic slots are not
    /// included; see [`ParamId::harmonics`].
    pub const ALL: &'static [ParamId] = &[
        ParamId::Waveform,
        ParamId::Osc1Waveform,
        ParamId::Osc2Waveform,
        ParamId::Osc1Level,
        ParamId::Osc2Level,
        ParamId::PulseWidth,
        ParamId::PwmDepth,
        ParamId::VcoBDetune,
        ParamId::VcoBLowFreq,
        ParamId::VcoBFreqKnob,
        ParamId::VcoBKeyFollow,
        ParamId::Sync,
        ParamId::NoiseLevel,
        ParamId::RingModLevel,
        ParamId::MixerDrive,
        ParamId::MixerPostGain,
        ParamId::FilterType,
        ParamId::VcfCutoff,
        ParamId::VcfResonance,
        ParamId::VcfKeyFollow,
        ParamId::VcfEnvAmount,
        ParamId::FilterEnvAttack,
        ParamId::FilterEnvDecay,
        ParamId::FilterEnvSustain,
        ParamId::FilterEnvRelease,
        ParamId::AmpEnvAttack,
        ParamId::AmpEnvDecay,
        ParamId::AmpEnvSustain,
        ParamId::AmpEnvRelease,
        ParamId::LfoRate,
        ParamId::LfoWaveform,
        ParamId::LfoToOsc1Freq,
        ParamId::LfoToOsc2Freq,
        ParamId::LfoToOsc1Pw,
        ParamId::LfoToOsc2Pw,
        ParamId::LfoToVcfCutoff,
        ParamId::PmFilterEnvToFreqA,
        ParamId::PmFilterEnvToPwA,
        ParamId::PmFilterEnvToCutoff,
        ParamId::PmOscBToPwA,
        ParamId::PmOscBToCutoff,
        ParamId::XmodOsc1ToOsc2,
        ParamId::XmodOsc2ToOsc1,
        ParamId::ModWheel,
        ParamId::WheelSource,
        ParamId::WheelToFreqA,
        ParamId::WheelToFreqB,
        ParamId::WheelToPwA,
        ParamId::WheelToPwB,
        ParamId::WheelToFilter,
        ParamId::UnisonEnabled,
        ParamId::UnisonDetune,
        ParamId::UnisonSpread,
        ParamId::GlideEnabled,
        ParamId::GlideTime,
        ParamId::FilterEnvVelocity,
        ParamId::AmpVelocity,
        ParamId::MasterTune,
        ParamId::PitchBend,
        ParamId::PitchBendRange,
        ParamId::PitchDrift,
        ParamId::PwDrift,
        ParamId::ReverbEnabled,
        ParamId::ReverbMix,
        ParamId::ReverbRoomSize,
        ParamId::ReverbDamping,
        ParamId::ReverbWetGain,
        ParamId::ReverbRt60,
    ];

    /// Harmonic slots of one oscillator (`osc` is 1 or 2; anything else
    /// yields VCO-B's).
    pub fn harmonics(osc: u8) -> impl Iterator<Item = ParamId> {
        (0..MAX_HARMONICS as u8).map(move |i| {
            if osc == 1 {
                ParamId::Osc1Harmonic(i)
            } else {
                ParamId::Osc2Harmonic(i)
            }
        })
    }

    /// Metadata for this parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use polyvox_synth::ParamId;
    ///
    /// let d = ParamId::VcfCutoff.descriptor();
    /// assert_eq!(d.string_id, "vcf_cutoff");
    /// assert_eq!(d.clamp(50_000.0), 20_000.0);
    /// ```
    pub const fn descriptor(self) -> ParamDescriptor {
        use ParamUnit::{Cents, Hertz, Seconds, Semitones};
        match self {
            ParamId::Waveform => choice("Waveform", "waveform", "osc", 6, 0),
            ParamId::Osc1Waveform => choice("VCO-A Waveform", "osc1_waveform", "osc", 6, 0),
            ParamId::Osc2Waveform => choice("VCO-B Waveform", "osc2_waveform", "osc", 6, 0),
            ParamId::Osc1Level => float("VCO-A Level", "osc1_level", "osc", 0.0, 1.0, 1.0),
            ParamId::Osc2Level => float("VCO-B Level", "osc2_level", "osc", 0.0, 1.0, 0.0),
            ParamId::PulseWidth => float("Pulse Width", "pulse_width", "osc", 0.01, 0.99, 0.5),
            ParamId::PwmDepth => float("PWM Depth", "pwm_depth", "osc", 0.0, 1.0, 0.0),
            ParamId::VcoBDetune => {
                float("VCO-B Detune", "vco_b_detune", "osc", -100.0, 100.0, 0.0).with_unit(Cents)
            }
            ParamId::VcoBLowFreq => toggle("VCO-B Low Freq", "vco_b_low_freq", "osc", false),
            ParamId::VcoBFreqKnob => float("VCO-B Frequency", "vco_b_freq_knob", "osc", 0.0, 1.0, 0.5),
            ParamId::VcoBKeyFollow => toggle("VCO-B Key Follow", "vco_b_key_follow", "osc", true),
            ParamId::Sync => toggle("Sync", "sync", "osc", false),
            ParamId::Osc1Harmonic(_) => float("VCO-A Harmonic", "osc1_harmonic", "osc", 0.0, 1.0, 0.0),
            ParamId::Osc2Harmonic(_) => float("VCO-B Harmonic", "osc2_harmonic", "osc", 0.0, 1.0, 0.0),

            ParamId::NoiseLevel => float("Noise", "noise_level", "mixer", 0.0, 1.0, 0.0),
            ParamId::RingModLevel => float("Ring Mod", "ring_mod_level", "mixer", 0.0, 1.0, 0.0),
            ParamId::MixerDrive => float("Drive", "mixer_drive", "mixer", 0.0, 1.0, 0.0),
            ParamId::MixerPostGain => float("Post Gain", "mixer_post_gain", "mixer", 0.0, 2.0, 1.0),

            ParamId::FilterType => choice("Filter Type", "filter_type", "filter", 5, 0),
            ParamId::VcfCutoff => float("Cutoff", "vcf_cutoff", "filter", 20.0, 20000.0, 1000.0)
                .with_unit(Hertz)
                .with_scale(ParamScale::Logarithmic),
            ParamId::VcfResonance => float("Resonance", "vcf_resonance", "filter", 0.0, 1.0, 0.0),
            ParamId::VcfKeyFollow => float("Key Follow", "vcf_key_follow", "filter", 0.0, 1.0, 0.0),
            ParamId::VcfEnvAmount => float("Env Amount", "vcf_env_amount", "filter", -1.0, 1.0, 0.0),

            ParamId::FilterEnvAttack => time("Filter Attack", "filter_env_attack", "filter_env", 0.01),
            ParamId::FilterEnvDecay => time("Filter Decay", "filter_env_decay", "filter_env", 0.1),
            ParamId::FilterEnvSustain => {
                float("Filter Sustain", "filter_env_sustain", "filter_env", 0.0, 1.0, 0.7)
            }
            ParamId::FilterEnvRelease => time("Filter Release", "filter_env_release", "filter_env", 0.3),
            ParamId::AmpEnvAttack => time("Amp Attack", "amp_env_attack", "amp_env", 0.01),
            ParamId::AmpEnvDecay => time("Amp Decay", "amp_env_decay", "amp_env", 0.1),
            ParamId::AmpEnvSustain => float("Amp Sustain", "amp_env_sustain", "amp_env", 0.0, 1.0, 0.9),
            ParamId::AmpEnvRelease => time("Amp Release", "amp_env_release", "amp_env", 0.2),

            ParamId::LfoRate => float("LFO Rate", "lfo_rate", "lfo", 0.01, 50.0, 1.0)
                .with_unit(Hertz)
                .with_scale(ParamScale::Logarithmic),
            ParamId::LfoWaveform => choice("LFO Waveform", "lfo_waveform", "lfo", 5, 0),
            ParamId::LfoToOsc1Freq => {
                float("LFO > VCO-A Freq", "lfo_to_osc1_freq", "lfo", -24.0, 24.0, 0.0).with_unit(Semitones)
            }
            ParamId::LfoToOsc2Freq => {
                float("LFO > VCO-B Freq", "lfo_to_osc2_freq", "lfo", -24.0, 24.0, 0.0).with_unit(Semitones)
            }
            ParamId::LfoToOsc1Pw => float("LFO > VCO-A PW", "lfo_to_osc1_pw", "lfo", 0.0, 1.0, 0.0),
            ParamId::LfoToOsc2Pw => float("LFO > VCO-B PW", "lfo_to_osc2_pw", "lfo", 0.0, 1.0, 0.0),
            ParamId::LfoToVcfCutoff => {
                float("LFO > Cutoff", "lfo_to_vcf_cutoff", "lfo", -10000.0, 10000.0, 0.0).with_unit(Hertz)
            }

            ParamId::PmFilterEnvToFreqA => {
                float("Env > VCO-A Freq", "pm_filter_env_to_freq_a", "poly_mod", 0.0, 1.0, 0.0)
            }
            ParamId::PmFilterEnvToPwA => {
                float("Env > VCO-A PW", "pm_filter_env_to_pw_a", "poly_mod", 0.0, 1.0, 0.0)
            }
            ParamId::PmFilterEnvToCutoff => {
                float("Env > Cutoff", "pm_filter_env_to_cutoff", "poly_mod", 0.0, 1.0, 0.0)
            }
            ParamId::PmOscBToPwA => float("VCO-B > VCO-A PW", "pm_osc_b_to_pw_a", "poly_mod", 0.0, 1.0, 0.0),
            ParamId::PmOscBToCutoff => {
                float("VCO-B > Cutoff", "pm_osc_b_to_cutoff", "poly_mod", 0.0, 1.0, 0.0)
            }
            ParamId::XmodOsc1ToOsc2 => float("FM A > B", "xmod_osc1_to_osc2", "cross_fm", -1.0, 1.0, 0.0),
            ParamId::XmodOsc2ToOsc1 => float("FM B > A", "xmod_osc2_to_osc1", "cross_fm", -1.0, 1.0, 0.0),

            ParamId::ModWheel => float("Mod Wheel", "mod_wheel", "wheel", 0.0, 1.0, 0.0),
            ParamId::WheelSource => choice("Wheel Source", "wheel_source", "wheel", 2, 0),
            ParamId::WheelToFreqA => float("Wheel > VCO-A Freq", "wheel_to_freq_a", "wheel", 0.0, 1.0, 0.0),
            ParamId::WheelToFreqB => float("Wheel > VCO-B Freq", "wheel_to_freq_b", "wheel", 0.0, 1.0, 0.0),
            ParamId::WheelToPwA => float("Wheel > VCO-A PW", "wheel_to_pw_a", "wheel", 0.0, 1.0, 0.0),
            ParamId::WheelToPwB => float("Wheel > VCO-B PW", "wheel_to_pw_b", "wheel", 0.0, 1.0, 0.0),
            ParamId::WheelToFilter => float("Wheel > Cutoff", "wheel_to_filter", "wheel", 0.0, 1.0, 0.0),

            ParamId::UnisonEnabled => toggle("Unison", "unison_enabled", "unison", false),
            ParamId::UnisonDetune => {
                float("Unison Detune", "unison_detune", "unison", 0.0, 100.0, 7.0).with_unit(Cents)
            }
            ParamId::UnisonSpread => float("Unison Spread", "unison_spread", "unison", 0.0, 1.0, 0.5),
            ParamId::GlideEnabled => toggle("Glide", "glide_enabled", "glide", false),
            ParamId::GlideTime => float("Glide Time", "glide_time", "glide", 0.0, 10.0, 0.05).with_unit(Seconds),
            ParamId::FilterEnvVelocity => {
                float("Filter Env Velocity", "filter_env_velocity", "velocity", 0.0, 1.0, 0.0)
            }
            ParamId::AmpVelocity => float("Amp Velocity", "amp_velocity", "velocity", 0.0, 1.0, 0.0),
            ParamId::MasterTune => {
                float("Master Tune", "master_tune", "tuning", -1200.0, 1200.0, 0.0).with_unit(Cents)
            }
            ParamId::PitchBend => float("Pitch Bend", "pitch_bend", "tuning", -1.0, 1.0, 0.0),
            ParamId::PitchBendRange => {
                float("Bend Range", "pitch_bend_range", "tuning", 0.0, 24.0, 2.0).with_unit(Semitones)
            }
            ParamId::PitchDrift => float("Pitch Drift", "pitch_drift", "drift", 0.0, 50.0, 0.0).with_unit(Cents),
            ParamId::PwDrift => float("PW Drift", "pw_drift", "drift", 0.0, 0.45, 0.0),

            ParamId::ReverbEnabled => toggle("Reverb", "reverb_enabled", "reverb", false),
            ParamId::ReverbMix => float("Reverb Mix", "reverb_mix", "reverb", 0.0, 1.0, 0.3),
            ParamId::ReverbRoomSize => float("Room Size", "reverb_room_size", "reverb", 0.0, 1.0, 0.5),
            ParamId::ReverbDamping => float("Damping", "reverb_damping", "reverb", 0.0, 1.0, 0.5),
            ParamId::ReverbWetGain => float("Wet Gain", "reverb_wet_gain", "reverb", 0.0, 2.0, 1.0),
            ParamId::ReverbRt60 => float("RT60", "reverb_rt60", "reverb", 0.05, 20.0, 1.2)
                .with_unit(Seconds)
                .with_scale(ParamScale::Logarithmic),
        }
    }

    /// Stable snake_case name. Harmonic slots share their oscillator's base
    /// name; [`Display`](fmt::Display) appends the index.
    pub const fn name(self) -> &'static str {
        self.descriptor().string_id
    }

    /// Group the parameter is listed under.
    pub const fn group(self) -> &'static str {
        self.descriptor().group
    }

    /// True for toggles and enums (written with `set_int`).
    pub const fn is_stepped(self) -> bool {
        self.descriptor().is_stepped()
    }

    /// Look up a parameter by name. Harmonics are named
    /// `osc1_harmonic_<n>` / `osc2_harmonic_<n>`.
    ///
    /// ```rust
    /// use polyvox_synth::ParamId;
    ///
    /// assert_eq!(ParamId::from_name("vcf_cutoff"), Some(ParamId::VcfCutoff));
    /// assert_eq!(ParamId::from_name("osc2_harmonic_3"), Some(ParamId::Osc2Harmonic(3)));
    /// assert_eq!(ParamId::from_name("osc2_harmonic_16"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(id) = Self::ALL.iter().copied().find(|id| id.name() == name) {
            return Some(id);
        }
        let parse_index = |rest: &str| rest.parse::<u8>().ok().filter(|&i| usize::from(i) < MAX_HARMONICS);
        if let Some(rest) = name.strip_prefix("osc1_harmonic_") {
            return parse_index(rest).map(ParamId::Osc1Harmonic);
        }
        if let Some(rest) = name.strip_prefix("osc2_harmonic_") {
            return parse_index(rest).map(ParamId::Osc2Harmonic);
        }
        None
    }

    /// False only for harmonic slots past the table.
    pub fn is_valid(self) -> bool {
        match self {
            ParamId::Osc1Harmonic(i) | ParamId::Osc2Harmonic(i) => usize::from(i) < MAX_HARMONICS,
            _ => true,
        }
    }

    /// Default value, taking the fundamental's amplitude of 1 into account.
    pub fn default_value(self) -> f32 {
        match self {
            ParamId::Osc1Harmonic(0) | ParamId::Osc2Harmonic(0) => 1.0,
            _ => self.descriptor().default,
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamId::Osc1Harmonic(i) | ParamId::Osc2Harmonic(i) => write!(f, "{}_{}", self.name(), i),
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique_and_round_trip() {
        for (i, a) in ParamId::ALL.iter().enumerate() {
            assert_eq!(ParamId::from_name(a.name()), Some(*a), "{}", a.name());
            for b in &ParamId::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn test_defaults_inside_ranges() {
        for id in ParamId::ALL {
            let d = id.descriptor();
            assert!(d.min <= d.default && d.default <= d.max, "{} default out of range", d.string_id);
            if d.is_stepped() {
                assert_eq!(d.default.fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_harmonic_names() {
        assert_eq!(ParamId::from_name("osc1_harmonic_0"), Some(ParamId::Osc1Harmonic(0)));
        assert_eq!(ParamId::from_name("osc1_harmonic_x"), None);
        assert_eq!(ParamId::Osc2Harmonic(7).to_string(), "osc2_harmonic_7");
        assert_eq!(ParamId::harmonics(1).count(), MAX_HARMONICS);
        assert!(!ParamId::Osc1Harmonic(16).is_valid());
        assert_eq!(ParamId::Osc1Harmonic(0).default_value(), 1.0);
        assert_eq!(ParamId::Osc1Harmonic(1).default_value(), 0.0);
    }

    #[test]
    fn test_stepped_params() {
        assert!(ParamId::Sync.is_stepped());
        assert!(ParamId::FilterType.is_stepped());
        assert!(!ParamId::VcfCutoff.is_stepped());
        assert_eq!(ParamId::FilterType.descriptor().max, 4.0);
        assert_eq!(ParamId::Waveform.descriptor().max, 5.0);
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(ParamId::from_name("warp_drive"), None);
    }
}
