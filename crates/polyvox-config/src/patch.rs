//! Patch file format and application.
//!
//! A patch is a sectioned dictionary of synth settings. Every key is
//! optional: [`Patch::apply_to`] resets the synth to defaults first, so a
//! patch only needs to name what differs, while [`Patch::apply_over`] leaves
//! unnamed settings as they are.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use polyvox_synth::{
    FilterType, LfoWaveform, MAX_HARMONICS, ParamId, ParamValue, PolySynth, Waveform, WheelSource,
};

use crate::error::ConfigError;

/// Keys the loader did not recognise, kept so they can be reported.
pub type ExtraKeys = BTreeMap<String, toml::Value>;

/// Complete synth patch.
///
/// # TOML Format
///
/// ```toml
/// name = "Brass"
/// description = "Two detuned saws, slow filter attack"
///
/// [osc]
/// waveform1 = "saw"
/// waveform2 = "saw"
/// level2 = 0.8
/// detune_cents = 8.0
///
/// [filter]
/// type = "lpf24"
/// cutoff = 900.0
/// env_amount = 0.45
///
/// [filter_env]
/// attack = 0.08
/// decay = 0.6
/// sustain = 0.4
/// release = 0.3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Patch {
    /// Display name.
    pub name: String,

    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Oscillator settings.
    pub osc: OscSection,
    /// Mixer settings.
    pub mixer: MixerSection,
    /// Filter settings.
    pub filter: FilterSection,
    /// Filter envelope stages.
    pub filter_env: EnvSection,
    /// Amp envelope stages.
    pub amp_env: EnvSection,
    /// Global LFO and its routing.
    pub lfo: LfoSection,
    /// PolyMod routing.
    pub poly_mod: PolyModSection,
    /// Audio-rate cross modulation.
    pub cross_fm: CrossFmSection,
    /// Mod wheel and its routing.
    pub wheel: WheelSection,
    /// Unison stacking.
    pub unison: UnisonSection,
    /// Portamento.
    pub glide: GlideSection,
    /// Velocity sensitivity.
    pub velocity: VelocitySection,
    /// Master tuning and bend range.
    pub tuning: TuningSection,
    /// Analog drift.
    pub drift: DriftSection,
    /// Built-in reverb.
    pub reverb: ReverbSection,

    /// Unrecognised top-level keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

impl Default for Patch {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// `[osc]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OscSection {
    /// VCO-A waveform name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform1: Option<String>,
    /// VCO-B waveform name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform2: Option<String>,
    /// VCO-A level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level1: Option<f32>,
    /// VCO-B level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level2: Option<f32>,
    /// VCO-B detune in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detune_cents: Option<f32>,
    /// Base pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_width: Option<f32>,
    /// PWM depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwm_depth: Option<f32>,
    /// VCO-A additive amplitudes, fundamental first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harmonics1: Option<Vec<f32>>,
    /// VCO-B additive amplitudes, fundamental first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harmonics2: Option<Vec<f32>>,
    /// Hard sync of VCO-A to VCO-B.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<bool>,
    /// VCO-B specific settings.
    pub vco_b: VcoBSection,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[osc.vco_b]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VcoBSection {
    /// Run VCO-B as a sub-audio modulator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_freq: Option<bool>,
    /// Frequency knob, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq_knob: Option<f32>,
    /// Track the played note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_follow: Option<bool>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[mixer]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixerSection {
    /// Noise level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<f32>,
    /// Ring modulator level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_mod: Option<f32>,
    /// Saturation drive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive: Option<f32>,
    /// Gain after saturation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_gain: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[filter]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSection {
    /// Filter mode name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
    /// Cutoff in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f32>,
    /// Resonance, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resonance: Option<f32>,
    /// Keyboard tracking, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_follow: Option<f32>,
    /// Filter envelope depth, −1..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_amount: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[filter_env]` / `[amp_env]`; times in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvSection {
    /// Attack time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack: Option<f32>,
    /// Decay time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<f32>,
    /// Sustain level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustain: Option<f32>,
    /// Release time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[lfo]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LfoSection {
    /// Rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    /// Waveform name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform: Option<String>,
    /// Semitones on VCO-A.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_vco1_freq: Option<f32>,
    /// Semitones on VCO-B.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_vco2_freq: Option<f32>,
    /// Depth on VCO-A pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_vco1_pw: Option<f32>,
    /// Depth on VCO-B pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_vco2_pw: Option<f32>,
    /// Hz added to the cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_vcf_cutoff: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[poly_mod]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolyModSection {
    /// Filter envelope to VCO-A frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_env_to_freq_a: Option<f32>,
    /// Filter envelope to VCO-A pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_env_to_pw_a: Option<f32>,
    /// Filter envelope to cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_env_to_cutoff: Option<f32>,
    /// VCO-B to VCO-A pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc_b_to_pw_a: Option<f32>,
    /// VCO-B to cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc_b_to_cutoff: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[cross_fm]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrossFmSection {
    /// VCO-A into VCO-B frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc1_to_osc2: Option<f32>,
    /// VCO-B into VCO-A frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc2_to_osc1: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[wheel]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WheelSection {
    /// Wheel position, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    /// Source name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Depth on VCO-A frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_freq_a: Option<f32>,
    /// Depth on VCO-B frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_freq_b: Option<f32>,
    /// Depth on VCO-A pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pw_a: Option<f32>,
    /// Depth on VCO-B pulse width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pw_b: Option<f32>,
    /// Depth on cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_filter: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[unison]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnisonSection {
    /// Stack every voice on one note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Outer voice detune in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detune_cents: Option<f32>,
    /// Stereo width, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[glide]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlideSection {
    /// Portamento on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Glide time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[velocity]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VelocitySection {
    /// Velocity scaling of the filter envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_env: Option<f32>,
    /// Velocity scaling of the amp envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amp: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[tuning]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TuningSection {
    /// Master tune in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_cents: Option<f32>,
    /// Pitch bend range in semitones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bend_range: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[drift]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriftSection {
    /// Pitch drift depth in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_cents: Option<f32>,
    /// Pulse-width drift depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pw: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// `[reverb]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReverbSection {
    /// Reverb in the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Dry/wet mix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<f32>,
    /// Room size, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_size: Option<f32>,
    /// High-frequency damping, 0..1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damping: Option<f32>,
    /// Wet gain before the soft limiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wet_gain: Option<f32>,
    /// Decay time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt60: Option<f32>,
    /// Unrecognised keys.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraKeys,
}

/// Encoding chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl PatchFormat {
    /// Format for `path`, by case-insensitive extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Ordered parameter writes produced from a patch.
type Writes = Vec<(ParamId, ParamValue)>;

fn float(out: &mut Writes, id: ParamId, value: Option<f32>) {
    if let Some(v) = value {
        out.push((id, ParamValue::Float(v)));
    }
}

fn flag(out: &mut Writes, id: ParamId, value: Option<bool>) {
    if let Some(on) = value {
        out.push((id, ParamValue::Int(i32::from(on))));
    }
}

fn choice(out: &mut Writes, id: ParamId, key: &str, value: Option<&str>, index: Option<i32>) {
    match (value, index) {
        (Some(_), Some(i)) => out.push((id, ParamValue::Int(i))),
        (Some(name), None) => tracing::warn!(key, value = name, "unknown choice, skipping"),
        (None, _) => {}
    }
}

fn harmonics(out: &mut Writes, key: &str, values: Option<&[f32]>, slot: fn(u8) -> ParamId) {
    let Some(values) = values else {
        return;
    };
    if values.len() > MAX_HARMONICS {
        tracing::warn!(key, len = values.len(), max = MAX_HARMONICS, "extra harmonics ignored");
    }
    for (i, &amp) in values.iter().take(MAX_HARMONICS).enumerate() {
        out.push((slot(i as u8), ParamValue::Float(amp)));
    }
}

fn collect_extra(prefix: &str, extra: &ExtraKeys, out: &mut Vec<String>) {
    for key in extra.keys() {
        if prefix.is_empty() {
            out.push(key.clone());
        } else {
            out.push(format!("{}.{}", prefix, key));
        }
    }
}

impl Patch {
    /// Empty patch: applying it yields the synth defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            osc: OscSection::default(),
            mixer: MixerSection::default(),
            filter: FilterSection::default(),
            filter_env: EnvSection::default(),
            amp_env: EnvSection::default(),
            lfo: LfoSection::default(),
            poly_mod: PolyModSection::default(),
            cross_fm: CrossFmSection::default(),
            wheel: WheelSection::default(),
            unison: UnisonSection::default(),
            glide: GlideSection::default(),
            velocity: VelocitySection::default(),
            tuning: TuningSection::default(),
            drift: DriftSection::default(),
            reverb: ReverbSection::default(),
            extra: ExtraKeys::new(),
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = PatchFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch = match format {
            PatchFormat::Toml => Self::from_toml(&content)?,
            PatchFormat::Json => Self::from_json(&content)?,
        };
        tracing::debug!(path = %path.display(), name = %patch.name, "patch loaded");
        Ok(patch)
    }

    /// Parse TOML. Unknown keys are logged and kept in `extra`.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let patch: Patch = toml::from_str(toml_str)?;
        patch.warn_unknown_keys();
        Ok(patch)
    }

    /// Parse JSON. Unknown keys are logged and kept in `extra`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let patch: Patch = serde_json::from_str(json).map_err(ConfigError::JsonParse)?;
        patch.warn_unknown_keys();
        Ok(patch)
    }

    /// Write to a `.toml` or `.json` file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match PatchFormat::from_path(path)? {
            PatchFormat::Toml => self.to_toml()?,
            PatchFormat::Json => self.to_json()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::write_file(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::JsonSerialize)
    }

    /// Dotted paths of every key the loader did not recognise.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_extra("", &self.extra, &mut keys);
        collect_extra("osc", &self.osc.extra, &mut keys);
        collect_extra("osc.vco_b", &self.osc.vco_b.extra, &mut keys);
        collect_extra("mixer", &self.mixer.extra, &mut keys);
        collect_extra("filter", &self.filter.extra, &mut keys);
        collect_extra("filter_env", &self.filter_env.extra, &mut keys);
        collect_extra("amp_env", &self.amp_env.extra, &mut keys);
        collect_extra("lfo", &self.lfo.extra, &mut keys);
        collect_extra("poly_mod", &self.poly_mod.extra, &mut keys);
        collect_extra("cross_fm", &self.cross_fm.extra, &mut keys);
        collect_extra("wheel", &self.wheel.extra, &mut keys);
        collect_extra("unison", &self.unison.extra, &mut keys);
        collect_extra("glide", &self.glide.extra, &mut keys);
        collect_extra("velocity", &self.velocity.extra, &mut keys);
        collect_extra("tuning", &self.tuning.extra, &mut keys);
        collect_extra("drift", &self.drift.extra, &mut keys);
        collect_extra("reverb", &self.reverb.extra, &mut keys);
        keys
    }

    fn warn_unknown_keys(&self) {
        for key in self.unknown_keys() {
            tracing::warn!(patch = %self.name, key = %key, "unknown patch key ignored");
        }
    }

    /// Parameter writes this patch performs, in application order. Invalid
    /// choice names are logged and left out.
    pub fn writes(&self) -> Vec<(ParamId, ParamValue)> {
        let mut out = Writes::new();
        let w = &mut out;

        let osc = &self.osc;
        let waveform = |s: &Option<String>| s.as_deref().and_then(Waveform::from_name).map(Waveform::index);
        choice(w, ParamId::Osc1Waveform, "osc.waveform1", osc.waveform1.as_deref(), waveform(&osc.waveform1));
        choice(w, ParamId::Osc2Waveform, "osc.waveform2", osc.waveform2.as_deref(), waveform(&osc.waveform2));
        float(w, ParamId::Osc1Level, osc.level1);
        float(w, ParamId::Osc2Level, osc.level2);
        float(w, ParamId::VcoBDetune, osc.detune_cents);
        float(w, ParamId::PulseWidth, osc.pulse_width);
        float(w, ParamId::PwmDepth, osc.pwm_depth);
        harmonics(w, "osc.harmonics1", osc.harmonics1.as_deref(), ParamId::Osc1Harmonic);
        harmonics(w, "osc.harmonics2", osc.harmonics2.as_deref(), ParamId::Osc2Harmonic);
        flag(w, ParamId::Sync, osc.sync);
        flag(w, ParamId::VcoBLowFreq, osc.vco_b.low_freq);
        float(w, ParamId::VcoBFreqKnob, osc.vco_b.freq_knob);
        flag(w, ParamId::VcoBKeyFollow, osc.vco_b.key_follow);

        float(w, ParamId::NoiseLevel, self.mixer.noise);
        float(w, ParamId::RingModLevel, self.mixer.ring_mod);
        float(w, ParamId::MixerDrive, self.mixer.drive);
        float(w, ParamId::MixerPostGain, self.mixer.post_gain);

        let filter = &self.filter;
        let filter_type = filter.filter_type.as_deref();
        choice(
            w,
            ParamId::FilterType,
            "filter.type",
            filter_type,
            filter_type.and_then(FilterType::from_name).map(FilterType::index),
        );
        float(w, ParamId::VcfCutoff, filter.cutoff);
        float(w, ParamId::VcfResonance, filter.resonance);
        float(w, ParamId::VcfKeyFollow, filter.key_follow);
        float(w, ParamId::VcfEnvAmount, filter.env_amount);

        float(w, ParamId::FilterEnvAttack, self.filter_env.attack);
        float(w, ParamId::FilterEnvDecay, self.filter_env.decay);
        float(w, ParamId::FilterEnvSustain, self.filter_env.sustain);
        float(w, ParamId::FilterEnvRelease, self.filter_env.release);
        float(w, ParamId::AmpEnvAttack, self.amp_env.attack);
        float(w, ParamId::AmpEnvDecay, self.amp_env.decay);
        float(w, ParamId::AmpEnvSustain, self.amp_env.sustain);
        float(w, ParamId::AmpEnvRelease, self.amp_env.release);

        let lfo = &self.lfo;
        let lfo_waveform = lfo.waveform.as_deref();
        float(w, ParamId::LfoRate, lfo.rate);
        choice(
            w,
            ParamId::LfoWaveform,
            "lfo.waveform",
            lfo_waveform,
            lfo_waveform.and_then(LfoWaveform::from_name).map(LfoWaveform::index),
        );
        float(w, ParamId::LfoToOsc1Freq, lfo.to_vco1_freq);
        float(w, ParamId::LfoToOsc2Freq, lfo.to_vco2_freq);
        float(w, ParamId::LfoToOsc1Pw, lfo.to_vco1_pw);
        float(w, ParamId::LfoToOsc2Pw, lfo.to_vco2_pw);
        float(w, ParamId::LfoToVcfCutoff, lfo.to_vcf_cutoff);

        let pm = &self.poly_mod;
        float(w, ParamId::PmFilterEnvToFreqA, pm.filter_env_to_freq_a);
        float(w, ParamId::PmFilterEnvToPwA, pm.filter_env_to_pw_a);
        float(w, ParamId::PmFilterEnvToCutoff, pm.filter_env_to_cutoff);
        float(w, ParamId::PmOscBToPwA, pm.osc_b_to_pw_a);
        float(w, ParamId::PmOscBToCutoff, pm.osc_b_to_cutoff);
        float(w, ParamId::XmodOsc1ToOsc2, self.cross_fm.osc1_to_osc2);
        float(w, ParamId::XmodOsc2ToOsc1, self.cross_fm.osc2_to_osc1);

        let wheel = &self.wheel;
        let source = wheel.source.as_deref();
        float(w, ParamId::ModWheel, wheel.value);
        choice(
            w,
            ParamId::WheelSource,
            "wheel.source",
            source,
            source.and_then(WheelSource::from_name).map(WheelSource::index),
        );
        float(w, ParamId::WheelToFreqA, wheel.to_freq_a);
        float(w, ParamId::WheelToFreqB, wheel.to_freq_b);
        float(w, ParamId::WheelToPwA, wheel.to_pw_a);
        float(w, ParamId::WheelToPwB, wheel.to_pw_b);
        float(w, ParamId::WheelToFilter, wheel.to_filter);

        flag(w, ParamId::UnisonEnabled, self.unison.enabled);
        float(w, ParamId::UnisonDetune, self.unison.detune_cents);
        float(w, ParamId::UnisonSpread, self.unison.spread);
        flag(w, ParamId::GlideEnabled, self.glide.enabled);
        float(w, ParamId::GlideTime, self.glide.time);
        float(w, ParamId::FilterEnvVelocity, self.velocity.filter_env);
        float(w, ParamId::AmpVelocity, self.velocity.amp);
        float(w, ParamId::MasterTune, self.tuning.master_cents);
        float(w, ParamId::PitchBendRange, self.tuning.bend_range);
        float(w, ParamId::PitchDrift, self.drift.pitch_cents);
        float(w, ParamId::PwDrift, self.drift.pw);

        let reverb = &self.reverb;
        flag(w, ParamId::ReverbEnabled, reverb.enabled);
        float(w, ParamId::ReverbMix, reverb.mix);
        float(w, ParamId::ReverbRoomSize, reverb.room_size);
        float(w, ParamId::ReverbDamping, reverb.damping);
        float(w, ParamId::ReverbWetGain, reverb.wet_gain);
        float(w, ParamId::ReverbRt60, reverb.rt60);

        out
    }

    /// Reset `synth` to defaults, then apply every key present.
    pub fn apply_to(&self, synth: &mut PolySynth) {
        synth.reset_params();
        self.apply_over(synth);
    }

    /// Apply only the keys present, leaving everything else as it is.
    pub fn apply_over(&self, synth: &mut PolySynth) {
        for (id, value) in self.writes() {
            if let Err(e) = synth.set(id, value) {
                tracing::warn!(patch = %self.name, param = %id, error = %e, "patch value rejected");
            }
        }
    }

    /// Snapshot every setting of `synth` into a patch named `name`.
    pub fn capture(synth: &PolySynth, name: impl Into<String>) -> Self {
        let f = |id| synth.get_float(id).ok();
        let on = |id| synth.get_int(id).ok().map(|v| v != 0);
        let index = |id| synth.get_int(id).ok();
        let waveform = |id| index(id).and_then(Waveform::from_index).map(|w| w.name().to_string());
        let harmonics = |osc| -> Option<Vec<f32>> {
            ParamId::harmonics(osc).map(|id| synth.get_float(id).ok()).collect()
        };

        let mut patch = Patch::new(name);
        patch.osc = OscSection {
            waveform1: waveform(ParamId::Osc1Waveform),
            waveform2: waveform(ParamId::Osc2Waveform),
            level1: f(ParamId::Osc1Level),
            level2: f(ParamId::Osc2Level),
            detune_cents: f(ParamId::VcoBDetune),
            pulse_width: f(ParamId::PulseWidth),
            pwm_depth: f(ParamId::PwmDepth),
            harmonics1: harmonics(1),
            harmonics2: harmonics(2),
            sync: on(ParamId::Sync),
            vco_b: VcoBSection {
                low_freq: on(ParamId::VcoBLowFreq),
                freq_knob: f(ParamId::VcoBFreqKnob),
                key_follow: on(ParamId::VcoBKeyFollow),
                extra: ExtraKeys::new(),
            },
            extra: ExtraKeys::new(),
        };
        patch.mixer = MixerSection {
            noise: f(ParamId::NoiseLevel),
            ring_mod: f(ParamId::RingModLevel),
            drive: f(ParamId::MixerDrive),
            post_gain: f(ParamId::MixerPostGain),
            extra: ExtraKeys::new(),
        };
        patch.filter = FilterSection {
            filter_type: index(ParamId::FilterType)
                .and_then(FilterType::from_index)
                .map(|t| t.name().to_string()),
            cutoff: f(ParamId::VcfCutoff),
            resonance: f(ParamId::VcfResonance),
            key_follow: f(ParamId::VcfKeyFollow),
            env_amount: f(ParamId::VcfEnvAmount),
            extra: ExtraKeys::new(),
        };
        patch.filter_env = EnvSection {
            attack: f(ParamId::FilterEnvAttack),
            decay: f(ParamId::FilterEnvDecay),
            sustain: f(ParamId::FilterEnvSustain),
            release: f(ParamId::FilterEnvRelease),
            extra: ExtraKeys::new(),
        };
        patch.amp_env = EnvSection {
            attack: f(ParamId::AmpEnvAttack),
            decay: f(ParamId::AmpEnvDecay),
            sustain: f(ParamId::AmpEnvSustain),
            release: f(ParamId::AmpEnvRelease),
            extra: ExtraKeys::new(),
        };
        patch.lfo = LfoSection {
            rate: f(ParamId::LfoRate),
            waveform: index(ParamId::LfoWaveform)
                .and_then(LfoWaveform::from_index)
                .map(|w| w.name().to_string()),
            to_vco1_freq: f(ParamId::LfoToOsc1Freq),
            to_vco2_freq: f(ParamId::LfoToOsc2Freq),
            to_vco1_pw: f(ParamId::LfoToOsc1Pw),
            to_vco2_pw: f(ParamId::LfoToOsc2Pw),
            to_vcf_cutoff: f(ParamId::LfoToVcfCutoff),
            extra: ExtraKeys::new(),
        };
        patch.poly_mod = PolyModSection {
            filter_env_to_freq_a: f(ParamId::PmFilterEnvToFreqA),
            filter_env_to_pw_a: f(ParamId::PmFilterEnvToPwA),
            filter_env_to_cutoff: f(ParamId::PmFilterEnvToCutoff),
            osc_b_to_pw_a: f(ParamId::PmOscBToPwA),
            osc_b_to_cutoff: f(ParamId::PmOscBToCutoff),
            extra: ExtraKeys::new(),
        };
        patch.cross_fm = CrossFmSection {
            osc1_to_osc2: f(ParamId::XmodOsc1ToOsc2),
            osc2_to_osc1: f(ParamId::XmodOsc2ToOsc1),
            extra: ExtraKeys::new(),
        };
        patch.wheel = WheelSection {
            value: f(ParamId::ModWheel),
            source: index(ParamId::WheelSource)
                .and_then(WheelSource::from_index)
                .map(|s| s.name().to_string()),
            to_freq_a: f(ParamId::WheelToFreqA),
            to_freq_b: f(ParamId::WheelToFreqB),
            to_pw_a: f(ParamId::WheelToPwA),
            to_pw_b: f(ParamId::WheelToPwB),
            to_filter: f(ParamId::WheelToFilter),
            extra: ExtraKeys::new(),
        };
        patch.unison = UnisonSection {
            enabled: on(ParamId::UnisonEnabled),
            detune_cents: f(ParamId::UnisonDetune),
            spread: f(ParamId::UnisonSpread),
            extra: ExtraKeys::new(),
        };
        patch.glide = GlideSection {
            enabled: on(ParamId::GlideEnabled),
            time: f(ParamId::GlideTime),
            extra: ExtraKeys::new(),
        };
        patch.velocity = VelocitySection {
            filter_env: f(ParamId::FilterEnvVelocity),
            amp: f(ParamId::AmpVelocity),
            extra: ExtraKeys::new(),
        };
        patch.tuning = TuningSection {
            master_cents: f(ParamId::MasterTune),
            bend_range: f(ParamId::PitchBendRange),
            extra: ExtraKeys::new(),
        };
        patch.drift = DriftSection {
            pitch_cents: f(ParamId::PitchDrift),
            pw: f(ParamId::PwDrift),
            extra: ExtraKeys::new(),
        };
        patch.reverb = ReverbSection {
            enabled: on(ParamId::ReverbEnabled),
            mix: f(ParamId::ReverbMix),
            room_size: f(ParamId::ReverbRoomSize),
            damping: f(ParamId::ReverbDamping),
            wet_gain: f(ParamId::ReverbWetGain),
            rt60: f(ParamId::ReverbRt60),
            extra: ExtraKeys::new(),
        };
        patch
    }
}
