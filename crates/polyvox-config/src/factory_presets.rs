//! Factory patches bundled with polyvox.
//!
//! These are embedded TOML strings, always available without external files.
//! Each one only names what differs from the synth defaults.

use crate::Patch;

/// Internal identifiers of the factory patches, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] = &["init", "brass", "sync_lead", "pad", "pluck_verb"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("brass", BRASS_PRESET),
    ("sync_lead", SYNC_LEAD_PRESET),
    ("pad", PAD_PRESET),
    ("pluck_verb", PLUCK_VERB_PRESET),
];

/// Synth defaults: a single sine oscillator.
const INIT_PRESET: &str = r#"
name = "Init"
description = "Default parameter set, one sine oscillator"
"#;

const BRASS_PRESET: &str = r#"
name = "Brass"
description = "Two detuned saws with a slow filter swell"

[osc]
waveform1 = "saw"
waveform2 = "saw"
level1 = 0.9
level2 = 0.8
detune_cents = 8.0

[filter]
type = "lpf24"
cutoff = 700.0
resonance = 0.15
key_follow = 0.3
env_amount = 0.45

[filter_env]
attack = 0.08
decay = 0.6
sustain = 0.45
release = 0.3

[amp_env]
attack = 0.03
decay = 0.2
sustain = 0.85
release = 0.25

[velocity]
filter_env = 0.5

[drift]
pitch_cents = 3.0
"#;

const SYNC_LEAD_PRESET: &str = r#"
name = "Sync Lead"
description = "Hard-synced saw swept by the filter envelope, with glide"

[osc]
waveform1 = "saw"
waveform2 = "square"
level1 = 1.0
level2 = 0.3
sync = true

[osc.vco_b]
freq_knob = 0.5
key_follow = true

[filter]
type = "lpf24"
cutoff = 2500.0
resonance = 0.3
env_amount = 0.3

[filter_env]
attack = 0.005
decay = 0.5
sustain = 0.2
release = 0.2

[amp_env]
attack = 0.005
decay = 0.1
sustain = 1.0
release = 0.15

[poly_mod]
filter_env_to_freq_a = 0.35

[lfo]
rate = 5.5
waveform = "triangle"

[wheel]
source = "lfo"
to_freq_a = 0.2

[glide]
enabled = true
time = 0.08
"#;

const PAD_PRESET: &str = r#"
name = "Pad"
description = "Slow pulse-width-modulated strings with reverb"

[osc]
waveform1 = "pulse"
waveform2 = "saw"
level1 = 0.8
level2 = 0.6
detune_cents = -6.0
pulse_width = 0.4
pwm_depth = 0.6

[filter]
type = "lpf12"
cutoff = 2200.0
resonance = 0.1
env_amount = 0.2

[filter_env]
attack = 1.2
decay = 2.0
sustain = 0.6
release = 2.0

[amp_env]
attack = 0.9
decay = 1.0
sustain = 0.9
release = 2.5

[lfo]
rate = 0.4
waveform = "sine"
to_vco1_pw = 0.5
to_vcf_cutoff = 300.0

[drift]
pitch_cents = 6.0
pw = 0.05

[reverb]
enabled = true
mix = 0.4
room_size = 0.8
damping = 0.4
rt60 = 4.0
"#;

const PLUCK_VERB_PRESET: &str = r#"
name = "Pluck Verb"
description = "Short filtered pluck into a long room"

[osc]
waveform1 = "triangle"
waveform2 = "saw"
level1 = 0.9
level2 = 0.5
detune_cents = 5.0

[mixer]
noise = 0.05

[filter]
type = "lpf24"
cutoff = 400.0
resonance = 0.35
key_follow = 0.5
env_amount = 0.6

[filter_env]
attack = 0.001
decay = 0.25
sustain = 0.0
release = 0.2

[amp_env]
attack = 0.001
decay = 0.6
sustain = 0.0
release = 0.4

[velocity]
filter_env = 0.6
amp = 0.4

[reverb]
enabled = true
mix = 0.35
room_size = 0.6
damping = 0.5
rt60 = 2.5
"#;

/// Every factory patch, parsed.
///
/// # Example
///
/// ```rust
/// use polyvox_config::factory_presets;
///
/// for patch in factory_presets() {
///     println!("{}: {}", patch.name, patch.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<Patch> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Patch::from_toml(toml).ok())
        .collect()
}

/// Factory patch by identifier or display name, ignoring case.
///
/// # Example
///
/// ```rust
/// use polyvox_config::factory_preset;
///
/// let patch = factory_preset("Sync Lead").unwrap();
/// assert_eq!(patch.osc.sync, Some(true));
/// ```
pub fn factory_preset(name: &str) -> Option<Patch> {
    if let Some((_, toml)) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
    {
        return Patch::from_toml(toml).ok();
    }

    factory_presets()
        .into_iter()
        .find(|patch| patch.name.eq_ignore_ascii_case(name))
}

/// Identifiers of all factory patches.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// True if `name` matches a factory patch identifier or display name.
///
/// ```rust
/// use polyvox_config::is_factory_preset;
///
/// assert!(is_factory_preset("pad"));
/// assert!(is_factory_preset("Pluck Verb"));
/// assert!(!is_factory_preset("my_patch"));
/// ```
pub fn is_factory_preset(name: &str) -> bool {
    factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyvox_synth::{ParamId, PolySynth};

    #[test]
    fn test_factory_presets_load() {
        let presets = factory_presets();
        assert_eq!(presets.len(), FACTORY_PRESET_NAMES.len());
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Init", "Brass", "Sync Lead", "Pad", "Pluck Verb"]);
    }

    #[test]
    fn test_names_match_table() {
        assert_eq!(factory_preset_names(), FACTORY_PRESET_NAMES);
    }

    #[test]
    fn test_factory_presets_clean() {
        for patch in factory_presets() {
            assert!(patch.unknown_keys().is_empty(), "{} has unknown keys", patch.name);
            assert!(patch.description.is_some(), "{} lacks a description", patch.name);
        }
    }

    #[test]
    fn test_every_choice_resolves() {
        // A misspelt enum would be dropped from the writes with a warning
        for patch in factory_presets() {
            let expected = [
                patch.osc.waveform1.is_some(),
                patch.osc.waveform2.is_some(),
                patch.filter.filter_type.is_some(),
                patch.lfo.waveform.is_some(),
                patch.wheel.source.is_some(),
            ]
            .iter()
            .filter(|&&set| set)
            .count();
            let written = patch
                .writes()
                .iter()
                .filter(|(id, _)| id.is_stepped() && !matches!(
                    id,
                    ParamId::Sync
                        | ParamId::VcoBLowFreq
                        | ParamId::VcoBKeyFollow
                        | ParamId::UnisonEnabled
                        | ParamId::GlideEnabled
                        | ParamId::ReverbEnabled
                ))
                .count();
            assert_eq!(written, expected, "{}", patch.name);
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(factory_preset("BRASS").map(|p| p.name), Some("Brass".to_string()));
        assert_eq!(factory_preset("pluck verb").map(|p| p.name), Some("Pluck Verb".to_string()));
        assert!(factory_preset("organ").is_none());
        assert!(!is_factory_preset(""));
    }

    #[test]
    fn test_init_matches_reset_state() {
        let mut synth = PolySynth::new(44100.0, 4);
        synth.set_float(ParamId::VcfCutoff, 300.0).unwrap();
        factory_preset("init").unwrap().apply_to(&mut synth);
        let fresh = PolySynth::new(44100.0, 4);
        for &id in ParamId::ALL {
            assert_eq!(synth.get(id), fresh.get(id), "{}", id);
        }
    }

    #[test]
    fn test_reverb_presets_enable_reverb() {
        for name in ["pad", "pluck_verb"] {
            let mut synth = PolySynth::new(44100.0, 4);
            factory_preset(name).unwrap().apply_to(&mut synth);
            assert_eq!(synth.get_int(ParamId::ReverbEnabled), Ok(1), "{}", name);
        }
    }
}
