//! Patch files and factory presets for the polyvox synthesizer.
//!
//! A [`Patch`] is a sectioned dictionary of synth settings, stored as TOML or
//! JSON. Applying a patch goes through the synth's parameter dispatch, so
//! every value is clamped exactly as a live parameter write would be.
//!
//! # Example
//!
//! ```rust,no_run
//! use polyvox_config::{Patch, factory_preset};
//! use polyvox_synth::PolySynth;
//!
//! let mut synth = PolySynth::new(48000.0, 8);
//! factory_preset("brass").unwrap().apply_to(&mut synth);
//!
//! // Tweak and save the result
//! let patch = Patch::capture(&synth, "My Brass");
//! patch.save("my_brass.toml").unwrap();
//!
//! let reloaded = Patch::load("my_brass.toml").unwrap();
//! reloaded.apply_to(&mut synth);
//! ```

mod error;
mod patch;

/// Factory patches bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset, factory_preset_names, factory_presets, is_factory_preset,
};
pub use patch::{
    CrossFmSection, DriftSection, EnvSection, ExtraKeys, FilterSection, GlideSection, LfoSection,
    MixerSection, OscSection, Patch, PatchFormat, PolyModSection, ReverbSection, TuningSection,
    UnisonSection, VcoBSection, VelocitySection, WheelSection,
};

/// Resolve a preset argument: a factory name, or a path to a `.toml`/`.json`
/// file.
///
/// ```rust
/// use polyvox_config::resolve_preset;
///
/// assert_eq!(resolve_preset("pad").unwrap().name, "Pad");
/// assert!(resolve_preset("no_such_patch").is_err());
/// ```
pub fn resolve_preset(name_or_path: &str) -> Result<Patch, ConfigError> {
    if let Some(patch) = factory_preset(name_or_path) {
        return Ok(patch);
    }
    let path = std::path::Path::new(name_or_path);
    if path.is_file() {
        return Patch::load(path);
    }
    Err(ConfigError::PresetNotFound(name_or_path.to_string()))
}
