//! File round-trips for patches.

use polyvox_config::{ConfigError, Patch, factory_preset, factory_preset_names, resolve_preset};
use polyvox_synth::{FilterType, ParamId, PolySynth, Waveform};
use tempfile::TempDir;

const SR: f32 = 48000.0;

fn tweaked_synth() -> PolySynth {
    let mut synth = PolySynth::new(SR, 4);
    synth.set_int(ParamId::Osc1Waveform, Waveform::Additive.index()).unwrap();
    synth.set_float(ParamId::Osc1Harmonic(1), 0.5).unwrap();
    synth.set_float(ParamId::Osc1Harmonic(15), 0.125).unwrap();
    synth.set_int(ParamId::FilterType, FilterType::Hpf12.index()).unwrap();
    synth.set_float(ParamId::VcfCutoff, 333.0).unwrap();
    synth.set_float(ParamId::LfoRate, 7.5).unwrap();
    synth.set_int(ParamId::GlideEnabled, 1).unwrap();
    synth.set_float(ParamId::ReverbRt60, 3.3).unwrap();
    synth
}

fn assert_same_params(a: &PolySynth, b: &PolySynth) {
    for &id in ParamId::ALL {
        assert_eq!(a.get(id), b.get(id), "{} differs", id);
    }
    for id in ParamId::harmonics(1).chain(ParamId::harmonics(2)) {
        assert_eq!(a.get_float(id), b.get_float(id), "{} differs", id);
    }
}

#[test]
fn toml_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("tweaked.toml");

    let synth = tweaked_synth();
    Patch::capture(&synth, "Tweaked").save(&path).unwrap();
    assert!(path.exists(), "save creates parent directories");

    let loaded = Patch::load(&path).unwrap();
    assert_eq!(loaded.name, "Tweaked");
    let mut other = PolySynth::new(SR, 4);
    loaded.apply_to(&mut other);
    assert_same_params(&synth, &other);
}

#[test]
fn json_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tweaked.json");

    let synth = tweaked_synth();
    let patch = Patch::capture(&synth, "Tweaked").with_description("json copy");
    patch.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.trim_start().starts_with('{'));

    let loaded = Patch::load(&path).unwrap();
    assert_eq!(loaded, patch);
}

#[test]
fn every_factory_preset_survives_a_file_round_trip() {
    let dir = TempDir::new().unwrap();
    for name in factory_preset_names() {
        let patch = factory_preset(name).unwrap();
        let path = dir.path().join(format!("{}.toml", name));
        patch.save(&path).unwrap();
        assert_eq!(Patch::load(&path).unwrap(), patch, "{}", name);
    }
}

#[test]
fn unknown_keys_are_kept_out_of_the_synth() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extra.toml");
    std::fs::write(
        &path,
        r#"
        name = "Extra"
        version = 3

        [filter]
        cutoff = 1500.0
        poles = 4

        [chorus]
        depth = 0.5
        "#,
    )
    .unwrap();

    let patch = Patch::load(&path).unwrap();
    assert_eq!(patch.unknown_keys(), ["chorus", "version", "filter.poles"]);

    let mut synth = PolySynth::new(SR, 2);
    patch.apply_to(&mut synth);
    assert_eq!(synth.get_float(ParamId::VcfCutoff), Ok(1500.0));
}

#[test]
fn json_with_unknown_and_invalid_values() {
    let patch = Patch::from_json(
        r#"{
            "name": "Partial",
            "osc": { "waveform1": "SQUARE", "waveform2": "banjo", "level2": 0.25 },
            "lfo": { "waveform": "random_step", "rate": 12 },
            "future": true
        }"#,
    )
    .unwrap();
    assert_eq!(patch.unknown_keys(), ["future"]);

    let mut synth = PolySynth::new(SR, 2);
    patch.apply_to(&mut synth);
    assert_eq!(synth.get_int(ParamId::Osc1Waveform), Ok(Waveform::Square.index()));
    assert_eq!(synth.get_int(ParamId::Osc2Waveform), Ok(Waveform::Sine.index()));
    assert_eq!(synth.get_float(ParamId::Osc2Level), Ok(0.25));
    assert_eq!(synth.get_float(ParamId::LfoRate), Ok(12.0));
    assert_eq!(synth.get_int(ParamId::LfoWaveform), Ok(4));
}

#[test]
fn unparseable_file_leaves_synth_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "name = \"Broken\"\n[filter\ncutoff = 10").unwrap();

    let mut synth = tweaked_synth();
    let result = Patch::load(&path).map(|p| p.apply_to(&mut synth));
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    assert_same_params(&synth, &tweaked_synth());
}

#[test]
fn missing_file_and_bad_extension() {
    let dir = TempDir::new().unwrap();

    let err = Patch::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));

    let err = Patch::load(dir.path().join("patch.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));

    let err = Patch::new("x").save(dir.path().join("patch.txt")).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn resolve_prefers_factory_then_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mine.toml");
    Patch::new("Mine").save(&path).unwrap();

    assert_eq!(resolve_preset("Brass").unwrap().name, "Brass");
    assert_eq!(resolve_preset(path.to_str().unwrap()).unwrap().name, "Mine");
    assert!(matches!(
        resolve_preset("nowhere/patch.toml"),
        Err(ConfigError::PresetNotFound(_))
    ));
}

#[test]
fn apply_over_layers_two_patches() {
    let mut synth = PolySynth::new(SR, 2);
    factory_preset("pad").unwrap().apply_to(&mut synth);
    let layer = Patch::from_toml("[reverb]\nenabled = false\n[filter]\ncutoff = 900.0").unwrap();
    layer.apply_over(&mut synth);

    assert_eq!(synth.get_int(ParamId::ReverbEnabled), Ok(0));
    assert_eq!(synth.get_float(ParamId::VcfCutoff), Ok(900.0));
    // Untouched by the layer, still the pad's
    assert_eq!(synth.get_float(ParamId::PwmDepth), Ok(0.6));
}
