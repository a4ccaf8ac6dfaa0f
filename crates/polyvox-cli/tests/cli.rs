//! Integration tests for the `polyvox` binary.

use std::process::Command;
use tempfile::TempDir;

fn polyvox_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_polyvox"))
}

#[test]
fn cli_params_lists_every_group() {
    let output = polyvox_bin().arg("params").output().expect("failed to run polyvox params");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["vcf_cutoff", "osc1_waveform", "lfo_rate", "unison_detune", "reverb_rt60"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
    assert!(stdout.contains("lpf24|lpf12|hpf12|bpf12|notch"));
}

#[test]
fn cli_params_filters_by_group() {
    let output = polyvox_bin()
        .args(["params", "--group", "reverb"])
        .output()
        .expect("failed to run polyvox params");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("reverb_mix"));
    assert!(!stdout.contains("vcf_cutoff"));

    let output = polyvox_bin()
        .args(["params", "--group", "kazoo"])
        .output()
        .expect("failed to run polyvox params");
    assert!(!output.status.success());
}

#[test]
fn cli_presets_list_and_export() {
    let output = polyvox_bin().arg("presets").output().expect("failed to run polyvox presets");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for id in ["init", "brass", "sync_lead", "pad", "pluck_verb"] {
        assert!(stdout.contains(id), "listing should contain '{id}'");
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pad.toml");
    let output = polyvox_bin()
        .args(["presets", "--export", "pad"])
        .arg(&path)
        .output()
        .expect("failed to run polyvox presets --export");
    assert!(output.status.success());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("name = \"Pad\""));

    let output = polyvox_bin()
        .args(["presets", "--export", "theremin"])
        .arg(dir.path().join("x.toml"))
        .output()
        .expect("failed to run polyvox presets --export");
    assert!(!output.status.success());
}

#[test]
fn cli_render_writes_float_stereo_wav() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chord.wav");

    let output = polyvox_bin()
        .arg("render")
        .arg(&path)
        .args(["--preset", "brass", "--chord", "60,64,67", "--hold", "0.2", "--tail", "0.3"])
        .args(["--sample-rate", "22050", "--seed", "7"])
        .output()
        .expect("failed to run polyvox render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("peak"));
    assert!(stdout.contains("correlation"));

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.duration(), 11025);
}

#[test]
fn cli_render_is_reproducible_with_a_seed() {
    let dir = TempDir::new().unwrap();
    let render = |file: &str| {
        let path = dir.path().join(file);
        let status = polyvox_bin()
            .arg("render")
            .arg(&path)
            .args(["--preset", "pad", "--hold", "0.1", "--tail", "0.1", "--seed", "42"])
            .status()
            .expect("failed to run polyvox render");
        assert!(status.success());
        std::fs::read(path).unwrap()
    };
    assert_eq!(render("a.wav"), render("b.wav"));
}

#[test]
fn cli_render_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("x.wav");

    for args in [
        vec!["--preset", "no_such_preset"],
        vec!["--hold", "-1"],
        vec!["--note", "200"],
        vec!["--voices", "0"],
    ] {
        let output = polyvox_bin()
            .arg("render")
            .arg(&path)
            .args(&args)
            .output()
            .expect("failed to run polyvox render");
        assert!(!output.status.success(), "{:?} should fail", args);
    }
}
