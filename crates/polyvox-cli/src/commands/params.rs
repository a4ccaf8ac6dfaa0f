//! Parameter listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use polyvox_synth::{FilterType, LfoWaveform, ParamId, Waveform, WheelSource};

#[derive(Args)]
pub struct ParamsArgs {
    /// Only list parameters in this group (osc, mixer, filter, ...)
    #[arg(long, value_name = "NAME")]
    group: Option<String>,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let params: Vec<ParamId> = ParamId::ALL
        .iter()
        .copied()
        .filter(|id| args.group.as_deref().is_none_or(|g| id.group().eq_ignore_ascii_case(g)))
        .collect();

    if params.is_empty() {
        let mut groups: Vec<&str> = ParamId::ALL.iter().map(|id| id.group()).collect();
        groups.dedup();
        anyhow::bail!(
            "no parameters in group '{}'; groups are: {}",
            args.group.as_deref().unwrap_or_default(),
            groups.join(", ")
        );
    }

    println!(
        "  {:24}  {:10}  {:>10}  {:>10}  {:>10}  {}",
        "Name", "Group", "Min", "Max", "Default", "Unit/Values"
    );
    println!(
        "  {:24}  {:10}  {:>10}  {:>10}  {:>10}  {}",
        "----", "-----", "---", "---", "-------", "-----------"
    );
    for id in params {
        let d = id.descriptor();
        println!(
            "  {:24}  {:10}  {:>10}  {:>10}  {:>10}  {}",
            id.name(),
            d.group,
            format_value(d.min),
            format_value(d.max),
            format_value(id.default_value()),
            detail(id)
        );
    }

    if args.group.as_deref().is_none_or(|g| g.eq_ignore_ascii_case("osc")) {
        println!();
        println!(
            "Harmonic slots: osc1_harmonic_<n> and osc2_harmonic_<n>, n = 0..{}",
            polyvox_synth::MAX_HARMONICS - 1
        );
    }
    Ok(())
}

fn format_value(v: f32) -> String {
    if v.fract() == 0.0 && v.abs() < 1e6 {
        format!("{}", v as i64)
    } else {
        format!("{:.3}", v)
    }
}

/// Unit suffix for continuous parameters, choice names for enums.
fn detail(id: ParamId) -> String {
    fn names<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> String {
        all.iter().map(|&v| name(v)).collect::<Vec<_>>().join("|")
    }

    match id {
        ParamId::Waveform | ParamId::Osc1Waveform | ParamId::Osc2Waveform => {
            names(&Waveform::ALL, Waveform::name)
        }
        ParamId::FilterType => names(&FilterType::ALL, FilterType::name),
        ParamId::LfoWaveform => names(&LfoWaveform::ALL, LfoWaveform::name),
        ParamId::WheelSource => names(&WheelSource::ALL, WheelSource::name),
        _ if id.is_stepped() => "off|on".to_string(),
        _ => id.descriptor().unit.suffix().trim().to_string(),
    }
}
