//! Shared modulation routing.
//!
//! Once per frame the synth steps its LFO and wheel-noise source, then folds
//! both through [`ModMatrix::compose`] into a [`ModBundle`] that every voice
//! reads by value. Voices never see the raw LFO.
//!
//! The mod wheel scales a selectable source (the LFO or noise) into the same
//! destinations as the LFO, with fixed full-scale ranges:
//!
//! | Destination | Full scale |
//! |-------------|-----------|
//! | VCO frequency | ±12 semitones |
//! | VCO pulse width | ±0.49 |
//! | VCF cutoff | ±2000 Hz |

/// Wheel full-scale pitch offset in semitones.
pub const WHEEL_FREQ_SEMITONES: f32 = 12.0;
/// Wheel full-scale pulse-width offset.
pub const WHEEL_PW_RANGE: f32 = 0.49;
/// Wheel full-scale cutoff offset in Hz.
pub const WHEEL_FILTER_HZ: f32 = 2000.0;

/// Per-frame modulation values handed to each voice.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModBundle {
    /// VCO-A pitch offset in semitones (LFO + wheel).
    pub osc1_freq: f32,
    /// VCO-B pitch offset in semitones (LFO + wheel).
    pub osc2_freq: f32,
    /// VCO-A PWM source (LFO), scaled by the oscillator's PWM depth.
    pub osc1_pw: f32,
    /// VCO-B PWM source (LFO).
    pub osc2_pw: f32,
    /// VCO-A pulse-width offset from the wheel.
    pub osc1_pw_wheel: f32,
    /// VCO-B pulse-width offset from the wheel.
    pub osc2_pw_wheel: f32,
    /// Cutoff offset in Hz (LFO + wheel).
    pub vcf_cutoff: f32,
}

/// Signal the mod wheel scales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WheelSource {
    /// The shared LFO.
    #[default]
    Lfo,
    /// Uniform white noise, one draw per frame.
    Noise,
}

impl WheelSource {
    /// Both sources in index order.
    pub const ALL: [WheelSource; 2] = [WheelSource::Lfo, WheelSource::Noise];

    /// Source for a stepped parameter value.
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(WheelSource::Lfo),
            1 => Some(WheelSource::Noise),
            _ => None,
        }
    }

    /// Stepped parameter value.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Preset name.
    pub fn name(self) -> &'static str {
        match self {
            WheelSource::Lfo => "lfo",
            WheelSource::Noise => "noise",
        }
    }

    /// Parse a preset name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// LFO depth per destination.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LfoRouting {
    /// Semitones at full LFO swing.
    pub to_osc1_freq: f32,
    /// Semitones at full LFO swing.
    pub to_osc2_freq: f32,
    /// 0..1
    pub to_osc1_pw: f32,
    /// 0..1
    pub to_osc2_pw: f32,
    /// Hz at full LFO swing.
    pub to_vcf_cutoff: f32,
}

/// Mod-wheel position, source and per-destination amounts (all 0..1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelRouting {
    /// Wheel position.
    pub value: f32,
    /// Signal being scaled.
    pub source: WheelSource,
    /// VCO-A pitch amount.
    pub to_freq_a: f32,
    /// VCO-B pitch amount.
    pub to_freq_b: f32,
    /// VCO-A pulse-width amount.
    pub to_pw_a: f32,
    /// VCO-B pulse-width amount.
    pub to_pw_b: f32,
    /// Cutoff amount.
    pub to_filter: f32,
}

/// LFO and wheel routing combined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModMatrix {
    /// LFO amounts.
    pub lfo: LfoRouting,
    /// Wheel settings.
    pub wheel: WheelRouting,
}

impl ModMatrix {
    /// Build this frame's bundle from one LFO sample and one noise sample.
    ///
    /// # Example
    ///
    /// ```rust
    /// use polyvox_synth::{ModMatrix, WheelSource};
    ///
    /// let mut matrix = ModMatrix::default();
    /// matrix.lfo.to_vcf_cutoff = 1000.0;
    /// matrix.wheel.value = 1.0;
    /// matrix.wheel.source = WheelSource::Noise;
    /// matrix.wheel.to_freq_a = 0.5;
    ///
    /// let bundle = matrix.compose(0.5, -1.0);
    /// assert_eq!(bundle.vcf_cutoff, 500.0);
    /// assert_eq!(bundle.osc1_freq, -6.0);
    /// ```
    #[inline]
    pub fn compose(&self, lfo_value: f32, noise_value: f32) -> ModBundle {
        let lfo = &self.lfo;
        let wheel = &self.wheel;
        let source = match wheel.source {
            WheelSource::Lfo => lfo_value,
            WheelSource::Noise => noise_value,
        };
        let w = source * wheel.value;

        ModBundle {
            osc1_freq: lfo_value * lfo.to_osc1_freq + w * wheel.to_freq_a * WHEEL_FREQ_SEMITONES,
            osc2_freq: lfo_value * lfo.to_osc2_freq + w * wheel.to_freq_b * WHEEL_FREQ_SEMITONES,
            osc1_pw: lfo_value * lfo.to_osc1_pw,
            osc2_pw: lfo_value * lfo.to_osc2_pw,
            osc1_pw_wheel: w * wheel.to_pw_a * WHEEL_PW_RANGE,
            osc2_pw_wheel: w * wheel.to_pw_b * WHEEL_PW_RANGE,
            vcf_cutoff: lfo_value * lfo.to_vcf_cutoff + w * wheel.to_filter * WHEEL_FILTER_HZ,
        }
    }
}
