//! Parameter metadata for discoverable synth parameters.
//!
//! A [`ParamDescriptor`] carries everything a front end needs to present or
//! validate a parameter: display name, stable string id, group, range,
//! default, unit, scaling curve and capability flags. Descriptors are plain
//! `const`-constructible data, so a whole table can live in a `static`.
//!
//! # Example
//!
//! ```rust
//! use polyvox_core::{ParamDescriptor, ParamScale, ParamUnit};
//!
//! const CUTOFF: ParamDescriptor =
//!     ParamDescriptor::new("Cutoff", "vcf_cutoff", "filter", 20.0, 20000.0, 1000.0)
//!         .with_unit(ParamUnit::Hertz)
//!         .with_scale(ParamScale::Logarithmic);
//!
//! assert_eq!(CUTOFF.clamp(5.0), 20.0);
//! assert!((CUTOFF.denormalize(CUTOFF.normalize(440.0)) - 440.0).abs() < 0.1);
//! ```

/// Scaling curve for parameter normalization.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping, for frequencies and times. Requires `min > 0`.
    Logarithmic,
}

/// Parameter capability flags.
///
/// ```rust
/// use polyvox_core::ParamFlags;
///
/// let flags = ParamFlags::NONE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!ParamFlags::default().contains(ParamFlags::STEPPED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Discrete values (integers, toggles, enums).
    pub const STEPPED: Self = Self(1 << 0);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamUnit {
    /// Hertz.
    Hertz,
    /// Seconds.
    Seconds,
    /// Cents (1/100 semitone).
    Cents,
    /// Semitones.
    Semitones,
    /// Dimensionless.
    #[default]
    None,
}

impl ParamUnit {
    /// Suffix for formatted values.
    ///
    /// ```rust
    /// use polyvox_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::Seconds => " s",
            ParamUnit::Cents => " ct",
            ParamUnit::Semitones => " st",
            ParamUnit::None => "",
        }
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name (e.g. "Cutoff").
    pub name: &'static str,
    /// Stable snake_case id used in presets and on the command line.
    pub string_id: &'static str,
    /// Section the parameter belongs to (e.g. "filter", "lfo").
    pub group: &'static str,
    /// Minimum accepted value.
    pub min: f32,
    /// Maximum accepted value.
    pub max: f32,
    /// Value after a reset.
    pub default: f32,
    /// Display unit.
    pub unit: ParamUnit,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Continuous, linear, unitless descriptor.
    pub const fn new(
        name: &'static str,
        string_id: &'static str,
        group: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            string_id,
            group,
            min,
            max,
            default,
            unit: ParamUnit::None,
            scale: ParamScale::Linear,
            flags: ParamFlags::NONE,
        }
    }

    /// Builder: set the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Builder: set the normalization curve.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: mark as discrete.
    pub const fn stepped(mut self) -> Self {
        self.flags = self.flags.union(ParamFlags::STEPPED);
        self
    }

    /// True for integer, toggle and enum parameters.
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamp a plain value to `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Plain value to the 0..1 range, respecting [`ParamScale`].
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let n = match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
        };
        n.clamp(0.0, 1.0)
    }

    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let n = normalized.clamp(0.0, 1.0);
        match self.scale {
            ParamScale::Linear => self.min + n * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, n)
            }
        }
    }
}
