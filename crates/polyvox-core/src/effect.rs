//! Stereo effect trait and the ordered effects chain.
//!
//! Effects are a narrow capability: process a stereo pair, carry an enabled
//! flag, clear state. The chain owns its effects as trait objects and hands
//! back typed [`EffectHandle`]s so callers can reach effect-specific setters
//! without guessing at indices or casting blindly.
//!
//! ## Design Decisions
//!
//! - **Stereo in, stereo out**: every effect sees both channels, which the
//!   decorrelated reverb needs.
//! - **Disabled means pass-through**: the chain skips disabled effects, so
//!   an effect never has to special-case its own bypass.
//! - **No allocations**: `process_stereo` and `reset` never allocate. Adding
//!   effects allocates and belongs on a control thread.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

use crate::delay::AllocError;

/// A stereo audio effect.
///
/// # Example
///
/// ```rust
/// use core::any::Any;
/// use polyvox_core::StereoEffect;
///
/// struct Swap {
///     enabled: bool,
/// }
///
/// impl StereoEffect for Swap {
///     fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
///         (right, left)
///     }
///     fn set_enabled(&mut self, enabled: bool) {
///         self.enabled = enabled;
///     }
///     fn is_enabled(&self) -> bool {
///         self.enabled
///     }
///     fn name(&self) -> &'static str {
///         "swap"
///     }
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait StereoEffect: Send + 'static {
    /// Process one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Enable or bypass the effect.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether the effect is currently processing.
    fn is_enabled(&self) -> bool;

    /// Clear internal state (delay lines, filters) without touching parameters.
    fn reset(&mut self) {}

    /// Rebuild sample-rate-dependent state.
    ///
    /// Called from a control thread. On failure the effect must keep its
    /// previous buffers and keep working at the old rate.
    fn try_set_sample_rate(&mut self, _sample_rate: f32) -> Result<(), AllocError> {
        Ok(())
    }

    /// Short identifier for logs and listings.
    fn name(&self) -> &'static str;

    /// Upcast for typed handle lookup.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed handle lookup.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Typed reference to an effect inside an [`EffectChain`].
///
/// Returned by [`EffectChain::add`]. Lookups through a handle return `None`
/// once the chain has been cleared or the slot holds a different type.
pub struct EffectHandle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EffectHandle<T> {
    /// Position of the effect in the chain.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for EffectHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EffectHandle<T> {}

impl<T> core::fmt::Debug for EffectHandle<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("index", &self.index)
            .finish()
    }
}

impl<T> PartialEq for EffectHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for EffectHandle<T> {}

/// Ordered sequence of stereo effects.
///
/// # Example
///
/// ```rust
/// # use core::any::Any;
/// # use polyvox_core::{EffectChain, StereoEffect};
/// # struct Gain { gain: f32, enabled: bool }
/// # impl StereoEffect for Gain {
/// #     fn process_stereo(&mut self, l: f32, r: f32) -> (f32, f32) { (l * self.gain, r * self.gain) }
/// #     fn set_enabled(&mut self, e: bool) { self.enabled = e; }
/// #     fn is_enabled(&self) -> bool { self.enabled }
/// #     fn name(&self) -> &'static str { "gain" }
/// #     fn as_any(&self) -> &dyn Any { self }
/// #     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// # }
/// let mut chain = EffectChain::new();
/// let gain = chain.add(Gain { gain: 0.5, enabled: true });
///
/// assert_eq!(chain.process_stereo(1.0, 1.0), (0.5, 0.5));
///
/// if let Some(g) = chain.get_mut(gain) {
///     g.gain = 2.0;
/// }
/// assert_eq!(chain.process_stereo(1.0, 1.0), (2.0, 2.0));
/// ```
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn StereoEffect>>,
}

impl core::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.effects.iter().map(|e| (e.name(), e.is_enabled())))
            .finish()
    }
}

impl EffectChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Append an effect and return a typed handle to it.
    pub fn add<T: StereoEffect>(&mut self, effect: T) -> EffectHandle<T> {
        #[cfg(feature = "tracing")]
        tracing::debug!(effect = effect.name(), index = self.effects.len(), "effect added");
        self.effects.push(Box::new(effect));
        EffectHandle {
            index: self.effects.len() - 1,
            _marker: PhantomData,
        }
    }

    /// Append an already boxed effect; returns its index.
    pub fn add_boxed(&mut self, effect: Box<dyn StereoEffect>) -> usize {
        self.effects.push(effect);
        self.effects.len() - 1
    }

    /// Remove every effect. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(count = self.effects.len(), "effects cleared");
        self.effects.clear();
    }

    /// Keep the first `len` effects and drop the rest. Handles to dropped
    /// slots stop resolving.
    pub fn truncate(&mut self, len: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.effects.len(), to = len, "effects truncated");
        self.effects.truncate(len);
    }

    /// Number of effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when the chain holds no effects.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Typed shared access.
    pub fn get<T: StereoEffect>(&self, handle: EffectHandle<T>) -> Option<&T> {
        self.effects
            .get(handle.index)
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    /// Typed mutable access.
    pub fn get_mut<T: StereoEffect>(&mut self, handle: EffectHandle<T>) -> Option<&mut T> {
        self.effects
            .get_mut(handle.index)
            .and_then(|e| e.as_any_mut().downcast_mut::<T>())
    }

    /// Untyped access by index.
    pub fn get_dyn(&self, index: usize) -> Option<&dyn StereoEffect> {
        self.effects.get(index).map(|e| &**e)
    }

    /// Enable or bypass the effect at `index`. Returns false if out of range.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.effects.get_mut(index) {
            Some(effect) => {
                effect.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Run a frame through every enabled effect in order.
    #[inline]
    pub fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut frame = (left, right);
        for effect in &mut self.effects {
            if effect.is_enabled() {
                frame = effect.process_stereo(frame.0, frame.1);
            }
        }
        frame
    }

    /// Reset every effect's internal state.
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Forward a sample-rate change to every effect, stopping at the first
    /// failure. Effects already updated keep the new rate.
    pub fn try_set_sample_rate(&mut self, sample_rate: f32) -> Result<(), AllocError> {
        for effect in &mut self.effects {
            effect.try_set_sample_rate(sample_rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain {
        gain: f32,
        enabled: bool,
        resets: u32,
    }

    impl Gain {
        fn new(gain: f32) -> Self {
            Self {
                gain,
                enabled: true,
                resets: 0,
            }
        }
    }

    impl StereoEffect for Gain {
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left * self.gain, right * self.gain)
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn reset(&mut self) {
            self.resets += 1;
        }
        fn name(&self) -> &'static str {
            "gain"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Offset {
        enabled: bool,
    }

    impl StereoEffect for Offset {
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left + 1.0, right - 1.0)
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn name(&self) -> &'static str {
            "offset"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_chain_order() {
        let mut chain = EffectChain::new();
        chain.add(Gain::new(2.0));
        chain.add(Offset { enabled: true });
        // (1·2 + 1, 1·2 − 1)
        assert_eq!(chain.process_stereo(1.0, 1.0), (3.0, 1.0));
    }

    #[test]
    fn test_disabled_effect_passes_through() {
        let mut chain = EffectChain::new();
        let gain = chain.add(Gain::new(0.0));
        assert!(chain.set_enabled(gain.index(), false));
        assert_eq!(chain.process_stereo(0.3, -0.7), (0.3, -0.7));
        assert!(!chain.set_enabled(5, true));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = EffectChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.process_stereo(0.25, 0.5), (0.25, 0.5));
    }

    #[test]
    fn test_typed_handles() {
        let mut chain = EffectChain::new();
        let gain = chain.add(Gain::new(1.0));
        let offset = chain.add(Offset { enabled: true });

        if let Some(g) = chain.get_mut(gain) {
            g.gain = 0.5;
        }
        assert_eq!(chain.get(gain).map(|g| g.gain), Some(0.5));
        assert!(chain.get(offset).is_some());

        // A handle of the wrong type for the slot never resolves
        let wrong: EffectHandle<Offset> = EffectHandle {
            index: gain.index(),
            _marker: PhantomData,
        };
        assert!(chain.get(wrong).is_none());
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut chain = EffectChain::new();
        let gain = chain.add(Gain::new(1.0));
        chain.clear();
        assert_eq!(chain.len(), 0);
        assert!(chain.get(gain).is_none());
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        let mut chain = EffectChain::new();
        let first = chain.add(Gain::new(2.0));
        let second = chain.add(Offset { enabled: true });
        chain.truncate(1);
        assert_eq!(chain.len(), 1);
        assert!(chain.get(first).is_some());
        assert!(chain.get(second).is_none());
        assert_eq!(chain.process_stereo(1.0, 1.0), (2.0, 2.0));
    }

    #[test]
    fn test_reset_reaches_every_effect() {
        let mut chain = EffectChain::new();
        let a = chain.add(Gain::new(1.0));
        let b = chain.add(Gain::new(1.0));
        chain.reset();
        assert_eq!(chain.get(a).map(|g| g.resets), Some(1));
        assert_eq!(chain.get(b).map(|g| g.resets), Some(1));
    }
}
