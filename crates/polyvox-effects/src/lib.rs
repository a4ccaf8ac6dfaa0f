//! Polyvox Effects - stereo effects for the polyvox synthesizer
//!
//! Effects implement [`polyvox_core::StereoEffect`] so they can sit in the
//! synth's [`EffectChain`](polyvox_core::EffectChain):
//!
//! - [`Reverb`] - Stereo Schroeder reverb with RT60-derived comb feedback
//!
//! ## Example
//!
//! ```rust
//! use polyvox_core::EffectChain;
//! use polyvox_effects::Reverb;
//!
//! let mut chain = EffectChain::new();
//! let reverb = chain.add(Reverb::new(44100.0));
//!
//! if let Some(r) = chain.get_mut(reverb) {
//!     r.set_rt60(2.5);
//!     r.set_mix(0.4);
//! }
//!
//! let (l, r) = chain.process_stereo(0.5, 0.5);
//! assert!(l.is_finite() && r.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod reverb;

pub use reverb::{RT60_RANGE, Reverb};
