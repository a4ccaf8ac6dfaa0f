//! Lock-free control queue from any thread to the audio thread.
//!
//! Control threads hold a cloneable [`ControlHandle`]; the synth owns the
//! matching [`CommandReceiver`] (installed with
//! [`PolySynth::attach_control`](crate::PolySynth::attach_control)) and
//! drains it with `try_recv` at the top of every render call. Sends never
//! block: a full queue drops the command and reports
//! [`ControlError::QueueFull`].
//!
//! ```rust
//! use polyvox_synth::{ParamId, PolySynth, control_channel};
//!
//! let mut synth = PolySynth::new(44100.0, 4);
//! let (handle, receiver) = control_channel(64);
//! synth.attach_control(receiver);
//!
//! let remote = handle.clone();
//! std::thread::spawn(move || {
//!     remote.set_float(ParamId::VcfCutoff, 2400.0).ok();
//!     remote.note_on(60, 100).ok();
//! })
//! .join()
//! .ok();
//!
//! let mut buffer = [0.0f32; 256];
//! synth.render_interleaved(&mut buffer);
//! assert_eq!(synth.get_float(ParamId::VcfCutoff), Ok(2400.0));
//! assert_eq!(synth.active_voice_count(), 1);
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::params::ParamId;

/// One control event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SynthCommand {
    /// MIDI note-on, velocity 0..127.
    NoteOn {
        /// MIDI note number.
        note: u8,
        /// MIDI velocity.
        velocity: u8,
    },
    /// MIDI note-off.
    NoteOff {
        /// MIDI note number.
        note: u8,
    },
    /// Pitch bend, −1..1.
    PitchBend(f32),
    /// Mod wheel, 0..1.
    ModWheel(f32),
    /// Continuous parameter write.
    SetFloat(ParamId, f32),
    /// Stepped parameter write.
    SetInt(ParamId, i32),
    /// Write from a 0..1 control position, see
    /// [`PolySynth::set_normalized`](crate::PolySynth::set_normalized).
    SetNormalized(ParamId, f32),
    /// Release every voice.
    AllNotesOff,
}

/// Why a command was not queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlError {
    /// The queue is at capacity; the command was dropped.
    QueueFull,
    /// The synth side has been dropped.
    Disconnected,
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::QueueFull => write!(f, "control queue full"),
            ControlError::Disconnected => write!(f, "synth disconnected"),
        }
    }
}

impl std::error::Error for ControlError {}

/// Sending side of the control queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    tx: Sender<SynthCommand>,
}

/// Receiving side, owned by the synth.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<SynthCommand>,
}

/// Bounded queue holding up to `capacity` pending commands (at least 1).
pub fn control_channel(capacity: usize) -> (ControlHandle, CommandReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ControlHandle { tx }, CommandReceiver { rx })
}

impl ControlHandle {
    /// Queue any command without blocking.
    pub fn send(&self, command: SynthCommand) -> Result<(), ControlError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ControlError::QueueFull,
            TrySendError::Disconnected(_) => ControlError::Disconnected,
        })
    }

    /// Queue a note-on.
    pub fn note_on(&self, note: u8, velocity: u8) -> Result<(), ControlError> {
        self.send(SynthCommand::NoteOn { note, velocity })
    }

    /// Queue a note-off.
    pub fn note_off(&self, note: u8) -> Result<(), ControlError> {
        self.send(SynthCommand::NoteOff { note })
    }

    /// Queue a pitch-bend change.
    pub fn pitch_bend(&self, value: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::PitchBend(value))
    }

    /// Queue a mod-wheel change.
    pub fn mod_wheel(&self, value: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::ModWheel(value))
    }

    /// Queue a continuous parameter write.
    pub fn set_float(&self, id: ParamId, value: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::SetFloat(id, value))
    }

    /// Queue a stepped parameter write.
    pub fn set_int(&self, id: ParamId, value: i32) -> Result<(), ControlError> {
        self.send(SynthCommand::SetInt(id, value))
    }

    /// Queue a write from a 0..1 knob or fader position.
    pub fn set_normalized(&self, id: ParamId, normalized: f32) -> Result<(), ControlError> {
        self.send(SynthCommand::SetNormalized(id, normalized))
    }

    /// Queue an all-notes-off.
    pub fn all_notes_off(&self) -> Result<(), ControlError> {
        self.send(SynthCommand::AllNotesOff)
    }
}

impl CommandReceiver {
    /// Next pending command, if any. Never blocks.
    #[inline]
    pub fn try_next(&self) -> Option<SynthCommand> {
        self.rx.try_recv().ok()
    }

    /// Commands waiting in the queue.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (handle, rx) = control_channel(8);
        handle.note_on(60, 100).unwrap();
        handle.set_float(ParamId::VcfCutoff, 500.0).unwrap();
        handle.set_normalized(ParamId::ReverbMix, 0.5).unwrap();
        handle.note_off(60).unwrap();
        assert_eq!(rx.pending(), 4);
        assert_eq!(rx.try_next(), Some(SynthCommand::NoteOn { note: 60, velocity: 100 }));
        assert_eq!(rx.try_next(), Some(SynthCommand::SetFloat(ParamId::VcfCutoff, 500.0)));
        assert_eq!(rx.try_next(), Some(SynthCommand::SetNormalized(ParamId::ReverbMix, 0.5)));
        assert_eq!(rx.try_next(), Some(SynthCommand::NoteOff { note: 60 }));
        assert_eq!(rx.try_next(), None);
    }

    #[test]
    fn test_full_queue_drops() {
        let (handle, rx) = control_channel(2);
        handle.all_notes_off().unwrap();
        handle.pitch_bend(0.5).unwrap();
        assert_eq!(handle.mod_wheel(1.0), Err(ControlError::QueueFull));
        assert_eq!(rx.pending(), 2);
    }

    #[test]
    fn test_disconnected() {
        let (handle, rx) = control_channel(2);
        drop(rx);
        assert_eq!(handle.note_on(1, 1), Err(ControlError::Disconnected));
    }

    #[test]
    fn test_handle_is_send_and_clone() {
        fn assert_send<T: Send + Clone>() {}
        assert_send::<ControlHandle>();
    }
}
