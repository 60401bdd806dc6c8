//! In-memory sink that records what it is sent.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{validate_channel, validate_data, ConnectStatus, DeviceError, MidiSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentMessage {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    ProgramChange { channel: u8, program: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

/// Records every message. Clones share one log, so a test can keep a handle
/// while the device itself moves onto a playback thread.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    log: Arc<Mutex<Vec<SentMessage>>>,
    connected: bool,
    fail_after: Option<usize>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that is already connected.
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Fail with a backend error once `n` messages have been accepted.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SentMessage>> {
        // A panic while holding the lock leaves the log usable.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&mut self, message: SentMessage) -> Result<(), DeviceError> {
        if !self.connected {
            return Err(DeviceError::NotConnected);
        }
        let mut log = self.lock();
        if self.fail_after.is_some_and(|n| log.len() >= n) {
            return Err(DeviceError::Backend("simulated failure".to_string()));
        }
        log.push(message);
        Ok(())
    }
}

impl MidiSink for MemoryDevice {
    fn connect(&mut self) -> Result<ConnectStatus, DeviceError> {
        self.connected = true;
        Ok(ConnectStatus::Connected)
    }

    fn disconnect(&mut self) -> Result<ConnectStatus, DeviceError> {
        self.connected = false;
        Ok(ConnectStatus::Disconnected)
    }

    fn status(&self) -> ConnectStatus {
        if self.connected {
            ConnectStatus::Connected
        } else {
            ConnectStatus::Disconnected
        }
    }

    fn send_note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("pitch", pitch)?;
        validate_data("velocity", velocity)?;
        self.record(SentMessage::NoteOn {
            channel,
            pitch,
            velocity,
        })
    }

    fn send_note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("pitch", pitch)?;
        self.record(SentMessage::NoteOff {
            channel,
            pitch,
            velocity,
        })
    }

    fn send_program_change(&mut self, channel: u8, program: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("program", program)?;
        self.record(SentMessage::ProgramChange { channel, program })
    }

    fn send_control_change(
        &mut self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("control value", value)?;
        self.record(SentMessage::ControlChange {
            channel,
            controller,
            value,
        })
    }
}
