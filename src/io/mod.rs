//! Output devices — the boundary between the play engine and whatever
//! turns events into sound.

pub mod memory;
pub mod midi;

use std::fmt;

use thiserror::Error;

pub use memory::{MemoryDevice, SentMessage};
pub use midi::MidiOutputDevice;

/// Highest MIDI channel number (channels are 0-based).
pub const MAX_CHANNEL: u8 = 15;

/// Controller number for channel volume.
pub const CC_VOLUME: u8 = 7;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device is not connected")]
    NotConnected,
    #[error("device sender is not initialized")]
    Uninitialized,
    #[error("invalid MIDI channel {0} (expected 0-{MAX_CHANNEL})")]
    InvalidChannel(u8),
    #[error("invalid {what} {value} (expected 0-127)")]
    InvalidData { what: &'static str, value: u8 },
    #[error("no MIDI output ports available")]
    NoPorts,
    #[error("MIDI output matching '{0}' not found")]
    PortNotFound(String),
    #[error("MIDI backend: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectStatus::Connected => "connected",
            ConnectStatus::Disconnected => "disconnected",
        })
    }
}

/// A MIDI-speaking output. Implementations validate channels and data bytes
/// and refuse to send while disconnected.
///
/// One sink belongs to one playback loop at a time.
pub trait MidiSink: Send {
    fn connect(&mut self) -> Result<ConnectStatus, DeviceError>;

    fn disconnect(&mut self) -> Result<ConnectStatus, DeviceError>;

    fn status(&self) -> ConnectStatus;

    fn send_note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError>;

    fn send_note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError>;

    fn send_program_change(&mut self, channel: u8, program: u8) -> Result<(), DeviceError>;

    fn send_control_change(
        &mut self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), DeviceError>;

    fn is_connected(&self) -> bool {
        self.status() == ConnectStatus::Connected
    }
}

pub fn validate_channel(channel: u8) -> Result<(), DeviceError> {
    if channel > MAX_CHANNEL {
        return Err(DeviceError::InvalidChannel(channel));
    }
    Ok(())
}

pub fn validate_data(what: &'static str, value: u8) -> Result<(), DeviceError> {
    if value > 127 {
        return Err(DeviceError::InvalidData { what, value });
    }
    Ok(())
}
