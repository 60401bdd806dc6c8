//! MIDI output through `midir`.

use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{info, warn};

use super::{validate_channel, validate_data, ConnectStatus, DeviceError, MidiSink};

const CLIENT_NAME: &str = "catrock";

/// A hardware or virtual MIDI output port.
///
/// The port is chosen on [`connect`](MidiSink::connect): the first port whose
/// name contains `device_name`, or the first port when no name is given.
///
/// The `midir` client is created up front. While connected it lives inside
/// the connection and comes back when the connection closes; if it could not
/// be created at all the device stays uninitialized.
pub struct MidiOutputDevice {
    device_name: Option<String>,
    client: Option<MidiOutput>,
    connection: Option<MidiOutputConnection>,
    port_name: Option<String>,
}

impl MidiOutputDevice {
    pub fn new(device_name: Option<String>) -> Self {
        let client = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| warn!(error = %e, "MIDI backend unavailable"))
            .ok();
        Self {
            device_name,
            client,
            connection: None,
            port_name: None,
        }
    }

    /// Whether the MIDI backend could be opened.
    pub fn is_initialized(&self) -> bool {
        self.client.is_some() || self.connection.is_some()
    }

    /// Name of the connected port.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Names of all MIDI output ports.
    pub fn list_devices() -> Vec<String> {
        let Ok(midi_out) = MidiOutput::new("catrock-list") else {
            return Vec::new();
        };
        midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect()
    }

    fn select_port(&self, midi_out: &MidiOutput) -> Result<(MidiOutputPort, String), DeviceError> {
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(DeviceError::NoPorts);
        }
        match self.device_name.as_deref() {
            Some(filter) => ports
                .iter()
                .find_map(|p| {
                    let name = midi_out.port_name(p).unwrap_or_default();
                    name.contains(filter).then(|| (p.clone(), name))
                })
                .ok_or_else(|| DeviceError::PortNotFound(filter.to_string())),
            None => {
                let p = ports[0].clone();
                let name = midi_out
                    .port_name(&p)
                    .unwrap_or_else(|_| "unknown".to_string());
                Ok((p, name))
            }
        }
    }

    fn send(&mut self, message: &[u8]) -> Result<(), DeviceError> {
        if !self.is_initialized() {
            return Err(DeviceError::Uninitialized);
        }
        let connection = self.connection.as_mut().ok_or(DeviceError::NotConnected)?;
        connection
            .send(message)
            .map_err(|e| DeviceError::Backend(format!("send: {e}")))
    }
}

impl MidiSink for MidiOutputDevice {
    fn connect(&mut self) -> Result<ConnectStatus, DeviceError> {
        if self.connection.is_some() {
            return Ok(ConnectStatus::Connected);
        }

        let midi_out = self.client.take().ok_or(DeviceError::Uninitialized)?;
        let (port, port_name) = match self.select_port(&midi_out) {
            Ok(selected) => selected,
            Err(e) => {
                self.client = Some(midi_out);
                return Err(e);
            }
        };

        let connection = match midi_out.connect(&port, "catrock-output") {
            Ok(connection) => connection,
            Err(e) => {
                let message = format!("connect: {e}");
                self.client = Some(e.into_inner());
                return Err(DeviceError::Backend(message));
            }
        };
        info!(port = %port_name, "MIDI output connected");

        self.connection = Some(connection);
        self.port_name = Some(port_name);
        Ok(ConnectStatus::Connected)
    }

    fn disconnect(&mut self) -> Result<ConnectStatus, DeviceError> {
        if let Some(connection) = self.connection.take() {
            self.client = Some(connection.close());
            info!(port = self.port_name.as_deref().unwrap_or("unknown"), "MIDI output disconnected");
        }
        self.port_name = None;
        Ok(ConnectStatus::Disconnected)
    }

    fn status(&self) -> ConnectStatus {
        if self.connection.is_some() {
            ConnectStatus::Connected
        } else {
            ConnectStatus::Disconnected
        }
    }

    fn send_note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("pitch", pitch)?;
        validate_data("velocity", velocity)?;
        self.send(&[0x90 | channel, pitch, velocity])
    }

    fn send_note_off(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("pitch", pitch)?;
        validate_data("velocity", velocity)?;
        self.send(&[0x80 | channel, pitch, velocity])
    }

    fn send_program_change(&mut self, channel: u8, program: u8) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("program", program)?;
        self.send(&[0xC0 | channel, program])
    }

    fn send_control_change(
        &mut self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), DeviceError> {
        validate_channel(channel)?;
        validate_data("controller", controller)?;
        validate_data("control value", value)?;
        self.send(&[0xB0 | channel, controller, value])
    }
}

impl Drop for MidiOutputDevice {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_devices_does_not_panic() {
        // May be empty without a MIDI backend.
        let _ = MidiOutputDevice::list_devices();
    }

    #[test]
    fn sending_before_connect_fails() {
        let mut device = MidiOutputDevice::new(None);
        assert_eq!(device.status(), ConnectStatus::Disconnected);
        let expected = if device.is_initialized() {
            DeviceError::NotConnected
        } else {
            DeviceError::Uninitialized
        };
        let err = device.send_note_on(0, 60, 100).unwrap_err();
        assert_eq!(err.to_string(), expected.to_string());
    }

    #[test]
    fn device_without_backend_is_uninitialized() {
        let mut device = MidiOutputDevice {
            device_name: None,
            client: None,
            connection: None,
            port_name: None,
        };
        assert!(!device.is_initialized());
        assert!(matches!(device.connect(), Err(DeviceError::Uninitialized)));
        assert!(matches!(
            device.send_note_off(0, 60, 0),
            Err(DeviceError::Uninitialized)
        ));
        assert_eq!(device.disconnect().unwrap(), ConnectStatus::Disconnected);
    }

    #[test]
    fn channel_is_checked_before_connection() {
        let mut device = MidiOutputDevice::new(None);
        assert!(matches!(
            device.send_program_change(16, 0),
            Err(DeviceError::InvalidChannel(16))
        ));
    }
}
