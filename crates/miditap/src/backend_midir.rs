use std::collections::HashMap;

use anyhow::Context;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::debug;

use crate::device::{DeviceHandle, MidiBackend, RawEventCallback};
use crate::MidiError;

/// Backend implemented using the `midir` crate (ALSA, CoreMIDI, WinMM).
///
/// Handles are allocated from a counter starting at 1, so the derived
/// endpoint identifiers never hit the reserved value 0 before 2^32 opens.
pub struct MidirBackend {
    client_name: String,
    next_handle: u64,
    connections: HashMap<DeviceHandle, OpenInput>,
}

struct OpenInput {
    name: String,
    _connection: MidiInputConnection<()>,
}

impl MidirBackend {
    /// Create a backend announcing `client_name` to the platform MIDI
    /// service.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            next_handle: 1,
            connections: HashMap::new(),
        }
    }

    fn allocate_handle(&mut self) -> DeviceHandle {
        let handle = DeviceHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        Self::new("miditap")
    }
}

impl MidiBackend for MidirBackend {
    fn device_count(&self) -> usize {
        match MidiInput::new(&self.client_name) {
            Ok(input) => input.ports().len(),
            Err(err) => {
                debug!(?err, "failed to initialise midir for enumeration");
                0
            }
        }
    }

    fn open_input(
        &mut self,
        port_index: usize,
        cb: RawEventCallback,
    ) -> anyhow::Result<DeviceHandle> {
        let mut input = MidiInput::new(&self.client_name).context("initialise midir for input")?;
        input.ignore(Ignore::None);
        let ports: Vec<MidiInputPort> = input.ports();
        let Some(port) = ports.get(port_index) else {
            return Err(MidiError::PortOutOfRange(port_index).into());
        };
        let name = input
            .port_name(port)
            .unwrap_or_else(|_| format!("Port {port_index}"));
        let handle = self.allocate_handle();
        let connection = input
            .connect(
                port,
                "miditap-input",
                move |_timestamp, message, _| {
                    // Short messages only; SysEx and longer payloads have
                    // no place in the 32-bit raw layout.
                    if message.is_empty() || message.len() > 3 {
                        return;
                    }
                    let mut raw = message[0] as u32;
                    if let Some(byte) = message.get(1) {
                        raw |= (*byte as u32) << 8;
                    }
                    if let Some(byte) = message.get(2) {
                        raw |= (*byte as u32) << 16;
                    }
                    cb(handle, raw);
                },
                (),
            )
            .map_err(|err| MidiError::Backend(format!("failed to connect MIDI input: {err}")))?;
        self.connections.insert(
            handle,
            OpenInput {
                name,
                _connection: connection,
            },
        );
        Ok(handle)
    }

    fn device_name(&self, handle: DeviceHandle) -> anyhow::Result<String> {
        self.connections
            .get(&handle)
            .map(|open| open.name.clone())
            .ok_or_else(|| MidiError::UnknownHandle.into())
    }

    fn close_input(&mut self, handle: DeviceHandle) {
        self.connections.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Hardware-free checks only; actual port availability depends on the
    // system running the tests.
    #[test]
    fn unknown_handle_has_no_name() {
        let backend = MidirBackend::default();
        assert!(backend.device_name(DeviceHandle::new(1)).is_err());
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let mut backend = MidirBackend::new("miditap-test");
        let cb: RawEventCallback = Arc::new(|_, _| {});
        assert!(backend.open_input(usize::MAX, cb).is_err());
    }

    #[test]
    fn close_of_unknown_handle_is_a_noop() {
        let mut backend = MidirBackend::default();
        backend.close_input(DeviceHandle::new(7));
    }
}
