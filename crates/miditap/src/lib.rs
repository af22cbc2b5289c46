//! Real-time MIDI input aggregation: opens every input endpoint the host
//! exposes, collects incoming messages on the driver's thread, and hands
//! them to a polling consumer through a shared FIFO keyed by stable
//! endpoint identifiers.

use thiserror::Error;

pub mod backend_midir;
pub mod config;
pub mod device;
pub mod message;
pub mod queue;
pub mod registry;
pub mod session;

pub use device::{DeviceHandle, EndpointId, MidiBackend, RawEventCallback};
pub use message::MidiMessage;
pub use registry::{DeviceRecord, DeviceRegistry};
pub use session::MidiSession;

/// Errors that can be produced while dealing with MIDI backends.
#[derive(Debug, Error)]
pub enum MidiError {
    /// The requested port index does not name an enumerable device.
    #[error("MIDI port index {0} out of range")]
    PortOutOfRange(usize),
    /// The handle does not correspond to an open device.
    #[error("unknown MIDI device handle")]
    UnknownHandle,
    /// Backend specific failure with additional context.
    #[error("backend error: {0}")]
    Backend(String),
}
