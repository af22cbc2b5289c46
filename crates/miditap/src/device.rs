use std::sync::Arc;

/// Stable identifier for an open input endpoint, derived from its handle.
///
/// This is the only device reference ever exposed outside the registry.
pub type EndpointId = u32;

/// Identifier 0 is reserved: it doubles as the "queue empty" value in the
/// packed wire encoding and is never assigned to a live endpoint.
pub const RESERVED_ENDPOINT_ID: EndpointId = 0;

/// Opaque handle to one open input stream, allocated by the backend.
///
/// Owned exclusively by the registry from the moment open succeeds until
/// close is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    /// Wrap a raw backend handle value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw backend handle value.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Derive the stable endpoint identifier: the handle value truncated
    /// to 32 bits.
    pub fn endpoint_id(self) -> EndpointId {
        self.0 as EndpointId
    }
}

/// Callback invoked by the backend for every raw input event, supplying the
/// firing handle and the 24-bit message payload packed into a `u32`
/// (status in bits 0-7, data1 in 8-15, data2 in 16-23).
///
/// Fires on a thread the backend owns; implementations must not block
/// beyond a short critical section.
pub type RawEventCallback = Arc<dyn Fn(DeviceHandle, u32) + Send + Sync>;

/// Backend abstraction for platform specific MIDI device I/O.
pub trait MidiBackend: Send {
    /// Number of input devices currently enumerable.
    fn device_count(&self) -> usize;

    /// Open and start input device `port_index`, delivering raw events to
    /// `cb` until the handle is closed.
    fn open_input(&mut self, port_index: usize, cb: RawEventCallback)
        -> anyhow::Result<DeviceHandle>;

    /// Human readable name of an open device.
    fn device_name(&self, handle: DeviceHandle) -> anyhow::Result<String>;

    /// Close a previously opened input. Immediate and final.
    fn close_input(&mut self, handle: DeviceHandle);
}
