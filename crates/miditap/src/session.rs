use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::device::{DeviceHandle, EndpointId, MidiBackend, RawEventCallback};
use crate::message::MidiMessage;
use crate::queue::IngestQueue;
use crate::registry::{DeviceRecord, DeviceRegistry};

/// Name returned for identifiers that do not match an open endpoint.
pub const UNKNOWN_ENDPOINT_NAME: &str = "unknown";

/// Registry and queue form one shared-resource group: every mutation and
/// every read that must be consistent with one happens under this single
/// lock. Backend callbacks acquire it for the enqueue path only.
#[derive(Debug, Default)]
struct SessionState {
    registry: DeviceRegistry,
    queue: IngestQueue,
}

/// Owned aggregation context tying the backend, registry and queue to one
/// host session. Dropping the session closes every open device.
///
/// Lifecycle operations (open/close/refresh) serialize on the backend
/// lock, so concurrent refreshes run one after the other. Devices are
/// closed before their registry entry is removed, mirroring the order the
/// platform layer expects; a callback that fires for a handle mid-close
/// misses the registry lookup and the event is dropped.
pub struct MidiSession<B: MidiBackend> {
    backend: Mutex<B>,
    state: Arc<Mutex<SessionState>>,
}

impl<B: MidiBackend> MidiSession<B> {
    /// Create a session owning the given backend. No devices are opened
    /// until [`open_all`](Self::open_all) or [`refresh`](Self::refresh).
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Callback adapter handed to the backend for each opened device.
    ///
    /// Runs on a thread the backend owns; its only permitted action is
    /// "look up and enqueue under the lock". Unknown handles mean a close
    /// raced this event and it is silently dropped.
    fn ingest_callback(&self) -> RawEventCallback {
        let state = Arc::clone(&self.state);
        Arc::new(move |handle, raw| {
            let mut st = state.lock();
            let Some(endpoint) = st.registry.endpoint_for(handle) else {
                return;
            };
            st.queue.enqueue(MidiMessage::from_raw(endpoint, raw));
        })
    }

    /// Open and start device `port_index`, registering it on success.
    ///
    /// Every failure (open, name query, identifier clash) degrades to
    /// "device not registered": the handle is closed, nothing is recorded
    /// and no error is surfaced.
    pub fn open_device(&self, port_index: usize) -> Option<EndpointId> {
        let mut backend = self.backend.lock();
        self.open_device_locked(&mut backend, port_index)
    }

    fn open_device_locked(&self, backend: &mut B, port_index: usize) -> Option<EndpointId> {
        let handle = match backend.open_input(port_index, self.ingest_callback()) {
            Ok(handle) => handle,
            Err(err) => {
                debug!(?err, port_index, "failed to open MIDI input");
                return None;
            }
        };
        let name = match backend.device_name(handle) {
            Ok(name) => name,
            Err(err) => {
                debug!(?err, port_index, "failed to query MIDI device name");
                backend.close_input(handle);
                return None;
            }
        };
        let endpoint = handle.endpoint_id();
        let registered = self.state.lock().registry.insert(DeviceRecord {
            handle,
            port_index,
            endpoint,
            name,
        });
        if !registered {
            warn!(
                handle = handle.raw(),
                endpoint, "endpoint identifier reserved or in use, skipping device"
            );
            backend.close_input(handle);
            return None;
        }
        debug!(endpoint, port_index, "opened MIDI input");
        Some(endpoint)
    }

    /// Close one device and drop it from the registry. Unknown handles are
    /// tolerated as a no-op.
    pub fn close_device(&self, handle: DeviceHandle) {
        let mut backend = self.backend.lock();
        self.close_device_locked(&mut backend, handle);
    }

    fn close_device_locked(&self, backend: &mut B, handle: DeviceHandle) {
        // Close before touching the state lock: a backend that joins its
        // callback thread on close must not wait on a thread that is
        // itself waiting for a lock we hold.
        backend.close_input(handle);
        self.state.lock().registry.remove(handle);
    }

    /// Open every currently enumerable device in increasing logical index
    /// order, tolerating individual failures. Returns the number of
    /// devices registered by this call.
    pub fn open_all(&self) -> usize {
        let mut backend = self.backend.lock();
        self.open_all_locked(&mut backend)
    }

    fn open_all_locked(&self, backend: &mut B) -> usize {
        let count = backend.device_count();
        (0..count)
            .filter(|index| self.open_device_locked(backend, *index).is_some())
            .count()
    }

    /// Close every active device, leaving the registry empty.
    pub fn close_all(&self) {
        let mut backend = self.backend.lock();
        self.close_all_locked(&mut backend);
    }

    fn close_all_locked(&self, backend: &mut B) {
        let handles = self.state.lock().registry.active_handles();
        for handle in handles {
            self.close_device_locked(backend, handle);
        }
    }

    /// Force-close all devices and reopen everything currently
    /// enumerable, returning the new active count. Concurrent refreshes
    /// serialize on the backend lock rather than merging.
    pub fn refresh(&self) -> usize {
        let mut backend = self.backend.lock();
        self.close_all_locked(&mut backend);
        let count = self.open_all_locked(&mut backend);
        debug!(count, "refreshed MIDI endpoints");
        count
    }

    /// Current number of open endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// Endpoint identifier at `index` in enumeration order, or `None`
    /// when out of range. The index is positional into the active set at
    /// call time and not stable across open/close.
    pub fn endpoint_at(&self, index: usize) -> Option<EndpointId> {
        self.state.lock().registry.endpoint_at(index)
    }

    /// Display name of an endpoint, or the `"unknown"` sentinel when the
    /// identifier does not match an open device.
    pub fn endpoint_name(&self, endpoint: EndpointId) -> String {
        self.state
            .lock()
            .registry
            .record_for_endpoint(endpoint)
            .map(|record| record.name.clone())
            .unwrap_or_else(|| UNKNOWN_ENDPOINT_NAME.to_owned())
    }

    /// Remove and return the oldest queued message. Empty-check and pop
    /// happen under one lock acquisition.
    pub fn dequeue(&self) -> Option<MidiMessage> {
        self.state.lock().queue.dequeue()
    }

    /// Wire form of [`dequeue`](Self::dequeue): the packed 64-bit
    /// encoding, or exactly 0 when the queue is empty.
    pub fn dequeue_packed(&self) -> u64 {
        self.dequeue().map(|message| message.packed()).unwrap_or(0)
    }
}

impl<B: MidiBackend> Drop for MidiSession<B> {
    fn drop(&mut self) {
        self.close_all();
    }
}
