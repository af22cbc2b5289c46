use std::collections::HashMap;

use crate::device::{DeviceHandle, EndpointId, RESERVED_ENDPOINT_ID};

/// Metadata for one open device, created when open succeeds and destroyed
/// on close.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    /// Backend handle for the open input stream.
    pub handle: DeviceHandle,
    /// Logical device index as enumerated at open time.
    pub port_index: usize,
    /// Stable identifier derived from the handle.
    pub endpoint: EndpointId,
    /// Cached display name fetched at open time.
    pub name: String,
}

/// Bookkeeping for the set of currently-open devices.
///
/// Maintains three lock-step views: handle to record, endpoint identifier
/// to handle, and the ordered active list that defines enumeration order
/// (insertion order, not OS index order). All three are mutated together;
/// callers provide the critical section.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    by_handle: HashMap<DeviceHandle, DeviceRecord>,
    by_endpoint: HashMap<EndpointId, DeviceHandle>,
    active: Vec<DeviceHandle>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened device across all views.
    ///
    /// Returns `false` without registering anything when the record's
    /// endpoint identifier is the reserved value 0 or already belongs to
    /// an open device; the caller is expected to close the handle.
    pub fn insert(&mut self, record: DeviceRecord) -> bool {
        if record.endpoint == RESERVED_ENDPOINT_ID
            || self.by_endpoint.contains_key(&record.endpoint)
        {
            return false;
        }
        self.by_endpoint.insert(record.endpoint, record.handle);
        self.active.push(record.handle);
        self.by_handle.insert(record.handle, record);
        true
    }

    /// Remove a device from all views, returning its record. Absent
    /// handles are a no-op.
    pub fn remove(&mut self, handle: DeviceHandle) -> Option<DeviceRecord> {
        let record = self.by_handle.remove(&handle)?;
        self.by_endpoint.remove(&record.endpoint);
        self.active.retain(|h| *h != handle);
        Some(record)
    }

    /// Endpoint identifier for an open handle.
    pub fn endpoint_for(&self, handle: DeviceHandle) -> Option<EndpointId> {
        self.by_handle.get(&handle).map(|record| record.endpoint)
    }

    /// Record for an open endpoint identifier.
    pub fn record_for_endpoint(&self, endpoint: EndpointId) -> Option<&DeviceRecord> {
        let handle = self.by_endpoint.get(&endpoint)?;
        self.by_handle.get(handle)
    }

    /// Positional lookup into the active list. Out-of-range indices return
    /// `None`.
    pub fn endpoint_at(&self, index: usize) -> Option<EndpointId> {
        let handle = self.active.get(index)?;
        self.endpoint_for(*handle)
    }

    /// Snapshot of the active handles in enumeration order.
    pub fn active_handles(&self) -> Vec<DeviceHandle> {
        self.active.clone()
    }

    /// Number of open devices.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no device is open.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(handle: u64, port_index: usize) -> DeviceRecord {
        let handle = DeviceHandle::new(handle);
        DeviceRecord {
            handle,
            port_index,
            endpoint: handle.endpoint_id(),
            name: format!("Device {port_index}"),
        }
    }

    fn assert_views_consistent(registry: &DeviceRegistry) {
        assert_eq!(registry.by_handle.len(), registry.by_endpoint.len());
        assert_eq!(registry.by_handle.len(), registry.active.len());
        for (handle, rec) in &registry.by_handle {
            assert_eq!(registry.by_endpoint.get(&rec.endpoint), Some(handle));
            assert!(registry.active.contains(handle));
        }
    }

    #[test]
    fn views_stay_in_lock_step() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.insert(record(1, 0)));
        assert_views_consistent(&registry);
        assert!(registry.insert(record(2, 1)));
        assert!(registry.insert(record(3, 2)));
        assert_views_consistent(&registry);

        registry.remove(DeviceHandle::new(2));
        assert_views_consistent(&registry);
        assert_eq!(registry.len(), 2);

        registry.remove(DeviceHandle::new(1));
        registry.remove(DeviceHandle::new(3));
        assert_views_consistent(&registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn enumeration_follows_insertion_order() {
        let mut registry = DeviceRegistry::new();
        registry.insert(record(7, 2));
        registry.insert(record(3, 0));
        registry.insert(record(5, 1));
        assert_eq!(registry.endpoint_at(0), Some(7));
        assert_eq!(registry.endpoint_at(1), Some(3));
        assert_eq!(registry.endpoint_at(2), Some(5));
        assert_eq!(registry.endpoint_at(3), None);
    }

    #[test]
    fn remove_absent_handle_is_a_noop() {
        let mut registry = DeviceRegistry::new();
        registry.insert(record(1, 0));
        assert!(registry.remove(DeviceHandle::new(99)).is_none());
        assert_eq!(registry.len(), 1);
        assert_views_consistent(&registry);
    }

    #[test]
    fn reserved_endpoint_is_rejected() {
        let mut registry = DeviceRegistry::new();
        // 2^32 truncates to endpoint id 0.
        assert!(!registry.insert(record(0x1_0000_0000, 0)));
        assert!(registry.is_empty());
    }

    #[test]
    fn colliding_endpoint_is_rejected() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.insert(record(1, 0)));
        // 2^32 + 1 truncates to the same endpoint id as handle 1.
        assert!(!registry.insert(record(0x1_0000_0001, 1)));
        assert_eq!(registry.len(), 1);
        assert_views_consistent(&registry);
    }

    #[test]
    fn lookups_resolve_records() {
        let mut registry = DeviceRegistry::new();
        registry.insert(record(42, 0));
        let handle = DeviceHandle::new(42);
        assert_eq!(registry.endpoint_for(handle), Some(42));
        let rec = registry.record_for_endpoint(42).unwrap();
        assert_eq!(rec.name, "Device 0");
        assert_eq!(rec.port_index, 0);
        assert!(registry.record_for_endpoint(43).is_none());
        assert_eq!(registry.endpoint_for(DeviceHandle::new(43)), None);
    }
}
