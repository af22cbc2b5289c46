//! C ABI surface over a process-wide [`MidiSession`], for host
//! applications that poll the aggregator across a foreign-function
//! boundary. The packed `u64` values returned by
//! [`MiditapDequeueIncomingData`] follow the canonical wire encoding,
//! with 0 meaning "queue empty".

use std::ffi::CString;
use std::os::raw::c_char;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use miditap::backend_midir::MidirBackend;
use miditap::{config, MidiSession};

static SESSION: Lazy<MidiSession<MidirBackend>> = Lazy::new(|| {
    let settings = config::load();
    MidiSession::new(MidirBackend::new(settings.client_name))
});

/// Storage backing the pointer returned by [`MiditapGetEndpointName`];
/// the pointer stays valid until the next name lookup.
static NAME_BUFFER: Lazy<Mutex<CString>> = Lazy::new(|| Mutex::new(CString::default()));

/// Force-close and reopen all endpoints, returning the new active count.
#[no_mangle]
pub extern "C" fn MiditapRefreshEndpoints() -> i32 {
    SESSION.refresh() as i32
}

/// Current number of open endpoints.
#[no_mangle]
pub extern "C" fn MiditapCountEndpoints() -> i32 {
    SESSION.endpoint_count() as i32
}

/// Endpoint identifier at the given enumeration index, or 0 when the
/// index is out of range.
#[no_mangle]
pub extern "C" fn MiditapGetEndpointIdAtIndex(index: i32) -> u32 {
    if index < 0 {
        return 0;
    }
    SESSION.endpoint_at(index as usize).unwrap_or(0)
}

/// Display name of an endpoint, or `"unknown"` for identifiers that do
/// not match an open device. The returned pointer is only valid until
/// the next call to this function.
#[no_mangle]
pub extern "C" fn MiditapGetEndpointName(id: u32) -> *const c_char {
    let name = SESSION.endpoint_name(id);
    let mut buffer = NAME_BUFFER.lock();
    *buffer = CString::new(name).unwrap_or_default();
    buffer.as_ptr()
}

/// Pop the oldest queued message in packed form, or exactly 0 when the
/// queue is empty. Consumers poll this until they observe 0, then resume
/// on the next frame.
#[no_mangle]
pub extern "C" fn MiditapDequeueIncomingData() -> u64 {
    SESSION.dequeue_packed()
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    // These touch only the registry/queue paths; no device is opened, so
    // they stay hardware independent.
    #[test]
    fn empty_session_reports_zero_everywhere() {
        assert_eq!(MiditapCountEndpoints(), 0);
        assert_eq!(MiditapDequeueIncomingData(), 0);
        assert_eq!(MiditapGetEndpointIdAtIndex(0), 0);
        assert_eq!(MiditapGetEndpointIdAtIndex(-1), 0);
    }

    #[test]
    fn unknown_endpoint_name_is_the_sentinel() {
        let ptr = MiditapGetEndpointName(0xDEAD_BEEF);
        let name = unsafe { CStr::from_ptr(ptr) };
        assert_eq!(name.to_str().unwrap(), "unknown");
    }
}
