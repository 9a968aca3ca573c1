//! C ABI for linking nearby-core as a static library from Android (NDK) or other C/C++ hosts.
//! The JNI shim calls these from the platform callback thread; a handle must not be shared
//! across threads.
//!
//! Events go in as JSON (see `wire`). Resulting actions are queued on the handle and read out as
//! a JSON array with `nearby_core_read_actions`.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;

use tracing::warn;

use crate::config::CoreConfig;
use crate::core::{Action, NearbyCore};
use crate::wire::{self, PROTOCOL_VERSION};

struct Handle {
    core: NearbyCore,
    outbox: Vec<Action>,
}

impl Handle {
    fn new(core: NearbyCore) -> Self {
        Self {
            core,
            outbox: Vec::new(),
        }
    }

    fn queue(&mut self, actions: Vec<Action>) -> c_int {
        self.outbox.extend(actions);
        self.outbox.len() as c_int
    }

    fn encoded_outbox(&self) -> Option<Vec<u8>> {
        wire::encode_actions(&self.outbox, self.core.config()).ok()
    }
}

/// Returns the envelope protocol version. Used so the staticlib exports a C symbol and is linkable.
#[no_mangle]
pub extern "C" fn nearby_core_version() -> u8 {
    PROTOCOL_VERSION
}

/// Create a core with default config. Returns opaque handle.
#[no_mangle]
pub extern "C" fn nearby_core_create() -> *mut c_void {
    Box::into_raw(Box::new(Handle::new(NearbyCore::new()))) as *mut c_void
}

/// Create a core from a JSON `CoreConfig`. Returns null on bad UTF-8 or JSON.
#[no_mangle]
pub extern "C" fn nearby_core_create_with_config(config: *const u8, config_len: usize) -> *mut c_void {
    if config.is_null() {
        return std::ptr::null_mut();
    }
    let bytes = unsafe { slice::from_raw_parts(config, config_len) };
    let cfg: CoreConfig = match serde_json::from_slice(bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "rejecting core config");
            return std::ptr::null_mut();
        }
    };
    Box::into_raw(Box::new(Handle::new(NearbyCore::with_config(cfg)))) as *mut c_void
}

/// Destroy core instance. No-op if h is null.
#[no_mangle]
pub extern "C" fn nearby_core_destroy(h: *mut c_void) {
    if h.is_null() {
        return;
    }
    let _ = unsafe { Box::from_raw(h as *mut Handle) };
}

/// Feed one JSON platform event. Returns the number of queued actions, or -1 on error.
#[no_mangle]
pub extern "C" fn nearby_core_handle_event(h: *mut c_void, event: *const u8, event_len: usize) -> c_int {
    if h.is_null() || event.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    let bytes = unsafe { slice::from_raw_parts(event, event_len) };
    let event = match wire::decode_event(bytes) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(error = %e, "dropping undecodable platform event");
            return -1;
        }
    };
    let actions = handle.core.handle(event);
    handle.queue(actions)
}

/// Queue the bind-service command. Returns number of queued actions, or -1 if h null.
#[no_mangle]
pub extern "C" fn nearby_core_bind(h: *mut c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    let actions = handle.core.bind();
    handle.queue(actions)
}

/// Queue unbind/stop-service commands. Returns number of queued actions, or -1 if h null.
#[no_mangle]
pub extern "C" fn nearby_core_unbind(h: *mut c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    let actions = handle.core.unbind();
    handle.queue(actions)
}

/// Byte length `nearby_core_read_actions` needs for the queued actions, or -1 on error.
#[no_mangle]
pub extern "C" fn nearby_core_pending_len(h: *mut c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &*(h as *const Handle) };
    match handle.encoded_outbox() {
        Some(bytes) => bytes.len() as c_int,
        None => -1,
    }
}

/// Copy queued actions (JSON array) into out_buf and clear the queue. Returns bytes written, or -1
/// if h/out_buf is null or out_buf is too small (queue kept).
#[no_mangle]
pub extern "C" fn nearby_core_read_actions(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    if h.is_null() || out_buf.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    let bytes = match handle.encoded_outbox() {
        Some(b) => b,
        None => return -1,
    };
    if bytes.len() > out_buf_len {
        return -1;
    }
    unsafe {
        out_buf.copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
    }
    handle.outbox.clear();
    bytes.len() as c_int
}

/// Write the current roster (JSON array text) into out_buf. Returns bytes written, or -1 on error.
#[no_mangle]
pub extern "C" fn nearby_core_roster(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    if h.is_null() || out_buf.is_null() {
        return -1;
    }
    let handle = unsafe { &*(h as *const Handle) };
    let text = match wire::encode_roster(&handle.core.roster().snapshot(), handle.core.config()) {
        Ok(t) => t,
        Err(_) => return -1,
    };
    if text.len() > out_buf_len {
        return -1;
    }
    unsafe {
        out_buf.copy_from_nonoverlapping(text.as_ptr(), text.len());
    }
    text.len() as c_int
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(h: *mut c_void, json: &str) -> c_int {
        nearby_core_handle_event(h, json.as_ptr(), json.len())
    }

    fn read_all(h: *mut c_void) -> serde_json::Value {
        let need = nearby_core_pending_len(h);
        assert!(need > 0);
        let mut buf = vec![0u8; need as usize];
        let n = nearby_core_read_actions(h, buf.as_mut_ptr(), buf.len());
        assert_eq!(n, need);
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn event_in_actions_out() {
        let h = nearby_core_create();
        let queued = feed(
            h,
            r#"{"event":"connection_initiated","deviceId":"A","endpointName":"Printer"}"#,
        );
        assert_eq!(queued, 2);
        let actions = read_all(h);
        assert_eq!(actions[0]["method"], "invoke_change_state_method");
        assert_eq!(actions[1]["command"], "accept_connection");
        assert_eq!(nearby_core_pending_len(h), 2); // "[]"
        nearby_core_destroy(h);
    }

    #[test]
    fn short_buffer_keeps_queue() {
        let h = nearby_core_create();
        feed(h, r#"{"event":"endpoint_found","deviceId":"A","endpointName":"Printer"}"#);
        let mut small = [0u8; 4];
        assert_eq!(nearby_core_read_actions(h, small.as_mut_ptr(), small.len()), -1);
        let actions = read_all(h);
        assert_eq!(actions.as_array().map(Vec::len), Some(1));
        nearby_core_destroy(h);
    }

    #[test]
    fn bad_event_and_null_handle() {
        let h = nearby_core_create();
        assert_eq!(feed(h, "not json"), -1);
        assert_eq!(feed(std::ptr::null_mut(), "{}"), -1);
        assert_eq!(nearby_core_bind(std::ptr::null_mut()), -1);
        nearby_core_destroy(h);
        nearby_core_destroy(std::ptr::null_mut());
    }

    #[test]
    fn config_and_roster() {
        let cfg = r#"{"legacy_null_name":false}"#;
        let h = nearby_core_create_with_config(cfg.as_ptr(), cfg.len());
        assert!(!h.is_null());
        feed(h, r#"{"event":"disconnected","deviceId":"Q"}"#);
        let mut buf = [0u8; 256];
        let n = nearby_core_roster(h, buf.as_mut_ptr(), buf.len());
        assert!(n > 0);
        let text = std::str::from_utf8(&buf[..n as usize]).unwrap();
        assert_eq!(text, r#"[{"deviceId":"Q","outletName":null,"state":3}]"#);
        nearby_core_destroy(h);

        let bad = "{";
        assert!(nearby_core_create_with_config(bad.as_ptr(), bad.len()).is_null());
    }

    #[test]
    fn unbind_queues_stop() {
        let h = nearby_core_create();
        assert_eq!(nearby_core_unbind(h), 1);
        let actions = read_all(h);
        assert_eq!(actions[0]["command"], "stop_service");
        nearby_core_destroy(h);
    }
}
