//! Raw FFI bindings for the Octopus C API.
//!
//! These declarations match `pv_octopus.h` and `picovoice.h`. We hand-write
//! them instead of using bindgen for simplicity and control.

use std::os::raw::{c_char, c_float, c_int, c_void};

/// Opaque engine handle.
#[repr(C)]
pub struct PvOctopus {
    _private: [u8; 0],
}

/// `pv_status_t`.
pub type PvStatus = c_int;

/// `pv_octopus_match_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvOctopusMatch {
    pub start_sec: c_float,
    pub end_sec: c_float,
    pub probability: c_float,
}

#[link(name = "pv_octopus")]
unsafe extern "C" {
    // Lifecycle
    pub fn pv_octopus_init(access_key: *const c_char, model_path: *const c_char, object: *mut *mut PvOctopus) -> PvStatus;
    pub fn pv_octopus_delete(object: *mut PvOctopus);

    // Indexing
    pub fn pv_octopus_index_size(object: *mut PvOctopus, num_samples: i32, num_indices_bytes: *mut i32) -> PvStatus;
    pub fn pv_octopus_index(object: *mut PvOctopus, pcm: *const i16, num_samples: i32, indices: *mut c_void) -> PvStatus;
    pub fn pv_octopus_index_file_size(object: *mut PvOctopus, path: *const c_char, num_indices_bytes: *mut i32) -> PvStatus;
    pub fn pv_octopus_index_file(object: *mut PvOctopus, path: *const c_char, indices: *mut c_void) -> PvStatus;

    // Search
    pub fn pv_octopus_search(
        object: *mut PvOctopus,
        indices: *const c_void,
        num_indices_bytes: i32,
        phrase: *const c_char,
        matches: *mut *mut PvOctopusMatch,
        num_matches: *mut i32,
    ) -> PvStatus;
    pub fn pv_octopus_matches_delete(matches: *mut PvOctopusMatch);

    // Globals
    pub fn pv_octopus_version() -> *const c_char;
    pub fn pv_sample_rate() -> i32;
    pub fn pv_status_to_string(status: PvStatus) -> *const c_char;
    pub fn pv_set_sdk(sdk: *const c_char);

    // Error stack
    pub fn pv_get_error_stack(message_stack: *mut *mut *mut c_char, message_stack_depth: *mut i32) -> PvStatus;
    pub fn pv_free_error_stack(message_stack: *mut *mut c_char);
}
