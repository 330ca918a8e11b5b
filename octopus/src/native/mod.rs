//! Backend over the native `libpv_octopus` library.

mod ffi;

use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Once;

use parking_lot::Mutex;
use tracing::warn;

use crate::backend::Backend;
use crate::config::{Language, OctopusConfig};
use crate::error::{Result, Status};
use crate::phrase::PhraseCharset;
use crate::session::Session;
use crate::types::Match;

static SET_SDK: Once = Once::new();

/// Owned `pv_octopus_t*`.
pub struct NativeHandle(NonNull<ffi::PvOctopus>);

// The engine object has no thread affinity; the session serializes access.
unsafe impl Send for NativeHandle {}

/// [`Backend`] that calls into `libpv_octopus`.
pub struct NativeBackend {
    language: Language,
    // Failures detected on the Rust side of the boundary, reported ahead of
    // the library's own stack.
    pending: Mutex<Vec<String>>,
}

impl NativeBackend {
    /// Creates a backend for models of `language`.
    pub fn new(language: Language) -> Self {
        SET_SDK.call_once(|| {
            let sdk = c"rust";
            unsafe { ffi::pv_set_sdk(sdk.as_ptr()) };
        });
        Self {
            language,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn local_error(&self, status: Status, message: String) -> Status {
        *self.pending.lock() = vec![message];
        status
    }

    fn check(&self, code: ffi::PvStatus) -> std::result::Result<(), Status> {
        match Status::from_code(code) {
            Some(Status::Success) => Ok(()),
            Some(status) => {
                self.pending.lock().clear();
                Err(status)
            }
            None => Err(self.local_error(
                Status::RuntimeError,
                format!("engine returned unknown status code {code}"),
            )),
        }
    }

    fn c_path(&self, path: &Path) -> std::result::Result<CString, Status> {
        CString::new(path.to_string_lossy().into_owned())
            .map_err(|_| self.local_error(Status::InvalidArgument, format!("path {} contains a NUL byte", path.display())))
    }

    fn indices_len(&self, len: usize) -> std::result::Result<i32, Status> {
        i32::try_from(len).map_err(|_| self.local_error(Status::InvalidArgument, format!("metadata too large: {len} bytes")))
    }

    fn size_from(&self, num_bytes: i32) -> std::result::Result<usize, Status> {
        usize::try_from(num_bytes)
            .map_err(|_| self.local_error(Status::RuntimeError, format!("engine reported index size {num_bytes}")))
    }
}

/// Opens a native session from a configuration.
pub fn open(config: &OctopusConfig) -> Result<Session<NativeBackend>> {
    Session::from_config(NativeBackend::new(config.language), config)
}

impl Backend for NativeBackend {
    type Handle = NativeHandle;

    fn init(&self, access_key: &str, model_path: &Path) -> std::result::Result<NativeHandle, Status> {
        let key = CString::new(access_key)
            .map_err(|_| self.local_error(Status::InvalidArgument, "access key contains a NUL byte".to_string()))?;
        let model = self.c_path(model_path)?;

        let mut object = ptr::null_mut();
        self.check(unsafe { ffi::pv_octopus_init(key.as_ptr(), model.as_ptr(), &mut object) })?;
        NonNull::new(object)
            .map(NativeHandle)
            .ok_or_else(|| self.local_error(Status::RuntimeError, "pv_octopus_init returned a null object".to_string()))
    }

    fn release(&self, handle: NativeHandle) {
        unsafe { ffi::pv_octopus_delete(handle.0.as_ptr()) };
    }

    fn sample_rate(&self, _handle: &NativeHandle) -> u32 {
        u32::try_from(unsafe { ffi::pv_sample_rate() }).unwrap_or(0)
    }

    fn version(&self, _handle: &NativeHandle) -> String {
        unsafe {
            let ptr = ffi::pv_octopus_version();
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    fn phrase_charset(&self, _handle: &NativeHandle) -> PhraseCharset {
        self.language.phrase_charset()
    }

    fn index_size(&self, handle: &mut NativeHandle, num_samples: i32) -> std::result::Result<usize, Status> {
        let mut num_bytes = 0i32;
        self.check(unsafe { ffi::pv_octopus_index_size(handle.0.as_ptr(), num_samples, &mut num_bytes) })?;
        self.size_from(num_bytes)
    }

    fn index(&self, handle: &mut NativeHandle, pcm: &[i16], indices: &mut [u8]) -> std::result::Result<(), Status> {
        let num_samples = i32::try_from(pcm.len())
            .map_err(|_| self.local_error(Status::InvalidArgument, format!("too many samples: {}", pcm.len())))?;
        self.check(unsafe {
            ffi::pv_octopus_index(
                handle.0.as_ptr(),
                pcm.as_ptr(),
                num_samples,
                indices.as_mut_ptr() as *mut c_void,
            )
        })
    }

    fn index_file_size(&self, handle: &mut NativeHandle, path: &Path) -> std::result::Result<usize, Status> {
        let c_path = self.c_path(path)?;
        let mut num_bytes = 0i32;
        self.check(unsafe { ffi::pv_octopus_index_file_size(handle.0.as_ptr(), c_path.as_ptr(), &mut num_bytes) })?;
        self.size_from(num_bytes)
    }

    fn index_file(&self, handle: &mut NativeHandle, path: &Path, indices: &mut [u8]) -> std::result::Result<(), Status> {
        let c_path = self.c_path(path)?;
        self.check(unsafe {
            ffi::pv_octopus_index_file(handle.0.as_ptr(), c_path.as_ptr(), indices.as_mut_ptr() as *mut c_void)
        })
    }

    fn search(&self, handle: &mut NativeHandle, indices: &[u8], phrase: &str) -> std::result::Result<Vec<Match>, Status> {
        let num_bytes = self.indices_len(indices.len())?;
        let c_phrase = CString::new(phrase)
            .map_err(|_| self.local_error(Status::InvalidArgument, format!("phrase {phrase:?} contains a NUL byte")))?;

        let mut matches: *mut ffi::PvOctopusMatch = ptr::null_mut();
        let mut num_matches = 0i32;
        self.check(unsafe {
            ffi::pv_octopus_search(
                handle.0.as_ptr(),
                indices.as_ptr() as *const c_void,
                num_bytes,
                c_phrase.as_ptr(),
                &mut matches,
                &mut num_matches,
            )
        })?;

        if matches.is_null() {
            return Ok(Vec::new());
        }
        let count = usize::try_from(num_matches).unwrap_or(0);
        let out = unsafe { std::slice::from_raw_parts(matches, count) }
            .iter()
            .map(|m| Match::new(m.start_sec, m.end_sec, m.probability))
            .collect();
        unsafe { ffi::pv_octopus_matches_delete(matches) };
        Ok(out)
    }

    fn error_stack(&self) -> Vec<String> {
        let mut stack = std::mem::take(&mut *self.pending.lock());

        let mut messages: *mut *mut std::os::raw::c_char = ptr::null_mut();
        let mut depth = 0i32;
        let code = unsafe { ffi::pv_get_error_stack(&mut messages, &mut depth) };
        if code != Status::Success.code() {
            warn!("octopus: unable to get error stack: {}", status_name(code));
            return stack;
        }
        if messages.is_null() {
            return stack;
        }

        let depth = usize::try_from(depth).unwrap_or(0);
        for i in 0..depth {
            let entry = unsafe { *messages.add(i) };
            if !entry.is_null() {
                stack.push(unsafe { CStr::from_ptr(entry) }.to_string_lossy().into_owned());
            }
        }
        unsafe { ffi::pv_free_error_stack(messages) };
        stack
    }
}

fn status_name(code: ffi::PvStatus) -> String {
    unsafe {
        let ptr = ffi::pv_status_to_string(code);
        if ptr.is_null() {
            return format!("status {code}");
        }
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
