//! The boundary between the session and an engine implementation.
//!
//! A [`Backend`] mirrors the engine's C ABI one call at a time: every
//! operation either succeeds or reports a failing [`Status`], after which
//! [`Backend::error_stack`] describes why. Turning statuses into typed
//! errors, checking session state and owning buffers is the session's job.

use std::path::Path;

use crate::error::Status;
use crate::phrase::PhraseCharset;
use crate::types::Match;

/// An engine implementation.
///
/// Methods return `Err` only with a non-success status. A handle returned by
/// [`Backend::init`] is passed back to every call until it is consumed by
/// [`Backend::release`], so a handle can never be released twice.
///
/// Backends are not required to be thread-safe: the session serializes all
/// calls through `&mut` access.
pub trait Backend {
    /// One engine instance.
    type Handle;

    /// Creates an engine instance, performing access key activation.
    fn init(&self, access_key: &str, model_path: &Path) -> Result<Self::Handle, Status>;

    /// Destroys an engine instance.
    fn release(&self, handle: Self::Handle);

    /// Sample rate the engine expects PCM to be recorded at.
    fn sample_rate(&self, handle: &Self::Handle) -> u32;

    /// Engine and model version.
    fn version(&self, handle: &Self::Handle) -> String;

    /// Characters the loaded model accepts in search phrases.
    fn phrase_charset(&self, handle: &Self::Handle) -> PhraseCharset;

    /// Returns the number of bytes [`Backend::index`] needs for `num_samples` samples.
    fn index_size(&self, handle: &mut Self::Handle, num_samples: i32) -> Result<usize, Status>;

    /// Indexes PCM into `indices`, which is exactly as long as
    /// [`Backend::index_size`] reported.
    fn index(&self, handle: &mut Self::Handle, pcm: &[i16], indices: &mut [u8]) -> Result<(), Status>;

    /// Returns the number of bytes [`Backend::index_file`] needs for the file at `path`.
    fn index_file_size(&self, handle: &mut Self::Handle, path: &Path) -> Result<usize, Status>;

    /// Indexes an audio file into `indices`, which is exactly as long as
    /// [`Backend::index_file_size`] reported.
    fn index_file(&self, handle: &mut Self::Handle, path: &Path, indices: &mut [u8]) -> Result<(), Status>;

    /// Searches index metadata for one canonical phrase.
    ///
    /// Any engine-side match buffer is released before returning.
    fn search(&self, handle: &mut Self::Handle, indices: &[u8], phrase: &str) -> Result<Vec<Match>, Status>;

    /// Diagnostic messages describing the most recent failure.
    ///
    /// Only meaningful immediately after a call returned `Err`; the next
    /// failure replaces it.
    fn error_stack(&self) -> Vec<String>;
}
