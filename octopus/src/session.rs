//! Engine session lifecycle.

use std::path::Path;

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::OctopusConfig;
use crate::error::{OctopusError, Result, Status};
use crate::phrase::PhraseCharset;

/// A live engine instance bound to one access key and one model.
///
/// A session is either open or closed. Indexing and searching are only valid
/// while it is open; after [`Session::close`] every other method fails with
/// [`OctopusError::InvalidState`]. Dropping an open session closes it.
///
/// # Thread Safety
///
/// All engine calls take `&mut self`. A session may be moved to another
/// thread when its backend allows it, but sharing one between threads
/// requires external locking (e.g. `Mutex<Session<_>>`). For parallel work,
/// open one session per thread; [`Metadata`](crate::Metadata) can be shared
/// freely between them.
pub struct Session<B: Backend> {
    pub(crate) backend: B,
    handle: Option<B::Handle>,
    sample_rate: u32,
    version: String,
    charset: PhraseCharset,
}

impl<B: Backend> Session<B> {
    /// Opens a session.
    ///
    /// The access key must be non-empty and the model file must exist.
    /// Activation failures surface as the `Activation*` error variants.
    /// Nothing is left behind when opening fails.
    pub fn open(backend: B, access_key: &str, model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();

        if access_key.is_empty() {
            return Err(OctopusError::invalid_argument("access key should be a non-empty string"));
        }
        if !model_path.exists() {
            return Err(OctopusError::io(format!(
                "couldn't find model file at {}",
                model_path.display()
            )));
        }

        let handle = backend
            .init(access_key, model_path)
            .map_err(|status| status_error(&backend, status, "initialization failed"))?;

        let sample_rate = backend.sample_rate(&handle);
        let version = backend.version(&handle);
        let charset = backend.phrase_charset(&handle);
        debug!(
            "octopus session opened: version={}, sample_rate={}, model={}",
            version,
            sample_rate,
            model_path.display()
        );

        Ok(Self {
            backend,
            handle: Some(handle),
            sample_rate,
            version,
            charset,
        })
    }

    /// Opens a session with the credential and model from a configuration.
    pub fn from_config(backend: B, config: &OctopusConfig) -> Result<Self> {
        config.validate()?;
        Self::open(backend, &config.access_key, &config.model_path)
    }

    /// Releases the engine instance.
    ///
    /// Closing an already closed session does nothing.
    pub fn close(&mut self) {
        match self.handle.take() {
            Some(handle) => {
                self.backend.release(handle);
                debug!("octopus session closed");
            }
            None => warn!("octopus session already closed"),
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sample rate PCM passed to [`Session::index`] must be recorded at.
    pub fn sample_rate(&self) -> Result<u32> {
        self.ensure_open()?;
        Ok(self.sample_rate)
    }

    /// Engine and model version. Store it next to persisted metadata.
    pub fn version(&self) -> Result<&str> {
        self.ensure_open()?;
        Ok(&self.version)
    }

    /// Characters this session's model accepts in search phrases.
    pub fn phrase_charset(&self) -> Result<PhraseCharset> {
        self.ensure_open()?;
        Ok(self.charset)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.handle.is_none() {
            return Err(closed_error());
        }
        Ok(())
    }

    /// Splits the session into the backend and the live handle.
    pub(crate) fn engine(&mut self) -> Result<(&B, &mut B::Handle)> {
        match self.handle.as_mut() {
            Some(handle) => Ok((&self.backend, handle)),
            None => Err(closed_error()),
        }
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release(handle);
        }
    }
}

fn closed_error() -> OctopusError {
    OctopusError::invalid_state("session has been closed")
}

/// Builds the typed error for a failed backend call.
///
/// The stack is read before any other backend call can replace it.
pub(crate) fn status_error<B: Backend>(backend: &B, status: Status, message: &str) -> OctopusError {
    let stack = backend.error_stack();
    debug!("octopus {}: {} ({} messages)", message, status, stack.len());
    OctopusError::from_status(status, message, stack)
}
