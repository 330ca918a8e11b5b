use std::path::Path;

use tracing::debug;

use crate::backend::Backend;
use crate::error::{OctopusError, Result};
use crate::metadata::Metadata;
use crate::session::{status_error, Session};

impl<B: Backend> Session<B> {
    /// Indexes PCM audio.
    ///
    /// The audio must be 16-bit, mono, recorded at [`Session::sample_rate`].
    /// Empty input is rejected with `InvalidArgument`.
    pub fn index(&mut self, pcm: &[i16]) -> Result<Metadata> {
        let (backend, handle) = self.engine()?;

        if pcm.is_empty() {
            return Err(OctopusError::invalid_argument("pcm must contain at least one sample"));
        }
        let num_samples = i32::try_from(pcm.len()).map_err(|_| {
            OctopusError::invalid_argument(format!("too many samples to index: {}", pcm.len()))
        })?;

        let size = backend
            .index_size(handle, num_samples)
            .map_err(|status| status_error(backend, status, "index size failed"))?;
        let mut indices = alloc_indices(size)?;
        backend
            .index(handle, pcm, &mut indices)
            .map_err(|status| status_error(backend, status, "index failed"))?;

        debug!("octopus indexed {} samples into {} bytes", pcm.len(), size);
        Ok(Metadata::from_bytes(indices))
    }

    /// Indexes an audio file.
    ///
    /// Decoding, down-mixing and sample rate requirements are up to the
    /// engine. Indexing a file gives the same metadata as indexing its
    /// decoded PCM with [`Session::index`].
    pub fn index_file(&mut self, path: impl AsRef<Path>) -> Result<Metadata> {
        let path = path.as_ref();
        let (backend, handle) = self.engine()?;

        if !path.is_file() {
            return Err(OctopusError::io(format!(
                "couldn't find input file at {}",
                path.display()
            )));
        }

        let size = backend
            .index_file_size(handle, path)
            .map_err(|status| status_error(backend, status, "index file size failed"))?;
        let mut indices = alloc_indices(size)?;
        backend
            .index_file(handle, path, &mut indices)
            .map_err(|status| status_error(backend, status, "index file failed"))?;

        debug!("octopus indexed {} into {} bytes", path.display(), size);
        Ok(Metadata::from_bytes(indices))
    }
}

/// Allocates a zeroed buffer of exactly `size` bytes.
fn alloc_indices(size: usize) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(OctopusError::invalid_argument("engine reported an empty index size"));
    }
    let mut indices = Vec::new();
    indices
        .try_reserve_exact(size)
        .map_err(|e| OctopusError::out_of_memory(format!("allocate {size} index bytes: {e}")))?;
    indices.resize(size, 0);
    Ok(indices)
}
