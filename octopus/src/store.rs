//! Versioned on-disk storage for index metadata.
//!
//! Metadata is only valid for the engine version that produced it, so a
//! [`StoredIndex`] keeps the version and sample rate next to the payload and
//! refuses to hand the metadata to an incompatible session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{OctopusError, Result};
use crate::metadata::Metadata;
use crate::session::Session;

/// Metadata together with the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIndex {
    pub version: String,
    pub sample_rate: u32,
    pub metadata: Metadata,
}

impl StoredIndex {
    /// Tags metadata with the version and sample rate of `session`.
    pub fn capture<B: Backend>(session: &Session<B>, metadata: Metadata) -> Result<Self> {
        Ok(Self {
            version: session.version()?.to_string(),
            sample_rate: session.sample_rate()?,
            metadata,
        })
    }

    /// Serializes to MessagePack.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self)
            .map_err(|e| OctopusError::invalid_argument(format!("encode stored index: {e}")))
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(data)
            .map_err(|e| OctopusError::invalid_argument(format!("decode stored index: {e}")))
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_vec()?;
        std::fs::write(path, data).map_err(|e| OctopusError::io(format!("write {}: {}", path.display(), e)))
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| OctopusError::io(format!("read {}: {}", path.display(), e)))?;
        Self::from_slice(&data)
    }

    /// Returns the metadata if `session` runs the engine version that produced it.
    pub fn metadata_for<B: Backend>(&self, session: &Session<B>) -> Result<&Metadata> {
        let version = session.version()?;
        if version != self.version {
            return Err(OctopusError::invalid_argument(format!(
                "metadata was produced by engine version {:?}, session runs {:?}",
                self.version, version
            )));
        }
        Ok(&self.metadata)
    }
}
