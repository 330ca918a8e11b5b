//! Opaque index metadata produced by indexing.

use std::fmt;
use std::sync::Arc;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable binary index of a piece of audio.
///
/// The layout is defined by the engine and not interpreted here. Metadata
/// never refers back to the session that produced it: it can be persisted
/// with [`Metadata::to_bytes`], reloaded with [`Metadata::from_bytes`] and
/// searched by any session running the same engine version.
///
/// Cloning is cheap and clones share the same buffer. Metadata is `Send +
/// Sync`; searching only reads it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Metadata {
    bytes: Arc<[u8]>,
}

impl Metadata {
    /// Wraps a serialized index.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Returns a copy of the serialized index.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the index in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata").field("len", &self.len()).finish()
    }
}

impl AsRef<[u8]> for Metadata {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Metadata {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8]> for Metadata {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_byte_buf(MetadataVisitor)
    }
}

struct MetadataVisitor;

impl<'de> Visitor<'de> for MetadataVisitor {
    type Value = Metadata;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Metadata, E> {
        Ok(Metadata::from_bytes(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Metadata, E> {
        Ok(Metadata::from_bytes(v))
    }

    // Self-describing formats without a byte type (JSON) encode a sequence.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Metadata, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(Metadata::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bytes_returns_exact_payload() {
        let m = Metadata::from_bytes(vec![1u8, 2, 3, 250]);
        assert_eq!(m.len(), 4);
        assert_eq!(m.to_bytes(), vec![1, 2, 3, 250]);
        assert_eq!(m.to_bytes(), m.to_bytes());
        assert_eq!(Metadata::from_bytes(m.to_bytes()), m);
    }

    #[test]
    fn clones_share_the_buffer() {
        let m = Metadata::from_bytes(vec![7u8; 32]);
        let c = m.clone();
        assert!(std::ptr::eq(m.as_bytes().as_ptr(), c.as_bytes().as_ptr()));
    }

    #[test]
    fn debug_hides_payload() {
        let m = Metadata::from_bytes(vec![0u8; 10]);
        assert_eq!(format!("{m:?}"), "Metadata { len: 10 }");
    }

    #[test]
    fn serde_msgpack_and_json() {
        let m = Metadata::from_bytes(vec![0u8, 1, 2, 255]);

        let packed = rmp_serde::to_vec(&m).unwrap();
        let back: Metadata = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(back, m);

        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[0,1,2,255]");
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn metadata_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Metadata>();
    }
}
