//! Index layout of the scripted engine.
//!
//! ```text
//! +--------+-----------+---------------------+---------+
//! | "OCTS" | len: u32  | msgpack payload     | zeroes  |
//! +--------+-----------+---------------------+---------+
//! ```
//!
//! The buffer size depends only on the sample count and rate, which is what
//! lets the size be negotiated before the audio is looked at.

use serde::{Deserialize, Serialize};

use super::model::TimedWord;

const MAGIC: &[u8; 4] = b"OCTS";
const HEADER_BYTES: usize = 8;
const BASE_BYTES: usize = 256;
const SLOT_BYTES: usize = 64;
// Upper bound on words per second of speech.
const SLOTS_PER_SEC: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Payload {
    pub version: String,
    pub sample_rate: u32,
    pub num_samples: u32,
    pub words: Vec<TimedWord>,
}

/// Index size for `num_samples` samples at `sample_rate`.
pub(crate) fn capacity(num_samples: usize, sample_rate: u32) -> usize {
    let rate = u64::from(sample_rate.max(1));
    let slots = (num_samples as u64 * SLOTS_PER_SEC).div_ceil(rate).max(1);
    HEADER_BYTES + BASE_BYTES + slots as usize * SLOT_BYTES
}

pub(crate) fn encode(payload: &Payload, out: &mut [u8]) -> Result<(), String> {
    let body = rmp_serde::to_vec(payload).map_err(|e| format!("encode index: {e}"))?;
    if HEADER_BYTES + body.len() > out.len() {
        return Err(format!(
            "index needs {} bytes, buffer has {}",
            HEADER_BYTES + body.len(),
            out.len()
        ));
    }
    let len = u32::try_from(body.len()).map_err(|_| "index payload too large".to_string())?;

    out[..4].copy_from_slice(MAGIC);
    out[4..HEADER_BYTES].copy_from_slice(&len.to_le_bytes());
    out[HEADER_BYTES..HEADER_BYTES + body.len()].copy_from_slice(&body);
    out[HEADER_BYTES + body.len()..].fill(0);
    Ok(())
}

pub(crate) fn decode(data: &[u8]) -> Result<Payload, String> {
    if data.len() < HEADER_BYTES || &data[..4] != MAGIC {
        return Err("metadata is not a scripted index".to_string());
    }
    let mut len = [0u8; 4];
    len.copy_from_slice(&data[4..HEADER_BYTES]);
    let len = u32::from_le_bytes(len) as usize;
    let body = data
        .get(HEADER_BYTES..HEADER_BYTES + len)
        .ok_or_else(|| format!("metadata is truncated: need {} bytes, have {}", HEADER_BYTES + len, data.len()))?;
    rmp_serde::from_slice(body).map_err(|e| format!("metadata is corrupt: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(words: usize) -> Payload {
        Payload {
            version: "1.0.0".into(),
            sample_rate: 16000,
            num_samples: 16000,
            words: (0..words)
                .map(|i| TimedWord::new(format!("word{i}"), i as f32 * 0.1, i as f32 * 0.1 + 0.05, 0.9))
                .collect(),
        }
    }

    #[test]
    fn capacity_grows_with_duration() {
        assert_eq!(capacity(1, 16000), HEADER_BYTES + BASE_BYTES + SLOT_BYTES);
        assert_eq!(capacity(16000, 16000), HEADER_BYTES + BASE_BYTES + 10 * SLOT_BYTES);
        assert!(capacity(160000, 16000) > capacity(16000, 16000));
    }

    #[test]
    fn encode_then_decode() {
        let p = payload(10);
        let mut buf = vec![0xffu8; capacity(16000, 16000)];
        encode(&p, &mut buf).unwrap();
        assert_eq!(decode(&buf).unwrap(), p);
        assert_eq!(*buf.last().unwrap(), 0);
    }

    #[test]
    fn encode_rejects_small_buffer() {
        let mut buf = vec![0u8; 16];
        assert!(encode(&payload(3), &mut buf).is_err());
    }

    #[test]
    fn decode_rejects_foreign_and_truncated_data() {
        assert!(decode(b"").is_err());
        assert!(decode(b"NOPE\x00\x00\x00\x00").is_err());

        let mut buf = vec![0u8; capacity(16000, 16000)];
        encode(&payload(2), &mut buf).unwrap();
        assert!(decode(&buf[..12]).is_err());
    }
}
