//! Model artifact of the scripted engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Language;
use crate::error::{OctopusError, Result};

/// Sample rate used when a model file does not name one.
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn full_probability() -> f32 {
    1.0
}

/// A word spoken in a known recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWord {
    pub text: String,
    pub start_sec: f32,
    pub end_sec: f32,
    #[serde(default = "full_probability")]
    pub probability: f32,
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start_sec: f32, end_sec: f32, probability: f32) -> Self {
        Self {
            text: text.into(),
            start_sec,
            end_sec,
            probability,
        }
    }
}

/// Words of one recording, identified by the digest of its PCM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// See [`pcm_digest`].
    pub digest: String,
    #[serde(default)]
    pub words: Vec<TimedWord>,
}

/// Everything the scripted engine knows.
///
/// Stored as YAML:
///
/// ```yaml
/// version: 1.0.0-scripted
/// sample_rate: 16000
/// language: en
/// recordings:
///   - digest: 5d1f0a3c
///     words:
///       - { text: alexa, start_sec: 7.648, end_sec: 8.352 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedModel {
    pub version: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

impl ScriptedModel {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            language: Language::default(),
            recordings: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Declares the words spoken in `pcm`.
    pub fn with_recording(mut self, pcm: &[i16], words: Vec<TimedWord>) -> Self {
        self.recordings.push(Recording {
            digest: pcm_digest(pcm),
            words,
        });
        self
    }

    /// Words of the recording with the given digest; empty if unknown.
    pub fn words_for(&self, digest: &str) -> &[TimedWord] {
        self.recordings
            .iter()
            .find(|r| r.digest == digest)
            .map(|r| r.words.as_slice())
            .unwrap_or(&[])
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_yaml::to_string(self)
            .map_err(|e| OctopusError::invalid_argument(format!("encode model: {e}")))?;
        std::fs::write(path, data).map_err(|e| OctopusError::io(format!("write {}: {}", path.display(), e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| OctopusError::io(format!("read {}: {}", path.display(), e)))?;
        let model: Self = serde_yaml::from_str(&data)
            .map_err(|e| OctopusError::invalid_argument(format!("parse {}: {}", path.display(), e)))?;
        if model.sample_rate == 0 {
            return Err(OctopusError::invalid_argument(format!(
                "{}: sample rate must be positive",
                path.display()
            )));
        }
        Ok(model)
    }
}

/// CRC-32 of the little-endian sample bytes, as eight hex digits.
pub fn pcm_digest(pcm: &[i16]) -> String {
    let mut hasher = crc32fast::Hasher::new();
    for s in pcm {
        hasher.update(&s.to_le_bytes());
    }
    format!("{:08x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = [1i16, -2, 3];
        assert_eq!(pcm_digest(&a), pcm_digest(&a));
        assert_ne!(pcm_digest(&a), pcm_digest(&[1, -2, 4]));
        assert_eq!(pcm_digest(&a).len(), 8);
        // CRC-32 of no bytes.
        assert_eq!(pcm_digest(&[]), "00000000");
    }

    #[test]
    fn words_for_unknown_digest_is_empty() {
        let model = ScriptedModel::new("v").with_recording(&[1, 2, 3], vec![TimedWord::new("hi", 0.0, 0.1, 1.0)]);
        assert_eq!(model.words_for(&pcm_digest(&[1, 2, 3])).len(), 1);
        assert!(model.words_for("ffffffff").is_empty());
    }

    #[test]
    fn yaml_round_trip_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");

        let model = ScriptedModel::new("2.0.0")
            .with_language(Language::Fr)
            .with_recording(&[5, 6], vec![TimedWord::new("bonjour", 0.5, 0.9, 0.8)]);
        model.save(&path).unwrap();
        assert_eq!(ScriptedModel::load(&path).unwrap(), model);

        std::fs::write(
            &path,
            "version: x\nrecordings:\n  - digest: abc\n    words:\n      - { text: hi, start_sec: 1.0, end_sec: 2.0 }\n",
        )
        .unwrap();
        let model = ScriptedModel::load(&path).unwrap();
        assert_eq!(model.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(model.language, Language::En);
        assert_eq!(model.recordings[0].words[0].probability, 1.0);
    }

    #[test]
    fn load_rejects_bad_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");

        std::fs::write(&path, "version: x\nsample_rate: 0\n").unwrap();
        assert_eq!(ScriptedModel::load(&path).unwrap_err().status(), Status::InvalidArgument);

        std::fs::write(&path, "[not, a, model]").unwrap();
        assert_eq!(ScriptedModel::load(&path).unwrap_err().status(), Status::InvalidArgument);
    }
}
