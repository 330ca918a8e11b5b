//! A deterministic engine driven by a model file.
//!
//! The scripted engine does not recognize speech. Its model lists known
//! recordings (by PCM digest) and the words spoken in them; indexing looks
//! the audio up and packs its words into metadata, and searching matches
//! phrases against those words. Everything else behaves like the real
//! engine: two-phase sizing, activation failures, error stacks and status
//! codes. It backs the crate's tests and lets applications run without the
//! native library.

mod model;
mod payload;
mod wav;

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::error::Status;
use crate::phrase::PhraseCharset;
use crate::types::Match;

pub use model::{pcm_digest, Recording, ScriptedModel, TimedWord, DEFAULT_SAMPLE_RATE};

use payload::Payload;

/// Engine instance of [`ScriptedBackend`].
#[derive(Debug)]
pub struct ScriptedHandle {
    model: ScriptedModel,
}

/// [`Backend`] that replays a [`ScriptedModel`].
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    activations: HashMap<String, Status>,
    search_failures: HashMap<String, Status>,
    index_failure: Option<Status>,
    last_error: Mutex<Vec<String>>,
    search_calls: AtomicUsize,
    releases: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes activation with `access_key` fail with `status`.
    pub fn with_activation(mut self, access_key: impl Into<String>, status: Status) -> Self {
        self.activations.insert(access_key.into(), status);
        self
    }

    /// Makes every search for the canonical `phrase` fail with `status`.
    pub fn with_search_failure(mut self, phrase: impl Into<String>, status: Status) -> Self {
        self.search_failures.insert(phrase.into(), status);
        self
    }

    /// Makes every index call fail with `status`.
    pub fn with_index_failure(mut self, status: Status) -> Self {
        self.index_failure = Some(status);
        self
    }

    /// Number of per-phrase searches the engine has run.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::Relaxed)
    }

    /// Number of handles released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    fn fail(&self, status: Status, stack: Vec<String>) -> Status {
        *self.last_error.lock() = stack;
        status
    }

    fn read_wav(&self, handle: &ScriptedHandle, path: &Path) -> Result<Vec<i16>, Status> {
        let pcm = wav::read_mono(path, handle.model.sample_rate).map_err(|(status, msg)| self.fail(status, vec![msg]))?;
        if pcm.is_empty() {
            return Err(self.fail(
                Status::InvalidArgument,
                vec![format!("{} has no audio samples", path.display())],
            ));
        }
        Ok(pcm)
    }
}

impl Backend for ScriptedBackend {
    type Handle = ScriptedHandle;

    fn init(&self, access_key: &str, model_path: &Path) -> Result<ScriptedHandle, Status> {
        if let Some(&status) = self.activations.get(access_key) {
            return Err(self.fail(
                status,
                vec![
                    format!("activation failed with {status}"),
                    "access key was rejected by the license server".to_string(),
                ],
            ));
        }

        let model = ScriptedModel::load(model_path).map_err(|e| {
            self.fail(
                e.status(),
                vec![
                    "failed to load model".to_string(),
                    e.message().to_string(),
                ],
            )
        })?;
        debug!("scripted engine loaded {} recordings", model.recordings.len());
        Ok(ScriptedHandle { model })
    }

    fn release(&self, handle: ScriptedHandle) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        drop(handle);
    }

    fn sample_rate(&self, handle: &ScriptedHandle) -> u32 {
        handle.model.sample_rate
    }

    fn version(&self, handle: &ScriptedHandle) -> String {
        handle.model.version.clone()
    }

    fn phrase_charset(&self, handle: &ScriptedHandle) -> PhraseCharset {
        handle.model.language.phrase_charset()
    }

    fn index_size(&self, handle: &mut ScriptedHandle, num_samples: i32) -> Result<usize, Status> {
        let num_samples = usize::try_from(num_samples)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| self.fail(Status::InvalidArgument, vec![format!("invalid sample count {num_samples}")]))?;
        Ok(payload::capacity(num_samples, handle.model.sample_rate))
    }

    fn index(&self, handle: &mut ScriptedHandle, pcm: &[i16], indices: &mut [u8]) -> Result<(), Status> {
        if let Some(status) = self.index_failure {
            return Err(self.fail(status, vec!["indexer is unavailable".to_string()]));
        }

        let model = &handle.model;
        let expected = payload::capacity(pcm.len(), model.sample_rate);
        if indices.len() != expected {
            return Err(self.fail(
                Status::InvalidArgument,
                vec![format!("index buffer has {} bytes, expected {}", indices.len(), expected)],
            ));
        }

        let duration = pcm.len() as f32 / model.sample_rate as f32;
        let mut words: Vec<_> = model
            .words_for(&pcm_digest(pcm))
            .iter()
            .filter(|w| w.start_sec >= 0.0 && w.start_sec <= w.end_sec && w.end_sec <= duration)
            .cloned()
            .collect();
        words.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

        let payload = Payload {
            version: model.version.clone(),
            sample_rate: model.sample_rate,
            num_samples: pcm.len() as u32,
            words,
        };
        payload::encode(&payload, indices).map_err(|msg| self.fail(Status::RuntimeError, vec![msg]))
    }

    fn index_file_size(&self, handle: &mut ScriptedHandle, path: &Path) -> Result<usize, Status> {
        let pcm = self.read_wav(handle, path)?;
        Ok(payload::capacity(pcm.len(), handle.model.sample_rate))
    }

    fn index_file(&self, handle: &mut ScriptedHandle, path: &Path, indices: &mut [u8]) -> Result<(), Status> {
        let pcm = self.read_wav(handle, path)?;
        self.index(handle, &pcm, indices)
    }

    fn search(&self, handle: &mut ScriptedHandle, indices: &[u8], phrase: &str) -> Result<Vec<Match>, Status> {
        self.search_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(&status) = self.search_failures.get(phrase) {
            return Err(self.fail(status, vec![format!("search for {phrase:?} failed")]));
        }
        if !handle.model.language.phrase_charset().accepts(phrase) {
            return Err(self.fail(
                Status::InvalidArgument,
                vec![format!("phrase {phrase:?} contains unsupported characters")],
            ));
        }

        let payload = payload::decode(indices).map_err(|msg| self.fail(Status::InvalidArgument, vec![msg]))?;
        if payload.version != handle.model.version {
            return Err(self.fail(
                Status::InvalidArgument,
                vec![format!(
                    "metadata was created by version {}, engine is {}",
                    payload.version, handle.model.version
                )],
            ));
        }

        Ok(find(&payload.words, phrase))
    }

    fn error_stack(&self) -> Vec<String> {
        self.last_error.lock().clone()
    }
}

/// Matches `phrase` against runs of consecutive words, ignoring case.
///
/// A match spans from the first word's start to the last word's end and
/// scores the least confident word.
fn find(words: &[TimedWord], phrase: &str) -> Vec<Match> {
    let target: Vec<String> = phrase.split(' ').map(str::to_lowercase).collect();
    if target.is_empty() || words.len() < target.len() {
        return Vec::new();
    }

    words
        .windows(target.len())
        .filter(|run| run.iter().zip(&target).all(|(w, t)| w.text.to_lowercase() == *t))
        .map(|run| {
            let probability = run.iter().map(|w| w.probability).fold(1.0_f32, f32::min);
            Match::new(run[0].start_sec, run[run.len() - 1].end_sec, probability)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<TimedWord> {
        vec![
            TimedWord::new("hey", 1.0, 1.2, 0.9),
            TimedWord::new("Alexa", 1.3, 1.8, 1.0),
            TimedWord::new("hey", 3.0, 3.2, 0.5),
            TimedWord::new("siri", 3.3, 3.6, 0.7),
        ]
    }

    #[test]
    fn find_single_words() {
        let m = find(&words(), "hey");
        assert_eq!(m.len(), 2);
        assert!(m[0].start_sec < m[1].start_sec);
        assert!(find(&words(), "cortana").is_empty());
    }

    #[test]
    fn find_multi_word_phrase() {
        let m = find(&words(), "hey alexa");
        assert_eq!(m, vec![Match::new(1.0, 1.8, 0.9)]);

        let m = find(&words(), "hey siri");
        assert_eq!(m, vec![Match::new(3.0, 3.6, 0.5)]);

        assert!(find(&words(), "alexa siri").is_empty());
        assert!(find(&words(), "hey alexa hey siri extra").is_empty());
    }

    #[test]
    fn index_size_rejects_non_positive_counts() {
        let backend = ScriptedBackend::new();
        let mut handle = ScriptedHandle {
            model: ScriptedModel::new("v"),
        };
        assert_eq!(backend.index_size(&mut handle, 0), Err(Status::InvalidArgument));
        assert_eq!(backend.index_size(&mut handle, -5), Err(Status::InvalidArgument));
        assert_eq!(backend.error_stack().len(), 1);
        assert!(backend.index_size(&mut handle, 16000).is_ok());
    }

    #[test]
    fn index_drops_words_past_the_audio() {
        let pcm = vec![1i16; 16000];
        let model = ScriptedModel::new("v").with_recording(
            &pcm,
            vec![
                TimedWord::new("late", 0.5, 0.9, 1.0),
                TimedWord::new("early", 0.1, 0.3, 1.0),
                TimedWord::new("outside", 0.9, 1.5, 1.0),
            ],
        );
        let backend = ScriptedBackend::new();
        let mut handle = ScriptedHandle { model };

        let mut buf = vec![0u8; backend.index_size(&mut handle, 16000).unwrap()];
        backend.index(&mut handle, &pcm, &mut buf).unwrap();
        let payload = payload::decode(&buf).unwrap();
        let texts: Vec<_> = payload.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["early", "late"]);
    }

    #[test]
    fn index_checks_buffer_length() {
        let backend = ScriptedBackend::new();
        let mut handle = ScriptedHandle {
            model: ScriptedModel::new("v"),
        };
        let mut buf = vec![0u8; 10];
        assert_eq!(backend.index(&mut handle, &[0; 100], &mut buf), Err(Status::InvalidArgument));
        assert!(backend.error_stack()[0].contains("expected"));
    }
}
