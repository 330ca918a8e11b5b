use tracing::debug;

use crate::backend::Backend;
use crate::error::{OctopusError, Result};
use crate::metadata::Metadata;
use crate::phrase::PhraseSet;
use crate::session::{status_error, Session};
use crate::types::{Match, SearchResult};

impl<B: Backend> Session<B> {
    /// Searches metadata for occurrences of the given phrases.
    ///
    /// Phrases are canonicalized and deduplicated first; an empty phrase or a
    /// phrase outside the model's charset fails the whole call before the
    /// engine is asked anything. Any engine failure aborts the call, so a
    /// result is either complete or absent.
    ///
    /// Phrases that are not found have no entry in the result.
    pub fn search<I, S>(&mut self, metadata: &Metadata, phrases: I) -> Result<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let charset = self.phrase_charset()?;
        let phrases = PhraseSet::parse(phrases, charset)?;
        let (backend, handle) = self.engine()?;

        if metadata.is_empty() {
            return Err(OctopusError::invalid_argument("metadata is empty"));
        }

        let mut result = SearchResult::new();
        for phrase in phrases {
            let matches = backend
                .search(handle, metadata.as_bytes(), &phrase)
                .map_err(|status| status_error(backend, status, "search failed"))?;
            debug!("octopus search {:?}: {} matches", phrase, matches.len());
            result.insert(phrase, matches);
        }
        Ok(result)
    }

    /// Searches metadata for a single phrase.
    ///
    /// Returns an empty list when the phrase is not found.
    pub fn search_phrase(&mut self, metadata: &Metadata, phrase: &str) -> Result<Vec<Match>> {
        let key = crate::phrase::normalize(phrase);
        let mut result = self.search(metadata, [phrase])?;
        Ok(result.remove(&key).unwrap_or_default())
    }
}
