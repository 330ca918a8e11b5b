use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One detected occurrence of a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Start of the occurrence, in seconds from the beginning of the audio.
    pub start_sec: f32,
    /// End of the occurrence, in seconds. Never before `start_sec`.
    pub end_sec: f32,
    /// Detection confidence in [0, 1].
    pub probability: f32,
}

impl Match {
    pub fn new(start_sec: f32, end_sec: f32, probability: f32) -> Self {
        Self {
            start_sec,
            end_sec,
            probability,
        }
    }

    pub fn duration_sec(&self) -> f32 {
        self.end_sec - self.start_sec
    }
}

/// Matches of one search call, keyed by canonical phrase.
///
/// A phrase that was searched but not found has no entry. Matches of a
/// phrase are kept in the order the engine reported them, which is
/// ascending start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult {
    matches: BTreeMap<String, Vec<Match>>,
}

impl SearchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the matches of a phrase. Empty lists are not stored.
    pub(crate) fn insert(&mut self, phrase: String, matches: Vec<Match>) {
        if !matches.is_empty() {
            self.matches.insert(phrase, matches);
        }
    }

    pub(crate) fn remove(&mut self, phrase: &str) -> Option<Vec<Match>> {
        self.matches.remove(phrase)
    }

    /// Returns the matches of a canonical phrase, if it was found.
    pub fn get(&self, phrase: &str) -> Option<&[Match]> {
        self.matches.get(phrase).map(Vec::as_slice)
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.matches.contains_key(phrase)
    }

    /// Number of phrases with at least one match.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Match])> {
        self.matches.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<Match>> {
        self.matches
    }
}

impl IntoIterator for SearchResult {
    type Item = (String, Vec<Match>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<Match>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_match_lists_are_dropped() {
        let mut r = SearchResult::new();
        r.insert("alexa".into(), vec![Match::new(7.6, 8.3, 1.0)]);
        r.insert("porcupine".into(), Vec::new());
        assert_eq!(r.len(), 1);
        assert!(r.contains("alexa"));
        assert!(!r.contains("porcupine"));
        assert!(r.get("porcupine").is_none());
    }

    #[test]
    fn json_shape() {
        let mut r = SearchResult::new();
        r.insert("alexa".into(), vec![Match::new(1.0, 2.0, 0.5)]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"alexa":[{"start_sec":1.0,"end_sec":2.0,"probability":0.5}]}"#
        );
    }

    #[test]
    fn match_duration() {
        let m = Match::new(7.5, 8.25, 0.9);
        assert_eq!(m.duration_sec(), 0.75);
    }
}
