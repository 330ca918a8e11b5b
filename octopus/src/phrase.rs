//! Search phrase canonicalization and validation.
//!
//! A phrase is canonicalized by trimming surrounding whitespace, collapsing
//! internal whitespace runs to a single space, and folding typographic
//! apostrophes to `'`. Case is preserved. The canonical form is both the key
//! sent to the engine and the key of the [`SearchResult`](crate::SearchResult).

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{OctopusError, Result};

static ENGLISH_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z' ]+$").expect("english phrase pattern"));

static ALPHABETIC_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}' ]+$").expect("alphabetic phrase pattern"));

/// Returns the canonical form of a search phrase.
///
/// The result is idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    for word in phrase.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            c => c,
        }));
    }
    out
}

/// Characters an engine accepts in search phrases.
///
/// The restriction depends on the model language, so it is reported by the
/// backend rather than fixed in the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhraseCharset {
    /// Any printable text.
    Unrestricted,
    /// ASCII letters, apostrophes and spaces.
    #[default]
    English,
    /// Letters of any script, apostrophes and spaces.
    Alphabetic,
}

impl PhraseCharset {
    /// Returns true if the canonical phrase is allowed.
    pub fn accepts(self, phrase: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::English => ENGLISH_PHRASE.is_match(phrase),
            Self::Alphabetic => ALPHABETIC_PHRASE.is_match(phrase),
        }
    }

    fn rules(self) -> &'static str {
        match self {
            Self::Unrestricted => "",
            Self::English => {
                "search phrases should only consist of alphabetic characters, apostrophes, and spaces:\n\
                 \t12 >>> twelve\n\
                 \t2021 >>> twenty twenty one\n\
                 \tmother-in-law >>> mother in law\n\
                 \t5-minute meeting >>> five minute meeting"
            }
            Self::Alphabetic => {
                "search phrases should only consist of letters, apostrophes, and spaces: \
                 spell out numbers and replace hyphens with spaces"
            }
        }
    }
}

/// The distinct canonical phrases of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseSet {
    phrases: BTreeSet<String>,
}

impl PhraseSet {
    /// Canonicalizes, deduplicates and validates caller phrases.
    ///
    /// Validation runs over the whole set before anything is returned, so a
    /// single bad phrase rejects the call without any engine work:
    /// empty phrases first, then control characters, then the charset.
    pub fn parse<I, S>(phrases: I, charset: PhraseCharset) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: BTreeSet<String> = phrases.into_iter().map(|p| normalize(p.as_ref())).collect();

        if phrases.iter().any(|p| p.is_empty()) {
            return Err(OctopusError::invalid_argument("search phrase cannot be empty"));
        }

        if let Some(p) = phrases.iter().find(|p| p.chars().any(char::is_control)) {
            return Err(OctopusError::invalid_argument(format!(
                "search phrase {p:?} contains control characters"
            )));
        }

        if let Some(p) = phrases.iter().find(|p| !charset.accepts(p)) {
            return Err(OctopusError::invalid_argument(format!(
                "invalid search phrase {p:?}: {}",
                charset.rules()
            )));
        }

        Ok(Self { phrases })
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }
}

impl IntoIterator for PhraseSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.phrases.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize(" americano   avocado    "), "americano avocado");
        assert_eq!(normalize("\talexa\n"), "alexa");
        assert_eq!(normalize("a \u{00a0} b"), "a b");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("    "), "");
    }

    #[test]
    fn normalize_preserves_case() {
        assert_eq!(normalize("  Hey  Alexa "), "Hey Alexa");
    }

    #[test]
    fn normalize_folds_apostrophes() {
        assert_eq!(normalize("don\u{2019}t  stop"), "don't stop");
        assert_eq!(normalize("\u{2018}tis"), "'tis");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "",
            " ",
            "alexa",
            "  hey   alexa ",
            "\u{2019}\u{2019} x\t\ty",
            "mixed\r\nline  endings",
            "日本語 の  テキスト",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "{s:?}");
        }
    }

    #[test]
    fn parse_dedups_by_canonical_form() {
        let set = PhraseSet::parse(["avocado", " avocado ", "avocado"], PhraseCharset::English).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("avocado"));
    }

    #[test]
    fn parse_rejects_english_violations() {
        for bad in ["", "   ", "12", "real-time", "@@!%$"] {
            let err = PhraseSet::parse([bad], PhraseCharset::English).unwrap_err();
            assert_eq!(err.status(), Status::InvalidArgument, "{bad:?}");
        }
    }

    #[test]
    fn charset_error_lists_formation_rules() {
        let err = PhraseSet::parse(["mother-in-law"], PhraseCharset::English).unwrap_err();
        let msg = err.message();
        assert!(msg.contains("mother-in-law"));
        assert!(msg.contains("twelve"));
        assert!(msg.contains("mother in law"));
    }

    #[test]
    fn empty_phrase_wins_over_charset_violation() {
        let err = PhraseSet::parse(["12", " "], PhraseCharset::English).unwrap_err();
        assert!(err.message().contains("empty"));
    }

    #[test]
    fn alphabetic_accepts_accented_letters() {
        assert!(PhraseCharset::Alphabetic.accepts("être là"));
        assert!(PhraseCharset::Alphabetic.accepts("l'été"));
        assert!(!PhraseCharset::Alphabetic.accepts("5 minutes"));
        assert!(!PhraseCharset::English.accepts("être"));
    }

    #[test]
    fn unrestricted_still_rejects_control_characters() {
        assert!(PhraseSet::parse(["こんにちは"], PhraseCharset::Unrestricted).is_ok());
        let err = PhraseSet::parse(["a\u{0}b"], PhraseCharset::Unrestricted).unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);
    }

    #[test]
    fn apostrophes_are_accepted() {
        let set = PhraseSet::parse(["don\u{2019}t", "don't"], PhraseCharset::English).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), ["don't"]);
    }
}
