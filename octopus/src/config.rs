//! Session configuration.
//!
//! A configuration names the access key, the model file and the model
//! language. It can be loaded from a YAML or JSON file:
//!
//! ```yaml
//! access_key: ${OCTOPUS_ACCESS_KEY}
//! model_path: $HOME/models/octopus_params_de.pv
//! language: de
//! ```
//!
//! String values go through `$VAR` / `${VAR}` expansion, so secrets can stay
//! in the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OctopusError, Result};
use crate::phrase::PhraseCharset;

/// Environment variable holding the access key.
pub const ENV_ACCESS_KEY: &str = "OCTOPUS_ACCESS_KEY";
/// Environment variable holding the model path.
pub const ENV_MODEL_PATH: &str = "OCTOPUS_MODEL_PATH";
/// Environment variable holding the language code.
pub const ENV_LANGUAGE: &str = "OCTOPUS_LANGUAGE";

/// Model language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Es,
    Fr,
    It,
    Ja,
    Ko,
    Pt,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::En,
        Language::De,
        Language::Es,
        Language::Fr,
        Language::It,
        Language::Ja,
        Language::Ko,
        Language::Pt,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::It => "it",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Pt => "pt",
        }
    }

    /// Characters models of this language accept in search phrases.
    pub fn phrase_charset(self) -> PhraseCharset {
        match self {
            Self::En => PhraseCharset::English,
            Self::De | Self::Es | Self::Fr | Self::It | Self::Pt => PhraseCharset::Alphabetic,
            Self::Ja | Self::Ko => PhraseCharset::Unrestricted,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = OctopusError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or_else(|| OctopusError::invalid_argument(format!("unsupported language {s:?}")))
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctopusConfig {
    /// AccessKey used for activation.
    #[serde(default)]
    pub access_key: String,

    /// Path to the model parameter file.
    #[serde(default)]
    pub model_path: PathBuf,

    /// Language of the model.
    #[serde(default)]
    pub language: Language,
}

impl OctopusConfig {
    pub fn new(access_key: impl Into<String>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            access_key: access_key.into(),
            model_path: model_path.into(),
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Loads a configuration file. The format follows the extension
    /// (`.yaml`, `.yml` or `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| OctopusError::io(format!("read {}: {}", path.display(), e)))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let raw: Self = match ext.as_str() {
            "json" => serde_json::from_str(&data)
                .map_err(|e| OctopusError::invalid_argument(format!("parse {}: {}", path.display(), e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&data)
                .map_err(|e| OctopusError::invalid_argument(format!("parse {}: {}", path.display(), e)))?,
            _ => {
                return Err(OctopusError::invalid_argument(format!(
                    "unsupported config extension: {ext:?}"
                )));
            }
        };

        Ok(raw.expanded())
    }

    /// Reads the configuration from `OCTOPUS_ACCESS_KEY`,
    /// `OCTOPUS_MODEL_PATH` and, optionally, `OCTOPUS_LANGUAGE`.
    pub fn from_env() -> Result<Self> {
        let access_key = std::env::var(ENV_ACCESS_KEY)
            .map_err(|_| OctopusError::invalid_argument(format!("{ENV_ACCESS_KEY} is not set")))?;
        let model_path = std::env::var_os(ENV_MODEL_PATH)
            .ok_or_else(|| OctopusError::invalid_argument(format!("{ENV_MODEL_PATH} is not set")))?;
        let language = match std::env::var(ENV_LANGUAGE) {
            Ok(code) if !code.trim().is_empty() => code.parse()?,
            _ => Language::default(),
        };

        Ok(Self {
            access_key,
            model_path: PathBuf::from(model_path),
            language,
        })
    }

    /// Checks the fields that can be checked without the engine.
    pub fn validate(&self) -> Result<()> {
        if self.access_key.is_empty() {
            return Err(OctopusError::invalid_argument("access key should be a non-empty string"));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(OctopusError::invalid_argument("model path is not set"));
        }
        Ok(())
    }

    fn expanded(self) -> Self {
        Self {
            access_key: expand_env(&self.access_key),
            model_path: PathBuf::from(expand_env(&self.model_path.to_string_lossy())),
            language: self.language,
        }
    }
}

/// Expands `$VAR` and `${VAR}` references; `$$` is a literal `$`.
/// Unset variables expand to the empty string.
fn expand_env(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            None => out.push('$'),
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            Some(_) => out.push('$'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn language_codes() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert_eq!(" DE ".parse::<Language>().unwrap(), Language::De);
        assert_eq!("xx".parse::<Language>().unwrap_err().status(), Status::InvalidArgument);
    }

    #[test]
    fn language_charsets() {
        assert_eq!(Language::En.phrase_charset(), PhraseCharset::English);
        assert_eq!(Language::Fr.phrase_charset(), PhraseCharset::Alphabetic);
        assert_eq!(Language::Ja.phrase_charset(), PhraseCharset::Unrestricted);
    }

    #[test]
    fn expand_env_forms() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("OCTOPUS_TEST_EXPAND", "secret") };
        assert_eq!(expand_env("$OCTOPUS_TEST_EXPAND"), "secret");
        assert_eq!(expand_env("${OCTOPUS_TEST_EXPAND}/x"), "secret/x");
        assert_eq!(expand_env("price: $$5"), "price: $5");
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(expand_env("trailing $"), "trailing $");
        assert_eq!(expand_env("$1"), "$1");
        assert_eq!(expand_env("${OCTOPUS_TEST_UNSET_VAR}"), "");
    }

    #[test]
    fn load_yaml_with_expansion() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("OCTOPUS_TEST_YAML_KEY", "from-env") };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octopus.yaml");
        std::fs::write(
            &path,
            "access_key: ${OCTOPUS_TEST_YAML_KEY}\nmodel_path: /models/octopus_params_de.pv\nlanguage: de\n",
        )
        .unwrap();

        let cfg = OctopusConfig::load(&path).unwrap();
        assert_eq!(cfg.access_key, "from-env");
        assert_eq!(cfg.model_path, PathBuf::from("/models/octopus_params_de.pv"));
        assert_eq!(cfg.language, Language::De);
        cfg.validate().unwrap();
    }

    #[test]
    fn load_json_defaults_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octopus.json");
        std::fs::write(&path, r#"{"access_key":"k","model_path":"m.pv"}"#).unwrap();

        let cfg = OctopusConfig::load(&path).unwrap();
        assert_eq!(cfg, OctopusConfig::new("k", "m.pv"));
        assert_eq!(cfg.language, Language::En);
    }

    #[test]
    fn load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.yaml");
        assert_eq!(OctopusConfig::load(&missing).unwrap_err().status(), Status::IoError);

        let toml = dir.path().join("octopus.toml");
        std::fs::write(&toml, "access_key = 'k'").unwrap();
        assert_eq!(OctopusConfig::load(&toml).unwrap_err().status(), Status::InvalidArgument);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert_eq!(OctopusConfig::load(&broken).unwrap_err().status(), Status::InvalidArgument);
    }

    #[test]
    fn from_env_reads_variables() {
        // SAFETY: no other test touches the OCTOPUS_* session variables.
        unsafe {
            std::env::set_var(ENV_ACCESS_KEY, "env-key");
            std::env::set_var(ENV_MODEL_PATH, "/models/octopus_params_ko.pv");
            std::env::set_var(ENV_LANGUAGE, "ko");
        }
        let cfg = OctopusConfig::from_env().unwrap();
        assert_eq!(cfg.access_key, "env-key");
        assert_eq!(cfg.model_path, PathBuf::from("/models/octopus_params_ko.pv"));
        assert_eq!(cfg.language, Language::Ko);
    }

    #[test]
    fn validate_requires_fields() {
        assert!(OctopusConfig::new("", "m.pv").validate().is_err());
        assert!(OctopusConfig::new("k", "").validate().is_err());
        assert!(OctopusConfig::new("k", "m.pv").validate().is_ok());
    }
}
