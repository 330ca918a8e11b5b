//! Speech-to-index: turn recorded speech into searchable metadata.
//!
//! # Architecture
//!
//! Audio goes through the engine once; phrases can be searched many times:
//!
//! 1. [`Session::index`] / [`Session::index_file`]: PCM or audio file -> [`Metadata`]
//! 2. [`Session::search`]: metadata + phrases -> [`SearchResult`]
//!
//! Indexing uses a two-phase protocol with the engine: the required buffer
//! size is queried first, then a buffer of exactly that size is filled.
//! [`Metadata`] is an immutable byte blob that can be persisted (see
//! [`StoredIndex`]) and searched later by a session running the same engine
//! version.
//!
//! # Phrases
//!
//! Search phrases are canonicalized before they reach the engine: runs of
//! whitespace collapse to one space, leading and trailing whitespace is
//! removed, and duplicates are merged. Phrases must only use characters the
//! model's [`PhraseCharset`] accepts; numbers and punctuation have to be
//! spelled out (`"12"` becomes `"twelve"`).
//!
//! # Engines
//!
//! [`Session`] is generic over a [`Backend`]. Two are provided:
//!
//! - [`ScriptedBackend`]: deterministic, driven by a model file that lists
//!   known recordings and their words. Always available.
//! - `NativeBackend`: calls into `libpv_octopus`. Enabled by the `native`
//!   feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use giztoy_octopus::{ScriptedBackend, Session};
//!
//! let mut session = Session::open(ScriptedBackend::new(), "access-key", "model.yaml")?;
//! let metadata = session.index_file("meeting.wav")?;
//! let result = session.search(&metadata, ["alexa", "hey  alexa"])?;
//! for (phrase, matches) in result.iter() {
//!     println!("{phrase}: {matches:?}");
//! }
//! session.close();
//! ```
//!
//! # Thread Safety
//!
//! A [`Session`] serializes engine calls through `&mut self`; use one
//! session per thread. [`Metadata`] is `Send + Sync` and cheap to clone.

mod backend;
pub mod config;
mod error;
mod index;
mod metadata;
mod phrase;
pub mod scripted;
mod search;
mod session;
mod store;
mod types;

#[cfg(feature = "native")]
pub mod native;

pub use backend::Backend;
pub use config::{Language, OctopusConfig};
pub use error::{Failure, OctopusError, Result, Status};
pub use metadata::Metadata;
pub use phrase::{normalize, PhraseCharset, PhraseSet};
pub use scripted::{ScriptedBackend, ScriptedModel, TimedWord};
pub use session::Session;
pub use store::StoredIndex;
pub use types::{Match, SearchResult};

#[cfg(feature = "native")]
pub use native::NativeBackend;
