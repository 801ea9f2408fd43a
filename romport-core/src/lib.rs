//! Data model shared by every romport crate.
//!
//! Holds the typed destination profiles loaded from `fe_formats.json`, the
//! read-only view of the source archive, the prompt capability the engine
//! asks questions through, and the custom entity seam implemented by the
//! frontend writers. There is no engine logic here.

pub mod archive;
pub mod entity;
pub mod error;
pub mod interaction;
pub mod profile;
pub mod util;

pub use archive::{Archive, ArchiveEntity, ArchiveEntityKind, GameFile};
pub use entity::{AppendOutcome, CustomEntity, CustomEntityError, CustomEntityKind, CustomEntityStore};
pub use error::ExportError;
pub use interaction::{Answer, Headless, Interaction, Question, QuestionKind, ScriptedInteraction};
pub use profile::{
    CatalogFormat, ConversionRule, DestinationProfile, Formats, MetadataTarget, ProfileError,
};
