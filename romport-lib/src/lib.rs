//! The romport engine.
//!
//! Resolves archive platforms to destination systems, chooses metadata
//! candidates, places files idempotently, backports destination metadata
//! into the archive and feeds the catalog writers. [`export::Exporter`]
//! drives all of it for one run.

pub mod backport;
pub mod candidates;
pub mod error;
pub mod export;
pub mod layout;
pub mod placement;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod settings;
pub mod summary;

pub use backport::BackportOutcome;
pub use candidates::{Candidate, CandidateResolution};
pub use error::PlacementError;
pub use export::{ExportOptions, ExportProgress, Exporter};
pub use layout::DestinationLayout;
pub use placement::{PlacementAction, PlacementDecision, PlacementMode, PlacementOutcome};
pub use resolver::{MappingOrigin, PlatformMapping};
pub use selection::{Selection, Selector};
pub use session::{SessionState, SubdirectoryMode, SubdirectorySelection};
pub use summary::{ExportSummary, FailureRecord, PlacementCounts, PlatformSummary};
