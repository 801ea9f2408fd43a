//! Structured outcome of an export run.
//!
//! Everything a caller needs to report on a run lives here, independent of
//! the human-readable log: counts per platform and in total, failures with
//! their source and destination, and the unmapped names.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::backport::BackportOutcome;
use crate::placement::{PlacementAction, PlacementOutcome};
use crate::resolver::MappingOrigin;

/// Tally of placement outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementCounts {
    pub created: usize,
    /// Destination already existed
    pub skipped: usize,
    pub simulated: usize,
    pub failed: usize,
    /// Size of created or simulated files
    pub bytes: u64,
}

impl PlacementCounts {
    /// Count one outcome; `size` is the source file size.
    ///
    /// A dry run that would skip an existing destination counts as skipped,
    /// as the real run would.
    pub fn record(&mut self, outcome: &PlacementOutcome, size: u64) {
        match outcome {
            PlacementOutcome::Created(_) => {
                self.created += 1;
                self.bytes += size;
            }
            PlacementOutcome::Simulated(d) if d.action == PlacementAction::SkipExisting => {
                self.skipped += 1;
            }
            PlacementOutcome::Simulated(_) => {
                self.simulated += 1;
                self.bytes += size;
            }
            PlacementOutcome::Skipped(_) => self.skipped += 1,
            PlacementOutcome::Failed { .. } => self.failed += 1,
        }
    }

    fn add(&mut self, other: &PlacementCounts) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.simulated += other.simulated;
        self.failed += other.failed;
        self.bytes += other.bytes;
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped + self.simulated + self.failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackportCounts {
    pub copied: usize,
    pub simulated: usize,
    pub skipped_archive_has_it: usize,
    pub skipped_destination_missing: usize,
    pub failed: usize,
}

impl BackportCounts {
    pub fn record(&mut self, outcome: &BackportOutcome) {
        match outcome {
            BackportOutcome::Copied { .. } => self.copied += 1,
            BackportOutcome::Simulated { .. } => self.simulated += 1,
            BackportOutcome::SkippedArchiveHasIt { .. } => self.skipped_archive_has_it += 1,
            BackportOutcome::SkippedDestinationMissing => self.skipped_destination_missing += 1,
            BackportOutcome::Failed { .. } => self.failed += 1,
        }
    }

    fn add(&mut self, other: &BackportCounts) {
        self.copied += other.copied;
        self.simulated += other.simulated;
        self.skipped_archive_has_it += other.skipped_archive_has_it;
        self.skipped_destination_missing += other.skipped_destination_missing;
        self.failed += other.failed;
    }
}

/// One failed file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
    /// Symlink privilege was missing; copy mode would work
    pub privilege: bool,
}

impl FailureRecord {
    pub fn from_outcome(outcome: &PlacementOutcome) -> Option<Self> {
        let PlacementOutcome::Failed {
            source,
            destination,
            error,
        } = outcome
        else {
            return None;
        };
        Some(Self {
            source: source.clone(),
            destination: destination.clone(),
            reason: error.to_string(),
            privilege: error.is_privilege(),
        })
    }

    pub fn from_backport(outcome: &BackportOutcome) -> Option<Self> {
        let BackportOutcome::Failed { from, to, reason } = outcome else {
            return None;
        };
        Some(Self {
            source: from.clone(),
            destination: to.clone(),
            reason: reason.clone(),
            privilege: false,
        })
    }
}

/// Results for one archive platform.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformSummary {
    pub platform_name: String,
    pub system_id: Option<String>,
    pub origin: Option<MappingOrigin>,
    pub games: PlacementCounts,
    pub metadata: PlacementCounts,
    /// Metadata placed (created or simulated) per category root, e.g. `Images`
    pub metadata_by_root: BTreeMap<String, usize>,
    pub backport: BackportCounts,
    /// Multi-candidate choices nobody could make
    pub ambiguous: usize,
    /// Archive categories with no mapping in the profile
    pub unmapped_categories: Vec<String>,
    pub catalog_entries: usize,
    pub catalog_path: Option<PathBuf>,
}

impl PlatformSummary {
    pub fn new(platform_name: &str) -> Self {
        Self {
            platform_name: platform_name.to_string(),
            ..Self::default()
        }
    }

    /// Count a metadata placement under its category root.
    pub fn record_metadata(&mut self, category: &str, outcome: &PlacementOutcome, size: u64) {
        self.metadata.record(outcome, size);
        let placed = match outcome {
            PlacementOutcome::Created(_) => true,
            PlacementOutcome::Simulated(d) => d.action != PlacementAction::SkipExisting,
            _ => false,
        };
        if placed {
            let root = category.split('/').next().unwrap_or(category);
            *self.metadata_by_root.entry(root.to_string()).or_default() += 1;
        }
    }
}

/// Totals over every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub games: PlacementCounts,
    pub metadata: PlacementCounts,
    pub backport: BackportCounts,
    pub ambiguous: usize,
    pub unmapped_platforms: usize,
    pub unmapped_categories: usize,
    pub catalog_entries: usize,
    pub failures: usize,
}

impl SummaryTotals {
    pub fn created(&self) -> usize {
        self.games.created + self.metadata.created
    }

    pub fn skipped(&self) -> usize {
        self.games.skipped + self.metadata.skipped
    }

    pub fn simulated(&self) -> usize {
        self.games.simulated + self.metadata.simulated
    }

    pub fn failed(&self) -> usize {
        self.games.failed + self.metadata.failed + self.backport.failed
    }
}

/// Summary of a whole export run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub format: String,
    pub destination: PathBuf,
    pub dry_run: bool,
    pub platforms: Vec<PlatformSummary>,
    pub unmapped_platforms: Vec<String>,
    pub failures: Vec<FailureRecord>,
    /// The user stopped the run at a selection prompt
    pub quit: bool,
    pub totals: SummaryTotals,
}

impl ExportSummary {
    pub fn new(format: &str, destination: PathBuf, dry_run: bool) -> Self {
        Self {
            format: format.to_string(),
            destination,
            dry_run,
            ..Self::default()
        }
    }

    /// Recompute [`ExportSummary::totals`] from the platform entries.
    pub fn finish(&mut self) {
        self.totals = self.compute_totals();
    }

    fn compute_totals(&self) -> SummaryTotals {
        let mut totals = SummaryTotals::default();
        for platform in &self.platforms {
            totals.games.add(&platform.games);
            totals.metadata.add(&platform.metadata);
            totals.backport.add(&platform.backport);
            totals.ambiguous += platform.ambiguous;
            totals.unmapped_categories += platform.unmapped_categories.len();
            totals.catalog_entries += platform.catalog_entries;
        }
        totals.unmapped_platforms = self.unmapped_platforms.len();
        totals.failures = self.failures.len();
        totals
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn has_privilege_failures(&self) -> bool {
        self.failures.iter().any(|f| f.privilege)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
