//! Export orchestration: archive to destination, one platform at a time.
//!
//! Order of work for a run:
//!
//! 1. Load the catalog input (fatal on failure, before anything is touched).
//! 2. Create the destination root (skipped in dry-run).
//! 3. Select platforms, then fix the variant subdirectory selection once.
//! 4. For each platform: resolve its system, select games, place each game
//!    and its metadata, optionally backport, then write its catalog.
//!
//! Per-item failures are recorded in the [`ExportSummary`] and never abort
//! the run.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use romport_core::{
    Archive, CustomEntityStore, DestinationProfile, ExportError, GameFile, Interaction,
    MetadataTarget,
};
use romport_frontend::catalog::{self, CatalogRecord};
use romport_frontend::{CatalogEntry, catalog_writer};

use crate::backport::{BackportContext, reconcile_game};
use crate::candidates::{
    CandidateResolution, choose_subdirectories, destination_file_name, resolve_candidates,
    scan_subdirectories,
};
use crate::layout::DestinationLayout;
use crate::placement::{PlacementMode, PlacementOutcome, place};
use crate::resolver::resolve_platform;
use crate::selection::{Selection, Selector, select_games, select_platforms};
use crate::session::{SessionState, SubdirectorySelection};
use crate::summary::{ExportSummary, FailureRecord, PlatformSummary};

/// Progress updates emitted during [`Exporter::run`].
#[derive(Debug, Clone)]
pub enum ExportProgress {
    /// Starting a platform
    Platform {
        name: String,
        index: usize,
        total: usize,
    },
    /// Placing one game and its metadata
    Game {
        name: String,
        index: usize,
        total: usize,
    },
    /// Writing a platform's catalog
    Catalog { system_id: String },
    /// Finished all platforms
    Done,
}

/// Options controlling an export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Destination root; the profile's default when `None`
    pub destination: Option<PathBuf>,
    /// `None` lets the user pick one platform from the full list
    pub platform_selector: Option<Selector>,
    pub game_selector: Selector,
    pub mode: PlacementMode,
    /// Replace existing destination files
    pub force: bool,
    pub dry_run: bool,
    pub include_metadata: bool,
    /// Copy destination metadata missing from the archive back into it
    pub backport: bool,
    /// CSV catalog input keyed by the profile's name field
    pub catalog: Option<PathBuf>,
    /// `all`, `none` or a comma-separated list; asked interactively when `None`
    pub variants: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            destination: None,
            platform_selector: Some(Selector::All),
            game_selector: Selector::All,
            mode: PlacementMode::Symlink,
            force: false,
            dry_run: false,
            include_metadata: true,
            backport: false,
            catalog: None,
            variants: None,
        }
    }
}

/// A game that made it to the destination (created, already there, or
/// simulated).
struct PlacedGame {
    name: String,
    file_name: String,
    destination: PathBuf,
}

/// Runs one export of an archive to a destination profile.
pub struct Exporter<'a> {
    archive: &'a Archive,
    profile: &'a DestinationProfile,
    options: ExportOptions,
    layout: DestinationLayout,
    interaction: &'a mut dyn Interaction,
    store: Option<Box<dyn CustomEntityStore>>,
    session: SessionState,
}

impl<'a> Exporter<'a> {
    /// Exporter using the custom entity file the profile configures.
    pub fn new(
        archive: &'a Archive,
        profile: &'a DestinationProfile,
        options: ExportOptions,
        interaction: &'a mut dyn Interaction,
    ) -> Self {
        let layout = DestinationLayout::new(profile, options.destination.as_deref());
        Self {
            archive,
            profile,
            options,
            layout,
            interaction,
            store: romport_frontend::open_entity_store(profile),
            session: SessionState::new(),
        }
    }

    /// Replace the custom entity store.
    pub fn with_entity_store(mut self, store: Option<Box<dyn CustomEntityStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn layout(&self) -> &DestinationLayout {
        &self.layout
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run the export.
    ///
    /// Errors returned here are fatal and happen before any file is
    /// touched; everything after that is reported through the summary.
    pub fn run(&mut self, progress: &dyn Fn(ExportProgress)) -> Result<ExportSummary, ExportError> {
        let records = self.load_catalog()?;

        let dry_run = self.options.dry_run;
        let root = self.layout.root().to_path_buf();
        let mut summary = ExportSummary::new(&self.profile.id, root.clone(), dry_run);

        if dry_run {
            log::info!("DRY-RUN: no files will be written");
        } else {
            fs::create_dir_all(&root).map_err(|source| ExportError::Destination {
                path: root.clone(),
                source,
            })?;
        }

        let platforms = self.archive.platforms()?;
        if platforms.is_empty() {
            log::warn!("No platforms found under {}", self.archive.root().display());
        }

        let selected = match select_platforms(
            self.options.platform_selector.as_ref(),
            &platforms,
            &mut *self.interaction,
        ) {
            Selection::Selected(selected) => selected,
            Selection::Quit => {
                log::info!("Export cancelled");
                summary.quit = true;
                summary.finish();
                return Ok(summary);
            }
        };
        if selected.is_empty() {
            log::info!("No platforms selected");
        }

        if self.options.include_metadata && self.archive.has_metadata() {
            self.init_subdirectories(&platforms);
        }

        for (index, platform) in selected.iter().enumerate() {
            progress(ExportProgress::Platform {
                name: platform.clone(),
                index,
                total: selected.len(),
            });
            let quit = self.export_platform(platform, &platforms, records.as_deref(), &mut summary, progress);
            if quit {
                log::info!("Stopping at user request");
                summary.quit = true;
                break;
            }
        }

        summary.unmapped_platforms = self.session.unmapped().map(str::to_string).collect();
        summary.finish();
        progress(ExportProgress::Done);
        Ok(summary)
    }

    fn load_catalog(&self) -> Result<Option<Vec<CatalogRecord>>, ExportError> {
        let Some(path) = &self.options.catalog else {
            return Ok(None);
        };
        if self.profile.catalog_format.is_none() {
            log::warn!(
                "Format '{}' does not generate a catalog; ignoring {}",
                self.profile.id,
                path.display()
            );
            return Ok(None);
        }
        let records = catalog::load_catalog_csv(path, &self.profile.catalog_name_field)
            .map_err(|e| ExportError::catalog(format!("{}: {e}", path.display())))?;
        log::info!("Loaded {} catalog record(s) from {}", records.len(), path.display());
        Ok(Some(records))
    }

    /// Fix the variant subdirectory selection for the run.
    fn init_subdirectories(&mut self, platforms: &[String]) {
        let available = scan_subdirectories(self.archive, platforms);
        let selection = match &self.options.variants {
            Some(spec) => SubdirectorySelection::parse(spec, &available),
            None => choose_subdirectories(&available, &mut *self.interaction),
        };
        if !selection.selected.is_empty() {
            let names: Vec<&str> = selection.selected.iter().map(String::as_str).collect();
            log::info!("Searching variant subdirectories: {}", names.join(", "));
        }
        self.session.set_subdirectories(selection);
    }

    /// Export one platform. Returns `true` when the user asked to stop.
    fn export_platform(
        &mut self,
        platform: &str,
        all_platforms: &[String],
        records: Option<&[CatalogRecord]>,
        summary: &mut ExportSummary,
        progress: &dyn Fn(ExportProgress),
    ) -> bool {
        let store = self
            .store
            .as_mut()
            .map(|s| &mut **s as &mut dyn CustomEntityStore);
        let Some(mapping) = resolve_platform(
            platform,
            self.profile,
            &mut self.session,
            store,
            &mut *self.interaction,
            self.options.dry_run,
        ) else {
            log::warn!(
                "Skipping '{}': no {} mapping",
                platform,
                self.profile.name
            );
            return false;
        };
        let system_id = mapping.system_id.clone();
        log::info!("Exporting '{platform}' as '{system_id}'");

        let mut platform_summary = PlatformSummary::new(platform);
        platform_summary.system_id = Some(system_id.clone());
        platform_summary.origin = Some(mapping.origin);

        let games = match self.archive.games(platform) {
            Ok(games) => games,
            Err(e) => {
                log::error!("Cannot list games for '{platform}': {e}");
                summary.platforms.push(platform_summary);
                return false;
            }
        };

        let games = match select_games(&self.options.game_selector, &games, &mut *self.interaction) {
            Selection::Selected(games) => games,
            Selection::Quit => {
                summary.platforms.push(platform_summary);
                return true;
            }
        };
        if games.is_empty() {
            log::info!("No games selected for '{platform}'");
        }

        let categories = self.mapped_categories(platform, all_platforms, &mut platform_summary);

        let mut placed = Vec::new();
        for (index, game) in games.iter().enumerate() {
            progress(ExportProgress::Game {
                name: game.name.clone(),
                index,
                total: games.len(),
            });
            if let Some(p) = self.place_game(game, &system_id, &mut platform_summary, summary) {
                placed.push(p);
            }
            for (category, target) in &categories {
                self.place_metadata(game, platform, &system_id, category, target, &mut platform_summary, summary);
            }
            if self.options.backport && self.archive.has_metadata() {
                self.backport_game(game, platform, &system_id, &mut platform_summary, summary);
            }
        }

        if let Some(records) = records {
            progress(ExportProgress::Catalog {
                system_id: system_id.clone(),
            });
            self.write_catalog(&system_id, records, &placed, &mut platform_summary, summary);
        }

        summary.platforms.push(platform_summary);
        false
    }

    /// Categories present for the platform that the profile maps somewhere.
    /// Unmapped ones are recorded in the platform summary.
    fn mapped_categories(
        &self,
        platform: &str,
        all_platforms: &[String],
        platform_summary: &mut PlatformSummary,
    ) -> Vec<(String, MetadataTarget)> {
        if !self.options.include_metadata || !self.archive.has_metadata() {
            return Vec::new();
        }
        let present = match self.archive.metadata_categories(platform, all_platforms) {
            Ok(present) => present,
            Err(e) => {
                log::warn!("Cannot list metadata for '{platform}': {e}");
                return Vec::new();
            }
        };

        let mut mapped = Vec::new();
        for entity in present {
            match self.profile.metadata_mappings.get(&entity.name) {
                Some(Some(target)) => mapped.push((entity.name, target.clone())),
                Some(None) => log::debug!(
                    "'{}' is not supported by {}; skipping",
                    entity.name,
                    self.profile.name
                ),
                None => {
                    log::warn!(
                        "No mapping for metadata category '{}' ({platform})",
                        entity.name
                    );
                    platform_summary.unmapped_categories.push(entity.name);
                }
            }
        }
        mapped
    }

    fn place_game(
        &self,
        game: &GameFile,
        system_id: &str,
        platform_summary: &mut PlatformSummary,
        summary: &mut ExportSummary,
    ) -> Option<PlacedGame> {
        let destination = self.layout.game_path(system_id, &game.file_name);
        let outcome = self.place(&game.path, &destination);
        log_outcome("game", &outcome);
        platform_summary.games.record(&outcome, game.size);
        if let Some(failure) = FailureRecord::from_outcome(&outcome) {
            summary.failures.push(failure);
            return None;
        }
        Some(PlacedGame {
            name: game.name.clone(),
            file_name: game.file_name.clone(),
            destination,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn place_metadata(
        &mut self,
        game: &GameFile,
        platform: &str,
        system_id: &str,
        category: &str,
        target: &MetadataTarget,
        platform_summary: &mut PlatformSummary,
        summary: &mut ExportSummary,
    ) {
        let base = self.archive.category_dir(category, platform);
        let candidate = match resolve_candidates(
            &game.name,
            category,
            &base,
            &mut self.session,
            &mut *self.interaction,
        ) {
            CandidateResolution::Selected(candidate) => candidate,
            CandidateResolution::NoMatch => return,
            CandidateResolution::Skipped => {
                log::debug!("Skipped {category} for '{}'", game.name);
                return;
            }
            CandidateResolution::Ambiguous(_) => {
                platform_summary.ambiguous += 1;
                return;
            }
        };

        let file_name = destination_file_name(
            game,
            target,
            &candidate.path,
            self.profile.rename_metadata_to_match_rom,
        );
        let destination = self.layout.metadata_path(system_id, &target.subdir, &file_name);
        let outcome = self.place(&candidate.path, &destination);
        log_outcome(category, &outcome);
        platform_summary.record_metadata(category, &outcome, candidate.size);
        if let Some(failure) = FailureRecord::from_outcome(&outcome) {
            summary.failures.push(failure);
        }
    }

    fn backport_game(
        &self,
        game: &GameFile,
        platform: &str,
        system_id: &str,
        platform_summary: &mut PlatformSummary,
        summary: &mut ExportSummary,
    ) {
        let ctx = BackportContext {
            archive: self.archive,
            profile: self.profile,
            layout: &self.layout,
            platform_name: platform,
            system_id,
            subdirectories: self.session.subdirectories(),
            dry_run: self.options.dry_run,
        };
        for (category, outcome) in reconcile_game(&ctx, game) {
            platform_summary.backport.record(&outcome);
            if let Some(failure) = FailureRecord::from_backport(&outcome) {
                log::error!(
                    "Backport of {category} for '{}' failed: {}",
                    game.name,
                    failure.reason
                );
                summary.failures.push(failure);
            }
        }
    }

    fn write_catalog(
        &self,
        system_id: &str,
        records: &[CatalogRecord],
        placed: &[PlacedGame],
        platform_summary: &mut PlatformSummary,
        summary: &mut ExportSummary,
    ) {
        let Some(format) = self.profile.catalog_format else {
            return;
        };
        let names: HashSet<&str> = placed.iter().map(|p| p.name.as_str()).collect();
        let entries: Vec<CatalogEntry> = catalog::join_placed(records, &names)
            .into_iter()
            .filter_map(|record| {
                let game = placed.iter().find(|p| p.name == record.game_name)?;
                Some(CatalogEntry {
                    rom_file_name: game.file_name.clone(),
                    rom_path: game.destination.clone(),
                    record: catalog::transform(record, self.profile),
                })
            })
            .collect();

        let unmatched: BTreeSet<&str> = names
            .iter()
            .filter(|name| !records.iter().any(|r| r.game_name == **name))
            .copied()
            .collect();
        if !unmatched.is_empty() {
            log::debug!("{} placed game(s) have no catalog record", unmatched.len());
        }
        if entries.is_empty() {
            log::info!("No catalog records for '{system_id}'");
            return;
        }

        let writer = catalog_writer(format);
        let catalog_root = self.layout.catalog_root();
        match writer.write_catalog(system_id, &entries, catalog_root, self.options.dry_run) {
            Ok(path) => {
                platform_summary.catalog_entries = entries.len();
                platform_summary.catalog_path = Some(path);
            }
            Err(e) => {
                let destination = writer.catalog_path(system_id, catalog_root);
                log::error!(
                    "Cannot write {} {}: {e}",
                    writer.name(),
                    destination.display()
                );
                summary.failures.push(FailureRecord {
                    source: self.options.catalog.clone().unwrap_or_default(),
                    destination,
                    reason: e.to_string(),
                    privilege: false,
                });
            }
        }
    }

    fn place(&self, source: &Path, destination: &Path) -> PlacementOutcome {
        place(
            source,
            destination,
            self.options.mode,
            self.options.force,
            self.options.dry_run,
        )
    }
}

fn log_outcome(what: &str, outcome: &PlacementOutcome) {
    match outcome {
        PlacementOutcome::Created(d) => {
            log::info!("Placed {what}: {}", d.destination.display())
        }
        PlacementOutcome::Skipped(d) => {
            log::debug!("Exists, skipped {what}: {}", d.destination.display())
        }
        PlacementOutcome::Simulated(d) => log::info!(
            "DRY-RUN: Would {:?} {what} {} -> {}",
            d.action,
            d.source.display(),
            d.destination.display()
        ),
        PlacementOutcome::Failed {
            source,
            destination,
            error,
        } => log::error!(
            "Failed to place {what} {} -> {}: {error}",
            source.display(),
            destination.display()
        ),
    }
}
