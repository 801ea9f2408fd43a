pub mod catalog;
pub mod error;
pub mod es_systems;
pub mod esde;
pub mod playlist;

pub use catalog::{CatalogRecord, TransformedRecord};
pub use error::FrontendError;
pub use es_systems::EsSystemsFile;
pub use esde::GamelistWriter;
pub use playlist::{PlaylistDefinitionsFile, PlaylistWriter};

use std::fs;
use std::path::{Path, PathBuf};

use romport_core::{CatalogFormat, CustomEntityKind, CustomEntityStore, DestinationProfile};

/// One placed game with its transformed catalog record.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// ROM file name as placed in the destination
    pub rom_file_name: String,
    /// Full destination path of the ROM
    pub rom_path: PathBuf,
    pub record: TransformedRecord,
}

/// Trait for destination catalog document writers.
pub trait CatalogWriter {
    fn name(&self) -> &'static str;

    /// Path of the document for `system_id` under `dir`.
    fn catalog_path(&self, system_id: &str, dir: &Path) -> PathBuf;

    /// Write the catalog for one system. In dry-run nothing is written and
    /// the path that would have been written is returned.
    fn write_catalog(
        &self,
        system_id: &str,
        entries: &[CatalogEntry],
        dir: &Path,
        dry_run: bool,
    ) -> Result<PathBuf, FrontendError>;
}

/// The catalog writer for a profile's catalog format.
pub fn catalog_writer(format: CatalogFormat) -> Box<dyn CatalogWriter> {
    match format {
        CatalogFormat::Gamelist => Box::new(GamelistWriter::new()),
        CatalogFormat::Playlist => Box::new(PlaylistWriter::new()),
    }
}

/// The custom entity store a profile points at, if it configures one.
pub fn open_entity_store(profile: &DestinationProfile) -> Option<Box<dyn CustomEntityStore>> {
    let path = profile.custom_entities_path.clone()?;
    Some(match profile.custom_entity_kind {
        CustomEntityKind::SystemDefinition => Box::new(EsSystemsFile::new(path)),
        CustomEntityKind::PlaylistDefinition => Box::new(PlaylistDefinitionsFile::new(path)),
    })
}

/// Write `contents` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
