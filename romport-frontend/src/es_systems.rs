//! ES-DE custom systems file (`es_systems.xml`).
//!
//! New `<system>` blocks are spliced in before the closing `</systemList>`
//! so existing content, comments and formatting survive untouched.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use romport_core::util::normalize_identifier;
use romport_core::{AppendOutcome, CustomEntity, CustomEntityError, CustomEntityKind, CustomEntityStore};

use crate::esde::write_tag;
use crate::write_atomic;

const TEMPLATE: &str = "<?xml version=\"1.0\"?>\n<systemList>\n</systemList>\n";
const CLOSING_TAG: &str = "</systemList>";
const ARCHIVE_MARKER: &str = "archive:";

/// A `<system>` entry as read back from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemEntry {
    pub name: String,
    pub fullname: String,
    pub path: String,
    /// Archive platform recorded in the block's `archive:` comment
    pub archive_name: Option<String>,
}

/// Custom system definitions for ES-DE.
#[derive(Debug, Clone)]
pub struct EsSystemsFile {
    path: PathBuf,
}

impl EsSystemsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Current file contents, or the empty template when the file is absent.
    fn read_or_template(&self) -> Result<String, CustomEntityError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TEMPLATE.to_string()),
            Err(source) => Err(CustomEntityError::Io {
                path: self.display_path(),
                source,
            }),
        }
    }

    /// All systems currently defined.
    pub fn systems(&self) -> Result<Vec<SystemEntry>, CustomEntityError> {
        let contents = self.read_or_template()?;
        parse_systems(&contents).map_err(|e| CustomEntityError::parse(self.display_path(), e))
    }
}

impl CustomEntityStore for EsSystemsFile {
    fn kind(&self) -> CustomEntityKind {
        CustomEntityKind::SystemDefinition
    }

    fn find_existing(&self, archive_name: &str) -> Result<Option<String>, CustomEntityError> {
        let normalized = normalize_identifier(archive_name);
        Ok(self
            .systems()?
            .into_iter()
            .find(|s| {
                s.archive_name.as_deref() == Some(archive_name)
                    || s.fullname == archive_name
                    || s.name == normalized
            })
            .map(|s| s.name))
    }

    fn append(
        &mut self,
        entity: &CustomEntity,
        dry_run: bool,
    ) -> Result<AppendOutcome, CustomEntityError> {
        let contents = self.read_or_template()?;
        let systems =
            parse_systems(&contents).map_err(|e| CustomEntityError::parse(self.display_path(), e))?;
        if let Some(existing) = systems.iter().find(|s| s.name == entity.identifier) {
            log::warn!(
                "System '{}' already exists in {}; using existing configuration",
                existing.name,
                self.path.display()
            );
            return Ok(AppendOutcome::AlreadyPresent(existing.name.clone()));
        }

        let block = render_system(entity);
        log::info!("Custom system XML to be added:\n{}", block.trim_end());

        let insert_at = contents.rfind(CLOSING_TAG).ok_or_else(|| {
            CustomEntityError::parse(self.display_path(), format!("missing {CLOSING_TAG}"))
        })?;

        if dry_run {
            log::info!(
                "DRY-RUN: Would add '{}' to {}",
                entity.display_name,
                self.path.display()
            );
            return Ok(AppendOutcome::Simulated);
        }

        let mut updated = String::with_capacity(contents.len() + block.len());
        updated.push_str(&contents[..insert_at]);
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&block);
        updated.push_str(&contents[insert_at..]);

        write_atomic(&self.path, &updated).map_err(|source| CustomEntityError::Io {
            path: self.display_path(),
            source,
        })?;
        log::info!(
            "Added custom system '{}' to {}",
            entity.identifier,
            self.path.display()
        );
        Ok(AppendOutcome::Added)
    }
}

/// Render one `<system>` block, two-space indented, with a trailing newline.
pub fn render_system(entity: &CustomEntity) -> String {
    let mut xml = String::from("  <system>\n");
    if !entity.archive_name.is_empty() {
        // "--" may not appear inside an XML comment
        let name = entity.archive_name.replace("--", "- -");
        xml.push_str(&format!("    <!-- {ARCHIVE_MARKER} {name} -->\n"));
    }
    for (tag, value) in [
        ("name", entity.identifier.as_str()),
        ("fullname", entity.display_name.as_str()),
        ("path", entity.path.as_str()),
        ("extension", entity.extensions.as_str()),
        ("command", entity.command.as_str()),
        ("platform", entity.identifier.as_str()),
        ("theme", entity.theme.as_str()),
    ] {
        write_tag(&mut xml, tag, value);
    }
    xml.push_str("  </system>\n");
    xml
}

fn parse_systems(contents: &str) -> Result<Vec<SystemEntry>, quick_xml::Error> {
    let mut xml = Reader::from_str(contents);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut systems = Vec::new();
    let mut current_tag = String::new();
    let mut current: Option<SystemEntry> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "system" => current = Some(SystemEntry::default()),
                    _ => current_tag = tag_name,
                }
            }
            Event::Text(ref e) => {
                if let Some(ref mut system) = current {
                    let text = e.unescape()?.to_string();
                    match current_tag.as_str() {
                        "name" => system.name = text,
                        "fullname" => system.fullname = text,
                        "path" => system.path = text,
                        _ => {}
                    }
                }
            }
            Event::Comment(ref e) => {
                if let Some(ref mut system) = current {
                    let text = String::from_utf8_lossy(e);
                    if let Some(name) = text.trim().strip_prefix(ARCHIVE_MARKER) {
                        system.archive_name = Some(name.trim().to_string());
                    }
                }
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"system" {
                    if let Some(system) = current.take() {
                        systems.push(system);
                    }
                }
                current_tag.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(systems)
}

#[cfg(test)]
#[path = "tests/es_systems_tests.rs"]
mod tests;
