use std::path::{Path, PathBuf};

use crate::{CatalogEntry, CatalogWriter, FrontendError, write_atomic};

/// File name of an ES-DE per-system catalog.
pub const GAMELIST_FILE: &str = "gamelist.xml";

/// ES-DE (EmulationStation Desktop Edition) `gamelist.xml` writer.
pub struct GamelistWriter;

impl GamelistWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GamelistWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogWriter for GamelistWriter {
    fn name(&self) -> &'static str {
        "ES-DE gamelist"
    }

    fn catalog_path(&self, system_id: &str, dir: &Path) -> PathBuf {
        dir.join(system_id).join(GAMELIST_FILE)
    }

    fn write_catalog(
        &self,
        system_id: &str,
        entries: &[CatalogEntry],
        dir: &Path,
        dry_run: bool,
    ) -> Result<PathBuf, FrontendError> {
        let gamelist_path = self.catalog_path(system_id, dir);
        let xml = render_gamelist(entries);

        if dry_run {
            log::info!(
                "DRY-RUN: Would write {} catalog entries to {}",
                entries.len(),
                gamelist_path.display()
            );
            return Ok(gamelist_path);
        }

        write_atomic(&gamelist_path, &xml)?;
        log::info!(
            "Wrote {} catalog entries to {}",
            entries.len(),
            gamelist_path.display()
        );
        Ok(gamelist_path)
    }
}

/// Render a full `gamelist.xml` document. `path` always comes first and is
/// derived from the placed ROM; a catalog field named `path` is ignored.
pub fn render_gamelist(entries: &[CatalogEntry]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\"?>\n");
    xml.push_str("<gameList>\n");

    for entry in entries {
        xml.push_str("  <game>\n");
        write_tag(&mut xml, "path", &format!("./{}", entry.rom_file_name));
        for (field, value) in entry.record.iter() {
            if field == "path" || value.is_empty() {
                continue;
            }
            write_tag(&mut xml, &sanitize_tag(field), value);
        }
        xml.push_str("  </game>\n");
    }

    xml.push_str("</gameList>\n");
    xml
}

pub(crate) fn write_tag(xml: &mut String, tag: &str, value: &str) {
    xml.push_str("    <");
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escape_xml(value));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Make a field name usable as an XML element name.
fn sanitize_tag(field: &str) -> String {
    let mut tag: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !tag.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        tag.insert(0, '_');
    }
    tag
}

#[cfg(test)]
#[path = "tests/esde_tests.rs"]
mod tests;
