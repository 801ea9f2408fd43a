//! Destination paths for one profile and root.

use std::path::{Path, PathBuf};

use romport_core::DestinationProfile;

/// Default metadata directory under the destination root.
const METADATA_DIR: &str = "metadata";

#[derive(Debug, Clone)]
pub struct DestinationLayout {
    root: PathBuf,
    roms_dir: PathBuf,
    metadata_root: PathBuf,
    metadata_colocated: bool,
    platforms_have_subdirectories: bool,
    catalog_root: PathBuf,
}

impl DestinationLayout {
    /// Layout rooted at `root_override`, or the profile's default destination.
    pub fn new(profile: &DestinationProfile, root_override: Option<&Path>) -> Self {
        let root = root_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| profile.default_destination.clone());
        let roms_dir = root.join(&profile.roms_path);
        let metadata_root = match &profile.metadata_path {
            Some(path) => root.join(path),
            None => root.join(METADATA_DIR),
        };
        let catalog_root = match &profile.catalog_path {
            Some(path) => root.join(path),
            None => roms_dir.clone(),
        };
        Self {
            root,
            roms_dir,
            metadata_root,
            metadata_colocated: profile.metadata_colocated_with_roms,
            platforms_have_subdirectories: profile.platforms_have_subdirectories,
            catalog_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn roms_dir(&self) -> &Path {
        &self.roms_dir
    }

    /// Directory catalog writers place their documents under.
    pub fn catalog_root(&self) -> &Path {
        &self.catalog_root
    }

    /// `<roms>/<system>`, or `<roms>` when systems share one directory.
    pub fn system_rom_dir(&self, system_id: &str) -> PathBuf {
        if self.platforms_have_subdirectories {
            self.roms_dir.join(system_id)
        } else {
            self.roms_dir.clone()
        }
    }

    pub fn game_path(&self, system_id: &str, file_name: &str) -> PathBuf {
        self.system_rom_dir(system_id).join(file_name)
    }

    /// Directory for one metadata subdirectory of one system.
    pub fn metadata_dir(&self, system_id: &str, subdir: &str) -> PathBuf {
        if self.metadata_colocated {
            self.system_rom_dir(system_id).join(subdir)
        } else {
            self.metadata_root.join(system_id).join(subdir)
        }
    }

    pub fn metadata_path(&self, system_id: &str, subdir: &str, file_name: &str) -> PathBuf {
        self.metadata_dir(system_id, subdir).join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use romport_core::Formats;

    fn profile(extra: &str) -> DestinationProfile {
        let doc = format!(
            r#"{{ "formats": {{ "test": {{
                "name": "Test",
                "description": "Test layout",
                "default_destination": "/dest",
                "roms_path": "roms"{extra}
            }} }} }}"#
        );
        Formats::parse(&doc).unwrap().get("test").unwrap().clone()
    }

    #[test]
    fn test_default_paths() {
        let layout = DestinationLayout::new(&profile(""), None);
        assert_eq!(layout.game_path("nes", "Zelda.nes"), PathBuf::from("/dest/roms/nes/Zelda.nes"));
        assert_eq!(
            layout.metadata_path("nes", "covers", "Zelda-box2dfront.png"),
            PathBuf::from("/dest/metadata/nes/covers/Zelda-box2dfront.png")
        );
        assert_eq!(layout.catalog_root(), Path::new("/dest/roms"));
    }

    #[test]
    fn test_root_override_and_metadata_override() {
        let layout = DestinationLayout::new(
            &profile(r#", "metadata_path": "downloaded_media""#),
            Some(Path::new("/mnt/sd")),
        );
        assert_eq!(layout.root(), Path::new("/mnt/sd"));
        assert_eq!(
            layout.metadata_dir("snes", "covers"),
            PathBuf::from("/mnt/sd/downloaded_media/snes/covers")
        );
    }

    #[test]
    fn test_absolute_metadata_override() {
        let layout =
            DestinationLayout::new(&profile(r#", "metadata_path": "/media/meta""#), None);
        assert_eq!(
            layout.metadata_dir("nes", "images"),
            PathBuf::from("/media/meta/nes/images")
        );
    }

    #[test]
    fn test_colocated_metadata() {
        let layout = DestinationLayout::new(&profile(r#", "metadata_subdir": true"#), None);
        assert_eq!(
            layout.metadata_dir("nes", "images"),
            PathBuf::from("/dest/roms/nes/images")
        );
    }

    #[test]
    fn test_flat_rom_directory() {
        let layout = DestinationLayout::new(
            &profile(r#", "platforms_have_subdirectories": false, "catalog_path": "playlists""#),
            None,
        );
        assert_eq!(layout.game_path("nes", "Zelda.nes"), PathBuf::from("/dest/roms/Zelda.nes"));
        assert_eq!(layout.catalog_root(), Path::new("/dest/playlists"));
    }
}
