use std::fs;
use std::path::{Path, PathBuf};

use romport_core::{Answer, Archive, DestinationProfile, Formats, Headless, ScriptedInteraction};
use romport_lib::{ExportOptions, ExportSummary, Exporter, MappingOrigin, PlacementMode};
use serde_json::json;
use tempfile::TempDir;

const NES: &str = "Nintendo Entertainment System";

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn esde_profile(extra: serde_json::Value) -> DestinationProfile {
    let mut format = json!({
        "name": "ES-DE",
        "description": "EmulationStation Desktop Edition",
        "default_destination": "/unused",
        "roms_path": "roms",
        "metadata_path": "downloaded_media",
        "platform_mappings": { NES: "nes" },
        "metadata_mappings": {
            "Images/Box - Front": "covers/box2dfront",
            "Manuals": "manuals/manual",
            "Videos": null
        }
    });
    if let (Some(base), Some(extra)) = (format.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    let doc = json!({ "formats": { "es-de": format } });
    Formats::parse(&doc.to_string())
        .unwrap()
        .get("es-de")
        .unwrap()
        .clone()
}

/// Archive with one NES game and its box art.
fn zelda_archive() -> (TempDir, Archive, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("archive");
    write(&root.join("Games").join(NES).join("Zelda.nes"), b"NES\x1a zelda");
    write(
        &root.join("Metadata/Images/Box - Front").join(NES).join("Zelda.png"),
        b"png",
    );
    let archive = Archive::open(&root).unwrap();
    let dest = dir.path().join("dest");
    (dir, archive, dest)
}

fn options(dest: &Path) -> ExportOptions {
    ExportOptions {
        destination: Some(dest.to_path_buf()),
        mode: PlacementMode::Copy,
        ..ExportOptions::default()
    }
}

fn run(archive: &Archive, profile: &DestinationProfile, options: ExportOptions) -> ExportSummary {
    let mut prompter = Headless;
    Exporter::new(archive, profile, options, &mut prompter)
        .run(&|_| {})
        .unwrap()
}

#[cfg(unix)]
#[test]
fn test_end_to_end_symlink_then_idempotent() {
    let (_dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({}));
    let opts = ExportOptions {
        mode: PlacementMode::Symlink,
        ..options(&dest)
    };

    let first = run(&archive, &profile, opts.clone());
    assert_eq!(first.totals.games.created, 1);
    assert_eq!(first.totals.metadata.created, 1);
    assert_eq!(first.totals.failed(), 0);

    let rom = dest.join("roms/nes/Zelda.nes");
    let cover = dest.join("downloaded_media/nes/covers/Zelda-box2dfront.png");
    assert!(fs::symlink_metadata(&rom).unwrap().file_type().is_symlink());
    assert!(fs::symlink_metadata(&cover).unwrap().file_type().is_symlink());
    assert_eq!(fs::read(&cover).unwrap(), b"png");

    let second = run(&archive, &profile, opts);
    assert_eq!(second.totals.created(), 0);
    assert_eq!(second.totals.skipped(), 2);
}

#[test]
fn test_dry_run_matches_real_run() {
    let (_dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({}));

    let dry = run(
        &archive,
        &profile,
        ExportOptions {
            dry_run: true,
            ..options(&dest)
        },
    );
    assert!(dry.dry_run);
    assert_eq!(dry.totals.simulated(), 2);
    assert_eq!(dry.totals.created(), 0);
    assert!(!dest.exists());

    let real = run(&archive, &profile, options(&dest));
    assert_eq!(real.totals.created(), dry.totals.simulated());
    assert_eq!(real.totals.games.bytes, dry.totals.games.bytes);
    assert!(dest.join("roms/nes/Zelda.nes").is_file());
}

#[test]
fn test_dry_run_over_exported_tree_is_noop() {
    let (_dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({}));
    let first = run(&archive, &profile, options(&dest));
    assert_eq!(first.totals.created(), 2);

    let dry = run(
        &archive,
        &profile,
        ExportOptions {
            dry_run: true,
            ..options(&dest)
        },
    );
    assert_eq!(dry.totals.simulated(), 0);
    assert_eq!(dry.totals.skipped(), 2);
    assert_eq!(dry.totals.games.bytes, 0);
    assert!(dry.platforms[0].metadata_by_root.is_empty());

    let again = run(&archive, &profile, options(&dest));
    assert_eq!(again.totals.created(), 0);
    assert_eq!(again.totals.skipped(), dry.totals.skipped());
}

#[test]
fn test_force_replaces_existing() {
    let (_dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({}));
    write(&dest.join("roms/nes/Zelda.nes"), b"stale");

    let skipped = run(&archive, &profile, options(&dest));
    assert_eq!(skipped.totals.games.skipped, 1);
    assert_eq!(fs::read(dest.join("roms/nes/Zelda.nes")).unwrap(), b"stale");

    let forced = run(
        &archive,
        &profile,
        ExportOptions {
            force: true,
            ..options(&dest)
        },
    );
    assert_eq!(forced.totals.games.created, 1);
    assert_eq!(fs::read(dest.join("roms/nes/Zelda.nes")).unwrap(), b"NES\x1a zelda");
}

#[test]
fn test_rename_metadata_to_match_rom() {
    let (_dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({ "rename_metadata_to_match_rom": true }));
    run(&archive, &profile, options(&dest));
    assert!(dest.join("downloaded_media/nes/covers/Zelda.png").is_file());
}

#[test]
fn test_backport_never_overwrites_archive() {
    let (dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({}));
    let archive_cover = dir.path().join("archive/Metadata/Images/Box - Front").join(NES).join("Zelda.png");

    // Destination carries a different cover and a manual the archive lacks
    write(&dest.join("downloaded_media/nes/covers/Zelda-box2dfront.png"), b"other");
    write(&dest.join("downloaded_media/nes/manuals/Zelda-manual.pdf"), b"manual");

    let summary = run(
        &archive,
        &profile,
        ExportOptions {
            backport: true,
            force: true,
            ..options(&dest)
        },
    );

    let nes = &summary.platforms[0];
    assert_eq!(nes.backport.copied, 1);
    assert_eq!(nes.backport.skipped_archive_has_it, 1);
    assert_eq!(fs::read(&archive_cover).unwrap(), b"png");
    assert_eq!(
        fs::read(dir.path().join("archive/Metadata/Manuals").join(NES).join("Zelda.pdf")).unwrap(),
        b"manual"
    );
}

#[test]
fn test_unmapped_platform_and_category_reported() {
    let (dir, archive, dest) = zelda_archive();
    write(&dir.path().join("archive/Games/Atari Lynx/Chips Challenge.lnx"), b"lnx");
    write(
        &dir.path().join("archive/Metadata/Images/Screenshot").join(NES).join("Zelda.png"),
        b"shot",
    );
    write(&dir.path().join("archive/Metadata/Videos").join(NES).join("Zelda.mp4"), b"mp4");
    let profile = esde_profile(json!({}));

    let summary = run(&archive, &profile, options(&dest));
    assert_eq!(summary.unmapped_platforms, vec!["Atari Lynx".to_string()]);
    assert_eq!(summary.platforms.len(), 1);
    assert_eq!(summary.platforms[0].unmapped_categories, vec!["Images/Screenshot".to_string()]);
    assert_eq!(summary.totals.failed(), 0);
    assert!(!dest.join("roms/atarilynx").exists());
}

#[test]
fn test_existing_custom_system_is_reused() {
    let (dir, archive, dest) = zelda_archive();
    write(&dir.path().join("archive/Games/Atari Lynx/Chips Challenge.lnx"), b"lnx");
    let systems = dir.path().join("custom_systems/es_systems.xml");
    write(
        &systems,
        br#"<?xml version="1.0"?>
<systemList>
  <system>
    <name>lynx</name>
    <fullname>Atari Lynx</fullname>
    <path>./roms/lynx</path>
  </system>
</systemList>
"#,
    );
    let profile = esde_profile(json!({ "custom_systems_path": systems.to_string_lossy() }));

    let summary = run(&archive, &profile, options(&dest));
    let lynx = summary
        .platforms
        .iter()
        .find(|p| p.platform_name == "Atari Lynx")
        .unwrap();
    assert_eq!(lynx.system_id.as_deref(), Some("lynx"));
    assert_eq!(lynx.origin, Some(MappingOrigin::ExistingCustomEntityDetected));
    assert!(dest.join("roms/lynx/Chips Challenge.lnx").is_file());
    assert!(summary.unmapped_platforms.is_empty());
}

#[test]
fn test_interactive_custom_system_created_once() {
    let (dir, archive, dest) = zelda_archive();
    write(&dir.path().join("archive/Games/Atari Lynx/Chips Challenge.lnx"), b"lnx");
    let systems = dir.path().join("custom_systems/es_systems.xml");
    let profile = esde_profile(json!({ "custom_systems_path": systems.to_string_lossy() }));

    let mut prompter = ScriptedInteraction::new([
        Answer::Yes,
        Answer::Text(String::new()),
        Answer::Text(String::new()),
        Answer::Text(".lnx,.zip".to_string()),
        Answer::Text("handy".to_string()),
    ]);
    let summary = Exporter::new(&archive, &profile, options(&dest), &mut prompter)
        .run(&|_| {})
        .unwrap();
    assert_eq!(prompter.remaining(), 0);

    let lynx = summary
        .platforms
        .iter()
        .find(|p| p.platform_name == "Atari Lynx")
        .unwrap();
    assert_eq!(lynx.system_id.as_deref(), Some("atarilynx"));
    assert_eq!(lynx.origin, Some(MappingOrigin::InteractivelyCreated));

    let written = fs::read_to_string(&systems).unwrap();
    assert!(written.contains("<name>atarilynx</name>"));
    assert!(written.contains("handy_libretro.so"));

    // A second run finds the entity instead of asking again
    let second = run(&archive, &profile, options(&dest));
    let lynx = second
        .platforms
        .iter()
        .find(|p| p.platform_name == "Atari Lynx")
        .unwrap();
    assert_eq!(lynx.origin, Some(MappingOrigin::ExistingCustomEntityDetected));
    assert_eq!(fs::read_to_string(&systems).unwrap().matches("<system>").count(), 1);
}

#[test]
fn test_gamelist_written_for_placed_games_only() {
    let (dir, archive, dest) = zelda_archive();
    let catalog = dir.path().join("catalog.csv");
    write(
        &catalog,
        b"Name,Rating,Release Date,ESRB\nZelda,4.8,1986,E\nMetroid,4.5,1986,E\n",
    );
    let profile = esde_profile(json!({
        "catalog_format": "gamelist",
        "catalog_field_mappings": { "Name": "name", "Rating": "rating", "Release Date": "releasedate" },
        "catalog_field_conversions": {
            "Rating": { "type": "normalize", "source_scale": 5.0, "target_scale": 1.0 },
            "Release Date": { "type": "date", "format": "{year}{month}{day}T000000" }
        }
    }));

    let summary = run(
        &archive,
        &profile,
        ExportOptions {
            catalog: Some(catalog),
            ..options(&dest)
        },
    );
    assert_eq!(summary.totals.catalog_entries, 1);

    let gamelist = fs::read_to_string(dest.join("roms/nes/gamelist.xml")).unwrap();
    assert!(gamelist.contains("<path>./Zelda.nes</path>"));
    assert!(gamelist.contains("<rating>0.96</rating>"));
    assert!(gamelist.contains("<releasedate>19860101T000000</releasedate>"));
    assert!(gamelist.contains("<esrb>E</esrb>"));
    assert!(!gamelist.contains("Metroid"));
}

#[test]
fn test_missing_catalog_is_fatal_before_any_write() {
    let (dir, archive, dest) = zelda_archive();
    let profile = esde_profile(json!({ "catalog_format": "gamelist" }));
    let mut prompter = Headless;
    let result = Exporter::new(
        &archive,
        &profile,
        ExportOptions {
            catalog: Some(dir.path().join("missing.csv")),
            ..options(&dest)
        },
        &mut prompter,
    )
    .run(&|_| {});
    assert!(matches!(result, Err(romport_core::ExportError::Catalog(_))));
    assert!(!dest.exists());
}

#[test]
fn test_variant_subdirectories_from_options() {
    let (dir, archive, dest) = zelda_archive();
    let box_dir = dir.path().join("archive/Metadata/Images/Box - Front").join(NES);
    fs::remove_file(box_dir.join("Zelda.png")).unwrap();
    write(&box_dir.join("Japan/Zelda.png"), b"japan");
    let profile = esde_profile(json!({}));

    let without = run(&archive, &profile, options(&dest));
    assert_eq!(without.totals.metadata.created, 0);

    let with = run(
        &archive,
        &profile,
        ExportOptions {
            variants: Some("Japan".to_string()),
            ..options(&dest)
        },
    );
    assert_eq!(with.totals.metadata.created, 1);
    assert_eq!(
        fs::read(dest.join("downloaded_media/nes/covers/Zelda-box2dfront.png")).unwrap(),
        b"japan"
    );
}

#[test]
fn test_backport_sees_variant_copy_in_archive() {
    let (dir, archive, dest) = zelda_archive();
    let box_dir = dir.path().join("archive/Metadata/Images/Box - Front").join(NES);
    fs::remove_file(box_dir.join("Zelda.png")).unwrap();
    write(&box_dir.join("Japan/Zelda.png"), b"japan");
    let profile = esde_profile(json!({}));
    let opts = ExportOptions {
        variants: Some("Japan".to_string()),
        backport: true,
        ..options(&dest)
    };

    let first = run(&archive, &profile, opts.clone());
    let nes = &first.platforms[0];
    assert_eq!(nes.metadata.created, 1);
    assert_eq!(nes.backport.copied, 0);
    assert_eq!(nes.backport.skipped_archive_has_it, 1);
    assert!(!box_dir.join("Zelda.png").exists());

    let second = run(&archive, &profile, opts);
    assert_eq!(second.platforms[0].ambiguous, 0);
    assert_eq!(second.platforms[0].metadata.skipped, 1);
}
