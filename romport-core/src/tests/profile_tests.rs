use super::*;

const SAMPLE: &str = r#"
{
  "formats": {
    "_documentation": { "note": "ignored" },
    "es-de": {
      "name": "ES-DE",
      "description": "EmulationStation Desktop Edition",
      "default_destination": "/tmp/esde",
      "roms_path": "ROMs",
      "metadata_path": "downloaded_media",
      "metadata_subdir": false,
      "rename_metadata_to_match_rom": true,
      "custom_systems_path": "/tmp/esde/custom_systems/es_systems.xml",
      "catalog_format": "gamelist",
      "platform_mappings": {
        "Nintendo Entertainment System": "nes"
      },
      "metadata_mappings": {
        "Images/Box - Front": "covers/box2dfront",
        "Images/Banner": null
      },
      "catalog_field_mappings": { "Name": "name", "Release Date": "releasedate" },
      "catalog_field_conversions": {
        "Release Date": { "type": "date", "format": "{year}{month}{day}T000000" },
        "Rating": { "type": "normalize", "source_scale": 5.0, "target_scale": 1.0 }
      }
    }
  }
}
"#;

#[test]
fn test_parse_sample_profile() {
    let formats = Formats::parse(SAMPLE).unwrap();
    assert_eq!(formats.len(), 1);
    let esde = formats.get("ES-DE").unwrap();
    assert_eq!(esde.id, "es-de");
    assert_eq!(esde.name, "ES-DE");
    assert_eq!(esde.roms_path, PathBuf::from("ROMs"));
    assert!(esde.rename_metadata_to_match_rom);
    assert!(esde.platforms_have_subdirectories);
    assert_eq!(esde.custom_entity_kind, CustomEntityKind::SystemDefinition);
    assert_eq!(esde.catalog_format, Some(CatalogFormat::Gamelist));
    assert_eq!(esde.catalog_name_field, "Name");
    assert_eq!(
        esde.platform_mappings.get("Nintendo Entertainment System").map(String::as_str),
        Some("nes")
    );

    let front = esde.metadata_mappings["Images/Box - Front"].as_ref().unwrap();
    assert_eq!(front.subdir, "covers");
    assert_eq!(front.prefix, "box2dfront");
    assert!(esde.metadata_mappings["Images/Banner"].is_none());
    assert_eq!(esde.mapped_categories().count(), 1);

    match &esde.catalog_field_conversions["Rating"] {
        ConversionRule::Normalize { decimal_places, .. } => assert_eq!(*decimal_places, 2),
        other => panic!("unexpected rule {other:?}"),
    }
    match &esde.catalog_field_conversions["Release Date"] {
        ConversionRule::Date {
            default_month,
            default_day,
            ..
        } => {
            assert_eq!(*default_month, 1);
            assert_eq!(*default_day, 1);
        }
        other => panic!("unexpected rule {other:?}"),
    }
}

#[test]
fn test_missing_required_fields() {
    let doc = r#"{ "formats": { "broken": { "name": "Broken" } } }"#;
    match Formats::parse(doc) {
        Err(ProfileError::MissingFields { format, fields }) => {
            assert_eq!(format, "broken");
            assert_eq!(fields, vec!["default_destination", "description"]);
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn test_empty_destination_rejected() {
    let doc = r#"{ "formats": { "x": { "name": "X", "description": "d", "default_destination": " " } } }"#;
    assert!(matches!(
        Formats::parse(doc),
        Err(ProfileError::EmptyDestination { .. })
    ));
}

#[test]
fn test_missing_formats_key() {
    assert!(matches!(
        Formats::parse(r#"{ "profiles": {} }"#),
        Err(ProfileError::InvalidDocument(_))
    ));
}

#[test]
fn test_metadata_mapping_needs_two_tokens() {
    for bad in ["covers", "a/b/c", "/prefix", "covers/"] {
        let doc = format!(
            r#"{{ "formats": {{ "x": {{ "name": "X", "description": "d", "default_destination": "/tmp/x",
                 "metadata_mappings": {{ "Images/Box - Front": "{bad}" }} }} }} }}"#
        );
        assert!(
            matches!(
                Formats::parse(&doc),
                Err(ProfileError::InvalidMetadataMapping { .. })
            ),
            "value {bad:?} should be rejected"
        );
    }
}

#[test]
fn test_zero_source_scale_rejected() {
    let doc = r#"{ "formats": { "x": { "name": "X", "description": "d", "default_destination": "/tmp/x",
        "catalog_field_conversions": { "Rating": { "type": "normalize", "source_scale": 0, "target_scale": 1 } } } } }"#;
    assert!(matches!(
        Formats::parse(doc),
        Err(ProfileError::InvalidConversion { .. })
    ));
}

#[test]
fn test_excessive_decimal_places_rejected() {
    let doc = r#"{ "formats": { "x": { "name": "X", "description": "d", "default_destination": "/tmp/x",
        "catalog_field_conversions": { "Rating": { "type": "normalize", "source_scale": 5, "target_scale": 1, "decimal_places": 4000000000 } } } } }"#;
    match Formats::parse(doc) {
        Err(ProfileError::InvalidConversion { field, reason, .. }) => {
            assert_eq!(field, "Rating");
            assert!(reason.contains("decimal_places"));
        }
        other => panic!("expected InvalidConversion, got {other:?}"),
    }

    let at_limit = doc.replace("4000000000", "15");
    assert!(Formats::parse(&at_limit).is_ok());
}

#[test]
fn test_unknown_format_lists_available() {
    let formats = Formats::parse(SAMPLE).unwrap();
    match formats.get("attract") {
        Err(ProfileError::NotFound { requested, available }) => {
            assert_eq!(requested, "attract");
            assert_eq!(available, vec!["es-de"]);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_not_found_maps_to_fatal_not_found() {
    let formats = Formats::parse(SAMPLE).unwrap();
    let err: crate::ExportError = formats.get("nope").unwrap_err().into();
    assert!(matches!(err, crate::ExportError::NotFound(_)));
}

#[test]
fn test_playlist_kind() {
    let doc = r#"{ "formats": { "retroarch": { "name": "RetroArch", "description": "d",
        "default_destination": "/tmp/ra", "custom_entity_kind": "playlist",
        "platforms_have_subdirectories": false } } }"#;
    let formats = Formats::parse(doc).unwrap();
    let ra = formats.get("retroarch").unwrap();
    assert_eq!(ra.custom_entity_kind, CustomEntityKind::PlaylistDefinition);
    assert!(!ra.platforms_have_subdirectories);
}

#[test]
fn test_load_from_disk_records_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fe_formats.json");
    std::fs::write(&path, SAMPLE).unwrap();
    let formats = Formats::load(&path).unwrap();
    assert_eq!(formats.source(), Some(path.as_path()));
}

#[test]
fn test_shipped_formats_document_is_valid() {
    let formats = Formats::parse(include_str!("../../../fe_formats.json")).unwrap();
    assert_eq!(formats.ids().collect::<Vec<_>>(), vec!["es-de", "retroarch"]);

    let esde = formats.get("es-de").unwrap();
    assert_eq!(esde.custom_entity_kind, CustomEntityKind::SystemDefinition);
    assert_eq!(esde.catalog_format, Some(CatalogFormat::Gamelist));
    assert_eq!(esde.platform_mappings.get("Nintendo Entertainment System").map(String::as_str), Some("nes"));

    let retroarch = formats.get("retroarch").unwrap();
    assert_eq!(retroarch.custom_entity_kind, CustomEntityKind::PlaylistDefinition);
    assert_eq!(retroarch.catalog_format, Some(CatalogFormat::Playlist));
    assert!(retroarch.metadata_mappings.get("Videos").unwrap().is_none());
}
