use super::*;
use romport_core::{Answer, CustomEntityError, CustomEntityKind, Formats, Headless, ScriptedInteraction};

fn profile() -> DestinationProfile {
    let formats = Formats::parse(
        r#"{
            "formats": {
                "es-de": {
                    "name": "ES-DE",
                    "description": "EmulationStation Desktop Edition",
                    "default_destination": "/tmp/esde",
                    "platform_mappings": { "Nintendo Entertainment System": "nes" }
                }
            }
        }"#,
    )
    .unwrap();
    formats.get("es-de").unwrap().clone()
}

#[derive(Default)]
struct MemoryStore {
    entities: Vec<CustomEntity>,
    appends: usize,
}

impl CustomEntityStore for MemoryStore {
    fn kind(&self) -> CustomEntityKind {
        CustomEntityKind::SystemDefinition
    }

    fn find_existing(&self, archive_name: &str) -> Result<Option<String>, CustomEntityError> {
        Ok(self
            .entities
            .iter()
            .find(|e| e.display_name == archive_name)
            .map(|e| e.identifier.clone()))
    }

    fn append(
        &mut self,
        entity: &CustomEntity,
        dry_run: bool,
    ) -> Result<AppendOutcome, CustomEntityError> {
        self.appends += 1;
        if let Some(existing) = self.entities.iter().find(|e| e.identifier == entity.identifier) {
            return Ok(AppendOutcome::AlreadyPresent(existing.identifier.clone()));
        }
        if dry_run {
            return Ok(AppendOutcome::Simulated);
        }
        self.entities.push(entity.clone());
        Ok(AppendOutcome::Added)
    }
}

fn creation_answers() -> Vec<Answer> {
    vec![
        Answer::Yes,
        Answer::Text(String::new()),
        Answer::Text(String::new()),
        Answer::Text(String::new()),
        Answer::Text("handy".to_string()),
    ]
}

#[test]
fn test_configured_mapping_needs_no_io() {
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::default();
    let mapping = resolve_platform(
        "Nintendo Entertainment System",
        &profile(),
        &mut session,
        None,
        &mut prompter,
        false,
    )
    .unwrap();
    assert_eq!(mapping.system_id, "nes");
    assert_eq!(mapping.origin, MappingOrigin::Configured);
    assert!(prompter.asked().is_empty());
}

#[test]
fn test_headless_reports_unmapped() {
    let mut session = SessionState::new();
    let mapping = resolve_platform("Atari Lynx", &profile(), &mut session, None, &mut Headless, false);
    assert!(mapping.is_none());
    assert_eq!(session.unmapped().collect::<Vec<_>>(), vec!["Atari Lynx"]);
}

#[test]
fn test_dry_run_never_prompts() {
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::new(creation_answers());
    let mut store = MemoryStore::default();
    let mapping = resolve_platform(
        "Atari Lynx",
        &profile(),
        &mut session,
        Some(&mut store),
        &mut prompter,
        true,
    );
    assert!(mapping.is_none());
    assert!(prompter.asked().is_empty());
    assert!(store.entities.is_empty());
}

#[test]
fn test_interactive_creation_is_cached() {
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::new(creation_answers());
    let mut store = MemoryStore::default();

    let first = resolve_platform(
        "Atari Lynx",
        &profile(),
        &mut session,
        Some(&mut store),
        &mut prompter,
        false,
    )
    .unwrap();
    assert_eq!(first.system_id, "atarilynx");
    assert_eq!(first.origin, MappingOrigin::InteractivelyCreated);
    assert_eq!(store.entities.len(), 1);
    assert_eq!(store.entities[0].display_name, "Atari Lynx");
    assert!(store.entities[0].command.contains("handy_libretro"));

    let asked = prompter.asked().len();
    let second = resolve_platform(
        "Atari Lynx",
        &profile(),
        &mut session,
        Some(&mut store),
        &mut prompter,
        false,
    )
    .unwrap();
    assert_eq!(second, first);
    assert_eq!(prompter.asked().len(), asked);
    assert_eq!(store.appends, 1);
}

#[test]
fn test_existing_entity_reused_silently() {
    let mut store = MemoryStore::default();
    store.entities.push(CustomEntity::new(
        "Atari Lynx",
        "lynx",
        "Atari Lynx",
        DEFAULT_EXTENSIONS,
        String::new(),
    ));
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::default();

    let mapping = resolve_platform(
        "Atari Lynx",
        &profile(),
        &mut session,
        Some(&mut store),
        &mut prompter,
        false,
    )
    .unwrap();
    assert_eq!(mapping.system_id, "lynx");
    assert_eq!(mapping.origin, MappingOrigin::ExistingCustomEntityDetected);
    assert!(prompter.asked().is_empty());
}

#[test]
fn test_declined_creation_is_not_asked_again() {
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::new([Answer::No]);
    assert!(
        resolve_platform("Atari Lynx", &profile(), &mut session, None, &mut prompter, false)
            .is_none()
    );
    assert!(
        resolve_platform("Atari Lynx", &profile(), &mut session, None, &mut prompter, false)
            .is_none()
    );
    assert_eq!(prompter.asked().len(), 1);
}

#[test]
fn test_creation_without_store_maps_for_this_run() {
    let mut session = SessionState::new();
    let mut prompter = ScriptedInteraction::new(creation_answers());
    let mapping =
        resolve_platform("Atari Lynx", &profile(), &mut session, None, &mut prompter, false)
            .unwrap();
    assert_eq!(mapping.system_id, "atarilynx");
    assert_eq!(mapping.origin, MappingOrigin::InteractivelyCreated);
}
