//! Name Resolver: archive platform name to destination system identifier.
//!
//! Lookup order is the profile's configured mappings, then this run's
//! session cache, then an existing custom entity in the destination's
//! definitions file, and finally (interactive, non-dry runs only) a new
//! custom entity built from the user's answers.

use romport_core::entity::DEFAULT_EXTENSIONS;
use romport_core::interaction::{self, Interaction};
use romport_core::{AppendOutcome, CustomEntity, CustomEntityStore, DestinationProfile};
use serde::Serialize;

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MappingOrigin {
    /// From the profile's `platform_mappings`
    Configured,
    /// A custom entity was created from the user's answers this run
    InteractivelyCreated,
    /// An existing custom entity for the platform was reused
    ExistingCustomEntityDetected,
}

/// A resolved platform mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformMapping {
    pub archive_name: String,
    pub system_id: String,
    pub origin: MappingOrigin,
}

/// Resolve `platform_name` for `profile`.
///
/// Returns `None` when the platform stays unmapped for this run; it is then
/// recorded in the session so the caller can report it and nobody is asked
/// about it twice.
pub fn resolve_platform(
    platform_name: &str,
    profile: &DestinationProfile,
    session: &mut SessionState,
    mut store: Option<&mut dyn CustomEntityStore>,
    prompter: &mut dyn Interaction,
    dry_run: bool,
) -> Option<PlatformMapping> {
    if let Some(system_id) = profile.platform_mappings.get(platform_name) {
        return Some(PlatformMapping {
            archive_name: platform_name.to_string(),
            system_id: system_id.clone(),
            origin: MappingOrigin::Configured,
        });
    }

    if let Some(mapping) = session.cached_mapping(platform_name) {
        return Some(mapping.clone());
    }
    if session.is_unmapped(platform_name) {
        return None;
    }

    if let Some(store) = store.as_deref_mut() {
        match store.find_existing(platform_name) {
            Ok(Some(system_id)) => {
                log::info!(
                    "Reusing existing {} '{}' for platform '{}'",
                    store.kind().label(),
                    system_id,
                    platform_name
                );
                let mapping = PlatformMapping {
                    archive_name: platform_name.to_string(),
                    system_id,
                    origin: MappingOrigin::ExistingCustomEntityDetected,
                };
                session.record_mapping(mapping.clone());
                return Some(mapping);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Cannot check existing custom entities: {e}"),
        }
    }

    if dry_run || !prompter.is_interactive() {
        log::warn!(
            "Platform '{}' has no mapping for {}; skipping",
            platform_name,
            profile.name
        );
        session.record_unmapped(platform_name);
        return None;
    }

    let mapping = prompt_custom_entity(platform_name, profile, store, prompter);
    match &mapping {
        Some(mapping) => session.record_mapping(mapping.clone()),
        None => session.record_unmapped(platform_name),
    }
    mapping
}

/// Collect the fields of a new custom entity and hand them to the store.
fn prompt_custom_entity(
    platform_name: &str,
    profile: &DestinationProfile,
    store: Option<&mut dyn CustomEntityStore>,
    prompter: &mut dyn Interaction,
) -> Option<PlatformMapping> {
    let kind = profile.custom_entity_kind;
    let question = format!(
        "Platform '{}' is not mapped for {}. Create a {}?",
        platform_name,
        profile.name,
        kind.label()
    );
    if !interaction::confirm(prompter, &question, true)? {
        log::info!("Platform '{platform_name}' left unmapped");
        return None;
    }

    let identifier = interaction::text(
        prompter,
        "Identifier (short name, no spaces)",
        &CustomEntity::default_identifier(platform_name),
    )?;
    let display_name = interaction::text(prompter, "Display name", platform_name)?;
    let extensions = interaction::text(prompter, "File extensions", DEFAULT_EXTENSIONS)?;
    let command_answer =
        interaction::text(prompter, kind.command_prompt(), kind.default_command_answer())?;

    let entity = CustomEntity::new(
        platform_name,
        &identifier,
        &display_name,
        &extensions,
        kind.command_from_answer(&command_answer),
    );

    let Some(store) = store else {
        log::warn!(
            "{} has no custom entity file configured; mapping '{}' -> '{}' for this run only",
            profile.name,
            platform_name,
            entity.identifier
        );
        return Some(PlatformMapping {
            archive_name: platform_name.to_string(),
            system_id: entity.identifier,
            origin: MappingOrigin::InteractivelyCreated,
        });
    };

    match store.append(&entity, false) {
        Ok(AppendOutcome::Added) | Ok(AppendOutcome::Simulated) => Some(PlatformMapping {
            archive_name: platform_name.to_string(),
            system_id: entity.identifier,
            origin: MappingOrigin::InteractivelyCreated,
        }),
        Ok(AppendOutcome::AlreadyPresent(system_id)) => Some(PlatformMapping {
            archive_name: platform_name.to_string(),
            system_id,
            origin: MappingOrigin::ExistingCustomEntityDetected,
        }),
        Err(e) => {
            log::error!("Cannot add {} for '{}': {e}", kind.label(), platform_name);
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
