//! Run-scoped state shared by the resolvers.
//!
//! Everything here is written at most once per key and read many times
//! afterwards: resolved platform mappings, the global variant subdirectory
//! selection, and the "always take the first candidate" flag.

use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::resolver::PlatformMapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubdirectoryMode {
    /// Every variant subdirectory is searched
    All,
    /// Only category base directories are searched
    None,
    /// Only the named subdirectories are searched
    Explicit,
}

/// Which variant subdirectories (e.g. `Japan`, `World`) join the search space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdirectorySelection {
    pub mode: SubdirectoryMode,
    pub selected: BTreeSet<String>,
}

impl SubdirectorySelection {
    pub fn all(available: &BTreeSet<String>) -> Self {
        Self {
            mode: SubdirectoryMode::All,
            selected: available.clone(),
        }
    }

    pub fn none() -> Self {
        Self {
            mode: SubdirectoryMode::None,
            selected: BTreeSet::new(),
        }
    }

    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: SubdirectoryMode::Explicit,
            selected: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `all`, `none`, or a comma-separated list of names.
    ///
    /// Names are kept even when absent from `available`; they are simply
    /// never found on disk.
    pub fn parse(spec: &str, available: &BTreeSet<String>) -> Self {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("all") {
            return Self::all(available);
        }
        if spec.is_empty() || spec.eq_ignore_ascii_case("none") {
            return Self::none();
        }
        let names: BTreeSet<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        for name in names.difference(available) {
            log::warn!("Variant subdirectory '{name}' does not exist anywhere in the archive");
        }
        if names.is_empty() {
            Self::none()
        } else {
            Self::explicit(names)
        }
    }

    /// Whether `name` is part of the search space.
    pub fn includes(&self, name: &str) -> bool {
        match self.mode {
            SubdirectoryMode::None => false,
            SubdirectoryMode::All | SubdirectoryMode::Explicit => self.selected.contains(name),
        }
    }
}

/// State for one export run.
#[derive(Debug, Default)]
pub struct SessionState {
    mappings: HashMap<String, PlatformMapping>,
    unmapped: BTreeSet<String>,
    subdirectories: OnceCell<SubdirectorySelection>,
    always_first: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping resolved earlier in this run.
    pub fn cached_mapping(&self, platform_name: &str) -> Option<&PlatformMapping> {
        self.mappings.get(platform_name)
    }

    /// Whether the platform was already reported unmapped in this run.
    pub fn is_unmapped(&self, platform_name: &str) -> bool {
        self.unmapped.contains(platform_name)
    }

    pub fn record_mapping(&mut self, mapping: PlatformMapping) {
        self.unmapped.remove(&mapping.archive_name);
        self.mappings
            .entry(mapping.archive_name.clone())
            .or_insert(mapping);
    }

    pub fn record_unmapped(&mut self, platform_name: &str) {
        if !self.mappings.contains_key(platform_name) {
            self.unmapped.insert(platform_name.to_string());
        }
    }

    /// Platforms that could not be mapped, sorted.
    pub fn unmapped(&self) -> impl Iterator<Item = &str> {
        self.unmapped.iter().map(String::as_str)
    }

    /// Fix the subdirectory selection for the rest of the run.
    /// Returns `false` (and keeps the first selection) if already set.
    pub fn set_subdirectories(&self, selection: SubdirectorySelection) -> bool {
        self.subdirectories.set(selection).is_ok()
    }

    pub fn subdirectories(&self) -> Option<&SubdirectorySelection> {
        self.subdirectories.get()
    }

    /// Turn on "always take the first candidate". Cannot be turned off.
    pub fn enable_always_first(&mut self) {
        self.always_first = true;
    }

    pub fn always_first(&self) -> bool {
        self.always_first
    }
}
