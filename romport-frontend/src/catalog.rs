//! Catalog transformation: external metadata records to destination records.
//!
//! Input is an ordered sequence of flat records (a CSV file with a header
//! row). Each record is joined to the placed games by exact, case-sensitive
//! game name, then every field is renamed or passed through (lowercased) and
//! optionally converted. Field order is the source order.

use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use romport_core::profile::MAX_DECIMAL_PLACES;
use romport_core::{ConversionRule, DestinationProfile};

use crate::FrontendError;

/// One external metadata record.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    /// Join key: the game name as it appears in the archive
    pub game_name: String,
    /// Every field of the record in source order, including the name field
    pub fields: Vec<(String, String)>,
}

/// A record ready for serialization, fields in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformedRecord {
    fields: Vec<(String, String)>,
}

impl TransformedRecord {
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        let mut record = Self::default();
        for (field, value) in fields {
            record.set(field, value);
        }
        record
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Insert, replacing the value in place when the field already exists.
    fn set(&mut self, field: String, value: String) {
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }
}

/// Transform one record for a destination profile.
pub fn transform(record: &CatalogRecord, profile: &DestinationProfile) -> TransformedRecord {
    let mut out = TransformedRecord::default();
    for (field, raw) in &record.fields {
        let name = profile
            .catalog_field_mappings
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.to_lowercase());

        let value = match profile.catalog_field_conversions.get(field) {
            Some(rule) => convert_value(rule, raw).unwrap_or_else(|| {
                log::warn!(
                    "Cannot convert field '{}' value '{}' for '{}'; keeping it unchanged",
                    field,
                    raw,
                    record.game_name
                );
                raw.clone()
            }),
            None => raw.clone(),
        };
        out.set(name, value);
    }
    out
}

/// Apply one conversion rule. `None` when the raw value does not parse.
pub fn convert_value(rule: &ConversionRule, raw: &str) -> Option<String> {
    match rule {
        ConversionRule::Date {
            format,
            default_month,
            default_day,
        } => {
            let (year, month, day) = parse_date_parts(raw)?;
            let month = month.unwrap_or(*default_month);
            let day = day.unwrap_or(*default_day);
            Some(
                format
                    .replace("{year}", &format!("{year:04}"))
                    .replace("{month}", &format!("{month:02}"))
                    .replace("{day}", &format!("{day:02}")),
            )
        }
        ConversionRule::Normalize {
            source_scale,
            target_scale,
            decimal_places,
        } => {
            let value: f64 = raw.trim().parse().ok()?;
            let scaled = value * target_scale / source_scale;
            let places = (*decimal_places).min(MAX_DECIMAL_PLACES);
            let factor = 10f64.powi(places as i32);
            let rounded = (scaled * factor).round() / factor;
            Some(format!("{:.*}", places as usize, rounded))
        }
    }
}

/// Split a date into year and optional month/day.
///
/// Accepts full dates (`1996-06-23`, `19960623`, `1996/06/23`, `06/23/1996`,
/// with or without a trailing time), `1996-06`, and a bare year.
fn parse_date_parts(raw: &str) -> Option<(i32, Option<u32>, Option<u32>)> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    for pattern in ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, pattern) {
            return Some((date.year(), Some(date.month()), Some(date.day())));
        }
    }

    let mut parts = date_part.split('-');
    let year = parts.next()?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    match parts.next() {
        None => Some((year, None, None)),
        Some(month) => {
            let month: u32 = month.parse().ok()?;
            if parts.next().is_some() || !(1..=12).contains(&month) {
                return None;
            }
            Some((year, Some(month), None))
        }
    }
}

/// Load catalog records from a CSV file whose header names the fields.
pub fn load_catalog_csv(path: &Path, name_field: &str) -> Result<Vec<CatalogRecord>, FrontendError> {
    let contents = std::fs::read_to_string(path)?;
    parse_catalog_csv(&contents, name_field)
}

/// Parse catalog records from CSV content.
///
/// Rows without a value in `name_field` are skipped with a warning.
pub fn parse_catalog_csv(content: &str, name_field: &str) -> Result<Vec<CatalogRecord>, FrontendError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let name_index = headers
        .iter()
        .position(|h| h == name_field)
        .ok_or_else(|| {
            FrontendError::invalid_catalog(format!(
                "no '{name_field}' column (found: {})",
                headers.join(", ")
            ))
        })?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping malformed catalog row {}: {e}", row + 2);
                continue;
            }
        };
        let game_name = record.get(name_index).unwrap_or("").to_string();
        if game_name.is_empty() {
            log::warn!("Skipping catalog row {} with no '{name_field}'", row + 2);
            continue;
        }
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(CatalogRecord { game_name, fields });
    }
    Ok(records)
}

/// Records whose game was placed, in record order. Unplaced games are dropped.
pub fn join_placed<'a>(
    records: &'a [CatalogRecord],
    placed_games: &HashSet<&str>,
) -> Vec<&'a CatalogRecord> {
    records
        .iter()
        .filter(|r| placed_games.contains(r.game_name.as_str()))
        .collect()
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
