mod config;
use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use regex::Regex;

pub use crate::config::*;

/// Parses a date in the formats used by the mutation service.
///
/// The service returns both day-first (`31.12.2024`) and ISO (`2024-12-31`)
/// dates, sometimes within the same response.
pub fn parse_mutation_date(s: &str) -> Result<NaiveDate, HarmonizeErrors> {
    let t = s.trim();
    NaiveDate::parse_from_str(t, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(t, "%Y-%m-%d"))
        .map_err(|_| HarmonizeErrors::UnparseableDate(s.to_string()))
}

/// Compresses a list of mutations into a mapping from each initial code to its
/// final code.
///
/// For a given initial code, the chronologically last mutation wins. When two
/// mutations for the same initial code carry the same date, the one appearing
/// later in the input wins.
pub fn mutation_key(mutations: &[Mutation]) -> HashMap<u32, u32> {
    let mut last: HashMap<u32, (NaiveDate, u32)> = HashMap::new();
    for m in mutations.iter() {
        match last.get(&m.initial_code) {
            Some((date, _)) if *date > m.date => {}
            _ => {
                last.insert(m.initial_code, (m.date, m.terminal_code));
            }
        }
    }
    info!(
        "mutation_key: {} correspondences from {} mutations",
        last.len(),
        mutations.len()
    );
    last.iter()
        .map(|(initial, (_, terminal))| (*initial, *terminal))
        .collect()
}

/// Resolves one municipality code to its current code.
///
/// Codes without a recorded mutation map to themselves, which also makes this
/// the identity when the mutation service was unavailable.
pub fn resolve(code: u32, key: &HashMap<u32, u32>) -> u32 {
    *key.get(&code).unwrap_or(&code)
}

/// Resolves every raw code against the given mutations.
pub fn resolve_codes(codes: &HashSet<u32>, mutations: &[Mutation]) -> HashMap<u32, u32> {
    let key = mutation_key(mutations);
    codes.iter().map(|c| (*c, resolve(*c, &key))).collect()
}

/// Removes a trailing canton disambiguation from a display name, e.g.
/// `"Neuchâtel (NE)"` -> `"Neuchâtel"`.
///
/// Only a suffix of the exact form " (XX)" with two uppercase letters is
/// removed. Mid-string parentheses, lowercase or longer codes stay untouched.
pub fn remove_canton_abbreviation(name: &str) -> String {
    let re = Regex::new(r" \([A-Z]{2}\)$").unwrap();
    re.replace(name, "").into_owned()
}

/// Runs the harmonization over a full line roster.
///
/// Every roster code is resolved through the mutation key, entries that
/// collapsed into the same municipality are deduplicated (the lowest order in
/// the line survives), and the surviving rows are enriched with geographic
/// data and bilingual display names. Resolved codes missing from the
/// geo-level snapshot keep their row but with empty name and canton; this
/// usually means the reference date is stale relative to the mutation window.
pub fn harmonize(
    roster: &[RosterEntry],
    key: &HashMap<u32, u32>,
    geo: &[GeoRecord],
    cantons: &HashMap<u32, String>,
    translations: &[TranslationEntry],
) -> Vec<HarmonizedCommune> {
    let geo_by_code: HashMap<u32, &GeoRecord> = geo.iter().map(|g| (g.code, g)).collect();
    let translations_by_name: HashMap<&str, &TranslationEntry> = translations
        .iter()
        .map(|t| (t.canonical.as_str(), t))
        .collect();

    // Collapse the entries of one line that resolved to the same municipality.
    let mut surviving: HashMap<(String, u32), &RosterEntry> = HashMap::new();
    for entry in roster.iter() {
        let resolved = resolve(entry.code, key);
        match surviving.get(&(entry.line.clone(), resolved)) {
            Some(prev) if prev.order <= entry.order => {
                debug!(
                    "harmonize: dropping commune {} (line {}, order {}): merged into {}",
                    entry.code, entry.line, entry.order, resolved
                );
            }
            _ => {
                surviving.insert((entry.line.clone(), resolved), entry);
            }
        }
    }

    let mut rows: Vec<HarmonizedCommune> = Vec::new();
    for ((line, code), entry) in surviving.iter() {
        let geo_record = geo_by_code.get(code).copied();
        if geo_record.is_none() {
            warn!(
                "harmonize: commune {} (line {}) not found in the geo levels; the reference date may predate the end of the mutation window",
                code, line
            );
        }
        let canton_iso2 = geo_record.and_then(|g| {
            let iso2 = cantons.get(&g.canton_ref).cloned();
            if iso2.is_none() {
                warn!(
                    "harmonize: no ISO2 abbreviation for canton reference {} (commune {})",
                    g.canton_ref, code
                );
            }
            iso2
        });
        let name_fr = geo_record.map(|g| g.name_fr.clone());
        let (fr, de) = match name_fr.as_deref() {
            Some(canonical) => {
                let t = translations_by_name.get(canonical);
                let fr = t
                    .and_then(|t| t.fr.clone())
                    .unwrap_or_else(|| canonical.to_string());
                let de = t
                    .and_then(|t| t.de.clone())
                    .unwrap_or_else(|| canonical.to_string());
                (
                    Some(remove_canton_abbreviation(&fr)),
                    Some(remove_canton_abbreviation(&de)),
                )
            }
            None => (None, None),
        };
        rows.push(HarmonizedCommune {
            line: line.clone(),
            order: entry.order,
            code: *code,
            name_fr,
            canton_iso2,
            fr,
            de,
        });
    }

    rows.sort_by(|a, b| (a.line.as_str(), a.order).cmp(&(b.line.as_str(), b.order)));
    info!(
        "harmonize: {} communes after deduplication ({} roster entries)",
        rows.len(),
        roster.len()
    );
    rows
}
