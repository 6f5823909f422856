// ********* Input data structures ***********

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::Display;

/// A single administrative mutation recorded by the statistics authority:
/// `initial_code` was absorbed into, or renumbered to, `terminal_code` on `date`.
///
/// The authority records the final destination of every retired code directly,
/// so there is no chain to follow across distinct initial codes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Mutation {
    pub initial_code: u32,
    pub terminal_code: u32,
    pub date: NaiveDate,
}

/// The membership of one municipality in one named line, together with its
/// position in the canonical ordering of that line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterEntry {
    pub line: String,
    /// Dense rank within the line, starting at 1.
    pub order: u32,
    pub code: u32,
}

/// A municipality that is active as of the reference date.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GeoRecord {
    pub code: u32,
    /// Official French name, possibly carrying a canton suffix such as " (NE)".
    pub name_fr: String,
    /// Ordinal reference of the parent canton in the geo-level hierarchy.
    pub canton_ref: u32,
}

/// A manually curated naming override, keyed on the canonical French name.
///
/// Either language may be absent; the canonical name is the fallback for each
/// language independently.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TranslationEntry {
    pub canonical: String,
    pub fr: Option<String>,
    pub de: Option<String>,
}

// ******** Output data structures *********

/// One municipality of one line after harmonization.
///
/// At most one such row exists per (line, code) pair. The optional fields are
/// `None` when the resolved code was absent from the geo-level snapshot; they
/// are written out as empty cells, never as placeholder text.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HarmonizedCommune {
    pub line: String,
    pub order: u32,
    /// The current municipality code, after applying mutations.
    pub code: u32,
    /// Canonical French name as reported by the geo-level service.
    pub name_fr: Option<String>,
    pub canton_iso2: Option<String>,
    /// Display name in French, canton suffix removed.
    pub fr: Option<String>,
    /// Display name in German, canton suffix removed.
    pub de: Option<String>,
}

/// Errors that prevent harmonization from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum HarmonizeErrors {
    UnparseableDate(String),
}

impl Error for HarmonizeErrors {}

impl Display for HarmonizeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarmonizeErrors::UnparseableDate(s) => {
                write!(f, "unparseable mutation date: {}", s)
            }
        }
    }
}
