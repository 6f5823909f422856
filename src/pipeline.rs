use log::{debug, info, warn};

use commune_harmonization::*;
use snafu::{prelude::*, Snafu};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_geolevels;
pub mod io_lines;
pub mod io_mutations;
pub mod io_results;
pub mod output;

use crate::pipeline::config_reader::*;

#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("Error requesting {url}"))]
    HttpRequest { source: reqwest::Error, url: String },
    #[snafu(display("Request to {url} failed with status {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("Error opening {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV data from {path}"))]
    CsvRead { source: csv::Error, path: String },
    #[snafu(display("Error parsing the {name} CSV body"))]
    CsvBody { source: csv::Error, name: String },
    #[snafu(display("Column {column} is missing in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Invalid value {value:?} at {path}:{lineno}"))]
    InvalidField {
        value: String,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON document"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error parsing a mutation date"))]
    MutationDate { source: HarmonizeErrors },
    #[snafu(display("Invalid date {value:?} in the run configuration, expected YYYY-MM-DD"))]
    ConfigDate { value: String },
    #[snafu(display("Error writing {path}"))]
    WritingOutput { source: csv::Error, path: String },
    #[snafu(display("Error flushing {path}"))]
    FlushingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating the output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{path} differs from the reference {reference}"))]
    ReferenceMismatch { path: String, reference: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// How harmonized communes without a votation result are handled.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum JoinMode {
    /// Drop the commune from the final table.
    Inner,
    /// Keep the commune with an empty yes percentage.
    Left,
}

/// One municipality's result for one ballot measure, as flattened from the
/// votation-day feed.
#[derive(PartialEq, Debug, Clone)]
pub struct BallotResult {
    pub municipality_code: u32,
    pub ballot_id: u32,
    pub ballot_title: String,
    /// Not yet counted municipalities carry no percentage.
    pub yes_pct: Option<f64>,
}

/// A ballot title in one language.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotTitle {
    pub ballot_id: u32,
    /// "FR" or "DE".
    pub lang: String,
    pub title: String,
}

/// One row of the final profile table.
#[derive(PartialEq, Debug, Clone)]
pub struct FinalRow {
    pub code: u32,
    pub order: u32,
    pub line_label: String,
    pub name: String,
    pub name_fr: String,
    pub name_de: String,
    pub canton: String,
    pub ballot_id: u32,
    pub yes_pct: Option<f64>,
}

/// Joins the harmonized roster against the per-municipality results, one row
/// per (line, municipality, ballot).
///
/// Communes without any result are reported one by one; whether their rows
/// are kept (empty percentage) or dropped depends on the join mode.
pub fn attach_results(
    harmonized: &[HarmonizedCommune],
    results: &[BallotResult],
    labels: &HashMap<String, String>,
    mode: JoinMode,
) -> Vec<FinalRow> {
    let codes_with_results: HashSet<u32> = results.iter().map(|r| r.municipality_code).collect();
    let missing: Vec<&HarmonizedCommune> = harmonized
        .iter()
        .filter(|h| !codes_with_results.contains(&h.code))
        .collect();
    if !missing.is_empty() {
        warn!(
            "{} harmonized communes have no votation result",
            missing.len()
        );
        for h in missing.iter() {
            warn!(
                "  - {} - ID: {} - ligne: {}",
                h.name_fr.clone().unwrap_or_default(),
                h.code,
                h.line
            );
        }
    }

    let mut by_ballot_and_code: HashMap<(u32, u32), &BallotResult> = HashMap::new();
    for r in results.iter() {
        by_ballot_and_code.insert((r.ballot_id, r.municipality_code), r);
    }
    let mut ballot_ids: Vec<u32> = results.iter().map(|r| r.ballot_id).collect();
    ballot_ids.sort_unstable();
    ballot_ids.dedup();

    let mut rows: Vec<FinalRow> = Vec::new();
    for ballot_id in ballot_ids.iter() {
        for h in harmonized.iter() {
            let row = FinalRow {
                code: h.code,
                order: h.order,
                line_label: labels
                    .get(&h.line)
                    .cloned()
                    .unwrap_or_else(|| h.line.clone()),
                name: h.name_fr.clone().unwrap_or_default(),
                name_fr: h.fr.clone().unwrap_or_default(),
                name_de: h.de.clone().unwrap_or_default(),
                canton: h.canton_iso2.clone().unwrap_or_default(),
                ballot_id: *ballot_id,
                yes_pct: None,
            };
            match by_ballot_and_code.get(&(*ballot_id, h.code)) {
                Some(r) => {
                    rows.push(FinalRow {
                        yes_pct: r.yes_pct,
                        ..row
                    });
                }
                None => match mode {
                    JoinMode::Inner => {
                        debug!(
                            "attach_results: dropping commune {} for ballot {}",
                            h.code, ballot_id
                        );
                    }
                    JoinMode::Left => {
                        rows.push(row);
                    }
                },
            }
        }
    }

    rows.sort_by(|a, b| {
        (a.ballot_id, a.line_label.as_str(), a.order)
            .cmp(&(b.ballot_id, b.line_label.as_str(), b.order))
    });
    rows
}

fn check_against_reference(path: &PathBuf, reference: &str) -> PipelineResult<()> {
    let path_str = path.display().to_string();
    let produced = fs::read_to_string(path).context(OpeningFileSnafu {
        path: path_str.clone(),
    })?;
    let expected = fs::read_to_string(reference).context(OpeningFileSnafu { path: reference })?;
    if produced != expected {
        warn!("Found differences with the reference file");
        print_diff(expected.as_str(), produced.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: path_str,
            reference,
        }
        .fail();
    }
    info!("{} matches the reference {}", path_str, reference);
    Ok(())
}

/// Runs the full pipeline: harmonization, ballot titles, final results.
pub fn run_pipeline(
    config_path: String,
    out_override: Option<String>,
    check_path: Option<String>,
) -> PipelineResult<()> {
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);
    let join_mode = config.join_mode()?;

    let out_dir = out_override
        .or_else(|| config.output_directory.clone())
        .unwrap_or_else(|| "output".to_string());
    fs::create_dir_all(&out_dir).context(CreatingOutputDirSnafu {
        path: out_dir.clone(),
    })?;

    // Stage 1: harmonization of the line rosters.
    let mut roster: Vec<RosterEntry> = Vec::new();
    for ls in config.lines.iter() {
        let mut members = io_lines::read_line_members(ls)?;
        roster.append(&mut members);
    }
    if roster.is_empty() {
        whatever!("No line membership data was loaded");
    }

    let (start, end) = config.mutation_window()?;
    let mutations = io_mutations::fetch_mutations(&start, &end);
    let key = mutation_key(&mutations);

    let geo = io_geolevels::fetch_geo_levels(&config.geo_level_day()?)?;
    let cantons = io_geolevels::load_canton_iso2(&config.canton_file_path)?;
    let translations = io_geolevels::load_translations(config.translation_source.as_deref());

    let harmonized = harmonize(&roster, &key, &geo, &cantons, &translations);
    let harmonized_path: PathBuf = [
        out_dir.clone(),
        format!("intercity_harmonized_{}.csv", config.voting_date),
    ]
    .iter()
    .collect();
    output::write_harmonized(&harmonized_path, &harmonized)?;
    println!(
        "Harmonized roster: {} communes ({} columns) -> {}",
        harmonized.len(),
        output::HARMONIZED_HEADER.len(),
        harmonized_path.display()
    );

    // Stage 2: ballot titles in both languages.
    let day = io_results::fetch_vote_day(&config.results_url)?;
    let titles = io_results::ballot_titles(&day);
    let titles_path: PathBuf = [
        out_dir.clone(),
        format!("ballot_name_{}.csv", config.voting_date),
    ]
    .iter()
    .collect();
    output::write_ballot_titles(&titles_path, &titles)?;
    println!(
        "Ballot titles: {} entries ({} ballots x 2 languages) -> {}",
        titles.len(),
        titles.len() / 2,
        titles_path.display()
    );

    // Stage 3: attach the per-municipality results.
    let results = io_results::municipality_results(&day)?;
    let labels: HashMap<String, String> = config
        .lines
        .iter()
        .map(|l| (l.id.clone(), l.label()))
        .collect();
    let final_rows = attach_results(&harmonized, &results, &labels, join_mode);
    let final_path: PathBuf = [
        out_dir,
        format!("profil_results_{}.csv", config.voting_date),
    ]
    .iter()
    .collect();
    output::write_final(&final_path, &final_rows)?;
    let ballot_count = {
        let ids: HashSet<u32> = final_rows.iter().map(|r| r.ballot_id).collect();
        ids.len()
    };
    println!(
        "Final profile: {} rows, {} ballots ({} columns) -> {}",
        final_rows.len(),
        ballot_count,
        output::FINAL_HEADER.len(),
        final_path.display()
    );

    // The reference results, if provided for comparison.
    if let Some(reference) = check_path {
        check_against_reference(&final_path, &reference)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commune(line: &str, order: u32, code: u32, name: &str) -> HarmonizedCommune {
        HarmonizedCommune {
            line: line.to_string(),
            order,
            code,
            name_fr: Some(name.to_string()),
            canton_iso2: Some("BE".to_string()),
            fr: Some(name.to_string()),
            de: Some(name.to_string()),
        }
    }

    fn result(code: u32, ballot_id: u32, yes_pct: Option<f64>) -> BallotResult {
        BallotResult {
            municipality_code: code,
            ballot_id,
            ballot_title: "Initiative populaire".to_string(),
            yes_pct,
        }
    }

    fn labels() -> HashMap<String, String> {
        [
            ("ic1".to_string(), "ic_1".to_string()),
            ("ic21".to_string(), "ic_21".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn inner_mode_drops_communes_without_results() {
        let harmonized = vec![commune("ic1", 1, 261, "Berne"), commune("ic1", 2, 999, "?")];
        let results = vec![result(261, 6650, Some(54.3))];
        let rows = attach_results(&harmonized, &results, &labels(), JoinMode::Inner);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, 261);
        assert_eq!(rows[0].ballot_id, 6650);
        assert_eq!(rows[0].yes_pct, Some(54.3));
    }

    #[test]
    fn left_mode_keeps_communes_with_an_empty_percentage() {
        let harmonized = vec![commune("ic1", 1, 261, "Berne"), commune("ic1", 2, 999, "?")];
        let results = vec![result(261, 6650, Some(54.3))];
        let rows = attach_results(&harmonized, &results, &labels(), JoinMode::Left);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, 261);
        assert_eq!(rows[0].yes_pct, Some(54.3));
        assert_eq!(rows[1].code, 999);
        assert_eq!(rows[1].yes_pct, None);
    }

    #[test]
    fn one_row_per_commune_and_ballot() {
        let harmonized = vec![commune("ic1", 1, 261, "Berne"), commune("ic21", 1, 230, "Bienne")];
        let results = vec![
            result(261, 6650, Some(54.3)),
            result(261, 6660, Some(40.0)),
            result(230, 6650, Some(61.2)),
            result(230, 6660, Some(39.9)),
        ];
        let rows = attach_results(&harmonized, &results, &labels(), JoinMode::Inner);
        assert_eq!(rows.len(), 4);
        // Sorted by ballot first, then line label.
        let seen: Vec<(u32, String)> = rows
            .iter()
            .map(|r| (r.ballot_id, r.line_label.clone()))
            .collect();
        assert_eq!(
            seen,
            vec![
                (6650, "ic_1".to_string()),
                (6650, "ic_21".to_string()),
                (6660, "ic_1".to_string()),
                (6660, "ic_21".to_string()),
            ]
        );
    }

    #[test]
    fn line_labels_fall_back_to_the_line_id() {
        let harmonized = vec![commune("re33", 1, 261, "Berne")];
        let results = vec![result(261, 6650, Some(54.3))];
        let rows = attach_results(&harmonized, &results, &HashMap::new(), JoinMode::Inner);
        assert_eq!(rows[0].line_label, "re33");
    }

    #[test]
    fn uncounted_results_keep_their_row_in_inner_mode() {
        let harmonized = vec![commune("ic1", 1, 261, "Berne")];
        let results = vec![result(261, 6650, None)];
        let rows = attach_results(&harmonized, &results, &labels(), JoinMode::Inner);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].yes_pct, None);
    }
}
