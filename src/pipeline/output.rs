// CSV emission of the three output files.

use crate::pipeline::*;

use std::path::Path;

pub const HARMONIZED_HEADER: [&str; 7] =
    ["order_ic", "ligne", "GMDNR", "Name_fr", "iso2", "fr", "de"];

pub const BALLOT_HEADER: [&str; 4] = ["ballot-id", "langue", "title_long", "title_short"];

pub const FINAL_HEADER: [&str; 9] = [
    "GMDNR",
    "order",
    "ligne",
    "GMDNAME",
    "GMDNAME_FR",
    "GMDNAME_DE",
    "KTN_abr",
    "ballot_id",
    "yes_pct",
];

/// Writes the harmonized roster. Unresolved geo joins appear as empty cells.
pub fn write_harmonized(path: &Path, rows: &[HarmonizedCommune]) -> PipelineResult<()> {
    let path_str = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(WritingOutputSnafu {
        path: path_str.clone(),
    })?;
    wtr.write_record(HARMONIZED_HEADER)
        .context(WritingOutputSnafu {
            path: path_str.clone(),
        })?;
    for r in rows.iter() {
        wtr.write_record(&[
            r.order.to_string(),
            r.line.clone(),
            r.code.to_string(),
            r.name_fr.clone().unwrap_or_default(),
            r.canton_iso2.clone().unwrap_or_default(),
            r.fr.clone().unwrap_or_default(),
            r.de.clone().unwrap_or_default(),
        ])
        .context(WritingOutputSnafu {
            path: path_str.clone(),
        })?;
    }
    wtr.flush().context(FlushingOutputSnafu { path: path_str })?;
    Ok(())
}

/// Writes the bilingual ballot titles. The short-title column is left blank
/// for manual curation.
pub fn write_ballot_titles(path: &Path, titles: &[BallotTitle]) -> PipelineResult<()> {
    let path_str = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(WritingOutputSnafu {
        path: path_str.clone(),
    })?;
    wtr.write_record(BALLOT_HEADER).context(WritingOutputSnafu {
        path: path_str.clone(),
    })?;
    for t in titles.iter() {
        wtr.write_record(&[
            t.ballot_id.to_string(),
            t.lang.clone(),
            t.title.clone(),
            String::new(),
        ])
        .context(WritingOutputSnafu {
            path: path_str.clone(),
        })?;
    }
    wtr.flush().context(FlushingOutputSnafu { path: path_str })?;
    Ok(())
}

/// Writes the final profile table.
pub fn write_final(path: &Path, rows: &[FinalRow]) -> PipelineResult<()> {
    let path_str = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(WritingOutputSnafu {
        path: path_str.clone(),
    })?;
    wtr.write_record(FINAL_HEADER).context(WritingOutputSnafu {
        path: path_str.clone(),
    })?;
    for r in rows.iter() {
        wtr.write_record(&[
            r.code.to_string(),
            r.order.to_string(),
            r.line_label.clone(),
            r.name.clone(),
            r.name_fr.clone(),
            r.name_de.clone(),
            r.canton.clone(),
            r.ballot_id.to_string(),
            r.yes_pct.map(|v| v.to_string()).unwrap_or_default(),
        ])
        .context(WritingOutputSnafu {
            path: path_str.clone(),
        })?;
    }
    wtr.flush().context(FlushingOutputSnafu { path: path_str })?;
    Ok(())
}
