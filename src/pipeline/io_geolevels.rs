// Geographic reference data: commune levels, canton abbreviations,
// naming overrides.

use crate::pipeline::*;

use serde::Deserialize;

const GEOLEVELS_URL: &str =
    "https://sms.bfs.admin.ch/WcfBFSSpecificService.svc/AnonymousRest/communes/levels";

#[derive(Debug, Clone, Deserialize)]
struct GeoRow {
    #[serde(rename = "CODE_OFS")]
    code: u32,
    #[serde(rename = "Name_fr")]
    name_fr: String,
    #[serde(rename = "HR_HGDE_HIST_L1")]
    canton_ref: u32,
}

/// Retrieves every commune active on the reference date (DD-MM-YYYY).
///
/// This source is required: without the current snapshot nothing downstream
/// can be named or attributed to a canton, so a failure aborts the run.
pub fn fetch_geo_levels(date: &str) -> PipelineResult<Vec<GeoRecord>> {
    let url = format!(
        "{}?startPeriod={}&endPeriod={}&useBfsCode=false&labelLanguages=fr&format=csv",
        GEOLEVELS_URL, date, date
    );
    let body = io_common::http_get_text(&url)?;
    let records = parse_geo_levels(&body)?;
    info!("Retrieved {} communes for {}", records.len(), date);
    Ok(records)
}

pub fn parse_geo_levels(body: &str) -> PipelineResult<Vec<GeoRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let mut res: Vec<GeoRecord> = Vec::new();
    for row_r in rdr.deserialize::<GeoRow>() {
        let row = row_r.context(CsvBodySnafu { name: "geo levels" })?;
        res.push(GeoRecord {
            code: row.code,
            name_fr: row.name_fr,
            canton_ref: row.canton_ref,
        });
    }
    Ok(res)
}

#[derive(Debug, Clone, Deserialize)]
struct CantonRow {
    order: u32,
    iso2: String,
}

/// Loads the canton ordinal -> ISO2 table. Required.
pub fn load_canton_iso2(path: &str) -> PipelineResult<HashMap<u32, String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut res: HashMap<u32, String> = HashMap::new();
    for row_r in rdr.deserialize::<CantonRow>() {
        let row = row_r.context(CsvReadSnafu { path })?;
        res.insert(row.order, row.iso2);
    }
    info!("Loaded {} cantons", res.len());
    Ok(res)
}

#[derive(Debug, Clone, Deserialize)]
struct TranslationRow {
    polg_name: String,
    fr: Option<String>,
    de: Option<String>,
}

/// Loads the naming overrides from a local file or over HTTP.
///
/// Best effort: when the source is absent or unreadable the pipeline keeps
/// the canonical French names for both languages.
pub fn load_translations(source: Option<&str>) -> Vec<TranslationEntry> {
    let src = match source {
        Some(s) => s,
        None => {
            info!("No translation source configured");
            return Vec::new();
        }
    };
    let attempt = if src.starts_with("http://") || src.starts_with("https://") {
        io_common::http_get_text(src).and_then(|body| parse_translations(&body))
    } else {
        fs::read_to_string(src)
            .context(OpeningFileSnafu { path: src })
            .and_then(|body| parse_translations(&body))
    };
    match attempt {
        Ok(translations) => {
            info!("Loaded {} translations", translations.len());
            translations
        }
        Err(e) => {
            warn!("Could not load the translation table: {}", e);
            warn!("Continuing with canonical names only");
            Vec::new()
        }
    }
}

pub fn parse_translations(body: &str) -> PipelineResult<Vec<TranslationEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let mut res: Vec<TranslationEntry> = Vec::new();
    for row_r in rdr.deserialize::<TranslationRow>() {
        let row = row_r.context(CsvBodySnafu {
            name: "translations",
        })?;
        res.push(TranslationEntry {
            canonical: row.polg_name,
            fr: row.fr.filter(|s| !s.is_empty()),
            de: row.de.filter(|s| !s.is_empty()),
        });
    }
    Ok(res)
}
