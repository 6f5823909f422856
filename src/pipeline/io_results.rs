// Retrieval of the votation-day results feed.

use crate::pipeline::*;

use serde::{Deserialize, Serialize};

/// The national results document for one voting day.
///
/// Only the subset of the feed the pipeline consumes is modeled; the
/// remaining fields are ignored on deserialization.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteDay {
    schweiz: NationalResults,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct NationalResults {
    vorlagen: Vec<Vorlage>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Vorlage {
    #[serde(rename = "vorlagenId")]
    vorlagen_id: u32,
    #[serde(rename = "vorlagenTitel")]
    vorlagen_titel: Vec<VorlagenTitel>,
    kantone: Vec<Kanton>,
}

impl Vorlage {
    fn title(&self, lang: &str) -> PipelineResult<String> {
        for t in self.vorlagen_titel.iter() {
            if t.lang_key == lang {
                return Ok(t.text.clone());
            }
        }
        whatever!("No {} title found for ballot {}", lang, self.vorlagen_id)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct VorlagenTitel {
    #[serde(rename = "langKey")]
    lang_key: String,
    text: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Kanton {
    gemeinden: Vec<Gemeinde>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Gemeinde {
    #[serde(rename = "geoLevelnummer")]
    geo_level_nummer: String,
    resultat: Resultat,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Resultat {
    #[serde(rename = "jaStimmenInProzent")]
    ja_stimmen_in_prozent: Option<f64>,
}

/// Fetches the results document. This source is required and a failure
/// aborts the run.
pub fn fetch_vote_day(url: &str) -> PipelineResult<VoteDay> {
    info!("Attempting to read the votation results from {:?}", url);
    let body = io_common::http_get_text(url)?;
    parse_vote_day(&body)
}

pub fn parse_vote_day(body: &str) -> PipelineResult<VoteDay> {
    serde_json::from_str(body).context(ParsingJsonSnafu {})
}

/// Flattens the document into one record per (municipality, ballot).
///
/// The ballot title attached to each record is the French one; municipalities
/// that have not finished counting keep their record with an empty
/// percentage.
pub fn municipality_results(day: &VoteDay) -> PipelineResult<Vec<BallotResult>> {
    let mut res: Vec<BallotResult> = Vec::new();
    for vorlage in day.schweiz.vorlagen.iter() {
        let title = vorlage.title("fr")?;
        for kanton in vorlage.kantone.iter() {
            for gemeinde in kanton.gemeinden.iter() {
                let code = match gemeinde.geo_level_nummer.parse::<u32>() {
                    Ok(c) => c,
                    Err(_) => {
                        whatever!(
                            "Unexpected municipality number {:?} for ballot {}",
                            gemeinde.geo_level_nummer,
                            vorlage.vorlagen_id
                        )
                    }
                };
                res.push(BallotResult {
                    municipality_code: code,
                    ballot_id: vorlage.vorlagen_id,
                    ballot_title: title.clone(),
                    yes_pct: gemeinde.resultat.ja_stimmen_in_prozent,
                });
            }
        }
    }
    let ballots: HashSet<u32> = res.iter().map(|r| r.ballot_id).collect();
    info!(
        "Retrieved {} municipality results for {} ballots",
        res.len(),
        ballots.len()
    );
    Ok(res)
}

/// Extracts the titles of every ballot in both languages, one row per
/// (ballot, language). The short titles are curated by hand afterwards.
pub fn ballot_titles(day: &VoteDay) -> Vec<BallotTitle> {
    let mut titles: Vec<BallotTitle> = Vec::new();
    for vorlage in day.schweiz.vorlagen.iter() {
        for t in vorlage.vorlagen_titel.iter() {
            if t.lang_key == "fr" || t.lang_key == "de" {
                titles.push(BallotTitle {
                    ballot_id: vorlage.vorlagen_id,
                    lang: t.lang_key.to_uppercase(),
                    title: t.text.clone(),
                });
            }
        }
    }
    titles.sort_by(|a, b| (a.ballot_id, a.lang.as_str()).cmp(&(b.ballot_id, b.lang.as_str())));
    titles
}
