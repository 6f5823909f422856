// Retrieval of the commune mutations from the federal register.

use crate::pipeline::*;

use serde::Deserialize;

const MUTATIONS_URL: &str = "https://www.agvchapp.bfs.admin.ch/api/communes/mutations";

#[derive(Debug, Clone, Deserialize)]
struct MutationRow {
    #[serde(rename = "InitialCode")]
    initial_code: u32,
    #[serde(rename = "TerminalCode")]
    terminal_code: u32,
    #[serde(rename = "MutationDate")]
    mutation_date: String,
}

/// Fetches the mutations effective in the given window (dates in DD-MM-YYYY).
///
/// This source is best effort: any failure is reported as a warning and an
/// empty list is returned, which downstream turns into the identity mapping.
pub fn fetch_mutations(start: &str, end: &str) -> Vec<Mutation> {
    match try_fetch_mutations(start, end) {
        Ok(mutations) => mutations,
        Err(e) => {
            warn!("Could not retrieve the commune mutations: {}", e);
            warn!("Continuing without mutation data");
            Vec::new()
        }
    }
}

fn try_fetch_mutations(start: &str, end: &str) -> PipelineResult<Vec<Mutation>> {
    let url = format!(
        "{}?includeTerritoryExchange=false&Deleted=True&Created=True&startPeriod={}&endPeriod={}",
        MUTATIONS_URL, start, end
    );
    let body = io_common::http_get_text(&url)?;
    let mutations = parse_mutations(&body)?;
    info!(
        "Retrieved {} mutations between {} and {}",
        mutations.len(),
        start,
        end
    );
    Ok(mutations)
}

pub fn parse_mutations(body: &str) -> PipelineResult<Vec<Mutation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let mut res: Vec<Mutation> = Vec::new();
    for row_r in rdr.deserialize::<MutationRow>() {
        let row = row_r.context(CsvBodySnafu { name: "mutations" })?;
        let date = parse_mutation_date(&row.mutation_date).context(MutationDateSnafu {})?;
        res.push(Mutation {
            initial_code: row.initial_code,
            terminal_code: row.terminal_code,
            date,
        });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_register_csv() {
        let body = "InitialCode,TerminalCode,MutationDate\n6458,261,01.06.2024\n1234,5678,2024-02-29\n";
        let mutations = parse_mutations(body).unwrap();
        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[0].initial_code, 6458);
        assert_eq!(mutations[0].terminal_code, 261);
        assert_eq!(
            mutations[0].date,
            parse_mutation_date("2024-06-01").unwrap()
        );
        // Mixed date formats within one response are accepted.
        assert_eq!(
            mutations[1].date,
            parse_mutation_date("29.02.2024").unwrap()
        );
    }

    #[test]
    fn extra_columns_are_ignored() {
        let body = "HistId,InitialCode,InitialName,TerminalCode,MutationDate\n1,6458,Ancienne,261,01.06.2024\n";
        let mutations = parse_mutations(body).unwrap();
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].terminal_code, 261);
    }

    #[test]
    fn bad_dates_are_an_error() {
        let body = "InitialCode,TerminalCode,MutationDate\n6458,261,June 1st\n";
        let err = parse_mutations(body).unwrap_err();
        match err {
            PipelineError::MutationDate { .. } => {}
            x => panic!("unexpected error: {:?}", x),
        }
    }
}
