// Readers for the line membership files.

use crate::pipeline::*;

/// Reads the membership file of one line.
///
/// The file must carry the configured order column and the `GMDNR` code
/// column. A missing column fails the run immediately, naming the column;
/// these files are curated by hand and a missing header means the wrong file.
pub fn read_line_members(ls: &LineSource) -> PipelineResult<Vec<RosterEntry>> {
    let path = ls.file_path.clone();
    info!("Attempting to read line file {:?}", path);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;

    let headers = rdr
        .headers()
        .context(CsvReadSnafu { path: path.clone() })?
        .clone();
    let order_idx = headers
        .iter()
        .position(|h| h == ls.order_column)
        .context(MissingColumnSnafu {
            column: ls.order_column.clone(),
            path: path.clone(),
        })?;
    let code_idx = headers
        .iter()
        .position(|h| h == "GMDNR")
        .context(MissingColumnSnafu {
            column: "GMDNR",
            path: path.clone(),
        })?;

    let mut res: Vec<RosterEntry> = Vec::new();
    for (idx, record_r) in rdr.records().enumerate() {
        // The header occupies the first line of the file.
        let lineno = idx + 2;
        let record = record_r.context(CsvReadSnafu { path: path.clone() })?;
        debug!("{:?} {:?}", lineno, record);
        let order = read_u32_field(&record, order_idx, &path, lineno)?;
        let code = read_u32_field(&record, code_idx, &path, lineno)?;
        res.push(RosterEntry {
            line: ls.id.clone(),
            order,
            code,
        });
    }
    info!("Loaded {} communes for line {}", res.len(), ls.id);
    Ok(res)
}

fn read_u32_field(
    record: &csv::StringRecord,
    idx: usize,
    path: &str,
    lineno: usize,
) -> PipelineResult<u32> {
    let raw = record
        .get(idx)
        .context(CsvLineTooShortSnafu { path, lineno })?;
    raw.trim().parse::<u32>().ok().context(InvalidFieldSnafu {
        value: raw,
        path,
        lineno,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> String {
        let dir = std::env::temp_dir().join(format!(
            "roestigraben-lines-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn source(path: String) -> LineSource {
        LineSource {
            id: "ic1".to_string(),
            file_path: path,
            order_column: "order_ic1".to_string(),
            output_label: None,
        }
    }

    #[test]
    fn reads_order_and_code_columns() {
        let path = write_temp(
            "ic1.csv",
            "order_ic1,GMDNAME,GMDNR\n1,Genève,6621\n2,Lausanne,5586\n",
        );
        let members = read_line_members(&source(path)).unwrap();
        assert_eq!(
            members,
            vec![
                RosterEntry {
                    line: "ic1".to_string(),
                    order: 1,
                    code: 6621
                },
                RosterEntry {
                    line: "ic1".to_string(),
                    order: 2,
                    code: 5586
                },
            ]
        );
    }

    #[test]
    fn missing_order_column_names_the_column() {
        let path = write_temp("ic1.csv", "rank,GMDNR\n1,6621\n");
        let err = read_line_members(&source(path)).unwrap_err();
        match err {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "order_ic1"),
            x => panic!("unexpected error: {:?}", x),
        }
    }

    #[test]
    fn missing_code_column_names_the_column() {
        let path = write_temp("ic1.csv", "order_ic1,name\n1,Genève\n");
        let err = read_line_members(&source(path)).unwrap_err();
        match err {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "GMDNR"),
            x => panic!("unexpected error: {:?}", x),
        }
    }

    #[test]
    fn non_numeric_codes_are_reported_with_their_line() {
        let path = write_temp("ic1.csv", "order_ic1,GMDNR\n1,6621\n2,n/a\n");
        let err = read_line_members(&source(path)).unwrap_err();
        match err {
            PipelineError::InvalidField { value, lineno, .. } => {
                assert_eq!(value, "n/a");
                assert_eq!(lineno, 3);
            }
            x => panic!("unexpected error: {:?}", x),
        }
    }
}
