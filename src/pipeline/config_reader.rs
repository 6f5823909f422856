use crate::pipeline::*;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One line membership file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LineSource {
    /// Identifier used throughout the pipeline, e.g. "ic1".
    pub id: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// Name of the column carrying the display order, e.g. "order_ic1".
    #[serde(rename = "orderColumn")]
    pub order_column: String,
    /// Label written to the final table, e.g. "ic_1". Defaults to the id.
    #[serde(rename = "outputLabel")]
    pub output_label: Option<String>,
}

impl LineSource {
    pub fn label(&self) -> String {
        self.output_label.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// The run configuration. All dates are YYYY-MM-DD; conversion to the formats
/// expected by the reference services happens internally.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The day of the votation.
    #[serde(rename = "votingDate")]
    pub voting_date: String,
    /// URL of the votation-day JSON document.
    #[serde(rename = "resultsUrl")]
    pub results_url: String,
    /// Start of the mutation window. Defaults to January 1 of the voting year.
    #[serde(rename = "mutationStartDate")]
    pub mutation_start_date: Option<String>,
    /// End of the mutation window. Defaults to the voting date.
    #[serde(rename = "mutationEndDate")]
    pub mutation_end_date: Option<String>,
    /// Reference date for the geographic levels. Defaults to the voting date.
    #[serde(rename = "geoLevelDate")]
    pub geo_level_date: Option<String>,
    pub lines: Vec<LineSource>,
    #[serde(rename = "cantonFilePath")]
    pub canton_file_path: String,
    /// Local path or URL of the naming overrides. Optional.
    #[serde(rename = "translationSource")]
    pub translation_source: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    /// "inner" (default) or "left".
    #[serde(rename = "joinMode")]
    pub _join_mode: Option<String>,
}

impl PipelineConfig {
    pub fn voting_day(&self) -> PipelineResult<NaiveDate> {
        NaiveDate::parse_from_str(&self.voting_date, "%Y-%m-%d")
            .ok()
            .context(ConfigDateSnafu {
                value: self.voting_date.clone(),
            })
    }

    /// Window bounds in the day-first format the mutation service expects.
    pub fn mutation_window(&self) -> PipelineResult<(String, String)> {
        let day = self.voting_day()?;
        let start = match &self.mutation_start_date {
            Some(s) => service_date(s)?,
            None => format!("01-01-{}", day.year()),
        };
        let end = match &self.mutation_end_date {
            Some(s) => service_date(s)?,
            None => day.format("%d-%m-%Y").to_string(),
        };
        Ok((start, end))
    }

    /// Geo-level reference date in the day-first format the service expects.
    pub fn geo_level_day(&self) -> PipelineResult<String> {
        match &self.geo_level_date {
            Some(s) => service_date(s),
            None => Ok(self.voting_day()?.format("%d-%m-%Y").to_string()),
        }
    }

    pub fn join_mode(&self) -> PipelineResult<JoinMode> {
        match self._join_mode.as_deref() {
            None | Some("inner") => Ok(JoinMode::Inner),
            Some("left") => Ok(JoinMode::Left),
            Some(x) => whatever!("Unknown join mode {:?}: expected \"inner\" or \"left\"", x),
        }
    }
}

fn service_date(s: &str) -> PipelineResult<String> {
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .context(ConfigDateSnafu { value: s })?;
    Ok(d.format("%d-%m-%Y").to_string())
}

pub fn read_config(path: &str) -> PipelineResult<PipelineConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: PipelineConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
    {
        "votingDate": "2024-11-24",
        "resultsUrl": "https://example.org/votation.json",
        "lines": [
            {"id": "ic1", "filePath": "input/ic1.csv", "orderColumn": "order_ic1", "outputLabel": "ic_1"},
            {"id": "ic21", "filePath": "input/ic21.csv", "orderColumn": "order_ic21"}
        ],
        "cantonFilePath": "input/canton_iso2.csv"
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.join_mode().unwrap(), JoinMode::Inner);
        assert_eq!(
            config.mutation_window().unwrap(),
            ("01-01-2024".to_string(), "24-11-2024".to_string())
        );
        assert_eq!(config.geo_level_day().unwrap(), "24-11-2024");
        assert_eq!(config.translation_source, None);
    }

    #[test]
    fn line_labels_default_to_the_id() {
        let config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.lines[0].label(), "ic_1");
        assert_eq!(config.lines[1].label(), "ic21");
    }

    #[test]
    fn explicit_dates_are_converted_for_the_services() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.mutation_start_date = Some("2024-03-15".to_string());
        config.geo_level_date = Some("2024-12-01".to_string());
        assert_eq!(
            config.mutation_window().unwrap(),
            ("15-03-2024".to_string(), "24-11-2024".to_string())
        );
        assert_eq!(config.geo_level_day().unwrap(), "01-12-2024");
    }

    #[test]
    fn unknown_join_mode_is_rejected() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config._join_mode = Some("outer".to_string());
        assert!(config.join_mode().is_err());
    }

    #[test]
    fn malformed_voting_date_is_rejected() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.voting_date = "24.11.2024".to_string();
        assert!(config.voting_day().is_err());
    }
}
