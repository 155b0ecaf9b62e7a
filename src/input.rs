//! Common routines for handling input data.
//!
//! An analysis is described by two TOML files in the same directory: `equipment.toml`, a catalogue
//! of vehicle models, chargers, facility types and digital solutions, and `analysis.toml`, which
//! describes the timeline, prices and the cells making up the analysis. Dates are written as
//! quoted `YYYY-MM-DD` strings.
use crate::analysis::{Analysis, AnalysisParameters, Scenario};
use crate::prices::EnergyPrices;
use crate::timeline::{PeriodLength, Timeline};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod cell;
use cell::{DigitalSolutionsCellRaw, FleetCellRaw, InfraCellRaw, WorkforceCellRaw};
pub mod equipment;
use equipment::read_equipment;

const ANALYSIS_FILE_NAME: &str = "analysis.toml";

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| input_err_msg(file_path))
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// The timeline as written in `analysis.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct TimelineRaw {
    start: NaiveDate,
    #[serde(default)]
    end: Option<NaiveDate>,
    #[serde(default)]
    period_length: PeriodLength,
    #[serde(default)]
    num_periods: Option<u32>,
}

impl TimelineRaw {
    fn into_timeline(self) -> Result<Timeline> {
        match (self.end, self.num_periods) {
            (Some(end), None) => {
                if self.period_length != PeriodLength::Month {
                    bail!("An end date can only be used with monthly periods; use num_periods");
                }
                Timeline::monthly_between(self.start, end)
            }
            (None, Some(num_periods)) => Timeline::new(self.start, self.period_length, num_periods),
            _ => bail!("The timeline must have exactly one of end or num_periods"),
        }
    }
}

/// The contents of `analysis.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct AnalysisFile {
    timeline: TimelineRaw,
    prices: EnergyPrices,
    parameters: AnalysisParameters,
    #[serde(default)]
    fleet: Vec<FleetCellRaw>,
    #[serde(default)]
    infrastructure: Vec<InfraCellRaw>,
    #[serde(default)]
    workforce: Vec<WorkforceCellRaw>,
    #[serde(default)]
    digital_solutions: Vec<DigitalSolutionsCellRaw>,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

/// Read an analysis from the specified directory.
///
/// # Arguments
///
/// * `analysis_dir` - Folder containing `analysis.toml` and `equipment.toml`
///
/// # Returns
///
/// The validated analysis or an error.
pub fn load_analysis(analysis_dir: &Path) -> Result<Analysis> {
    let equipment = read_equipment(analysis_dir)?;

    let file_path = analysis_dir.join(ANALYSIS_FILE_NAME);
    let file: AnalysisFile = read_toml(&file_path)?;
    let timeline = file
        .timeline
        .into_timeline()
        .with_context(|| input_err_msg(&file_path))?;

    let mut cells = Vec::new();
    for raw in file.fleet {
        cells.push(raw.into_cell(&timeline, &equipment, analysis_dir)?);
    }
    for raw in file.infrastructure {
        cells.push(raw.into_cell(&timeline, &equipment, analysis_dir)?);
    }
    for raw in file.workforce {
        cells.push(raw.into_cell(&timeline)?);
    }
    for raw in file.digital_solutions {
        cells.push(raw.into_cell(&timeline, &equipment)?);
    }

    Analysis::new(
        timeline,
        file.prices,
        file.parameters,
        cells,
        file.scenarios,
    )
    .with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, date};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: String,
        value: u32,
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }
        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1
            }
        );

        // Missing field
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"").unwrap();
        }
        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\nhello,1\nworld,2").unwrap();
        }
        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, 2);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing.toml");
        assert_error!(
            read_toml::<Record>(&file_path),
            format!("Error reading {}", file_path.display())
        );
    }

    #[test]
    fn test_timeline_raw() {
        let monthly = TimelineRaw {
            start: date(2025, 1, 1),
            end: Some(date(2029, 12, 1)),
            period_length: PeriodLength::Month,
            num_periods: None,
        };
        assert_eq!(monthly.into_timeline().unwrap().num_periods, 60);

        let annual = TimelineRaw {
            start: date(2025, 1, 1),
            end: None,
            period_length: PeriodLength::Year,
            num_periods: Some(5),
        };
        assert_eq!(annual.into_timeline().unwrap().year_span(), (2025, 2029));

        let both = TimelineRaw {
            start: date(2025, 1, 1),
            end: Some(date(2029, 12, 1)),
            period_length: PeriodLength::Month,
            num_periods: Some(60),
        };
        assert_error!(
            both.into_timeline(),
            "The timeline must have exactly one of end or num_periods"
        );
    }
}
