//! The module responsible for writing output data to disk.
use crate::analysis::AnalysisResults;
use crate::cashflow::CashflowSummary;
use crate::cell::{CellCategory, CellID};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::finance::FinancialAnalysis;
use crate::summary::AnnualObjectSummary;
use crate::units::{Dimensionless, Emissions, Energy, Hours, Money, Power};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which analysis-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "bevcost_results";

/// The output file name for the annual cashflow of the whole analysis
const ANNUAL_CASHFLOW_FILE_NAME: &str = "annual_cashflow.csv";

/// The output file name for the annual costs of each cell
const ANNUAL_OBJECT_SUMMARY_FILE_NAME: &str = "annual_object_summary.csv";

/// The output file name for NPVs
const NPV_FILE_NAME: &str = "npv.csv";

/// Get the default output directory for the analysis in the specified directory
pub fn get_output_dir(analysis_dir: &Path) -> Result<PathBuf> {
    // Get the analysis name from the dir path. This ends up being convoluted because we need to
    // check for all possible errors.
    let analysis_dir = analysis_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to analysis")?;

    let analysis_name = analysis_dir
        .file_name()
        .context("Analysis cannot be in root folder")?
        .to_str()
        .context("Invalid chars in analysis dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, analysis_name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether to allow an existing, non-empty folder to be overwritten
///
/// # Returns
///
/// Whether an existing folder will be overwritten, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        ensure!(
            is_empty || allow_overwrite,
            "Output folder already exists and is not empty (use --overwrite to replace its \
             contents)"
        );

        return Ok(!is_empty);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// The year column of a row
#[derive(Serialize, Debug, PartialEq)]
struct YearRow {
    year: i32,
}

/// Category subtotals, contingency and the grand total for one year of the cashflow
#[derive(Serialize, Debug, PartialEq)]
struct CashflowTotalsRow {
    fleet: Money,
    infrastructure: Money,
    workforce: Money,
    digital_solutions: Money,
    capex_contingency: Money,
    opex_contingency: Money,
    capex: Money,
    opex: Money,
    total: Money,
}

/// Identifies the cell in a row of the annual object summary file
#[derive(Serialize, Debug, PartialEq)]
struct ObjectRow {
    cell_id: CellID,
    category: String,
    year: i32,
}

/// Usage columns, named so they don't clash with the cost columns
#[derive(Serialize, Debug, PartialEq)]
struct UsageRow {
    operating_hours: Hours,
    energy_consumed: Energy,
    ghg_emissions: Emissions,
    headcount: Dimensionless,
    peak_power_kva: Power,
}

impl From<UsageTotals> for UsageRow {
    fn from(usage: UsageTotals) -> Self {
        Self {
            operating_hours: usage.operating_hours,
            energy_consumed: usage.energy,
            ghg_emissions: usage.emissions,
            headcount: usage.headcount,
            peak_power_kva: usage.peak_power,
        }
    }
}

/// Represents a row in the NPV file
#[derive(Serialize, Debug, PartialEq)]
struct NpvRow {
    scenario: String,
    cost: String,
    npv: Money,
    delta_from_baseline: Money,
}

/// Write the annual cashflow to file
fn write_annual_cashflow(file_path: &Path, cashflow: &CashflowSummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)?;
    for (year, row) in &cashflow.rows {
        let subtotal =
            |category: CellCategory| row.subtotals.get(&category).copied().unwrap_or_default();
        let totals = CashflowTotalsRow {
            fleet: subtotal(CellCategory::Fleet),
            infrastructure: subtotal(CellCategory::Infrastructure),
            workforce: subtotal(CellCategory::Workforce),
            digital_solutions: subtotal(CellCategory::DigitalSolutions),
            capex_contingency: row.capex_contingency,
            opex_contingency: row.opex_contingency,
            capex: row.capex(),
            opex: row.opex(),
            total: row.total(),
        };
        let usage = UsageRow::from(row.usage);
        writer.serialize((YearRow { year: *year }, row.costs, totals, usage))?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the annual costs of every cell to file
fn write_object_summaries<'a, I>(file_path: &Path, summaries: I) -> Result<()>
where
    I: IntoIterator<Item = &'a AnnualObjectSummary>,
{
    let mut writer = csv::Writer::from_path(file_path)?;
    for summary in summaries {
        for (year, row) in &summary.rows {
            let object = ObjectRow {
                cell_id: summary.cell_id.clone(),
                category: summary.category.to_string(),
                year: *year,
            };
            let costs: CostBreakdown = row.costs;
            writer.serialize((object, costs, UsageRow::from(row.usage)))?;
        }
    }
    writer.flush()?;

    Ok(())
}

/// Write the NPV of each scenario to file, in long format
fn write_npv(file_path: &Path, financial: &FinancialAnalysis) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)?;
    let baseline = financial.baseline();
    for scenario in &financial.scenarios {
        let mut costs: IndexMap<String, (Money, Money)> = IndexMap::new();
        costs.insert("total".into(), (scenario.total, scenario.delta_total));
        costs.insert("capex".into(), (scenario.capex, scenario.delta_capex));
        costs.insert("opex".into(), (scenario.opex, scenario.delta_opex));
        for (component, npv) in &scenario.components {
            let delta = *npv - baseline.components[component];
            costs.insert(component.to_string(), (*npv, delta));
        }

        for (cost, (npv, delta_from_baseline)) in costs {
            writer.serialize(NpvRow {
                scenario: scenario.name.clone(),
                cost,
                npv,
                delta_from_baseline,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}

/// Write the results of an analysis to CSV files in `output_dir`
pub fn write_results(output_dir: &Path, results: &AnalysisResults) -> Result<()> {
    let path = output_dir.join(ANNUAL_CASHFLOW_FILE_NAME);
    write_annual_cashflow(&path, &results.cashflow)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let path = output_dir.join(ANNUAL_OBJECT_SUMMARY_FILE_NAME);
    write_object_summaries(&path, results.object_summaries.values())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let path = output_dir.join(NPV_FILE_NAME);
    write_npv(&path, &results.financial)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
