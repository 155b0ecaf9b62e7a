//! An analysis: a set of cost cells sharing a timeline, prices and financial parameters.
use crate::cashflow::{CashflowSummary, SummaryOptions, annual_cashflow_summary};
use crate::cell::{Cell, CellID};
use crate::extension::{PeriodRow, extend_timeline};
use crate::finance::{FinancialAnalysis, financial_analysis};
use crate::id::into_id_map;
use crate::prices::EnergyPrices;
use crate::summary::{AnnualObjectSummary, annual_object_summary};
use crate::timeline::Timeline;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;

/// The name of the scenario used when none are defined
pub const DEFAULT_SCENARIO_NAME: &str = "all";

/// Financial parameters for an analysis
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct AnalysisParameters {
    /// The annual discount rate used for NPV calculations
    pub discount_rate: Dimensionless,
    /// The year to which costs are discounted.
    ///
    /// Defaults to the first year of the timeline.
    #[serde(default)]
    pub npv_start_year: Option<i32>,
    /// Contingency options for the cashflow summary
    #[serde(flatten)]
    pub summary: SummaryOptions,
}

impl AnalysisParameters {
    /// Check the parameters are valid for the given timeline
    fn validate(&self, timeline: &Timeline) -> Result<()> {
        ensure!(
            self.discount_rate.is_finite() && self.discount_rate >= Dimensionless(0.0),
            "discount_rate must be a finite, non-negative number (got {})",
            self.discount_rate
        );
        let (first_year, _) = timeline.year_span();
        if let Some(start_year) = self.npv_start_year {
            ensure!(
                start_year <= first_year,
                "npv_start_year ({start_year}) is after the first year of the timeline \
                 ({first_year})"
            );
        }

        self.summary.validate()
    }
}

/// A named group of cells whose costs are compared with other scenarios
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// The cells included in the scenario
    pub cells: Vec<CellID>,
}

/// Everything needed to calculate the costs of a mining fleet
#[derive(PartialEq, Debug, Clone)]
pub struct Analysis {
    /// The timeline shared by every cell
    pub timeline: Timeline,
    /// Energy prices and emissions factors
    pub prices: EnergyPrices,
    /// Financial parameters
    pub parameters: AnalysisParameters,
    /// The cost cells, keyed by ID
    pub cells: IndexMap<CellID, Cell>,
    /// Scenarios to compare. The first is the baseline.
    pub scenarios: Vec<Scenario>,
}

/// The outputs of an analysis
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisResults {
    /// The costs of each cell in each of its active periods
    pub periods: IndexMap<CellID, Vec<PeriodRow>>,
    /// The annual costs of each cell
    pub object_summaries: IndexMap<CellID, AnnualObjectSummary>,
    /// The annual cashflow of every cell together
    pub cashflow: CashflowSummary,
    /// The annual cashflow of each scenario
    pub scenario_cashflows: IndexMap<String, CashflowSummary>,
    /// NPVs of each scenario
    pub financial: FinancialAnalysis,
}

/// Check that scenarios have unique names and list each known cell at most once
fn check_scenarios(scenarios: &[Scenario], cells: &IndexMap<CellID, Cell>) -> Result<()> {
    let mut names = HashSet::new();
    for scenario in scenarios {
        ensure!(
            names.insert(scenario.name.as_str()),
            "Duplicate scenario name found: {}",
            scenario.name
        );
        let mut seen = HashSet::new();
        for id in &scenario.cells {
            ensure!(
                cells.contains_key(id),
                "Scenario '{}' refers to unknown cell '{id}'",
                scenario.name
            );
            ensure!(
                seen.insert(id),
                "Scenario '{}' lists cell '{id}' more than once",
                scenario.name
            );
        }
        if scenario.cells.is_empty() {
            warn!("Scenario '{}' contains no cells", scenario.name);
        }
    }

    Ok(())
}

impl Analysis {
    /// Create a new [`Analysis`], validating every part of it.
    ///
    /// If no scenarios are given, a single scenario containing every cell is used.
    pub fn new(
        timeline: Timeline,
        prices: EnergyPrices,
        parameters: AnalysisParameters,
        cells: Vec<Cell>,
        scenarios: Vec<Scenario>,
    ) -> Result<Self> {
        timeline.validate().context("Invalid timeline")?;
        prices.validate().context("Invalid energy prices")?;
        parameters
            .validate(&timeline)
            .context("Invalid analysis parameters")?;

        let cells = into_id_map(cells, "cell")?;
        for cell in cells.values() {
            cell.validate(&timeline)?;
        }

        let scenarios = if scenarios.is_empty() {
            vec![Scenario {
                name: DEFAULT_SCENARIO_NAME.into(),
                cells: cells.keys().cloned().collect(),
            }]
        } else {
            check_scenarios(&scenarios, &cells)?;
            scenarios
        };

        Ok(Self {
            timeline,
            prices,
            parameters,
            cells,
            scenarios,
        })
    }

    /// The year to which costs are discounted
    pub fn npv_start_year(&self) -> i32 {
        self.parameters
            .npv_start_year
            .unwrap_or_else(|| self.timeline.year_span().0)
    }

    /// Calculate the costs of every cell and compare the scenarios
    pub fn run(&self) -> Result<AnalysisResults> {
        let mut periods = IndexMap::new();
        let mut object_summaries = IndexMap::new();
        for (id, cell) in &self.cells {
            let rows = extend_timeline(cell, &self.timeline, &self.prices)?;
            object_summaries.insert(id.clone(), annual_object_summary(cell, &rows));
            periods.insert(id.clone(), rows);
        }
        info!("Calculated costs for {} cells", self.cells.len());

        let options = &self.parameters.summary;
        let all: Vec<_> = object_summaries.values().cloned().collect();
        let cashflow = annual_cashflow_summary(&all, options);

        let scenario_cashflows: IndexMap<String, CashflowSummary> = self
            .scenarios
            .iter()
            .map(|scenario| {
                let summaries: Vec<_> = scenario
                    .cells
                    .iter()
                    .map(|id| object_summaries[id].clone())
                    .collect();
                (
                    scenario.name.clone(),
                    annual_cashflow_summary(&summaries, options),
                )
            })
            .collect();

        let financial = financial_analysis(
            self.npv_start_year(),
            &scenario_cashflows,
            self.parameters.discount_rate,
        )?;
        info!(
            "Total cost of ownership: {:.2} (NPV {:.2})",
            cashflow.total().value(),
            financial.baseline().total.value()
        );

        Ok(AnalysisResults {
            periods,
            object_summaries,
            cashflow,
            scenario_cashflows,
            financial,
        })
    }
}
