//! The consolidated annual cashflow of an analysis.
use crate::cell::CellCategory;
use crate::cost::{CostBreakdown, CostComponent, UsageTotals};
use crate::summary::AnnualObjectSummary;
use crate::units::{Dimensionless, Money};
use anyhow::{Result, ensure};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Options controlling how the cashflow summary is built
#[derive(PartialEq, Debug, Clone, Copy, Default, Deserialize)]
pub struct SummaryOptions {
    /// Contingency added on top of capital expenditure, as a fraction of pre-subsidy capex
    #[serde(default)]
    pub capex_contingency: Dimensionless,
    /// Contingency added on top of operating expenditure, as a fraction of pre-subsidy opex
    #[serde(default)]
    pub opex_contingency: Dimensionless,
}

impl SummaryOptions {
    /// Check that the contingency fractions are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("Capex contingency", self.capex_contingency),
            ("Opex contingency", self.opex_contingency),
        ] {
            ensure!(
                value.is_finite() && value >= Dimensionless(0.0),
                "{name} must be a finite, non-negative fraction (got {value})"
            );
        }

        Ok(())
    }
}

/// The cashflow for one year, summed over every cell
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CashflowRow {
    /// The value of each cost component
    pub costs: CostBreakdown,
    /// Operating hours, energy and emissions
    pub usage: UsageTotals,
    /// Total cost of the cells in each category contributing to this year
    pub subtotals: BTreeMap<CellCategory, Money>,
    /// Contingency on capital expenditure
    pub capex_contingency: Money,
    /// Contingency on operating expenditure
    pub opex_contingency: Money,
}

impl CashflowRow {
    /// Total contingency
    pub fn contingency(&self) -> Money {
        self.capex_contingency + self.opex_contingency
    }

    /// Capital expenditure, net of subsidies and including contingency
    pub fn capex(&self) -> Money {
        self.costs.capex() + self.capex_contingency
    }

    /// Operating expenditure, net of subsidies and including contingency
    pub fn opex(&self) -> Money {
        self.costs.opex() + self.opex_contingency
    }

    /// The grand total for the year
    pub fn total(&self) -> Money {
        self.costs.total() + self.contingency()
    }
}

/// The annual cashflow of an analysis
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CashflowSummary {
    /// One row per year in which any cell is active
    pub rows: BTreeMap<i32, CashflowRow>,
}

impl CashflowSummary {
    fn series<F>(&self, f: F) -> BTreeMap<i32, Money>
    where
        F: Fn(&CashflowRow) -> Money,
    {
        self.rows.iter().map(|(year, row)| (*year, f(row))).collect()
    }

    /// The grand total for each year
    pub fn total_series(&self) -> BTreeMap<i32, Money> {
        self.series(CashflowRow::total)
    }

    /// Capital expenditure for each year
    pub fn capex_series(&self) -> BTreeMap<i32, Money> {
        self.series(CashflowRow::capex)
    }

    /// Operating expenditure for each year
    pub fn opex_series(&self) -> BTreeMap<i32, Money> {
        self.series(CashflowRow::opex)
    }

    /// The value of a single cost component for each year
    pub fn component_series(&self, component: CostComponent) -> BTreeMap<i32, Money> {
        self.series(|row| row.costs.get(component))
    }

    /// The total cost of ownership, undiscounted
    pub fn total(&self) -> Money {
        self.rows.values().map(CashflowRow::total).sum()
    }
}

/// Combine the annual summaries of every cell in an analysis into one cashflow table.
///
/// The table covers the union of the years in which any cell is active. Each year sums only the
/// cells active in that year. Contingency is calculated on the pre-subsidy capex and opex of each
/// year.
pub fn annual_cashflow_summary(
    summaries: &[AnnualObjectSummary],
    options: &SummaryOptions,
) -> CashflowSummary {
    let mut rows: BTreeMap<i32, CashflowRow> = BTreeMap::new();
    for summary in summaries {
        for (year, annual) in &summary.rows {
            let row = rows.entry(*year).or_default();
            row.costs += annual.costs;
            row.usage += annual.usage;
            *row.subtotals.entry(summary.category).or_default() += annual.costs.total();
        }
    }

    for row in rows.values_mut() {
        row.capex_contingency = row.costs.gross_capex() * options.capex_contingency;
        row.opex_contingency = row.costs.gross_opex() * options.opex_contingency;
    }
    debug!(
        "Built cashflow summary of {} cells over {} years",
        summaries.len(),
        rows.len()
    );

    CashflowSummary { rows }
}
