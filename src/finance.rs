//! Discounting and comparison of cashflows.
use crate::cashflow::CashflowSummary;
use crate::cost::CostComponent;
use crate::units::{Dimensionless, Money};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use log::info;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Calculates the net present value of an annual series of costs.
///
/// Each year's cost is discounted by `(1 + rate)^(year - start_year)`, so costs in the start year
/// are undiscounted. Years between the start year and the first year of the series, or missing
/// from the series, count as zero.
///
/// # Arguments
///
/// * `start_year` - The year to which costs are discounted
/// * `series` - Cost for each year
/// * `rate` - The annual discount rate
///
/// # Returns
///
/// The NPV, or an error if the rate is negative or not finite, the start year lies after the first
/// year of the series or the result is not finite.
pub fn npv_calc(
    start_year: i32,
    series: &BTreeMap<i32, Money>,
    rate: Dimensionless,
) -> Result<Money> {
    ensure!(
        rate.is_finite() && rate >= Dimensionless(0.0),
        "Discount rate must be a finite, non-negative number (got {rate})"
    );
    let Some(first_year) = series.keys().next() else {
        return Ok(Money(0.0));
    };
    ensure!(
        start_year <= *first_year,
        "NPV start year ({start_year}) is after the first year of the series ({first_year})"
    );

    let factor = Dimensionless(1.0) + rate;
    let npv: Money = series
        .iter()
        .map(|(year, cost)| *cost / factor.powi(year - start_year))
        .sum();
    ensure!(npv.is_finite(), "Net present value is not finite (got {npv})");

    Ok(npv)
}

/// Discounted costs of a single scenario
#[derive(PartialEq, Debug, Clone)]
pub struct ScenarioNpv {
    /// Name of the scenario
    pub name: String,
    /// NPV of the total cost, including contingency
    pub total: Money,
    /// NPV of capital expenditure, including contingency
    pub capex: Money,
    /// NPV of operating expenditure, including contingency
    pub opex: Money,
    /// NPV of each cost component
    pub components: IndexMap<CostComponent, Money>,
    /// Difference between the total NPV and that of the baseline scenario
    pub delta_total: Money,
    /// Difference between the capex NPV and that of the baseline scenario
    pub delta_capex: Money,
    /// Difference between the opex NPV and that of the baseline scenario
    pub delta_opex: Money,
}

/// The result of comparing scenarios by NPV
#[derive(PartialEq, Debug, Clone)]
pub struct FinancialAnalysis {
    /// The year to which costs were discounted
    pub start_year: i32,
    /// The discount rate used
    pub discount_rate: Dimensionless,
    /// Results for each scenario. The first is the baseline.
    pub scenarios: Vec<ScenarioNpv>,
}

impl FinancialAnalysis {
    /// The scenario against which the others are compared
    pub fn baseline(&self) -> &ScenarioNpv {
        &self.scenarios[0]
    }

    /// The scenario with the lowest total NPV
    pub fn cheapest(&self) -> &ScenarioNpv {
        self.scenarios
            .iter()
            .min_by(|a, b| a.total.value().total_cmp(&b.total.value()))
            .unwrap_or_else(|| self.baseline())
    }
}

/// Calculate the NPVs of a single cashflow summary
fn scenario_npv(
    name: &str,
    cashflow: &CashflowSummary,
    start_year: i32,
    rate: Dimensionless,
) -> Result<ScenarioNpv> {
    let components = CostComponent::iter()
        .map(|component| -> Result<(CostComponent, Money)> {
            let npv = npv_calc(start_year, &cashflow.component_series(component), rate)?;
            Ok((component, npv))
        })
        .collect::<Result<_>>()?;

    Ok(ScenarioNpv {
        name: name.into(),
        total: npv_calc(start_year, &cashflow.total_series(), rate)?,
        capex: npv_calc(start_year, &cashflow.capex_series(), rate)?,
        opex: npv_calc(start_year, &cashflow.opex_series(), rate)?,
        components,
        delta_total: Money(0.0),
        delta_capex: Money(0.0),
        delta_opex: Money(0.0),
    })
}

/// Compare the discounted costs of one or more scenarios.
///
/// The first scenario is treated as the baseline, against which the others are compared.
///
/// # Arguments
///
/// * `start_year` - The year to which costs are discounted
/// * `scenarios` - The cashflow summary of each scenario, keyed by name
/// * `rate` - The annual discount rate
pub fn financial_analysis(
    start_year: i32,
    scenarios: &IndexMap<String, CashflowSummary>,
    rate: Dimensionless,
) -> Result<FinancialAnalysis> {
    if scenarios.is_empty() {
        bail!("At least one scenario is required for financial analysis");
    }

    let mut results = scenarios
        .iter()
        .map(|(name, cashflow)| {
            scenario_npv(name, cashflow, start_year, rate)
                .with_context(|| format!("Could not calculate NPV for scenario '{name}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let (base_total, base_capex, base_opex) = {
        let base = &results[0];
        (base.total, base.capex, base.opex)
    };
    for result in &mut results {
        result.delta_total = result.total - base_total;
        result.delta_capex = result.capex - base_capex;
        result.delta_opex = result.opex - base_opex;
        info!(
            "NPV of scenario '{}' at a discount rate of {rate}: {:.2}",
            result.name,
            result.total.value()
        );
    }

    Ok(FinancialAnalysis {
        start_year,
        discount_rate: rate,
        scenarios: results,
    })
}
