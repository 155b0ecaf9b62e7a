//! Annual totals for a single cell.
use crate::cell::{Cell, CellCategory, CellID};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::extension::PeriodRow;
use log::{debug, warn};
use std::collections::BTreeMap;

/// The costs and physical quantities summed over one year
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct AnnualRow {
    /// The value of each cost component
    pub costs: CostBreakdown,
    /// Physical quantities, with headcount and peak power taken as the year's maximum
    pub usage: UsageTotals,
}

/// The annual costs of one cell
#[derive(PartialEq, Debug, Clone)]
pub struct AnnualObjectSummary {
    /// The cell summarised
    pub cell_id: CellID,
    /// The category of the cell
    pub category: CellCategory,
    /// Totals for each year in which the cell is active
    pub rows: BTreeMap<i32, AnnualRow>,
}

/// Sum the period rows of a cell into annual totals.
///
/// Years in which the cell has no active period are omitted. A partially-active year only sums
/// the periods in which the cell is active.
pub fn annual_object_summary(cell: &Cell, rows: &[PeriodRow]) -> AnnualObjectSummary {
    let mut annual: BTreeMap<i32, AnnualRow> = BTreeMap::new();
    for row in rows {
        let entry = annual.entry(row.year).or_default();
        entry.costs += row.costs;
        entry.usage.merge_period(row.usage);
    }

    if !annual.is_empty() && annual.values().all(|row| row.costs == CostBreakdown::default()) {
        warn!(
            "{} cell '{}' is active but contributes no costs",
            cell.category(),
            cell.id()
        );
    }
    debug!(
        "Summarised {} cell '{}' over {} years",
        cell.category(),
        cell.id(),
        annual.len()
    );

    AnnualObjectSummary {
        cell_id: cell.id().clone(),
        category: cell.category(),
        rows: annual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellInfo, FleetCell, WorkforceCell};
    use crate::cost::CostComponent;
    use crate::extension::extend_timeline;
    use crate::fixture::{energy_prices, fleet, fleet_cell, monthly_timeline, workforce};
    use crate::prices::EnergyPrices;
    use crate::timeline::{ActiveWindow, Timeline};
    use crate::units::{Dimensionless, Hours, Money, Power};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    fn test_annual_fleet(
        monthly_timeline: Timeline,
        fleet_cell: Cell,
        energy_prices: EnergyPrices,
    ) {
        let rows = extend_timeline(&fleet_cell, &monthly_timeline, &energy_prices).unwrap();
        let summary = annual_object_summary(&fleet_cell, &rows);
        assert_eq!(summary.cell_id, *fleet_cell.id());
        assert_eq!(summary.category, CellCategory::Fleet);
        assert_eq!(summary.rows.keys().copied().collect::<Vec<_>>(), [2022, 2023, 2024]);

        // Two vehicles working 400 hours a month
        assert_eq!(summary.rows[&2022].usage.operating_hours, Hours(9600.0));
        assert_eq!(summary.rows[&2022].costs.purchase, Money(3_000_000.0));
        assert_eq!(summary.rows[&2023].costs.purchase, Money(0.0));

        // Annual totals are the sum of the period totals
        let period_total: Money = rows.iter().map(|row| row.costs.total()).sum();
        let annual_total: Money = summary.rows.values().map(|row| row.costs.total()).sum();
        assert_approx_eq!(Money, period_total, annual_total, epsilon = 1e-6);
    }

    #[rstest]
    fn test_annual_partial_year(
        monthly_timeline: Timeline,
        workforce: WorkforceCell,
        energy_prices: EnergyPrices,
    ) {
        // Active from October 2022 to March 2023
        let workforce = WorkforceCell {
            info: CellInfo::new("operators", ActiveWindow::new(9, 6), 10),
            ..workforce
        };
        let cell = Cell::Workforce(workforce);
        let rows = extend_timeline(&cell, &monthly_timeline, &energy_prices).unwrap();
        let summary = annual_object_summary(&cell, &rows);
        assert_eq!(summary.rows.len(), 2);
        assert!(!summary.rows.contains_key(&2024));
        // Headcount is a level, not summed over the months
        assert_eq!(summary.rows[&2022].usage.headcount, Dimensionless(10.0));
        assert_approx_eq!(
            Money,
            summary.rows[&2022].costs.labour,
            Money(200_000.0),
            epsilon = 1e-6
        );
        assert_approx_eq!(
            Money,
            summary.rows[&2023].costs.labour,
            Money(200_000.0),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_annual_totals_by_year(
        monthly_timeline: Timeline,
        fleet: FleetCell,
        energy_prices: EnergyPrices,
    ) {
        // Active from June 2022 to January 2024, so the first and last years are partial
        let fleet = FleetCell {
            info: CellInfo::new("lhd_fleet", ActiveWindow::new(5, 20), 2),
            operating_hours: vec![Hours(400.0); 20],
            ..fleet
        };
        let cell = Cell::Fleet(fleet);
        let rows = extend_timeline(&cell, &monthly_timeline, &energy_prices).unwrap();
        let summary = annual_object_summary(&cell, &rows);
        assert_eq!(summary.rows.keys().copied().collect::<Vec<_>>(), [2022, 2023, 2024]);

        for (year, annual) in &summary.rows {
            let periods: Vec<_> = rows.iter().filter(|row| row.year == *year).collect();
            for component in CostComponent::iter() {
                let expected: Money = periods.iter().map(|row| row.costs.get(component)).sum();
                assert_approx_eq!(
                    Money,
                    annual.costs.get(component),
                    expected,
                    epsilon = 1e-6
                );
            }
            let expected: Money = periods.iter().map(|row| row.costs.total()).sum();
            assert_approx_eq!(Money, annual.costs.total(), expected, epsilon = 1e-6);
            let hours: Hours = periods.iter().map(|row| row.usage.operating_hours).sum();
            assert_eq!(annual.usage.operating_hours, hours);
            let peak = periods
                .iter()
                .map(|row| row.usage.peak_power)
                .fold(Power(0.0), Power::max);
            assert_eq!(annual.usage.peak_power, peak);
        }
        assert_eq!(summary.rows[&2022].usage.operating_hours, Hours(7.0 * 800.0));
        assert_eq!(summary.rows[&2024].usage.operating_hours, Hours(800.0));
    }

    #[rstest]
    fn test_annual_no_rows(fleet_cell: Cell) {
        let summary = annual_object_summary(&fleet_cell, &[]);
        assert!(summary.rows.is_empty());
    }
}
