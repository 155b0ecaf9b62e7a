//! Projection of a cell's costs over the analysis timeline.
use crate::cell::{Cell, PeriodContext, PeriodCosts};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::prices::EnergyPrices;
use crate::timeline::Timeline;
use crate::units::Hours;
use anyhow::Result;
use chrono::NaiveDate;
use log::debug;

/// The costs of one cell in one active period
#[derive(PartialEq, Debug, Clone)]
pub struct PeriodRow {
    /// Index of the period in the timeline
    pub period: u32,
    /// The date on which the period starts
    pub date: NaiveDate,
    /// The calendar year in which the period starts
    pub year: i32,
    /// The value of each cost component
    pub costs: CostBreakdown,
    /// Operating hours, energy and emissions
    pub usage: UsageTotals,
    /// Running total of the usage driver (hours per unit), including this period
    pub cumulative_usage: Hours,
}

/// Project a cell over the timeline, producing one row per active period.
///
/// The cell is validated first. Periods outside the cell's active window are absent from the
/// output, so a cell with an empty window produces no rows.
///
/// # Arguments
///
/// * `cell` - The cell to project
/// * `timeline` - The timeline shared by every cell in the analysis
/// * `prices` - Energy prices for the analysis
///
/// # Returns
///
/// A row for each active period, in order, or an error if the cell is invalid.
pub fn extend_timeline(
    cell: &Cell,
    timeline: &Timeline,
    prices: &EnergyPrices,
) -> Result<Vec<PeriodRow>> {
    cell.validate(timeline)?;
    let rows = project(cell, timeline, prices);
    debug!(
        "Extended {} cell '{}' over {} periods",
        cell.category(),
        cell.id(),
        rows.len()
    );

    Ok(rows)
}

/// Calculate the rows for an already-validated cell
fn project(cell: &Cell, timeline: &Timeline, prices: &EnergyPrices) -> Vec<PeriodRow> {
    let usage = cell.usage();
    cell.window()
        .periods()
        .enumerate()
        .scan(Hours(0.0), |cumulative_usage, (index, period)| {
            let period_usage = usage.map(|usage| usage[index]);
            *cumulative_usage += period_usage.unwrap_or_default();

            let ctx = PeriodContext {
                period,
                period_length: timeline.period_length,
                year: timeline.year_of(period),
                usage: period_usage,
                cumulative_usage: *cumulative_usage,
                prices,
            };
            let PeriodCosts { costs, usage } = cell.period_costs(&ctx);

            Some(PeriodRow {
                period,
                date: timeline.date_of(period),
                year: ctx.year,
                costs,
                usage,
                cumulative_usage: *cumulative_usage,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellInfo, FleetCell, WorkforceCell};
    use crate::fixture::{
        assert_error, date, energy_prices, fleet, fleet_cell, monthly_timeline, workforce,
        workforce_cell,
    };
    use crate::timeline::ActiveWindow;
    use crate::units::Money;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_extend_fleet(
        monthly_timeline: Timeline,
        fleet_cell: Cell,
        energy_prices: EnergyPrices,
    ) {
        let rows = extend_timeline(&fleet_cell, &monthly_timeline, &energy_prices).unwrap();
        assert_eq!(rows.len(), 36);
        assert_eq!(rows[0].date, date(2022, 1, 1));
        assert_eq!(rows[35].year, 2024);
        assert_eq!(rows[0].cumulative_usage, Hours(400.0));
        assert_eq!(rows[35].cumulative_usage, Hours(14_400.0));
        assert!(
            rows.windows(2)
                .all(|pair| pair[1].cumulative_usage >= pair[0].cumulative_usage)
        );

        // Purchase paid only in the first period
        assert_eq!(rows[0].costs.purchase, Money(3_000_000.0));
        assert!(rows[1..].iter().all(|row| row.costs.purchase == Money(0.0)));

        // Period 12 runs each vehicle from 4800 to 5200 hours, across the 5000 hour threshold
        assert_approx_eq!(Money, rows[0].costs.maintenance, Money(3200.0), epsilon = 1e-6);
        assert_approx_eq!(Money, rows[12].costs.maintenance, Money(7200.0), epsilon = 1e-6);

        // Up to 10000 hours each vehicle pays exactly the schedule total
        let lifecycle: Money = rows[..25].iter().map(|row| row.costs.maintenance).sum();
        assert_approx_eq!(Money, lifecycle, Money(2.0 * 85_000.0), epsilon = 1e-6);
    }

    #[rstest]
    fn test_extend_partial_window(
        monthly_timeline: Timeline,
        workforce: WorkforceCell,
        energy_prices: EnergyPrices,
    ) {
        let mut workforce = workforce;
        workforce.info.window = ActiveWindow::new(12, 12);
        let rows =
            extend_timeline(&Cell::Workforce(workforce), &monthly_timeline, &energy_prices)
                .unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].period, 12);
        assert!(rows.iter().all(|row| row.year == 2023));
        assert!(rows.iter().all(|row| row.cumulative_usage == Hours(0.0)));
    }

    #[rstest]
    fn test_extend_empty_window(
        monthly_timeline: Timeline,
        fleet: FleetCell,
        energy_prices: EnergyPrices,
    ) {
        let fleet = FleetCell {
            info: CellInfo::new("idle", ActiveWindow::new(10, 0), 2),
            operating_hours: Vec::new(),
            ..fleet
        };
        let rows = extend_timeline(&Cell::Fleet(fleet), &monthly_timeline, &energy_prices).unwrap();
        assert!(rows.is_empty());
    }

    #[rstest]
    fn test_extend_short_usage(
        monthly_timeline: Timeline,
        fleet: FleetCell,
        energy_prices: EnergyPrices,
    ) {
        let fleet = FleetCell {
            operating_hours: vec![Hours(400.0); 30],
            ..fleet
        };
        assert_error!(
            extend_timeline(&Cell::Fleet(fleet), &monthly_timeline, &energy_prices),
            "Invalid fleet cell 'lhd_fleet'"
        );
    }

    #[rstest]
    fn test_extend_workforce(
        monthly_timeline: Timeline,
        workforce_cell: Cell,
        energy_prices: EnergyPrices,
    ) {
        let rows = extend_timeline(&workforce_cell, &monthly_timeline, &energy_prices).unwrap();
        let labour: Money = rows
            .iter()
            .filter(|row| row.year == 2022)
            .map(|row| row.costs.labour)
            .sum();
        assert_approx_eq!(Money, labour, Money(800_000.0), epsilon = 1e-6);
    }
}
