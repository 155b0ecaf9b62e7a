//! Groups of workers.
use super::{CellCategory, CellInfo, CostCell, PeriodContext, PeriodCosts};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::schedule::Rate;
use crate::timeline::Timeline;
use crate::units::Dimensionless;
use anyhow::{Result, ensure};
use std::collections::BTreeMap;

/// A group of workers sharing a role and labour rate
#[derive(PartialEq, Debug, Clone)]
pub struct WorkforceCell {
    /// Common cell properties. The quantity is the default headcount.
    pub info: CellInfo,
    /// The role of the workers (e.g. electrician)
    pub role: String,
    /// Labour cost per worker
    pub rate: Rate,
    /// Headcount for particular calendar years, overriding the quantity
    pub headcount_plan: BTreeMap<i32, u32>,
}

impl WorkforceCell {
    /// The number of workers employed in the given calendar year
    pub fn headcount(&self, year: i32) -> u32 {
        self.headcount_plan
            .get(&year)
            .copied()
            .unwrap_or(self.info.quantity)
    }
}

impl CostCell for WorkforceCell {
    fn info(&self) -> &CellInfo {
        &self.info
    }

    fn category(&self) -> CellCategory {
        CellCategory::Workforce
    }

    fn validate_parameters(&self, timeline: &Timeline) -> Result<()> {
        self.rate.validate("Labour rate")?;
        let (first, last) = timeline.year_span();
        for year in self.headcount_plan.keys() {
            ensure!(
                (first..=last).contains(year),
                "Headcount plan year {year} lies outside the timeline ({first}-{last})"
            );
        }

        Ok(())
    }

    fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts {
        let headcount = Dimensionless(f64::from(self.headcount(ctx.year)));

        PeriodCosts {
            costs: CostBreakdown {
                labour: self.rate.per_period(ctx.period_length) * headcount,
                ..CostBreakdown::default()
            },
            usage: UsageTotals {
                headcount,
                ..UsageTotals::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, energy_prices, monthly_timeline, workforce};
    use crate::prices::EnergyPrices;
    use crate::timeline::PeriodLength;
    use crate::units::{Hours, Money};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn context(
        prices: &EnergyPrices,
        period_length: PeriodLength,
        year: i32,
    ) -> PeriodContext<'_> {
        PeriodContext {
            period: 0,
            period_length,
            year,
            usage: None,
            cumulative_usage: Hours(0.0),
            prices,
        }
    }

    #[rstest]
    #[case(PeriodLength::Month, 2022, 10.0, 800_000.0 / 12.0)]
    #[case(PeriodLength::Year, 2022, 10.0, 800_000.0)]
    #[case(PeriodLength::Year, 2023, 12.0, 960_000.0)] // from the headcount plan
    fn test_labour_cost(
        workforce: WorkforceCell,
        energy_prices: EnergyPrices,
        #[case] period_length: PeriodLength,
        #[case] year: i32,
        #[case] headcount: f64,
        #[case] expected: f64,
    ) {
        let workforce = WorkforceCell {
            headcount_plan: [(2023, 12)].into_iter().collect(),
            ..workforce
        };
        let result = workforce.period_costs(&context(&energy_prices, period_length, year));
        assert_approx_eq!(Money, result.costs.labour, Money(expected), epsilon = 1e-6);
        assert_eq!(result.costs.total(), result.costs.labour);
        assert_eq!(result.usage.headcount, Dimensionless(headcount));
    }

    #[rstest]
    fn test_validate_plan_outside_timeline(monthly_timeline: Timeline, workforce: WorkforceCell) {
        assert!(workforce.validate_parameters(&monthly_timeline).is_ok());
        let workforce = WorkforceCell {
            headcount_plan: [(2030, 5)].into_iter().collect(),
            ..workforce
        };
        assert_error!(
            workforce.validate_parameters(&monthly_timeline),
            "Headcount plan year 2030 lies outside the timeline (2022-2024)"
        );
    }
}
