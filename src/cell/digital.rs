//! Software and other digital solutions.
use super::{CellCategory, CellInfo, CostCell, PeriodContext, PeriodCosts};
use crate::cost::CostBreakdown;
use crate::schedule::{Instalments, Rate};
use crate::timeline::Timeline;
use crate::units::Money;
use anyhow::{Result, ensure};

/// A number of licences for a digital solution
#[derive(PartialEq, Debug, Clone)]
pub struct DigitalSolutionsCell {
    /// Common cell properties. The quantity is the number of licences.
    pub info: CellInfo,
    /// Name of the solution
    pub solution: String,
    /// Kind of solution (e.g. fleet management)
    pub solution_type: String,
    /// Commissioning cost per licence
    pub unit_price: Money,
    /// Subscription cost per licence
    pub subscription: Rate,
    /// When commissioning costs are paid
    pub commissioning: Instalments,
    /// If given, the subscription is only paid in the listed periods, as a fraction of the rate
    pub subscription_schedule: Option<Instalments>,
}

impl CostCell for DigitalSolutionsCell {
    fn info(&self) -> &CellInfo {
        &self.info
    }

    fn category(&self) -> CellCategory {
        CellCategory::DigitalSolutions
    }

    fn validate_parameters(&self, _timeline: &Timeline) -> Result<()> {
        let window = &self.info.window;
        ensure!(
            self.unit_price.is_finite() && self.unit_price >= Money(0.0),
            "Unit price of digital solution '{}' must be finite and non-negative",
            self.solution
        );
        self.subscription.validate("Subscription rate")?;

        if self.unit_price > Money(0.0) {
            self.commissioning
                .validate_complete(window, "Commissioning")?;
        } else {
            self.commissioning.validate(window, "Commissioning")?;
        }
        if let Some(schedule) = &self.subscription_schedule {
            schedule.validate(window, "Subscription")?;
        }

        Ok(())
    }

    fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts {
        let licences = self.info.scale();
        let rate = self.subscription.per_period(ctx.period_length) * licences;
        let subscription = match &self.subscription_schedule {
            Some(schedule) => rate * schedule.fraction_at(ctx.period),
            None => rate,
        };

        PeriodCosts {
            costs: CostBreakdown {
                purchase: self.unit_price * licences * self.commissioning.fraction_at(ctx.period),
                subscription,
                ..CostBreakdown::default()
            },
            ..PeriodCosts::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, digital_solution, energy_prices, monthly_timeline};
    use crate::prices::EnergyPrices;
    use crate::schedule::Instalment;
    use crate::timeline::PeriodLength;
    use crate::units::Hours;
    use rstest::rstest;

    fn context(prices: &EnergyPrices, period: u32) -> PeriodContext<'_> {
        PeriodContext {
            period,
            period_length: PeriodLength::Month,
            year: 2022,
            usage: None,
            cumulative_usage: Hours(0.0),
            prices,
        }
    }

    #[rstest]
    fn test_constant_subscription(
        digital_solution: DigitalSolutionsCell,
        energy_prices: EnergyPrices,
    ) {
        let first = digital_solution
            .period_costs(&context(&energy_prices, 0))
            .costs;
        assert_eq!(first.purchase, Money(50_000.0));
        assert_eq!(first.subscription, Money(2000.0));

        let later = digital_solution
            .period_costs(&context(&energy_prices, 10))
            .costs;
        assert_eq!(later.purchase, Money(0.0));
        assert_eq!(later.subscription, Money(2000.0));
    }

    #[rstest]
    fn test_scheduled_subscription(
        digital_solution: DigitalSolutionsCell,
        energy_prices: EnergyPrices,
    ) {
        let digital_solution = DigitalSolutionsCell {
            subscription_schedule: Some(Instalments::new(vec![
                Instalment::new(3, 0.5),
                Instalment::new(4, 1.0),
            ])),
            ..digital_solution
        };
        let subscription_at = |period| {
            digital_solution
                .period_costs(&context(&energy_prices, period))
                .costs
                .subscription
        };
        assert_eq!(subscription_at(2), Money(0.0));
        assert_eq!(subscription_at(3), Money(1000.0));
        assert_eq!(subscription_at(4), Money(2000.0));
    }

    #[rstest]
    fn test_validate(monthly_timeline: Timeline, digital_solution: DigitalSolutionsCell) {
        assert!(digital_solution.validate_parameters(&monthly_timeline).is_ok());
        let digital_solution = DigitalSolutionsCell {
            commissioning: Instalments::default(),
            ..digital_solution
        };
        assert_error!(
            digital_solution.validate_parameters(&monthly_timeline),
            "Commissioning instalment fractions must sum to one (got 0)"
        );
    }
}
