//! Charging stations and other infrastructure.
use super::fleet::EvseModel;
use super::{CellCategory, CellInfo, CostCell, PeriodContext, PeriodCosts};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::schedule::Instalments;
use crate::timeline::Timeline;
use crate::units::{Dimensionless, Hours, Length, Money, MoneyPerLength, Power};
use anyhow::{Context, Result, ensure};
use serde_string_enum::DeserializeLabeledStringEnum;
use std::sync::Arc;
use strum::Display;

/// The kind of infrastructure
#[derive(PartialEq, Eq, Clone, Copy, Debug, Display, DeserializeLabeledStringEnum)]
pub enum InfraType {
    /// A charging station with battery bays
    #[string = "charging station"]
    #[strum(serialize = "charging station")]
    ChargingStation,
    /// Any other infrastructure
    #[string = "other"]
    #[strum(serialize = "other")]
    Other,
}

/// Construction parameters for a type of facility
#[derive(PartialEq, Debug, Clone)]
pub struct FacilityParameters {
    /// Name of the facility type
    pub name: String,
    /// Development cost for a facility housing two batteries
    pub development_cost: Money,
    /// Cost of pulling cable, per metre
    pub cable_pull_cost: MoneyPerLength,
}

/// Power drawn by infrastructure while operating
#[derive(PartialEq, Debug, Clone)]
pub struct InfraPowerDraw {
    /// Rated power of the infrastructure
    pub rated_power: Power,
    /// Operating hours per facility for each active period
    pub operating_hours: Vec<Hours>,
}

/// A group of identical infrastructure facilities
#[derive(PartialEq, Debug, Clone)]
pub struct InfraCell {
    /// Common cell properties. The quantity is the number of facilities.
    pub info: CellInfo,
    /// The kind of infrastructure
    pub infra_type: InfraType,
    /// Construction parameters, required for charging stations
    pub facility: Option<Arc<FacilityParameters>>,
    /// Number of battery bays in each facility
    pub batteries: u32,
    /// Length of cable installed for each facility
    pub cable_length: Length,
    /// Chargers installed in each facility, with their counts
    pub evse_stock: Vec<(Arc<EvseModel>, u32)>,
    /// When construction costs are paid
    pub construction: Instalments,
    /// When the chargers are paid for
    pub equipment: Instalments,
    /// Whether the chargers are covered by a battery-as-a-service subscription
    pub baas_subscription: bool,
    /// Power drawn by the facility, if any
    pub power_draw: Option<InfraPowerDraw>,
}

impl InfraCell {
    /// The construction cost of a single facility
    pub fn construction_cost(&self) -> Money {
        match (&self.facility, self.infra_type) {
            (Some(facility), InfraType::ChargingStation) => {
                let bays = Dimensionless(f64::from(self.batteries) / 2.0);
                facility.development_cost * bays + facility.cable_pull_cost * self.cable_length
            }
            _ => Money(0.0),
        }
    }

    /// The cost of the chargers installed in a single facility
    pub fn equipment_cost(&self) -> Money {
        self.evse_stock
            .iter()
            .map(|(evse, count)| evse.unit_price * Dimensionless(f64::from(*count)))
            .sum()
    }
}

impl CostCell for InfraCell {
    fn info(&self) -> &CellInfo {
        &self.info
    }

    fn category(&self) -> CellCategory {
        CellCategory::Infrastructure
    }

    fn usage(&self) -> Option<&[Hours]> {
        self.power_draw
            .as_ref()
            .map(|draw| draw.operating_hours.as_slice())
    }

    fn validate_parameters(&self, timeline: &Timeline) -> Result<()> {
        let window = &self.info.window;
        if self.infra_type == InfraType::ChargingStation {
            let facility = self
                .facility
                .as_ref()
                .context("Charging stations require facility parameters")?;
            ensure!(
                facility.development_cost.is_finite()
                    && facility.development_cost >= Money(0.0)
                    && facility.cable_pull_cost.is_finite()
                    && facility.cable_pull_cost >= MoneyPerLength(0.0),
                "Costs for facility '{}' must be finite and non-negative",
                facility.name
            );
        }
        ensure!(
            self.cable_length.is_finite() && self.cable_length >= Length(0.0),
            "Cable length must be finite and non-negative"
        );
        for (evse, _) in &self.evse_stock {
            evse.validate()?;
        }

        if self.construction_cost() > Money(0.0) {
            self.construction
                .validate_complete(window, "Construction")?;
        } else {
            self.construction.validate(window, "Construction")?;
        }
        if self.evse_stock.is_empty() {
            self.equipment.validate(window, "Equipment")?;
        } else {
            self.equipment.validate_complete(window, "Equipment")?;
        }

        if let Some(draw) = &self.power_draw {
            ensure!(
                draw.rated_power.is_finite() && draw.rated_power >= Power(0.0),
                "Rated power must be finite and non-negative"
            );
            for (period, hours) in window.periods().zip(&draw.operating_hours) {
                let available = timeline.hours_in(period);
                ensure!(
                    *hours <= available,
                    "Operating hours ({hours}) in period {period} exceed the hours in the period \
                     ({available})"
                );
            }
        }

        Ok(())
    }

    fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts {
        let facilities = self.info.scale();

        let construction =
            self.construction_cost() * facilities * self.construction.fraction_at(ctx.period);
        let purchase = self.equipment_cost() * facilities * self.equipment.fraction_at(ctx.period);
        let subscription = if self.baas_subscription {
            self.evse_stock
                .iter()
                .map(|(evse, count)| {
                    evse.baas_rate.per_period(ctx.period_length) * Dimensionless(f64::from(*count))
                })
                .sum::<Money>()
                * facilities
        } else {
            Money(0.0)
        };

        let mut costs = CostBreakdown {
            purchase,
            construction,
            subscription,
            ..CostBreakdown::default()
        };
        let mut usage = UsageTotals::default();
        if let Some(draw) = &self.power_draw {
            let operating_hours = ctx.usage.unwrap_or_default() * facilities;
            let energy = draw.rated_power * operating_hours;
            let charges = ctx.prices.charges_for(energy);
            costs.energy = charges.energy;
            costs.emissions = charges.emissions_cost;
            costs.opex_subsidies = charges.rebate;
            let peak_power = if operating_hours > Hours(0.0) {
                draw.rated_power * facilities
            } else {
                Power(0.0)
            };
            usage = UsageTotals {
                operating_hours,
                energy,
                emissions: charges.emissions,
                peak_power,
                ..UsageTotals::default()
            };
        }

        PeriodCosts { costs, usage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, energy_prices, infra, monthly_timeline};
    use crate::prices::EnergyPrices;
    use crate::schedule::Instalment;
    use crate::timeline::PeriodLength;
    use crate::units::Energy;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn context(prices: &EnergyPrices, period: u32, usage: Option<f64>) -> PeriodContext<'_> {
        PeriodContext {
            period,
            period_length: PeriodLength::Month,
            year: 2022,
            usage: usage.map(Hours),
            cumulative_usage: Hours(0.0),
            prices,
        }
    }

    #[rstest]
    fn test_capital_costs(infra: InfraCell) {
        assert_eq!(infra.construction_cost(), Money(210_000.0));
        assert_eq!(infra.equipment_cost(), Money(400_000.0));
    }

    #[rstest]
    fn test_construction_cost_other_type(infra: InfraCell) {
        let infra = InfraCell {
            infra_type: InfraType::Other,
            ..infra
        };
        assert_eq!(infra.construction_cost(), Money(0.0));
    }

    #[rstest]
    fn test_period_costs(infra: InfraCell, energy_prices: EnergyPrices) {
        let first = infra.period_costs(&context(&energy_prices, 0, None)).costs;
        assert_eq!(first.construction, Money(105_000.0));
        assert_eq!(first.purchase, Money(400_000.0));
        assert_eq!(first.subscription, Money(1000.0));
        assert_eq!(first.energy, Money(0.0));

        let second = infra.period_costs(&context(&energy_prices, 1, None)).costs;
        assert_eq!(second.construction, Money(105_000.0));
        assert_eq!(second.purchase, Money(0.0));

        let later = infra.period_costs(&context(&energy_prices, 20, None)).costs;
        assert_eq!(later.total(), Money(1000.0));
    }

    #[rstest]
    fn test_period_costs_power_draw(infra: InfraCell, energy_prices: EnergyPrices) {
        let infra = InfraCell {
            power_draw: Some(InfraPowerDraw {
                rated_power: Power(20.0),
                operating_hours: vec![Hours(100.0); 36],
            }),
            baas_subscription: false,
            ..infra
        };
        let result = infra.period_costs(&context(&energy_prices, 5, Some(100.0)));
        assert_eq!(result.usage.energy, Energy(2000.0));
        assert_approx_eq!(Money, result.costs.energy, Money(100.0), epsilon = 1e-9);
        assert_approx_eq!(Money, result.costs.opex_subsidies, Money(-20.0), epsilon = 1e-9);
        assert_eq!(result.costs.subscription, Money(0.0));
        assert_eq!(result.usage.peak_power, Power(20.0));

        // No draw in an idle period
        let idle = infra.period_costs(&context(&energy_prices, 6, Some(0.0)));
        assert_eq!(idle.usage.peak_power, Power(0.0));
    }

    #[rstest]
    fn test_validate(monthly_timeline: Timeline, infra: InfraCell) {
        assert!(infra.validate_parameters(&monthly_timeline).is_ok());
    }

    #[rstest]
    fn test_validate_missing_facility(monthly_timeline: Timeline, infra: InfraCell) {
        let infra = InfraCell {
            facility: None,
            ..infra
        };
        assert_error!(
            infra.validate_parameters(&monthly_timeline),
            "Charging stations require facility parameters"
        );
    }

    #[rstest]
    fn test_validate_incomplete_schedule(monthly_timeline: Timeline, infra: InfraCell) {
        let infra = InfraCell {
            construction: Instalments::new(vec![Instalment::new(0, 0.5)]),
            ..infra
        };
        assert_error!(
            infra.validate_parameters(&monthly_timeline),
            "Construction instalment fractions must sum to one (got 0.5)"
        );
    }
}
