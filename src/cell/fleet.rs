//! Fleets of battery-electric vehicles.
use super::{CellCategory, CellInfo, CostCell, PeriodContext, PeriodCosts};
use crate::cost::{CostBreakdown, UsageTotals};
use crate::maintenance::MaintenanceSchedule;
use crate::schedule::{Instalments, PurchasePolicy, Rate};
use crate::timeline::Timeline;
use crate::units::{Dimensionless, Energy, Hours, Money, Power};
use anyhow::{Result, ensure};
use log::warn;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::sync::Arc;
use strum::Display;

/// The fraction of a charger's rated power assumed to be drawn at peak by each vehicle charging
const PEAK_CHARGING_FRACTION: f64 = 0.25;

/// The powertrain of a vehicle
#[derive(PartialEq, Eq, Clone, Copy, Debug, Display, DeserializeLabeledStringEnum)]
pub enum Powertrain {
    /// Battery-electric
    #[string = "BEV"]
    #[strum(serialize = "BEV")]
    Bev,
    /// Diesel
    #[string = "diesel"]
    #[strum(serialize = "diesel")]
    Diesel,
    /// Diesel-electric hybrid
    #[string = "hybrid"]
    #[strum(serialize = "hybrid")]
    Hybrid,
    /// Hydrogen fuel cell
    #[string = "fuel cell"]
    #[strum(serialize = "fuel cell")]
    FuelCell,
}

/// A model of vehicle, as listed in the equipment catalogue
#[derive(PartialEq, Debug, Clone)]
pub struct VehicleModel {
    /// Model name or number
    pub model: String,
    /// Manufacturer
    pub make: String,
    /// Kind of vehicle (e.g. loader, truck)
    pub vehicle_type: String,
    /// Powertrain of the vehicle
    pub powertrain: Powertrain,
    /// Nominal battery capacity
    pub battery_capacity: Energy,
    /// The part of the battery capacity which can be used
    pub usable_battery_capacity: Energy,
    /// Average power drawn while operating
    pub energy_consumption: Power,
    /// Time taken to fully charge the usable capacity.
    ///
    /// If not given, this is the usable capacity divided by the charging power.
    pub charging_time: Option<Hours>,
    /// Power drawn while charging
    pub charging_power: Power,
    /// The model of charger used by the vehicle
    pub evse_model: Option<String>,
    /// Battery-as-a-service rate per vehicle
    pub baas_rate: Rate,
    /// Purchase price of one vehicle
    pub unit_price: Money,
    /// Maintenance costs by cumulative operating hours
    pub maintenance: MaintenanceSchedule,
}

impl VehicleModel {
    /// The time taken to charge the usable battery capacity from empty
    pub fn full_charge_time(&self) -> Hours {
        self.charging_time
            .unwrap_or(self.usable_battery_capacity / self.charging_power)
    }

    /// The time needed to recharge the energy used over `hours` of operation
    pub fn charging_time_for(&self, hours: Hours) -> Hours {
        let charges = (self.energy_consumption * hours) / self.usable_battery_capacity;
        self.full_charge_time() * charges
    }

    /// Check the vehicle parameters are physically consistent
    fn validate(&self) -> Result<()> {
        ensure!(
            self.powertrain == Powertrain::Bev,
            "Only battery-electric vehicles are supported (vehicle model '{}' has a {} powertrain)",
            self.model,
            self.powertrain
        );
        ensure!(
            self.usable_battery_capacity > Energy(0.0)
                && self.usable_battery_capacity <= self.battery_capacity,
            "Usable battery capacity of vehicle model '{}' must be positive and no more than the \
             battery capacity",
            self.model
        );
        ensure!(
            self.charging_power > Power(0.0),
            "Charging power of vehicle model '{}' must be positive",
            self.model
        );
        ensure!(
            self.energy_consumption.is_finite() && self.energy_consumption >= Power(0.0),
            "Energy consumption of vehicle model '{}' must be finite and non-negative",
            self.model
        );
        if let Some(charging_time) = self.charging_time {
            ensure!(
                charging_time.is_finite() && charging_time > Hours(0.0),
                "Charging time of vehicle model '{}' must be positive",
                self.model
            );
        }
        self.baas_rate.validate("Vehicle BaaS rate")?;
        ensure!(
            self.unit_price.is_finite() && self.unit_price >= Money(0.0),
            "Unit price of vehicle model '{}' must be finite and non-negative",
            self.model
        );

        Ok(())
    }
}

/// A model of electric vehicle supply equipment (charger)
#[derive(PartialEq, Debug, Clone)]
pub struct EvseModel {
    /// Model name or number
    pub model: String,
    /// Whether the charger has two outlets
    pub double: bool,
    /// Power drawn by the cooling equipment
    pub cooling_power: Power,
    /// Energy conversion efficiency
    pub efficiency: Dimensionless,
    /// Power factor
    pub power_factor: Dimensionless,
    /// Battery-as-a-service rate per charger
    pub baas_rate: Rate,
    /// Purchase price of one charger
    pub unit_price: Money,
}

impl EvseModel {
    /// The peak apparent power drawn when charging `vehicles` vehicles
    pub fn peak_power(&self, vehicles: Dimensionless, charging_power: Power) -> Power {
        let (multiplier, coolers) = if self.double {
            (2.0, vehicles.value().ceil())
        } else {
            (1.0, (vehicles.value() / 2.0).ceil())
        };
        let charging =
            charging_power * (vehicles * Dimensionless(multiplier * PEAK_CHARGING_FRACTION));
        let cooling = self.cooling_power * Dimensionless(coolers);

        (charging + cooling) / (self.efficiency * self.power_factor)
    }

    /// Check the charger parameters are physically consistent
    pub fn validate(&self) -> Result<()> {
        let in_unit_range = |value: Dimensionless| value.value() > 0.0 && value.value() <= 1.0;
        ensure!(
            in_unit_range(self.efficiency),
            "Efficiency of EVSE model '{}' must be in the range (0, 1]",
            self.model
        );
        ensure!(
            in_unit_range(self.power_factor),
            "Power factor of EVSE model '{}' must be in the range (0, 1]",
            self.model
        );
        ensure!(
            self.cooling_power.is_finite() && self.cooling_power >= Power(0.0),
            "Cooling power of EVSE model '{}' must be finite and non-negative",
            self.model
        );
        self.baas_rate.validate("Charger BaaS rate")?;
        ensure!(
            self.unit_price.is_finite() && self.unit_price >= Money(0.0),
            "Unit price of EVSE model '{}' must be finite and non-negative",
            self.model
        );

        Ok(())
    }
}

/// A fleet of identical vehicles
#[derive(PartialEq, Debug, Clone)]
pub struct FleetCell {
    /// Common cell properties. The quantity is the number of vehicles.
    pub info: CellInfo,
    /// The model of vehicle making up the fleet
    pub vehicle: Arc<VehicleModel>,
    /// The charger used by the vehicles, if any
    pub evse: Option<Arc<EvseModel>>,
    /// How the purchase of the vehicles is paid for
    pub purchase: PurchasePolicy,
    /// Subsidies on the purchase, as fractions of the purchase cost
    pub subsidies: Instalments,
    /// Operating hours per vehicle for each active period
    pub operating_hours: Vec<Hours>,
}

impl FleetCell {
    /// Check that each vehicle has time to recharge in every period
    fn check_charging(&self, timeline: &Timeline) -> Result<()> {
        for (period, &hours) in self.info.window.periods().zip(&self.operating_hours) {
            let available = timeline.hours_in(period);
            ensure!(
                hours <= available,
                "Operating hours ({hours}) in period {period} exceed the hours in the period \
                 ({available})"
            );

            let required = self.vehicle.charging_time_for(hours);
            let idle = available - hours;
            ensure!(
                required <= idle,
                "Charging time required in period {period} ({required} hours) exceeds the time \
                 vehicles are idle ({idle} hours)"
            );
        }

        Ok(())
    }
}

impl CostCell for FleetCell {
    fn info(&self) -> &CellInfo {
        &self.info
    }

    fn category(&self) -> CellCategory {
        CellCategory::Fleet
    }

    fn usage(&self) -> Option<&[Hours]> {
        Some(&self.operating_hours)
    }

    fn validate_parameters(&self, timeline: &Timeline) -> Result<()> {
        self.vehicle.validate()?;
        if let Some(evse) = &self.evse {
            evse.validate()?;
            if let Some(linked) = &self.vehicle.evse_model {
                ensure!(
                    *linked == evse.model,
                    "Vehicle model '{}' is linked to EVSE model '{linked}', not '{}'",
                    self.vehicle.model,
                    evse.model
                );
            }
        }
        self.purchase.validate(&self.info.window, "Purchase")?;
        self.subsidies.validate(&self.info.window, "Subsidy")?;
        self.check_charging(timeline)?;

        if !self.info.window.is_empty() && self.operating_hours.iter().all(|h| *h == Hours(0.0)) {
            warn!(
                "Fleet cell '{}' has no operating hours in any period",
                self.info.id
            );
        }

        Ok(())
    }

    fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts {
        let vehicles = self.info.scale();
        let hours = ctx.usage.unwrap_or_default();

        // Vehicles only draw on chargers and subscriptions in periods when they operate
        let active = if hours > Hours(0.0) {
            vehicles
        } else {
            Dimensionless(0.0)
        };

        let operating_hours = hours * vehicles;
        let energy = self.vehicle.energy_consumption * operating_hours;
        let charges = ctx.prices.charges_for(energy);

        let (peak_power, power, charger_rate) = match &self.evse {
            Some(evse) => {
                let peak_power = evse.peak_power(active, self.vehicle.charging_power);
                (
                    peak_power,
                    ctx.prices.demand_charge_for(peak_power, ctx.period_length),
                    evse.baas_rate.per_period(ctx.period_length),
                )
            }
            None => (Power(0.0), Money(0.0), Money(0.0)),
        };
        let vehicle_rate = self.vehicle.baas_rate.per_period(ctx.period_length);

        let maintenance = self
            .vehicle
            .maintenance
            .cost_between(ctx.cumulative_usage - hours, ctx.cumulative_usage)
            * vehicles;

        let fleet_price = self.vehicle.unit_price * vehicles;
        let purchase = fleet_price * self.purchase.fraction_at(&self.info.window, ctx.period);
        let capex_subsidies = -(fleet_price * self.subsidies.fraction_at(ctx.period));

        PeriodCosts {
            costs: CostBreakdown {
                purchase,
                capex_subsidies,
                energy: charges.energy,
                power,
                subscription: active * (vehicle_rate + charger_rate),
                maintenance,
                emissions: charges.emissions_cost,
                opex_subsidies: charges.rebate,
                ..CostBreakdown::default()
            },
            usage: UsageTotals {
                operating_hours,
                energy,
                emissions: charges.emissions,
                peak_power,
                ..UsageTotals::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::fixture::{assert_error, energy_prices, evse_model, fleet, monthly_timeline};
    use crate::prices::EnergyPrices;
    use crate::timeline::PeriodLength;
    use crate::units::Emissions;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn context(
        prices: &EnergyPrices,
        period: u32,
        hours: f64,
        cumulative: f64,
    ) -> PeriodContext<'_> {
        PeriodContext {
            period,
            period_length: PeriodLength::Month,
            year: 2022,
            usage: Some(Hours(hours)),
            cumulative_usage: Hours(cumulative),
            prices,
        }
    }

    #[rstest]
    #[case(false, 3.0, (75.0 + 20.0) / 0.81)]
    #[case(true, 3.0, (150.0 + 30.0) / 0.81)]
    #[case(false, 0.0, 0.0)]
    fn test_peak_power(
        evse_model: EvseModel,
        #[case] double: bool,
        #[case] vehicles: f64,
        #[case] expected: f64,
    ) {
        let evse = EvseModel { double, ..evse_model };
        assert_approx_eq!(
            Power,
            evse.peak_power(Dimensionless(vehicles), Power(100.0)),
            Power(expected)
        );
    }

    #[rstest]
    fn test_full_charge_time(fleet: FleetCell) {
        assert_eq!(fleet.vehicle.full_charge_time(), Hours(1.0));
        let mut vehicle = (*fleet.vehicle).clone();
        vehicle.charging_time = Some(Hours(2.0));
        assert_eq!(vehicle.full_charge_time(), Hours(2.0));
        // 400 hours at 50 kW uses 80 full charges of 250 kWh
        assert_approx_eq!(Hours, vehicle.charging_time_for(Hours(400.0)), Hours(160.0));
    }

    #[rstest]
    fn test_period_costs_first_period(fleet: FleetCell, energy_prices: EnergyPrices) {
        let result = fleet.period_costs(&context(&energy_prices, 0, 400.0, 400.0));
        let costs = result.costs;
        assert_approx_eq!(Money, costs.purchase, Money(3_000_000.0), epsilon = 1e-6);
        assert_eq!(costs.capex_subsidies, Money(0.0));
        assert_approx_eq!(Money, costs.energy, Money(2000.0), epsilon = 1e-6);
        assert_approx_eq!(Money, costs.power, Money(135.0 / 0.81 * 10.0), epsilon = 1e-6);
        assert_approx_eq!(Money, costs.subscription, Money(3000.0), epsilon = 1e-6);
        assert_approx_eq!(Money, costs.maintenance, Money(3200.0), epsilon = 1e-6);
        assert_approx_eq!(Money, costs.emissions, Money(1400.0), epsilon = 1e-6);
        assert_approx_eq!(Money, costs.opex_subsidies, Money(-400.0), epsilon = 1e-6);
        assert_eq!(costs.labour, Money(0.0));
        assert_eq!(costs.construction, Money(0.0));

        assert_eq!(result.usage.operating_hours, Hours(800.0));
        assert_eq!(result.usage.energy, Energy(40_000.0));
        assert_approx_eq!(Emissions, result.usage.emissions, Emissions(28_000.0));
        assert_approx_eq!(Power, result.usage.peak_power, Power(135.0 / 0.81), epsilon = 1e-9);
        assert_eq!(result.usage.headcount, Dimensionless(0.0));
    }

    #[rstest]
    fn test_period_costs_later_period(fleet: FleetCell, energy_prices: EnergyPrices) {
        let costs = fleet
            .period_costs(&context(&energy_prices, 1, 400.0, 6000.0))
            .costs;
        assert_eq!(costs.purchase, Money(0.0));
        assert_approx_eq!(Money, costs.capex_subsidies, Money(-300_000.0), epsilon = 1e-6);
        // 25000 over the 5000..7500 interval
        assert_approx_eq!(Money, costs.maintenance, Money(10.0 * 800.0), epsilon = 1e-6);
    }

    #[rstest]
    fn test_period_costs_maintenance_crosses_threshold(
        fleet: FleetCell,
        energy_prices: EnergyPrices,
    ) {
        // Each vehicle runs 2400..2800 hours, 100 in the first interval and 300 in the second
        let costs = fleet
            .period_costs(&context(&energy_prices, 6, 400.0, 2800.0))
            .costs;
        assert_approx_eq!(
            Money,
            costs.maintenance,
            Money(2.0 * (100.0 * 4.0 + 300.0 * 8.0)),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_period_costs_idle(fleet: FleetCell, energy_prices: EnergyPrices) {
        let costs = fleet
            .period_costs(&context(&energy_prices, 2, 0.0, 800.0))
            .costs;
        assert_eq!(costs.energy, Money(0.0));
        assert_eq!(costs.power, Money(0.0));
        assert_eq!(costs.subscription, Money(0.0));
        assert_eq!(costs.maintenance, Money(0.0));
    }

    #[rstest]
    fn test_validate_charging(monthly_timeline: Timeline, fleet: FleetCell) {
        let mut fleet = fleet;
        fleet.operating_hours[1] = Hours(700.0); // February has 672 hours
        assert_eq!(
            Cell::Fleet(fleet.clone())
                .validate(&monthly_timeline)
                .unwrap_err()
                .root_cause()
                .to_string(),
            "Operating hours (700) in period 1 exceed the hours in the period (672)"
        );

        // 650 hours in January needs 130 hours of charging, leaving only 94 idle
        fleet.operating_hours[1] = Hours(400.0);
        fleet.operating_hours[0] = Hours(650.0);
        assert_error!(
            fleet.validate_parameters(&monthly_timeline),
            "Charging time required in period 0 (130 hours) exceeds the time vehicles are idle \
             (94 hours)"
        );
        fleet.operating_hours[0] = Hours(600.0);
        assert!(fleet.validate_parameters(&monthly_timeline).is_ok());
    }

    #[rstest]
    fn test_validate_not_bev(monthly_timeline: Timeline, fleet: FleetCell) {
        let mut vehicle = (*fleet.vehicle).clone();
        vehicle.powertrain = Powertrain::Diesel;
        let fleet = FleetCell {
            vehicle: Arc::new(vehicle),
            ..fleet
        };
        assert_error!(
            fleet.validate_parameters(&monthly_timeline),
            "Only battery-electric vehicles are supported (vehicle model 'LHD-14' has a diesel \
             powertrain)"
        );
    }

    #[rstest]
    fn test_validate_usable_capacity(monthly_timeline: Timeline, fleet: FleetCell) {
        let mut vehicle = (*fleet.vehicle).clone();
        vehicle.usable_battery_capacity = Energy(400.0);
        let fleet = FleetCell {
            vehicle: Arc::new(vehicle),
            ..fleet
        };
        assert_error!(
            fleet.validate_parameters(&monthly_timeline),
            "Usable battery capacity of vehicle model 'LHD-14' must be positive and no more than \
             the battery capacity"
        );
    }

    #[rstest]
    fn test_validate_evse_mismatch(
        monthly_timeline: Timeline,
        fleet: FleetCell,
        evse_model: EvseModel,
    ) {
        let evse = EvseModel {
            model: "slow charger".into(),
            ..evse_model
        };
        let fleet = FleetCell {
            evse: Some(Arc::new(evse)),
            ..fleet
        };
        assert_error!(
            fleet.validate_parameters(&monthly_timeline),
            "Vehicle model 'LHD-14' is linked to EVSE model 'fast charger', not 'slow charger'"
        );
    }
}
