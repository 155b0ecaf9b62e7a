//! Energy prices, emissions factors and related business parameters shared by every cell.
use crate::timeline::PeriodLength;
use crate::units::{
    Dimensionless, Emissions, EmissionsPerEnergy, Energy, Money, MoneyPerEmissions,
    MoneyPerEnergy, MoneyPerPower, Power,
};
use anyhow::{Result, ensure};
use serde::Deserialize;

/// Prices and factors used to cost energy use
#[derive(PartialEq, Debug, Clone, Default, Deserialize)]
pub struct EnergyPrices {
    /// Cost of energy, per kWh
    pub energy_price: MoneyPerEnergy,
    /// Monthly demand charge, per kVA of peak charger draw.
    ///
    /// If not given, no demand charges are applied.
    #[serde(default)]
    pub demand_charge: Option<MoneyPerPower>,
    /// Greenhouse gas emissions from grid electricity, in kg CO2e per kWh
    #[serde(default)]
    pub grid_emissions_factor: EmissionsPerEnergy,
    /// Price charged on emissions, per kg CO2e
    #[serde(default)]
    pub carbon_price: MoneyPerEmissions,
    /// Low-carbon energy rebate, per kWh
    #[serde(default)]
    pub energy_rebate: MoneyPerEnergy,
}

/// The energy-related costs arising from consuming energy
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct EnergyCharges {
    /// Cost of the energy itself
    pub energy: Money,
    /// Emissions from generating the energy
    pub emissions: Emissions,
    /// Cost of the emissions
    pub emissions_cost: Money,
    /// Rebate on the energy (non-positive)
    pub rebate: Money,
}

impl EnergyPrices {
    /// Check that all prices are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let check = |value: f64, name: &str| -> Result<()> {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a finite, non-negative number (got {value})"
            );
            Ok(())
        };
        check(self.energy_price.value(), "energy_price")?;
        if let Some(demand_charge) = self.demand_charge {
            check(demand_charge.value(), "demand_charge")?;
        }
        check(self.grid_emissions_factor.value(), "grid_emissions_factor")?;
        check(self.carbon_price.value(), "carbon_price")?;
        check(self.energy_rebate.value(), "energy_rebate")?;

        Ok(())
    }

    /// The charges arising from consuming `energy`
    pub fn charges_for(&self, energy: Energy) -> EnergyCharges {
        let emissions = self.grid_emissions_factor * energy;
        EnergyCharges {
            energy: self.energy_price * energy,
            emissions,
            emissions_cost: self.carbon_price * emissions,
            rebate: -(self.energy_rebate * energy),
        }
    }

    /// The demand charge for one period given the peak power draw, if a demand charge is set
    pub fn demand_charge_for(&self, peak: Power, period_length: PeriodLength) -> Money {
        self.demand_charge.map_or(Money(0.0), |charge| {
            charge * peak * Dimensionless(f64::from(period_length.months()))
        })
    }
}
