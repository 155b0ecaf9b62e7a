//! Fixtures for tests

use crate::cell::{
    Cell, CellInfo, DigitalSolutionsCell, EvseModel, FacilityParameters, FleetCell, InfraCell,
    InfraType, Powertrain, VehicleModel, WorkforceCell,
};
use crate::maintenance::MaintenanceSchedule;
use crate::prices::EnergyPrices;
use crate::schedule::{Instalment, Instalments, PurchasePolicy, Rate};
use crate::timeline::{ActiveWindow, PeriodLength, Timeline};
use crate::units::{
    Dimensionless, EmissionsPerEnergy, Energy, Hours, Length, Money, MoneyPerEmissions,
    MoneyPerEnergy, MoneyPerLength, MoneyPerPower, Power,
};
use chrono::NaiveDate;
use rstest::fixture;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Shorthand for creating a date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[fixture]
pub fn monthly_timeline() -> Timeline {
    Timeline::new(date(2022, 1, 1), PeriodLength::Month, 36).unwrap()
}

#[fixture]
pub fn energy_prices() -> EnergyPrices {
    EnergyPrices {
        energy_price: MoneyPerEnergy(0.05),
        demand_charge: Some(MoneyPerPower(10.0)),
        grid_emissions_factor: EmissionsPerEnergy(0.7),
        carbon_price: MoneyPerEmissions(0.05),
        energy_rebate: MoneyPerEnergy(0.01),
    }
}

#[fixture]
pub fn maintenance_schedule() -> MaintenanceSchedule {
    MaintenanceSchedule::new(
        vec![Hours(2500.0), Hours(5000.0), Hours(7500.0), Hours(10_000.0)],
        vec![
            Money(10_000.0),
            Money(20_000.0),
            Money(25_000.0),
            Money(30_000.0),
        ],
    )
    .unwrap()
}

#[fixture]
pub fn evse_model() -> EvseModel {
    EvseModel {
        model: "fast charger".into(),
        double: false,
        cooling_power: Power(10.0),
        efficiency: Dimensionless(0.9),
        power_factor: Dimensionless(0.9),
        baas_rate: Rate::monthly(Money(500.0)),
        unit_price: Money(200_000.0),
    }
}

#[fixture]
pub fn vehicle_model(maintenance_schedule: MaintenanceSchedule) -> VehicleModel {
    VehicleModel {
        model: "LHD-14".into(),
        make: "Acme".into(),
        vehicle_type: "loader".into(),
        powertrain: Powertrain::Bev,
        battery_capacity: Energy(300.0),
        usable_battery_capacity: Energy(250.0),
        energy_consumption: Power(50.0),
        charging_time: None,
        charging_power: Power(250.0),
        evse_model: Some("fast charger".into()),
        baas_rate: Rate::monthly(Money(1000.0)),
        unit_price: Money(1_500_000.0),
        maintenance: maintenance_schedule,
    }
}

/// Two vehicles working 400 hours a month for three years
#[fixture]
pub fn fleet(vehicle_model: VehicleModel, evse_model: EvseModel) -> FleetCell {
    FleetCell {
        info: CellInfo::new("lhd_fleet", ActiveWindow::new(0, 36), 2),
        vehicle: Arc::new(vehicle_model),
        evse: Some(Arc::new(evse_model)),
        purchase: PurchasePolicy::Upfront,
        subsidies: Instalments::new(vec![Instalment::new(1, 0.1)]),
        operating_hours: vec![Hours(400.0); 36],
    }
}

#[fixture]
pub fn fleet_cell(fleet: FleetCell) -> Cell {
    Cell::Fleet(fleet)
}

#[fixture]
pub fn infra(evse_model: EvseModel) -> InfraCell {
    InfraCell {
        info: CellInfo::new("charging_bay", ActiveWindow::new(0, 36), 1),
        infra_type: InfraType::ChargingStation,
        facility: Some(Arc::new(FacilityParameters {
            name: "battery bay".into(),
            development_cost: Money(100_000.0),
            cable_pull_cost: MoneyPerLength(50.0),
        })),
        batteries: 4,
        cable_length: Length(200.0),
        evse_stock: vec![(Arc::new(evse_model), 2)],
        construction: Instalments::new(vec![Instalment::new(0, 0.5), Instalment::new(1, 0.5)]),
        equipment: Instalments::new(vec![Instalment::new(0, 1.0)]),
        baas_subscription: true,
        power_draw: None,
    }
}

#[fixture]
pub fn infra_cell(infra: InfraCell) -> Cell {
    Cell::Infra(infra)
}

/// Ten workers at 80,000 a year
#[fixture]
pub fn workforce() -> WorkforceCell {
    WorkforceCell {
        info: CellInfo::new("operators", ActiveWindow::new(0, 36), 10),
        role: "operator".into(),
        rate: Rate::annual(Money(80_000.0)),
        headcount_plan: BTreeMap::new(),
    }
}

#[fixture]
pub fn workforce_cell(workforce: WorkforceCell) -> Cell {
    Cell::Workforce(workforce)
}

#[fixture]
pub fn digital_solution() -> DigitalSolutionsCell {
    DigitalSolutionsCell {
        info: CellInfo::new("fleet_management", ActiveWindow::new(0, 36), 2),
        solution: "FleetView".into(),
        solution_type: "fleet management".into(),
        unit_price: Money(25_000.0),
        subscription: Rate::monthly(Money(1000.0)),
        commissioning: Instalments::new(vec![Instalment::new(0, 1.0)]),
        subscription_schedule: None,
    }
}

#[fixture]
pub fn digital_cell(digital_solution: DigitalSolutionsCell) -> Cell {
    Cell::DigitalSolutions(digital_solution)
}
