//! Code for reading the equipment catalogue.
use super::{input_err_msg, read_toml};
use crate::cell::{EvseModel, FacilityParameters, Powertrain, VehicleModel};
use crate::maintenance::MaintenanceSchedule;
use crate::schedule::Rate;
use crate::units::{Dimensionless, Energy, Hours, Money, MoneyPerLength, Power};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const EQUIPMENT_FILE_NAME: &str = "equipment.toml";

/// A maintenance schedule as written in the catalogue.
///
/// Costs are given either as a single `costs` list or as several named `components`, which are
/// summed.
#[derive(PartialEq, Debug, Deserialize)]
struct MaintenanceRaw {
    thresholds: Vec<Hours>,
    #[serde(default)]
    costs: Option<Vec<Money>>,
    #[serde(default)]
    components: IndexMap<String, Vec<Money>>,
}

impl MaintenanceRaw {
    fn into_schedule(self) -> Result<MaintenanceSchedule> {
        match (self.costs, self.components.is_empty()) {
            (Some(costs), true) => MaintenanceSchedule::new(self.thresholds, costs),
            (None, false) => {
                MaintenanceSchedule::from_components(self.thresholds, &self.components)
            }
            _ => bail!("Maintenance schedule must have exactly one of costs or components"),
        }
    }
}

#[derive(PartialEq, Debug, Deserialize)]
struct VehicleModelRaw {
    model: String,
    make: String,
    vehicle_type: String,
    powertrain: Powertrain,
    battery_capacity: Energy,
    usable_battery_capacity: Energy,
    energy_consumption: Power,
    #[serde(default)]
    charging_time: Option<Hours>,
    charging_power: Power,
    #[serde(default)]
    evse_model: Option<String>,
    #[serde(default)]
    baas_rate: Rate,
    unit_price: Money,
    maintenance: MaintenanceRaw,
}

impl VehicleModelRaw {
    fn into_vehicle_model(self) -> Result<VehicleModel> {
        let maintenance = self.maintenance.into_schedule().with_context(|| {
            format!("Invalid maintenance schedule for vehicle model '{}'", self.model)
        })?;

        Ok(VehicleModel {
            model: self.model,
            make: self.make,
            vehicle_type: self.vehicle_type,
            powertrain: self.powertrain,
            battery_capacity: self.battery_capacity,
            usable_battery_capacity: self.usable_battery_capacity,
            energy_consumption: self.energy_consumption,
            charging_time: self.charging_time,
            charging_power: self.charging_power,
            evse_model: self.evse_model,
            baas_rate: self.baas_rate,
            unit_price: self.unit_price,
            maintenance,
        })
    }
}

fn default_efficiency() -> Dimensionless {
    Dimensionless(1.0)
}

#[derive(PartialEq, Debug, Deserialize)]
struct EvseModelRaw {
    model: String,
    #[serde(default)]
    double: bool,
    #[serde(default)]
    cooling_power: Power,
    #[serde(default = "default_efficiency")]
    efficiency: Dimensionless,
    #[serde(default = "default_efficiency")]
    power_factor: Dimensionless,
    #[serde(default)]
    baas_rate: Rate,
    unit_price: Money,
}

impl EvseModelRaw {
    fn into_evse_model(self) -> Result<EvseModel> {
        let evse = EvseModel {
            model: self.model,
            double: self.double,
            cooling_power: self.cooling_power,
            efficiency: self.efficiency,
            power_factor: self.power_factor,
            baas_rate: self.baas_rate,
            unit_price: self.unit_price,
        };
        evse.validate()?;

        Ok(evse)
    }
}

#[derive(PartialEq, Debug, Deserialize)]
struct FacilityRaw {
    name: String,
    development_cost: Money,
    #[serde(default)]
    cable_pull_cost: MoneyPerLength,
}

/// A digital solution, as listed in the catalogue
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct DigitalSolution {
    /// Name of the solution
    pub solution: String,
    /// Kind of solution (e.g. fleet management)
    pub solution_type: String,
    /// Commissioning cost per licence
    pub unit_price: Money,
    /// Subscription cost per licence
    #[serde(default)]
    pub subscription: Rate,
}

/// The contents of `equipment.toml`
#[derive(PartialEq, Debug, Deserialize)]
struct EquipmentFile {
    #[serde(default)]
    vehicles: Vec<VehicleModelRaw>,
    #[serde(default)]
    support_equipment: Vec<EvseModelRaw>,
    #[serde(default)]
    facilities: Vec<FacilityRaw>,
    #[serde(default)]
    digital_solutions: Vec<DigitalSolution>,
}

/// The equipment available to an analysis, keyed by name
#[derive(PartialEq, Debug, Default)]
pub struct Equipment {
    /// Vehicle models
    pub vehicles: IndexMap<String, Arc<VehicleModel>>,
    /// Chargers (electric vehicle supply equipment)
    pub evse: IndexMap<String, Arc<EvseModel>>,
    /// Types of infrastructure facility
    pub facilities: IndexMap<String, Arc<FacilityParameters>>,
    /// Digital solutions
    pub digital_solutions: IndexMap<String, DigitalSolution>,
}

/// Collect named items into a map, checking for duplicate names
fn into_name_map<T, I>(iter: I, what: &str) -> Result<IndexMap<String, T>>
where
    I: IntoIterator<Item = (String, T)>,
{
    let mut map = IndexMap::new();
    for (name, item) in iter {
        ensure!(!map.contains_key(&name), "Duplicate {what} found: {name}");
        map.insert(name, item);
    }

    Ok(map)
}

impl EquipmentFile {
    fn into_equipment(self) -> Result<Equipment> {
        let vehicles = self
            .vehicles
            .into_iter()
            .map(|raw| -> Result<_> {
                let vehicle = raw.into_vehicle_model()?;
                Ok((vehicle.model.clone(), Arc::new(vehicle)))
            })
            .collect::<Result<Vec<_>>>()?;
        let evse = self
            .support_equipment
            .into_iter()
            .map(|raw| -> Result<_> {
                let evse = raw.into_evse_model()?;
                Ok((evse.model.clone(), Arc::new(evse)))
            })
            .collect::<Result<Vec<_>>>()?;
        let facilities = self.facilities.into_iter().map(|raw| {
            let facility = FacilityParameters {
                name: raw.name,
                development_cost: raw.development_cost,
                cable_pull_cost: raw.cable_pull_cost,
            };
            (facility.name.clone(), Arc::new(facility))
        });
        let digital_solutions = self
            .digital_solutions
            .into_iter()
            .map(|solution| (solution.solution.clone(), solution));

        Ok(Equipment {
            vehicles: into_name_map(vehicles, "vehicle model")?,
            evse: into_name_map(evse, "EVSE model")?,
            facilities: into_name_map(facilities, "facility")?,
            digital_solutions: into_name_map(digital_solutions, "digital solution")?,
        })
    }
}

/// Read the equipment catalogue from the specified directory.
///
/// # Arguments
///
/// * `analysis_dir` - Folder containing `equipment.toml`
pub fn read_equipment(analysis_dir: &Path) -> Result<Equipment> {
    let file_path = analysis_dir.join(EQUIPMENT_FILE_NAME);
    let file: EquipmentFile = read_toml(&file_path)?;
    file.into_equipment()
        .with_context(|| input_err_msg(&file_path))
}
