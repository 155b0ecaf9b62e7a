//! Code for reading cost cells from `analysis.toml`.
//!
//! Cells refer to catalogue entries by name and use dates rather than period indices, which are
//! converted using the analysis timeline.
use super::equipment::Equipment;
use super::{input_err_msg, read_csv};
use crate::cell::{
    Cell, CellID, CellInfo, DigitalSolutionsCell, FleetCell, InfraCell, InfraPowerDraw,
    InfraType, WorkforceCell,
};
use crate::schedule::{Instalment, Instalments, PurchasePolicy, Rate};
use crate::timeline::{ActiveWindow, Timeline};
use crate::units::{Hours, Length, Power};
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A payment on a given date, as a fraction of the total
#[derive(PartialEq, Debug, Deserialize)]
struct DatedInstalment {
    date: NaiveDate,
    fraction: f64,
}

/// Convert dated instalments into an instalment schedule
fn into_instalments(timeline: &Timeline, dated: &[DatedInstalment]) -> Result<Instalments> {
    dated
        .iter()
        .map(|instalment| -> Result<_> {
            let period = timeline.period_of(instalment.date)?;
            Ok(Instalment::new(period, instalment.fraction))
        })
        .collect::<Result<Vec<_>>>()
        .map(Instalments::new)
}

/// Convert dated instalments into a schedule, defaulting to a single payment at the window start
fn into_instalments_or_upfront(
    timeline: &Timeline,
    window: &ActiveWindow,
    dated: Option<&[DatedInstalment]>,
) -> Result<Instalments> {
    match dated {
        Some(dated) => into_instalments(timeline, dated),
        None if window.is_empty() => Ok(Instalments::default()),
        None => Ok(Instalments::new(vec![Instalment::new(window.start, 1.0)])),
    }
}

/// Properties shared by every kind of cell
#[derive(PartialEq, Debug, Deserialize)]
struct CellInfoRaw {
    id: CellID,
    #[serde(default)]
    location: Option<String>,
    quantity: u32,
    /// The first active month. Defaults to the start of the timeline.
    #[serde(default)]
    start: Option<NaiveDate>,
    /// The last active month. Defaults to the end of the timeline.
    #[serde(default)]
    end: Option<NaiveDate>,
}

impl CellInfoRaw {
    fn into_info(self, timeline: &Timeline) -> Result<CellInfo> {
        let start = self.start.unwrap_or(timeline.start);
        let end = self
            .end
            .unwrap_or_else(|| timeline.date_of(timeline.num_periods - 1));

        Ok(CellInfo {
            window: ActiveWindow::between_dates(timeline, start, end)?,
            id: self.id,
            location: self.location,
            quantity: self.quantity,
        })
    }
}

/// Operating hours for each active period, as written in the input file
#[derive(PartialEq, Debug, Deserialize)]
#[serde(untagged)]
enum OperatingHoursRaw {
    /// The same number of hours in every period
    Constant(Hours),
    /// A value for each period
    Series(Vec<Hours>),
    /// A CSV file with `date` and `hours` columns
    File {
        /// Path relative to the analysis directory
        file: PathBuf,
    },
}

/// A row of an operating hours CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct OperatingHoursRow {
    date: NaiveDate,
    hours: Hours,
}

/// Read operating hours from a CSV file, checking they are given for consecutive active periods
fn read_operating_hours(
    file_path: &Path,
    timeline: &Timeline,
    window: &ActiveWindow,
) -> Result<Vec<Hours>> {
    let rows: Vec<OperatingHoursRow> = read_csv(file_path)?;
    for (row, expected) in rows.iter().zip(window.periods()) {
        let period = timeline
            .period_of(row.date)
            .with_context(|| input_err_msg(file_path))?;
        ensure!(
            period == expected,
            "{}: operating hours for {} are out of order or outside the active window",
            input_err_msg(file_path),
            row.date
        );
    }

    Ok(rows.into_iter().map(|row| row.hours).collect())
}

impl OperatingHoursRaw {
    fn into_series(
        self,
        timeline: &Timeline,
        window: &ActiveWindow,
        analysis_dir: &Path,
    ) -> Result<Vec<Hours>> {
        match self {
            Self::Constant(hours) => Ok(vec![hours; window.num_periods as usize]),
            Self::Series(series) => Ok(series),
            Self::File { file } => {
                read_operating_hours(&analysis_dir.join(file), timeline, window)
            }
        }
    }
}

/// A fleet of vehicles as written in `analysis.toml`
#[derive(PartialEq, Debug, Deserialize)]
pub struct FleetCellRaw {
    #[serde(flatten)]
    info: CellInfoRaw,
    vehicle: String,
    /// The charger model. Defaults to the one linked to the vehicle model.
    #[serde(default)]
    evse: Option<String>,
    /// Purchase instalments. If absent, vehicles are paid for in the first active period.
    #[serde(default)]
    purchase: Option<Vec<DatedInstalment>>,
    #[serde(default)]
    subsidies: Vec<DatedInstalment>,
    operating_hours: OperatingHoursRaw,
}

impl FleetCellRaw {
    /// Convert into a [`Cell`], looking up the vehicle and charger models in the catalogue
    pub fn into_cell(
        self,
        timeline: &Timeline,
        equipment: &Equipment,
        analysis_dir: &Path,
    ) -> Result<Cell> {
        let id = self.info.id.clone();
        let build = || -> Result<Cell> {
            let info = self.info.into_info(timeline)?;
            let vehicle = equipment
                .vehicles
                .get(&self.vehicle)
                .with_context(|| format!("Unknown vehicle model '{}'", self.vehicle))?;
            let evse_name = self.evse.as_ref().or(vehicle.evse_model.as_ref());
            let evse = evse_name
                .map(|name| {
                    equipment
                        .evse
                        .get(name)
                        .map(Arc::clone)
                        .with_context(|| format!("Unknown EVSE model '{name}'"))
                })
                .transpose()?;
            let purchase = match &self.purchase {
                Some(dated) => PurchasePolicy::Instalments(into_instalments(timeline, dated)?),
                None => PurchasePolicy::Upfront,
            };
            let subsidies = into_instalments(timeline, &self.subsidies)?;
            let operating_hours =
                self.operating_hours
                    .into_series(timeline, &info.window, analysis_dir)?;

            Ok(Cell::Fleet(FleetCell {
                info,
                vehicle: Arc::clone(vehicle),
                evse,
                purchase,
                subsidies,
                operating_hours,
            }))
        };

        build().with_context(|| format!("Could not read fleet cell '{id}'"))
    }
}

/// A charger installed in a facility, with the number installed
#[derive(PartialEq, Debug, Deserialize)]
struct EvseStockRaw {
    model: String,
    count: u32,
}

/// Infrastructure as written in `analysis.toml`
#[derive(PartialEq, Debug, Deserialize)]
pub struct InfraCellRaw {
    #[serde(flatten)]
    info: CellInfoRaw,
    infra_type: InfraType,
    #[serde(default)]
    facility: Option<String>,
    #[serde(default)]
    batteries: u32,
    #[serde(default)]
    cable_length: Length,
    #[serde(default)]
    evse: Vec<EvseStockRaw>,
    #[serde(default)]
    construction: Option<Vec<DatedInstalment>>,
    #[serde(default)]
    equipment: Option<Vec<DatedInstalment>>,
    #[serde(default)]
    baas_subscription: bool,
    #[serde(default)]
    rated_power: Option<Power>,
    #[serde(default)]
    operating_hours: Option<OperatingHoursRaw>,
}

impl InfraCellRaw {
    /// Convert into a [`Cell`], looking up the facility and charger models in the catalogue
    pub fn into_cell(
        self,
        timeline: &Timeline,
        equipment: &Equipment,
        analysis_dir: &Path,
    ) -> Result<Cell> {
        let id = self.info.id.clone();
        let build = || -> Result<Cell> {
            let info = self.info.into_info(timeline)?;
            let facility = self
                .facility
                .as_ref()
                .map(|name| {
                    equipment
                        .facilities
                        .get(name)
                        .map(Arc::clone)
                        .with_context(|| format!("Unknown facility '{name}'"))
                })
                .transpose()?;
            let evse_stock = self
                .evse
                .iter()
                .map(|stock| -> Result<_> {
                    let evse = equipment
                        .evse
                        .get(&stock.model)
                        .with_context(|| format!("Unknown EVSE model '{}'", stock.model))?;
                    Ok((Arc::clone(evse), stock.count))
                })
                .collect::<Result<Vec<_>>>()?;
            let construction =
                into_instalments_or_upfront(timeline, &info.window, self.construction.as_deref())?;
            let equipment_schedule =
                into_instalments_or_upfront(timeline, &info.window, self.equipment.as_deref())?;
            let power_draw = match (self.rated_power, self.operating_hours) {
                (Some(rated_power), Some(hours)) => Some(InfraPowerDraw {
                    rated_power,
                    operating_hours: hours.into_series(timeline, &info.window, analysis_dir)?,
                }),
                (None, None) => None,
                _ => bail!("rated_power and operating_hours must be given together"),
            };

            Ok(Cell::Infra(InfraCell {
                info,
                infra_type: self.infra_type,
                facility,
                batteries: self.batteries,
                cable_length: self.cable_length,
                evse_stock,
                construction,
                equipment: equipment_schedule,
                baas_subscription: self.baas_subscription,
                power_draw,
            }))
        };

        build().with_context(|| format!("Could not read infrastructure cell '{id}'"))
    }
}

/// Headcount for one calendar year
#[derive(PartialEq, Debug, Deserialize)]
struct HeadcountRaw {
    year: i32,
    headcount: u32,
}

/// A group of workers as written in `analysis.toml`
#[derive(PartialEq, Debug, Deserialize)]
pub struct WorkforceCellRaw {
    #[serde(flatten)]
    info: CellInfoRaw,
    role: String,
    rate: Rate,
    #[serde(default)]
    headcount_plan: Vec<HeadcountRaw>,
}

impl WorkforceCellRaw {
    /// Convert into a [`Cell`]
    pub fn into_cell(self, timeline: &Timeline) -> Result<Cell> {
        let id = self.info.id.clone();
        let build = || -> Result<Cell> {
            let mut headcount_plan = BTreeMap::new();
            for entry in &self.headcount_plan {
                ensure!(
                    headcount_plan.insert(entry.year, entry.headcount).is_none(),
                    "Headcount given more than once for {}",
                    entry.year
                );
            }

            Ok(Cell::Workforce(WorkforceCell {
                info: self.info.into_info(timeline)?,
                role: self.role,
                rate: self.rate,
                headcount_plan,
            }))
        };

        build().with_context(|| format!("Could not read workforce cell '{id}'"))
    }
}

/// Licences for a digital solution as written in `analysis.toml`
#[derive(PartialEq, Debug, Deserialize)]
pub struct DigitalSolutionsCellRaw {
    #[serde(flatten)]
    info: CellInfoRaw,
    solution: String,
    #[serde(default)]
    commissioning: Option<Vec<DatedInstalment>>,
    #[serde(default)]
    subscription_schedule: Option<Vec<DatedInstalment>>,
}

impl DigitalSolutionsCellRaw {
    /// Convert into a [`Cell`], looking up the solution in the catalogue
    pub fn into_cell(self, timeline: &Timeline, equipment: &Equipment) -> Result<Cell> {
        let id = self.info.id.clone();
        let build = || -> Result<Cell> {
            let info = self.info.into_info(timeline)?;
            let solution = equipment
                .digital_solutions
                .get(&self.solution)
                .with_context(|| format!("Unknown digital solution '{}'", self.solution))?;
            let commissioning =
                into_instalments_or_upfront(timeline, &info.window, self.commissioning.as_deref())?;
            let subscription_schedule = self
                .subscription_schedule
                .as_deref()
                .map(|dated| into_instalments(timeline, dated))
                .transpose()?;

            Ok(Cell::DigitalSolutions(DigitalSolutionsCell {
                info,
                solution: solution.solution.clone(),
                solution_type: solution.solution_type.clone(),
                unit_price: solution.unit_price,
                subscription: solution.subscription,
                commissioning,
                subscription_schedule,
            }))
        };

        build().with_context(|| format!("Could not read digital solutions cell '{id}'"))
    }
}
