//! Cost cells: groups of homogeneous cost-bearing objects.
//!
//! A cell represents a number of identical units (vehicles, facilities, workers or software
//! licences) which are active over a window of the analysis timeline. Each of the four kinds of
//! cell implements [`CostCell`], which calculates the cost of the cell for a single period.
use crate::cost::{CostBreakdown, UsageTotals};
use crate::id::{HasID, define_id_type};
use crate::prices::EnergyPrices;
use crate::timeline::{ActiveWindow, PeriodLength, Timeline};
use crate::units::{Dimensionless, Hours};
use anyhow::{Context, Result, ensure};
use strum::{Display, EnumIter};

pub mod digital;
pub mod fleet;
pub mod infra;
pub mod workforce;
pub use digital::DigitalSolutionsCell;
pub use fleet::{EvseModel, FleetCell, Powertrain, VehicleModel};
pub use infra::{FacilityParameters, InfraCell, InfraPowerDraw, InfraType};
pub use workforce::WorkforceCell;

define_id_type! {CellID}

/// The category of a cost cell
#[derive(
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
)]
pub enum CellCategory {
    /// A fleet of vehicles
    #[strum(serialize = "fleet")]
    Fleet,
    /// Charging stations and other infrastructure
    #[strum(serialize = "infrastructure")]
    Infrastructure,
    /// A group of workers
    #[strum(serialize = "workforce")]
    Workforce,
    /// Software and other digital solutions
    #[strum(serialize = "digital solutions")]
    DigitalSolutions,
}

/// The properties shared by every kind of cell
#[derive(PartialEq, Debug, Clone)]
pub struct CellInfo {
    /// Unique identifier for the cell
    pub id: CellID,
    /// Where the units are located (e.g. "extraction level 1")
    pub location: Option<String>,
    /// The periods for which the cell is active
    pub window: ActiveWindow,
    /// The number of units represented by the cell
    pub quantity: u32,
}

impl CellInfo {
    /// Create a new [`CellInfo`] with no location
    pub fn new(id: &str, window: ActiveWindow, quantity: u32) -> Self {
        Self {
            id: id.into(),
            location: None,
            window,
            quantity,
        }
    }

    /// The quantity as a multiplier for costs
    pub fn scale(&self) -> Dimensionless {
        Dimensionless(f64::from(self.quantity))
    }
}

/// Everything a cell needs to know to calculate its costs for one period
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext<'a> {
    /// The index of the period in the timeline
    pub period: u32,
    /// The length of the period
    pub period_length: PeriodLength,
    /// The calendar year in which the period starts
    pub year: i32,
    /// The usage driver for this period (hours per unit), for cells which have one
    pub usage: Option<Hours>,
    /// The running total of the usage driver, including this period
    pub cumulative_usage: Hours,
    /// Energy prices for the analysis
    pub prices: &'a EnergyPrices,
}

/// The costs and physical quantities of one cell for one period
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct PeriodCosts {
    /// The value of each cost component
    pub costs: CostBreakdown,
    /// Operating hours, energy and emissions
    pub usage: UsageTotals,
}

/// Behaviour common to every kind of cost cell
pub trait CostCell {
    /// The properties shared by all cells
    fn info(&self) -> &CellInfo;

    /// The category of the cell
    fn category(&self) -> CellCategory;

    /// The usage driver series (hours per unit for each active period), if the cell has one
    fn usage(&self) -> Option<&[Hours]> {
        None
    }

    /// Check the parameters specific to this kind of cell
    fn validate_parameters(&self, timeline: &Timeline) -> Result<()>;

    /// Calculate the costs of the cell for a single active period
    fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts;
}

/// A cost cell of any kind
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// A fleet of vehicles
    Fleet(FleetCell),
    /// Infrastructure such as a charging station
    Infra(InfraCell),
    /// A group of workers
    Workforce(WorkforceCell),
    /// A digital solution
    DigitalSolutions(DigitalSolutionsCell),
}

impl HasID<CellID> for Cell {
    fn get_id(&self) -> &CellID {
        &self.info().id
    }
}

impl Cell {
    /// Get the cell as a trait object
    fn as_cost_cell(&self) -> &dyn CostCell {
        match self {
            Self::Fleet(cell) => cell,
            Self::Infra(cell) => cell,
            Self::Workforce(cell) => cell,
            Self::DigitalSolutions(cell) => cell,
        }
    }

    /// The properties shared by all cells
    pub fn info(&self) -> &CellInfo {
        self.as_cost_cell().info()
    }

    /// The cell's ID
    pub fn id(&self) -> &CellID {
        &self.info().id
    }

    /// The category of the cell
    pub fn category(&self) -> CellCategory {
        self.as_cost_cell().category()
    }

    /// The period in which the cell is active
    pub fn window(&self) -> &ActiveWindow {
        &self.info().window
    }

    /// The usage driver series, if the cell has one
    pub fn usage(&self) -> Option<&[Hours]> {
        self.as_cost_cell().usage()
    }

    /// Check that the cell is valid for use with the given timeline
    pub fn validate(&self, timeline: &Timeline) -> Result<()> {
        let info = self.info();
        let check = || -> Result<()> {
            info.window.validate(timeline)?;
            if let Some(usage) = self.usage() {
                ensure!(
                    usage.len() == info.window.num_periods as usize,
                    "Usage series has {} values but the cell is active for {} periods",
                    usage.len(),
                    info.window.num_periods
                );
                ensure!(
                    usage.iter().all(|hours| hours.is_finite() && *hours >= Hours(0.0)),
                    "Usage values must be finite and non-negative"
                );
            }
            self.as_cost_cell().validate_parameters(timeline)
        };

        check().with_context(|| format!("Invalid {} cell '{}'", self.category(), info.id))
    }

    /// Calculate the costs of the cell for a single active period
    pub fn period_costs(&self, ctx: &PeriodContext) -> PeriodCosts {
        self.as_cost_cell().period_costs(ctx)
    }
}
