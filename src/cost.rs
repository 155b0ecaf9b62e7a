//! The cost components tracked by the model.
//!
//! Derived tables use [`CostBreakdown`], a struct with one field per cost component, rather than a
//! dynamically-keyed map so that every row always carries every component.
use crate::units::{Dimensionless, Emissions, Energy, Hours, Money, Power};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Whether a cost is a capital or operating expense
#[derive(PartialEq, Eq, Clone, Copy, Debug, Display)]
pub enum CostSide {
    /// Capital expenditure
    #[strum(serialize = "capex")]
    Capex,
    /// Operating expenditure
    #[strum(serialize = "opex")]
    Opex,
}

/// The individual components making up the total cost of ownership
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CostComponent {
    /// Purchase of vehicles and equipment, and commissioning of software
    Purchase,
    /// Construction of infrastructure
    Construction,
    /// Subsidies on capital expenditure (non-positive)
    CapexSubsidies,
    /// Energy charges
    Energy,
    /// Demand (peak power) charges
    Power,
    /// Battery-as-a-service and software subscriptions
    Subscription,
    /// Maintenance of vehicles
    Maintenance,
    /// Workforce labour
    Labour,
    /// Charges on greenhouse gas emissions
    Emissions,
    /// Rebates on operating expenditure (non-positive)
    OpexSubsidies,
}

impl CostComponent {
    /// Whether this component is a capital or operating expense
    pub const fn side(self) -> CostSide {
        match self {
            Self::Purchase | Self::Construction | Self::CapexSubsidies => CostSide::Capex,
            _ => CostSide::Opex,
        }
    }

    /// Whether this component represents a subsidy rather than a cost
    pub const fn is_subsidy(self) -> bool {
        matches!(self, Self::CapexSubsidies | Self::OpexSubsidies)
    }
}

/// The value of every cost component for one period, year or aggregate
#[derive(
    PartialEq,
    Debug,
    Default,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::AddAssign,
)]
pub struct CostBreakdown {
    /// Purchase of vehicles and equipment, and commissioning of software
    pub purchase: Money,
    /// Construction of infrastructure
    pub construction: Money,
    /// Subsidies on capital expenditure (non-positive)
    pub capex_subsidies: Money,
    /// Energy charges
    pub energy: Money,
    /// Demand (peak power) charges
    pub power: Money,
    /// Battery-as-a-service and software subscriptions
    pub subscription: Money,
    /// Maintenance of vehicles
    pub maintenance: Money,
    /// Workforce labour
    pub labour: Money,
    /// Charges on greenhouse gas emissions
    pub emissions: Money,
    /// Rebates on operating expenditure (non-positive)
    pub opex_subsidies: Money,
}

impl CostBreakdown {
    /// Get the value of a single component
    pub const fn get(&self, component: CostComponent) -> Money {
        match component {
            CostComponent::Purchase => self.purchase,
            CostComponent::Construction => self.construction,
            CostComponent::CapexSubsidies => self.capex_subsidies,
            CostComponent::Energy => self.energy,
            CostComponent::Power => self.power,
            CostComponent::Subscription => self.subscription,
            CostComponent::Maintenance => self.maintenance,
            CostComponent::Labour => self.labour,
            CostComponent::Emissions => self.emissions,
            CostComponent::OpexSubsidies => self.opex_subsidies,
        }
    }

    /// Iterate over every component and its value
    pub fn iter(&self) -> impl Iterator<Item = (CostComponent, Money)> + '_ {
        CostComponent::iter().map(|component| (component, self.get(component)))
    }

    /// Sum of the components on one side of the ledger, optionally excluding subsidies
    fn side_total(&self, side: CostSide, include_subsidies: bool) -> Money {
        self.iter()
            .filter(|(component, _)| component.side() == side)
            .filter(|(component, _)| include_subsidies || !component.is_subsidy())
            .map(|(_, value)| value)
            .sum()
    }

    /// Total capital expenditure, net of subsidies
    pub fn capex(&self) -> Money {
        self.side_total(CostSide::Capex, true)
    }

    /// Total capital expenditure before subsidies
    pub fn gross_capex(&self) -> Money {
        self.side_total(CostSide::Capex, false)
    }

    /// Total operating expenditure, net of subsidies
    pub fn opex(&self) -> Money {
        self.side_total(CostSide::Opex, true)
    }

    /// Total operating expenditure before subsidies
    pub fn gross_opex(&self) -> Money {
        self.side_total(CostSide::Opex, false)
    }

    /// The total of all components
    pub fn total(&self) -> Money {
        self.iter().map(|(_, value)| value).sum()
    }
}

/// Physical quantities accompanying the costs.
///
/// Operating hours, energy and emissions accumulate over time. Headcount and peak power draw are
/// levels, so over several periods of one cell they keep their maximum (see
/// [`UsageTotals::merge_period`]). Adding totals together, as when combining cells, sums every
/// field.
#[derive(
    PartialEq,
    Debug,
    Default,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::AddAssign,
)]
pub struct UsageTotals {
    /// Operating hours summed over all units
    pub operating_hours: Hours,
    /// Energy consumed
    pub energy: Energy,
    /// Greenhouse gas emissions from the energy consumed
    pub emissions: Emissions,
    /// Number of workers employed
    pub headcount: Dimensionless,
    /// Peak power drawn from the grid (kVA)
    pub peak_power: Power,
}

impl UsageTotals {
    /// Fold in another period of the same cell
    pub fn merge_period(&mut self, other: Self) {
        self.operating_hours += other.operating_hours;
        self.energy += other.energy;
        self.emissions += other.emissions;
        self.headcount = self.headcount.max(other.headcount);
        self.peak_power = self.peak_power.max(other.peak_power);
    }
}
