//! Usage-driven maintenance costs.
//!
//! Maintenance costs are described by a step schedule keyed on the cumulative operating hours of
//! a vehicle. Each level gives the cost of the maintenance carried out over the interval ending at
//! its threshold, so the hourly maintenance rate for a level is its cost divided by the width of
//! the interval.
use crate::units::{Hours, Money, MoneyPerHour};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;

/// A step schedule of maintenance costs keyed on cumulative operating hours
#[derive(PartialEq, Debug, Clone)]
pub struct MaintenanceSchedule {
    thresholds: Vec<Hours>,
    costs: Vec<Money>,
}

impl MaintenanceSchedule {
    /// Create a new [`MaintenanceSchedule`] from aligned thresholds and costs.
    ///
    /// # Arguments
    ///
    /// * `thresholds` - Cumulative operating hours at the end of each maintenance interval. Must be
    ///   positive and strictly increasing.
    /// * `costs` - The cost of the maintenance carried out in each interval. Must be non-negative
    ///   and non-decreasing.
    pub fn new(thresholds: Vec<Hours>, costs: Vec<Money>) -> Result<Self> {
        ensure!(
            !thresholds.is_empty(),
            "Maintenance schedule must have at least one level"
        );
        ensure!(
            thresholds.len() == costs.len(),
            "Maintenance schedule has {} thresholds but {} costs",
            thresholds.len(),
            costs.len()
        );
        ensure!(
            thresholds.iter().all(|t| t.is_finite() && *t > Hours(0.0)),
            "Maintenance thresholds must be finite and positive"
        );
        ensure!(
            thresholds.iter().tuple_windows().all(|(a, b)| a < b),
            "Maintenance thresholds must be strictly increasing"
        );
        ensure!(
            costs.iter().all(|c| c.is_finite() && *c >= Money(0.0)),
            "Maintenance costs must be finite and non-negative"
        );
        ensure!(
            costs.iter().tuple_windows().all(|(a, b)| a <= b),
            "Maintenance costs must be non-decreasing"
        );

        Ok(Self { thresholds, costs })
    }

    /// Create a schedule from several named cost columns (e.g. battery, tyres), which are summed
    /// for each level.
    pub fn from_components(
        thresholds: Vec<Hours>,
        components: &IndexMap<String, Vec<Money>>,
    ) -> Result<Self> {
        ensure!(
            !components.is_empty(),
            "Maintenance schedule must have at least one cost component"
        );
        for (name, costs) in components {
            ensure!(
                costs.len() == thresholds.len(),
                "Maintenance cost component '{name}' has {} values but there are {} thresholds",
                costs.len(),
                thresholds.len()
            );
        }
        let costs = (0..thresholds.len())
            .map(|i| components.values().map(|costs| costs[i]).sum::<Money>())
            .collect();

        Self::new(thresholds, costs)
    }

    /// The usage thresholds
    pub fn thresholds(&self) -> &[Hours] {
        &self.thresholds
    }

    /// The cost levels
    pub fn costs(&self) -> &[Money] {
        &self.costs
    }

    /// The index of the level which applies at the given cumulative usage.
    ///
    /// This is the last level whose threshold is at or below `usage`. Below the first threshold the
    /// first level applies and beyond the last threshold the top level applies.
    fn level_at(&self, usage: Hours) -> usize {
        self.thresholds
            .partition_point(|threshold| *threshold <= usage)
            .saturating_sub(1)
    }

    /// The maintenance cost level at the given cumulative usage
    pub fn cost_at(&self, usage: Hours) -> Money {
        self.costs[self.level_at(usage)]
    }

    /// The index of the interval containing the given cumulative usage.
    ///
    /// A threshold belongs to the interval it ends. Usage beyond the last threshold stays in the
    /// top interval.
    fn interval_at(&self, usage: Hours) -> usize {
        self.thresholds
            .partition_point(|threshold| *threshold < usage)
            .min(self.thresholds.len() - 1)
    }

    /// The start of the interval with the given index
    fn interval_start(&self, interval: usize) -> Hours {
        if interval == 0 {
            Hours(0.0)
        } else {
            self.thresholds[interval - 1]
        }
    }

    /// The hourly rate over the interval with the given index
    fn interval_rate(&self, interval: usize) -> MoneyPerHour {
        self.costs[interval] / (self.thresholds[interval] - self.interval_start(interval))
    }

    /// The hourly maintenance rate at the given cumulative usage
    pub fn hourly_rate_at(&self, usage: Hours) -> MoneyPerHour {
        self.interval_rate(self.interval_at(usage))
    }

    /// The maintenance cost of running a vehicle from `from` to `to` cumulative operating hours.
    ///
    /// Each interval is billed at its own hourly rate for the hours that fall within it, so running
    /// a vehicle from zero to the last threshold costs the sum of the schedule.
    pub fn cost_between(&self, from: Hours, to: Hours) -> Money {
        let top = self.thresholds.len() - 1;
        (self.interval_at(from)..=self.interval_at(to))
            .map(|interval| {
                let start = from.max(self.interval_start(interval));
                let end = if interval == top {
                    to
                } else {
                    to.min(self.thresholds[interval])
                };
                self.interval_rate(interval) * (end - start).max(Hours(0.0))
            })
            .sum()
    }
}
