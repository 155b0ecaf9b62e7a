//! Recurring rates and instalment schedules.
//!
//! Capital costs (vehicle purchases, construction, equipment and software commissioning) are spread
//! over one or more timeline periods by an instalment schedule. Recurring costs (subscriptions and
//! labour) are expressed as a [`Rate`] with its own frequency, which is converted to the length of
//! a timeline period.
use crate::timeline::{ActiveWindow, PeriodLength};
use crate::units::{Dimensionless, Money};
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// How often a recurring rate is charged
#[derive(
    PartialEq,
    Eq,
    Clone,
    Copy,
    Debug,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum RateFrequency {
    /// Charged every month
    #[default]
    #[string = "monthly"]
    Monthly,
    /// Charged once a year
    #[string = "annual"]
    Annual,
}

impl RateFrequency {
    /// The number of months covered by one charge
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Annual => 12,
        }
    }
}

/// A recurring cost
#[derive(PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Rate {
    /// The amount charged each time
    pub amount: Money,
    /// How often the amount is charged
    #[serde(default)]
    pub frequency: RateFrequency,
}

impl Rate {
    /// Create a new [`Rate`]
    pub const fn new(amount: Money, frequency: RateFrequency) -> Self {
        Self { amount, frequency }
    }

    /// A rate charged every month
    pub const fn monthly(amount: Money) -> Self {
        Self::new(amount, RateFrequency::Monthly)
    }

    /// A rate charged once a year
    pub const fn annual(amount: Money) -> Self {
        Self::new(amount, RateFrequency::Annual)
    }

    /// The amount charged over one period of the given length
    pub fn per_period(&self, period_length: PeriodLength) -> Money {
        let months = f64::from(period_length.months());
        let frequency_months = f64::from(self.frequency.months());
        self.amount * Dimensionless(months / frequency_months)
    }

    /// Check that the rate is a finite, non-negative amount
    pub fn validate(&self, what: &str) -> Result<()> {
        ensure!(
            self.amount.is_finite() && self.amount >= Money(0.0),
            "{what} must be a finite, non-negative amount (got {})",
            self.amount
        );

        Ok(())
    }
}

/// A fraction of a cost paid in a single timeline period
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Instalment {
    /// The period in which the instalment is paid
    pub period: u32,
    /// The fraction of the cost paid
    pub fraction: Dimensionless,
}

impl Instalment {
    /// Create a new [`Instalment`]
    pub const fn new(period: u32, fraction: f64) -> Self {
        Self {
            period,
            fraction: Dimensionless(fraction),
        }
    }
}

/// The tolerance used when checking that instalment fractions sum to one
const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// An ordered list of instalments
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instalments(pub Vec<Instalment>);

impl Instalments {
    /// Create a new [`Instalments`] from a list of instalments
    pub fn new(instalments: Vec<Instalment>) -> Self {
        Self(instalments)
    }

    /// Whether the schedule has no instalments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The total fraction paid in `period`.
    ///
    /// A period may appear more than once in a schedule, in which case its fractions are summed.
    pub fn fraction_at(&self, period: u32) -> Dimensionless {
        self.0
            .iter()
            .filter(|instalment| instalment.period == period)
            .map(|instalment| instalment.fraction)
            .sum()
    }

    /// The sum of all fractions
    pub fn total_fraction(&self) -> Dimensionless {
        self.0.iter().map(|instalment| instalment.fraction).sum()
    }

    /// Check that every instalment falls within `window` and has a fraction in (0, 1]
    pub fn validate(&self, window: &ActiveWindow, what: &str) -> Result<()> {
        for instalment in &self.0 {
            ensure!(
                window.contains(instalment.period),
                "{what} instalment in period {} lies outside the active window (periods {}..{})",
                instalment.period,
                window.start,
                window.start + window.num_periods
            );
            let fraction = instalment.fraction.value();
            ensure!(
                fraction > 0.0 && fraction <= 1.0,
                "{what} instalment fractions must be in the range (0, 1] (got {fraction})"
            );
        }

        Ok(())
    }

    /// As for [`Instalments::validate`], but also check that the fractions sum to one
    pub fn validate_complete(&self, window: &ActiveWindow, what: &str) -> Result<()> {
        self.validate(window, what)?;
        let total = self.total_fraction().value();
        ensure!(
            approx_eq!(f64, total, 1.0, epsilon = FRACTION_SUM_TOLERANCE),
            "{what} instalment fractions must sum to one (got {total})"
        );

        Ok(())
    }
}

/// How the purchase cost of a cell's units is allocated to timeline periods.
///
/// When a cell becomes active part way through a year, `Upfront` charges the whole purchase cost
/// in the first active period, whichever month that is. No pro-rating is applied.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum PurchasePolicy {
    /// The full purchase cost is paid in the first active period
    #[default]
    Upfront,
    /// The purchase cost is paid according to an explicit schedule
    Instalments(Instalments),
}

impl PurchasePolicy {
    /// The fraction of the purchase cost paid in `period`
    pub fn fraction_at(&self, window: &ActiveWindow, period: u32) -> Dimensionless {
        match self {
            Self::Upfront if !window.is_empty() && period == window.start => Dimensionless(1.0),
            Self::Upfront => Dimensionless(0.0),
            Self::Instalments(instalments) => instalments.fraction_at(period),
        }
    }

    /// Check that the policy is consistent with the active window
    pub fn validate(&self, window: &ActiveWindow, what: &str) -> Result<()> {
        match self {
            Self::Upfront => Ok(()),
            Self::Instalments(instalments) => instalments.validate_complete(window, what),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Rate::monthly(Money(100.0)), PeriodLength::Month, 100.0)]
    #[case(Rate::monthly(Money(100.0)), PeriodLength::Year, 1200.0)]
    #[case(Rate::annual(Money(80_000.0)), PeriodLength::Month, 80_000.0 / 12.0)]
    #[case(Rate::annual(Money(80_000.0)), PeriodLength::Year, 80_000.0)]
    fn test_rate_per_period(
        #[case] rate: Rate,
        #[case] period_length: PeriodLength,
        #[case] expected: f64,
    ) {
        assert_approx_eq!(Money, rate.per_period(period_length), Money(expected));
    }

    #[test]
    fn test_rate_negative() {
        assert_error!(
            Rate::monthly(Money(-1.0)).validate("BaaS rate"),
            "BaaS rate must be a finite, non-negative amount (got -1)"
        );
    }

    #[test]
    fn test_instalments_fraction_at() {
        let instalments = Instalments::new(vec![
            Instalment::new(0, 0.2),
            Instalment::new(3, 0.5),
            Instalment::new(3, 0.3),
        ]);
        assert_eq!(instalments.fraction_at(0), Dimensionless(0.2));
        assert_eq!(instalments.fraction_at(1), Dimensionless(0.0));
        assert_approx_eq!(Dimensionless, instalments.fraction_at(3), Dimensionless(0.8));
        assert!(
            instalments
                .validate_complete(&ActiveWindow::new(0, 12), "Purchase")
                .is_ok()
        );
    }

    #[test]
    fn test_instalments_invalid() {
        let window = ActiveWindow::new(2, 4);
        assert_error!(
            Instalments::new(vec![Instalment::new(6, 1.0)]).validate(&window, "Purchase"),
            "Purchase instalment in period 6 lies outside the active window (periods 2..6)"
        );
        assert_error!(
            Instalments::new(vec![Instalment::new(2, 0.0)]).validate(&window, "Purchase"),
            "Purchase instalment fractions must be in the range (0, 1] (got 0)"
        );
        assert_error!(
            Instalments::new(vec![Instalment::new(2, 0.5)]).validate_complete(&window, "Purchase"),
            "Purchase instalment fractions must sum to one (got 0.5)"
        );
    }

    #[test]
    fn test_purchase_policy_upfront() {
        let window = ActiveWindow::new(5, 12);
        let policy = PurchasePolicy::Upfront;
        assert_eq!(policy.fraction_at(&window, 5), Dimensionless(1.0));
        assert_eq!(policy.fraction_at(&window, 6), Dimensionless(0.0));
        assert_eq!(
            policy.fraction_at(&ActiveWindow::new(5, 0), 5),
            Dimensionless(0.0)
        );
        assert!(policy.validate(&window, "Purchase").is_ok());
    }

    #[test]
    fn test_purchase_policy_instalments() {
        let window = ActiveWindow::new(0, 24);
        let policy = PurchasePolicy::Instalments(Instalments::new(vec![
            Instalment::new(0, 0.2),
            Instalment::new(12, 0.8),
        ]));
        assert_eq!(policy.fraction_at(&window, 0), Dimensionless(0.2));
        assert_eq!(policy.fraction_at(&window, 12), Dimensionless(0.8));
        assert!(policy.validate(&window, "Purchase").is_ok());
    }
}
