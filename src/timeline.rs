//! Code for working with the analysis timeline.
//!
//! A timeline is an ordered sequence of equal-length periods (months or years) shared by every cell
//! in an analysis. Periods are referred to by their zero-based index.
use crate::units::Hours;
use anyhow::{Context, Result, ensure};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::ops::Range;

/// The number of hours in a day
const HOURS_PER_DAY: f64 = 24.0;

/// The length of one period of the timeline
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
pub enum PeriodLength {
    /// Calendar months
    #[default]
    #[string = "month"]
    Month,
    /// Calendar years
    #[string = "year"]
    Year,
}

impl PeriodLength {
    /// The number of calendar months covered by one period
    pub const fn months(self) -> u32 {
        match self {
            Self::Month => 1,
            Self::Year => 12,
        }
    }
}

/// The discrete periods making up an analysis
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// The date on which the first period starts
    pub start: NaiveDate,
    /// The length of each period
    #[serde(default)]
    pub period_length: PeriodLength,
    /// The number of periods in the timeline
    pub num_periods: u32,
}

/// The number of months between year zero and the month containing `date`
#[allow(clippy::cast_possible_wrap)]
fn month_number(date: NaiveDate) -> i32 {
    // month0 is at most 11
    date.year() * 12 + date.month0() as i32
}

/// Check that a date falls on the first day of a month
fn check_month_start(date: NaiveDate) -> Result<()> {
    ensure!(
        date.day() == 1,
        "Timeline dates must fall on the first day of a month (got {date})"
    );

    Ok(())
}

impl Timeline {
    /// Create a new [`Timeline`], checking that it is valid
    pub fn new(start: NaiveDate, period_length: PeriodLength, num_periods: u32) -> Result<Self> {
        let timeline = Self {
            start,
            period_length,
            num_periods,
        };
        timeline.validate()?;

        Ok(timeline)
    }

    /// Create a monthly timeline running from `start` to `end` inclusive.
    ///
    /// Both dates must fall on the first day of a month.
    pub fn monthly_between(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        check_month_start(start)?;
        check_month_start(end)?;
        ensure!(
            end >= start,
            "Timeline end date ({end}) is before start date ({start})"
        );
        let months = month_number(end) - month_number(start) + 1;
        let num_periods = u32::try_from(months).context("Timeline is too long")?;

        Self::new(start, PeriodLength::Month, num_periods)
    }

    /// Check the timeline is valid
    pub fn validate(&self) -> Result<()> {
        check_month_start(self.start)?;
        ensure!(self.num_periods > 0, "Timeline must have at least one period");
        ensure!(
            self.period_start(self.num_periods).is_some(),
            "Timeline extends beyond the supported calendar range"
        );

        Ok(())
    }

    /// All period indices, in order
    pub fn periods(&self) -> Range<u32> {
        0..self.num_periods
    }

    /// The date on which the given period starts.
    ///
    /// Returns `None` only if the date is not representable.
    fn period_start(&self, period: u32) -> Option<NaiveDate> {
        period
            .checked_mul(self.period_length.months())
            .and_then(|months| self.start.checked_add_months(Months::new(months)))
    }

    /// The date on which the given period starts.
    ///
    /// # Panics
    ///
    /// Panics if `period` lies beyond the end of the timeline.
    pub fn date_of(&self, period: u32) -> NaiveDate {
        assert!(period <= self.num_periods, "Period {period} out of range");
        self.period_start(period)
            .expect("Timeline dates were checked on construction")
    }

    /// The calendar year in which the given period starts
    pub fn year_of(&self, period: u32) -> i32 {
        self.date_of(period).year()
    }

    /// The first and last calendar years covered by the timeline
    pub fn year_span(&self) -> (i32, i32) {
        (self.year_of(0), self.year_of(self.num_periods - 1))
    }

    /// The number of hours in the given period, according to the calendar
    pub fn hours_in(&self, period: u32) -> Hours {
        let days = (self.date_of(period + 1) - self.date_of(period)).num_days();
        Hours(days as f64 * HOURS_PER_DAY)
    }

    /// Get the index of the period containing `date`.
    ///
    /// # Returns
    ///
    /// The period index or an error if the date lies outside the timeline.
    pub fn period_of(&self, date: NaiveDate) -> Result<u32> {
        ensure!(
            date >= self.start,
            "Date {date} is before the start of the timeline ({})",
            self.start
        );
        let months = month_number(date) - month_number(self.start);
        let period = u32::try_from(months)? / self.period_length.months();
        ensure!(
            period < self.num_periods,
            "Date {date} is after the end of the timeline"
        );

        Ok(period)
    }
}

/// The range of timeline periods for which a cell is active
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveWindow {
    /// The first active period
    pub start: u32,
    /// The number of active periods
    pub num_periods: u32,
}

impl ActiveWindow {
    /// Create a new [`ActiveWindow`]
    pub const fn new(start: u32, num_periods: u32) -> Self {
        Self { start, num_periods }
    }

    /// A window covering every period of `timeline`
    pub fn whole(timeline: &Timeline) -> Self {
        Self::new(0, timeline.num_periods)
    }

    /// A window running from the period containing `start` to the period containing `end`
    /// inclusive
    pub fn between_dates(timeline: &Timeline, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let first = timeline.period_of(start)?;
        let last = timeline.period_of(end)?;
        ensure!(
            last >= first,
            "End date ({end}) is before start date ({start})"
        );

        Ok(Self::new(first, last - first + 1))
    }

    /// The active periods, in order
    pub const fn periods(&self) -> Range<u32> {
        self.start..self.start + self.num_periods
    }

    /// Whether the window has no periods
    pub const fn is_empty(&self) -> bool {
        self.num_periods == 0
    }

    /// Whether `period` lies within the window
    pub const fn contains(&self, period: u32) -> bool {
        period >= self.start && period < self.start + self.num_periods
    }

    /// Check that the window lies within the timeline
    pub fn validate(&self, timeline: &Timeline) -> Result<()> {
        ensure!(
            self.start
                .checked_add(self.num_periods)
                .is_some_and(|end| end <= timeline.num_periods),
            "Active window (periods {}..{}) extends beyond the timeline ({} periods)",
            self.start,
            u64::from(self.start) + u64::from(self.num_periods),
            timeline.num_periods
        );

        Ok(())
    }
}
