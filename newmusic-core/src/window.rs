use chrono::{DateTime, Days, NaiveDate, TimeZone};

use crate::release::Release;

/// The trailing seven calendar days, `[today - 6, today]`, both ends inclusive.
///
/// Dates carry no time of day, so both endpoints are implicitly midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}
impl DateWindow {
    pub const LENGTH_DAYS: u64 = 7;

    /// The window ending on `today`.
    pub fn ending(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(Self::LENGTH_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// The window ending on the calendar day of `now`, with the time of day
    /// discarded.
    pub fn ending_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::ending(now.date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Keep the releases dated inside the window, in their original order.
    pub fn select<'a>(&self, releases: impl IntoIterator<Item = &'a Release>) -> Vec<Release> {
        releases
            .into_iter()
            .filter(|r| self.contains(r.release_date()))
            .cloned()
            .collect()
    }
}

/// Keep the releases dated in the seven days ending `today`, in input order.
pub fn select<'a>(
    releases: impl IntoIterator<Item = &'a Release>,
    today: NaiveDate,
) -> Vec<Release> {
    DateWindow::ending(today).select(releases)
}
