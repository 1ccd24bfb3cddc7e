use chrono::{NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An ISO-8601 week such as `2024-W30`.
///
/// Ordering is chronological (year first, then week number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    year: i32,
    week: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekParseError {
    #[error("week `{0}` is not of the form YYYY-Www")]
    Format(String),
    #[error("week {week} does not exist in ISO year {year}")]
    OutOfRange { year: i32, week: u32 },
}

impl IsoWeek {
    pub fn new(year: i32, week: u32) -> Result<Self, WeekParseError> {
        // Week 53 only exists in long ISO years; chrono knows which.
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or(WeekParseError::OutOfRange { year, week })
    }

    /// File name the prediction export writes for this week.
    pub fn file_name(&self) -> String {
        format!("{self}.geojson")
    }
}

impl FromStr for IsoWeek {
    type Err = WeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || WeekParseError::Format(s.to_string());

        let (year, week) = s.split_once("-W").ok_or_else(format_err)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(format_err());
        }
        if !year.bytes().chain(week.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(format_err());
        }

        let year: i32 = year.parse().map_err(|_| format_err())?;
        let week: u32 = week.parse().map_err(|_| format_err())?;
        Self::new(year, week)
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_week() {
        let week: IsoWeek = "2024-W30".parse().unwrap();
        assert_eq!(week, IsoWeek::new(2024, 30).unwrap());
        assert_eq!(week.to_string(), "2024-W30");
        assert_eq!(week.file_name(), "2024-W30.geojson");
    }

    #[test]
    fn rejects_malformed_weeks() {
        for raw in ["", "2024W30", "2024-W3", "2024-w30", "24-W30", "2024-W030", "../../etc/passwd", "2024-W3a"] {
            assert!(
                matches!(raw.parse::<IsoWeek>(), Err(WeekParseError::Format(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_weeks_outside_the_iso_year() {
        assert_eq!(
            "2024-W00".parse::<IsoWeek>(),
            Err(WeekParseError::OutOfRange { year: 2024, week: 0 })
        );
        // 2020 is a long ISO year, 2021 is not.
        assert!("2020-W53".parse::<IsoWeek>().is_ok());
        assert!("2021-W53".parse::<IsoWeek>().is_err());
    }

    #[test]
    fn orders_chronologically() {
        let mut weeks: Vec<IsoWeek> = ["2025-W01", "2024-W30", "2024-W28"]
            .iter()
            .map(|w| w.parse().unwrap())
            .collect();
        weeks.sort();
        let names: Vec<String> = weeks.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["2024-W28", "2024-W30", "2025-W01"]);
    }
}
