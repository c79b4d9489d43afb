//! Meteorological seasons (southern hemisphere).

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Meteorological season derived from the calendar month.
///
/// Summer is December through February, Autumn March through May,
/// Winter June through August and Spring September through November.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    /// All seasons in reporting order.
    pub const ALL: [Season; 4] = [Season::Summer, Season::Autumn, Season::Winter, Season::Spring];

    /// Season for a calendar month (1-12).
    ///
    /// Months outside 1-12 cannot come from a valid date; they fall into Spring
    /// together with 9-11 so the mapping stays total.
    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Summer,
            3..=5 => Season::Autumn,
            6..=8 => Season::Winter,
            _ => Season::Spring,
        }
    }

    /// Season for a timestamp.
    pub fn of(timestamp: &NaiveDateTime) -> Season {
        Season::from_month(timestamp.month())
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
        }
    }

    /// Position in [`Season::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Season::Summer => 0,
            Season::Autumn => 1,
            Season::Winter => 2,
            Season::Spring => 3,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
