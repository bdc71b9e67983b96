//! Recurrence schedule arithmetic.
//!
//! All dates are naive calendar dates; there is no time-of-day component and
//! no timezone conversion anywhere in the schedule.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// How often a recurrence produces an occurrence.
///
/// The enum is closed: an unknown string is a validation error at the parse
/// boundary, never a runtime fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::Validation(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// Next occurrence after `from` under `frequency`.
///
/// Month and year steps clamp to the last day of the target month when the
/// source day does not exist there (2024-01-31 + 1 month = 2024-02-29),
/// following chrono's `checked_add_months`.
pub fn next_occurrence(from: NaiveDate, frequency: Frequency) -> NaiveDate {
    let next = match frequency {
        Frequency::Daily => from.checked_add_days(Days::new(1)),
        Frequency::Weekly => from.checked_add_days(Days::new(7)),
        Frequency::Biweekly => from.checked_add_days(Days::new(14)),
        Frequency::Monthly => from.checked_add_months(Months::new(1)),
        Frequency::Quarterly => from.checked_add_months(Months::new(3)),
        Frequency::Yearly => from.checked_add_months(Months::new(12)),
    };
    // The additions only overflow at the far end of chrono's date range.
    next.unwrap_or(NaiveDate::MAX)
}
