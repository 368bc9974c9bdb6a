use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};

const PREFIX: &str = "DHPSW-ROIVA";

/// Issues `DHPSW-ROIVA-YYYY-MMDD-DDD-YYY` control numbers, where the trailing
/// groups are the per-day and per-year sequence numbers.
#[derive(Debug, Default)]
pub struct ControlNumberGenerator {
    state: Mutex<SequenceState>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SequenceState {
    day: Option<NaiveDate>,
    daily: u32,
    year: i32,
    yearly: u32,
}

impl ControlNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume numbering after `daily`/`yearly` numbers were already issued on `day`.
    pub fn resume_from(day: NaiveDate, daily: u32, yearly: u32) -> Self {
        Self {
            state: Mutex::new(SequenceState {
                day: Some(day),
                daily,
                year: day.year(),
                yearly,
            }),
        }
    }

    /// Continue the sequences after `last`, the most recently issued number.
    /// Returns `None` when `last` is not a control number.
    pub fn resume_after(last: &str) -> Option<Self> {
        let (day, daily, yearly) = parse_control_number(last)?;
        Some(Self::resume_from(day, daily, yearly))
    }

    pub fn next(&self, day: NaiveDate) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if state.year != day.year() || state.day.is_none() {
            state.year = day.year();
            state.yearly = 0;
        }
        if state.day != Some(day) {
            state.day = Some(day);
            state.daily = 0;
        }
        state.daily += 1;
        state.yearly += 1;

        format_control_number(day, state.daily, state.yearly)
    }
}

pub fn format_control_number(day: NaiveDate, daily: u32, yearly: u32) -> String {
    format!(
        "{PREFIX}-{:04}-{:02}{:02}-{:03}-{:03}",
        day.year(),
        day.month(),
        day.day(),
        daily,
        yearly
    )
}

/// Split a control number into its filing day and daily/yearly sequences.
pub fn parse_control_number(raw: &str) -> Option<(NaiveDate, u32, u32)> {
    let rest = raw.trim().strip_prefix(PREFIX)?.strip_prefix('-')?;
    let mut parts = rest.split('-');
    let (year, month_day, daily, yearly) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 4 || month_day.len() != 4 {
        return None;
    }

    let year = year.parse::<i32>().ok()?;
    let month = month_day.get(..2)?.parse::<u32>().ok()?;
    let day = month_day.get(2..)?.parse::<u32>().ok()?;
    let daily = daily.parse::<u32>().ok().filter(|daily| *daily > 0)?;
    let yearly = yearly.parse::<u32>().ok().filter(|yearly| *yearly >= daily)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((date, daily, yearly))
}
