// src/engine/day_calculator.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::engine::calendar::HolidayCalendar;
use crate::models::leave::DurationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DayCountError {
    #[error("toDate {to} is before fromDate {from}")]
    ReversedRange { from: NaiveDate, to: NaiveDate },

    #[error("half-day leave must start and end on the same date ({from} != {to})")]
    HalfDaySpan { from: NaiveDate, to: NaiveDate },
}

/// Único ponto onde se conta dia de licença. Regras e relatórios passam por aqui.
pub fn chargeable_days(
    calendar: &HolidayCalendar,
    from: NaiveDate,
    to: NaiveDate,
    mode: DurationMode,
) -> Result<Decimal, DayCountError> {
    if to < from {
        return Err(DayCountError::ReversedRange { from, to });
    }

    match mode {
        DurationMode::HalfDay => {
            if from != to {
                return Err(DayCountError::HalfDaySpan { from, to });
            }
            Ok(Decimal::new(5, 1))
        }
        DurationMode::FullDay => {
            let working = from
                .iter_days()
                .take_while(|day| *day <= to)
                .filter(|day| calendar.is_working_day(*day))
                .count();
            Ok(Decimal::from(working))
        }
    }
}
