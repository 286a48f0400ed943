// src/services/calendar_service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::{
    common::{db_utils::with_timeout, error::AppError},
    db::HolidayStore,
    engine::calendar::HolidayCalendar,
    models::holiday::Holiday,
};

#[derive(Clone)]
pub struct CalendarService {
    holidays: Arc<dyn HolidayStore>,
    timeout: Duration,
}

impl CalendarService {
    pub fn new(holidays: Arc<dyn HolidayStore>, timeout: Duration) -> Self {
        Self { holidays, timeout }
    }

    /// Calendário com os feriados do intervalo (inclusivo).
    pub async fn calendar_between(&self, from: NaiveDate, to: NaiveDate) -> Result<HolidayCalendar, AppError> {
        let holidays = with_timeout(self.timeout, "holidays_between", self.holidays.holidays_between(from, to)).await?;
        Ok(HolidayCalendar::new(holidays))
    }

    pub async fn list_holidays(&self, from_year: i32, to_year: i32) -> Result<Vec<Holiday>, AppError> {
        if to_year < from_year {
            return Err(AppError::Validation(format!("toYear {to_year} is before fromYear {from_year}")));
        }

        let (Some(start), Some(end)) =
            (NaiveDate::from_ymd_opt(from_year, 1, 1), NaiveDate::from_ymd_opt(to_year, 12, 31))
        else {
            return Err(AppError::Validation(format!("invalid year range {from_year}..{to_year}")));
        };

        let calendar = self.calendar_between(start, end).await?;
        Ok(calendar.list_holidays(from_year..=to_year))
    }

    // Feriado passado não muda: os dias já contabilizados dependem dele.
    fn ensure_not_past(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
        if date < today {
            return Err(AppError::InvalidState(format!("holiday {date} is in the past and cannot be changed")));
        }
        Ok(())
    }

    pub async fn create_holiday(&self, holiday: Holiday, today: NaiveDate) -> Result<Holiday, AppError> {
        Self::ensure_not_past(holiday.date, today)?;

        let inserted = with_timeout(self.timeout, "insert_holiday", self.holidays.insert_holiday(&holiday)).await?;
        if !inserted {
            return Err(AppError::Validation(format!("a holiday already exists on {}", holiday.date)));
        }

        tracing::info!("📅 Feriado cadastrado: {} ({})", holiday.date, holiday.name);
        Ok(holiday)
    }

    pub async fn update_holiday(&self, holiday: Holiday, today: NaiveDate) -> Result<Holiday, AppError> {
        Self::ensure_not_past(holiday.date, today)?;

        let updated = with_timeout(self.timeout, "update_holiday", self.holidays.update_holiday(&holiday)).await?;
        if !updated {
            return Err(AppError::NotFound(format!("holiday {}", holiday.date)));
        }

        tracing::info!("📅 Feriado atualizado: {} ({})", holiday.date, holiday.name);
        Ok(holiday)
    }
}
