// src/engine/calendar.rs

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::holiday::Holiday;

/// Calendário de dias úteis: fins de semana e feriados cadastrados ficam de fora.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, Holiday>,
}

impl HolidayCalendar {
    pub fn new<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = Holiday>,
    {
        let holidays = holidays.into_iter().map(|h| (h.date, h)).collect();
        Self { holidays }
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.is_holiday(date)
    }

    /// Feriados dos anos informados, em ordem de data.
    pub fn list_holidays(&self, years: RangeInclusive<i32>) -> Vec<Holiday> {
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(*years.start(), 1, 1),
            NaiveDate::from_ymd_opt(*years.end(), 12, 31),
        ) else {
            return Vec::new();
        };
        if start > end {
            return Vec::new();
        }

        self.holidays
            .range(start..=end)
            .map(|(_, h)| h.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(vec![
            Holiday { date: d(2025, 1, 26), name: "Republic Day".into() },
            Holiday { date: d(2025, 8, 15), name: "Independence Day".into() },
            Holiday { date: d(2026, 1, 26), name: "Republic Day".into() },
        ])
    }

    #[test]
    fn weekends_and_holidays_are_not_working_days() {
        let cal = calendar();
        assert!(!cal.is_working_day(d(2025, 1, 25))); // sábado
        assert!(!cal.is_working_day(d(2025, 1, 26))); // domingo + feriado
        assert!(!cal.is_working_day(d(2025, 8, 15))); // sexta, feriado
        assert!(cal.is_working_day(d(2025, 1, 27)));
    }

    #[test]
    fn list_holidays_filters_by_year_range_in_order() {
        let cal = calendar();
        let only_2025 = cal.list_holidays(2025..=2025);
        assert_eq!(only_2025.len(), 2);
        assert_eq!(only_2025[0].date, d(2025, 1, 26));
        assert_eq!(only_2025[1].date, d(2025, 8, 15));

        assert_eq!(cal.list_holidays(2025..=2026).len(), 3);
        assert!(cal.list_holidays(2026..=2025).is_empty());
    }
}
